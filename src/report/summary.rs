//! Run summaries and per-category statistics.

use chrono::{DateTime, Utc};
use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};

use super::result::CheckResult;
use crate::shell::HostInfo;

/// Aggregate counts for a whole run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Summary {
    pub total_tests: usize,
    pub passed_tests: usize,
    pub failed_tests: usize,
    /// Percentage of passing checks; 0.0 for an empty run
    pub success_rate: f64,
}

/// Counts for one category.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CategoryStats {
    pub passed: usize,
    pub failed: usize,
    pub total: usize,
}

impl CategoryStats {
    /// `passed / total * 100`; exactly 100.0 when nothing failed.
    pub fn success_rate(&self) -> f64 {
        rate(self.passed, self.total)
    }
}

/// Per-category statistics in first-seen order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Categories(Vec<(String, CategoryStats)>);

impl Categories {
    /// Look up a category by name.
    pub fn get(&self, name: &str) -> Option<&CategoryStats> {
        self.0.iter().find(|(n, _)| n == name).map(|(_, s)| s)
    }

    /// Iterate categories in first-seen order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &CategoryStats)> {
        self.0.iter().map(|(n, s)| (n.as_str(), s))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    fn entry(&mut self, name: &str) -> &mut CategoryStats {
        let idx = match self.0.iter().position(|(n, _)| n == name) {
            Some(idx) => idx,
            None => {
                self.0.push((name.to_string(), CategoryStats::default()));
                self.0.len() - 1
            }
        };
        &mut self.0[idx].1
    }
}

impl Serialize for Categories {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (name, stats) in &self.0 {
            map.serialize_entry(name, stats)?;
        }
        map.end()
    }
}

/// Complete snapshot of a finished run.
///
/// Built once from the immutable result log and never mutated afterwards.
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub summary: Summary,
    pub categories: Categories,
    pub results: Vec<CheckResult>,
    pub timestamp: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub host: Option<HostInfo>,
}

impl RunReport {
    /// Overall verdict: success iff nothing failed.
    pub fn passed(&self) -> bool {
        self.summary.failed_tests == 0
    }

    /// Failing checks in execution order.
    pub fn failures(&self) -> impl Iterator<Item = &CheckResult> {
        self.results.iter().filter(|r| !r.success)
    }

    /// Process exit code communicating the verdict.
    pub fn exit_code(&self) -> u8 {
        if self.passed() {
            0
        } else {
            1
        }
    }
}

/// Build a report from the ordered results of a run.
pub fn summarize(results: &[CheckResult], host: Option<&HostInfo>) -> RunReport {
    let total = results.len();
    let passed = results.iter().filter(|r| r.success).count();

    let mut categories = Categories::default();
    for result in results {
        let stats = categories.entry(&result.category);
        stats.total += 1;
        if result.success {
            stats.passed += 1;
        } else {
            stats.failed += 1;
        }
    }

    RunReport {
        summary: Summary {
            total_tests: total,
            passed_tests: passed,
            failed_tests: total - passed,
            success_rate: rate(passed, total),
        },
        categories,
        results: results.to_vec(),
        timestamp: Utc::now(),
        host: host.cloned(),
    }
}

fn rate(passed: usize, total: usize) -> f64 {
    if total == 0 {
        0.0
    } else if passed == total {
        100.0
    } else {
        passed as f64 / total as f64 * 100.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Vec<CheckResult> {
        vec![
            CheckResult::pass("Python Check", "Python 3.12.1"),
            CheckResult::pass("File Check: App.tsx", "File exists"),
            CheckResult::fail("File Check: package.json", "File missing"),
            CheckResult::fail("User Login", "Status code: 401"),
            CheckResult::pass("File Check: App.tsx", "File exists"),
        ]
    }

    #[test]
    fn totals_add_up() {
        let report = summarize(&sample(), None);
        assert_eq!(report.summary.total_tests, 5);
        assert_eq!(report.summary.passed_tests, 3);
        assert_eq!(report.summary.failed_tests, 2);
        assert_eq!(
            report.summary.total_tests,
            report.summary.passed_tests + report.summary.failed_tests
        );
        assert!((report.summary.success_rate - 60.0).abs() < f64::EPSILON);
        assert!(!report.passed());
        assert_eq!(report.exit_code(), 1);
    }

    #[test]
    fn categories_keep_first_seen_order() {
        let report = summarize(&sample(), None);
        let names: Vec<_> = report.categories.iter().map(|(n, _)| n).collect();
        assert_eq!(names, vec!["General", "File Check"]);

        let files = report.categories.get("File Check").unwrap();
        assert_eq!(*files, CategoryStats { passed: 2, failed: 1, total: 3 });
    }

    #[test]
    fn category_without_failures_is_exactly_100() {
        let results = vec![
            CheckResult::pass("Admin Stats", "ok"),
            CheckResult::pass("Admin Users List", "ok"),
            CheckResult::pass("Admin Stats", "ok"),
        ];
        let report = summarize(&results, None);
        assert_eq!(report.categories.get("General").unwrap().success_rate(), 100.0);
        assert_eq!(report.summary.success_rate, 100.0);
        assert!(report.passed());
        assert_eq!(report.exit_code(), 0);
    }

    #[test]
    fn empty_run_has_zero_rate() {
        let report = summarize(&[], None);
        assert_eq!(report.summary.total_tests, 0);
        assert_eq!(report.summary.success_rate, 0.0);
        assert!(report.categories.is_empty());
    }

    #[test]
    fn results_keep_execution_order() {
        let results = sample();
        let report = summarize(&results, None);
        assert_eq!(report.results, results);
        let failures: Vec<_> = report.failures().map(|r| r.name.as_str()).collect();
        assert_eq!(failures, vec!["File Check: package.json", "User Login"]);
    }

    #[test]
    fn categories_serialize_as_ordered_map() {
        let report = summarize(&sample(), None);
        let json = serde_json::to_string(&report.categories).unwrap();
        let general = json.find("\"General\"").unwrap();
        let files = json.find("\"File Check\"").unwrap();
        assert!(general < files);
        assert!(json.contains("\"total\":3"));
    }
}
