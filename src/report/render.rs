//! Human-readable report rendering.

use crate::config::ReportConfig;
use crate::ui::HarnessTheme;

use super::summary::RunReport;

/// Severity tier for a pass rate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tier {
    Healthy,
    Caution,
    Failing,
}

/// Pass-rate thresholds separating the tiers.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Thresholds {
    /// Rates at or above this are [`Tier::Healthy`]
    pub pass: f64,
    /// Rates at or above this (and below `pass`) are [`Tier::Caution`]
    pub caution: f64,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            pass: 80.0,
            caution: 60.0,
        }
    }
}

impl From<&ReportConfig> for Thresholds {
    fn from(config: &ReportConfig) -> Self {
        Self {
            pass: config.pass_threshold,
            caution: config.caution_threshold,
        }
    }
}

impl Thresholds {
    /// Classify a percentage.
    pub fn tier(&self, rate: f64) -> Tier {
        if rate >= self.pass {
            Tier::Healthy
        } else if rate >= self.caution {
            Tier::Caution
        } else {
            Tier::Failing
        }
    }
}

/// Render the report as text.
pub fn render(report: &RunReport, thresholds: &Thresholds, theme: &HarnessTheme) -> String {
    let summary = &report.summary;
    let mut lines = Vec::new();

    lines.push(format!("{}", theme.highlight.apply_to("SUMMARY:")));
    lines.push(format!("   Total Tests: {}", summary.total_tests));
    lines.push(format!(
        "   Passed: {}",
        theme.success.apply_to(summary.passed_tests)
    ));
    lines.push(format!(
        "   Failed: {}",
        theme.error.apply_to(summary.failed_tests)
    ));
    lines.push(format!("   Success Rate: {:.1}%", summary.success_rate));

    if !report.categories.is_empty() {
        lines.push(String::new());
        lines.push(format!("{}", theme.highlight.apply_to("CATEGORIES:")));
        for (name, stats) in report.categories.iter() {
            let rate = stats.success_rate();
            let text = format!("   {}: {}/{} ({:.1}%)", name, stats.passed, stats.total, rate);
            let style = match thresholds.tier(rate) {
                Tier::Healthy => &theme.success,
                Tier::Caution => &theme.warning,
                Tier::Failing => &theme.error,
            };
            lines.push(format!("{}", style.apply_to(text)));
        }
    }

    let failures: Vec<_> = report.failures().collect();
    if !failures.is_empty() {
        lines.push(String::new());
        lines.push(format!("{}", theme.error.apply_to("FAILED TESTS:")));
        for result in failures {
            lines.push(format!("   - {}", result.line()));
        }
    }

    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::result::CheckResult;
    use crate::report::summary::summarize;

    #[test]
    fn tier_boundaries() {
        let t = Thresholds::default();
        assert_eq!(t.tier(100.0), Tier::Healthy);
        assert_eq!(t.tier(80.0), Tier::Healthy);
        assert_eq!(t.tier(79.9), Tier::Caution);
        assert_eq!(t.tier(60.0), Tier::Caution);
        assert_eq!(t.tier(59.9), Tier::Failing);
        assert_eq!(t.tier(0.0), Tier::Failing);
    }

    #[test]
    fn thresholds_follow_config() {
        let config = ReportConfig {
            pass_threshold: 95.0,
            caution_threshold: 50.0,
            ..Default::default()
        };
        let t = Thresholds::from(&config);
        assert_eq!(t.tier(90.0), Tier::Caution);
        assert_eq!(t.tier(49.0), Tier::Failing);
    }

    #[test]
    fn renders_summary_categories_and_failures() {
        let report = summarize(
            &[
                CheckResult::pass("Auth: Login", "ok"),
                CheckResult::fail("Auth: Register", "Status code: 500"),
                CheckResult::pass("Health", "up"),
            ],
            None,
        );

        let text = render(&report, &Thresholds::default(), &HarnessTheme::plain());

        assert!(text.contains("Total Tests: 3"));
        assert!(text.contains("Passed: 2"));
        assert!(text.contains("Failed: 1"));
        assert!(text.contains("Success Rate: 66.7%"));
        assert!(text.contains("Auth: 1/2 (50.0%)"));
        assert!(text.contains("General: 1/1 (100.0%)"));
        assert!(text.contains("FAILED TESTS:"));
        assert!(text.contains("- Auth: Register: Status code: 500"));
    }

    #[test]
    fn all_passing_report_has_no_failure_section() {
        let report = summarize(&[CheckResult::pass("Health", "up")], None);
        let text = render(&report, &Thresholds::default(), &HarnessTheme::plain());
        assert!(!text.contains("FAILED TESTS"));
        assert!(text.contains("Success Rate: 100.0%"));
    }

    #[test]
    fn empty_report_renders_zero_rate() {
        let report = summarize(&[], None);
        let text = render(&report, &Thresholds::default(), &HarnessTheme::plain());
        assert!(text.contains("Total Tests: 0"));
        assert!(text.contains("Success Rate: 0.0%"));
        assert!(!text.contains("CATEGORIES"));
    }
}
