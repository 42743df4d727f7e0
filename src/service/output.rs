//! Captured output of the supervised process.

use std::collections::VecDeque;
use std::io::{BufRead, BufReader, Read};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};

/// Bounded buffer keeping the last lines written to a stream.
#[derive(Debug, Clone)]
pub struct OutputTail {
    lines: Arc<Mutex<VecDeque<String>>>,
    capacity: usize,
}

impl OutputTail {
    pub fn new(capacity: usize) -> Self {
        Self {
            lines: Arc::new(Mutex::new(VecDeque::with_capacity(capacity))),
            capacity,
        }
    }

    /// Append a line, evicting the oldest once full.
    pub fn push(&self, line: String) {
        let mut lines = self.lines.lock().unwrap_or_else(|p| p.into_inner());
        if lines.len() == self.capacity {
            lines.pop_front();
        }
        lines.push_back(line);
    }

    /// Current contents joined with newlines.
    pub fn snapshot(&self) -> String {
        let lines = self.lines.lock().unwrap_or_else(|p| p.into_inner());
        lines.iter().cloned().collect::<Vec<_>>().join("\n")
    }
}

/// Drain `reader` on a background thread, logging each line and keeping
/// it in `tail` when given.
///
/// The pipe must be read continuously or a chatty child blocks on write.
pub fn drain<R>(reader: R, label: &'static str, tail: Option<OutputTail>) -> JoinHandle<()>
where
    R: Read + Send + 'static,
{
    thread::spawn(move || {
        let reader = BufReader::new(reader);
        for line in reader.lines().map_while(std::result::Result::ok) {
            tracing::trace!(target: "moodcheck::backend", "[{}] {}", label, line);
            if let Some(tail) = &tail {
                tail.push(line);
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn tail_keeps_last_lines() {
        let tail = OutputTail::new(2);
        tail.push("one".into());
        tail.push("two".into());
        tail.push("three".into());
        assert_eq!(tail.snapshot(), "two\nthree");
    }

    #[test]
    fn empty_tail_snapshot_is_empty() {
        assert_eq!(OutputTail::new(4).snapshot(), "");
    }

    #[test]
    fn drain_collects_lines() {
        let tail = OutputTail::new(10);
        let handle = drain(
            Cursor::new(b"Traceback\nImportError: fastapi\n".to_vec()),
            "stderr",
            Some(tail.clone()),
        );
        handle.join().unwrap();
        assert_eq!(tail.snapshot(), "Traceback\nImportError: fastapi");
    }
}
