//! Process-wide evaluation history

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::Serialize;
use std::sync::Arc;

/// One completed evaluation. Immutable once built.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HistoryRecord {
    pub expression: String,
    /// Readable serialization of the value, empty when evaluation failed.
    pub result: String,
    pub stdout: String,
    pub stderr: String,
    /// Result rendered as hypertext, when a renderer was available.
    #[serde(skip)]
    pub result_html: Option<String>,
    pub evaluated_at: DateTime<Utc>,
}

impl HistoryRecord {
    pub fn new(
        expression: impl Into<String>,
        result: impl Into<String>,
        stdout: impl Into<String>,
        stderr: impl Into<String>,
    ) -> Self {
        Self {
            expression: expression.into(),
            result: result.into(),
            stdout: stdout.into(),
            stderr: stderr.into(),
            result_html: None,
            evaluated_at: Utc::now(),
        }
    }
}

/// Append-only log shared by every request handler.
///
/// Appends take the write lock for the push only, so two concurrent appends
/// always both land and each sees everything committed before it.
#[derive(Debug, Default)]
pub struct HistoryLog {
    records: RwLock<Vec<Arc<HistoryRecord>>>,
}

impl HistoryLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `record` and return the log as of that append, oldest first.
    pub fn append(&self, record: HistoryRecord) -> Vec<Arc<HistoryRecord>> {
        let mut records = self.records.write();
        records.push(Arc::new(record));
        records.clone()
    }

    pub fn current(&self) -> Vec<Arc<HistoryRecord>> {
        self.records.read().clone()
    }

    pub fn len(&self) -> usize {
        self.records.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.read().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn append_returns_snapshot_in_append_order() {
        let log = HistoryLog::new();
        log.append(HistoryRecord::new("1", "1", "", ""));
        let snapshot = log.append(HistoryRecord::new("2", "2", "", ""));

        let expressions: Vec<_> = snapshot.iter().map(|r| r.expression.as_str()).collect();
        assert_eq!(expressions, ["1", "2"]);
        assert_eq!(log.current(), snapshot);
    }

    #[test]
    fn snapshots_are_not_affected_by_later_appends() {
        let log = HistoryLog::new();
        let before = log.append(HistoryRecord::new("a", "", "", ""));
        log.append(HistoryRecord::new("b", "", "", ""));
        assert_eq!(before.len(), 1);
        assert_eq!(log.len(), 2);
    }

    #[test]
    fn concurrent_appends_never_lose_records() {
        let log = Arc::new(HistoryLog::new());
        let handles: Vec<_> = (0..64)
            .map(|i| {
                let log = log.clone();
                thread::spawn(move || log.append(HistoryRecord::new(i.to_string(), "", "", "")))
            })
            .collect();

        for handle in handles {
            let snapshot = handle.join().unwrap();
            assert!(!snapshot.is_empty());
        }

        let mut seen: Vec<usize> = log
            .current()
            .iter()
            .map(|r| r.expression.parse().unwrap())
            .collect();
        seen.sort_unstable();
        assert_eq!(seen, (0..64).collect::<Vec<_>>());
    }

    #[test]
    fn records_serialize_without_rendered_markup() {
        let mut record = HistoryRecord::new("(+ 1 2)", "3", "", "");
        record.result_html = Some("3".into());
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["expression"], "(+ 1 2)");
        assert_eq!(json["result"], "3");
        assert!(json.get("result_html").is_none());
        assert!(json["evaluated_at"].is_string());
    }
}
