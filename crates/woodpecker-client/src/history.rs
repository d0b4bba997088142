//! Read-only list of past session results.

use crate::api::PerformanceRecord;

#[derive(Debug, Clone, Default)]
pub struct PerformanceHistoryView {
    records: Vec<PerformanceRecord>,
    current_id: Option<String>,
}

/// One displayable row of the history table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryRow {
    pub date: String,
    pub puzzle_set: String,
    pub score: i64,
    pub elapsed: String,
    pub is_current: bool,
}

impl PerformanceHistoryView {
    /// Replace the records wholesale, newest first.
    pub fn refresh(&mut self, mut records: Vec<PerformanceRecord>, current_id: Option<String>) {
        records.sort_by(|a, b| b.date.cmp(&a.date));
        tracing::debug!(count = records.len(), current = ?current_id, "History refreshed");
        self.records = records;
        self.current_id = current_id;
    }

    pub fn records(&self) -> &[PerformanceRecord] {
        &self.records
    }

    pub fn current(&self) -> Option<&PerformanceRecord> {
        let id = self.current_id.as_deref()?;
        self.records.iter().find(|r| r.id == id)
    }

    pub fn rows(&self) -> Vec<HistoryRow> {
        self.records
            .iter()
            .map(|r| HistoryRow {
                date: r.date.format("%Y-%m-%d %H:%M").to_string(),
                puzzle_set: r.puzzle_set.clone(),
                score: r.score,
                elapsed: format_elapsed(r.elapsed_seconds),
                is_current: self.current_id.as_deref() == Some(r.id.as_str()),
            })
            .collect()
    }
}

/// "m:ss", or "h:mm:ss" past an hour.
pub fn format_elapsed(seconds: u64) -> String {
    let (h, m, s) = (seconds / 3600, (seconds % 3600) / 60, seconds % 60);
    if h > 0 {
        format!("{h}:{m:02}:{s:02}")
    } else {
        format!("{m}:{s:02}")
    }
}
