//! Bounded log of recent analysis records.
//!
//! A fixed-capacity ring buffer: pushing onto a full log evicts the
//! oldest record. Serializes as a plain JSON array, oldest first, and
//! loading a longer array keeps only the most recent entries.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

use crate::record::AnalysisResult;

/// Most recent analysis records, oldest first.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "Vec<AnalysisResult>", into = "Vec<AnalysisResult>")]
pub struct History {
    entries: VecDeque<AnalysisResult>,
}

impl History {
    /// Number of records retained.
    pub const CAPACITY: usize = 100;

    /// Create an empty history.
    #[must_use]
    pub fn new() -> Self {
        Self {
            entries: VecDeque::with_capacity(Self::CAPACITY),
        }
    }

    /// Append a record, evicting the oldest if the log is full.
    pub fn push(&mut self, record: AnalysisResult) {
        if self.entries.len() == Self::CAPACITY {
            self.entries.pop_front();
        }
        self.entries.push_back(record);
    }

    /// Number of records.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if the log is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate oldest first.
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &AnalysisResult> + '_ {
        self.entries.iter()
    }

    /// The most recent record.
    #[must_use]
    pub fn latest(&self) -> Option<&AnalysisResult> {
        self.entries.back()
    }

    /// Remove every record.
    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

impl Default for History {
    fn default() -> Self {
        Self::new()
    }
}

impl From<Vec<AnalysisResult>> for History {
    fn from(records: Vec<AnalysisResult>) -> Self {
        let skip = records.len().saturating_sub(Self::CAPACITY);
        Self {
            entries: records.into_iter().skip(skip).collect(),
        }
    }
}

impl From<History> for Vec<AnalysisResult> {
    fn from(history: History) -> Self {
        history.entries.into()
    }
}

impl Extend<AnalysisResult> for History {
    fn extend<I: IntoIterator<Item = AnalysisResult>>(&mut self, iter: I) {
        for record in iter {
            self.push(record);
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::strategy::StrategyKind;

    fn record(contour_count: usize) -> AnalysisResult {
        AnalysisResult {
            contour_count,
            ..AnalysisResult::empty(StrategyKind::EdgeDetection, chrono::DateTime::<chrono::Utc>::UNIX_EPOCH)
        }
    }

    #[test]
    fn push_evicts_oldest_when_full() {
        let mut history = History::new();
        history.extend((0..150).map(record));
        assert_eq!(history.len(), History::CAPACITY);
        assert_eq!(history.iter().next().unwrap().contour_count, 50);
        assert_eq!(history.latest().unwrap().contour_count, 149);
    }

    #[test]
    fn loading_long_array_keeps_most_recent() {
        let records: Vec<AnalysisResult> = (0..130).map(record).collect();
        let history = History::from(records);
        assert_eq!(history.len(), 100);
        assert_eq!(history.iter().next().unwrap().contour_count, 30);
    }

    #[test]
    fn serializes_as_plain_array() {
        let mut history = History::new();
        history.push(record(1));
        history.push(record(2));
        let json = serde_json::to_value(&history).unwrap();
        assert!(json.is_array());
        assert_eq!(json.as_array().unwrap().len(), 2);

        let back: History = serde_json::from_value(json).unwrap();
        assert_eq!(back, history);
    }

    #[test]
    fn clear_empties_log() {
        let mut history = History::new();
        history.push(record(3));
        history.clear();
        assert!(history.is_empty());
        assert!(history.latest().is_none());
    }
}
