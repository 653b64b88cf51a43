//! Best-score ranking.
//!
//! A ranking is a short leaderboard of the player's best runs. It is always
//! sorted by score descending; equal scores keep the order they were
//! recorded in, so an older run stays ahead of a newer one with the same
//! score.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Number of entries a ranking keeps.
pub const RANKING_CAPACITY: usize = 5;

/// One finished run in the ranking.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RankingEntry {
    /// Correct answers in the run (always at least 1).
    pub score: u32,
    /// When the run ended.
    pub timestamp: DateTime<Utc>,
}

impl RankingEntry {
    /// Create a new entry.
    pub fn new(score: u32, timestamp: DateTime<Utc>) -> Self {
        Self { score, timestamp }
    }
}

/// Bounded, score-ordered list of runs.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Ranking {
    entries: Vec<RankingEntry>,
}

impl Ranking {
    /// Create an empty ranking.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a ranking from arbitrary entries.
    ///
    /// Entries with a zero score are dropped, the rest are stably sorted and
    /// truncated to [`RANKING_CAPACITY`].
    pub fn from_entries(entries: Vec<RankingEntry>) -> Self {
        let mut entries: Vec<_> = entries.into_iter().filter(|e| e.score > 0).collect();
        // sort_by is stable: equal scores keep their insertion order
        entries.sort_by(|a, b| b.score.cmp(&a.score));
        entries.truncate(RANKING_CAPACITY);
        Self { entries }
    }

    /// Record a finished run.
    ///
    /// Returns `true` when the ranking changed. A zero score is never
    /// recorded, and a score lower than every entry of a full ranking falls
    /// straight off the end.
    pub fn insert(&mut self, score: u32, timestamp: DateTime<Utc>) -> bool {
        if score == 0 {
            return false;
        }
        let before = self.entries.clone();
        let mut entries = before.clone();
        entries.push(RankingEntry::new(score, timestamp));
        *self = Self::from_entries(entries);
        self.entries != before
    }

    /// Entries, best first.
    pub fn entries(&self) -> &[RankingEntry] {
        &self.entries
    }

    /// Scores, best first.
    pub fn scores(&self) -> Vec<u32> {
        self.entries.iter().map(|e| e.score).collect()
    }

    /// Highest recorded score, 0 when empty.
    pub fn best_score(&self) -> u32 {
        self.entries.first().map(|e| e.score).unwrap_or(0)
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no run has been recorded.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
