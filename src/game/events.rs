//! Quiz Events
//!
//! Every engine handler returns the events it produced, in order, so a
//! driver can render incrementally instead of diffing snapshots.

use serde::{Deserialize, Serialize};

use crate::game::question::Question;
use crate::game::ranking::Ranking;
use crate::game::state::Outcome;

/// Something that happened inside the round engine.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum QuizEvent {
    /// A new run began
    RunStarted {
        /// Best score known when the run began
        best_score: u32,
    },

    /// A round began with a fresh question and a full countdown
    RoundStarted {
        /// 1-based round number
        round_index: u32,
        /// Question to answer this round
        question: Question,
    },

    /// A round was decided
    RoundResolved {
        /// Round that was decided
        round_index: u32,
        /// How it ended
        outcome: Outcome,
        /// Correct answer
        expected: u32,
        /// Parsed answer, `None` on timeout
        submitted: Option<i64>,
    },

    /// The run finished
    RunEnded {
        /// Correct answers in the run
        final_score: u32,
        /// Best score after this run
        best_score: u32,
        /// Whether this run raised the best score
        new_best: bool,
    },

    /// The ranking changed and was handed to the store
    RankingUpdated {
        /// Ranking including this run
        ranking: Ranking,
        /// Whether the store write succeeded
        persisted: bool,
    },

    /// The engine went back to idle
    Reset,
}

impl QuizEvent {
    /// Short label for logs.
    pub fn name(&self) -> &'static str {
        match self {
            QuizEvent::RunStarted { .. } => "run_started",
            QuizEvent::RoundStarted { .. } => "round_started",
            QuizEvent::RoundResolved { .. } => "round_resolved",
            QuizEvent::RunEnded { .. } => "run_ended",
            QuizEvent::RankingUpdated { .. } => "ranking_updated",
            QuizEvent::Reset => "reset",
        }
    }
}
