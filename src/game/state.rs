//! Round State Definitions
//!
//! The phase machine of a run and the read-only snapshot handed to the
//! presentation layer.

use serde::{Deserialize, Serialize};

use crate::game::question::Question;
use crate::game::ranking::Ranking;

// =============================================================================
// OUTCOME
// =============================================================================

/// How a round ended.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    /// Right answer in time. The run continues.
    Correct,
    /// Wrong answer. The run ends.
    Wrong,
    /// No answer before the countdown hit zero. The run ends.
    TimedOut,
}

impl Outcome {
    /// Whether this outcome ends the run.
    pub fn ends_run(self) -> bool {
        !matches!(self, Outcome::Correct)
    }
}

// =============================================================================
// ROUND PHASE
// =============================================================================

/// Current phase of the run.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[derive(Default)]
pub enum RoundPhase {
    /// Nothing running, waiting for `start`
    #[default]
    Idle,
    /// Question shown, countdown running
    InProgress,
    /// Round decided, outcome on display
    Resolved(Outcome),
    /// Run over, score and ranking on display
    Ended,
}

impl RoundPhase {
    /// Short label for logs.
    pub fn name(&self) -> &'static str {
        match self {
            RoundPhase::Idle => "idle",
            RoundPhase::InProgress => "in_progress",
            RoundPhase::Resolved(_) => "resolved",
            RoundPhase::Ended => "ended",
        }
    }
}

// =============================================================================
// ROUND STATE
// =============================================================================

/// State of the round currently on screen.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RoundState {
    /// Current phase
    pub phase: RoundPhase,
    /// 1-based round number
    pub round_index: u32,
    /// Seconds left on the countdown
    pub time_remaining: f64,
    /// Question being asked, kept after the run ends to reveal the answer
    pub current_question: Option<Question>,
}

impl RoundState {
    /// Fresh state before any run, showing a full countdown.
    pub fn idle(time_limit_secs: f64) -> Self {
        Self {
            phase: RoundPhase::Idle,
            round_index: 1,
            time_remaining: time_limit_secs,
            current_question: None,
        }
    }
}

// =============================================================================
// SNAPSHOT
// =============================================================================

/// Colour band of the countdown ring.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Urgency {
    /// Plenty of time left
    Calm,
    /// Five seconds or less
    Warning,
    /// Three seconds or less, or the round was lost
    Critical,
    /// The round was answered correctly
    Success,
}

/// Immutable view of the engine for rendering.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct QuizSnapshot {
    /// Round state at snapshot time
    pub round: RoundState,
    /// Outcome of the latest round, kept through `Ended`
    pub outcome: Option<Outcome>,
    /// Persisted ranking as currently known
    pub ranking: Ranking,
    /// Best score known to this run
    pub best_score: u32,
    /// Score of the finished run, set once the run has ended
    pub final_score: Option<u32>,
    /// Full countdown length in seconds
    pub time_limit: f64,
}

impl QuizSnapshot {
    /// Correct answers so far in this run.
    pub fn streak(&self) -> u32 {
        self.round.round_index.saturating_sub(1)
    }

    /// Fraction of the countdown left, 1.0 at round start.
    pub fn progress(&self) -> f64 {
        if self.time_limit <= 0.0 {
            return 0.0;
        }
        (self.round.time_remaining / self.time_limit).clamp(0.0, 1.0)
    }

    /// Colour band for the countdown ring.
    pub fn urgency(&self) -> Urgency {
        match self.round.phase {
            RoundPhase::Resolved(Outcome::Correct) => Urgency::Success,
            RoundPhase::Resolved(_) => Urgency::Critical,
            _ if self.round.time_remaining <= 3.0 => Urgency::Critical,
            _ if self.round.time_remaining <= 5.0 => Urgency::Warning,
            _ => Urgency::Calm,
        }
    }

    /// Whether the answer input should accept submissions.
    pub fn accepts_input(&self) -> bool {
        self.round.phase == RoundPhase::InProgress && self.round.current_question.is_some()
    }
}
