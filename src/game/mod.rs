//! Game Logic Module
//!
//! Everything that decides what the player sees and whether they were
//! right. Deterministic given a seed and a clock.
//!
//! ## Module Structure
//!
//! - `question`: difficulty schedule, categories, question generation
//! - `countdown`: per-round timer with single-fire timeout
//! - `state`: round phases, outcomes, snapshots for rendering
//! - `ranking`: bounded best-score leaderboard
//! - `events`: events returned by engine handlers
//! - `engine`: the round state machine

pub mod countdown;
pub mod engine;
pub mod events;
pub mod question;
pub mod ranking;
pub mod state;

// Re-export key types
pub use engine::{parse_answer, RoundEngine};
pub use events::QuizEvent;
pub use question::{generate_question, max_offset, Category, Question, QuestionKind};
pub use ranking::{Ranking, RankingEntry, RANKING_CAPACITY};
pub use state::{Outcome, QuizSnapshot, RoundPhase, RoundState, Urgency};
