//! # Quiz Number
//!
//! Core of 何問目クイズ, a reaction quiz where every question asks which
//! question number something is: "3 ahead?", "2 back?", "what did you
//! answer 4 questions ago?". One wrong or late answer ends the streak.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                        QUIZ NUMBER                           │
//! ├─────────────────────────────────────────────────────────────┤
//! │  core/             - Inputs from the outside world           │
//! │  ├── rng.rs        - Seeded Xorshift128+ PRNG                │
//! │  └── clock.rs      - Monotonic + wall clock                  │
//! │                                                              │
//! │  game/             - Quiz logic (deterministic)              │
//! │  ├── question.rs   - Question generator                      │
//! │  ├── countdown.rs  - Per-round countdown                     │
//! │  ├── state.rs      - Phases, outcomes, snapshots             │
//! │  ├── ranking.rs    - Top-5 leaderboard                       │
//! │  ├── events.rs     - Engine events                           │
//! │  └── engine.rs     - Round state machine                     │
//! │                                                              │
//! │  platform/         - Collaborators (non-deterministic)       │
//! │  ├── store.rs      - Key-value persistence                   │
//! │  └── share.rs      - Share / clipboard                       │
//! │                                                              │
//! │  config.rs         - Tunables and env overrides              │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Determinism
//!
//! The `game/` modules take randomness and time only through the
//! [`RandomSource`] and [`Clock`] traits. With a fixed seed and a
//! [`ManualClock`] a run can be replayed exactly.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(unsafe_code)]

pub mod config;
pub mod core;
pub mod game;
pub mod platform;

// Re-export commonly used types
pub use crate::config::{ConfigError, QuizConfig};
pub use crate::core::clock::{Clock, ManualClock, SystemClock};
pub use crate::core::rng::{DeterministicRng, RandomSource};
pub use crate::game::engine::RoundEngine;
pub use crate::game::question::{generate_question, Question};
pub use crate::game::ranking::{Ranking, RankingEntry};
pub use crate::game::state::{Outcome, QuizSnapshot, RoundPhase};
pub use crate::platform::store::{FileStore, KeyValueStore, MemoryStore};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
