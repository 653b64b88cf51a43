//! Core primitives.
//!
//! Randomness and time are the only two inputs the quiz logic takes from the
//! outside world. Both sit behind traits so the game can be replayed exactly
//! from a seed and a scripted clock.

pub mod clock;
pub mod rng;

// Re-export core types
pub use clock::{Clock, ManualClock, SystemClock};
pub use rng::{DeterministicRng, RandomSource};
