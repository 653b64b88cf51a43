//! Platform collaborators (non-deterministic).
//!
//! Everything the quiz touches outside of its own memory: the key-value
//! store that keeps the ranking between runs, and the share channel.
//!
//! ## Module Structure
//!
//! - `store`: key-value persistence and ranking load/save
//! - `share`: native share with clipboard fallback

pub mod share;
pub mod store;

pub use share::{share_text, Clipboard, ResultSharer, ShareError, ShareOutcome, ShareTarget, TerminalClipboard};
pub use store::{load_ranking, save_ranking, FileStore, KeyValueStore, MemoryStore, StoreError};
