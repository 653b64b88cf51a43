//! Result sharing.
//!
//! Best effort: a native share target is used when one exists, otherwise
//! the text goes to the clipboard and the player is told so. Failures are
//! logged and dropped; sharing never touches engine state.

use std::io::{self, Write};

use thiserror::Error;
use tracing::{info, warn};

/// Sharing errors.
#[derive(Debug, Error)]
pub enum ShareError {
    /// The player dismissed the share sheet.
    #[error("share cancelled")]
    Cancelled,
    /// Clipboard could not be written.
    #[error("clipboard write failed: {0}")]
    Clipboard(#[from] io::Error),
}

/// Platform share sheet.
pub trait ShareTarget {
    /// Hand `text` to the platform.
    fn share(&mut self, text: &str) -> Result<(), ShareError>;
}

/// Clipboard fallback.
pub trait Clipboard {
    /// Replace the clipboard contents with `text`.
    fn copy(&mut self, text: &str) -> Result<(), ShareError>;
}

/// What a share attempt ended up doing.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ShareOutcome {
    /// Handed to the native share target
    Shared,
    /// Copied to the clipboard
    Copied,
    /// Nothing happened; the error was logged
    Failed,
}

/// Message shown after the clipboard fallback.
pub const COPIED_NOTICE: &str = "結果をコピーしました！";

/// Build the text shared after a run.
pub fn share_text(score: u32, best_score: Option<u32>, url: &str) -> String {
    let mut text = format!("【何問目クイズ】{score}問正解しました！\n");
    if let Some(best) = best_score.filter(|b| *b > 0) {
        text.push_str(&format!("ベスト記録: {best}問\n"));
    }
    text.push_str("あなたはどこまでいける？\n");
    text.push_str(url);
    text
}

/// Shares run results through whichever channel is available.
pub struct ResultSharer<C> {
    native: Option<Box<dyn ShareTarget>>,
    clipboard: C,
}

impl<C: Clipboard> ResultSharer<C> {
    /// Sharer with only the clipboard fallback.
    pub fn clipboard_only(clipboard: C) -> Self {
        Self { native: None, clipboard }
    }

    /// Sharer preferring a native target.
    pub fn with_native(native: Box<dyn ShareTarget>, clipboard: C) -> Self {
        Self {
            native: Some(native),
            clipboard,
        }
    }

    /// Share `text`, calling `notify` when the clipboard fallback succeeds.
    pub fn share(&mut self, text: &str, notify: impl FnOnce(&str)) -> ShareOutcome {
        if let Some(native) = self.native.as_mut() {
            return match native.share(text) {
                Ok(()) => {
                    info!("result shared");
                    ShareOutcome::Shared
                }
                Err(e) => {
                    warn!(error = %e, "native share failed");
                    ShareOutcome::Failed
                }
            };
        }

        match self.clipboard.copy(text) {
            Ok(()) => {
                notify(COPIED_NOTICE);
                ShareOutcome::Copied
            }
            Err(e) => {
                warn!(error = %e, "clipboard copy failed");
                ShareOutcome::Failed
            }
        }
    }

    /// The clipboard backend.
    pub fn clipboard(&self) -> &C {
        &self.clipboard
    }
}

/// Clipboard stand-in for terminals: prints the text framed for copying.
pub struct TerminalClipboard<W> {
    out: W,
}

impl<W: Write> TerminalClipboard<W> {
    /// Write copied text to `out`.
    pub fn new(out: W) -> Self {
        Self { out }
    }

    /// The underlying writer.
    pub fn get_ref(&self) -> &W {
        &self.out
    }
}

impl<W: Write> Clipboard for TerminalClipboard<W> {
    fn copy(&mut self, text: &str) -> Result<(), ShareError> {
        writeln!(self.out, "----------------")?;
        writeln!(self.out, "{text}")?;
        writeln!(self.out, "----------------")?;
        self.out.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    struct RecordingTarget {
        sent: Rc<RefCell<Vec<String>>>,
        fail: bool,
    }

    impl ShareTarget for RecordingTarget {
        fn share(&mut self, text: &str) -> Result<(), ShareError> {
            if self.fail {
                return Err(ShareError::Cancelled);
            }
            self.sent.borrow_mut().push(text.to_string());
            Ok(())
        }
    }

    struct BrokenClipboard;

    impl Clipboard for BrokenClipboard {
        fn copy(&mut self, _text: &str) -> Result<(), ShareError> {
            Err(ShareError::Clipboard(io::Error::new(io::ErrorKind::Other, "no clipboard")))
        }
    }

    #[test]
    fn test_share_text() {
        assert_eq!(
            share_text(12, None, "https://example.com"),
            "【何問目クイズ】12問正解しました！\nあなたはどこまでいける？\nhttps://example.com"
        );
        assert_eq!(
            share_text(3, Some(15), "u"),
            "【何問目クイズ】3問正解しました！\nベスト記録: 15問\nあなたはどこまでいける？\nu"
        );
        // A zero best is not worth mentioning
        assert!(!share_text(0, Some(0), "u").contains("ベスト"));
    }

    #[test]
    fn test_native_share_preferred() {
        let sent = Rc::new(RefCell::new(Vec::new()));
        let target = RecordingTarget { sent: sent.clone(), fail: false };
        let mut sharer = ResultSharer::with_native(Box::new(target), TerminalClipboard::new(Vec::new()));

        let mut notified = false;
        let outcome = sharer.share("hello", |_| notified = true);

        assert_eq!(outcome, ShareOutcome::Shared);
        assert_eq!(*sent.borrow(), vec!["hello".to_string()]);
        assert!(!notified);
        assert!(sharer.clipboard().get_ref().is_empty());
    }

    #[test]
    fn test_native_failure_is_swallowed() {
        let target = RecordingTarget { sent: Rc::default(), fail: true };
        let mut sharer = ResultSharer::with_native(Box::new(target), TerminalClipboard::new(Vec::new()));
        assert_eq!(sharer.share("hello", |_| {}), ShareOutcome::Failed);
    }

    #[test]
    fn test_clipboard_fallback_notifies() {
        let mut sharer = ResultSharer::clipboard_only(TerminalClipboard::new(Vec::new()));

        let mut notice = String::new();
        let outcome = sharer.share("score text", |msg| notice = msg.to_string());

        assert_eq!(outcome, ShareOutcome::Copied);
        assert_eq!(notice, COPIED_NOTICE);
        let printed = String::from_utf8(sharer.clipboard().get_ref().clone()).unwrap();
        assert!(printed.contains("score text"));
    }

    #[test]
    fn test_clipboard_failure_is_swallowed() {
        let mut sharer = ResultSharer::clipboard_only(BrokenClipboard);
        let mut notified = false;
        assert_eq!(sharer.share("x", |_| notified = true), ShareOutcome::Failed);
        assert!(!notified);
    }
}
