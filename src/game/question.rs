//! Question Generation
//!
//! Produces the "which question number is it?" prompts. A question depends
//! only on the current round, the answers given so far and the random
//! source, so a seeded run always asks the same questions.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::core::rng::RandomSource;

/// Highest offset a question may use at the given round.
///
/// Difficulty ramps in four steps as the streak grows.
pub fn max_offset(round_index: u32) -> u32 {
    match round_index {
        0..=5 => 3,
        6..=15 => 5,
        16..=30 => 8,
        _ => 12,
    }
}

// =============================================================================
// CATEGORY
// =============================================================================

/// Kind of arithmetic a random question asks for.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    /// "n rounds ahead is which round?"
    Ahead,
    /// "n rounds back is which round?"
    Behind,
    /// "what was the answer n rounds back?"
    PastAnswer,
    /// "n ahead, then m back is which round?"
    Compound,
}

impl Category {
    /// Categories available at this point of the run.
    ///
    /// `PastAnswer` needs at least two remembered answers and `Compound`
    /// only unlocks once the player is past the opening rounds.
    pub fn eligible(round_index: u32, history_len: usize) -> Vec<Category> {
        let mut categories = vec![Category::Ahead, Category::Behind];
        if round_index >= 5 && history_len >= 2 {
            categories.push(Category::PastAnswer);
        }
        if round_index >= 8 {
            categories.push(Category::Compound);
        }
        categories
    }
}

// =============================================================================
// QUESTION
// =============================================================================

/// The rule that produced a question, with the offsets it drew.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "category", rename_all = "snake_case")]
pub enum QuestionKind {
    /// Round 1 warm-up.
    CurrentRound,
    /// `n` rounds ahead.
    Ahead {
        /// Offset forward
        n: u32,
    },
    /// `n` rounds back.
    Behind {
        /// Offset back
        n: u32,
    },
    /// The answer given `n` rounds back, produced in `source_round`.
    PastAnswer {
        /// Rounds back
        n: u32,
        /// Round whose answer is asked for
        source_round: u32,
    },
    /// `a` ahead, then `b` back.
    Compound {
        /// Offset forward
        a: u32,
        /// Offset back from there
        b: u32,
    },
}

/// A single quiz question.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Question {
    /// Prompt shown to the player.
    pub text: String,
    /// Expected answer, always at least 1.
    pub answer: u32,
    /// Extra line pointing at the round a remembered answer came from.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hint: Option<String>,
    /// Rule and offsets behind the prompt.
    pub kind: QuestionKind,
}

impl Question {
    fn current_round() -> Self {
        Self {
            text: "今何問目？".to_string(),
            answer: 1,
            hint: None,
            kind: QuestionKind::CurrentRound,
        }
    }

    fn ahead(round_index: u32, n: u32) -> Self {
        Self {
            text: format!("{n}問先は何問目？"),
            answer: round_index + n,
            hint: None,
            kind: QuestionKind::Ahead { n },
        }
    }

    fn behind(round_index: u32, n: u32) -> Self {
        Self {
            text: format!("{n}問前は何問目？"),
            answer: round_index - n,
            hint: None,
            kind: QuestionKind::Behind { n },
        }
    }

    fn past_answer(n: u32, source_round: u32, answer: u32) -> Self {
        Self {
            text: format!("{n}問前の答えは何だった？"),
            answer,
            hint: Some(format!("(Q{source_round}の答え)")),
            kind: QuestionKind::PastAnswer { n, source_round },
        }
    }

    fn compound(round_index: u32, a: u32, b: u32) -> Self {
        Self {
            text: format!("{a}問先の{b}問前は何問目？"),
            answer: round_index + a - b,
            hint: None,
            kind: QuestionKind::Compound { a, b },
        }
    }
}

// =============================================================================
// GENERATION
// =============================================================================

/// Generate the question for `round_index` (1-based).
///
/// `history` holds the correct answers of the run so far, index 0 being
/// round 1's answer.
pub fn generate_question<R: RandomSource>(
    round_index: u32,
    history: &[u32],
    rng: &mut R,
) -> Question {
    let round_index = round_index.max(1);

    let question = match round_index {
        1 => Question::current_round(),
        2 => Question::ahead(round_index, rng.rand_int(1, 3)),
        3 => Question::behind(round_index, rng.rand_int(1, 2)),
        _ => {
            let categories = Category::eligible(round_index, history.len());
            let pick = rng.rand_int(0, categories.len() as u32 - 1) as usize;
            generate_for_category(categories[pick], round_index, history, rng)
        }
    };

    debug!(
        round = round_index,
        kind = ?question.kind,
        answer = question.answer,
        "generated question"
    );

    question
}

fn generate_for_category<R: RandomSource>(
    category: Category,
    round_index: u32,
    history: &[u32],
    rng: &mut R,
) -> Question {
    let max_n = max_offset(round_index);

    match category {
        Category::Ahead => Question::ahead(round_index, rng.rand_int(1, max_n)),
        Category::Behind => {
            // Capped so the target round stays positive
            let cap = max_n.min(round_index - 1).max(1);
            Question::behind(round_index, rng.rand_int(1, cap))
        }
        Category::PastAnswer => {
            let len = history.len() as u32;
            let max_back = max_n.min(len.saturating_sub(1)).max(1);
            let n = rng.rand_int(1, max_back);
            match len.checked_sub(n).and_then(|i| history.get(i as usize)) {
                Some(&answer) => Question::past_answer(n, round_index - n, answer),
                // Nothing to remember yet
                None => Question::ahead(round_index, rng.rand_int(1, max_n)),
            }
        }
        Category::Compound => {
            let a = rng.rand_int(2, max_n);
            let b = rng.rand_int(1, a - 1);
            Question::compound(round_index, a, b)
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================
