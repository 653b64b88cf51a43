//! Round Engine
//!
//! Owns a run from `start` to `Ended`: asks the generator for questions,
//! runs the countdown, judges answers, and writes the final score into the
//! persisted ranking.
//!
//! The engine is driven by three kinds of events: periodic [`tick`]s,
//! answer [`submit`]s, and the lifecycle commands [`start`] and [`retry`].
//! Each handler runs to completion and returns the [`QuizEvent`]s it
//! produced. Leaving `InProgress` always disarms the countdown inside the
//! same handler, so a round can only be decided once.
//!
//! [`tick`]: RoundEngine::tick
//! [`submit`]: RoundEngine::submit
//! [`start`]: RoundEngine::start
//! [`retry`]: RoundEngine::retry

use std::time::Duration;

use tracing::{debug, info, warn};

use crate::config::QuizConfig;
use crate::core::clock::Clock;
use crate::core::rng::RandomSource;
use crate::game::countdown::Countdown;
use crate::game::events::QuizEvent;
use crate::game::question::generate_question;
use crate::game::ranking::Ranking;
use crate::game::state::{Outcome, QuizSnapshot, RoundPhase, RoundState};
use crate::platform::store::{load_ranking, save_ranking, KeyValueStore};

/// Transition waiting for the outcome display to finish.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum PendingKind {
    NextRound,
    EndRun,
}

#[derive(Clone, Copy, Debug)]
struct Pending {
    kind: PendingKind,
    due: Duration,
}

/// Bookkeeping for the current run.
#[derive(Clone, Debug, Default)]
struct RunContext {
    /// Correct answers, index 0 = round 1
    history: Vec<u32>,
    /// Best score known to this run; seeded from the ranking on start
    best_score: u32,
    outcome: Option<Outcome>,
    final_score: Option<u32>,
}

/// The quiz state machine.
pub struct RoundEngine<R, C, S> {
    rng: R,
    clock: C,
    store: S,
    ranking_key: String,
    result_display: Duration,
    state: RoundState,
    countdown: Countdown,
    run: RunContext,
    pending: Option<Pending>,
    ranking: Ranking,
}

impl<R, C, S> RoundEngine<R, C, S>
where
    R: RandomSource,
    C: Clock,
    S: KeyValueStore,
{
    /// Create an idle engine and read the persisted ranking.
    pub fn new(config: &QuizConfig, rng: R, clock: C, store: S) -> Self {
        let ranking = load_ranking(&store, &config.ranking_key);
        let countdown = Countdown::new(config.time_limit);
        let run = RunContext {
            best_score: ranking.best_score(),
            ..RunContext::default()
        };

        Self {
            rng,
            clock,
            store,
            ranking_key: config.ranking_key.clone(),
            result_display: config.result_display,
            state: RoundState::idle(countdown.remaining()),
            countdown,
            run,
            pending: None,
            ranking,
        }
    }

    // =========================================================================
    // COMMANDS
    // =========================================================================

    /// Begin a new run. Ignored unless idle.
    pub fn start(&mut self) -> Vec<QuizEvent> {
        let mut events = Vec::new();
        if self.state.phase != RoundPhase::Idle {
            debug!(phase = self.state.phase.name(), "start ignored");
            return events;
        }

        self.run = RunContext {
            best_score: self.ranking.best_score(),
            ..RunContext::default()
        };
        self.pending = None;
        self.state.round_index = 1;

        info!(best = self.run.best_score, "run started");
        events.push(QuizEvent::RunStarted {
            best_score: self.run.best_score,
        });
        self.begin_round(&mut events);
        events
    }

    /// Submit the raw text of an answer.
    ///
    /// The leading integer of the text is judged (see [`parse_answer`]).
    /// Ignored when no round is in progress or the text has no leading
    /// digits.
    pub fn submit(&mut self, raw: &str) -> Vec<QuizEvent> {
        let mut events = Vec::new();
        if self.state.phase != RoundPhase::InProgress {
            return events;
        }
        let Some(expected) = self.state.current_question.as_ref().map(|q| q.answer) else {
            return events;
        };
        let Some(value) = parse_answer(raw) else {
            debug!(input = raw, "ignoring non-numeric answer");
            return events;
        };

        // The deadline wins over an answer that arrives after it
        let now = self.clock.monotonic();
        if self.countdown.sample(now) {
            self.resolve(Outcome::TimedOut, None, now, &mut events);
            return events;
        }

        let outcome = if value == i64::from(expected) {
            Outcome::Correct
        } else {
            Outcome::Wrong
        };
        self.resolve(outcome, Some(value), now, &mut events);
        events
    }

    /// Advance time: sample the countdown and run due transitions.
    pub fn tick(&mut self) -> Vec<QuizEvent> {
        let mut events = Vec::new();
        let now = self.clock.monotonic();

        if self.state.phase == RoundPhase::InProgress {
            if self.countdown.sample(now) {
                self.resolve(Outcome::TimedOut, None, now, &mut events);
            } else {
                self.state.time_remaining = self.countdown.remaining();
            }
        }

        if let Some(pending) = self.pending {
            if now >= pending.due {
                self.pending = None;
                match pending.kind {
                    PendingKind::NextRound => {
                        self.state.round_index += 1;
                        self.begin_round(&mut events);
                    }
                    PendingKind::EndRun => self.finish_run(&mut events),
                }
            }
        }

        events
    }

    /// Leave the results screen. Ignored unless the run has ended.
    ///
    /// Everything is reset and the ranking is re-read from the store.
    pub fn retry(&mut self) -> Vec<QuizEvent> {
        if self.state.phase != RoundPhase::Ended {
            debug!(phase = self.state.phase.name(), "retry ignored");
            return Vec::new();
        }

        self.reset_to_idle();
        self.ranking = load_ranking(&self.store, &self.ranking_key);
        info!(entries = self.ranking.len(), "back to idle");
        vec![QuizEvent::Reset]
    }

    /// Stop everything without scoring, e.g. when the player quits mid-run.
    pub fn shutdown(&mut self) {
        if self.state.phase != RoundPhase::Idle {
            debug!(phase = self.state.phase.name(), "engine shut down");
        }
        self.reset_to_idle();
    }

    // =========================================================================
    // QUERIES
    // =========================================================================

    /// Immutable view for rendering.
    pub fn snapshot(&self) -> QuizSnapshot {
        QuizSnapshot {
            round: self.state.clone(),
            outcome: self.run.outcome,
            ranking: self.ranking.clone(),
            best_score: self.run.best_score,
            final_score: self.run.final_score,
            time_limit: self.countdown.limit().as_secs_f64(),
        }
    }

    /// Current phase.
    pub fn phase(&self) -> RoundPhase {
        self.state.phase
    }

    /// Current round state.
    pub fn state(&self) -> &RoundState {
        &self.state
    }

    /// Correct answers of this run, oldest first.
    pub fn history(&self) -> &[u32] {
        &self.run.history
    }

    /// Ranking as last read or written.
    pub fn ranking(&self) -> &Ranking {
        &self.ranking
    }

    /// Whether the countdown is being sampled.
    pub fn is_timer_armed(&self) -> bool {
        self.countdown.is_armed()
    }

    /// The backing store.
    pub fn store(&self) -> &S {
        &self.store
    }

    // =========================================================================
    // TRANSITIONS
    // =========================================================================

    fn begin_round(&mut self, events: &mut Vec<QuizEvent>) {
        let question = generate_question(self.state.round_index, &self.run.history, &mut self.rng);

        self.countdown.start(self.clock.monotonic());
        self.state.phase = RoundPhase::InProgress;
        self.state.time_remaining = self.countdown.remaining();
        self.state.current_question = Some(question.clone());
        self.run.outcome = None;

        events.push(QuizEvent::RoundStarted {
            round_index: self.state.round_index,
            question,
        });
    }

    fn resolve(
        &mut self,
        outcome: Outcome,
        submitted: Option<i64>,
        now: Duration,
        events: &mut Vec<QuizEvent>,
    ) {
        self.countdown.disarm();
        self.state.time_remaining = self.countdown.remaining();
        self.state.phase = RoundPhase::Resolved(outcome);
        self.run.outcome = Some(outcome);

        let expected = self
            .state
            .current_question
            .as_ref()
            .map(|q| q.answer)
            .unwrap_or_default();

        let kind = if outcome.ends_run() {
            PendingKind::EndRun
        } else {
            self.run.history.push(expected);
            PendingKind::NextRound
        };
        self.pending = Some(Pending {
            kind,
            due: now + self.result_display,
        });

        info!(
            round = self.state.round_index,
            ?outcome,
            expected,
            ?submitted,
            "round resolved"
        );
        events.push(QuizEvent::RoundResolved {
            round_index: self.state.round_index,
            outcome,
            expected,
            submitted,
        });
    }

    fn finish_run(&mut self, events: &mut Vec<QuizEvent>) {
        let final_score = self.state.round_index - 1;
        self.state.phase = RoundPhase::Ended;
        self.run.final_score = Some(final_score);

        // Read-modify-write so entries written elsewhere are kept
        let mut ranking = load_ranking(&self.store, &self.ranking_key);
        if ranking.insert(final_score, self.clock.wall()) {
            let persisted = match save_ranking(&mut self.store, &self.ranking_key, &ranking) {
                Ok(()) => true,
                Err(e) => {
                    warn!(error = %e, score = final_score, "ranking not saved");
                    false
                }
            };
            events.push(QuizEvent::RankingUpdated {
                ranking: ranking.clone(),
                persisted,
            });
        }
        self.ranking = ranking;

        let new_best = final_score > self.run.best_score;
        self.run.best_score = self.run.best_score.max(final_score);

        info!(score = final_score, best = self.run.best_score, new_best, "run ended");
        events.push(QuizEvent::RunEnded {
            final_score,
            best_score: self.run.best_score,
            new_best,
        });
    }

    fn reset_to_idle(&mut self) {
        self.countdown.reset();
        self.pending = None;
        self.run.history.clear();
        self.run.outcome = None;
        self.run.final_score = None;
        self.state = RoundState::idle(self.countdown.remaining());
    }
}

/// Read the leading integer of an answer.
///
/// Leading whitespace and one sign are skipped, then the run of ASCII digits
/// is taken and anything after it is ignored, so `"1.5"` and `"1 2"` both
/// read as 1. A digit run too long for `i64` saturates, which can never match
/// an answer. Returns `None` when there are no leading digits.
pub fn parse_answer(raw: &str) -> Option<i64> {
    let s = raw.trim_start();
    let (negative, rest) = match s.as_bytes().first() {
        Some(b'-') => (true, &s[1..]),
        Some(b'+') => (false, &s[1..]),
        _ => (false, s),
    };

    let digits = rest.bytes().take_while(u8::is_ascii_digit);
    let mut value: i64 = 0;
    let mut seen = false;
    for d in digits {
        seen = true;
        let d = i64::from(d - b'0');
        value = value
            .checked_mul(10)
            .and_then(|v| if negative { v.checked_sub(d) } else { v.checked_add(d) })
            .unwrap_or(if negative { i64::MIN } else { i64::MAX });
    }

    seen.then_some(value)
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::clock::ManualClock;
    use crate::core::rng::DeterministicRng;
    use crate::game::question::tests::ScriptedRng;
    use crate::game::question::QuestionKind;
    use crate::game::ranking::RankingEntry;
    use crate::platform::store::{MemoryStore, StoreError};
    use chrono::{DateTime, Utc};
    use std::io;

    const KEY: &str = crate::config::DEFAULT_RANKING_KEY;

    struct FailingStore {
        inner: MemoryStore,
    }

    impl KeyValueStore for FailingStore {
        fn get(&self, key: &str) -> Option<String> {
            self.inner.get(key)
        }

        fn set(&mut self, _key: &str, _value: &str) -> Result<(), StoreError> {
            Err(StoreError::Io(io::Error::new(io::ErrorKind::Other, "quota exceeded")))
        }
    }

    fn engine_with<R: RandomSource, S: KeyValueStore>(
        rng: R,
        store: S,
    ) -> (RoundEngine<R, ManualClock, S>, ManualClock) {
        let clock = ManualClock::default();
        let engine = RoundEngine::new(&QuizConfig::default(), rng, clock.clone(), store);
        (engine, clock)
    }

    fn store_with_scores(scores: &[u32]) -> MemoryStore {
        let entries = scores
            .iter()
            .enumerate()
            .map(|(i, s)| {
                RankingEntry::new(*s, DateTime::<Utc>::from_timestamp(i as i64, 0).unwrap())
            })
            .collect();
        let mut store = MemoryStore::new();
        save_ranking(&mut store, KEY, &Ranking::from_entries(entries)).unwrap();
        store
    }

    fn current_answer<R, S>(engine: &RoundEngine<R, ManualClock, S>) -> u32
    where
        R: RandomSource,
        S: KeyValueStore,
    {
        engine.state().current_question.as_ref().unwrap().answer
    }

    /// Answer the current question correctly and wait for the next round.
    fn answer_and_advance<R, S>(engine: &mut RoundEngine<R, ManualClock, S>, clock: &ManualClock)
    where
        R: RandomSource,
        S: KeyValueStore,
    {
        let answer = current_answer(engine);
        engine.submit(&answer.to_string());
        assert_eq!(engine.phase(), RoundPhase::Resolved(Outcome::Correct));
        clock.advance_ms(1000);
        engine.tick();
        assert_eq!(engine.phase(), RoundPhase::InProgress);
    }

    #[test]
    fn test_start_begins_round_one() {
        let (mut engine, _clock) = engine_with(DeterministicRng::new(1), MemoryStore::new());
        assert_eq!(engine.phase(), RoundPhase::Idle);

        let events = engine.start();

        assert_eq!(engine.phase(), RoundPhase::InProgress);
        assert_eq!(engine.state().round_index, 1);
        assert_eq!(engine.state().time_remaining, 10.0);
        assert!(engine.is_timer_armed());
        assert!(matches!(events[0], QuizEvent::RunStarted { best_score: 0 }));
        assert!(matches!(events[1], QuizEvent::RoundStarted { round_index: 1, .. }));
    }

    #[test]
    fn test_scenario_correct_answer_advances() {
        let (mut engine, clock) = engine_with(DeterministicRng::new(7), MemoryStore::new());
        engine.start();

        clock.advance_ms(2500);
        let events = engine.submit("1");
        assert_eq!(engine.phase(), RoundPhase::Resolved(Outcome::Correct));
        assert!(!engine.is_timer_armed());
        assert!(matches!(
            events[0],
            QuizEvent::RoundResolved { outcome: Outcome::Correct, expected: 1, submitted: Some(1), .. }
        ));
        assert_eq!(engine.history(), &[1]);

        // Still showing the outcome just before the delay ends
        clock.advance_ms(999);
        assert!(engine.tick().is_empty());
        assert_eq!(engine.phase(), RoundPhase::Resolved(Outcome::Correct));

        clock.advance_ms(1);
        let events = engine.tick();
        assert_eq!(engine.phase(), RoundPhase::InProgress);
        assert_eq!(engine.state().round_index, 2);
        assert_eq!(engine.history(), &[1]);
        assert_eq!(engine.state().time_remaining, 10.0);
        assert!(matches!(events[0], QuizEvent::RoundStarted { round_index: 2, .. }));
    }

    #[test]
    fn test_scenario_wrong_answer_records_score() {
        // round 2: +1, round 3: -1, round 4: ahead +2, round 5: ahead +1
        let rng = ScriptedRng::new(&[1, 1, 0, 2, 0, 1]);
        let (mut engine, clock) = engine_with(rng, MemoryStore::new());
        engine.start();
        for _ in 0..4 {
            answer_and_advance(&mut engine, &clock);
        }
        assert_eq!(engine.state().round_index, 5);
        assert_eq!(engine.history(), &[1, 3, 2, 6]);

        engine.submit("0");
        assert_eq!(engine.phase(), RoundPhase::Resolved(Outcome::Wrong));

        clock.advance_ms(1000);
        let events = engine.tick();
        assert_eq!(engine.phase(), RoundPhase::Ended);

        let snap = engine.snapshot();
        assert_eq!(snap.final_score, Some(4));
        assert_eq!(snap.outcome, Some(Outcome::Wrong));
        assert_eq!(snap.ranking.scores(), vec![4]);
        assert!(events.iter().any(|e| matches!(e, QuizEvent::RankingUpdated { persisted: true, .. })));
        assert!(events
            .iter()
            .any(|e| matches!(e, QuizEvent::RunEnded { final_score: 4, new_best: true, .. })));

        // Written through to the store
        assert_eq!(load_ranking(engine.store(), KEY).scores(), vec![4]);
    }

    #[test]
    fn test_scenario_timeout_on_first_round() {
        let (mut engine, clock) = engine_with(DeterministicRng::new(3), MemoryStore::new());
        engine.start();

        clock.advance_ms(9_950);
        assert!(engine.tick().is_empty());
        assert!((engine.state().time_remaining - 0.05).abs() < 1e-9);

        clock.advance_ms(50);
        let events = engine.tick();
        assert_eq!(engine.phase(), RoundPhase::Resolved(Outcome::TimedOut));
        assert_eq!(engine.state().time_remaining, 0.0);
        assert!(matches!(
            events[0],
            QuizEvent::RoundResolved { outcome: Outcome::TimedOut, submitted: None, .. }
        ));

        clock.advance_ms(1000);
        let events = engine.tick();
        assert_eq!(engine.phase(), RoundPhase::Ended);
        assert_eq!(engine.snapshot().final_score, Some(0));
        assert!(!events.iter().any(|e| matches!(e, QuizEvent::RankingUpdated { .. })));
        assert!(engine.store().get(KEY).is_none());
        assert!(engine.ranking().is_empty());
    }

    #[test]
    fn test_scenario_full_ranking_evicts_lowest() {
        let store = store_with_scores(&[10, 8, 6, 4, 2]);
        let (mut engine, clock) = engine_with(DeterministicRng::new(99), store);
        engine.start();
        assert_eq!(engine.snapshot().best_score, 10);

        for _ in 0..7 {
            answer_and_advance(&mut engine, &clock);
        }
        let wrong = current_answer(&engine) + 1;
        engine.submit(&wrong.to_string());
        clock.advance_ms(1000);
        engine.tick();

        assert_eq!(engine.snapshot().final_score, Some(7));
        assert_eq!(engine.ranking().scores(), vec![10, 8, 7, 6, 4]);
        assert_eq!(load_ranking(engine.store(), KEY).scores(), vec![10, 8, 7, 6, 4]);
        assert_eq!(engine.snapshot().best_score, 10);
    }

    #[test]
    fn test_timeout_fires_once() {
        let (mut engine, clock) = engine_with(DeterministicRng::new(3), MemoryStore::new());
        engine.start();
        clock.advance_ms(10_000);

        let first = engine.tick();
        let second = engine.tick();

        let resolved = |events: &[QuizEvent]| {
            events
                .iter()
                .filter(|e| matches!(e, QuizEvent::RoundResolved { .. }))
                .count()
        };
        assert_eq!(resolved(&first), 1);
        assert_eq!(resolved(&second), 0);
    }

    #[test]
    fn test_stale_tick_after_answer_does_not_time_out() {
        let (mut engine, clock) = engine_with(DeterministicRng::new(5), MemoryStore::new());
        engine.start();

        clock.advance_ms(9_990);
        engine.submit("1");
        clock.advance_ms(500);
        engine.tick();

        assert_eq!(engine.phase(), RoundPhase::Resolved(Outcome::Correct));
        assert!((engine.state().time_remaining - 0.01).abs() < 1e-9);
    }

    #[test]
    fn test_late_submit_counts_as_timeout() {
        let (mut engine, clock) = engine_with(DeterministicRng::new(5), MemoryStore::new());
        engine.start();

        // Deadline passed but no tick has observed it yet
        clock.advance_ms(10_200);
        let events = engine.submit("1");

        assert_eq!(engine.phase(), RoundPhase::Resolved(Outcome::TimedOut));
        assert!(engine.history().is_empty());
        assert!(matches!(
            events[0],
            QuizEvent::RoundResolved { outcome: Outcome::TimedOut, .. }
        ));
    }

    #[test]
    fn test_invalid_submissions_ignored() {
        let (mut engine, clock) = engine_with(DeterministicRng::new(5), MemoryStore::new());

        // Nothing running yet
        assert!(engine.submit("1").is_empty());
        assert_eq!(engine.phase(), RoundPhase::Idle);

        engine.start();
        for raw in ["", "   ", "abc", ".5", "x1", "--1", "- 1"] {
            assert!(engine.submit(raw).is_empty(), "{raw:?}");
            assert_eq!(engine.phase(), RoundPhase::InProgress);
        }

        // Surrounding whitespace is fine
        engine.submit(" 1 ");
        assert_eq!(engine.phase(), RoundPhase::Resolved(Outcome::Correct));

        // Second answer in the same round is ignored
        assert!(engine.submit("1").is_empty());
        assert_eq!(engine.history(), &[1]);

        clock.advance_ms(1000);
        engine.tick();
        assert_eq!(engine.state().round_index, 2);
    }

    #[test]
    fn test_leading_integer_is_judged() {
        for raw in ["1.5", "1e3", "1 2", "1a", "+1"] {
            let (mut engine, _clock) = engine_with(DeterministicRng::new(5), MemoryStore::new());
            engine.start();
            let events = engine.submit(raw);
            assert_eq!(engine.phase(), RoundPhase::Resolved(Outcome::Correct), "{raw:?}");
            assert!(matches!(
                events[0],
                QuizEvent::RoundResolved { submitted: Some(1), .. }
            ));
        }
    }

    #[test]
    fn test_overlong_number_is_wrong() {
        let (mut engine, _clock) = engine_with(DeterministicRng::new(5), MemoryStore::new());
        engine.start();
        let events = engine.submit("99999999999999999999");
        assert_eq!(engine.phase(), RoundPhase::Resolved(Outcome::Wrong));
        assert!(matches!(
            events[0],
            QuizEvent::RoundResolved { submitted: Some(i64::MAX), .. }
        ));
    }

    #[test]
    fn test_parse_answer() {
        assert_eq!(parse_answer("42"), Some(42));
        assert_eq!(parse_answer("  7 "), Some(7));
        assert_eq!(parse_answer("-3xyz"), Some(-3));
        assert_eq!(parse_answer("0012"), Some(12));
        assert_eq!(parse_answer("-99999999999999999999"), Some(i64::MIN));
        assert_eq!(parse_answer(""), None);
        assert_eq!(parse_answer("-"), None);
        assert_eq!(parse_answer("abc"), None);
    }

    #[test]
    fn test_negative_answer_is_wrong() {
        let (mut engine, _clock) = engine_with(DeterministicRng::new(5), MemoryStore::new());
        engine.start();
        engine.submit("-1");
        assert_eq!(engine.phase(), RoundPhase::Resolved(Outcome::Wrong));
    }

    #[test]
    fn test_countdown_resets_every_round() {
        let (mut engine, clock) = engine_with(DeterministicRng::new(11), MemoryStore::new());
        engine.start();

        clock.advance_ms(6_000);
        engine.tick();
        assert!((engine.state().time_remaining - 4.0).abs() < 1e-9);

        answer_and_advance(&mut engine, &clock);
        assert_eq!(engine.state().time_remaining, 10.0);

        clock.advance_ms(9_000);
        engine.tick();
        assert_eq!(engine.phase(), RoundPhase::InProgress);
        assert!((engine.state().time_remaining - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_time_remaining_non_increasing() {
        let (mut engine, clock) = engine_with(DeterministicRng::new(2), MemoryStore::new());
        engine.start();

        let mut last = engine.state().time_remaining;
        for _ in 0..250 {
            clock.advance_ms(50);
            engine.tick();
            let now = engine.state().time_remaining;
            assert!(now <= last);
            assert!(now >= 0.0);
            last = now;
        }
        assert_eq!(engine.phase(), RoundPhase::Ended);
    }

    #[test]
    fn test_history_feeds_past_answer_questions() {
        let (mut engine, clock) = engine_with(DeterministicRng::new(1234), MemoryStore::new());
        engine.start();

        for _ in 0..40 {
            let question = engine.state().current_question.clone().unwrap();
            if let QuestionKind::PastAnswer { n, .. } = question.kind {
                let history = engine.history();
                assert_eq!(question.answer, history[history.len() - n as usize]);
            }
            answer_and_advance(&mut engine, &clock);
        }
        assert_eq!(engine.history().len(), 40);
    }

    #[test]
    fn test_write_failure_still_ends_run() {
        let rng = ScriptedRng::new(&[1]);
        let store = FailingStore { inner: MemoryStore::new() };
        let (mut engine, clock) = engine_with(rng, store);

        engine.start();
        answer_and_advance(&mut engine, &clock);
        engine.submit("99");
        clock.advance_ms(1000);
        let events = engine.tick();

        assert_eq!(engine.phase(), RoundPhase::Ended);
        assert_eq!(engine.snapshot().final_score, Some(1));
        // In-memory ranking still reflects the run
        assert_eq!(engine.ranking().scores(), vec![1]);
        assert!(events
            .iter()
            .any(|e| matches!(e, QuizEvent::RankingUpdated { persisted: false, .. })));

        // The lost write shows up after retry re-reads the store
        engine.retry();
        assert!(engine.ranking().is_empty());
    }

    #[test]
    fn test_retry_resets_and_rereads_ranking() {
        let (mut engine, clock) = engine_with(ScriptedRng::new(&[]), MemoryStore::new());
        engine.start();
        engine.submit("1");
        clock.advance_ms(1000);
        engine.tick();
        engine.submit("0");
        clock.advance_ms(1000);
        engine.tick();
        assert_eq!(engine.phase(), RoundPhase::Ended);

        // Results screen keeps the last question for the answer reveal
        assert!(engine.snapshot().round.current_question.is_some());

        let events = engine.retry();
        assert_eq!(events, vec![QuizEvent::Reset]);
        assert_eq!(engine.phase(), RoundPhase::Idle);
        assert!(engine.history().is_empty());
        assert_eq!(engine.state().round_index, 1);
        assert!(engine.state().current_question.is_none());
        assert_eq!(engine.ranking().scores(), vec![1]);

        let events = engine.start();
        assert!(matches!(events[0], QuizEvent::RunStarted { best_score: 1 }));
    }

    #[test]
    fn test_commands_ignored_in_wrong_phase() {
        let (mut engine, clock) = engine_with(DeterministicRng::new(8), MemoryStore::new());

        assert!(engine.retry().is_empty());
        engine.start();
        assert!(engine.start().is_empty());
        assert!(engine.retry().is_empty());
        assert_eq!(engine.state().round_index, 1);

        engine.submit("0");
        clock.advance_ms(1000);
        engine.tick();
        assert!(engine.start().is_empty());
        assert_eq!(engine.phase(), RoundPhase::Ended);
    }

    #[test]
    fn test_shutdown_disarms_everything() {
        let (mut engine, clock) = engine_with(DeterministicRng::new(8), MemoryStore::new());
        engine.start();
        engine.submit("0");
        engine.shutdown();

        clock.advance_ms(20_000);
        assert!(engine.tick().is_empty());
        assert_eq!(engine.phase(), RoundPhase::Idle);
        assert!(!engine.is_timer_armed());
        assert!(engine.store().get(KEY).is_none());
    }

    #[test]
    fn test_malformed_stored_ranking_treated_as_empty() {
        let mut store = MemoryStore::new();
        store.set(KEY, "{broken").unwrap();
        let (mut engine, clock) = engine_with(ScriptedRng::new(&[]), store);
        assert!(engine.ranking().is_empty());

        engine.start();
        engine.submit("1");
        clock.advance_ms(1000);
        engine.tick();
        engine.submit("0");
        clock.advance_ms(1000);
        engine.tick();

        assert_eq!(load_ranking(engine.store(), KEY).scores(), vec![1]);
    }

    #[test]
    fn test_ranking_timestamp_uses_wall_clock() {
        let (mut engine, clock) = engine_with(ScriptedRng::new(&[]), MemoryStore::new());
        engine.start();
        engine.submit("1");
        clock.advance_ms(1000);
        engine.tick();
        engine.submit("0");
        clock.advance_ms(1000);
        engine.tick();

        let entry = &engine.ranking().entries()[0];
        assert_eq!(entry.timestamp.timestamp_millis(), 2000);
    }
}
