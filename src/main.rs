//! Quiz Number
//!
//! Terminal front end. Runs the round engine on a single-threaded event
//! loop fed by a countdown interval and lines typed on stdin.

use std::io::{self, Stdout, Write};

use anyhow::{Context, Result};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use quiz_number::{
    game::{QuizEvent, Urgency},
    platform::{share_text, ResultSharer, TerminalClipboard},
    DeterministicRng, FileStore, Outcome, QuizConfig, QuizSnapshot, RoundEngine, RoundPhase,
    SystemClock, VERSION,
};

type Engine = RoundEngine<DeterministicRng, SystemClock, FileStore>;
type Sharer = ResultSharer<TerminalClipboard<Stdout>>;

/// What a line of input asked for.
enum Command {
    Events(Vec<QuizEvent>),
    Quit,
}

/// Rendering state that is not part of the engine.
#[derive(Default)]
struct View {
    /// Last whole second announced for the current round
    last_second: Option<u32>,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    // Logs go to stderr so they never interleave with the prompt
    let filter = EnvFilter::try_from_env("QUIZ_LOG").unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();

    let config = QuizConfig::from_env().context("invalid configuration")?;
    info!("Quiz Number v{}", VERSION);

    let (rng, seed) = match config.seed {
        Some(seed) => (DeterministicRng::new(seed), seed),
        None => DeterministicRng::from_entropy(),
    };
    let store = FileStore::new(&config.store_path);
    info!(seed, store = %store.path().display(), "starting");

    let mut engine: Engine = RoundEngine::new(&config, rng, SystemClock::new(), store);
    let mut sharer: Sharer = ResultSharer::clipboard_only(TerminalClipboard::new(io::stdout()));

    let mut ticker = interval(config.tick_interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut view = View::default();

    print_title(&engine.snapshot());

    loop {
        let events = tokio::select! {
            _ = ticker.tick() => engine.tick(),
            line = lines.next_line() => {
                let Some(line) = line.context("failed to read stdin")? else {
                    break;
                };
                match handle_line(&mut engine, &mut sharer, &config, line.trim()) {
                    Command::Events(events) => events,
                    Command::Quit => break,
                }
            }
        };

        if !events.is_empty() || engine.phase() == RoundPhase::InProgress {
            render(&events, &engine.snapshot(), &mut view)?;
        }
    }

    engine.shutdown();
    info!("bye");
    Ok(())
}

fn handle_line(engine: &mut Engine, sharer: &mut Sharer, config: &QuizConfig, line: &str) -> Command {
    if line.eq_ignore_ascii_case("q") || line.eq_ignore_ascii_case("quit") {
        return Command::Quit;
    }

    match engine.phase() {
        RoundPhase::Idle => Command::Events(engine.start()),
        RoundPhase::InProgress | RoundPhase::Resolved(_) => Command::Events(engine.submit(line)),
        RoundPhase::Ended => {
            if line.eq_ignore_ascii_case("share") {
                let snap = engine.snapshot();
                let text = share_text(
                    snap.final_score.unwrap_or(0),
                    Some(snap.best_score),
                    &config.share_url,
                );
                sharer.share(&text, |notice| println!("{notice}"));
                Command::Events(Vec::new())
            } else {
                let mut events = engine.retry();
                events.extend(engine.start());
                Command::Events(events)
            }
        }
    }
}

fn print_title(snap: &QuizSnapshot) {
    println!("==============================");
    println!("  何問目クイズ  v{VERSION}");
    println!("==============================");
    println!("制限時間 {:.0} 秒。間違えるか時間切れで終了。", snap.time_limit);
    if snap.best_score > 0 {
        println!("ベスト記録: {}", snap.best_score);
    }
    println!("Enter でスタート / q で終了");
}

fn render(events: &[QuizEvent], snap: &QuizSnapshot, view: &mut View) -> io::Result<()> {
    let mut out = io::stdout().lock();

    for event in events {
        debug!(event = event.name(), "engine event");
        match event {
            QuizEvent::RoundStarted { round_index, question } => {
                view.last_second = None;
                writeln!(out)?;
                writeln!(out, "[Q{round_index}] {}  (正解数: {})", question.text, snap.streak())?;
                if let Some(hint) = &question.hint {
                    writeln!(out, "        {hint}")?;
                }
                write!(out, "> ")?;
            }
            QuizEvent::RoundResolved { outcome, .. } => {
                let label = match outcome {
                    Outcome::Correct => "✓ 正解！",
                    Outcome::Wrong => "✗ 不正解",
                    Outcome::TimedOut => "TIME UP",
                };
                writeln!(out, "{label}")?;
            }
            QuizEvent::RunEnded { final_score, best_score, new_best } => {
                writeln!(out)?;
                writeln!(out, "GAME OVER  {final_score}問正解")?;
                if let Some(question) = &snap.round.current_question {
                    writeln!(out, "正解は {} でした", question.answer)?;
                }
                let marker = if *new_best { " (NEW!)" } else { "" };
                writeln!(out, "ベスト記録: {best_score}{marker}")?;
                for (rank, entry) in snap.ranking.entries().iter().enumerate() {
                    writeln!(
                        out,
                        "  {}. {:>3}問  {}",
                        rank + 1,
                        entry.score,
                        entry.timestamp.format("%Y-%m-%d %H:%M")
                    )?;
                }
                writeln!(out, "Enter: もう一度 / share: 結果をシェア / q: 終了")?;
            }
            QuizEvent::RunStarted { .. } | QuizEvent::RankingUpdated { .. } | QuizEvent::Reset => {}
        }
    }

    // Announce the last few seconds once each
    if snap.accepts_input() && snap.urgency() != Urgency::Calm {
        let second = snap.round.time_remaining.ceil() as u32;
        if view.last_second != Some(second) && second > 0 {
            view.last_second = Some(second);
            write!(out, "[残り{second}秒] ")?;
        }
    }

    out.flush()
}
