//! Terminal front end for the Woodpecker trainer.
//!
//! Usage: `woodpecker [PUZZLE_SET_ID]`. Without an id the available sets are
//! listed and one is read from stdin.

use anyhow::Context;
use chess_core::shakmaty::uci::UciMove;
use chess_core::shakmaty::{Color, File, Position, Rank, Square};
use chess_core::{color_name, parse_square, parse_uci};
use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use woodpecker_client::events::Event;
use woodpecker_client::history::format_elapsed;
use woodpecker_client::{
    ClientConfig, HttpApi, Key, MoveOutcome, Phase, Rating, Trainer, TrainerRuntime,
};

const HELP: &str = "commands: <uci move> | hint | mark <sq> | next (or empty line) | < | > | up | down | retry | quit";

enum Flow {
    Continue,
    Quit,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()),
        )
        .init();

    let config = ClientConfig::from_env();
    info!(api_url = %config.api_url, "Starting woodpecker");

    let api = HttpApi::new(&config)?;
    let mut runtime = TrainerRuntime::new(api, &config);
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    let sets = runtime
        .puzzle_sets()
        .await
        .context("failed to list puzzle sets")?
        .to_vec();
    if sets.is_empty() {
        println!("No puzzle sets available.");
        return Ok(());
    }

    let set_id = match std::env::args().nth(1).and_then(|s| s.parse::<i64>().ok()) {
        Some(id) => id,
        None => {
            for set in &sets {
                println!("{:>4}  {}", set.id, set.name);
            }
            println!("Choose a puzzle set:");
            match read_set_id(&mut lines).await? {
                Some(id) => id,
                None => return Ok(()),
            }
        }
    };

    runtime.start(set_id).await?;
    println!("{HELP}");
    render(runtime.trainer());

    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line? else { break };
                match handle_command(&mut runtime, line.trim()).await {
                    Ok(Flow::Quit) => break,
                    Ok(Flow::Continue) => {}
                    Err(e) => {
                        warn!("Command failed: {e}");
                        println!("error: {e}");
                    }
                }

                if runtime.trainer().finished_session().is_some() {
                    render_summary(runtime.trainer());
                    break;
                }
                render(runtime.trainer());
            }
            Some(event) = runtime.recv_event() => {
                let opening = matches!(event, Event::OpeningMoveDue { .. });
                if runtime.apply_event(event) && opening {
                    render(runtime.trainer());
                }
            }
        }
    }

    Ok(())
}

async fn read_set_id(lines: &mut Lines<BufReader<Stdin>>) -> anyhow::Result<Option<i64>> {
    while let Some(line) = lines.next_line().await? {
        match line.trim().parse::<i64>() {
            Ok(id) => return Ok(Some(id)),
            Err(_) => println!("Enter a numeric puzzle set id."),
        }
    }
    Ok(None)
}

async fn handle_command(
    runtime: &mut TrainerRuntime<HttpApi>,
    command: &str,
) -> anyhow::Result<Flow> {
    let mut parts = command.split_whitespace();
    match (parts.next(), parts.next()) {
        (None, _) | (Some("next"), _) => {
            runtime.key(Key::Enter).await?;
        }
        (Some("quit"), _) | (Some("q"), _) => return Ok(Flow::Quit),
        (Some("help"), _) => println!("{HELP}"),
        (Some("hint"), _) => match runtime.hint().await? {
            Some(square) => println!("Hint: look at {square}"),
            None => println!("Hint arrived too late."),
        },
        (Some("mark"), Some(square)) => {
            let square = parse_square(square)?;
            runtime.toggle_highlight(square)?;
        }
        (Some("<"), _) => {
            runtime.key(Key::Left).await?;
        }
        (Some(">"), _) => {
            runtime.key(Key::Right).await?;
        }
        (Some("up"), _) => runtime.rate(Rating::Up).await?,
        (Some("down"), _) => runtime.rate(Rating::Down).await?,
        (Some("retry"), _) => report(runtime.retry_move().await?),
        (Some(text), _) => {
            let UciMove::Normal {
                from,
                to,
                promotion,
            } = parse_uci(text)?
            else {
                println!("Unrecognized command. {HELP}");
                return Ok(Flow::Continue);
            };
            report(runtime.drop_piece(from, to, promotion).await?);
        }
    }
    Ok(Flow::Continue)
}

fn report(outcome: MoveOutcome) {
    match outcome {
        MoveOutcome::Rejected => println!("Illegal move."),
        MoveOutcome::Continue { reply: Some(reply) } => println!("Correct. Opponent plays {reply}."),
        MoveOutcome::Continue { reply: None } => println!("Correct."),
        MoveOutcome::Solved => println!("Solved! Press Enter for the next puzzle."),
        MoveOutcome::SolutionShown { .. } => {
            println!("Incorrect. Step through the solution with < and >.")
        }
        MoveOutcome::PuzzleExhausted => println!("Incorrect. Moving on."),
        MoveOutcome::Stale => {}
    }
}

fn render(trainer: &Trainer) {
    let (Some(board), Some(orientation)) = (trainer.board(), trainer.orientation()) else {
        return;
    };

    let score = trainer.score().unwrap_or_default();
    let elapsed = format_elapsed(trainer.elapsed_seconds().unwrap_or_default());
    let to_move = trainer.side_to_move().map(color_name).unwrap_or("-");
    println!();
    println!("Score {score}  Time {elapsed}  {to_move} to move");

    let highlights = trainer.highlights();
    let hint = trainer.hint_square();
    let ranks: Vec<Rank> = match orientation {
        Color::White => Rank::ALL.iter().rev().copied().collect(),
        Color::Black => Rank::ALL.to_vec(),
    };
    let files: Vec<File> = match orientation {
        Color::White => File::ALL.to_vec(),
        Color::Black => File::ALL.iter().rev().copied().collect(),
    };

    for rank in &ranks {
        let mut row = format!("{} ", rank.char());
        for file in &files {
            let square = Square::from_coords(*file, *rank);
            let piece = board
                .position()
                .board()
                .piece_at(square)
                .map(|p| p.char())
                .unwrap_or('.');
            let mark = if hint == Some(square) {
                '?'
            } else if highlights.contains(&square) {
                '*'
            } else {
                ' '
            };
            row.push(piece);
            row.push(mark);
        }
        println!("{row}");
    }
    let footer: String = files.iter().map(|f| format!("{} ", f.char())).collect();
    println!("  {footer}");

    if let Some(last) = trainer.last_move() {
        println!("Last move: {last}");
    }
    match trainer.phase() {
        Some(Phase::SolutionReveal) => {
            if let Some((index, len)) = trainer.replay_cursor() {
                println!("Solution {index}/{len}");
            }
        }
        Some(Phase::AwaitingOpening) => println!("Waiting for the opponent..."),
        Some(Phase::Ending) => println!("Set complete. Press Enter to fetch the summary."),
        _ => {}
    }
    if trainer.has_failed_move() {
        println!("The last move could not be sent. Type `retry`.");
    }
}

fn render_summary(trainer: &Trainer) {
    println!();
    println!("Set complete.");
    if let Some(summary) = trainer.summary() {
        println!(
            "Score {}  Time {}  Attempts {}",
            summary.score,
            format_elapsed(summary.elapsed_seconds),
            summary.attempts
        );
        if let Some(delta) = summary.score_delta() {
            println!("Score change vs previous: {delta:+}");
        }
        if let Some(delta) = summary.elapsed_delta() {
            println!("Time change vs previous: {delta:+}s");
        }
    }

    let rows = trainer.history().rows();
    if rows.is_empty() {
        return;
    }
    println!();
    println!("History:");
    for row in rows {
        let marker = if row.is_current { ">" } else { " " };
        println!(
            "{marker} {}  {:<24} {:>4}  {}",
            row.date, row.puzzle_set, row.score, row.elapsed
        );
    }
}
