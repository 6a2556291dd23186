//! `parley chat` — Interactive or single-message chat mode.

use std::io::Write;

use futures::{Stream, StreamExt};
use parley_agent::{QueryRouter, RouterSettings};
use parley_config::AppConfig;
use parley_memory::ConversationLedger;
use tokio::io::{self, AsyncBufReadExt, BufReader};
use tracing::{info, warn};

/// What a line typed at the prompt asks for.
#[derive(Debug, PartialEq, Eq)]
pub enum Input<'a> {
    Exit,
    Reset,
    History,
    Empty,
    Query(&'a str),
}

pub fn parse_input(line: &str) -> Input<'_> {
    let trimmed = line.trim();
    match trimmed.to_lowercase().as_str() {
        "" => Input::Empty,
        "exit" | "quit" | "bye" => Input::Exit,
        "clear" | "reset" => Input::Reset,
        "history" => Input::History,
        _ => Input::Query(trimmed),
    }
}

/// How a streamed answer ended.
#[derive(Debug, PartialEq, Eq)]
enum Outcome {
    Completed,
    Cancelled,
}

pub async fn run(
    config: AppConfig,
    message: Option<String>,
    max_turns: Option<usize>,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut router = build_router(&config, max_turns);

    let missing = config.missing_credentials();
    if !missing.is_empty() {
        eprintln!();
        eprintln!("  Warning: these API keys are missing: {}", missing.join(", "));
        eprintln!("  Some answers will be limited. Set them as environment variables or in:");
        eprintln!("    {}", AppConfig::config_dir().join("config.toml").display());
        eprintln!();
        warn!(missing = ?missing, "Missing API keys");
    }

    if let Some(msg) = message {
        // Single message mode
        answer(&mut router, msg.trim()).await?;
        println!();
        return Ok(());
    }

    // Interactive mode
    println!();
    println!("  Parley — Interactive Mode");
    println!();
    println!("  Model:     {}", config.model);
    println!("  Tools:     {}", router.tools().names().join(", "));
    println!("  Memory:    last {} exchanges", router.ledger().max_turns());
    println!();
    println!("  Type 'history' to see the conversation, 'clear' to forget it.");
    println!("  Type 'exit' to quit. Ctrl+C stops an answer in progress.");
    println!();

    let mut lines = BufReader::new(io::stdin()).lines();

    loop {
        print!("  You > ");
        std::io::stdout().flush()?;

        let line = tokio::select! {
            line = lines.next_line() => line?,
            _ = tokio::signal::ctrl_c() => {
                println!();
                println!("  Interrupted. Type 'exit' to quit or ask another question.");
                continue;
            }
        };

        // EOF
        let Some(line) = line else {
            break;
        };

        match parse_input(&line) {
            Input::Exit => break,
            Input::Empty => {
                println!("  Please enter a question or command.");
            }
            Input::Reset => {
                router.reset();
                println!("  Memory cleared. Let's start fresh!");
            }
            Input::History => {
                let rendered = router.ledger().render_human_readable();
                if rendered.is_empty() {
                    println!("  (no conversation yet)");
                } else {
                    println!();
                    println!("{rendered}");
                }
                println!();
            }
            Input::Query(query) => {
                print!("\n  Assistant > ");
                std::io::stdout().flush()?;
                if answer(&mut router, query).await? == Outcome::Cancelled {
                    println!("\n  [cancelled]");
                }
                println!("\n");
            }
        }
    }

    println!();
    println!("  Goodbye!");
    println!();
    info!(session = %router.session_id(), "Chat session ended");

    Ok(())
}

fn build_router(config: &AppConfig, max_turns: Option<usize>) -> QueryRouter {
    let provider = parley_providers::build_from_config(config);
    let tools = parley_tools::default_registry(config);
    let ledger = ConversationLedger::new(max_turns.unwrap_or(config.memory.max_turns));
    QueryRouter::new(provider, tools, ledger, RouterSettings::from_config(config))
}

/// Stream one answer to stdout. Ctrl+C drops the stream mid-answer.
async fn answer(router: &mut QueryRouter, query: &str) -> Result<Outcome, std::io::Error> {
    let stream = router.process_query(query);
    print_until(stream, &mut std::io::stdout(), tokio::signal::ctrl_c()).await
}

/// Write fragments to `out` as they arrive, until the stream ends or
/// `cancel` resolves.
async fn print_until<S, W, C>(
    stream: S,
    out: &mut W,
    cancel: C,
) -> Result<Outcome, std::io::Error>
where
    S: Stream<Item = String>,
    W: Write,
    C: Future,
{
    futures::pin_mut!(stream);
    futures::pin_mut!(cancel);

    loop {
        tokio::select! {
            fragment = stream.next() => match fragment {
                Some(text) => {
                    write!(out, "{text}")?;
                    out.flush()?;
                }
                None => return Ok(Outcome::Completed),
            },
            _ = &mut cancel => return Ok(Outcome::Cancelled),
        }
    }
}
