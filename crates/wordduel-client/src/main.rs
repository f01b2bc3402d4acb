//! WordDuel terminal client entry point.
//!
//! Connects to the server, runs the password handshake, then multiplexes two
//! inputs in one loop: lines typed on stdin (commands) and frames arriving
//! from the server (printed as they come, so a hint or a broadcast shows up
//! even while the prompt is idle).

use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::EnvFilter;

use wordduel_client::connection::{ServerConnection, ServerEvent};
use wordduel_client::display::{describe, player_label};
use wordduel_core::Message;

const HELP: &str = "\
Commands:
  list                 show online opponents
  match <id> <word>    challenge an opponent with a secret word
  guess <word>         guess the word of your current match
  hint <text>          send a hint to your opponent
  help                 show this list
  quit                 leave";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Keep the terminal clean: only warnings and errors unless RUST_LOG says
    // otherwise.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .init();

    let addr = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "127.0.0.1:4000".to_string());

    let (mut conn, mut events) = ServerConnection::connect(&addr).await?;
    println!("Connected to {addr}.");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    println!("Password:");
    let password = match lines.next_line().await? {
        Some(line) => line,
        None => return Ok(()),
    };
    let id = conn.authenticate(&mut events, password.trim()).await?;
    println!("Welcome, {} (id {id}).", player_label(id));
    println!("{HELP}");

    loop {
        tokio::select! {
            event = events.recv() => match event {
                Some(ServerEvent::Message(msg)) => println!("{}", describe(&msg)),
                Some(ServerEvent::Disconnected) | None => {
                    println!("Server closed the connection.");
                    break;
                }
            },
            line = lines.next_line() => {
                let Some(line) = line? else { break };
                if !handle_command(&mut conn, line.trim()).await? {
                    break;
                }
            }
        }
    }

    Ok(())
}

/// Parses one command line and sends the matching message.
///
/// Returns `false` when the user asked to quit.
async fn handle_command(conn: &mut ServerConnection, line: &str) -> anyhow::Result<bool> {
    let (command, rest) = match line.split_once(char::is_whitespace) {
        Some((head, tail)) => (head, tail.trim()),
        None => (line, ""),
    };

    match command {
        "" => {}
        "list" => conn.send(&Message::RequestOpponents).await?,
        "match" => match rest.split_once(char::is_whitespace) {
            Some((id, word)) => match id.parse() {
                Ok(opponent) => {
                    conn.send(&Message::RequestMatch {
                        opponent,
                        word: word.trim().to_string(),
                    })
                    .await?;
                }
                Err(_) => println!("\"{id}\" is not an opponent id."),
            },
            None => println!("Usage: match <id> <word>"),
        },
        "guess" => {
            if rest.is_empty() {
                println!("Usage: guess <word>");
            } else {
                conn.send(&Message::GuessWord(rest.to_string())).await?;
            }
        }
        "hint" => {
            if rest.is_empty() {
                println!("Usage: hint <text>");
            } else {
                conn.send(&Message::Hint(rest.to_string())).await?;
            }
        }
        "help" => println!("{HELP}"),
        "quit" => return Ok(false),
        other => println!("Unknown command \"{other}\" — try \"help\"."),
    }

    Ok(true)
}
