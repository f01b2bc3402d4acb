//! Terminal rendering of identities and inbound messages.

use wordduel_core::{Message, PlayerId};

/// Maps an identity to its display label: 1 → "Player A", 2 → "Player B", …
///
/// Identities beyond the alphabet fall back to the numeric form.
pub fn player_label(id: PlayerId) -> String {
    if (1..=26).contains(&id) {
        let letter = (b'A' + (id - 1) as u8) as char;
        format!("Player {letter}")
    } else {
        format!("Player #{id}")
    }
}

/// One line of terminal output per inbound message.
pub fn describe(msg: &Message) -> String {
    match msg {
        Message::OpponentsResponse(ids) if ids.is_empty() => {
            "No opponents online.".to_string()
        }
        Message::OpponentsResponse(ids) => {
            let list = ids
                .iter()
                .map(|&id| format!("{} (id {id})", player_label(id)))
                .collect::<Vec<_>>()
                .join(", ");
            format!("Online opponents: {list}")
        }
        Message::MatchConfirm => "Match started — guesses and hints are open.".to_string(),
        Message::Hint(text) => format!("Hint from your opponent: {text}"),
        Message::ProgressUpdate { success: true, guess } => {
            format!("\"{guess}\" is correct!")
        }
        Message::ProgressUpdate { success: false, guess } => {
            format!("\"{guess}\" is not the word.")
        }
        Message::Text(text) => text.trim().to_string(),
        Message::EndMatch => "The match is over.".to_string(),
        Message::Error(reason) => format!("Server error: {reason}"),
        other => format!("<{other:?}>"),
    }
}
