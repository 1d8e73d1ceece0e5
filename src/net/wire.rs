//! The line protocol spoken with the chat server.
//!
//! Server to client, one event per line:
//!
//! ```text
//! message <user> <text...>
//! activity <text...>
//! status [<user> ...]
//! ```
//!
//! Client to server: `join <room> <user>` once after connecting, then `say <text...>` for every
//! submitted line.

use crate::error::WireError;
use crate::meta::{ActivityNotice, ChatMessage, RosterSnapshot};
use crate::router::{ChatEvent, EventKind};

/// Split off the first whitespace-separated word.  No whitespace means it's all head.
fn split_head(line: &str) -> (&str, &str) {
    match line.split_once(char::is_whitespace) {
        Some((head, rest)) => (head, rest),
        None => (line, ""),
    }
}

/// Parse one server line.  Unknown kinds are reported as such so the caller can tell a protocol
/// mismatch from a single garbled line.  Blank lines (keep-alives, stray `\r`) are `Blank`.
pub fn decode(line: &str) -> Result<ChatEvent, WireError> {
    let line = line.strip_suffix('\r').unwrap_or(line);
    if line.trim().is_empty() {
        return Err(WireError::Blank);
    }
    let (head, rest) = split_head(line);
    let kind: EventKind = head.parse()?;

    let event = match kind {
        EventKind::MessageReceived => {
            let (sender, text) = split_head(rest);
            if sender.is_empty() {
                return Err(WireError::Malformed {
                    kind,
                    reason: "missing sender",
                });
            }
            ChatEvent::MessageReceived(ChatMessage::new(sender, text))
        }
        EventKind::ActivityUpdate => ChatEvent::ActivityUpdate(ActivityNotice::new(rest)),
        EventKind::StatusUpdated => ChatEvent::StatusUpdated(rest.split_whitespace().collect::<RosterSnapshot>()),
    };

    Ok(event)
}

/// Keep a single submission on a single line.
fn one_line(text: &str) -> String {
    text.replace(|c: char| c == '\n' || c == '\r', " ")
}

pub fn encode_join(room: &str, user: &str) -> String {
    format!("join {} {}\n", one_line(room), one_line(user))
}

pub fn encode_say(text: &str) -> String {
    format!("say {}\n", one_line(text))
}
