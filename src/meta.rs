//! Domain types shared by the router, the controller and the collaborators that feed them.

use std::fmt;

use crate::error::TransportError;

/// The name of a chat participant.  Compared by value, case-sensitive.
#[derive(Clone, PartialEq, Eq, Hash, Debug, PartialOrd, Ord)]
pub struct UserIdentity(String);

impl UserIdentity {
    pub fn new(name: impl Into<String>) -> UserIdentity {
        UserIdentity(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UserIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for UserIdentity {
    fn from(name: &str) -> UserIdentity {
        UserIdentity::new(name)
    }
}

impl From<String> for UserIdentity {
    fn from(name: String) -> UserIdentity {
        UserIdentity(name)
    }
}

/// A line of chat text and who said it.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct ChatMessage {
    pub sender: UserIdentity,
    pub text: String,
}

impl ChatMessage {
    pub fn new(sender: impl Into<UserIdentity>, text: impl Into<String>) -> ChatMessage {
        ChatMessage {
            sender: sender.into(),
            text: text.into(),
        }
    }
}

/// A join/leave style notice, e.g. "alice join".  The first whitespace-delimited word names the
/// user it is about.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct ActivityNotice(String);

impl ActivityNotice {
    pub fn new(line: impl Into<String>) -> ActivityNotice {
        ActivityNotice(line.into())
    }

    /// The leading token of the notice.  A notice with no whitespace is all identity; an empty
    /// notice yields an empty identity rather than an error.
    pub fn identity(&self) -> UserIdentity {
        let head = self.0.split(char::is_whitespace).next().unwrap_or("");
        UserIdentity::new(head)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Everyone currently present, in the order the server listed them.  Always a full snapshot.
#[derive(Clone, PartialEq, Eq, Debug, Default)]
pub struct RosterSnapshot(Vec<UserIdentity>);

impl RosterSnapshot {
    pub fn new(users: Vec<UserIdentity>) -> RosterSnapshot {
        RosterSnapshot(users)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, UserIdentity> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<U: Into<UserIdentity>> FromIterator<U> for RosterSnapshot {
    fn from_iter<T: IntoIterator<Item = U>>(iter: T) -> RosterSnapshot {
        RosterSnapshot(iter.into_iter().map(Into::into).collect())
    }
}

/// Where submitted input lines go.  The TCP transport implements this; so does anything that
/// wants to capture what the user typed.
pub trait Outbound {
    fn send_line(&mut self, line: &str) -> Result<(), TransportError>;
}

/// Outbound sink that only logs.  Used when there is no server to talk to (demo mode).
pub struct LoggingOutbound;

impl Outbound for LoggingOutbound {
    fn send_line(&mut self, line: &str) -> Result<(), TransportError> {
        tracing::info!(line, "no transport attached; dropping outbound line");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn notice_identity_is_first_word() {
        assert_eq!(ActivityNotice::new("bob left").identity(), UserIdentity::new("bob"));
        assert_eq!(ActivityNotice::new("carol\tjoined the room").identity(), UserIdentity::new("carol"));
    }

    #[test]
    fn notice_without_whitespace_is_all_identity() {
        assert_eq!(ActivityNotice::new("dave").identity(), UserIdentity::new("dave"));
    }

    #[test]
    fn empty_notice_degrades_to_empty_identity() {
        assert_eq!(ActivityNotice::new("").identity(), UserIdentity::new(""));
    }

    #[test]
    fn leading_whitespace_is_not_trimmed() {
        // "activity  bob left" on the wire leaves a leading space in the notice.
        let notice = ActivityNotice::new(" bob left");
        assert_eq!(notice.identity(), UserIdentity::new(""));
        assert_eq!(notice.as_str(), " bob left");
    }

    #[test]
    fn identities_are_case_sensitive() {
        assert_ne!(UserIdentity::new("Alice"), UserIdentity::new("alice"));
    }

    #[test]
    fn roster_keeps_order_and_duplicates() {
        let roster: RosterSnapshot = vec!["b", "a", "b"].into_iter().collect();
        let names: Vec<&str> = roster.iter().map(UserIdentity::as_str).collect();
        assert_eq!(names, vec!["b", "a", "b"]);
    }
}
