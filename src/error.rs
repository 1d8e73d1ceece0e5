//! Error types for every layer of the client.

use std::io;

use thiserror::Error;

use crate::router::EventKind;

/// Failures reported by `EventRouter` to whoever called `publish` (normally the transport loop).
#[derive(Debug, Error)]
pub enum RouterError {
    #[error("unknown event kind `{0}`")]
    UnknownEventKind(String),
    #[error("handler for {kind} is already running; nested publish of the same kind is not supported")]
    Reentrant { kind: EventKind },
    #[error("handler for {kind} failed")]
    Handler {
        kind: EventKind,
        #[source]
        source: HandlerError,
    },
}

/// Failures raised while a handler is updating panes or sending input out.
#[derive(Debug, Error)]
pub enum HandlerError {
    #[error("redraw failed")]
    Render(#[from] io::Error),
    #[error("couldn't hand submitted input to the transport")]
    Outbound(#[from] TransportError),
}

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("couldn't resolve {0}")]
    Resolve(String),
    #[error("couldn't connect to {addr}")]
    Connect {
        addr: String,
        #[source]
        source: io::Error,
    },
    #[error("connection i/o failed")]
    Io(#[from] io::Error),
}

/// A server line that couldn't be turned into a chat event.
#[derive(Debug, Error)]
pub enum WireError {
    #[error(transparent)]
    UnknownKind(#[from] RouterError),
    #[error("blank line")]
    Blank,
    #[error("malformed {kind} line: {reason}")]
    Malformed { kind: EventKind, reason: &'static str },
}

#[derive(Debug, Error)]
pub enum ManagerError {
    #[error("no event sources are running; would block forever")]
    NoSources,
    #[error("a fatal error has already occurred")]
    Poisoned,
    #[error("every listener hung up")]
    Disconnected,
}

/// Top-level error for the binary.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("terminal setup failed")]
    Terminal(#[source] io::Error),
    #[error("couldn't set up logging: {0}")]
    Logging(String),
    #[error(transparent)]
    Transport(#[from] TransportError),
    #[error(transparent)]
    Router(#[from] RouterError),
    #[error(transparent)]
    Handler(#[from] HandlerError),
    #[error(transparent)]
    Events(#[from] ManagerError),
    #[error("connection closed: {0}")]
    ConnectionEnd(String),
    #[error("internal error: {0}")]
    Internal(String),
}
