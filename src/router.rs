//! Synchronous, single-threaded publish/subscribe for chat events.
//!
//! `publish` calls every handler registered for the event's kind, in the order they subscribed,
//! before it returns.  Nothing is queued and nothing crosses threads: whoever owns the router
//! (the main loop) publishes once a transport has finished receiving a line.
//!
//! Handlers are held as `Rc<RefCell<dyn Handler>>`.  A handler that manages to publish an event
//! back into a handler that is still running gets `RouterError::Reentrant` instead of nested
//! execution.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;
use std::str::FromStr;

use fnv::FnvHashMap;

use crate::error::{HandlerError, RouterError};
use crate::meta::{ActivityNotice, ChatMessage, RosterSnapshot};

/// The closed set of chat notifications.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug)]
pub enum EventKind {
    MessageReceived,
    ActivityUpdate,
    StatusUpdated,
}

impl EventKind {
    pub const ALL: [EventKind; 3] = [
        EventKind::MessageReceived,
        EventKind::ActivityUpdate,
        EventKind::StatusUpdated,
    ];

    /// Name used on the wire and in logs.
    pub fn name(self) -> &'static str {
        match self {
            EventKind::MessageReceived => "message",
            EventKind::ActivityUpdate => "activity",
            EventKind::StatusUpdated => "status",
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for EventKind {
    type Err = RouterError;

    fn from_str(s: &str) -> Result<EventKind, RouterError> {
        EventKind::ALL
            .iter()
            .copied()
            .find(|kind| kind.name() == s)
            .ok_or_else(|| RouterError::UnknownEventKind(s.to_string()))
    }
}

/// A chat notification together with its payload.
#[derive(Clone, PartialEq, Eq, Debug)]
pub enum ChatEvent {
    MessageReceived(ChatMessage),
    ActivityUpdate(ActivityNotice),
    StatusUpdated(RosterSnapshot),
}

impl ChatEvent {
    pub fn kind(&self) -> EventKind {
        match self {
            ChatEvent::MessageReceived(_) => EventKind::MessageReceived,
            ChatEvent::ActivityUpdate(_) => EventKind::ActivityUpdate,
            ChatEvent::StatusUpdated(_) => EventKind::StatusUpdated,
        }
    }
}

/// Something that reacts to published chat events.
pub trait Handler {
    fn handle(&mut self, event: &ChatEvent) -> Result<(), HandlerError>;
}

pub type SharedHandler = Rc<RefCell<dyn Handler>>;

#[derive(Default)]
pub struct EventRouter {
    handlers: FnvHashMap<EventKind, Vec<SharedHandler>>,
}

impl EventRouter {
    pub fn new() -> EventRouter {
        EventRouter::default()
    }

    /// Register `handler` for `kind`.  The same handler may be registered under several kinds
    /// (or several times under one kind, in which case it runs that many times).
    pub fn subscribe(&mut self, kind: EventKind, handler: SharedHandler) {
        self.handlers.entry(kind).or_default().push(handler);
    }

    /// Subscribe by wire name, rejecting names outside the closed set.
    pub fn subscribe_named(&mut self, kind: &str, handler: SharedHandler) -> Result<(), RouterError> {
        let kind = kind.parse::<EventKind>()?;
        self.subscribe(kind, handler);
        Ok(())
    }

    /// Deliver `event` to every handler of its kind.  Stops at the first handler that fails; the
    /// handlers after it don't see this event.
    pub fn publish(&self, event: &ChatEvent) -> Result<(), RouterError> {
        let kind = event.kind();
        let handlers = match self.handlers.get(&kind) {
            Some(handlers) => handlers,
            None => {
                tracing::debug!(%kind, "no handlers subscribed");
                return Ok(());
            }
        };

        for handler in handlers {
            let mut handler = handler
                .try_borrow_mut()
                .map_err(|_| RouterError::Reentrant { kind })?;
            handler
                .handle(event)
                .map_err(|source| RouterError::Handler { kind, source })?;
        }

        Ok(())
    }

    pub fn handler_count(&self, kind: EventKind) -> usize {
        self.handlers.get(&kind).map_or(0, Vec::len)
    }
}
