//! Funnels everything that happens outside the main thread (keys, resizes, socket data) into one
//! ordered stream of `Event`s.
//!
//! Each `EventSource` hands out one or more `Listener`s.  Every listener runs on its own thread,
//! stashes raw data somewhere its source can reach (normally an mpsc channel) and then pages the
//! manager.  The manager, on the main thread, reacts to a page by calling that source's
//! `process()` to turn the raw data into `Event`s.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;
use std::sync::mpsc;
use std::thread;

use crate::error::ManagerError;
use crate::ui::input::InputAction;

/// What the main loop reacts to.
#[derive(Clone, PartialEq, Eq, Debug)]
pub enum Event {
    /// The user did something in the input box.
    Input(InputAction),
    /// The terminal changed size.
    Resize,
    /// One complete line from the server, without its line terminator.
    ServerLine(String),
    ConnectionEnd { reason: String },
    /// A listener died.  The manager refuses to do anything after this.
    InternalError { what: String },
}

/// A notice sent by a child thread, either 'data is ready' or 'fatal error.'
enum StateNotice {
    Ready,
    Error(String),
}

/// Handle a listener uses to tell the manager it has something.
pub struct Pager {
    tx: mpsc::Sender<(usize, StateNotice)>,
    tag: usize,
}

impl Pager {
    /// Data is waiting in the source.  Returns false once the manager has gone away, which is
    /// the listener's cue to stop.
    pub fn ok(&self) -> bool {
        self.tx.send((self.tag, StateNotice::Ready)).is_ok()
    }

    pub fn err(&self, why: String) {
        // Nobody to tell if the manager is gone.
        let _ = self.tx.send((self.tag, StateNotice::Error(why)));
    }
}

impl Clone for Pager {
    fn clone(&self) -> Pager {
        Pager {
            tx: self.tx.clone(),
            tag: self.tag,
        }
    }
}

/// The part of an event source that lives on its own thread, blocking on whatever it waits for.
pub trait Listener: Send {
    /// Run until the underlying input ends.  `Ok` means it ended normally (a socket closing, a
    /// scripted feed running out); `Err` is fatal and poisons the manager.
    fn run(&mut self, pager: Pager) -> Result<(), String>;
}

/// Something that produces `Event`s with the help of listener threads.
pub trait EventSource {
    /// Hand out the listeners to start.  Called once, by `ThreadedManager::start_source`.
    fn get_listeners(&mut self) -> Vec<Box<dyn Listener>>;

    /// Turn whatever the listeners have delivered so far into events.  Called on the main thread
    /// after a listener paged.
    fn process(&mut self) -> Vec<Event>;
}

/// System to manage threads listening for data, process the data in an orderly fashion and return
/// Events to the caller.
pub struct ThreadedManager {
    rx: mpsc::Receiver<(usize, StateNotice)>,
    tx: mpsc::Sender<(usize, StateNotice)>,
    // Indexed by the tag their listeners' pagers carry.  Never shrinks.
    sources: Vec<Rc<RefCell<dyn EventSource>>>,
    // Has a fatal error occurred?  (If so, we want to refuse to do anything.)
    poisoned: bool,
    // One page can yield several events; they wait here to be handed out one at a time.
    events_waiting: VecDeque<Event>,
}

impl ThreadedManager {
    pub fn new() -> ThreadedManager {
        let (tx, rx) = mpsc::channel();
        ThreadedManager {
            rx,
            tx,
            sources: vec![],
            poisoned: false,
            events_waiting: VecDeque::new(),
        }
    }

    /// Add a source and start its listeners.  The caller keeps its own `Rc` if it still needs the
    /// concrete type afterwards.
    pub fn start_source(&mut self, src: Rc<RefCell<dyn EventSource>>) {
        let tag = self.sources.len();
        let listeners = src.borrow_mut().get_listeners();

        for mut listener in listeners {
            let pager = Pager {
                tx: self.tx.clone(),
                tag,
            };
            let police_pager = pager.clone();

            let citizen = thread::spawn(move || listener.run(pager));

            // Watch for the listener dying or failing, and report it even if it never called
            // err() itself.
            thread::spawn(move || match citizen.join() {
                Ok(Ok(())) => tracing::debug!(source = tag, "listener finished"),
                Ok(Err(why)) => police_pager.err(why),
                Err(_) => police_pager.err(format!("listener for source {} panicked", tag)),
            });
        }

        self.sources.push(src);
    }

    /// Return the next Event.  This will return any Events that are queued up, but if the queue is
    /// empty it will wait for an Event to arrive.
    pub fn next_event(&mut self) -> Result<Event, ManagerError> {
        loop {
            if let Some(event) = self.events_waiting.pop_front() {
                return Ok(event);
            }
            if self.poisoned {
                return Err(ManagerError::Poisoned);
            }
            if self.sources.is_empty() {
                return Err(ManagerError::NoSources);
            }

            // We hold a sender ourselves, so this only fails if that invariant is broken.
            let (tag, notice) = self.rx.recv().map_err(|_| ManagerError::Disconnected)?;
            match notice {
                StateNotice::Ready => {
                    let produced = self.sources[tag].borrow_mut().process();
                    self.events_waiting.extend(produced);
                }
                StateNotice::Error(what) => {
                    tracing::error!(source = tag, %what, "listener failed");
                    self.poisoned = true;
                    self.events_waiting.push_back(Event::InternalError { what });
                }
            }
        }
    }
}

impl Default for ThreadedManager {
    fn default() -> ThreadedManager {
        ThreadedManager::new()
    }
}
