//! Offline feed that replays a short scripted session, for trying the interface without a
//! server.  Lines go through the same wire decoder as real server traffic.

use std::sync::mpsc;
use std::thread;
use std::time::Duration;

use crate::events::{Event, EventSource, Listener, Pager};

pub const DEFAULT_INTERVAL: Duration = Duration::from_secs(1);

/// One round of the script.  The roster grows as people arrive, and some of them leave again.
pub const SCRIPT: &[&str] = &[
    "status alice",
    "message alice Hello Terminal!",
    "activity alice join",
    "status alice bob carol",
    "message bob Hello everyone!",
    "activity bob left",
    "status alice bob carol dave erin",
    "message dave Hello People!",
    "activity dave left",
];

pub struct DemoSource {
    interval: Duration,
    rounds: Option<usize>,
    tx: mpsc::Sender<String>,
    rx: mpsc::Receiver<String>,
}

impl DemoSource {
    /// Replay the script every `interval`, `rounds` times (forever if `None`).
    pub fn new(interval: Duration, rounds: Option<usize>) -> DemoSource {
        let (tx, rx) = mpsc::channel();
        DemoSource {
            interval,
            rounds,
            tx,
            rx,
        }
    }
}

impl EventSource for DemoSource {
    fn get_listeners(&mut self) -> Vec<Box<dyn Listener>> {
        vec![Box::new(DemoListener {
            interval: self.interval,
            rounds: self.rounds,
            tx: self.tx.clone(),
        })]
    }

    fn process(&mut self) -> Vec<Event> {
        self.rx.try_iter().map(Event::ServerLine).collect()
    }
}

struct DemoListener {
    interval: Duration,
    rounds: Option<usize>,
    tx: mpsc::Sender<String>,
}

impl Listener for DemoListener {
    fn run(&mut self, pager: Pager) -> Result<(), String> {
        let mut round = 0;
        while self.rounds.map_or(true, |limit| round < limit) {
            thread::sleep(self.interval);
            for line in SCRIPT {
                if self.tx.send(line.to_string()).is_err() {
                    return Ok(());
                }
            }
            if !pager.ok() {
                return Ok(());
            }
            round += 1;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::ThreadedManager;
    use crate::net::wire;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[test]
    fn every_script_line_decodes() {
        for line in SCRIPT {
            wire::decode(line).unwrap_or_else(|e| panic!("{:?} didn't decode: {}", line, e));
        }
    }

    #[test]
    fn plays_the_requested_number_of_rounds() {
        let mut manager = ThreadedManager::new();
        manager.start_source(Rc::new(RefCell::new(DemoSource::new(Duration::from_millis(1), Some(2)))));

        let mut lines = vec![];
        while lines.len() < SCRIPT.len() * 2 {
            match manager.next_event().unwrap() {
                Event::ServerLine(line) => lines.push(line),
                other => panic!("unexpected {:?}", other),
            }
        }
        assert_eq!(lines[0], SCRIPT[0]);
        assert_eq!(lines[SCRIPT.len()], SCRIPT[0]);
        assert_eq!(lines.last().map(String::as_str), SCRIPT.last().copied());
    }
}
