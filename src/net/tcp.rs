use crate::error::TransportError;
use crate::events::{Event, EventSource, Listener, Pager};
use crate::meta::Outbound;
use crate::net::wire;

use mio::{Events, Poll, PollOpt, Ready, Token};

use std::io::{self, Read, Write};
use std::net::{SocketAddr, TcpStream, ToSocketAddrs};
use std::sync::mpsc;
use std::thread;
use std::time::Duration;

pub const DEFAULT_PORT: u16 = 9898;

const BUFFER_SIZE: usize = 4096;
// 10 is ASCII newline
const LINE_SEPARATOR: u8 = 10;
const SOCKET: Token = Token(0);
// How long to back off when the kernel's send buffer is full.
const WRITE_RETRY: Duration = Duration::from_millis(5);
// Back-offs in a row, with no bytes going out, before a send gives up (about one second).
const MAX_WRITE_STALLS: u32 = 200;

/// Internal event type for TCP connection data and/or errors.
enum LinkEvt {
    Data(Vec<u8>),
    Error(String),
    Eof,
}

/// Reassembles newline-terminated lines out of whatever chunks the socket hands us.
#[derive(Default)]
pub struct LineBuffer {
    pending: Vec<u8>,
}

impl LineBuffer {
    pub fn new() -> LineBuffer {
        LineBuffer::default()
    }

    /// Add `data` and return every line it completed, without terminators (a trailing `\r` is
    /// dropped too).  Invalid UTF-8 is replaced rather than rejected.
    pub fn push(&mut self, data: &[u8]) -> Vec<String> {
        self.pending.extend_from_slice(data);

        let mut lines = vec![];
        while let Some(pos) = self.pending.iter().position(|c| *c == LINE_SEPARATOR) {
            let mut line: Vec<u8> = self.pending.drain(..=pos).collect();
            line.pop();
            if line.last() == Some(&b'\r') {
                line.pop();
            }
            lines.push(String::from_utf8_lossy(&line).into_owned());
        }
        lines
    }

    /// Whatever is left over that never got its newline.
    pub fn take_partial(&mut self) -> Option<String> {
        if self.pending.is_empty() {
            None
        } else {
            let rest = std::mem::take(&mut self.pending);
            Some(String::from_utf8_lossy(&rest).into_owned())
        }
    }
}

/// Reading half of the connection, as an event source.
pub struct TcpTransport {
    peer: SocketAddr,
    // Moved into the listener thread by get_listeners(), so it's only here until then.
    reader: Option<mio::net::TcpStream>,
    data_tx: mpsc::Sender<LinkEvt>,
    data_rx: mpsc::Receiver<LinkEvt>,
    input_buffer: LineBuffer,
}

/// Writing half of the connection.
pub struct TcpSender {
    stream: TcpStream,
}

impl TcpTransport {
    /// Connect to `host:port`, returning the reading half (to hand to a `ThreadedManager`) and
    /// the writing half (to hand to the controller).
    pub fn connect(host: &str, port: u16) -> Result<(TcpTransport, TcpSender), TransportError> {
        let target = format!("{}:{}", host, port);
        let peer = target
            .to_socket_addrs()
            .ok()
            .and_then(|mut addrs| addrs.next())
            .ok_or_else(|| TransportError::Resolve(target.clone()))?;

        let stream = TcpStream::connect(peer).map_err(|source| TransportError::Connect {
            addr: target.clone(),
            source,
        })?;
        let writer = stream.try_clone()?;
        let reader = mio::net::TcpStream::from_stream(stream)?;
        tracing::info!(%peer, "connected");

        let (data_tx, data_rx) = mpsc::channel();
        Ok((
            TcpTransport {
                peer,
                reader: Some(reader),
                data_tx,
                data_rx,
                input_buffer: LineBuffer::new(),
            },
            TcpSender { stream: writer },
        ))
    }
}

impl EventSource for TcpTransport {
    fn get_listeners(&mut self) -> Vec<Box<dyn Listener>> {
        // Only one listener can own the socket.  A second call gets nothing to start.
        match self.reader.take() {
            Some(stream) => vec![Box::new(TcpListener {
                stream,
                data_tx: self.data_tx.clone(),
            })],
            None => {
                tracing::warn!("TcpTransport listener already started");
                vec![]
            }
        }
    }

    fn process(&mut self) -> Vec<Event> {
        let mut queue = vec![];

        for evt in self.data_rx.try_iter() {
            match evt {
                LinkEvt::Data(data) => {
                    queue.extend(self.input_buffer.push(&data).into_iter().map(Event::ServerLine));
                }
                LinkEvt::Error(reason) => {
                    queue.push(Event::ConnectionEnd {
                        reason: format!("error reading from {}: {}", self.peer, reason),
                    });
                }
                LinkEvt::Eof => {
                    if let Some(partial) = self.input_buffer.take_partial() {
                        queue.push(Event::ServerLine(partial));
                    }
                    queue.push(Event::ConnectionEnd {
                        reason: format!("{} closed the connection", self.peer),
                    });
                }
            }
        }

        queue
    }
}

impl TcpSender {
    /// Announce who we are and where we want to be.
    pub fn join(&mut self, room: &str, user: &str) -> Result<(), TransportError> {
        self.write_line(&wire::encode_join(room, user))
    }

    fn write_line(&mut self, line: &str) -> Result<(), TransportError> {
        // The socket is shared with the mio reader, which made it non-blocking; a full send
        // buffer shows up as WouldBlock and we wait it out.  This runs on the UI thread, so a
        // peer that stops reading gets a bounded wait and then an error, not a frozen screen.
        let bytes = line.as_bytes();
        let mut written = 0;
        let mut stalls = 0;
        while written < bytes.len() {
            match self.stream.write(&bytes[written..]) {
                Ok(0) => return Err(io::Error::from(io::ErrorKind::WriteZero).into()),
                Ok(n) => {
                    written += n;
                    stalls = 0;
                }
                Err(ref e) if e.kind() == io::ErrorKind::WouldBlock => {
                    stalls += 1;
                    if stalls > MAX_WRITE_STALLS {
                        tracing::warn!(written, total = bytes.len(), "server stopped accepting data");
                        return Err(io::Error::new(io::ErrorKind::TimedOut, "server stopped accepting data").into());
                    }
                    thread::sleep(WRITE_RETRY);
                }
                Err(ref e) if e.kind() == io::ErrorKind::Interrupted => {}
                Err(e) => return Err(e.into()),
            }
        }
        Ok(())
    }
}

impl Outbound for TcpSender {
    fn send_line(&mut self, line: &str) -> Result<(), TransportError> {
        self.write_line(&wire::encode_say(line))
    }
}

/// Listener impl for TcpTransport.
struct TcpListener {
    stream: mio::net::TcpStream,
    data_tx: mpsc::Sender<LinkEvt>,
}

impl TcpListener {
    fn send(&self, evt: LinkEvt, pager: &Pager) -> Result<(), String> {
        self.data_tx
            .send(evt)
            .map_err(|_| "TcpTransport went away".to_string())?;
        pager.ok();
        Ok(())
    }
}

impl Listener for TcpListener {
    fn run(&mut self, pager: Pager) -> Result<(), String> {
        let poll = Poll::new().map_err(|e| format!("couldn't create poll: {}", e))?;
        let mut events = Events::with_capacity(128);

        poll.register(&self.stream, SOCKET, Ready::readable(), PollOpt::level())
            .map_err(|e| format!("couldn't register socket: {}", e))?;

        let mut buffer = [0u8; BUFFER_SIZE];
        loop {
            if let Err(e) = poll.poll(&mut events, None) {
                if e.kind() == io::ErrorKind::Interrupted {
                    continue;
                }
                return Err(format!("poll failed: {}", e));
            }

            for event in &events {
                if event.token() != SOCKET {
                    continue;
                }
                // Drain the socket until it would block.
                loop {
                    match self.stream.read(&mut buffer) {
                        Ok(0) => {
                            self.send(LinkEvt::Eof, &pager)?;
                            return Ok(());
                        }
                        Ok(num_bytes) => {
                            self.send(LinkEvt::Data(buffer[..num_bytes].to_vec()), &pager)?;
                        }
                        Err(ref e) if e.kind() == io::ErrorKind::WouldBlock => break,
                        Err(ref e) if e.kind() == io::ErrorKind::Interrupted => {}
                        Err(e) => {
                            // An error means we probably can't keep using the link.
                            self.send(LinkEvt::Error(e.to_string()), &pager)?;
                            return Ok(());
                        }
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::BufRead;
    use std::net::TcpListener as StdListener;

    #[test]
    fn lines_are_reassembled_across_chunks() {
        let mut buf = LineBuffer::new();
        assert!(buf.push(b"message al").is_empty());
        assert_eq!(buf.push(b"ice hi\r\nstatus a b\nact"), vec!["message alice hi", "status a b"]);
        assert_eq!(buf.push(b"ivity x\n"), vec!["activity x"]);
        assert_eq!(buf.take_partial(), None);
    }

    #[test]
    fn partial_tail_is_kept_until_asked_for() {
        let mut buf = LineBuffer::new();
        assert!(buf.push(b"status alice").is_empty());
        assert_eq!(buf.take_partial(), Some("status alice".to_string()));
        assert_eq!(buf.take_partial(), None);
    }

    #[test]
    fn invalid_utf8_is_replaced() {
        let mut buf = LineBuffer::new();
        let lines = buf.push(b"message bob \xff\n");
        assert_eq!(lines, vec!["message bob \u{fffd}"]);
    }

    #[test]
    fn sender_writes_join_and_say_lines() {
        let server = StdListener::bind("127.0.0.1:0").unwrap();
        let port = server.local_addr().unwrap().port();

        let (_transport, mut sender) = TcpTransport::connect("127.0.0.1", port).unwrap();
        let (conn, _) = server.accept().unwrap();

        sender.join("general", "alice").unwrap();
        sender.send_line("hello world").unwrap();

        let mut reader = io::BufReader::new(conn);
        let mut line = String::new();
        reader.read_line(&mut line).unwrap();
        assert_eq!(line, "join general alice\n");
        line.clear();
        reader.read_line(&mut line).unwrap();
        assert_eq!(line, "say hello world\n");
    }

    #[test]
    fn send_gives_up_when_the_server_stops_reading() {
        let server = StdListener::bind("127.0.0.1:0").unwrap();
        let port = server.local_addr().unwrap().port();
        let (_transport, mut sender) = TcpTransport::connect("127.0.0.1", port).unwrap();
        // Accepted but never read, so both socket buffers fill up.
        let (_conn, _) = server.accept().unwrap();

        let huge = "x".repeat(64 * 1024 * 1024);
        match sender.send_line(&huge) {
            Err(TransportError::Io(e)) => assert_eq!(e.kind(), io::ErrorKind::TimedOut),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn transport_turns_socket_data_into_events() {
        use crate::events::ThreadedManager;
        use std::cell::RefCell;
        use std::rc::Rc;

        let server = StdListener::bind("127.0.0.1:0").unwrap();
        let port = server.local_addr().unwrap().port();
        let (transport, _sender) = TcpTransport::connect("127.0.0.1", port).unwrap();
        let (mut conn, _) = server.accept().unwrap();

        let mut manager = ThreadedManager::new();
        manager.start_source(Rc::new(RefCell::new(transport)));

        conn.write_all(b"status alice\nmessage alice hi\n").unwrap();
        drop(conn);

        let mut got = vec![];
        loop {
            match manager.next_event().unwrap() {
                Event::ConnectionEnd { .. } => break,
                other => got.push(other),
            }
        }
        assert_eq!(
            got,
            vec![
                Event::ServerLine("status alice".to_string()),
                Event::ServerLine("message alice hi".to_string()),
            ]
        );
    }
}
