//! termion-backed screen and keyboard input.

use std::io::{self, stdin, stdout, Write};
use std::sync::mpsc::{self, Receiver, Sender};

use termion::cursor;
use termion::event::Key;
use termion::input::TermRead;
use termion::raw::{IntoRawMode, RawTerminal};
use termion::screen::AlternateScreen;

use signal_hook::iterator::Signals;

use crate::events::{Event, EventSource, Listener, Pager};
use crate::ui::input::InputAction;
use crate::ui::pane::{Line, Style};
use crate::ui::{Frame, Screen};
use crate::utils::force_width;

pub mod screen;
pub mod wrap;

use self::screen::DamageBuffer;
use self::wrap::{wrap, StyledChar};

const PROMPT: &str = "> ";
// Continuation rows of a wrapped chat line are indented this far.
const HANGING_INDENT: usize = 2;

/// A rectangle of cells, origin top-left.
#[derive(Copy, Clone, PartialEq, Eq, Debug, Default)]
pub struct Rect {
    pub x: usize,
    pub y: usize,
    pub w: usize,
    pub h: usize,
}

/// Where each pane goes on a `w` x `h` terminal: a title row on top, the chat log on the left two
/// thirds, activity over status on the right, and the input on the bottom row under a rule.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub struct Layout {
    pub title: Rect,
    pub chat: Rect,
    pub activity: Rect,
    pub status: Rect,
    pub input: Rect,
    // Column of the vertical rule, row of the rule under activity, row of the rule over input.
    divider_x: usize,
    side_rule_y: usize,
    input_rule_y: usize,
}

impl Layout {
    pub fn new(w: usize, h: usize) -> Layout {
        let body_y = 1;
        let body_h = h.saturating_sub(3);
        let chat_w = w * 2 / 3;
        let side_x = (chat_w + 1).min(w);
        let side_w = w - side_x;
        let activity_h = body_h.saturating_sub(1) / 2;
        let status_y = body_y + activity_h + 1;
        let status_h = body_h.saturating_sub(activity_h + 1);

        Layout {
            title: Rect { x: 0, y: 0, w, h: h.min(1) },
            chat: Rect { x: 0, y: body_y, w: chat_w, h: body_h },
            activity: Rect { x: side_x, y: body_y, w: side_w, h: activity_h },
            status: Rect { x: side_x, y: status_y, w: side_w, h: status_h },
            input: Rect { x: 0, y: h.saturating_sub(1), w, h: h.min(1) },
            divider_x: chat_w,
            side_rule_y: body_y + activity_h,
            input_rule_y: h.saturating_sub(2),
        }
    }
}

/// Write one row of `rect`, padding with blanks so stale text from the last frame goes away.
fn paint_row(db: &mut DamageBuffer, rect: Rect, dy: usize, row: &[StyledChar]) {
    for dx in 0..rect.w {
        let (ch, style) = row.get(dx).copied().unwrap_or((' ', Style::plain()));
        db.put(rect.x + dx, rect.y + dy, ch, style);
    }
}

/// Bottom-aligned: the newest lines sit at the bottom of the pane, older ones scroll off the top.
fn paint_log<'a>(db: &mut DamageBuffer, rect: Rect, items: impl DoubleEndedIterator<Item = &'a Line>) {
    if rect.h == 0 || rect.w == 0 {
        return;
    }
    let mut rows: Vec<Vec<StyledChar>> = vec![];
    for line in items.rev() {
        let mut wrapped = wrap(line, rect.w, HANGING_INDENT);
        while let Some(row) = wrapped.pop() {
            rows.push(row);
        }
        if rows.len() >= rect.h {
            break;
        }
    }
    rows.truncate(rect.h);
    rows.reverse();

    let pad = rect.h - rows.len();
    for dy in 0..pad {
        paint_row(db, rect, dy, &[]);
    }
    for (n, row) in rows.iter().enumerate() {
        paint_row(db, rect, pad + n, row);
    }
}

/// Top-aligned, with whatever doesn't fit cut off at the bottom.
fn paint_list<'a>(db: &mut DamageBuffer, rect: Rect, items: impl Iterator<Item = &'a Line>) {
    let mut rows = items.flat_map(|line| wrap(line, rect.w, HANGING_INDENT));
    for dy in 0..rect.h {
        let row = rows.next().unwrap_or_default();
        paint_row(db, rect, dy, &row);
    }
}

fn rule(db: &mut DamageBuffer, x: usize, y: usize, len: usize, vertical: bool) {
    let ch = if vertical { '│' } else { '─' };
    for n in 0..len {
        if vertical {
            db.put(x, y + n, ch, Style::plain());
        } else {
            db.put(x + n, y, ch, Style::plain());
        }
    }
}

/// Lay the frame out into `db`.  Returns the 0-indexed cursor position in the input row.
pub fn compose(frame: &Frame<'_>, db: &mut DamageBuffer) -> (usize, usize) {
    let (w, h) = db.size();
    let layout = Layout::new(w, h);

    if layout.title.h > 0 {
        db.write_str(0, 0, &force_width(frame.title, w), Style::bold());
    }

    paint_log(db, layout.chat, frame.chat.items());
    paint_log(db, layout.activity, frame.activity.items());
    paint_list(db, layout.status, frame.status.items());

    if layout.chat.h > 0 && layout.divider_x < w {
        rule(db, layout.divider_x, layout.chat.y, layout.chat.h, true);
        rule(db, layout.activity.x, layout.side_rule_y, layout.activity.w, false);
    }
    if h >= 3 {
        rule(db, 0, layout.input_rule_y, w, false);
    }

    let field_w = layout.input.w.saturating_sub(PROMPT.len());
    let (shown, cursor_x) = frame.input.visible(field_w);
    let mut row: Vec<StyledChar> = PROMPT.chars().map(|c| (c, Style::bold())).collect();
    row.extend(shown.chars().map(|c| (c, Style::plain())));
    paint_row(db, layout.input, 0, &row);

    ((PROMPT.len() + cursor_x).min(w.saturating_sub(1)), layout.input.y)
}

/// The real terminal: raw mode, alternate screen, damage-tracked redraws.
pub struct TermScreen {
    stdout: AlternateScreen<RawTerminal<io::Stdout>>,
    // Used as an abstraction on the entire terminal; it lets us think about the terminal as a
    // grid buffer rather than a stream with external state on the other end.
    db: DamageBuffer,
}

impl TermScreen {
    /// Take over the terminal.  Expects to be the only thing writing to stdout from now on.
    pub fn new() -> io::Result<TermScreen> {
        let (term_w, term_h) = termion::terminal_size()?;

        let mut stdout = AlternateScreen::from(stdout().into_raw_mode()?);
        write!(stdout, "{}{}", termion::clear::All, cursor::Hide)?;
        stdout.flush()?;

        Ok(TermScreen {
            stdout,
            db: DamageBuffer::new(term_w as usize, term_h as usize),
        })
    }
}

impl Screen for TermScreen {
    fn draw(&mut self, frame: &Frame<'_>) -> io::Result<()> {
        let (x, y) = compose(frame, &mut self.db);
        self.db.redraw(&mut self.stdout)?;

        if frame.input.is_focused() {
            write!(self.stdout, "{}{}", cursor::Goto((x + 1) as u16, (y + 1) as u16), cursor::Show)?;
        } else {
            write!(self.stdout, "{}", cursor::Hide)?;
        }
        self.stdout.flush()
    }

    fn resize(&mut self) -> io::Result<()> {
        let (term_w, term_h) = termion::terminal_size()?;
        tracing::debug!(width = term_w, height = term_h, "terminal resized");
        self.db.resize(term_w as usize, term_h as usize);
        Ok(())
    }
}

/// Clean up the terminal when the TermScreen is dropped.
impl Drop for TermScreen {
    fn drop(&mut self) {
        let _ = write!(self.stdout, "{}{}", termion::style::Reset, cursor::Show);
        let _ = self.stdout.flush();
    }
}

/// Map a key press onto an input action.  Keys with no meaning here give `None`.
pub fn action_for(key: Key) -> Option<InputAction> {
    let action = match key {
        Key::Char('\n') | Key::Char('\r') => InputAction::Submit,
        Key::Char(c) => InputAction::Insert(c),
        Key::Backspace => InputAction::Backspace,
        Key::Delete => InputAction::Delete,
        Key::Left => InputAction::Left,
        Key::Right => InputAction::Right,
        Key::Home | Key::Ctrl('a') => InputAction::Home,
        Key::End | Key::Ctrl('e') => InputAction::End,
        Key::Ctrl('u') => InputAction::ClearLine,
        Key::Ctrl('c') | Key::Ctrl('d') | Key::Esc => InputAction::Quit,
        _ => return None,
    };
    Some(action)
}

/// Event type used internally for communication between threads.
enum TermEvent {
    Resize,
    Input { key: Key },
}

/// Source for keyboard and terminal-resize events.
pub struct TermInput {
    tx_template: Sender<TermEvent>,
    rx: Receiver<TermEvent>,
}

impl TermInput {
    pub fn new() -> TermInput {
        let (tx, rx) = mpsc::channel();
        TermInput { tx_template: tx, rx }
    }
}

impl Default for TermInput {
    fn default() -> TermInput {
        TermInput::new()
    }
}

impl EventSource for TermInput {
    fn get_listeners(&mut self) -> Vec<Box<dyn Listener>> {
        vec![
            Box::new(TermionListener {
                tx: self.tx_template.clone(),
            }),
            Box::new(ResizeListener {
                tx: self.tx_template.clone(),
            }),
        ]
    }

    fn process(&mut self) -> Vec<Event> {
        let mut out = vec![];
        let mut resized = false;

        for event in self.rx.try_iter() {
            match event {
                // A drag-resize fires many signals; one redraw at the end is enough.
                TermEvent::Resize => resized = true,
                TermEvent::Input { key } => {
                    if let Some(action) = action_for(key) {
                        out.push(Event::Input(action));
                    }
                }
            }
        }

        if resized {
            out.push(Event::Resize);
        }
        out
    }
}

/// Listener for terminal resize events.
struct ResizeListener {
    tx: Sender<TermEvent>,
}

impl Listener for ResizeListener {
    fn run(&mut self, pager: Pager) -> Result<(), String> {
        let sigs = Signals::new(&[libc::SIGWINCH]).map_err(|e| format!("couldn't watch SIGWINCH: {}", e))?;
        for _signal in sigs.forever() {
            self.tx
                .send(TermEvent::Resize)
                .map_err(|_| "resize receiver went away".to_string())?;
            if !pager.ok() {
                break;
            }
        }
        Ok(())
    }
}

/// Listener for termion key events.
struct TermionListener {
    tx: Sender<TermEvent>,
}

impl Listener for TermionListener {
    fn run(&mut self, pager: Pager) -> Result<(), String> {
        for key in stdin().keys() {
            let key = key.map_err(|e| format!("couldn't read from stdin: {}", e))?;
            self.tx
                .send(TermEvent::Input { key })
                .map_err(|_| "key receiver went away".to_string())?;
            if !pager.ok() {
                break;
            }
        }
        Ok(())
    }
}
