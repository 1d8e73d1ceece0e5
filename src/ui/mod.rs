//! The render surface: the four panes the controller writes into, and the screen that draws them.
//!
//! The surface is built once at startup by `SurfaceBuilder`.  Panes only ever get appended to
//! (the status body is the exception, being replaced wholesale), and `Surface::render` hands a
//! borrowed snapshot of every pane to a `Screen` to put on the terminal.

use std::io;

pub mod input;
pub mod pane;
pub mod term;

use self::input::InputLine;
use self::pane::{Line, LogPane, StatusPane, Style};

pub const DEFAULT_TITLE: &str = "chatterm";
pub const DEFAULT_STATUS_HEADER: &str = "Users";
pub const DEFAULT_SCROLLBACK: usize = 1000;

/// Everything a screen needs to draw one frame.
pub struct Frame<'a> {
    pub title: &'a str,
    pub chat: &'a LogPane,
    pub activity: &'a LogPane,
    pub status: &'a StatusPane,
    pub input: &'a InputLine,
}

/// Something that can put a `Frame` in front of the user.
pub trait Screen {
    fn draw(&mut self, frame: &Frame<'_>) -> io::Result<()>;

    /// Called after the terminal changed size.  Screens with a fixed size ignore it.
    fn resize(&mut self) -> io::Result<()> {
        Ok(())
    }
}

pub struct Surface<S: Screen> {
    title: String,
    chat: LogPane,
    activity: LogPane,
    status: StatusPane,
    input: InputLine,
    screen: S,
}

impl<S: Screen> Surface<S> {
    pub fn chat(&self) -> &LogPane {
        &self.chat
    }

    pub fn chat_mut(&mut self) -> &mut LogPane {
        &mut self.chat
    }

    pub fn activity(&self) -> &LogPane {
        &self.activity
    }

    pub fn activity_mut(&mut self) -> &mut LogPane {
        &mut self.activity
    }

    pub fn status(&self) -> &StatusPane {
        &self.status
    }

    pub fn status_mut(&mut self) -> &mut StatusPane {
        &mut self.status
    }

    pub fn input(&self) -> &InputLine {
        &self.input
    }

    pub fn input_mut(&mut self) -> &mut InputLine {
        &mut self.input
    }

    pub fn screen(&self) -> &S {
        &self.screen
    }

    pub fn screen_mut(&mut self) -> &mut S {
        &mut self.screen
    }

    pub fn focus_input(&mut self) {
        self.input.focus();
    }

    /// Redraw everything.
    pub fn render(&mut self) -> io::Result<()> {
        let frame = Frame {
            title: &self.title,
            chat: &self.chat,
            activity: &self.activity,
            status: &self.status,
            input: &self.input,
        };
        self.screen.draw(&frame)
    }

    pub fn resize(&mut self) -> io::Result<()> {
        self.screen.resize()?;
        self.render()
    }
}

pub struct SurfaceBuilder {
    title: String,
    status_header: Line,
    scrollback: usize,
}

impl SurfaceBuilder {
    pub fn new() -> SurfaceBuilder {
        SurfaceBuilder {
            title: DEFAULT_TITLE.to_string(),
            status_header: Line::styled(DEFAULT_STATUS_HEADER, Style::bold()),
            scrollback: DEFAULT_SCROLLBACK,
        }
    }

    pub fn title(mut self, title: impl Into<String>) -> SurfaceBuilder {
        self.title = title.into();
        self
    }

    /// The fixed first line of the roster panel.  Drawn bold.
    pub fn status_header(mut self, header: impl Into<String>) -> SurfaceBuilder {
        self.status_header = Line::styled(header, Style::bold());
        self
    }

    /// Lines kept per log pane; 0 keeps everything.
    pub fn scrollback(mut self, lines: usize) -> SurfaceBuilder {
        self.scrollback = lines;
        self
    }

    pub fn build<S: Screen>(self, screen: S) -> Surface<S> {
        Surface {
            title: self.title,
            chat: LogPane::new(self.scrollback),
            activity: LogPane::new(self.scrollback),
            status: StatusPane::new(self.status_header),
            input: InputLine::new(),
            screen,
        }
    }
}

impl Default for SurfaceBuilder {
    fn default() -> SurfaceBuilder {
        SurfaceBuilder::new()
    }
}

/// A screen that remembers how often it was asked to draw, for tests.
#[cfg(test)]
#[derive(Default)]
pub struct RecordingScreen {
    pub draws: usize,
    pub resizes: usize,
    pub fail_next: bool,
}

#[cfg(test)]
impl Screen for RecordingScreen {
    fn draw(&mut self, _frame: &Frame<'_>) -> io::Result<()> {
        if self.fail_next {
            self.fail_next = false;
            return Err(io::Error::new(io::ErrorKind::BrokenPipe, "terminal went away"));
        }
        self.draws += 1;
        Ok(())
    }

    fn resize(&mut self) -> io::Result<()> {
        self.resizes += 1;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_seeds_status_header() {
        let surface = SurfaceBuilder::new()
            .status_header("Users in lobby")
            .build(RecordingScreen::default());
        let items: Vec<String> = surface.status().items().map(Line::plain_text).collect();
        assert_eq!(items, vec!["Users in lobby"]);
        assert!(surface.status().header().spans()[0].style.bold);
    }

    #[test]
    fn builder_applies_scrollback_to_both_logs() {
        let mut surface = SurfaceBuilder::new().scrollback(1).build(RecordingScreen::default());
        surface.chat_mut().add_item(Line::plain("a"));
        surface.chat_mut().add_item(Line::plain("b"));
        surface.activity_mut().add_item(Line::plain("c"));
        surface.activity_mut().add_item(Line::plain("d"));
        assert_eq!(surface.chat().len(), 1);
        assert_eq!(surface.activity().len(), 1);
    }

    #[test]
    fn render_and_resize_reach_the_screen() {
        let mut surface = SurfaceBuilder::new().build(RecordingScreen::default());
        surface.render().unwrap();
        surface.resize().unwrap();
        assert_eq!(surface.screen().draws, 2);
        assert_eq!(surface.screen().resizes, 1);
    }

    #[test]
    fn focus_goes_to_input() {
        let mut surface = SurfaceBuilder::new().build(RecordingScreen::default());
        assert!(!surface.input().is_focused());
        surface.focus_input();
        assert!(surface.input().is_focused());
    }
}
