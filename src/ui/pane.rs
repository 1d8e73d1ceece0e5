use std::collections::VecDeque;

use crate::color::ColorToken;

/// How a run of text should look.
#[derive(Copy, Clone, PartialEq, Eq, Debug, Default)]
pub struct Style {
    pub fg: Option<ColorToken>,
    pub bold: bool,
}

impl Style {
    pub fn plain() -> Style {
        Style::default()
    }

    /// Bold text in a user's color; how every user name is drawn.
    pub fn user(color: ColorToken) -> Style {
        Style {
            fg: Some(color),
            bold: true,
        }
    }

    pub fn bold() -> Style {
        Style { fg: None, bold: true }
    }
}

#[derive(Clone, PartialEq, Eq, Debug)]
pub struct Span {
    pub text: String,
    pub style: Style,
}

impl Span {
    pub fn new(text: impl Into<String>, style: Style) -> Span {
        Span {
            text: text.into(),
            style,
        }
    }
}

/// One item in a pane: a sequence of styled spans.
#[derive(Clone, PartialEq, Eq, Debug, Default)]
pub struct Line {
    spans: Vec<Span>,
}

impl Line {
    pub fn new(spans: Vec<Span>) -> Line {
        Line { spans }
    }

    pub fn plain(text: impl Into<String>) -> Line {
        Line::styled(text, Style::plain())
    }

    pub fn styled(text: impl Into<String>, style: Style) -> Line {
        Line {
            spans: vec![Span::new(text, style)],
        }
    }

    pub fn spans(&self) -> &[Span] {
        &self.spans
    }

    /// The text with styling stripped.
    pub fn plain_text(&self) -> String {
        self.spans.iter().map(|s| s.text.as_str()).collect()
    }

    /// Every character paired with its style, for layout.
    pub fn cells(&self) -> Vec<(char, Style)> {
        self.spans
            .iter()
            .flat_map(|span| span.text.chars().map(move |c| (c, span.style)))
            .collect()
    }
}

/// Append-only list of lines with optional scrollback limit (0 keeps everything).
pub struct LogPane {
    items: VecDeque<Line>,
    scrollback: usize,
}

impl LogPane {
    pub fn new(scrollback: usize) -> LogPane {
        LogPane {
            items: VecDeque::new(),
            scrollback,
        }
    }

    pub fn add_item(&mut self, line: Line) {
        self.items.push_back(line);
        if self.scrollback > 0 {
            while self.items.len() > self.scrollback {
                self.items.pop_front();
            }
        }
    }

    pub fn items(&self) -> impl DoubleEndedIterator<Item = &Line> + '_ {
        self.items.iter()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// The roster panel.  The header lives in its own field so that clearing the body can never take
/// it along.
pub struct StatusPane {
    header: Line,
    body: Vec<Line>,
}

impl StatusPane {
    pub fn new(header: Line) -> StatusPane {
        StatusPane { header, body: vec![] }
    }

    pub fn header(&self) -> &Line {
        &self.header
    }

    /// Drop every body line.  The header stays.
    pub fn clear_items(&mut self) {
        self.body.clear();
    }

    pub fn add_item(&mut self, line: Line) {
        self.body.push(line);
    }

    /// Header first, then the body in insertion order.
    pub fn items(&self) -> impl Iterator<Item = &Line> + '_ {
        std::iter::once(&self.header).chain(self.body.iter())
    }
}
