
/// Editing operations the input box understands.  Terminal key handling maps onto these so the
/// controller never sees raw key codes.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum InputAction {
    Insert(char),
    Backspace,
    Delete,
    Left,
    Right,
    Home,
    End,
    ClearLine,
    Submit,
    Quit,
}

/// Single line of editable text.
pub struct InputLine {
    // A flat Vec<char> with insertion by shuffling; input lines are short enough that nothing
    // smarter has been needed.
    buffer: Vec<char>,
    // 0-indexed and sits BETWEEN characters: 0 is before the first, buffer.len() after the last.
    cursor: usize,
    focused: bool,
}

impl InputLine {
    pub fn new() -> InputLine {
        InputLine {
            buffer: vec![],
            cursor: 0,
            focused: false,
        }
    }

    /// Insert a single character at the current cursor position.
    pub fn insert_char(&mut self, what: char) {
        self.buffer.insert(self.cursor, what);
        self.cursor += 1;
    }

    /// Delete n chars ahead of the cursor (positive input) or behind it (negative input), moving
    /// it backward if appropriate.
    pub fn delete_chars(&mut self, n: isize) {
        if n.is_negative() {
            let start = self.cursor.saturating_sub(n.unsigned_abs());
            self.buffer.drain(start..self.cursor);
            self.cursor = start;
        } else {
            let end = (self.cursor + n as usize).min(self.buffer.len());
            self.buffer.drain(self.cursor..end);
        }
    }

    /// Move the cursor `offset` chars to the left or right in the buffer, not allowing it to go
    /// out-of-bounds.
    pub fn move_cursor(&mut self, offset: isize) {
        if offset.is_negative() {
            self.cursor = self.cursor.saturating_sub(offset.unsigned_abs());
        } else {
            self.cursor = (self.cursor + offset as usize).min(self.buffer.len());
        }
    }

    /// Set the contents of the input to some String, leaving the cursor at the end.
    pub fn set_value(&mut self, what: &str) {
        self.buffer = what.chars().collect();
        self.cursor = self.buffer.len();
    }

    pub fn clear(&mut self) {
        self.buffer.clear();
        self.cursor = 0;
    }

    pub fn value(&self) -> String {
        self.buffer.iter().collect()
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn focus(&mut self) {
        self.focused = true;
    }

    pub fn is_focused(&self) -> bool {
        self.focused
    }

    /// Apply an editing action.  `Submit` and `Quit` aren't edits and are ignored here; the
    /// controller handles them.
    pub fn apply(&mut self, action: InputAction) {
        match action {
            InputAction::Insert(c) => self.insert_char(c),
            InputAction::Backspace => self.delete_chars(-1),
            InputAction::Delete => self.delete_chars(1),
            InputAction::Left => self.move_cursor(-1),
            InputAction::Right => self.move_cursor(1),
            InputAction::Home => self.cursor = 0,
            InputAction::End => self.cursor = self.buffer.len(),
            InputAction::ClearLine => self.clear(),
            InputAction::Submit | InputAction::Quit => {}
        }
    }

    /// The part of the line that fits in `width` columns, scrolled horizontally so the cursor
    /// stays visible, plus the cursor's column within it.
    pub fn visible(&self, width: usize) -> (String, usize) {
        if width == 0 {
            return (String::new(), 0);
        }
        // Keep one column free for the cursor when it's at the end.
        let offset = (self.cursor + 1).saturating_sub(width);
        let shown: String = self.buffer.iter().skip(offset).take(width).collect();
        (shown, self.cursor - offset)
    }
}

impl Default for InputLine {
    fn default() -> InputLine {
        InputLine::new()
    }
}
