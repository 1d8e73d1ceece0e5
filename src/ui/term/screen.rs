use std::collections::BTreeSet;
use std::io::Write;

use termion::color;
use termion::cursor;
use termion::style;

use crate::ui::pane::Style;

// Note: Rust docs say std::cmp::PartialOrd is derivable and will produce a lexicographic ordering
// based on the top-to-bottom declaration order of the Struct's members.  WARNING!  DO NOT CHANGE
// ORDER OF DECLARATION OF Y AND X!

/// Some point in a 2D grid with origin at 0,0.  Ord/PartialOrd are implemented such that a list of
/// these points, when sorted, will be ordered by y-value and then by x-value, such that any runs
/// of points along a single row of the grid (e.g., with the x-value increasing and y remaining
/// constant) will occur together and in order.
#[derive(PartialEq, Eq, PartialOrd, Ord, Debug, Clone, Copy)]
struct Point {
    y: usize,
    x: usize,
}

#[test]
fn point_order() {
    let mut points: BTreeSet<Point> = BTreeSet::new();
    points.insert(Point { x: 3, y: 5 });
    points.insert(Point { x: 4, y: 5 });
    points.insert(Point { x: 5, y: 5 });
    points.insert(Point { x: 7, y: 5 });
    points.insert(Point { x: 2, y: 5 });
    points.insert(Point { x: 1, y: 6 });

    let points_ord: Vec<Point> = points.into_iter().collect();
    assert_eq!(points_ord[0], Point {x:2,y:5});
    assert_eq!(points_ord[1], Point {x:3,y:5});
    assert_eq!(points_ord[2], Point {x:4,y:5});
    assert_eq!(points_ord[3], Point {x:5,y:5});
    assert_eq!(points_ord[4], Point {x:7,y:5});
    assert_eq!(points_ord[5], Point {x:1,y:6});
}

#[derive(Copy, Clone, PartialEq, Eq, Debug)]
struct Cell {
    ch: char,
    style: Style,
}

const BLANK: Cell = Cell {
    ch: ' ',
    style: Style { fg: None, bold: false },
};

/// Grid model of the terminal that remembers which cells changed since the last flush, so a
/// redraw only writes those.
pub struct DamageBuffer {
    points_to_draw: BTreeSet<Point>,
    redraw_all: bool,
    clear_all: bool,

    w: usize,
    h: usize,
    buffer: Vec<Cell>,
}

impl DamageBuffer {
    pub fn new(w: usize, h: usize) -> DamageBuffer {
        DamageBuffer {
            w,
            h,
            buffer: vec![BLANK; w * h],
            points_to_draw: BTreeSet::new(),
            redraw_all: false,
            clear_all: false,
        }
    }

    pub fn size(&self) -> (usize, usize) {
        (self.w, self.h)
    }

    /// Change dimensions.  Contents are dropped, since rows don't line up any more; the next
    /// redraw repaints everything.
    pub fn resize(&mut self, new_w: usize, new_h: usize) {
        self.w = new_w;
        self.h = new_h;
        self.buffer = vec![BLANK; new_w * new_h];
        self.points_to_draw.clear();
        self.clear_all = true;
        self.redraw_all = true;
    }

    /// Put one character at (x, y).  Writes outside the grid are dropped.
    pub fn put(&mut self, x: usize, y: usize, ch: char, style: Style) {
        if x >= self.w || y >= self.h {
            return;
        }
        // We're indexing into a 2D grid laid out row by row in a 1D memory buffer.
        let i = y * self.w + x;
        let cell = Cell { ch, style };
        if self.buffer[i] != cell {
            self.buffer[i] = cell;
            self.points_to_draw.insert(Point { x, y });
        }
    }

    pub fn write_str(&mut self, x: usize, y: usize, what: &str, style: Style) {
        for (n, c) in what.chars().enumerate() {
            self.put(x + n, y, c, style);
        }
    }

    /// The characters of row `y`, styles dropped.
    pub fn row_text(&self, y: usize) -> String {
        if y >= self.h {
            return String::new();
        }
        self.buffer[y * self.w..(y + 1) * self.w].iter().map(|c| c.ch).collect()
    }

    fn write_style(term: &mut impl Write, style: Style) -> std::io::Result<()> {
        write!(term, "{}", style::Reset)?;
        if let Some(token) = style.fg {
            let (r, g, b) = token.rgb();
            write!(term, "{}", color::Fg(color::Rgb(r, g, b)))?;
        }
        if style.bold {
            write!(term, "{}", style::Bold)?;
        }
        Ok(())
    }

    /// Send every damaged cell to `term`, then forget the damage.
    pub fn redraw(&mut self, term: &mut impl Write) -> std::io::Result<()> {
        if self.clear_all {
            write!(term, "{}{}", style::Reset, termion::clear::All)?;
        }

        let points: Vec<Point> = if self.redraw_all {
            (0..self.h)
                .flat_map(|y| (0..self.w).map(move |x| Point { x, y }))
                .collect()
        } else {
            self.points_to_draw.iter().copied().collect()
        };

        let mut last: Option<Point> = None;
        let mut current_style: Option<Style> = None;

        for Point { x, y } in points {
            // If we have a run of points each exactly one cell to the right of the previous one,
            // we can just write them out without jumping.
            let contiguous = matches!(last, Some(p) if p.y == y && p.x + 1 == x);
            if !contiguous {
                write!(term, "{}", cursor::Goto((x + 1) as u16, (y + 1) as u16))?;
            }

            let cell = self.buffer[y * self.w + x];
            if current_style != Some(cell.style) {
                Self::write_style(term, cell.style)?;
                current_style = Some(cell.style);
            }
            write!(term, "{}", cell.ch)?;
            last = Some(Point { x, y });
        }

        if current_style.is_some() {
            write!(term, "{}", style::Reset)?;
        }

        self.points_to_draw.clear();
        self.redraw_all = false;
        self.clear_all = false;

        term.flush()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::ColorToken;

    fn flush(db: &mut DamageBuffer) -> String {
        let mut out: Vec<u8> = vec![];
        db.redraw(&mut out).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn only_changed_cells_are_sent() {
        let mut db = DamageBuffer::new(4, 2);
        db.write_str(0, 0, "hi", Style::plain());
        let first = flush(&mut db);
        assert!(first.contains("hi"));

        // Nothing changed: nothing to send.
        assert_eq!(flush(&mut db), "");

        // Same text again is not damage either.
        db.write_str(0, 0, "hi", Style::plain());
        assert_eq!(flush(&mut db), "");

        db.write_str(1, 1, "x", Style::plain());
        let third = flush(&mut db);
        assert!(third.contains(&format!("{}", cursor::Goto(2, 2))));
        assert!(third.contains('x'));
        assert!(!third.contains('h'));
    }

    #[test]
    fn style_escapes_are_emitted() {
        let token = ColorToken::from_rgb(10, 20, 30);
        let mut db = DamageBuffer::new(5, 1);
        db.write_str(0, 0, "al", Style::user(token));
        let out = flush(&mut db);
        assert!(out.contains(&format!("{}", color::Fg(color::Rgb(10, 20, 30)))));
        assert!(out.contains(&format!("{}", style::Bold)));
    }

    #[test]
    fn out_of_bounds_writes_are_dropped() {
        let mut db = DamageBuffer::new(3, 1);
        db.write_str(1, 0, "abcdef", Style::plain());
        db.put(0, 5, 'z', Style::plain());
        assert_eq!(db.row_text(0), " ab");
        assert_eq!(db.row_text(5), "");
    }

    #[test]
    fn resize_repaints_everything() {
        let mut db = DamageBuffer::new(2, 1);
        flush(&mut db);
        db.resize(3, 1);
        let out = flush(&mut db);
        assert!(out.contains(&format!("{}", termion::clear::All)));
        assert_eq!(out.matches(' ').count(), 3);
    }
}
