use crate::ui::pane::{Line, Style};

/// One character cell's worth of content.
pub type StyledChar = (char, Style);

/// Word-wrap `line` to rows of at most `width` characters.  Rows after the first get a hanging
/// indent of `indent` spaces, like tinyfugue.  An empty line still takes one (empty) row.
pub fn wrap(line: &Line, width: usize, indent: usize) -> Vec<Vec<StyledChar>> {
    let text = line.cells();
    if width == 0 {
        return vec![];
    }
    if text.is_empty() {
        return vec![vec![]];
    }

    // If the indent would eat the whole row there's no room for text; drop it.
    let indent = if indent >= width { 0 } else { indent };

    let mut rows = vec![];
    let mut start = 0;
    let mut first = true;

    while start < text.len() {
        if !first {
            // Whitespace we broke on doesn't get to start the next row.
            while start < text.len() && text[start].0.is_whitespace() {
                start += 1;
            }
            if start == text.len() {
                break;
            }
        }

        let room = if first { width } else { width - indent };
        let mut row: Vec<StyledChar> = if first {
            vec![]
        } else {
            vec![(' ', Style::plain()); indent]
        };

        if text.len() - start <= room {
            row.extend_from_slice(&text[start..]);
            rows.push(row);
            break;
        }

        // Break at the last whitespace that still leaves the row within `room`, or hard-break in
        // the middle of a long word if there is none.
        let limit = start + room;
        let end = (start + 1..=limit)
            .rev()
            .find(|&i| text[i].0.is_whitespace())
            .unwrap_or(limit);

        row.extend_from_slice(&text[start..end]);
        while row.last().map_or(false, |c| c.0.is_whitespace()) && row.len() > indent {
            row.pop();
        }
        rows.push(row);

        start = end;
        first = false;
    }

    rows
}
