//! Level-1 normalization shared by every language.

/// Converts `\r\n` and lone `\r` line endings to `\n`.
pub(crate) fn normalize_line_endings(content: &str) -> String {
    if !content.contains('\r') {
        return content.to_string();
    }
    content.replace("\r\n", "\n").replace('\r', "\n")
}

/// Strips trailing whitespace, collapses blank-line runs to one blank line,
/// drops leading and trailing blank lines and ends non-empty output with a
/// single newline.
pub(crate) fn finalize(content: &str) -> String {
    let mut out = String::with_capacity(content.len());
    let mut pending_blank = false;

    for line in content.split('\n') {
        let line = line.trim_end();
        if line.is_empty() {
            pending_blank = !out.is_empty();
            continue;
        }
        if pending_blank {
            out.push('\n');
            pending_blank = false;
        }
        out.push_str(line);
        out.push('\n');
    }

    out
}

/// Column width of leading whitespace, with tabs advancing to the next
/// multiple of 8.
pub(crate) fn indent_width(leading: &str) -> usize {
    leading.chars().fold(0, |width, ch| match ch {
        '\t' => (width / 8 + 1) * 8,
        _ => width + 1,
    })
}

/// Maps original indentation widths onto new columns. Each distinct deeper
/// width opens one column past its parent.
#[derive(Debug, Default)]
pub(crate) struct DepthTracker {
    /// (original width, assigned column), innermost last
    levels: Vec<(usize, usize)>,
}

impl DepthTracker {
    /// Column for a line that takes part in nesting.
    pub(crate) fn column_for(&mut self, width: usize) -> usize {
        while self.levels.last().is_some_and(|&(top, _)| top > width) {
            self.levels.pop();
        }
        match self.levels.last() {
            Some(&(top, column)) if top == width => column,
            Some(&(_, column)) => {
                self.levels.push((width, column + 1));
                column + 1
            }
            None => {
                self.levels.push((width, 0));
                0
            }
        }
    }

    /// Column for a line that must not open or close a level, such as a
    /// comment at an odd indent.
    pub(crate) fn peek(&self, width: usize) -> usize {
        match self.levels.iter().rev().find(|&&(top, _)| top <= width) {
            Some(&(top, column)) if top == width => column,
            Some(&(_, column)) => column + 1,
            None => 0,
        }
    }

    /// Pins content found at original `width` to `column`.
    pub(crate) fn open(&mut self, width: usize, column: usize) {
        while self.levels.last().is_some_and(|&(top, _)| top >= width) {
            self.levels.pop();
        }
        self.levels.push((width, column));
    }
}
