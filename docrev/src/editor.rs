//! Line-based text editor backing the document edit mode.
//!
//! Holds the scratch buffer as a vector of lines plus a cursor. The cursor
//! column counts characters, not bytes, so multi-byte text edits safely.

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocEditor {
    lines: Vec<String>,
    row: usize,
    col: usize,
    trailing_newline: bool,
    /// First visible line; kept so the cursor stays on screen.
    pub scroll: usize,
}

impl DocEditor {
    /// Splits `text` into lines with the cursor at the top.
    pub fn new(text: &str) -> Self {
        let trailing_newline = text.ends_with('\n');
        let body = text.strip_suffix('\n').unwrap_or(text);
        let lines = body.split('\n').map(str::to_owned).collect();
        Self { lines, row: 0, col: 0, trailing_newline, scroll: 0 }
    }

    /// The edited text, with the original trailing newline preserved.
    pub fn text(&self) -> String {
        let mut text = self.lines.join("\n");
        if self.trailing_newline {
            text.push('\n');
        }
        text
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    /// `(row, column)` of the cursor, column in characters.
    pub fn cursor(&self) -> (usize, usize) {
        (self.row, self.col)
    }

    fn line_len(&self, row: usize) -> usize {
        self.lines[row].chars().count()
    }

    fn byte_index(&self, row: usize, col: usize) -> usize {
        let line = &self.lines[row];
        line.char_indices().nth(col).map_or(line.len(), |(i, _)| i)
    }

    pub fn insert_char(&mut self, c: char) {
        if c == '\n' {
            self.insert_newline();
            return;
        }
        let at = self.byte_index(self.row, self.col);
        self.lines[self.row].insert(at, c);
        self.col += 1;
    }

    /// Splits the current line at the cursor.
    pub fn insert_newline(&mut self) {
        let at = self.byte_index(self.row, self.col);
        let rest = self.lines[self.row].split_off(at);
        self.row += 1;
        self.col = 0;
        self.lines.insert(self.row, rest);
    }

    /// Deletes the character before the cursor, joining lines at column 0.
    pub fn backspace(&mut self) {
        if self.col > 0 {
            let at = self.byte_index(self.row, self.col - 1);
            self.lines[self.row].remove(at);
            self.col -= 1;
        } else if self.row > 0 {
            let line = self.lines.remove(self.row);
            self.row -= 1;
            self.col = self.line_len(self.row);
            self.lines[self.row].push_str(&line);
        }
    }

    /// Deletes the character under the cursor, joining the next line at the end.
    pub fn delete(&mut self) {
        if self.col < self.line_len(self.row) {
            let at = self.byte_index(self.row, self.col);
            self.lines[self.row].remove(at);
        } else if self.row + 1 < self.lines.len() {
            let next = self.lines.remove(self.row + 1);
            self.lines[self.row].push_str(&next);
        }
    }

    pub fn move_left(&mut self) {
        if self.col > 0 {
            self.col -= 1;
        } else if self.row > 0 {
            self.row -= 1;
            self.col = self.line_len(self.row);
        }
    }

    pub fn move_right(&mut self) {
        if self.col < self.line_len(self.row) {
            self.col += 1;
        } else if self.row + 1 < self.lines.len() {
            self.row += 1;
            self.col = 0;
        }
    }

    pub fn move_up(&mut self) {
        if self.row > 0 {
            self.row -= 1;
            self.col = self.col.min(self.line_len(self.row));
        }
    }

    pub fn move_down(&mut self) {
        if self.row + 1 < self.lines.len() {
            self.row += 1;
            self.col = self.col.min(self.line_len(self.row));
        }
    }

    pub fn line_start(&mut self) {
        self.col = 0;
    }

    pub fn line_end(&mut self) {
        self.col = self.line_len(self.row);
    }

    /// Moves the cursor `rows` lines down (or up when negative).
    pub fn move_rows(&mut self, rows: isize) {
        let last = self.lines.len() - 1;
        self.row = self.row.saturating_add_signed(rows).min(last);
        self.col = self.col.min(self.line_len(self.row));
    }

    /// Adjusts `scroll` so the cursor row fits in a viewport of `height` rows.
    pub fn follow_cursor(&mut self, height: usize) {
        let height = height.max(1);
        if self.row < self.scroll {
            self.scroll = self.row;
        } else if self.row >= self.scroll + height {
            self.scroll = self.row + 1 - height;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn text_keeps_trailing_newline() {
        assert_eq!(DocEditor::new("a\nb\n").text(), "a\nb\n");
        assert_eq!(DocEditor::new("a\nb").text(), "a\nb");
        assert_eq!(DocEditor::new("").text(), "");
    }

    #[test]
    fn typing_and_splitting_lines() {
        let mut editor = DocEditor::new("# Doc\n");
        editor.line_end();
        editor.insert_newline();
        for c in "body".chars() {
            editor.insert_char(c);
        }
        assert_eq!(editor.text(), "# Doc\nbody\n");
        assert_eq!(editor.cursor(), (1, 4));
    }

    #[test]
    fn backspace_at_line_start_joins_lines() {
        let mut editor = DocEditor::new("ab\ncd");
        editor.move_down();
        editor.backspace();
        assert_eq!(editor.text(), "abcd");
        assert_eq!(editor.cursor(), (0, 2));
    }

    #[test]
    fn delete_at_line_end_joins_next_line() {
        let mut editor = DocEditor::new("ab\ncd");
        editor.line_end();
        editor.delete();
        assert_eq!(editor.text(), "abcd");
    }

    #[test]
    fn multibyte_characters_edit_by_char() {
        let mut editor = DocEditor::new("é–x");
        editor.move_right();
        editor.move_right();
        editor.backspace();
        assert_eq!(editor.text(), "éx");
        editor.insert_char('ü');
        assert_eq!(editor.text(), "éüx");
    }

    #[test]
    fn vertical_moves_clamp_column() {
        let mut editor = DocEditor::new("long line\nab\n");
        editor.line_end();
        editor.move_down();
        assert_eq!(editor.cursor(), (1, 2));
        editor.move_rows(-10);
        assert_eq!(editor.cursor(), (0, 2));
        editor.move_rows(10);
        assert_eq!(editor.cursor().0, 1);
    }

    #[test]
    fn scroll_follows_cursor() {
        let mut editor = DocEditor::new("1\n2\n3\n4\n5\n");
        editor.move_rows(4);
        editor.follow_cursor(2);
        assert_eq!(editor.scroll, 3);
        editor.move_rows(-4);
        editor.follow_cursor(2);
        assert_eq!(editor.scroll, 0);
    }
}
