use ropey::Rope;
use std::cmp;

use crate::text_width::TextWidthCalculator;

/// The raw text input underneath the overlay.
///
/// Holds the marker-free text the user edits, a character-offset caret and a
/// vertical viewport. After every edit the owner hands the text to the
/// composer and writes the canonical text and caret back with [`set_text`].
/// The viewport scrolls in both directions so the caret stays visible.
///
/// [`set_text`]: InputBuffer::set_text
#[derive(Clone)]
pub struct InputBuffer {
    rope: Rope,
    cursor: usize,
    // Display column kept while moving across lines of different widths.
    preferred_col: Option<usize>,
    viewport_offset: usize,
    viewport_height: usize,
    // First visible display column.
    viewport_col: usize,
    viewport_width: usize,
    text_calculator: TextWidthCalculator,
}

impl InputBuffer {
    pub fn new() -> Self {
        Self {
            rope: Rope::new(),
            cursor: 0,
            preferred_col: None,
            viewport_offset: 0,
            viewport_height: 5,
            viewport_col: 0,
            viewport_width: 80,
            text_calculator: TextWidthCalculator::new(),
        }
    }

    pub fn text(&self) -> String {
        self.rope.to_string()
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn len_chars(&self) -> usize {
        self.rope.len_chars()
    }

    pub fn line_count(&self) -> usize {
        self.rope.len_lines()
    }

    /// Replaces the whole text, e.g. with the composer's canonical text.
    pub fn set_text(&mut self, text: &str, cursor: usize) {
        self.rope = Rope::from_str(text);
        self.cursor = cursor.min(self.rope.len_chars());
        self.preferred_col = None;
    }

    pub fn clear(&mut self) {
        self.set_text("", 0);
        self.viewport_offset = 0;
        self.viewport_col = 0;
    }

    pub fn insert_char(&mut self, c: char) {
        self.rope.insert_char(self.cursor, c);
        self.cursor += 1;
        self.preferred_col = None;
    }

    /// Deletes the character before the caret. Returns false at the start of
    /// the buffer.
    pub fn delete_backward(&mut self) -> bool {
        if self.cursor == 0 {
            return false;
        }
        self.rope.remove(self.cursor - 1..self.cursor);
        self.cursor -= 1;
        self.preferred_col = None;
        true
    }

    pub fn delete_forward(&mut self) -> bool {
        if self.cursor >= self.rope.len_chars() {
            return false;
        }
        self.rope.remove(self.cursor..self.cursor + 1);
        self.preferred_col = None;
        true
    }

    /// Caret as `(line, character column)`.
    pub fn cursor_position(&self) -> (usize, usize) {
        let line = self.rope.char_to_line(self.cursor);
        (line, self.cursor - self.rope.line_to_char(line))
    }

    /// Caret as `(line, display column)`.
    pub fn cursor_screen_position(&self) -> (usize, usize) {
        let (line, col) = self.cursor_position();
        let width = self
            .text_calculator
            .char_index_to_col(&self.line_text(line), col);
        (line, width)
    }

    /// Text of `line` without its trailing newline.
    pub fn line_text(&self, line: usize) -> String {
        match self.rope.get_line(line) {
            Some(slice) => {
                let text = slice.to_string();
                text.strip_suffix('\n').map(str::to_string).unwrap_or(text)
            }
            None => String::new(),
        }
    }

    fn line_len(&self, line: usize) -> usize {
        self.line_text(line).chars().count()
    }

    pub fn move_cursor_left(&mut self) {
        self.cursor = self.cursor.saturating_sub(1);
        self.preferred_col = None;
    }

    pub fn move_cursor_right(&mut self) {
        self.cursor = cmp::min(self.cursor + 1, self.rope.len_chars());
        self.preferred_col = None;
    }

    pub fn move_cursor_up(&mut self) {
        let (line, _) = self.cursor_position();
        if line > 0 {
            self.move_to_line(line - 1);
        }
    }

    pub fn move_cursor_down(&mut self) {
        let (line, _) = self.cursor_position();
        if line + 1 < self.rope.len_lines() {
            self.move_to_line(line + 1);
        }
    }

    pub fn move_to_line_start(&mut self) {
        let (line, _) = self.cursor_position();
        self.cursor = self.rope.line_to_char(line);
        self.preferred_col = None;
    }

    pub fn move_to_line_end(&mut self) {
        let (line, _) = self.cursor_position();
        self.cursor = self.rope.line_to_char(line) + self.line_len(line);
        self.preferred_col = None;
    }

    fn move_to_line(&mut self, target: usize) {
        let col = match self.preferred_col {
            Some(col) => col,
            None => self.cursor_screen_position().1,
        };
        let text = self.line_text(target);
        let char_col = self.text_calculator.col_to_char_index(&text, col);
        self.cursor = self.rope.line_to_char(target) + char_col;
        self.preferred_col = Some(col);
    }

    pub fn set_viewport_height(&mut self, height: usize) {
        self.viewport_height = height.max(1);
        self.adjust_viewport();
    }

    pub fn viewport_height(&self) -> usize {
        self.viewport_height
    }

    pub fn viewport_offset(&self) -> usize {
        self.viewport_offset
    }

    pub fn set_viewport_width(&mut self, width: usize) {
        self.viewport_width = width.max(1);
        self.adjust_viewport();
    }

    pub fn viewport_width(&self) -> usize {
        self.viewport_width
    }

    pub fn viewport_column(&self) -> usize {
        self.viewport_col
    }

    /// Scrolls just enough for the caret to be visible, first by line and
    /// then by display column.
    pub fn adjust_viewport(&mut self) {
        let (line, col) = self.cursor_screen_position();
        if line < self.viewport_offset {
            self.viewport_offset = line;
        } else if line >= self.viewport_offset + self.viewport_height {
            self.viewport_offset = line + 1 - self.viewport_height;
        }

        if col < self.viewport_col {
            self.viewport_col = col;
        } else if col >= self.viewport_col + self.viewport_width {
            self.viewport_col = col + 1 - self.viewport_width;
        }
    }
}

impl Default for InputBuffer {
    fn default() -> Self {
        Self::new()
    }
}
