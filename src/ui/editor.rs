use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EditorAction {
    /// Text changed; the owner should sync it into the session.
    Edited,
    /// Cursor moved or the key did nothing.
    Continue,
    Submit,
    Back,
}

/// Multi-line text buffer behind the essay pane.
pub struct EssayEditor {
    text: String,
    /// Cursor position as a char index (0 = before first char).
    cursor: usize,
}

impl EssayEditor {
    pub fn new(text: &str) -> Self {
        Self {
            text: text.to_string(),
            cursor: text.chars().count(),
        }
    }

    pub fn value(&self) -> &str {
        &self.text
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// Replace the whole buffer and park the cursor at the end.
    pub fn set_text(&mut self, text: &str) {
        self.text = text.to_string();
        self.cursor = text.chars().count();
    }

    /// Zero-based (line, column) of the cursor, in chars.
    pub fn line_col(&self) -> (usize, usize) {
        let mut line = 0;
        let mut col = 0;
        for ch in self.text.chars().take(self.cursor) {
            if ch == '\n' {
                line += 1;
                col = 0;
            } else {
                col += 1;
            }
        }
        (line, col)
    }

    pub fn handle(&mut self, key: KeyEvent) -> EditorAction {
        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
        match key.code {
            KeyCode::Esc => return EditorAction::Back,
            KeyCode::Char('s') if ctrl => return EditorAction::Submit,
            KeyCode::F(5) => return EditorAction::Submit,

            KeyCode::Left => self.cursor = self.cursor.saturating_sub(1),
            KeyCode::Right => {
                if self.cursor < self.len() {
                    self.cursor += 1;
                }
            }
            KeyCode::Up => self.move_vertical(false),
            KeyCode::Down => self.move_vertical(true),
            KeyCode::Home => self.cursor = self.line_bounds().0,
            KeyCode::End => self.cursor = self.line_bounds().1,
            KeyCode::Char('a') if ctrl => self.cursor = self.line_bounds().0,
            KeyCode::Char('e') if ctrl => self.cursor = self.line_bounds().1,

            KeyCode::Enter => {
                self.insert('\n');
                return EditorAction::Edited;
            }
            KeyCode::Backspace => {
                if self.cursor == 0 {
                    return EditorAction::Continue;
                }
                self.remove_range(self.cursor - 1, self.cursor);
                self.cursor -= 1;
                return EditorAction::Edited;
            }
            KeyCode::Delete => {
                if self.cursor >= self.len() {
                    return EditorAction::Continue;
                }
                self.remove_range(self.cursor, self.cursor + 1);
                return EditorAction::Edited;
            }
            KeyCode::Char('w') if ctrl => {
                return if self.delete_word_back() {
                    EditorAction::Edited
                } else {
                    EditorAction::Continue
                };
            }
            KeyCode::Char('u') if ctrl => {
                let start = self.line_bounds().0;
                if start == self.cursor {
                    return EditorAction::Continue;
                }
                self.remove_range(start, self.cursor);
                self.cursor = start;
                return EditorAction::Edited;
            }
            KeyCode::Char(ch) if !ctrl => {
                self.insert(ch);
                return EditorAction::Edited;
            }
            _ => {}
        }
        EditorAction::Continue
    }

    fn len(&self) -> usize {
        self.text.chars().count()
    }

    /// Convert char index to byte offset.
    fn char_to_byte(&self, char_idx: usize) -> usize {
        self.text
            .char_indices()
            .nth(char_idx)
            .map(|(b, _)| b)
            .unwrap_or(self.text.len())
    }

    fn insert(&mut self, ch: char) {
        let byte_offset = self.char_to_byte(self.cursor);
        self.text.insert(byte_offset, ch);
        self.cursor += 1;
    }

    fn remove_range(&mut self, start: usize, end: usize) {
        let start_byte = self.char_to_byte(start);
        let end_byte = self.char_to_byte(end);
        self.text.replace_range(start_byte..end_byte, "");
    }

    /// Char indices of the start and end of the cursor's line.
    fn line_bounds(&self) -> (usize, usize) {
        let chars: Vec<char> = self.text.chars().collect();
        let mut start = self.cursor;
        while start > 0 && chars[start - 1] != '\n' {
            start -= 1;
        }
        let mut end = self.cursor;
        while end < chars.len() && chars[end] != '\n' {
            end += 1;
        }
        (start, end)
    }

    fn move_vertical(&mut self, down: bool) {
        let (line, col) = self.line_col();
        let lines: Vec<usize> = self.text.split('\n').map(|l| l.chars().count()).collect();
        let target = if down {
            if line + 1 >= lines.len() {
                self.cursor = self.len();
                return;
            }
            line + 1
        } else {
            if line == 0 {
                self.cursor = 0;
                return;
            }
            line - 1
        };
        let start: usize = lines[..target].iter().map(|len| len + 1).sum();
        self.cursor = start + col.min(lines[target]);
    }

    /// Delete word before cursor (unix-word-rubout: skip whitespace, then non-whitespace).
    fn delete_word_back(&mut self) -> bool {
        if self.cursor == 0 {
            return false;
        }
        let chars: Vec<char> = self.text.chars().collect();
        let mut pos = self.cursor;

        while pos > 0 && chars[pos - 1].is_whitespace() {
            pos -= 1;
        }
        while pos > 0 && !chars[pos - 1].is_whitespace() {
            pos -= 1;
        }

        self.remove_range(pos, self.cursor);
        self.cursor = pos;
        true
    }
}
