use ratatui::buffer::Buffer;
use ratatui::layout::Rect;
use ratatui::style::Style;
use ratatui::text::Line;
use ratatui::widgets::{Block, Widget};

use crate::exam::task::{LengthHint, TaskKind};
use crate::ui::editor::EssayEditor;
use crate::ui::theme::Theme;

/// Editor text broken into screen rows, with the cursor's row and column.
#[derive(Debug, PartialEq)]
pub struct VisualRows {
    pub rows: Vec<String>,
    pub cursor_row: usize,
    pub cursor_col: usize,
}

/// Hard-wrap `text` at `width` chars, tracking where char index `cursor` lands.
pub fn wrap_rows(text: &str, cursor: usize, width: usize) -> VisualRows {
    let width = width.max(1);
    let mut rows = Vec::new();
    let mut row = String::new();
    let mut row_len = 0;
    let mut cursor_pos = None;

    for (idx, ch) in text.chars().enumerate() {
        if ch != '\n' && row_len == width {
            rows.push(std::mem::take(&mut row));
            row_len = 0;
        }
        if idx == cursor {
            cursor_pos = Some((rows.len(), row_len));
        }
        if ch == '\n' {
            rows.push(std::mem::take(&mut row));
            row_len = 0;
        } else {
            row.push(ch);
            row_len += 1;
        }
    }

    let (cursor_row, cursor_col) = cursor_pos.unwrap_or_else(|| {
        if row_len == width {
            (rows.len() + 1, 0)
        } else {
            (rows.len(), row_len)
        }
    });
    rows.push(row);

    VisualRows {
        rows,
        cursor_row,
        cursor_col,
    }
}

pub struct EssayPane<'a> {
    editor: &'a EssayEditor,
    kind: TaskKind,
    word_count: usize,
    editable: bool,
    theme: &'a Theme,
}

impl<'a> EssayPane<'a> {
    pub fn new(
        editor: &'a EssayEditor,
        kind: TaskKind,
        word_count: usize,
        editable: bool,
        theme: &'a Theme,
    ) -> Self {
        Self {
            editor,
            kind,
            word_count,
            editable,
            theme,
        }
    }
}

impl Widget for EssayPane<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let colors = &self.theme.colors;

        let hint = LengthHint::classify(self.kind, self.word_count);
        let hint_color = match hint {
            LengthHint::BelowMinimum => colors.warning(),
            LengthHint::Ideal => colors.success(),
            LengthHint::Long => colors.accent(),
        };

        let block = Block::bordered()
            .title(format!(" Your answer \u{00b7} {} words ", self.word_count))
            .title_bottom(
                Line::styled(format!(" {} ", hint.label(self.kind)), Style::default().fg(hint_color))
                    .right_aligned(),
            )
            .border_style(Style::default().fg(if self.editable {
                colors.border_focused()
            } else {
                colors.border()
            }))
            .style(Style::default().bg(colors.bg()));
        let inner = block.inner(area);
        block.render(area, buf);

        if inner.width == 0 || inner.height == 0 {
            return;
        }

        let visual = wrap_rows(self.editor.value(), self.editor.cursor(), inner.width as usize);
        let height = inner.height as usize;
        let scroll = visual.cursor_row.saturating_sub(height - 1);

        let text_style = Style::default().fg(if self.editable {
            colors.fg()
        } else {
            colors.text_pending()
        });
        for (i, row) in visual.rows.iter().skip(scroll).take(height).enumerate() {
            buf.set_string(inner.x, inner.y + i as u16, row, text_style);
        }

        if self.editable && visual.cursor_row >= scroll && visual.cursor_row < scroll + height {
            let x = inner.x + visual.cursor_col.min(inner.width as usize - 1) as u16;
            let y = inner.y + (visual.cursor_row - scroll) as u16;
            buf[(x, y)].set_style(
                Style::default()
                    .fg(colors.text_cursor_fg())
                    .bg(colors.text_cursor_bg()),
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wraps_long_lines() {
        let visual = wrap_rows("abcdefg", 7, 3);
        assert_eq!(visual.rows, vec!["abc", "def", "g"]);
        assert_eq!((visual.cursor_row, visual.cursor_col), (2, 1));
    }

    #[test]
    fn newlines_start_new_rows() {
        let visual = wrap_rows("ab\ncd", 3, 10);
        assert_eq!(visual.rows, vec!["ab", "cd"]);
        assert_eq!((visual.cursor_row, visual.cursor_col), (1, 0));
    }

    #[test]
    fn cursor_on_newline_stays_on_its_row() {
        let visual = wrap_rows("ab\ncd", 2, 10);
        assert_eq!((visual.cursor_row, visual.cursor_col), (0, 2));
    }

    #[test]
    fn full_row_pushes_end_cursor_down() {
        let visual = wrap_rows("abc", 3, 3);
        assert_eq!(visual.rows, vec!["abc"]);
        assert_eq!((visual.cursor_row, visual.cursor_col), (1, 0));
    }

    #[test]
    fn empty_text_has_one_row() {
        let visual = wrap_rows("", 0, 10);
        assert_eq!(visual.rows, vec![String::new()]);
        assert_eq!((visual.cursor_row, visual.cursor_col), (0, 0));
    }
}
