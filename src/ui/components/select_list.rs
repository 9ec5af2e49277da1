use ratatui::buffer::Buffer;
use ratatui::layout::Rect;
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Paragraph, Widget, Wrap};

use crate::ui::theme::Theme;

/// One pickable entry: a title line with a tag, and a dimmed detail line.
pub struct ListRow {
    pub title: String,
    pub tag: String,
    pub detail: String,
}

/// Vertical picker used for drills and exam tasks.
pub struct SelectList<'a> {
    title: &'a str,
    rows: &'a [ListRow],
    selected: usize,
    theme: &'a Theme,
}

impl<'a> SelectList<'a> {
    pub fn new(title: &'a str, rows: &'a [ListRow], selected: usize, theme: &'a Theme) -> Self {
        Self {
            title,
            rows,
            selected,
            theme,
        }
    }
}

/// First row to draw so that `selected` stays visible in `visible` rows.
pub fn scroll_offset(selected: usize, visible: usize) -> usize {
    if visible == 0 {
        return selected;
    }
    selected.saturating_sub(visible - 1)
}

impl Widget for SelectList<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let colors = &self.theme.colors;

        let block = Block::bordered()
            .title(format!(" {} ", self.title))
            .border_style(Style::default().fg(colors.accent()))
            .style(Style::default().bg(colors.bg()));
        let inner = block.inner(area);
        block.render(area, buf);

        // Each row takes three lines: title, detail, spacer.
        let visible = (inner.height / 3) as usize;
        let offset = scroll_offset(self.selected, visible);

        let mut lines = Vec::new();
        for (i, row) in self.rows.iter().enumerate().skip(offset).take(visible.max(1)) {
            let is_selected = i == self.selected;
            let indicator = if is_selected { " > " } else { "   " };
            let title_style = Style::default()
                .fg(if is_selected { colors.accent() } else { colors.fg() })
                .add_modifier(if is_selected {
                    Modifier::BOLD
                } else {
                    Modifier::empty()
                });

            lines.push(Line::from(vec![
                Span::styled(format!("{indicator}{}", row.title), title_style),
                Span::styled(
                    format!("  [{}]", row.tag),
                    Style::default().fg(colors.text_pending()),
                ),
            ]));
            lines.push(Line::from(Span::styled(
                format!("     {}", row.detail),
                Style::default().fg(colors.text_pending()),
            )));
            lines.push(Line::from(""));
        }

        Paragraph::new(lines)
            .wrap(Wrap { trim: false })
            .render(inner, buf);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scroll_keeps_selection_visible() {
        assert_eq!(scroll_offset(0, 4), 0);
        assert_eq!(scroll_offset(3, 4), 0);
        assert_eq!(scroll_offset(4, 4), 1);
        assert_eq!(scroll_offset(9, 4), 6);
        assert_eq!(scroll_offset(2, 0), 2);
    }
}
