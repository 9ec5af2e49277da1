use ratatui::buffer::Buffer;
use ratatui::layout::Rect;
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Paragraph, Widget, Wrap};

use crate::session::drill::TypingSession;
use crate::session::input::CharStatus;
use crate::ui::theme::Theme;

pub struct TypingArea<'a> {
    session: &'a TypingSession,
    title: Option<&'a str>,
    theme: &'a Theme,
}

impl<'a> TypingArea<'a> {
    pub fn new(session: &'a TypingSession, theme: &'a Theme) -> Self {
        Self {
            session,
            title: None,
            theme,
        }
    }

    pub fn title(mut self, title: &'a str) -> Self {
        self.title = Some(title);
        self
    }
}

/// A render token maps a single reference character to its display representation.
struct RenderToken {
    idx: usize,
    display: String,
    is_line_break: bool,
}

/// Expand reference chars into render tokens, handling whitespace display.
fn build_render_tokens(reference: &[char]) -> Vec<RenderToken> {
    let mut tokens = Vec::new();
    let mut col = 0usize;

    for (i, &ch) in reference.iter().enumerate() {
        match ch {
            '\n' => {
                tokens.push(RenderToken {
                    idx: i,
                    display: "\u{21b5}".to_string(), // ↵
                    is_line_break: true,
                });
                col = 0;
            }
            '\t' => {
                let tab_width = 4 - (col % 4);
                let mut display = String::from("\u{2192}"); // →
                for _ in 1..tab_width {
                    display.push('\u{00b7}'); // ·
                }
                tokens.push(RenderToken {
                    idx: i,
                    display,
                    is_line_break: false,
                });
                col += tab_width;
            }
            _ => {
                tokens.push(RenderToken {
                    idx: i,
                    display: ch.to_string(),
                    is_line_break: false,
                });
                col += 1;
            }
        }
    }

    tokens
}

impl Widget for TypingArea<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let colors = &self.theme.colors;
        let reference = self.session.reference();
        let cursor = self.session.cursor();
        let tokens = build_render_tokens(reference);

        let mut lines: Vec<Vec<Span>> = vec![Vec::new()];

        for token in &tokens {
            let status = self.session.char_status(token.idx);
            let style = match status {
                CharStatus::Correct => Style::default().fg(colors.text_correct()),
                CharStatus::Corrected => Style::default()
                    .fg(colors.text_corrected())
                    .bg(colors.text_corrected_bg()),
                CharStatus::Incorrect(_) => Style::default()
                    .fg(colors.text_incorrect())
                    .bg(colors.text_incorrect_bg())
                    .add_modifier(Modifier::UNDERLINED),
                CharStatus::Pending if token.idx == cursor && !self.session.is_terminal() => {
                    Style::default()
                        .fg(colors.text_cursor_fg())
                        .bg(colors.text_cursor_bg())
                }
                CharStatus::Pending => Style::default().fg(colors.text_pending()),
            };

            // Mistyped letters show what was typed; whitespace keeps its marker.
            let display = match status {
                CharStatus::Incorrect(actual)
                    if !matches!(reference[token.idx], '\n' | '\t') && actual != '\n' =>
                {
                    actual.to_string()
                }
                _ => token.display.clone(),
            };

            if let Some(line) = lines.last_mut() {
                line.push(Span::styled(display, style));
            }

            if token.is_line_break {
                lines.push(Vec::new());
            }
        }

        let ratatui_lines: Vec<Line> = lines.into_iter().map(Line::from).collect();

        let mut block = Block::bordered()
            .border_style(Style::default().fg(colors.border()))
            .style(Style::default().bg(colors.bg()));
        if let Some(title) = self.title {
            block = block.title(format!(" {title} "));
        }

        let paragraph = Paragraph::new(ratatui_lines)
            .block(block)
            .wrap(Wrap { trim: false });

        paragraph.render(area, buf);
    }
}
