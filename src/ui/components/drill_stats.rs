use ratatui::buffer::Buffer;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Paragraph, Widget};

use crate::engine::metrics;
use crate::session::drill::TypingSession;
use crate::session::result::DrillReport;
use crate::ui::theme::{Theme, ThemeColors};

pub struct DrillStats<'a> {
    session: &'a TypingSession,
    last_report: Option<&'a DrillReport>,
    theme: &'a Theme,
}

impl<'a> DrillStats<'a> {
    pub fn new(
        session: &'a TypingSession,
        last_report: Option<&'a DrillReport>,
        theme: &'a Theme,
    ) -> Self {
        Self {
            session,
            last_report,
            theme,
        }
    }
}

pub fn accuracy_color(accuracy: u32, colors: &ThemeColors) -> Color {
    if accuracy >= 95 {
        colors.success()
    } else if accuracy >= 85 {
        colors.warning()
    } else {
        colors.error()
    }
}

/// Format a delta value with arrow indicator
fn format_delta(delta: i64, suffix: &str) -> String {
    if delta > 0 {
        format!("\u{2191}+{delta}{suffix}")
    } else if delta < 0 {
        format!("\u{2193}{delta}{suffix}")
    } else {
        format!("={suffix}")
    }
}

impl Widget for DrillStats<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let colors = &self.theme.colors;

        let sections = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Min(10),
                Constraint::Length(if self.last_report.is_some() { 9 } else { 0 }),
            ])
            .split(area);

        let live = self.session.live_metrics();
        let progress = self.session.progress() * 100.0;
        let elapsed = metrics::format_elapsed(self.session.elapsed());

        let lines = vec![
            Line::from(vec![
                Span::styled("WPM: ", Style::default().fg(colors.fg())),
                Span::styled(live.wpm.to_string(), Style::default().fg(colors.accent())),
            ]),
            Line::from(""),
            Line::from(vec![
                Span::styled("Accuracy: ", Style::default().fg(colors.fg())),
                Span::styled(
                    format!("{}%", live.accuracy),
                    Style::default().fg(accuracy_color(live.accuracy, colors)),
                ),
            ]),
            Line::from(""),
            Line::from(vec![
                Span::styled("Progress: ", Style::default().fg(colors.fg())),
                Span::styled(format!("{progress:.0}%"), Style::default().fg(colors.accent())),
            ]),
            Line::from(""),
            Line::from(vec![
                Span::styled("Mistakes: ", Style::default().fg(colors.fg())),
                Span::styled(
                    self.session.error_count().to_string(),
                    Style::default().fg(colors.error()),
                ),
            ]),
            Line::from(""),
            Line::from(vec![
                Span::styled("Time: ", Style::default().fg(colors.fg())),
                Span::styled(elapsed, Style::default().fg(colors.fg())),
            ]),
        ];

        let block = Block::bordered()
            .title(" Stats ")
            .border_style(Style::default().fg(colors.border()))
            .style(Style::default().bg(colors.bg()));
        Paragraph::new(lines).block(block).render(sections[0], buf);

        if let Some(last) = self.last_report {
            let wpm_delta = i64::from(live.wpm) - i64::from(last.wpm);
            let delta_color = if wpm_delta > 0 {
                colors.success()
            } else if wpm_delta < 0 {
                colors.error()
            } else {
                colors.text_pending()
            };

            let lines = vec![
                Line::from(vec![
                    Span::styled("WPM: ", Style::default().fg(colors.fg())),
                    Span::styled(last.wpm.to_string(), Style::default().fg(colors.accent())),
                ]),
                Line::from(vec![
                    Span::styled("  now: ", Style::default().fg(colors.text_pending())),
                    Span::styled(format_delta(wpm_delta, ""), Style::default().fg(delta_color)),
                ]),
                Line::from(vec![
                    Span::styled("Accuracy: ", Style::default().fg(colors.fg())),
                    Span::styled(
                        format!("{}%", last.accuracy),
                        Style::default().fg(accuracy_color(last.accuracy, colors)),
                    ),
                ]),
                Line::from(vec![
                    Span::styled("Mistakes: ", Style::default().fg(colors.fg())),
                    Span::styled(last.error_count.to_string(), Style::default().fg(colors.error())),
                ]),
                Line::from(vec![
                    Span::styled("Time: ", Style::default().fg(colors.fg())),
                    Span::styled(last.elapsed_label(), Style::default().fg(colors.fg())),
                ]),
            ];

            let block = Block::bordered()
                .title(" Last Drill ")
                .border_style(Style::default().fg(colors.border()))
                .style(Style::default().bg(colors.bg()));
            Paragraph::new(lines).block(block).render(sections[1], buf);
        }
    }
}
