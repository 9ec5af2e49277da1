use ratatui::buffer::Buffer;
use ratatui::layout::{Alignment, Constraint, Direction, Layout, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Paragraph, Widget};

use crate::session::drill::TypingSession;
use crate::session::result::DrillReport;
use crate::ui::components::drill_stats::accuracy_color;
use crate::ui::components::typing_area::TypingArea;
use crate::ui::theme::Theme;

/// Finished-drill view: headline numbers above the reviewed text.
pub struct DrillReportView<'a> {
    pub report: &'a DrillReport,
    pub session: Option<&'a TypingSession>,
    pub theme: &'a Theme,
}

impl<'a> DrillReportView<'a> {
    pub fn new(
        report: &'a DrillReport,
        session: Option<&'a TypingSession>,
        theme: &'a Theme,
    ) -> Self {
        Self {
            report,
            session,
            theme,
        }
    }
}

impl Widget for DrillReportView<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let colors = &self.theme.colors;

        let block = Block::bordered()
            .title(" Drill Complete ")
            .border_style(Style::default().fg(colors.accent()))
            .style(Style::default().bg(colors.bg()));
        let inner = block.inner(area);
        block.render(area, buf);

        let layout = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(2),
                Constraint::Length(5),
                Constraint::Min(3),
                Constraint::Length(2),
            ])
            .split(inner);

        let title = Paragraph::new(Line::from(Span::styled(
            "Results",
            Style::default()
                .fg(colors.accent())
                .add_modifier(Modifier::BOLD),
        )))
        .alignment(Alignment::Center);
        title.render(layout[0], buf);

        let acc_color = accuracy_color(self.report.accuracy, colors);
        let correct = self
            .report
            .total_chars
            .saturating_sub(self.report.error_count);
        let lines = vec![
            Line::from(vec![
                Span::styled("  Speed:    ", Style::default().fg(colors.fg())),
                Span::styled(
                    format!("{} WPM", self.report.wpm),
                    Style::default()
                        .fg(colors.accent())
                        .add_modifier(Modifier::BOLD),
                ),
            ]),
            Line::from(vec![
                Span::styled("  Accuracy: ", Style::default().fg(colors.fg())),
                Span::styled(
                    format!("{}%", self.report.accuracy),
                    Style::default().fg(acc_color).add_modifier(Modifier::BOLD),
                ),
                Span::styled(
                    format!("  ({correct}/{} clean)", self.report.total_chars),
                    Style::default().fg(colors.text_pending()),
                ),
            ]),
            Line::from(vec![
                Span::styled("  Time:     ", Style::default().fg(colors.fg())),
                Span::styled(self.report.elapsed_label(), Style::default().fg(colors.fg())),
            ]),
            Line::from(vec![
                Span::styled("  Mistakes: ", Style::default().fg(colors.fg())),
                Span::styled(
                    self.report.error_count.to_string(),
                    Style::default().fg(if self.report.error_count == 0 {
                        colors.success()
                    } else {
                        colors.error()
                    }),
                ),
            ]),
        ];
        Paragraph::new(lines).render(layout[1], buf);

        if let Some(session) = self.session {
            TypingArea::new(session, self.theme)
                .title("Review")
                .render(layout[2], buf);
        }

        let help = Paragraph::new(Line::from(vec![
            Span::styled("  [r] Retry  ", Style::default().fg(colors.accent())),
            Span::styled("[d] Drills  ", Style::default().fg(colors.accent())),
            Span::styled("[q] Menu", Style::default().fg(colors.accent())),
        ]));
        help.render(layout[3], buf);
    }
}
