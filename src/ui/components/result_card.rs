use ratatui::buffer::Buffer;
use ratatui::layout::Rect;
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Paragraph, Widget, Wrap};

use crate::exam::evaluation::{ErrorKind, Evaluation, Frequency, Severity};
use crate::exam::task::{TaskKind, WordCountStatus};
use crate::ui::theme::{Theme, ThemeColors};

/// Scrollable evaluation report shown after grading.
pub struct ResultCard<'a> {
    evaluation: &'a Evaluation,
    kind: TaskKind,
    time_taken: Option<&'a str>,
    scroll: u16,
    theme: &'a Theme,
}

impl<'a> ResultCard<'a> {
    pub fn new(
        evaluation: &'a Evaluation,
        kind: TaskKind,
        time_taken: Option<&'a str>,
        scroll: u16,
        theme: &'a Theme,
    ) -> Self {
        Self {
            evaluation,
            kind,
            time_taken,
            scroll,
            theme,
        }
    }
}

fn band_color(band: f64, colors: &ThemeColors) -> Color {
    if band >= 7.0 {
        colors.success()
    } else if band >= 5.5 {
        colors.warning()
    } else {
        colors.error()
    }
}

fn error_kind_label(kind: ErrorKind) -> &'static str {
    match kind {
        ErrorKind::Grammar => "grammar",
        ErrorKind::Vocabulary => "vocabulary",
        ErrorKind::Coherence => "coherence",
        ErrorKind::Task => "task",
    }
}

fn frequency_label(frequency: Frequency) -> &'static str {
    match frequency {
        Frequency::Rare => "rare",
        Frequency::Occasional => "occasional",
        Frequency::Frequent => "frequent",
    }
}

fn severity_color(severity: Severity, colors: &ThemeColors) -> Color {
    match severity {
        Severity::Minor => colors.text_pending(),
        Severity::Moderate => colors.warning(),
        Severity::Severe => colors.error(),
    }
}

fn heading(text: &str, colors: &ThemeColors) -> Line<'static> {
    Line::from(Span::styled(
        text.to_string(),
        Style::default()
            .fg(colors.accent())
            .add_modifier(Modifier::BOLD),
    ))
}

fn bullets(lines: &mut Vec<Line<'static>>, items: &[String], marker: &str, color: Color) {
    for item in items {
        lines.push(Line::from(vec![
            Span::styled(format!("  {marker} "), Style::default().fg(color)),
            Span::raw(item.clone()),
        ]));
    }
}

/// Every line of the report, top to bottom.
pub fn evaluation_lines(
    evaluation: &Evaluation,
    kind: TaskKind,
    time_taken: Option<&str>,
    colors: &ThemeColors,
) -> Vec<Line<'static>> {
    let mut lines = Vec::new();
    let fg = Style::default().fg(colors.fg());
    let dim = Style::default().fg(colors.text_pending());

    lines.push(Line::from(vec![
        Span::styled("  Overall band: ", fg),
        Span::styled(
            format!("{:.1}", evaluation.overall_band),
            Style::default()
                .fg(band_color(evaluation.overall_band, colors))
                .add_modifier(Modifier::BOLD),
        ),
        Span::styled(format!("   {kind}"), dim),
    ]));
    if evaluation.word_count_penalty {
        lines.push(Line::from(Span::styled(
            format!(
                "  Capped: fewer than {} words were written.",
                kind.min_words()
            ),
            Style::default().fg(colors.error()),
        )));
    }

    let status = WordCountStatus::classify(kind, evaluation.word_count);
    let mut meta = vec![
        Span::styled("  Words: ", fg),
        Span::styled(evaluation.word_count.to_string(), fg),
        Span::styled(format!(" ({})", status.label(kind)), dim),
    ];
    if let Some(time_taken) = time_taken {
        meta.push(Span::styled("   Time: ", fg));
        meta.push(Span::styled(time_taken.to_string(), fg));
    }
    lines.push(Line::from(meta));
    lines.push(Line::from(""));

    lines.push(heading("Criteria", colors));
    let criteria = [
        (kind.first_criterion_label(), evaluation.criteria.task),
        ("Coherence & Cohesion", evaluation.criteria.coherence),
        ("Lexical Resource", evaluation.criteria.lexical),
        ("Grammatical Range & Accuracy", evaluation.criteria.grammar),
    ];
    for (label, score) in criteria {
        lines.push(Line::from(vec![
            Span::styled(format!("  {label:<30}"), fg),
            Span::styled(
                format!("{score:.1}"),
                Style::default().fg(band_color(score, colors)),
            ),
        ]));
    }
    lines.push(Line::from(""));

    let feedback = &evaluation.feedback;
    if !feedback.strengths.is_empty() {
        lines.push(heading("Strengths", colors));
        bullets(&mut lines, &feedback.strengths, "+", colors.success());
        lines.push(Line::from(""));
    }
    if !feedback.improvements.is_empty() {
        lines.push(heading("Areas to improve", colors));
        bullets(&mut lines, &feedback.improvements, "-", colors.error());
        lines.push(Line::from(""));
    }
    if !feedback.tips.is_empty() {
        lines.push(heading("Tips", colors));
        bullets(&mut lines, &feedback.tips, "*", colors.accent());
        lines.push(Line::from(""));
    }

    if evaluation.has_enrichment() {
        lines.push(Line::from(Span::styled(
            "Detailed analysis",
            Style::default()
                .fg(colors.accent())
                .add_modifier(Modifier::BOLD | Modifier::UNDERLINED),
        )));
        lines.push(Line::from(""));
        enrichment_lines(&mut lines, evaluation, colors);
    }

    lines.push(heading("Model answer", colors));
    for paragraph in evaluation.model_answer.lines() {
        lines.push(Line::from(Span::styled(format!("  {paragraph}"), fg)));
    }

    lines
}

fn enrichment_lines(lines: &mut Vec<Line<'static>>, evaluation: &Evaluation, colors: &ThemeColors) {
    let fg = Style::default().fg(colors.fg());
    let dim = Style::default().fg(colors.text_pending());

    if !evaluation.band_upgrades.is_empty() {
        lines.push(heading("Reaching the next band", colors));
        for upgrade in &evaluation.band_upgrades {
            lines.push(Line::from(Span::styled(
                format!(
                    "  {:.1} \u{2192} {:.1}",
                    upgrade.current_band, upgrade.target_band
                ),
                fg.add_modifier(Modifier::BOLD),
            )));
            bullets(lines, &upgrade.suggestions, "-", colors.accent());
        }
        lines.push(Line::from(""));
    }

    if !evaluation.error_patterns.is_empty() {
        lines.push(heading("Recurring errors", colors));
        for pattern in &evaluation.error_patterns {
            lines.push(Line::from(vec![
                Span::styled(
                    format!("  [{}] ", error_kind_label(pattern.kind)),
                    Style::default().fg(severity_color(pattern.severity, colors)),
                ),
                Span::styled(pattern.description.clone(), fg),
                Span::styled(format!(" ({})", frequency_label(pattern.frequency)), dim),
            ]));
            for example in &pattern.examples {
                lines.push(Line::from(Span::styled(format!("      \"{example}\""), dim)));
            }
        }
        lines.push(Line::from(""));
    }

    if !evaluation.vocabulary_improvements.is_empty() {
        lines.push(heading("Vocabulary", colors));
        for vocab in &evaluation.vocabulary_improvements {
            lines.push(Line::from(vec![
                Span::styled(format!("  {}", vocab.original), Style::default().fg(colors.error())),
                Span::styled(" \u{2192} ", dim),
                Span::styled(vocab.alternatives.join(", "), Style::default().fg(colors.success())),
            ]));
            if !vocab.reason.is_empty() {
                lines.push(Line::from(Span::styled(format!("      {}", vocab.reason), dim)));
            }
        }
        lines.push(Line::from(""));
    }
}

impl Widget for ResultCard<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let colors = &self.theme.colors;

        let block = Block::bordered()
            .title(" Examiner Report ")
            .border_style(Style::default().fg(colors.accent()))
            .style(Style::default().bg(colors.bg()));

        let lines = evaluation_lines(self.evaluation, self.kind, self.time_taken, colors);
        Paragraph::new(lines)
            .block(block)
            .wrap(Wrap { trim: false })
            .scroll((self.scroll, 0))
            .render(area, buf);
    }
}
