use std::io;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::Result;
use bandr::app::{self, App, AppScreen};
use bandr::catalog::Catalog;
use bandr::config::Config;
use bandr::event::{AppEvent, EventHandler, ThreadScheduler};
use bandr::exam::session::Stage;
use bandr::logging;
use bandr::ui;
use bandr::ui::components::drill_report::DrillReportView;
use bandr::ui::components::drill_stats::DrillStats;
use bandr::ui::components::essay_pane::EssayPane;
use bandr::ui::components::menu::MenuChoice;
use bandr::ui::components::progress_bar::ProgressBar;
use bandr::ui::components::result_card::ResultCard;
use bandr::ui::components::select_list::{ListRow, SelectList};
use bandr::ui::components::typing_area::TypingArea;
use bandr::ui::layout::AppLayout;
use bandr::ui::theme::Theme;
use clap::Parser;
use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use crossterm::execute;
use crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
};
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Paragraph, Wrap};
use tracing::{info, warn};

type TuiApp = App<ThreadScheduler>;

#[derive(Parser)]
#[command(name = "bandr", version, about = "Terminal IELTS writing trainer")]
struct Cli {
    #[arg(short, long, help = "Theme name (light, dark)")]
    theme: Option<String>,

    #[arg(short, long, help = "Grading endpoint URL")]
    grader_url: Option<String>,

    #[arg(short, long, help = "Log level (error, warn, info, debug, trace)")]
    log_level: Option<String>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let (mut config, load_error) = Config::load_or_default();
    if let Some(theme) = cli.theme {
        config.theme = theme;
    }
    if let Some(url) = cli.grader_url {
        config.grader_url = Some(url);
    }
    if let Some(level) = cli.log_level {
        config.log_level = level;
    }
    config.normalize_theme(&Theme::available_themes());

    let _log_guard = logging::init(&PathBuf::from(&config.log_dir), &config.log_level)?;
    info!(version = env!("CARGO_PKG_VERSION"), "bandr starting");
    if let Some(err) = &load_error {
        warn!(error = %format!("{err:#}"), "config unreadable, running with defaults");
    }

    let catalog = Catalog::bundled()?;
    let events = EventHandler::new(Duration::from_millis(100));
    let grader = app::build_grader(&config);
    let scheduler = ThreadScheduler::new(events.sender());
    let mut app = App::new(config, catalog, scheduler, grader, events.sender());

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;

    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = run_app(&mut terminal, &mut app, &events);

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    if let Err(err) = app.config.save() {
        warn!(error = %err, "could not save config");
    }

    if let Some(err) = load_error {
        eprintln!("Warning: config was not loaded or saved: {err:#}");
    }
    if let Err(err) = result {
        eprintln!("Error: {err:?}");
    }

    Ok(())
}

fn run_app(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut TuiApp,
    events: &EventHandler,
) -> Result<()> {
    loop {
        terminal.draw(|frame| render(frame, app))?;

        match events.next()? {
            AppEvent::Key(key) => handle_key(app, key),
            AppEvent::Countdown(id) => app.on_countdown(id),
            AppEvent::Graded { id, outcome } => app.on_graded(id, outcome),
            AppEvent::Tick | AppEvent::Resize(_, _) => {}
        }

        if app.should_quit {
            info!("bandr exiting");
            return Ok(());
        }
    }
}

fn handle_key(app: &mut TuiApp, key: KeyEvent) {
    // Only process Press events; ignore Repeat/Release to avoid inflating input
    if key.kind != KeyEventKind::Press {
        return;
    }

    if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
        app.should_quit = true;
        return;
    }
    if key.code == KeyCode::F(2) {
        app.toggle_theme();
        return;
    }

    match app.screen {
        AppScreen::Menu => handle_menu_key(app, key),
        AppScreen::DrillSelect => handle_drill_select_key(app, key),
        AppScreen::Drill => handle_drill_key(app, key),
        AppScreen::DrillResult => handle_drill_result_key(app, key),
        AppScreen::ExamSelect => handle_exam_select_key(app, key),
        AppScreen::Exam => handle_exam_key(app, key),
    }
}

fn activate(app: &mut TuiApp, choice: MenuChoice) {
    match choice {
        MenuChoice::Drills => app.go_to_drill_select(),
        MenuChoice::Exam => app.go_to_exam_select(),
        MenuChoice::ToggleTheme => app.toggle_theme(),
        MenuChoice::Quit => app.should_quit = true,
    }
}

fn handle_menu_key(app: &mut TuiApp, key: KeyEvent) {
    match key.code {
        KeyCode::Char('q') | KeyCode::Esc => app.should_quit = true,
        KeyCode::Char('1') => activate(app, MenuChoice::Drills),
        KeyCode::Char('2') => activate(app, MenuChoice::Exam),
        KeyCode::Char('t') => activate(app, MenuChoice::ToggleTheme),
        KeyCode::Up | KeyCode::Char('k') => app.menu.prev(),
        KeyCode::Down | KeyCode::Char('j') => app.menu.next(),
        KeyCode::Enter => activate(app, app.menu.choice()),
        _ => {}
    }
}

fn handle_drill_select_key(app: &mut TuiApp, key: KeyEvent) {
    match key.code {
        KeyCode::Esc | KeyCode::Char('q') => app.go_to_menu(),
        KeyCode::Up | KeyCode::Char('k') => app.drill_prev(),
        KeyCode::Down | KeyCode::Char('j') => app.drill_next(),
        KeyCode::Enter => app.start_drill(),
        _ => {}
    }
}

fn handle_drill_key(app: &mut TuiApp, key: KeyEvent) {
    match key.code {
        KeyCode::Esc => app.go_to_drill_select(),
        KeyCode::Tab => app.retry_drill(),
        KeyCode::Backspace => app.backspace(),
        KeyCode::Enter => app.type_char('\n'),
        KeyCode::Char(ch) => app.type_char(ch),
        _ => {}
    }
}

fn handle_drill_result_key(app: &mut TuiApp, key: KeyEvent) {
    match key.code {
        KeyCode::Char('r') | KeyCode::Enter => app.retry_drill(),
        KeyCode::Char('d') => app.go_to_drill_select(),
        KeyCode::Char('q') | KeyCode::Esc => app.go_to_menu(),
        _ => {}
    }
}

fn handle_exam_select_key(app: &mut TuiApp, key: KeyEvent) {
    match key.code {
        KeyCode::Esc | KeyCode::Char('q') => app.go_to_menu(),
        KeyCode::Up | KeyCode::Char('k') => app.task_prev(),
        KeyCode::Down | KeyCode::Char('j') => app.task_next(),
        KeyCode::Enter => app.start_exam(),
        _ => {}
    }
}

fn handle_exam_key(app: &mut TuiApp, key: KeyEvent) {
    match app.exam.stage() {
        Stage::Writing => app.on_editor_key(key),
        Stage::Submitting => {
            if key.code == KeyCode::Esc {
                app.go_to_exam_select();
            }
        }
        Stage::Result => match key.code {
            KeyCode::Esc | KeyCode::Char('b') => app.revise_essay(),
            KeyCode::Char('n') => app.go_to_exam_select(),
            KeyCode::Char('q') => app.go_to_menu(),
            KeyCode::Up | KeyCode::Char('k') => app.scroll_result(-1),
            KeyCode::Down | KeyCode::Char('j') => app.scroll_result(1),
            KeyCode::PageUp => app.scroll_result(-10),
            KeyCode::PageDown => app.scroll_result(10),
            _ => {}
        },
        Stage::Selecting => app.screen = AppScreen::ExamSelect,
    }
}

/// First line of `text`, cut to `max` chars with an ellipsis.
fn preview(text: &str, max: usize) -> String {
    let first = text.lines().next().unwrap_or("");
    if first.chars().count() <= max {
        first.to_string()
    } else {
        let cut: String = first.chars().take(max.saturating_sub(1)).collect();
        format!("{cut}\u{2026}")
    }
}

fn render(frame: &mut ratatui::Frame, app: &TuiApp) {
    let area = frame.area();
    let colors = &app.theme.theme().colors;

    let bg = Block::default().style(Style::default().bg(colors.bg()));
    frame.render_widget(bg, area);

    match app.screen {
        AppScreen::Menu => render_menu(frame, app),
        AppScreen::DrillSelect => render_drill_select(frame, app),
        AppScreen::Drill => render_drill(frame, app),
        AppScreen::DrillResult => render_drill_result(frame, app),
        AppScreen::ExamSelect => render_exam_select(frame, app),
        AppScreen::Exam => render_exam(frame, app),
    }
}

fn render_header(frame: &mut ratatui::Frame, app: &TuiApp, area: Rect, info: &str) {
    let colors = &app.theme.theme().colors;
    let header = Paragraph::new(Line::from(vec![
        Span::styled(
            " bandr ",
            Style::default()
                .fg(colors.header_fg())
                .bg(colors.header_bg())
                .add_modifier(Modifier::BOLD),
        ),
        Span::styled(
            info.to_string(),
            Style::default()
                .fg(colors.text_pending())
                .bg(colors.header_bg()),
        ),
    ]))
    .style(Style::default().bg(colors.header_bg()));
    frame.render_widget(header, area);
}

fn render_footer(frame: &mut ratatui::Frame, app: &TuiApp, area: Rect, hints: &[&str]) {
    let colors = &app.theme.theme().colors;
    let lines: Vec<Line> = ui::layout::pack_hint_lines(hints, area.width as usize)
        .into_iter()
        .map(|l| Line::from(Span::styled(l, Style::default().fg(colors.text_pending()))))
        .collect();
    frame.render_widget(Paragraph::new(lines), area);
}

fn render_menu(frame: &mut ratatui::Frame, app: &TuiApp) {
    let area = frame.area();
    let layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),
            Constraint::Min(0),
            Constraint::Length(1),
        ])
        .split(area);

    let info = format!(
        " | {} drills | {} exam tasks | theme: {}",
        app.catalog.drills.len(),
        app.catalog.exam_tasks.len(),
        app.theme.name()
    );
    render_header(frame, app, layout[0], &info);

    let menu_area = ui::layout::centered_rect(50, 80, layout[1]);
    frame.render_widget(app.menu.view(app.theme.theme()), menu_area);

    render_footer(
        frame,
        app,
        layout[2],
        &["[1] Drills", "[2] Exam", "[t/F2] Theme", "[q] Quit"],
    );
}

fn render_drill_select(frame: &mut ratatui::Frame, app: &TuiApp) {
    let area = frame.area();
    let layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(0), Constraint::Length(1)])
        .split(area);

    let rows: Vec<ListRow> = app
        .catalog
        .drills
        .iter()
        .map(|d| ListRow {
            title: d.title.clone(),
            tag: format!("{} \u{00b7} {}", d.category.as_str(), d.difficulty.as_str()),
            detail: format!(
                "{} ({} chars)",
                preview(&d.text, 60),
                d.text.chars().count()
            ),
        })
        .collect();

    let list_area = ui::layout::centered_rect(70, 90, layout[0]);
    frame.render_widget(
        SelectList::new("Typing Drills", &rows, app.drill_selected, app.theme.theme()),
        list_area,
    );
    render_footer(frame, app, layout[1], &["[Enter] Start", "[j/k] Move", "[Esc] Menu"]);
}

fn render_drill(frame: &mut ratatui::Frame, app: &TuiApp) {
    let Some(drill) = app.drill.as_ref() else {
        return;
    };
    let area = frame.area();
    let theme = app.theme.theme();
    let colors = &theme.colors;
    let app_layout = AppLayout::new(area);
    let tier = app_layout.tier;

    let title = app
        .catalog
        .drills
        .get(app.drill_selected)
        .map_or("Drill", |d| d.title.as_str());

    let header_text = if tier.show_sidebar() {
        format!(" {title} ")
    } else {
        let live = drill.live_metrics();
        format!(
            " {title} | WPM: {} | Acc: {}% | Mistakes: {}",
            live.wpm,
            live.accuracy,
            drill.error_count()
        )
    };
    let header = Paragraph::new(Line::from(Span::styled(
        header_text,
        Style::default()
            .fg(colors.header_fg())
            .bg(colors.header_bg())
            .add_modifier(Modifier::BOLD),
    )))
    .style(Style::default().bg(colors.header_bg()));
    frame.render_widget(header, app_layout.header);

    let show_progress = tier.show_progress_bar(area.height);
    let mut constraints = vec![Constraint::Min(5)];
    if show_progress {
        constraints.push(Constraint::Length(3));
    }
    let main_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints(constraints)
        .split(app_layout.main);

    frame.render_widget(TypingArea::new(drill, theme), main_layout[0]);
    if show_progress {
        frame.render_widget(
            ProgressBar::new("Progress", drill.progress(), theme),
            main_layout[1],
        );
    }

    if let Some(sidebar_area) = app_layout.sidebar {
        frame.render_widget(
            DrillStats::new(drill, app.last_report.as_ref(), theme),
            sidebar_area,
        );
    }

    render_footer(
        frame,
        app,
        app_layout.footer,
        &["[Esc] Quit drill", "[Tab] Restart", "[Backspace] Delete"],
    );
}

fn render_drill_result(frame: &mut ratatui::Frame, app: &TuiApp) {
    let area = frame.area();
    if let Some(report) = app.last_report.as_ref() {
        let centered = ui::layout::centered_rect(80, 90, area);
        frame.render_widget(
            DrillReportView::new(report, app.drill.as_ref(), app.theme.theme()),
            centered,
        );
    }
}

fn render_exam_select(frame: &mut ratatui::Frame, app: &TuiApp) {
    let area = frame.area();
    let layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(0), Constraint::Length(1)])
        .split(area);

    let rows: Vec<ListRow> = app
        .catalog
        .exam_tasks
        .iter()
        .map(|t| ListRow {
            title: format!("{} \u{00b7} {}", t.kind, t.category.as_str()),
            tag: format!(
                "{} min, {}+ words",
                t.time_allowance_secs() / 60,
                t.kind.min_words()
            ),
            detail: preview(&t.prompt, 70),
        })
        .collect();

    let list_area = ui::layout::centered_rect(70, 90, layout[0]);
    frame.render_widget(
        SelectList::new("Exam Tasks", &rows, app.task_selected, app.theme.theme()),
        list_area,
    );
    render_footer(frame, app, layout[1], &["[Enter] Begin", "[j/k] Move", "[Esc] Menu"]);
}

fn render_exam(frame: &mut ratatui::Frame, app: &TuiApp) {
    let Some(task) = app.exam.selected_task() else {
        return;
    };
    let area = frame.area();
    let theme = app.theme.theme();
    let colors = &theme.colors;

    let layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),
            Constraint::Min(0),
            Constraint::Length(1),
        ])
        .split(area);

    let info = format!(" | {} \u{00b7} {}", task.kind, task.category.as_str());
    render_header(frame, app, layout[0], &info);

    if app.exam.stage() == Stage::Result {
        if let Some(evaluation) = app.exam.evaluation() {
            let time_taken = app.exam.time_taken();
            frame.render_widget(
                ResultCard::new(
                    evaluation,
                    task.kind,
                    time_taken.as_deref(),
                    app.result_scroll,
                    theme,
                ),
                layout[1],
            );
        }
        render_footer(
            frame,
            app,
            layout[2],
            &["[j/k] Scroll", "[b] Revise essay", "[n] New task", "[q] Menu"],
        );
        return;
    }

    let body = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage(30),
            Constraint::Length(3),
            Constraint::Min(5),
        ])
        .split(layout[1]);

    let mut prompt_lines = vec![Line::from(Span::styled(
        task.prompt.clone(),
        Style::default().fg(colors.fg()),
    ))];
    if let Some(outline) = &task.data_outline {
        prompt_lines.push(Line::from(""));
        for line in outline.lines() {
            prompt_lines.push(Line::from(Span::styled(
                line.to_string(),
                Style::default().fg(colors.text_pending()),
            )));
        }
    }
    let prompt = Paragraph::new(prompt_lines)
        .block(
            Block::bordered()
                .title(format!(" {} ", task.kind))
                .border_style(Style::default().fg(colors.border()))
                .style(Style::default().bg(colors.bg())),
        )
        .wrap(Wrap { trim: true });
    frame.render_widget(prompt, body[0]);

    let clock = ProgressBar::new("Time left", app.exam.remaining_ratio(), theme)
        .caption(app.exam.remaining_label())
        .warn(app.exam.is_low_time());
    frame.render_widget(clock, body[1]);

    let writing = app.exam.stage() == Stage::Writing;
    frame.render_widget(
        EssayPane::new(&app.editor, task.kind, app.exam.word_count(), writing, theme),
        body[2],
    );

    if app.exam.stage() == Stage::Submitting {
        let status = Paragraph::new(Line::from(Span::styled(
            "  Grading your essay\u{2026}  [Esc] Abandon",
            Style::default().fg(colors.accent()),
        )));
        frame.render_widget(status, layout[2]);
    } else if let Some(error) = app.exam.last_error() {
        let status = Paragraph::new(Line::from(Span::styled(
            format!("  {error}  [Ctrl+S] Retry"),
            Style::default().fg(colors.error()),
        )));
        frame.render_widget(status, layout[2]);
    } else {
        let submit_hint = if app.exam.can_submit() {
            "[Ctrl+S/F5] Submit"
        } else {
            ""
        };
        render_footer(frame, app, layout[2], &[submit_hint, "[Esc] Change task"]);
    }
}
