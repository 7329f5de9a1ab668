use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph},
    Frame,
};

use crate::app::{App, AppState, AuthState};

use super::forms;
use super::{board, styles};

pub fn render(frame: &mut Frame, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(2), // Title bar
            Constraint::Min(10),   // Board
            Constraint::Length(1), // Status bar
        ])
        .split(frame.area());

    render_title_bar(frame, app, chunks[0]);
    render_main_content(frame, app, chunks[1]);
    render_status_bar(frame, app, chunks[2]);

    // Render overlays
    match app.state {
        AppState::ShowingHelp => render_help_overlay(frame),
        AppState::LoggingIn => forms::render_login(frame, app),
        AppState::SigningUp => forms::render_signup(frame, app),
        AppState::CreatingTask | AppState::EditingTask => forms::render_task_form(frame, app),
        AppState::ConfirmingDelete => forms::render_confirm_delete(frame, app),
        AppState::ConfirmingQuit => render_quit_overlay(frame),
        AppState::Normal | AppState::Quitting => {}
    }
}

fn render_title_bar(frame: &mut Frame, app: &App, area: Rect) {
    let title = "  taskdeck";
    let right = match app.username() {
        Some(username) => format!("{}  [?] Help ", username),
        None => "[?] Help ".to_string(),
    };

    let padding = (area.width as usize).saturating_sub(title.len() + right.len());
    let title_line = Line::from(vec![
        Span::styled(title, styles::title_style()),
        Span::raw(" ".repeat(padding)),
        Span::styled(right, styles::muted_style()),
    ]);

    let block = Block::default()
        .borders(Borders::BOTTOM)
        .border_style(styles::muted_style());

    frame.render_widget(Paragraph::new(title_line).block(block), area);
}

fn render_main_content(frame: &mut Frame, app: &App, area: Rect) {
    if app.auth == AuthState::Authenticated || !app.board.is_empty() {
        board::render(frame, app, area);
        return;
    }

    // Nothing to show behind the login/signup overlays
    let message = match app.auth {
        AuthState::Initializing => "Connecting...",
        _ => "Sign in to see your tasks",
    };
    let paragraph = Paragraph::new(Line::from(Span::styled(message, styles::muted_style())))
        .centered()
        .block(Block::default());
    let vertical_center = Rect {
        y: area.y + area.height / 2,
        height: 1,
        ..area
    };
    frame.render_widget(paragraph, vertical_center);
}

fn render_status_bar(frame: &mut Frame, app: &App, area: Rect) {
    let left_text = if let Some(ref message) = app.status_message {
        format!(" {} ", message)
    } else if app.tasks_loading {
        " Refreshing tasks... ".to_string()
    } else {
        format!(" {} tasks ", app.board.total())
    };

    let shortcuts = "[n]ew [e]dit [d]elete [[/]]move [u]pdate [q]uit";
    let right_text = format!(" {} ", shortcuts);

    let width = area.width as usize;
    let padding = width
        .saturating_sub(left_text.len())
        .saturating_sub(right_text.len());

    let status_line = Line::from(vec![
        Span::styled(left_text, styles::muted_style()),
        Span::raw(" ".repeat(padding)),
        Span::styled(right_text, styles::muted_style()),
    ]);

    frame.render_widget(
        Paragraph::new(status_line).style(styles::status_bar_style()),
        area,
    );
}

fn render_help_overlay(frame: &mut Frame) {
    let area = forms::centered_rect_fixed(52, 20, frame.area());
    frame.render_widget(Clear, area);

    let version = env!("CARGO_PKG_VERSION");

    let help_line = |key: &'static str, desc: &'static str| {
        Line::from(vec![
            Span::styled(format!("  {:<10}", key), styles::help_key_style()),
            Span::styled(desc, styles::help_desc_style()),
        ])
    };

    let help_text = vec![
        Line::from(Span::styled("  taskdeck", styles::title_style())),
        Line::from(Span::styled(
            format!("  version {}", version),
            styles::muted_style(),
        )),
        Line::from(""),
        Line::from(Span::styled(" Navigation", styles::highlight_style())),
        help_line("←/→/Tab", "Switch column"),
        help_line("↑/↓", "Navigate tasks"),
        Line::from(""),
        Line::from(Span::styled(" Tasks", styles::highlight_style())),
        help_line("n", "New task"),
        help_line("e/Enter", "Edit selected task"),
        help_line("[ / ]", "Move task left/right"),
        help_line("d", "Delete selected task"),
        help_line("u", "Refresh from server"),
        Line::from(""),
        Line::from(Span::styled(" Session", styles::highlight_style())),
        help_line("L", "Log out"),
        help_line("q", "Quit"),
        Line::from(""),
        Line::from(Span::styled(
            " Press Esc to close",
            styles::muted_style(),
        )),
    ];

    let paragraph = Paragraph::new(help_text).block(
        Block::default()
            .title(" Help ")
            .title_style(styles::title_style())
            .borders(Borders::ALL)
            .border_style(styles::border_style(true)),
    );
    frame.render_widget(paragraph, area);
}

fn render_quit_overlay(frame: &mut Frame) {
    let area = forms::centered_rect_fixed(40, 7, frame.area());
    frame.render_widget(Clear, area);

    let lines = vec![
        Line::from(""),
        Line::from("Quit taskdeck?").centered(),
        Line::from(""),
        Line::from(vec![
            Span::styled("[y]", styles::help_key_style()),
            Span::raw(" quit    "),
            Span::styled("[n]", styles::help_key_style()),
            Span::raw(" stay"),
        ])
        .centered(),
    ];

    let paragraph = Paragraph::new(lines).block(
        Block::default()
            .title(" Confirm ")
            .title_style(styles::title_style())
            .borders(Borders::ALL)
            .border_style(styles::border_style(true)),
    );
    frame.render_widget(paragraph, area);
}
