//! Overlay forms: login, signup, task create/edit, and the delete
//! confirmation dialog.

use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph},
    Frame,
};

use crate::app::{App, AppState, LoginFocus, SignupFocus, TaskFieldFocus};
use crate::ui::styles;
use crate::utils::truncate_string;

/// Fixed-size centered rectangle, clamped to the frame
pub fn centered_rect_fixed(width: u16, height: u16, area: Rect) -> Rect {
    let width = width.min(area.width);
    let height = height.min(area.height);
    Rect {
        x: area.x + (area.width.saturating_sub(width)) / 2,
        y: area.y + (area.height.saturating_sub(height)) / 2,
        width,
        height,
    }
}

/// One bordered input line with a label. The trailing underscore marks
/// the focused field.
fn input_field(label: &str, value: &str, focused: bool, masked: bool) -> Paragraph<'static> {
    let shown = if masked {
        "*".repeat(value.chars().count())
    } else {
        value.to_string()
    };
    let cursor = if focused { "_" } else { "" };

    Paragraph::new(format!("{}{}", shown, cursor)).block(
        Block::default()
            .title(format!(" {} ", label))
            .title_style(styles::muted_style())
            .borders(Borders::ALL)
            .border_style(styles::border_style(focused)),
    )
}

fn button_line(label: &str, focused: bool) -> Line<'static> {
    let style = if focused {
        styles::selected_style().fg(styles::PRIMARY)
    } else {
        styles::muted_style()
    };
    Line::from(Span::styled(format!("[ {} ]", label), style)).centered()
}

fn error_line(error: &Option<String>) -> Line<'static> {
    match error {
        Some(message) => {
            Line::from(Span::styled(message.clone(), styles::error_style())).centered()
        }
        None => Line::from(""),
    }
}

pub fn render_login(frame: &mut Frame, app: &App) {
    let area = centered_rect_fixed(52, 14, frame.area());
    frame.render_widget(Clear, area);

    let block = Block::default()
        .title(" Log In ")
        .title_style(styles::title_style())
        .borders(Borders::ALL)
        .border_style(styles::border_style(true));
    frame.render_widget(block, area);

    let inner = area.inner(ratatui::layout::Margin {
        horizontal: 2,
        vertical: 1,
    });
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Username
            Constraint::Length(3), // Password
            Constraint::Length(1), // Login button
            Constraint::Length(1), // Signup link
            Constraint::Length(1), // spacing
            Constraint::Length(1), // error
        ])
        .split(inner);

    frame.render_widget(
        input_field(
            "Username",
            &app.login.username,
            app.login.focus == LoginFocus::Username,
            false,
        ),
        chunks[0],
    );
    frame.render_widget(
        input_field(
            "Password",
            &app.login.password,
            app.login.focus == LoginFocus::Password,
            true,
        ),
        chunks[1],
    );
    frame.render_widget(
        Paragraph::new(button_line(
            "Log In",
            app.login.focus == LoginFocus::Button,
        )),
        chunks[2],
    );
    frame.render_widget(
        Paragraph::new(button_line(
            "Create an account",
            app.login.focus == LoginFocus::SignupLink,
        )),
        chunks[3],
    );
    frame.render_widget(Paragraph::new(error_line(&app.login.error)), chunks[5]);
}

pub fn render_signup(frame: &mut Frame, app: &App) {
    let area = centered_rect_fixed(52, 16, frame.area());
    frame.render_widget(Clear, area);

    let block = Block::default()
        .title(" Create Account ")
        .title_style(styles::title_style())
        .borders(Borders::ALL)
        .border_style(styles::border_style(true));
    frame.render_widget(block, area);

    let inner = area.inner(ratatui::layout::Margin {
        horizontal: 2,
        vertical: 1,
    });
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Username
            Constraint::Length(3), // Email
            Constraint::Length(3), // Password
            Constraint::Length(1), // Sign up button
            Constraint::Length(1), // spacing
            Constraint::Length(1), // error
        ])
        .split(inner);

    frame.render_widget(
        input_field(
            "Username",
            &app.signup.username,
            app.signup.focus == SignupFocus::Username,
            false,
        ),
        chunks[0],
    );
    frame.render_widget(
        input_field(
            "Email",
            &app.signup.email,
            app.signup.focus == SignupFocus::Email,
            false,
        ),
        chunks[1],
    );
    frame.render_widget(
        input_field(
            "Password",
            &app.signup.password,
            app.signup.focus == SignupFocus::Password,
            true,
        ),
        chunks[2],
    );
    frame.render_widget(
        Paragraph::new(button_line(
            "Sign Up",
            app.signup.focus == SignupFocus::Button,
        )),
        chunks[3],
    );
    frame.render_widget(Paragraph::new(error_line(&app.signup.error)), chunks[5]);
}

pub fn render_task_form(frame: &mut Frame, app: &App) {
    let title = match app.state {
        AppState::EditingTask => " Task Details ",
        _ => " New Task ",
    };

    let area = centered_rect_fixed(60, 18, frame.area());
    frame.render_widget(Clear, area);

    let block = Block::default()
        .title(title)
        .title_style(styles::title_style())
        .borders(Borders::ALL)
        .border_style(styles::border_style(true));
    frame.render_widget(block, area);

    let inner = area.inner(ratatui::layout::Margin {
        horizontal: 2,
        vertical: 1,
    });
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Title
            Constraint::Length(3), // Description
            Constraint::Length(3), // Deadline
            Constraint::Length(2), // Status selector
            Constraint::Length(1), // Save button
            Constraint::Length(1), // spacing
            Constraint::Length(1), // error
        ])
        .split(inner);

    let form = &app.task_form;

    frame.render_widget(
        input_field(
            "Title",
            &form.title,
            form.focus == TaskFieldFocus::Title,
            false,
        ),
        chunks[0],
    );
    frame.render_widget(
        input_field(
            "Description",
            &form.description,
            form.focus == TaskFieldFocus::Description,
            false,
        ),
        chunks[1],
    );
    frame.render_widget(
        input_field(
            "Deadline (YYYY-MM-DDTHH:MM)",
            &form.deadline,
            form.focus == TaskFieldFocus::Deadline,
            false,
        ),
        chunks[2],
    );

    let status_focused = form.focus == TaskFieldFocus::Status;
    let status_line = Line::from(vec![
        Span::styled("Status: ", styles::muted_style()),
        Span::styled(
            if status_focused { "◀ " } else { "  " },
            styles::muted_style(),
        ),
        Span::styled(
            form.status.label().to_string(),
            if status_focused {
                styles::status_style(form.status)
            } else {
                styles::list_item_style()
            },
        ),
        Span::styled(
            if status_focused { " ▶" } else { "  " },
            styles::muted_style(),
        ),
    ]);
    frame.render_widget(Paragraph::new(status_line), chunks[3]);

    frame.render_widget(
        Paragraph::new(button_line("Save", form.focus == TaskFieldFocus::Save)),
        chunks[4],
    );
    frame.render_widget(Paragraph::new(error_line(&form.error)), chunks[6]);
}

pub fn render_confirm_delete(frame: &mut Frame, app: &App) {
    let area = centered_rect_fixed(50, 7, frame.area());
    frame.render_widget(Clear, area);

    let title = app
        .pending_delete
        .as_ref()
        .map(|(_, title)| truncate_string(title, 38))
        .unwrap_or_default();

    let lines = vec![
        Line::from(""),
        Line::from(format!("Delete \"{}\"?", title)).centered(),
        Line::from(""),
        Line::from(vec![
            Span::styled("[y]", styles::help_key_style()),
            Span::raw(" delete    "),
            Span::styled("[n]", styles::help_key_style()),
            Span::raw(" keep"),
        ])
        .centered(),
    ];

    let paragraph = Paragraph::new(lines).block(
        Block::default()
            .title(" Confirm Delete ")
            .title_style(styles::error_style())
            .borders(Borders::ALL)
            .border_style(styles::error_style()),
    );
    frame.render_widget(paragraph, area);
}
