//! Task board rendering: three status columns plus a detail pane for
//! the selected task.

use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, ListState, Paragraph},
    Frame,
};

use crate::app::App;
use crate::models::{Task, TaskStatus};
use crate::ui::styles;
use crate::utils::{format_date, format_datetime, truncate_string};

/// Height of the detail pane under the columns
const DETAIL_HEIGHT: u16 = 8;

pub fn render(frame: &mut Frame, app: &App, area: Rect) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(5), Constraint::Length(DETAIL_HEIGHT)])
        .split(area);

    render_columns(frame, app, chunks[0]);
    render_detail(frame, app, chunks[1]);
}

fn render_columns(frame: &mut Frame, app: &App, area: Rect) {
    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage(33),
            Constraint::Percentage(34),
            Constraint::Percentage(33),
        ])
        .split(area);

    for (i, status) in TaskStatus::ALL.into_iter().enumerate() {
        render_column(frame, app, chunks[i], status);
    }
}

fn render_column(frame: &mut Frame, app: &App, area: Rect, status: TaskStatus) {
    let tasks = app.board.column(status);
    let focused = app.focused_column == status;

    let width = (area.width as usize).saturating_sub(4);
    let items: Vec<ListItem> = tasks
        .iter()
        .map(|task| ListItem::new(task_line(task, status, width)))
        .collect();

    let title = format!(" {} ({}) ", status.label(), tasks.len());
    let block = Block::default()
        .title(title)
        .title_style(if focused {
            styles::status_style(status)
        } else {
            styles::muted_style()
        })
        .borders(Borders::ALL)
        .border_style(styles::border_style(focused));

    let list = List::new(items)
        .block(block)
        .highlight_style(styles::selected_style());

    let mut state = ListState::default();
    if focused && !tasks.is_empty() {
        state.select(Some(app.selected_index(status)));
    }

    frame.render_stateful_widget(list, area, &mut state);
}

fn task_line(task: &Task, status: TaskStatus, width: usize) -> Line<'static> {
    // Done tasks render compactly: title only
    if status == TaskStatus::Done {
        return Line::from(Span::styled(
            truncate_string(&task.title, width),
            styles::muted_style(),
        ));
    }

    let mut spans = vec![Span::styled(
        truncate_string(&task.title, width),
        styles::list_item_style(),
    )];
    if task.deadline.is_some() {
        spans.push(Span::styled(" !", styles::deadline_style()));
    }
    Line::from(spans)
}

fn render_detail(frame: &mut Frame, app: &App, area: Rect) {
    let block = Block::default()
        .title(" Task ")
        .title_style(styles::muted_style())
        .borders(Borders::ALL)
        .border_style(styles::muted_style());

    let content = match app.selected_task() {
        Some(task) => detail_lines(task, (area.width as usize).saturating_sub(4)),
        None => vec![Line::from(Span::styled(
            "No task selected",
            styles::muted_style(),
        ))],
    };

    let paragraph = Paragraph::new(content).block(block);
    frame.render_widget(paragraph, area);
}

fn detail_lines(task: &Task, width: usize) -> Vec<Line<'static>> {
    let mut lines = vec![Line::from(vec![
        Span::styled(task.title.clone(), styles::title_style()),
        Span::raw("  "),
        Span::styled(format!("[{}]", task.status), styles::status_style(task.status)),
    ])];

    if let Some(ref deadline) = task.deadline {
        lines.push(Line::from(vec![
            Span::styled("Deadline: ", styles::muted_style()),
            Span::styled(format_datetime(deadline), styles::deadline_style()),
        ]));
    }

    if let Some(ref created) = task.created_at {
        lines.push(Line::from(vec![
            Span::styled("Created:  ", styles::muted_style()),
            Span::raw(format_date(created)),
        ]));
    }

    if let Some(assigned) = task.assigned_to {
        lines.push(Line::from(vec![
            Span::styled("Assignee: ", styles::muted_style()),
            Span::raw(format!("#{}", assigned)),
        ]));
    }

    if let Some(ref description) = task.description {
        if !description.trim().is_empty() {
            lines.push(Line::from(""));
            lines.push(Line::from(truncate_string(description.trim(), width * 2)));
        }
    }

    lines
}
