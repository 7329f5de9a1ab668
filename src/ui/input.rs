//! Keyboard input handling for the TUI.
//!
//! This module handles all keyboard events and translates them into
//! application state changes.

use anyhow::Result;
use crossterm::event::{KeyCode, KeyEvent};

use crate::app::{
    App, AppState, LoginFocus, SignupFocus, TaskFieldFocus, MAX_DEADLINE_LENGTH,
    MAX_DESCRIPTION_LENGTH, MAX_EMAIL_LENGTH, MAX_PASSWORD_LENGTH, MAX_TITLE_LENGTH,
    MAX_USERNAME_LENGTH,
};
use crate::models::TaskStatus;

fn push_char(field: &mut String, c: char, max_len: usize) {
    if field.chars().count() < max_len {
        field.push(c);
    }
}

/// Handle keyboard input. Returns true if the app should quit.
pub async fn handle_input(app: &mut App, key: KeyEvent) -> Result<bool> {
    // Overlay states swallow all input
    match app.state {
        AppState::LoggingIn => return handle_login_input(app, key).await,
        AppState::SigningUp => return handle_signup_input(app, key).await,
        AppState::CreatingTask | AppState::EditingTask => {
            return handle_task_form_input(app, key).await;
        }
        AppState::ShowingHelp => {
            if matches!(
                key.code,
                KeyCode::Esc | KeyCode::Char('?') | KeyCode::Char('q')
            ) {
                app.state = AppState::Normal;
            }
            return Ok(false);
        }
        AppState::ConfirmingDelete => {
            match key.code {
                KeyCode::Char('y') | KeyCode::Char('Y') | KeyCode::Enter => {
                    app.confirm_delete().await;
                }
                KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => {
                    app.pending_delete = None;
                    app.state = AppState::Normal;
                }
                _ => {}
            }
            return Ok(false);
        }
        AppState::ConfirmingQuit => {
            match key.code {
                KeyCode::Char('y') | KeyCode::Char('Y') | KeyCode::Enter => {
                    app.state = AppState::Quitting;
                    return Ok(true);
                }
                KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => {
                    app.state = AppState::Normal;
                }
                _ => {}
            }
            return Ok(false);
        }
        AppState::Normal | AppState::Quitting => {}
    }

    // Board keys
    match key.code {
        KeyCode::Char('q') => {
            app.state = AppState::ConfirmingQuit;
        }
        KeyCode::Char('?') => {
            app.state = AppState::ShowingHelp;
        }
        KeyCode::Tab | KeyCode::Right => app.focus_next_column(),
        KeyCode::BackTab | KeyCode::Left => app.focus_prev_column(),
        KeyCode::Up | KeyCode::Char('k') => app.move_selection_up(),
        KeyCode::Down | KeyCode::Char('j') => app.move_selection_down(),
        KeyCode::Char('n') => app.open_create_form(),
        KeyCode::Char('e') | KeyCode::Enter => app.open_edit_form(),
        KeyCode::Char('d') => app.request_delete_selected(),
        KeyCode::Char('[') => {
            if let Some(to) = app.focused_column.prev() {
                app.move_selected_task(to).await;
            }
        }
        KeyCode::Char(']') => {
            if let Some(to) = app.focused_column.next() {
                app.move_selected_task(to).await;
            }
        }
        KeyCode::Char('u') => {
            app.refresh_tasks_background();
            app.refresh_user_profile().await;
        }
        KeyCode::Char('L') => app.logout(),
        _ => {}
    }

    Ok(false)
}

async fn handle_login_input(app: &mut App, key: KeyEvent) -> Result<bool> {
    match key.code {
        KeyCode::Esc => {
            app.state = AppState::ConfirmingQuit;
        }
        KeyCode::Tab | KeyCode::Down => {
            app.login.focus = match app.login.focus {
                LoginFocus::Username => LoginFocus::Password,
                LoginFocus::Password => LoginFocus::Button,
                LoginFocus::Button => LoginFocus::SignupLink,
                LoginFocus::SignupLink => LoginFocus::Username,
            };
        }
        KeyCode::BackTab | KeyCode::Up => {
            app.login.focus = match app.login.focus {
                LoginFocus::Username => LoginFocus::SignupLink,
                LoginFocus::Password => LoginFocus::Username,
                LoginFocus::Button => LoginFocus::Password,
                LoginFocus::SignupLink => LoginFocus::Button,
            };
        }
        KeyCode::Enter => match app.login.focus {
            LoginFocus::Username => app.login.focus = LoginFocus::Password,
            LoginFocus::Password | LoginFocus::Button => app.attempt_login().await,
            LoginFocus::SignupLink => app.start_signup(),
        },
        KeyCode::Backspace => match app.login.focus {
            LoginFocus::Username => {
                app.login.username.pop();
            }
            LoginFocus::Password => {
                app.login.password.pop();
            }
            _ => {}
        },
        KeyCode::Char(c) => match app.login.focus {
            LoginFocus::Username => push_char(&mut app.login.username, c, MAX_USERNAME_LENGTH),
            LoginFocus::Password => push_char(&mut app.login.password, c, MAX_PASSWORD_LENGTH),
            _ => {}
        },
        _ => {}
    }

    Ok(false)
}

async fn handle_signup_input(app: &mut App, key: KeyEvent) -> Result<bool> {
    match key.code {
        KeyCode::Esc => app.start_login(),
        KeyCode::Tab | KeyCode::Down => {
            app.signup.focus = match app.signup.focus {
                SignupFocus::Username => SignupFocus::Email,
                SignupFocus::Email => SignupFocus::Password,
                SignupFocus::Password => SignupFocus::Button,
                SignupFocus::Button => SignupFocus::Username,
            };
        }
        KeyCode::BackTab | KeyCode::Up => {
            app.signup.focus = match app.signup.focus {
                SignupFocus::Username => SignupFocus::Button,
                SignupFocus::Email => SignupFocus::Username,
                SignupFocus::Password => SignupFocus::Email,
                SignupFocus::Button => SignupFocus::Password,
            };
        }
        KeyCode::Enter => match app.signup.focus {
            SignupFocus::Username => app.signup.focus = SignupFocus::Email,
            SignupFocus::Email => app.signup.focus = SignupFocus::Password,
            SignupFocus::Password | SignupFocus::Button => app.attempt_signup().await,
        },
        KeyCode::Backspace => match app.signup.focus {
            SignupFocus::Username => {
                app.signup.username.pop();
            }
            SignupFocus::Email => {
                app.signup.email.pop();
            }
            SignupFocus::Password => {
                app.signup.password.pop();
            }
            SignupFocus::Button => {}
        },
        KeyCode::Char(c) => match app.signup.focus {
            SignupFocus::Username => push_char(&mut app.signup.username, c, MAX_USERNAME_LENGTH),
            SignupFocus::Email => push_char(&mut app.signup.email, c, MAX_EMAIL_LENGTH),
            SignupFocus::Password => push_char(&mut app.signup.password, c, MAX_PASSWORD_LENGTH),
            SignupFocus::Button => {}
        },
        _ => {}
    }

    Ok(false)
}

async fn handle_task_form_input(app: &mut App, key: KeyEvent) -> Result<bool> {
    match key.code {
        KeyCode::Esc => {
            app.task_form = Default::default();
            app.state = AppState::Normal;
        }
        KeyCode::Tab | KeyCode::Down => {
            app.task_form.focus = match app.task_form.focus {
                TaskFieldFocus::Title => TaskFieldFocus::Description,
                TaskFieldFocus::Description => TaskFieldFocus::Deadline,
                TaskFieldFocus::Deadline => TaskFieldFocus::Status,
                TaskFieldFocus::Status => TaskFieldFocus::Save,
                TaskFieldFocus::Save => TaskFieldFocus::Title,
            };
        }
        KeyCode::BackTab | KeyCode::Up => {
            app.task_form.focus = match app.task_form.focus {
                TaskFieldFocus::Title => TaskFieldFocus::Save,
                TaskFieldFocus::Description => TaskFieldFocus::Title,
                TaskFieldFocus::Deadline => TaskFieldFocus::Description,
                TaskFieldFocus::Status => TaskFieldFocus::Deadline,
                TaskFieldFocus::Save => TaskFieldFocus::Status,
            };
        }
        KeyCode::Left if app.task_form.focus == TaskFieldFocus::Status => {
            app.task_form.status = app
                .task_form
                .status
                .prev()
                .unwrap_or(TaskStatus::Done);
        }
        KeyCode::Right if app.task_form.focus == TaskFieldFocus::Status => {
            app.task_form.status = app
                .task_form
                .status
                .next()
                .unwrap_or(TaskStatus::Todo);
        }
        KeyCode::Enter => match app.task_form.focus {
            TaskFieldFocus::Save => app.submit_task_form().await,
            TaskFieldFocus::Title => app.task_form.focus = TaskFieldFocus::Description,
            TaskFieldFocus::Description => app.task_form.focus = TaskFieldFocus::Deadline,
            TaskFieldFocus::Deadline => app.task_form.focus = TaskFieldFocus::Status,
            TaskFieldFocus::Status => app.task_form.focus = TaskFieldFocus::Save,
        },
        KeyCode::Backspace => match app.task_form.focus {
            TaskFieldFocus::Title => {
                app.task_form.title.pop();
            }
            TaskFieldFocus::Description => {
                app.task_form.description.pop();
            }
            TaskFieldFocus::Deadline => {
                app.task_form.deadline.pop();
            }
            _ => {}
        },
        KeyCode::Char(c) => match app.task_form.focus {
            TaskFieldFocus::Title => push_char(&mut app.task_form.title, c, MAX_TITLE_LENGTH),
            TaskFieldFocus::Description => {
                push_char(&mut app.task_form.description, c, MAX_DESCRIPTION_LENGTH)
            }
            TaskFieldFocus::Deadline => {
                push_char(&mut app.task_form.deadline, c, MAX_DEADLINE_LENGTH)
            }
            _ => {}
        },
        _ => {}
    }

    Ok(false)
}
