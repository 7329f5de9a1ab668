//! Application state management for taskdeck.
//!
//! This module contains the core `App` struct that manages all application
//! state: the authentication state machine, the task board, form state for
//! the login/signup/task overlays, and background fetch coordination.

use std::sync::{Arc, Mutex, MutexGuard};

use anyhow::Result;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use crate::api::{ApiClient, ApiError};
use crate::auth::{CredentialStore, SessionStore};
use crate::config::Config;
use crate::models::{Task, TaskBoard, TaskPatch, TaskStatus, User};
use crate::utils::truncate_string;

// ============================================================================
// Constants
// ============================================================================

/// Buffer size for the background fetch message channel.
/// One refresh produces a single message, so a small buffer is plenty.
const CHANNEL_BUFFER_SIZE: usize = 16;

/// Maximum length for username input.
pub const MAX_USERNAME_LENGTH: usize = 50;

/// Maximum length for password input.
/// 128 chars accommodates password managers and passphrases.
pub const MAX_PASSWORD_LENGTH: usize = 128;

/// Maximum length for email input.
pub const MAX_EMAIL_LENGTH: usize = 80;

/// Maximum length for a task title.
pub const MAX_TITLE_LENGTH: usize = 120;

/// Maximum length for a task description.
pub const MAX_DESCRIPTION_LENGTH: usize = 2000;

/// Deadline input is a fixed-width `YYYY-MM-DDTHH:MM` value.
pub const MAX_DEADLINE_LENGTH: usize = 16;

// ============================================================================
// State Types
// ============================================================================

/// Authentication state established by the session bootstrap and updated
/// by login/logout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthState {
    Initializing,
    Authenticated,
    Unauthenticated,
}

/// Overall application (overlay) state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppState {
    Normal,
    LoggingIn,
    SigningUp,
    CreatingTask,
    EditingTask,
    ConfirmingDelete,
    ShowingHelp,
    ConfirmingQuit,
    Quitting,
}

/// Login form focus state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoginFocus {
    Username,
    Password,
    Button,
    SignupLink,
}

/// Signup form focus state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignupFocus {
    Username,
    Email,
    Password,
    Button,
}

/// Task form focus state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskFieldFocus {
    Title,
    Description,
    Deadline,
    Status,
    Save,
}

#[derive(Debug, Clone)]
pub struct LoginForm {
    pub username: String,
    pub password: String,
    pub focus: LoginFocus,
    pub error: Option<String>,
}

impl Default for LoginForm {
    fn default() -> Self {
        Self {
            username: String::new(),
            password: String::new(),
            focus: LoginFocus::Username,
            error: None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct SignupForm {
    pub username: String,
    pub email: String,
    pub password: String,
    pub focus: SignupFocus,
    pub error: Option<String>,
}

impl Default for SignupForm {
    fn default() -> Self {
        Self {
            username: String::new(),
            email: String::new(),
            password: String::new(),
            focus: SignupFocus::Username,
            error: None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct TaskForm {
    pub title: String,
    pub description: String,
    pub deadline: String,
    pub status: TaskStatus,
    pub focus: TaskFieldFocus,
    pub error: Option<String>,
    /// Set when editing an existing task; None when creating.
    pub editing_id: Option<i64>,
}

impl Default for TaskForm {
    fn default() -> Self {
        Self {
            title: String::new(),
            description: String::new(),
            deadline: String::new(),
            status: TaskStatus::Todo,
            focus: TaskFieldFocus::Title,
            error: None,
            editing_id: None,
        }
    }
}

/// Results sent from background fetch tasks back to the main loop.
enum FetchResult {
    /// Full task list fetched successfully
    Tasks(Vec<Task>),
    /// The refresh protocol confirmed the session is dead
    SessionExpired(String),
    /// Any other fetch failure, already formatted for the status bar
    Error(String),
}

// ============================================================================
// Main Application Struct
// ============================================================================

/// Main application state container
pub struct App {
    pub config: Config,
    pub api: ApiClient,
    session: Arc<Mutex<SessionStore>>,

    // Authentication state
    pub auth: AuthState,
    pub user: Option<User>,

    // UI state
    pub state: AppState,
    pub board: TaskBoard,
    pub focused_column: TaskStatus,
    column_selection: [usize; 3],

    // Overlay forms
    pub login: LoginForm,
    pub signup: SignupForm,
    pub task_form: TaskForm,
    /// Task id and title awaiting delete confirmation
    pub pending_delete: Option<(i64, String)>,

    // Background fetch channel
    fetch_rx: mpsc::Receiver<FetchResult>,
    fetch_tx: mpsc::Sender<FetchResult>,

    pub status_message: Option<String>,
    pub tasks_loading: bool,
}

impl App {
    /// Create a new application instance
    pub fn new() -> Result<Self> {
        let config = match Config::load() {
            Ok(c) => c,
            Err(e) => {
                warn!(error = %e, "Failed to load config, using defaults");
                Config::default()
            }
        };

        let base_url = config.api_base_url()?;
        debug!(%base_url, "API base URL resolved");

        let mut store = SessionStore::new(config.session_dir()?);
        match store.load() {
            Ok(found) => debug!(found, "Session store loaded"),
            Err(e) => warn!(error = %e, "Failed to load session store"),
        }
        let session = Arc::new(Mutex::new(store));

        let api = ApiClient::new(base_url, Arc::clone(&session))?;

        // Prefill the login form from the environment, the config, and
        // (when the username is known) the keychain.
        let username = std::env::var("TASKDECK_USERNAME")
            .ok()
            .or_else(|| config.last_username.clone())
            .unwrap_or_default();

        let password = std::env::var("TASKDECK_PASSWORD")
            .ok()
            .or_else(|| {
                if username.is_empty() || !CredentialStore::has_credentials(&username) {
                    return None;
                }
                CredentialStore::get_password(&username).ok()
            })
            .unwrap_or_default();

        let (tx, rx) = mpsc::channel(CHANNEL_BUFFER_SIZE);

        Ok(Self {
            config,
            api,
            session,

            auth: AuthState::Initializing,
            user: None,

            state: AppState::Normal,
            board: TaskBoard::default(),
            focused_column: TaskStatus::Todo,
            column_selection: [0; 3],

            login: LoginForm {
                username,
                password,
                ..Default::default()
            },
            signup: SignupForm::default(),
            task_form: TaskForm::default(),
            pending_delete: None,

            fetch_rx: rx,
            fetch_tx: tx,

            status_message: None,
            tasks_loading: false,
        })
    }

    fn lock_session(&self) -> MutexGuard<'_, SessionStore> {
        self.session
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Username of the signed-in user, for the title bar.
    pub fn username(&self) -> Option<&str> {
        self.user.as_ref().map(|u| u.username.as_str())
    }

    // =========================================================================
    // Session bootstrap
    // =========================================================================

    /// Establish the initial authentication state from the persisted
    /// session. With no stored access token this makes no network call.
    pub async fn bootstrap(&mut self) {
        if !self.api.has_access_token() {
            debug!("No stored access token, starting unauthenticated");
            self.auth = AuthState::Unauthenticated;
            self.start_login();
            return;
        }

        match self.api.fetch_current_user().await {
            Ok(user) => {
                info!(username = %user.username, "Session restored");
                self.user = Some(user);
                self.auth = AuthState::Authenticated;
                self.refresh_tasks_background();
            }
            Err(e) => {
                warn!(error = %e, "Identity check failed during bootstrap");
                if e.is_auth_failure() {
                    // The refresh token is confirmed dead; keeping the
                    // pair around would only break the next protected
                    // call the same way.
                    self.lock_session().clear();
                }
                self.auth = AuthState::Unauthenticated;
                self.start_login();
            }
        }
    }

    // =========================================================================
    // Authentication
    // =========================================================================

    /// Show the login overlay
    pub fn start_login(&mut self) {
        self.state = AppState::LoggingIn;
        self.login.focus = if self.login.username.is_empty() {
            LoginFocus::Username
        } else {
            LoginFocus::Password
        };
        self.login.error = None;
    }

    /// Show the signup overlay
    pub fn start_signup(&mut self) {
        self.state = AppState::SigningUp;
        self.signup = SignupForm::default();
    }

    /// Attempt login with the credentials from the login form
    pub async fn attempt_login(&mut self) {
        let username = self.login.username.trim().to_string();
        let password = self.login.password.clone();

        if username.is_empty() || password.is_empty() {
            self.login.error = Some("Username and password required".to_string());
            return;
        }

        self.login.error = None;

        if let Err(e) = self.api.login(&username, &password).await {
            error!(error = %e, "Login failed");
            self.login.error = Some(Self::login_error_message(&e));
            return;
        }

        let user = match self.api.fetch_current_user().await {
            Ok(user) => user,
            Err(e) => {
                error!(error = %e, "Profile fetch after login failed");
                self.login.error = Some(format!("Login failed: {}", e));
                return;
            }
        };

        if let Err(e) = CredentialStore::store(&username, &password) {
            warn!(error = %e, "Failed to store credentials in keychain");
        }

        self.config.last_username = Some(username.clone());
        if let Err(e) = self.config.save() {
            warn!(error = %e, "Failed to save config");
        }

        info!(username = %user.username, "Login successful");
        self.user = Some(user);
        self.auth = AuthState::Authenticated;
        self.login.password.clear();
        self.state = AppState::Normal;
        self.refresh_tasks_background();
    }

    fn login_error_message(error: &ApiError) -> String {
        match error {
            ApiError::Server { status, .. }
                if status.as_u16() == 400 || status.as_u16() == 401 =>
            {
                "Invalid username or password".to_string()
            }
            ApiError::Network(e) if e.is_timeout() => {
                "Connection timed out. Please try again.".to_string()
            }
            ApiError::Network(_) => {
                "Unable to connect to server. Check your internet connection.".to_string()
            }
            other => format!("Login failed: {}", other),
        }
    }

    /// Attempt registration with the signup form, then return to login
    pub async fn attempt_signup(&mut self) {
        let username = self.signup.username.trim().to_string();
        let email = self.signup.email.trim().to_string();
        let password = self.signup.password.clone();

        if username.is_empty() || email.is_empty() || password.is_empty() {
            self.signup.error = Some("All fields are required".to_string());
            return;
        }

        self.signup.error = None;

        match self.api.register(&username, &password, &email).await {
            Ok(()) => {
                info!(%username, "Account created");
                self.login.username = username;
                self.login.password.clear();
                self.start_login();
                self.status_message = Some("Account created, please log in".to_string());
            }
            Err(e) => {
                error!(error = %e, "Signup failed");
                self.signup.error = Some(match e {
                    ApiError::Network(_) => {
                        "Unable to connect to server. Check your internet connection.".to_string()
                    }
                    other => format!("Signup failed: {}", other),
                });
            }
        }
    }

    /// Clear the session and return to the login screen. Always succeeds.
    pub fn logout(&mut self) {
        self.lock_session().clear();
        self.user = None;
        self.auth = AuthState::Unauthenticated;
        self.board = TaskBoard::default();
        self.column_selection = [0; 3];
        info!("Logged out");
        self.start_login();
    }

    /// Best-effort re-fetch of the signed-in profile. Failure keeps the
    /// stale profile and is only logged.
    pub async fn refresh_user_profile(&mut self) {
        if self.auth != AuthState::Authenticated {
            return;
        }
        match self.api.fetch_current_user().await {
            Ok(user) => self.user = Some(user),
            Err(e) => warn!(error = %e, "Profile refresh failed, keeping stale profile"),
        }
    }

    /// Shared handling for a confirmed-dead session discovered outside
    /// the bootstrap: purge tokens and drop back to the login overlay.
    fn handle_session_expired(&mut self, detail: &str) {
        warn!(%detail, "Session expired");
        self.lock_session().clear();
        self.user = None;
        self.auth = AuthState::Unauthenticated;
        self.tasks_loading = false;
        self.start_login();
        self.login.error = Some("Session expired, please log in again".to_string());
    }

    // =========================================================================
    // Background task refresh
    // =========================================================================

    /// Spawn a background task to re-fetch the task list
    pub fn refresh_tasks_background(&mut self) {
        let api = self.api.clone();
        let tx = self.fetch_tx.clone();
        self.tasks_loading = true;

        tokio::spawn(async move {
            match api.fetch_tasks().await {
                Ok(tasks) => {
                    let _ = tx.send(FetchResult::Tasks(tasks)).await;
                }
                Err(e) if e.is_auth_failure() => {
                    let _ = tx.send(FetchResult::SessionExpired(e.to_string())).await;
                }
                Err(e) => {
                    error!(error = %e, "Task refresh failed");
                    let _ = tx
                        .send(FetchResult::Error(format!("Task refresh failed: {}", e)))
                        .await;
                }
            }
        });
    }

    /// Drain completed background fetches into application state
    pub fn check_background_tasks(&mut self) {
        while let Ok(result) = self.fetch_rx.try_recv() {
            match result {
                FetchResult::Tasks(tasks) => {
                    self.tasks_loading = false;
                    self.board = TaskBoard::from_tasks(tasks);
                    self.clamp_selections();
                }
                FetchResult::SessionExpired(detail) => {
                    self.handle_session_expired(&detail);
                }
                FetchResult::Error(message) => {
                    self.tasks_loading = false;
                    self.status_message = Some(message);
                }
            }
        }
    }

    // =========================================================================
    // Task operations
    // =========================================================================

    /// Open the create-task overlay
    pub fn open_create_form(&mut self) {
        self.task_form = TaskForm::default();
        self.state = AppState::CreatingTask;
    }

    /// Open the edit overlay for the selected task
    pub fn open_edit_form(&mut self) {
        let Some(task) = self.selected_task().cloned() else {
            return;
        };
        self.task_form = TaskForm {
            title: task.title,
            description: task.description.unwrap_or_default(),
            // datetime-local precision: anything past minutes is dropped
            deadline: task
                .deadline
                .map(|d| d.chars().take(MAX_DEADLINE_LENGTH).collect())
                .unwrap_or_default(),
            status: task.status,
            focus: TaskFieldFocus::Title,
            error: None,
            editing_id: Some(task.id),
        };
        self.state = AppState::EditingTask;
    }

    /// Submit the task form: create when no id is attached, update otherwise
    pub async fn submit_task_form(&mut self) {
        let title = self.task_form.title.trim().to_string();
        if title.is_empty() {
            self.task_form.error = Some("Title is required".to_string());
            return;
        }

        let description = self.task_form.description.trim();
        let deadline = self.task_form.deadline.trim();
        let patch = TaskPatch {
            title: Some(title),
            description: (!description.is_empty()).then(|| description.to_string()),
            status: Some(self.task_form.status),
            assigned_to: None,
            deadline: (!deadline.is_empty()).then(|| deadline.to_string()),
        };

        let result = match self.task_form.editing_id {
            Some(id) => self.api.update_task(id, &patch).await.map(|_| "Task updated"),
            None => self.api.create_task(&patch).await.map(|_| "Task created"),
        };

        match result {
            Ok(message) => {
                self.task_form = TaskForm::default();
                self.state = AppState::Normal;
                self.status_message = Some(message.to_string());
                self.refresh_tasks_background();
            }
            Err(e) if e.is_auth_failure() => self.handle_session_expired(&e.to_string()),
            Err(e) => {
                error!(error = %e, "Task save failed");
                self.task_form.error = Some(format!("Save failed: {}", e));
            }
        }
    }

    /// Move the selected task to another status column
    pub async fn move_selected_task(&mut self, to: TaskStatus) {
        let Some(task) = self.selected_task().cloned() else {
            return;
        };
        if task.status == to {
            return;
        }

        let patch = task.to_patch().with_status(to);
        match self.api.update_task(task.id, &patch).await {
            Ok(_) => {
                self.status_message = Some(format!(
                    "Moved \"{}\" to {}",
                    truncate_string(&task.title, 30),
                    to
                ));
                self.focused_column = to;
                self.refresh_tasks_background();
            }
            Err(e) if e.is_auth_failure() => self.handle_session_expired(&e.to_string()),
            Err(e) => {
                error!(error = %e, task_id = task.id, "Status change failed");
                self.status_message = Some(format!("Move failed: {}", e));
            }
        }
    }

    /// Ask for confirmation before deleting the selected task
    pub fn request_delete_selected(&mut self) {
        let Some((id, title)) = self.selected_task().map(|t| (t.id, t.title.clone())) else {
            return;
        };
        self.pending_delete = Some((id, title));
        self.state = AppState::ConfirmingDelete;
    }

    /// Delete the task previously marked for deletion
    pub async fn confirm_delete(&mut self) {
        let Some((id, title)) = self.pending_delete.take() else {
            self.state = AppState::Normal;
            return;
        };
        self.state = AppState::Normal;

        match self.api.delete_task(id).await {
            Ok(()) => {
                self.status_message =
                    Some(format!("Deleted \"{}\"", truncate_string(&title, 30)));
                self.refresh_tasks_background();
            }
            Err(e) if e.is_auth_failure() => self.handle_session_expired(&e.to_string()),
            Err(e) => {
                error!(error = %e, task_id = id, "Delete failed");
                self.status_message = Some(format!("Delete failed: {}", e));
            }
        }
    }

    // =========================================================================
    // Board navigation
    // =========================================================================

    fn column_index(status: TaskStatus) -> usize {
        match status {
            TaskStatus::Todo => 0,
            TaskStatus::InProgress => 1,
            TaskStatus::Done => 2,
        }
    }

    /// Selected row within the given column
    pub fn selected_index(&self, status: TaskStatus) -> usize {
        self.column_selection[Self::column_index(status)]
    }

    /// The task under the cursor, if the focused column is non-empty
    pub fn selected_task(&self) -> Option<&Task> {
        self.board
            .column(self.focused_column)
            .get(self.selected_index(self.focused_column))
    }

    pub fn focus_next_column(&mut self) {
        if let Some(next) = self.focused_column.next() {
            self.focused_column = next;
        } else {
            self.focused_column = TaskStatus::Todo;
        }
    }

    pub fn focus_prev_column(&mut self) {
        if let Some(prev) = self.focused_column.prev() {
            self.focused_column = prev;
        } else {
            self.focused_column = TaskStatus::Done;
        }
    }

    pub fn move_selection_up(&mut self) {
        let idx = Self::column_index(self.focused_column);
        self.column_selection[idx] = self.column_selection[idx].saturating_sub(1);
    }

    pub fn move_selection_down(&mut self) {
        let idx = Self::column_index(self.focused_column);
        let len = self.board.column(self.focused_column).len();
        if len > 0 && self.column_selection[idx] + 1 < len {
            self.column_selection[idx] += 1;
        }
    }

    /// Keep selections inside their columns after the board changes
    fn clamp_selections(&mut self) {
        for status in TaskStatus::ALL {
            let idx = Self::column_index(status);
            let len = self.board.column(status).len();
            if self.column_selection[idx] >= len {
                self.column_selection[idx] = len.saturating_sub(1);
            }
        }
    }
}
