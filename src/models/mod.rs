//! Data models for the task API.
//!
//! This module contains the data structures exchanged with the remote
//! task service:
//!
//! - `Task`, `TaskStatus`, `TaskPatch`: the task entity, its status
//!   enumeration, and the partial payload for writes
//! - `TaskBoard`: tasks partitioned into board columns by status
//! - `User`: the signed-in user's profile

pub mod task;
pub mod user;

pub use task::{Task, TaskBoard, TaskPatch, TaskStatus};
pub use user::User;
