//! Terminal UI module using ratatui.
//!
//! This module provides the TUI rendering and input handling:
//!
//! - `render`: Main frame rendering and layout
//! - `board`: Task board columns and detail pane
//! - `forms`: Login/signup/task overlays
//! - `input`: Keyboard event handling
//! - `styles`: Color schemes and text styling

pub mod board;
pub mod forms;
pub mod input;
pub mod render;
pub mod styles;
