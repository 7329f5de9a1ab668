//! Utility functions for string and date formatting.

pub mod format;

// Re-export commonly used functions at module level
pub use format::{format_date, format_datetime, truncate_string};
