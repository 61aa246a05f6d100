//! Utility functions for string and time formatting.

pub mod format;

pub use format::{age_display, format_date, parse_timestamp, truncate_string};
