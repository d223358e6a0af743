//! Utility functions and helpers
//!
//! Atomic file replacement and calendar/timestamp helpers.

pub mod atomic;
pub mod time;

pub use atomic::{atomic_write, cleanup_temp_file, preserve_copy, temp_path_for};
pub use time::{capture_timestamp, days_before_start_of_day, format_local, start_of_day};
