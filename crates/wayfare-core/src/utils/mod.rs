//! Utility functions for formatting and input validation.

pub mod format;
pub mod validate;

// Re-export commonly used functions at module level
pub use format::{format_remaining, mask_email};
pub use validate::is_valid_email;
