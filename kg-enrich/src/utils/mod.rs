//! Shared utilities.
//!
//! Includes:
//! - String measurement and preview helpers
//! - Cancellation of suspension points

pub mod concurrency;
pub mod text;

pub use concurrency::cancellable;
pub use text::{char_len, truncate_with_ellipsis};
