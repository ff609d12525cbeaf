//! Terminal output helpers for Shrink
//!
//! - Status lines and summary tables
//! - Size and ratio formatting
//! - A spinner for the compression call

#![warn(missing_docs)]

pub mod output;
pub mod progress;
