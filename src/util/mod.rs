//! Small shared utilities.

pub mod format;
pub mod json;
