//! Utility modules: message sanitization, correlation ids.

pub mod sanitize;
pub mod trace;
