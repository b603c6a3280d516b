//! Factory methods for test data.
//!
//! - [`code`] - Xunit-style assert calls and source-located expressions
//! - [`unit`] - Modules, core libraries and a counting loader

pub mod code;
pub mod unit;
