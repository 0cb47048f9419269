//! Utility modules.
//!
//! - [`path`]: filesystem path normalization

pub mod path;
