//! Command-line interface module.

mod args;
pub mod fingerprint;
pub mod serve;

pub use args::{Cli, Commands};
