//! warmswap - development-mode hot reload for compiled unit output.
//!
//! The [`watch::DirectoryWatcher`] reports changes under the compiled-output
//! directory; the [`reload::ReloadCoordinator`] decides whether each one
//! requires rebuilding the application and swaps the live handler when it
//! does.

pub mod app;
pub mod cli;
pub mod config;
pub mod core;
pub mod error;
pub mod logger;
pub mod reload;
pub mod unit;
pub mod utils;
pub mod watch;

pub use error::SetupError;
pub use reload::{Container, CoordinatorState, Lifecycle, ReloadCoordinator, ReloadError};
pub use unit::{Fingerprint, UnitName};
pub use watch::{ChangeEvent, ChangeKind, DirectoryWatcher, Listener, StopHandle, WatchOptions};
