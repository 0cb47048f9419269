//! Reload Module
//!
//! Development-mode hot reload: decides whether a change in the compiled
//! output matters and swaps the live handler without restarting the process.
//!
//! # Architecture
//!
//! ```text
//! DirectoryWatcher -> ReloadCoordinator -> Lifecycle::restart -> new handler
//!     (watch)           (classify)            (rebuild)          (handler())
//! ```
//!
//! # Modules
//!
//! - `coordinator` - change classification and handler hand-off
//! - `error` - per-change failures (always contained)
//! - `lifecycle` - traits implemented by the application

mod coordinator;
mod error;
mod lifecycle;


pub use coordinator::{CoordinatorState, ReloadCoordinator};
pub use error::ReloadError;
pub use lifecycle::{Container, HandlerOf, Lifecycle};
