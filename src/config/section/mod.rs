//! Configuration section definitions.
//!
//! | Section   | Purpose                                      |
//! |-----------|----------------------------------------------|
//! | `[watch]` | Compiled-output directory and watch tuning   |
//! | `[serve]` | Development server (port, interface, watch)  |
//! | `[app]`   | Root composition unit                        |

mod app;
mod serve;
mod watch;

pub use app::AppConfig;
pub use serve::ServeConfig;
pub use watch::WatchConfig;
