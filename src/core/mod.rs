//! Process state shared by the server, the application and `main`.

mod state;

pub use state::{is_shutdown, register_server, request_shutdown, setup_shutdown_handler};
