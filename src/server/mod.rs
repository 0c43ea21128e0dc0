// Server module entry point
// Listener setup, connection serving and shutdown handling

pub mod connection;
pub mod listener;
pub mod signal;
mod watchdog;

// `loop` is a keyword, so the file is mounted under another name
#[path = "loop.rs"]
pub mod server_loop;

pub use listener::create_listener;
pub use server_loop::run;
