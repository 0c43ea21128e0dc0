//! Request handler module
//!
//! Routes each request to its file operation through the typed dispatcher.

pub mod files;
pub mod router;

// Re-export main entry point
pub use router::handle_request;
