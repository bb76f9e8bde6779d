//! Request handler module
//!
//! Responsible for request routing dispatch: JSON listings, deletes, and
//! static file serving of the downloads directory.

pub mod router;
pub mod static_files;

// Re-export main entry point
pub use router::handle_request;
