//! Storage module
//!
//! Filesystem operations on the served directory: listing with optional
//! content hashes, and delete-by-name.

pub mod eraser;
pub mod error;
pub mod hash;
pub mod listing;

pub use eraser::delete_file;
pub use listing::list_files;
