//! HTTP protocol layer module
//!
//! Provides HTTP protocol-related base functionality, decoupled from specific business logic.

pub mod cache;
pub mod mime;
pub mod query;
pub mod range;
pub mod response;

// Re-export commonly used types
pub use query::QueryParams;
pub use range::parse_range_header;
pub use response::{
    build_304_response, build_404_response, build_416_response, build_empty_response,
    build_html_response, build_json_response, build_redirect_response, build_text_response,
};
