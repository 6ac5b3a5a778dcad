//! Request handler module
//!
//! Responsible for turning resolved endpoints into HTTP responses: method
//! dispatch, conditional requests and static file reads.

pub mod router;
pub mod static_files;

// Re-export main entry point
pub use router::{RequestContext, RequestHandler};
