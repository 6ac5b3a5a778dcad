//! HTTP protocol layer module
//!
//! Provides HTTP protocol-related base functionality, decoupled from path
//! resolution: content types, validators and response builders.

pub mod cache;
pub mod mime;
pub mod response;

// Re-export commonly used types
pub use cache::Validator;
pub use response::{
    build_304_response, build_404_response, build_405_response, build_file_response,
    build_options_response, build_redirect_response,
};
