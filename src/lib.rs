//! Static site server
//!
//! Maps URL paths onto a built site directory with directory-index
//! redirects and `.html` fallbacks, and answers with conditional-GET aware
//! HTTP/1.1 responses.

pub mod build;
pub mod config;
pub mod handler;
pub mod http;
pub mod logger;
pub mod resolver;
pub mod server;
