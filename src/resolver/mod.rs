//! Path resolution module
//!
//! Maps request paths onto the served site tree. Resolution prefers, in
//! order: an exact file, a redirect to a directory with an index page, and
//! finally the same path with an implicit `.html` extension.

mod path;

pub use path::{encode_url_path, is_contained, normalize_root, normalize_url_path};

use crate::logger;
use std::path::{Path, PathBuf};
use tokio::fs;

const CUSTOM_404_FILE: &str = "404.html";

/// Outcome of looking up a request path
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Endpoint {
    /// A regular file under the root
    File(PathBuf),
    /// A directory with an index page, requested without its trailing slash
    Redirect,
    /// Nothing servable
    NotFound,
}

/// Resolves URL paths against a fixed root directory
#[derive(Debug, Clone)]
pub struct PathResolver {
    root: PathBuf,
}

impl PathResolver {
    /// Create a resolver bound to `root`
    ///
    /// The root is made absolute and loses any trailing slash. It does not
    /// need to exist yet.
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            root: normalize_root(root.as_ref()),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Resolve a raw (percent-encoded) URL path
    ///
    /// Never fails: malformed or hostile input resolves to
    /// [`Endpoint::NotFound`] or to a file inside the root.
    pub fn resolve(&self, url_path: &str) -> Endpoint {
        let Some(segments) = normalize_url_path(url_path) else {
            logger::log_debug(&format!("Unresolvable path segment in '{url_path}'"));
            return Endpoint::NotFound;
        };

        // The root itself is a directory, never a file or a redirect target
        if segments.is_empty() {
            return Endpoint::NotFound;
        }

        let candidate = segments
            .iter()
            .fold(self.root.clone(), |acc, segment| acc.join(segment));

        if !is_contained(&self.root, &candidate) {
            logger::log_warning(&format!(
                "Path traversal attempt blocked: {} -> {}",
                url_path,
                candidate.display()
            ));
            return Endpoint::NotFound;
        }

        if candidate.is_file() {
            return Endpoint::File(candidate);
        }

        if candidate.join("index.html").is_file() {
            return Endpoint::Redirect;
        }

        let mut with_html = candidate.into_os_string();
        with_html.push(".html");
        let with_html = PathBuf::from(with_html);
        if with_html.is_file() {
            return Endpoint::File(with_html);
        }

        Endpoint::NotFound
    }

    /// Body of `<root>/404.html`, if the site provides one
    pub async fn custom_error_body(&self) -> Option<Vec<u8>> {
        fs::read(self.root.join(CUSTOM_404_FILE)).await.ok()
    }
}
