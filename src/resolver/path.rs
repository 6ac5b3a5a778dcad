//! URL path normalization
//!
//! Turns a raw, possibly percent-encoded request path into a list of clean
//! relative segments that can never climb above the served root.

use percent_encoding::{percent_decode_str, utf8_percent_encode, AsciiSet, CONTROLS};
use std::path::{Component, Path, PathBuf};

const INDEX_FILE: &str = "index.html";

/// Bytes escaped when a segment is written back into a URL path
const SEGMENT: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'/')
    .add(b'<')
    .add(b'>')
    .add(b'?')
    .add(b'\\')
    .add(b'`')
    .add(b'{')
    .add(b'}');

/// Normalize a raw URL path into relative segments
///
/// Steps, in order:
/// 1. Percent-decode each `/`-separated segment
/// 2. Append `index.html` when the path ends with `/`
/// 3. Drop empty and `.` segments, let `..` pop the previous segment and
///    discard any `..` that would climb above the root
///
/// Returns `None` when a segment cannot name a file under the root: it
/// decodes to invalid UTF-8, it smuggles a separator or NUL byte in
/// through an escape such as `%2F` or `%5C`, or the platform would not
/// parse it as a single plain path component.
///
/// # Examples
/// ```
/// use siteserve::resolver::normalize_url_path;
///
/// assert_eq!(normalize_url_path("/../../page.html").unwrap(), vec!["page.html"]);
/// assert_eq!(normalize_url_path("/dir1/../").unwrap(), vec!["index.html"]);
/// assert!(normalize_url_path("/a%2Fb").is_none());
/// ```
pub fn normalize_url_path(raw: &str) -> Option<Vec<String>> {
    let mut decoded = Vec::new();
    for segment in raw.split('/') {
        let segment = percent_decode_str(segment).decode_utf8().ok()?;
        if segment.contains(['/', '\\', '\0']) || !is_single_component(&segment) {
            return None;
        }
        decoded.push(segment.into_owned());
    }

    if raw.ends_with('/') {
        decoded.push(INDEX_FILE.to_string());
    }

    let mut clean: Vec<String> = Vec::with_capacity(decoded.len());
    for segment in decoded {
        match segment.as_str() {
            "" | "." => {}
            ".." => {
                // Clamped at the root: popping an empty stack is a no-op
                clean.pop();
            }
            _ => clean.push(segment),
        }
    }

    Some(clean)
}

fn is_single_component(segment: &str) -> bool {
    if matches!(segment, "" | "." | "..") {
        return true;
    }
    let mut components = Path::new(segment).components();
    matches!(
        (components.next(), components.next()),
        (Some(Component::Normal(_)), None)
    )
}

/// Write cleaned segments back as an absolute, percent-encoded URL path
///
/// # Examples
/// ```
/// use siteserve::resolver::encode_url_path;
///
/// let segments = vec!["my dir".to_string(), "sub".to_string()];
/// assert_eq!(encode_url_path(&segments), "/my%20dir/sub");
/// ```
pub fn encode_url_path(segments: &[String]) -> String {
    segments
        .iter()
        .map(|segment| format!("/{}", utf8_percent_encode(segment, SEGMENT)))
        .collect()
}

/// Whether `candidate` is `root` followed only by plain components
pub fn is_contained(root: &Path, candidate: &Path) -> bool {
    candidate.strip_prefix(root).is_ok_and(|rest| {
        rest.components()
            .all(|component| matches!(component, Component::Normal(_)))
    })
}

/// Make `root` absolute and lexically normalized, without a trailing slash
///
/// The directory does not have to exist. A relative root is anchored at the
/// current working directory.
pub fn normalize_root(root: &Path) -> PathBuf {
    let anchored = if root.is_absolute() {
        root.to_path_buf()
    } else {
        std::env::current_dir().map_or_else(|_| root.to_path_buf(), |cwd| cwd.join(root))
    };

    let mut normalized = PathBuf::new();
    for component in anchored.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                normalized.pop();
            }
            other => normalized.push(other.as_os_str()),
        }
    }
    normalized
}

#[cfg(test)]
mod tests {
    use super::*;

    fn segments(raw: &str) -> Vec<String> {
        normalize_url_path(raw).expect("path should normalize")
    }

    #[test]
    fn test_trailing_slash_appends_index() {
        assert_eq!(segments("/"), vec!["index.html"]);
        assert_eq!(segments("/dir-with-index/"), vec!["dir-with-index", "index.html"]);
    }

    #[test]
    fn test_plain_path_is_split() {
        assert_eq!(segments("/2015/11/05/hello-world.html"), vec!["2015", "11", "05", "hello-world.html"]);
        assert_eq!(segments("ir1/di"), vec!["ir1", "di"]);
    }

    #[test]
    fn test_leading_parent_segments_are_clamped() {
        assert_eq!(segments("/../../page.html"), vec!["page.html"]);
        assert_eq!(segments("/../_site/page.html"), vec!["_site", "page.html"]);
        assert_eq!(segments("/dir1/../dir1/../../_site/"), vec!["_site", "index.html"]);
    }

    #[test]
    fn test_interior_parent_segments_resolve() {
        assert_eq!(segments("/dir1/../"), vec!["index.html"]);
        assert_eq!(segments("/a/./b/../c"), vec!["a", "c"]);
    }

    #[test]
    fn test_encoded_dot_segments_are_cleaned() {
        assert_eq!(segments("/%2E%2E/_site/"), vec!["_site", "index.html"]);
        assert_eq!(segments("/a/%2e/b"), vec!["a", "b"]);
    }

    #[test]
    fn test_decodes_literal_characters() {
        assert_eq!(segments("/my%20page.html"), vec!["my page.html"]);
        assert_eq!(segments("/buenos_d%C3%ADas.html"), vec!["buenos_días.html"]);
    }

    #[test]
    fn test_rejects_encoded_separators_and_bad_bytes() {
        assert!(normalize_url_path("/a%2Fb").is_none());
        assert!(normalize_url_path("/a%2f..%2f..%2fetc").is_none());
        assert!(normalize_url_path("/a%00b").is_none());
        assert!(normalize_url_path("/%FF%FE").is_none());
        assert!(normalize_url_path("/..%5C..%5Csecret").is_none());
        assert!(normalize_url_path("/a%5cb").is_none());
    }

    #[test]
    fn test_encode_url_path() {
        assert_eq!(encode_url_path(&[]), "");
        assert_eq!(encode_url_path(&segments("/dir-with-index")), "/dir-with-index");
        assert_eq!(encode_url_path(&segments("/buenos_d%C3%ADas")), "/buenos_d%C3%ADas");
        assert_eq!(encode_url_path(&["100%".to_string(), "a?b#c".to_string()]), "/100%25/a%3Fb%23c");
    }

    #[test]
    fn test_is_contained() {
        let root = Path::new("/srv/site");
        assert!(is_contained(root, Path::new("/srv/site/a/b.html")));
        assert!(is_contained(root, root));
        assert!(!is_contained(root, &root.join("..").join("secret")));
        assert!(!is_contained(root, Path::new("/srv/other/page.html")));
    }

    #[test]
    fn test_everything_climbing_cleans_to_nothing() {
        assert!(segments("/..").is_empty());
        assert!(segments("").is_empty());
        assert!(segments("/./.").is_empty());
    }

    #[test]
    fn test_normalize_root() {
        assert_eq!(normalize_root(Path::new("/srv/site/")), PathBuf::from("/srv/site"));
        assert_eq!(normalize_root(Path::new("/srv/./other/../site")), PathBuf::from("/srv/site"));
        assert!(normalize_root(Path::new("relative/site")).is_absolute());
    }
}
