//! HTTP response building module
//!
//! Provides builders for each status the site server emits. Every builder
//! sets `Content-Length` from the byte length of the body it would send
//! for GET; HEAD keeps the header and drops the body.

use super::cache::{format_http_date, Validator};
use http_body_util::Full;
use hyper::body::Bytes;
use hyper::Response;
use std::time::{Duration, SystemTime};

pub const ALLOWED_METHODS: &str = "GET,HEAD,OPTIONS";

/// Seconds a directory redirect may be cached
pub const REDIRECT_CACHE_SECS: u64 = 3600;

const HTML_CONTENT_TYPE: &str = "text/html";

/// Wrap a fragment into a minimal standalone HTML document
pub fn html_wrap(title: &str, content: &str) -> String {
    format!(
        "<!DOCTYPE html>\n\
         <html lang=\"en\">\n\
         <head>\n  \
         <meta charset=\"utf-8\">\n  \
         <title>{title}</title></head>\n\
         <body>\n  \
         {content}\n\
         </body>\n\
         </html>\n"
    )
}

pub fn default_404_body() -> String {
    html_wrap("Error", "<p>404: Not Found</p>")
}

pub fn default_405_body() -> String {
    html_wrap("Error", "<p>405: Method Not Allowed</p>")
}

pub fn redirect_body(location: &str) -> String {
    html_wrap(
        "Redirection",
        &format!("<p>Redirecting to <a href=\"{location}\">{location}</a>.</p>"),
    )
}

/// Build 200 response for a file
pub fn build_file_response(
    data: Bytes,
    content_type: &str,
    validator: &Validator,
    is_head: bool,
) -> Response<Full<Bytes>> {
    let content_length = data.len();
    let body = if is_head { Bytes::new() } else { data };

    Response::builder()
        .status(200)
        .header("Content-Type", content_type)
        .header("Content-Length", content_length)
        .header("Last-Modified", validator.last_modified_header())
        .header("ETag", &validator.etag)
        .body(Full::new(body))
        .unwrap_or_else(|e| {
            log_build_error("200", &e);
            Response::new(Full::new(Bytes::new()))
        })
}

/// Build 304 Not Modified response
///
/// Carries the validators but neither a body nor `Content-Length`.
pub fn build_304_response(validator: &Validator) -> Response<Full<Bytes>> {
    Response::builder()
        .status(304)
        .header("Last-Modified", validator.last_modified_header())
        .header("ETag", &validator.etag)
        .body(Full::new(Bytes::new()))
        .unwrap_or_else(|e| {
            log_build_error("304", &e);
            Response::new(Full::new(Bytes::new()))
        })
}

/// Build 404 Not Found response
///
/// `custom_body` is sent verbatim when present; otherwise the default
/// error page is used.
pub fn build_404_response(custom_body: Option<Vec<u8>>, is_head: bool) -> Response<Full<Bytes>> {
    let body = custom_body.map_or_else(|| Bytes::from(default_404_body()), Bytes::from);
    build_html_response(404, body, is_head)
}

/// Build 405 Method Not Allowed response
pub fn build_405_response(is_head: bool) -> Response<Full<Bytes>> {
    build_html_response(405, Bytes::from(default_405_body()), is_head)
}

/// Build OPTIONS response for a servable file
pub fn build_options_response() -> Response<Full<Bytes>> {
    Response::builder()
        .status(200)
        .header("Allow", ALLOWED_METHODS)
        .header("Content-Length", 0)
        .body(Full::new(Bytes::new()))
        .unwrap_or_else(|e| {
            log_build_error("OPTIONS", &e);
            Response::new(Full::new(Bytes::new()))
        })
}

/// Build 301 redirect to `location`, valid for [`REDIRECT_CACHE_SECS`]
pub fn build_redirect_response(location: &str, is_head: bool) -> Response<Full<Bytes>> {
    let html = redirect_body(location);
    let content_length = html.len();
    let body = if is_head { Bytes::new() } else { Bytes::from(html) };
    let expires = SystemTime::now() + Duration::from_secs(REDIRECT_CACHE_SECS);

    Response::builder()
        .status(301)
        .header("Location", location)
        .header(
            "Cache-Control",
            format!("max-age={REDIRECT_CACHE_SECS}, must-revalidate"),
        )
        .header("Expires", format_http_date(expires))
        .header("Content-Type", HTML_CONTENT_TYPE)
        .header("Content-Length", content_length)
        .body(Full::new(body))
        .unwrap_or_else(|e| {
            log_build_error("301", &e);
            Response::new(Full::new(Bytes::new()))
        })
}

/// Build an HTML response with the given status
fn build_html_response(status: u16, data: Bytes, is_head: bool) -> Response<Full<Bytes>> {
    let content_length = data.len();
    let body = if is_head { Bytes::new() } else { data };

    Response::builder()
        .status(status)
        .header("Content-Type", HTML_CONTENT_TYPE)
        .header("Content-Length", content_length)
        .body(Full::new(body))
        .unwrap_or_else(|e| {
            log_build_error(&status.to_string(), &e);
            Response::new(Full::new(Bytes::new()))
        })
}

/// Log response build error
fn log_build_error(status: &str, error: &hyper::http::Error) {
    crate::logger::log_error(&format!("Failed to build {status} response: {error}"));
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::UNIX_EPOCH;

    fn header<'a>(resp: &'a Response<Full<Bytes>>, name: &str) -> Option<&'a str> {
        resp.headers().get(name).and_then(|v| v.to_str().ok())
    }

    #[test]
    fn test_default_404_body() {
        let body = default_404_body();
        assert!(body.starts_with("<!DOCTYPE html>\n"));
        assert!(body.contains("<title>Error</title>"));
        assert!(body.contains("<p>404: Not Found</p>"));
        assert_eq!(body.len(), 142);
    }

    #[test]
    fn test_redirect_body_links_location() {
        let body = redirect_body("/dir/");
        assert!(body.contains("<title>Redirection</title>"));
        assert!(body.contains("<a href=\"/dir/\">/dir/</a>"));
    }

    #[test]
    fn test_404_custom_body_is_verbatim() {
        let resp = build_404_response(Some(b"Custom 404".to_vec()), false);
        assert_eq!(resp.status(), 404);
        assert_eq!(header(&resp, "Content-Type"), Some("text/html"));
        assert_eq!(header(&resp, "Content-Length"), Some("10"));
    }

    #[test]
    fn test_head_keeps_content_length() {
        let resp = build_404_response(None, true);
        assert_eq!(header(&resp, "Content-Length"), Some("142"));
    }

    #[test]
    fn test_options_response() {
        let resp = build_options_response();
        assert_eq!(resp.status(), 200);
        assert_eq!(header(&resp, "Allow"), Some("GET,HEAD,OPTIONS"));
        assert_eq!(header(&resp, "Content-Length"), Some("0"));
    }

    #[test]
    fn test_304_has_no_content_length() {
        let validator = Validator::new(3, UNIX_EPOCH + Duration::from_secs(10));
        let resp = build_304_response(&validator);
        assert_eq!(resp.status(), 304);
        assert!(resp.headers().get("Content-Length").is_none());
        assert_eq!(header(&resp, "ETag"), Some(validator.etag.as_str()));
    }

    #[test]
    fn test_redirect_headers() {
        let resp = build_redirect_response("/dir/", false);
        assert_eq!(resp.status(), 301);
        assert_eq!(header(&resp, "Location"), Some("/dir/"));
        assert_eq!(header(&resp, "Cache-Control"), Some("max-age=3600, must-revalidate"));
        assert!(header(&resp, "Expires").is_some_and(|v| v.ends_with(" GMT")));
    }
}
