//! Request dispatch module
//!
//! Entry point for HTTP request processing: resolves the request path and
//! dispatches on the resulting endpoint, then on the method.

use crate::handler::static_files;
use crate::http;
use crate::logger;
use crate::resolver::{encode_url_path, normalize_url_path, Endpoint, PathResolver};
use http_body_util::Full;
use hyper::body::Bytes;
use hyper::{Method, Request, Response};

/// Request context encapsulating information needed for request processing
#[derive(Debug, Clone)]
pub struct RequestContext<'a> {
    /// Raw, still percent-encoded request path
    pub path: &'a str,
    pub method: &'a Method,
    pub is_head: bool,
    pub if_none_match: Option<&'a str>,
    pub if_modified_since: Option<&'a str>,
}

impl<'a> RequestContext<'a> {
    pub fn from_request<B>(req: &'a Request<B>) -> Self {
        let header = move |name: &str| req.headers().get(name).and_then(|v| v.to_str().ok());
        Self {
            path: req.uri().path(),
            method: req.method(),
            is_head: req.method() == Method::HEAD,
            if_none_match: header("if-none-match"),
            if_modified_since: header("if-modified-since"),
        }
    }
}

/// Serves a static site tree over HTTP semantics
///
/// Holds no per-request state; one instance can be shared by every
/// connection.
#[derive(Debug, Clone)]
pub struct RequestHandler {
    resolver: PathResolver,
}

impl RequestHandler {
    pub const fn new(resolver: PathResolver) -> Self {
        Self { resolver }
    }

    pub const fn resolver(&self) -> &PathResolver {
        &self.resolver
    }

    /// Main entry point for HTTP request handling
    ///
    /// The request body is never read. Every outcome, including filesystem
    /// errors, becomes a response.
    pub async fn handle<B>(&self, req: &Request<B>) -> Response<Full<Bytes>> {
        let ctx = RequestContext::from_request(req);
        let endpoint = self.resolver.resolve(ctx.path);
        logger::log_debug(&format!("{} {} -> {endpoint:?}", ctx.method, ctx.path));
        self.dispatch(&ctx, endpoint).await
    }

    /// Endpoint is checked before method: missing paths are 404 and
    /// redirects are 301 whatever the method.
    async fn dispatch(&self, ctx: &RequestContext<'_>, endpoint: Endpoint) -> Response<Full<Bytes>> {
        match endpoint {
            Endpoint::NotFound => static_files::serve_not_found(&self.resolver, ctx.is_head).await,
            Endpoint::Redirect => serve_redirect(ctx),
            Endpoint::File(path) => match *ctx.method {
                Method::GET | Method::HEAD => {
                    static_files::serve_file(ctx, &self.resolver, path).await
                }
                Method::OPTIONS => http::build_options_response(),
                _ => {
                    logger::log_warning(&format!("Method not allowed: {}", ctx.method));
                    http::build_405_response(ctx.is_head)
                }
            },
        }
    }
}

/// Redirect to the request path with exactly one trailing slash
pub fn serve_redirect(ctx: &RequestContext<'_>) -> Response<Full<Bytes>> {
    http::build_redirect_response(&redirect_location(ctx.path), ctx.is_head)
}

/// Canonical directory URL for a request path
///
/// Built from the cleaned segments, so the result always starts with a
/// single `/` and never names another host.
pub fn redirect_location(path: &str) -> String {
    let segments = normalize_url_path(path.trim_end_matches('/')).unwrap_or_default();
    format!("{}/", encode_url_path(&segments))
}
