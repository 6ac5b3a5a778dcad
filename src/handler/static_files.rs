//! Static file serving module
//!
//! Reads resolved files, applies conditional-GET validators and builds the
//! final response. Resolution and reading are not atomic, so a file that
//! disappears in between is looked up once more before giving up with 404.

use crate::handler::router::{serve_redirect, RequestContext};
use crate::http::{self, mime, Validator};
use crate::logger;
use crate::resolver::{Endpoint, PathResolver};
use http_body_util::Full;
use hyper::body::Bytes;
use hyper::Response;
use std::io;
use std::path::{Path, PathBuf};
use tokio::fs;

/// Fresh resolutions attempted after a failed read
const RACE_RETRIES: usize = 1;

/// Serve a resolved file for GET or HEAD
pub async fn serve_file(
    ctx: &RequestContext<'_>,
    resolver: &PathResolver,
    path: PathBuf,
) -> Response<Full<Bytes>> {
    let mut path = path;
    let mut retries = 0;

    loop {
        match load_file(ctx, &path).await {
            Ok(response) => return response,
            Err(e) => logger::log_warning(&format!(
                "Failed to read resolved file '{}': {e}",
                path.display()
            )),
        }

        if retries == RACE_RETRIES {
            break;
        }
        retries += 1;

        match resolver.resolve(ctx.path) {
            Endpoint::File(fresh) => path = fresh,
            Endpoint::Redirect => return serve_redirect(ctx),
            Endpoint::NotFound => break,
        }
    }

    serve_not_found(resolver, ctx.is_head).await
}

/// Serve the site's 404 page, or the default one
pub async fn serve_not_found(resolver: &PathResolver, is_head: bool) -> Response<Full<Bytes>> {
    http::build_404_response(resolver.custom_error_body().await, is_head)
}

/// Stat and read one file
///
/// Validators are computed from the same metadata on every call, so a 304
/// never outlives a change on disk.
async fn load_file(ctx: &RequestContext<'_>, path: &Path) -> io::Result<Response<Full<Bytes>>> {
    let metadata = fs::metadata(path).await?;
    if !metadata.is_file() {
        return Err(io::Error::new(
            io::ErrorKind::NotFound,
            "no longer a regular file",
        ));
    }

    let validator = Validator::from_metadata(&metadata);
    if validator.is_not_modified(ctx.if_none_match, ctx.if_modified_since) {
        return Ok(http::build_304_response(&validator));
    }

    let content = fs::read(path).await?;
    Ok(http::build_file_response(
        Bytes::from(content),
        mime::content_type_for(path),
        &validator,
        ctx.is_head,
    ))
}
