//! Request routing dispatch module
//!
//! Entry point for HTTP request processing: resolves the route, hands the
//! request to the typed dispatcher and writes the access log line.

use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;

use hyper::body::Body;
use hyper::{Request, Response};

use crate::config::AppState;
use crate::dispatch::{dispatch, RawRequest, UploadFileRequest};
use crate::handler::files;
use crate::http::{self, RequestBody, ResponseBody};
use crate::logger::{self, AccessLogEntry};
use crate::routing::Operation;

/// Main entry point for HTTP request handling
pub async fn handle_request(
    req: Request<RequestBody>,
    state: Arc<AppState>,
    peer_addr: SocketAddr,
) -> Result<Response<ResponseBody>, Infallible> {
    let started = Instant::now();

    let access_entry = state
        .config
        .logging
        .access_log
        .then(|| AccessLogEntry::from_request(peer_addr, &req));

    let response = route_request(req, &state).await;

    if let Some(mut entry) = access_entry {
        entry.status = response.status().as_u16();
        entry.body_bytes = response.body().size_hint().exact();
        entry.request_time_us = u64::try_from(started.elapsed().as_micros()).unwrap_or(u64::MAX);
        logger::log_access(&entry, state.config.logging.access_log_format);
    }

    Ok(response)
}

/// Resolve the route and run the matching operation
async fn route_request(req: Request<RequestBody>, state: &AppState) -> Response<ResponseBody> {
    let Some(matched) = state.router.resolve(req.uri().path()) else {
        tracing::debug!(path = req.uri().path(), "no route matched");
        return http::build_404_response();
    };

    let route = matched.route;
    let raw = RawRequest::new(req, matched.params);
    let root = &state.upload_root;

    match route.operation {
        Operation::Upload => {
            dispatch(&route.method, raw, root, |req: UploadFileRequest| {
                files::upload(req, root, &state.config.storage)
            })
            .await
        }
        Operation::Download => dispatch(&route.method, raw, root, files::download).await,
        Operation::List => dispatch(&route.method, raw, root, files::list).await,
        Operation::View => dispatch(&route.method, raw, root, files::view).await,
    }
}
