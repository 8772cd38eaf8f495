//! `GET`/`HEAD /log/<token>`: the egress side. Any number of these may run
//! concurrently, each streaming from whatever offset it asked for.

use crate::body::{full_body, streaming_body};
use crate::error::HttpError;
use crate::responses::{constant_time_eq, error_response, not_found, ResponseBody};
use crate::AppState;
use http::{header, Method, Response, StatusCode};
use hyper::body::Incoming;
use hyper::Request;
use livelog_core::parse_range;
use std::sync::Arc;
use tracing::debug;

const STREAMING_HEADER: &str = "X-Streaming";

pub(crate) async fn handle(req: Request<Incoming>, state: Arc<AppState>) -> Response<ResponseBody> {
    let method = req.method().clone();
    if method != Method::GET && method != Method::HEAD {
        return error_response(HttpError::MethodNotAllowed);
    }

    let Some(token) = req.uri().path().strip_prefix("/log/") else {
        return not_found();
    };
    if !constant_time_eq(token.as_bytes(), state.access_token.as_bytes()) {
        return error_response(HttpError::AuthDenied);
    }

    let range_header = req
        .headers()
        .get(header::RANGE)
        .and_then(|v| v.to_str().ok());
    let (start, stop) = match parse_range(range_header) {
        Ok(parsed) => parsed,
        Err(err) => return error_response(HttpError::Range(err)),
    };

    let Some(stream) = state.active_stream.lock().await.clone() else {
        return not_found();
    };

    let mut builder = Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, "text/plain; charset=utf-8")
        .header(header::ACCESS_CONTROL_ALLOW_ORIGIN, "*")
        .header(STREAMING_HEADER, "true")
        .header(header::ACCESS_CONTROL_EXPOSE_HEADERS, STREAMING_HEADER);

    if method == Method::HEAD {
        builder = builder.header(header::ACCESS_CONTROL_ALLOW_HEADERS, STREAMING_HEADER);
        return builder
            .body(full_body(Vec::new()))
            .expect("status and header are always valid");
    }

    let handle = stream.observe(start, stop);
    let (writer, reader) = tokio::io::duplex(64 * 1024);
    tokio::spawn(async move {
        let mut writer = writer;
        if let Err(err) = handle.write_to(&mut writer).await {
            debug!(error = %err, "observer sink ended");
        }
    });

    builder
        .body(streaming_body(reader))
        .expect("status and header are always valid")
}
