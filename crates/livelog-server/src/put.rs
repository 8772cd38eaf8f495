//! `PUT /log`: the ingress side. Exactly one of these may be in flight for
//! the lifetime of the process.

use crate::body::{body_to_async_read, full_body};
use crate::error::HttpError;
use crate::responses::{error_response, not_found, ResponseBody};
use crate::AppState;
use http::{Method, Response, StatusCode};
use hyper::body::Incoming;
use hyper::Request;
use livelog_core::Stream;
use std::sync::Arc;
use tracing::{info, warn};

pub(crate) async fn handle(
    req: Request<Incoming>,
    state: Arc<AppState>,
) -> Response<ResponseBody> {
    if req.method() != Method::PUT {
        return error_response(HttpError::MethodNotAllowed);
    }
    if req.uri().path() != "/log" {
        return not_found();
    }

    if !state.producer_latch.try_acquire().await {
        return error_response(HttpError::AlreadyStreaming);
    }

    let stream = match Stream::new() {
        Ok(stream) => stream,
        Err(err) => {
            // Only failure that releases the latch: construction never
            // started, so a client is free to retry.
            state.producer_latch.release().await;
            return error_response(HttpError::Core(err));
        }
    };

    *state.active_stream.lock().await = Some(stream.clone());

    let body_reader = body_to_async_read(req.into_body());
    let consume_stream = stream;
    tokio::spawn(async move {
        match consume_stream.consume(body_reader).await {
            Ok(()) => info!(bytes = consume_stream.length(), "producer closed stream"),
            Err(err) => warn!(error = %err, "producer failed"),
        }
    });

    Response::builder()
        .status(StatusCode::CREATED)
        .body(full_body(Vec::new()))
        .expect("status and header are always valid")
}
