//! Shared response construction: error bodies, the `X-Streaming` header
//! family, and the constant-time token comparison used by the GET handler.

use crate::body::{full_body, BoxBody};
use crate::error::HttpError;
use http::{header, Response, StatusCode};

pub(crate) type ResponseBody = BoxBody;

pub(crate) fn error_response(err: HttpError) -> Response<ResponseBody> {
    let status = err.status();
    Response::builder()
        .status(status)
        .header(header::CONTENT_TYPE, "text/plain; charset=utf-8")
        .body(full_body(err.to_string()))
        .expect("status and header are always valid")
}

pub(crate) fn not_found() -> Response<ResponseBody> {
    Response::builder()
        .status(StatusCode::NOT_FOUND)
        .body(full_body("not found"))
        .expect("status and header are always valid")
}

/// Compares two byte strings without branching on a mismatch's position, so
/// an attacker probing the access token can't learn how many leading bytes
/// they got right from response timing.
pub(crate) fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    let mut diff = 0u8;
    for (x, y) in a.iter().zip(b.iter()) {
        diff |= x ^ y;
    }
    diff == 0
}
