//! The boundary-level error taxonomy: wraps the core's errors and adds the
//! kinds that only make sense at the HTTP edge.

use http::StatusCode;
use thiserror::Error;

#[derive(Debug, Error)]
pub(crate) enum HttpError {
    /// The `Range` header was malformed or unsupported.
    #[error(transparent)]
    Range(#[from] livelog_core::RangeError),

    /// The token in the request path didn't match `ACCESS_TOKEN`.
    #[error("access denied")]
    AuthDenied,

    /// Anything but `PUT /log` on the ingress port, or anything but
    /// `GET`/`HEAD /log/<token>` on the egress port.
    #[error("method not allowed")]
    MethodNotAllowed,

    /// A PUT arrived while another was already being ingested.
    #[error("a stream is already being ingested")]
    AlreadyStreaming,

    /// Errors from the core fan-out buffer (stream open / producer / sink).
    #[error(transparent)]
    Core(#[from] livelog_core::CoreError),
}

impl HttpError {
    /// The response status a collaborator should send for this error.
    pub(crate) fn status(&self) -> StatusCode {
        match self {
            Self::Range(_) => StatusCode::RANGE_NOT_SATISFIABLE,
            Self::AuthDenied => StatusCode::UNAUTHORIZED,
            Self::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            Self::AlreadyStreaming => StatusCode::BAD_REQUEST,
            Self::Core(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}
