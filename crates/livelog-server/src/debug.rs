//! `/debug/pprof/*`: an on-demand CPU flamegraph, mounted on the ingress
//! port only when `DEBUG` is set. Not part of the stable API; exists for
//! diagnosing a stuck relay in production without restarting it.

use crate::body::full_body;
use crate::responses::{not_found, ResponseBody};
use http::{header, Response, StatusCode};
use hyper::body::Incoming;
use hyper::Request;
use pprof::ProfilerGuardBuilder;
use std::collections::HashMap;
use std::time::Duration;
use tracing::warn;

const DEFAULT_SECONDS: u64 = 10;
const MAX_SECONDS: u64 = 60;
const PROFILING_FREQUENCY_HZ: i32 = 100;

pub(crate) async fn handle(req: Request<Incoming>) -> Response<ResponseBody> {
    match req.uri().path() {
        "/debug/pprof/" | "/debug/pprof" => index(),
        "/debug/pprof/profile" => profile(parse_query(req.uri().query())).await,
        _ => not_found(),
    }
}

fn index() -> Response<ResponseBody> {
    let body = "livelog debug endpoints:\n\
                 \n\
                 /debug/pprof/profile?seconds=N  CPU flamegraph, SVG, N in [1,60], default 10\n";
    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, "text/plain; charset=utf-8")
        .body(full_body(body))
        .expect("status and header are always valid")
}

async fn profile(query: HashMap<String, String>) -> Response<ResponseBody> {
    let seconds = query
        .get("seconds")
        .and_then(|s| s.parse::<u64>().ok())
        .unwrap_or(DEFAULT_SECONDS)
        .clamp(1, MAX_SECONDS);

    let guard = match ProfilerGuardBuilder::default()
        .frequency(PROFILING_FREQUENCY_HZ)
        .blocklist(&["libc", "libgcc", "pthread", "vdso"])
        .build()
    {
        Ok(guard) => guard,
        Err(err) => return internal_error(&err.to_string()),
    };

    tokio::time::sleep(Duration::from_secs(seconds)).await;

    let report = match guard.report().build() {
        Ok(report) => report,
        Err(err) => return internal_error(&err.to_string()),
    };

    let mut svg = Vec::new();
    if let Err(err) = report.flamegraph(&mut svg) {
        warn!(error = %err, "failed to render flamegraph");
        return internal_error(&err.to_string());
    }

    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, "image/svg+xml")
        .body(full_body(svg))
        .expect("status and header are always valid")
}

fn internal_error(message: &str) -> Response<ResponseBody> {
    Response::builder()
        .status(StatusCode::INTERNAL_SERVER_ERROR)
        .header(header::CONTENT_TYPE, "text/plain; charset=utf-8")
        .body(full_body(message.to_string()))
        .expect("status and header are always valid")
}

/// A hand-rolled `a=1&b=2` parser: the only query string this service ever
/// needs to read is its own profiling knob, so pulling in a URL crate for
/// it isn't worth the dependency.
fn parse_query(raw: Option<&str>) -> HashMap<String, String> {
    let mut params = HashMap::new();
    let Some(raw) = raw else {
        return params;
    };
    for pair in raw.split('&') {
        if let Some((key, value)) = pair.split_once('=') {
            params.insert(key.to_string(), value.to_string());
        }
    }
    params
}
