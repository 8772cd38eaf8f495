//! The live log relay's HTTP boundary: a single producer PUTs bytes on one
//! port, any number of consumers GET them back on another, live, from
//! whatever offset they ask for. [`livelog_core`] holds the fan-out buffer
//! this crate exposes over HTTP; this crate holds the parts that only make
//! sense at a network edge — routing, TLS, access control, process config.

pub mod config;

mod body;
mod debug;
mod error;
mod get;
mod latch;
mod put;
mod responses;
mod tls;

use config::Config;
use hyper::service::service_fn;
use hyper_util::rt::TokioIo;
use latch::ProducerLatch;
use livelog_core::Stream;
use std::io;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio_rustls::TlsAcceptor;
use tracing::{info, warn};

/// State shared by every connection on both ports.
pub(crate) struct AppState {
    pub(crate) access_token: String,
    pub(crate) producer_latch: ProducerLatch,
    pub(crate) active_stream: Mutex<Option<Stream>>,
}

/// A running relay: both listeners are bound and accepting connections.
/// Dropping this does not stop the server — hold the join handles, or let
/// the process exit, to shut it down.
pub struct ServerHandle {
    /// The PUT port's bound address. Equal to the configured port unless
    /// `0` was requested, in which case this is the OS-assigned port.
    pub put_addr: SocketAddr,
    /// The GET port's bound address, same rule as `put_addr`.
    pub get_addr: SocketAddr,
    pub put_task: JoinHandle<()>,
    pub get_task: JoinHandle<()>,
}

/// Binds both ports and spawns their accept loops. Returns as soon as both
/// listeners are ready; the returned tasks run until the process exits or
/// are aborted.
pub async fn start(config: Config) -> io::Result<ServerHandle> {
    let tls_acceptor = match &config.tls {
        Some(files) => Some(tls::load_acceptor(&files.cert_path, &files.key_path)?),
        None => None,
    };

    let state = Arc::new(AppState {
        access_token: config.access_token,
        producer_latch: ProducerLatch::default(),
        active_stream: Mutex::new(None),
    });

    let put_listener = TcpListener::bind(("127.0.0.1", config.put_port)).await?;
    let get_listener = TcpListener::bind(("0.0.0.0", config.get_port)).await?;
    let put_addr = put_listener.local_addr()?;
    let get_addr = get_listener.local_addr()?;

    info!(%put_addr, %get_addr, debug = config.debug, tls = tls_acceptor.is_some(), "livelog starting");

    let debug_enabled = config.debug;
    let put_state = state.clone();
    let put_task = tokio::spawn(async move {
        run_put_server(put_listener, put_state, debug_enabled).await;
    });

    let get_state = state.clone();
    let get_task = tokio::spawn(async move {
        run_get_server(get_listener, get_state, tls_acceptor).await;
    });

    Ok(ServerHandle {
        put_addr,
        get_addr,
        put_task,
        get_task,
    })
}

async fn run_put_server(listener: TcpListener, state: Arc<AppState>, debug_enabled: bool) {
    loop {
        let (stream, peer) = match listener.accept().await {
            Ok(accepted) => accepted,
            Err(err) => {
                warn!(error = %err, "PUT accept failed");
                continue;
            }
        };
        let state = state.clone();
        tokio::spawn(async move {
            let io = TokioIo::new(stream);
            let service = service_fn(move |req| {
                let state = state.clone();
                async move {
                    let path_is_debug =
                        debug_enabled && req.uri().path().starts_with("/debug/pprof");
                    let response = if path_is_debug {
                        debug::handle(req).await
                    } else {
                        put::handle(req, state).await
                    };
                    Ok::<_, std::convert::Infallible>(response)
                }
            });
            if let Err(err) = hyper::server::conn::http1::Builder::new()
                .serve_connection(io, service)
                .await
            {
                warn!(error = %err, %peer, "PUT connection ended with error");
            }
        });
    }
}

async fn run_get_server(
    listener: TcpListener,
    state: Arc<AppState>,
    tls_acceptor: Option<TlsAcceptor>,
) {
    loop {
        let (stream, peer) = match listener.accept().await {
            Ok(accepted) => accepted,
            Err(err) => {
                warn!(error = %err, "GET accept failed");
                continue;
            }
        };
        let state = state.clone();
        let tls_acceptor = tls_acceptor.clone();
        tokio::spawn(async move {
            let service = service_fn(move |req| {
                let state = state.clone();
                async move { Ok::<_, std::convert::Infallible>(get::handle(req, state).await) }
            });

            let result = if let Some(acceptor) = tls_acceptor {
                match acceptor.accept(stream).await {
                    Ok(tls_stream) => {
                        hyper::server::conn::http1::Builder::new()
                            .serve_connection(TokioIo::new(tls_stream), service)
                            .await
                    }
                    Err(err) => {
                        warn!(error = %err, %peer, "TLS handshake failed");
                        return;
                    }
                }
            } else {
                hyper::server::conn::http1::Builder::new()
                    .serve_connection(TokioIo::new(stream), service)
                    .await
            };

            if let Err(err) = result {
                warn!(error = %err, %peer, "GET connection ended with error");
            }
        });
    }
}

/// Initializes the process-wide tracing subscriber. Respects `RUST_LOG` if
/// set; otherwise defaults to `debug` when `DEBUG` is set, `info` otherwise.
pub fn init_tracing(debug: bool) {
    let default_filter = if debug { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_filter)),
        )
        .init();
}

/// Exit code for `start` failing after a valid `Config`: a bad TLS
/// certificate/key, or a PUT/GET port already in use. Distinct from
/// [`config::ConfigError::exit_code`]'s range, which covers only invalid
/// environment variables; `start`'s caller logs the underlying `io::Error`
/// for which of these it was.
pub const START_FAILURE_EXIT_CODE: i32 = 6;

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn start_binds_ephemeral_ports_when_requested() {
        let config = Config {
            access_token: "secret".to_string(),
            put_port: 0,
            get_port: 0,
            tls: None,
            debug: false,
        };
        let handle = start(config).await.unwrap();
        assert_ne!(handle.put_addr.port(), 0);
        assert_ne!(handle.get_addr.port(), 0);
        assert_ne!(handle.put_addr.port(), handle.get_addr.port());
        handle.put_task.abort();
        handle.get_task.abort();
    }
}
