//! TLS front door.
//!
//! Two listeners: a plaintext one that only redirects to HTTPS, and a TLS
//! one serving the application. The whole configuration (addresses, TLS
//! material, routes) is applied atomically; [`FrontDoor::reconfigure`]
//! stands up a complete replacement listener set on the same ports (via
//! `SO_REUSEPORT`) before the old one starts draining, so requests keep
//! being served across the swap.

use std::net::SocketAddr;
use std::time::Duration;

use axum::Router;
use axum::http::header;
use axum::response::Redirect;
use hyper::body::Incoming;
use hyper::Request;
use hyper_util::rt::{TokioExecutor, TokioIo};
use tokio::net::TcpListener;
use tokio::sync::Mutex;
use tokio_rustls::TlsAcceptor;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use tower::util::ServiceExt;

use crate::config::FrontDoorConfig;

pub mod tls;

/// How long a draining listener set may hold onto open connections.
const DRAIN_GRACE: Duration = Duration::from_secs(10);

/// Pause after a failed `accept` so a persistent fault (fd exhaustion)
/// does not spin the loop.
const ACCEPT_BACKOFF: Duration = Duration::from_millis(50);

#[derive(Debug, thiserror::Error)]
pub enum FrontDoorError {
    #[error("invalid TLS configuration: {0}")]
    Config(String),
    #[error("failed to bind listener")]
    Bind(#[source] std::io::Error),
    #[error("front door is already running")]
    AlreadyRunning,
    #[error("front door is not running")]
    NotRunning,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrontDoorState {
    Stopped,
    /// Listeners are being bound; not yet accepting.
    Starting,
    Running,
    /// A superseded listener set is still finishing its connections.
    Draining,
}

/// One running pair of listeners plus the tasks serving them.
///
/// Everything a set serves is captured at construction; a later
/// reconfiguration never mutates a live set, it replaces it.
struct ListenerSet {
    cancel: CancellationToken,
    tracker: TaskTracker,
    http_addr: SocketAddr,
    https_addr: SocketAddr,
}

impl ListenerSet {
    /// Stop accepting, then wait (bounded) for open connections to finish.
    async fn shutdown(self, grace: Duration) {
        self.cancel.cancel();
        self.tracker.close();
        if tokio::time::timeout(grace, self.tracker.wait()).await.is_err() {
            tracing::warn!(
                grace_secs = grace.as_secs(),
                "drain grace elapsed with connections still open"
            );
        }
    }
}

pub struct FrontDoor {
    inner: Mutex<Inner>,
}

struct Inner {
    state: FrontDoorState,
    active: Option<ListenerSet>,
}

impl FrontDoor {
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(Inner {
                state: FrontDoorState::Stopped,
                active: None,
            }),
        }
    }

    pub async fn state(&self) -> FrontDoorState {
        self.inner.lock().await.state
    }

    /// Bind both listeners and start serving.
    ///
    /// Returns the bound addresses (useful when the config asked for
    /// ephemeral ports).
    pub async fn start(
        &self,
        config: FrontDoorConfig,
    ) -> Result<(SocketAddr, SocketAddr), FrontDoorError> {
        let mut inner = self.inner.lock().await;
        if inner.state != FrontDoorState::Stopped {
            return Err(FrontDoorError::AlreadyRunning);
        }

        inner.state = FrontDoorState::Starting;
        let set = match spawn_listener_set(&config) {
            Ok(set) => set,
            Err(err) => {
                inner.state = FrontDoorState::Stopped;
                return Err(err);
            }
        };
        let addrs = (set.http_addr, set.https_addr);
        tracing::info!(http = %addrs.0, https = %addrs.1, "front door listening");

        inner.active = Some(set);
        inner.state = FrontDoorState::Running;
        Ok(addrs)
    }

    /// Swap in a new configuration without dropping traffic.
    ///
    /// The replacement listener set is fully constructed first; any error
    /// (bad TLS material, bind failure) leaves the current set serving
    /// untouched. On success the old set drains with a bounded grace.
    pub async fn reconfigure(
        &self,
        config: FrontDoorConfig,
    ) -> Result<(SocketAddr, SocketAddr), FrontDoorError> {
        let (old, addrs) = {
            let mut inner = self.inner.lock().await;
            if inner.state != FrontDoorState::Running {
                return Err(FrontDoorError::NotRunning);
            }

            let set = spawn_listener_set(&config)?;
            let addrs = (set.http_addr, set.https_addr);
            let old = inner.active.replace(set);
            inner.state = FrontDoorState::Draining;
            (old, addrs)
        };

        // Drain outside the lock; the new set is already accepting and
        // state()/stop() must stay responsive meanwhile.
        if let Some(old) = old {
            old.shutdown(DRAIN_GRACE).await;
        }

        let mut inner = self.inner.lock().await;
        // A concurrent stop() may have taken the new set during the drain;
        // in that case the state is no longer ours to advance.
        if inner.state == FrontDoorState::Draining && inner.active.is_some() {
            inner.state = FrontDoorState::Running;
        }

        tracing::info!(http = %addrs.0, https = %addrs.1, "front door reconfigured");
        Ok(addrs)
    }

    /// Stop accepting and drain.
    pub async fn stop(&self) -> Result<(), FrontDoorError> {
        let set = {
            let mut inner = self.inner.lock().await;
            let Some(set) = inner.active.take() else {
                return Err(FrontDoorError::NotRunning);
            };
            inner.state = FrontDoorState::Draining;
            set
        };

        set.shutdown(DRAIN_GRACE).await;

        // No other transition can interleave here: with `active` empty and
        // the state at Draining, start() and reconfigure() both refuse.
        self.inner.lock().await.state = FrontDoorState::Stopped;
        tracing::info!("front door stopped");
        Ok(())
    }
}

impl Default for FrontDoor {
    fn default() -> Self {
        Self::new()
    }
}

/// Build the acceptor, bind both listeners, and spawn their accept loops.
fn spawn_listener_set(config: &FrontDoorConfig) -> Result<ListenerSet, FrontDoorError> {
    // Parse TLS material before touching any socket.
    let acceptor = tls::build_acceptor(&config.tls)?;

    let http = bind_reuseport(config.http_addr).map_err(FrontDoorError::Bind)?;
    let https = bind_reuseport(config.https_addr).map_err(FrontDoorError::Bind)?;
    let http_addr = http.local_addr().map_err(FrontDoorError::Bind)?;
    let https_addr = https.local_addr().map_err(FrontDoorError::Bind)?;

    let cancel = CancellationToken::new();
    let tracker = TaskTracker::new();

    tracker.spawn(accept_plain(
        http,
        redirect_router(https_addr.port()),
        cancel.clone(),
        tracker.clone(),
    ));
    tracker.spawn(accept_tls(
        https,
        acceptor,
        config.routes.clone(),
        cancel.clone(),
        tracker.clone(),
    ));

    Ok(ListenerSet {
        cancel,
        tracker,
        http_addr,
        https_addr,
    })
}

/// Bind with `SO_REUSEPORT` so a replacement listener can share the port
/// while the old one drains.
fn bind_reuseport(addr: SocketAddr) -> std::io::Result<TcpListener> {
    let socket = socket2::Socket::new(
        socket2::Domain::for_address(addr),
        socket2::Type::STREAM,
        Some(socket2::Protocol::TCP),
    )?;
    socket.set_reuse_address(true)?;
    socket.set_reuse_port(true)?;
    socket.set_nonblocking(true)?;
    socket.bind(&addr.into())?;
    socket.listen(1024)?;
    TcpListener::from_std(socket.into())
}

/// Redirect-only router for the plaintext listener.
fn redirect_router(https_port: u16) -> Router {
    Router::new().fallback(move |req: axum::extract::Request| async move {
        let host = req
            .headers()
            .get(header::HOST)
            .and_then(|h| h.to_str().ok())
            .unwrap_or("localhost");
        // Strip an explicit port, keeping IPv6 literals intact.
        let host = match host.rsplit_once(':') {
            Some((name, port)) if !port.is_empty() && port.chars().all(|c| c.is_ascii_digit()) => {
                name
            }
            _ => host,
        };

        let target = if https_port == 443 {
            format!("https://{host}{}", req.uri())
        } else {
            format!("https://{host}:{https_port}{}", req.uri())
        };
        Redirect::permanent(&target)
    })
}

async fn accept_plain(
    listener: TcpListener,
    router: Router,
    cancel: CancellationToken,
    tracker: TaskTracker,
) {
    loop {
        tokio::select! {
            _ = cancel.cancelled() => break,
            accepted = listener.accept() => match accepted {
                Ok((stream, _peer)) => {
                    let router = router.clone();
                    let cancel = cancel.clone();
                    tracker.spawn(serve_stream(stream, router, cancel));
                }
                Err(err) => {
                    tracing::warn!(error = %err, "accept failed on plaintext listener");
                    tokio::time::sleep(ACCEPT_BACKOFF).await;
                }
            },
        }
    }
}

async fn accept_tls(
    listener: TcpListener,
    acceptor: TlsAcceptor,
    router: Router,
    cancel: CancellationToken,
    tracker: TaskTracker,
) {
    loop {
        tokio::select! {
            _ = cancel.cancelled() => break,
            accepted = listener.accept() => match accepted {
                Ok((stream, peer)) => {
                    let acceptor = acceptor.clone();
                    let router = router.clone();
                    let cancel = cancel.clone();
                    tracker.spawn(async move {
                        match acceptor.accept(stream).await {
                            Ok(tls_stream) => serve_stream(tls_stream, router, cancel).await,
                            Err(err) => {
                                tracing::debug!(peer = %peer, error = %err, "TLS handshake failed");
                            }
                        }
                    });
                }
                Err(err) => {
                    tracing::warn!(error = %err, "accept failed on TLS listener");
                    tokio::time::sleep(ACCEPT_BACKOFF).await;
                }
            },
        }
    }
}

/// Serve one connection, honoring graceful shutdown on cancellation.
async fn serve_stream<S>(stream: S, router: Router, cancel: CancellationToken)
where
    S: tokio::io::AsyncRead + tokio::io::AsyncWrite + Unpin + Send + 'static,
{
    let service = hyper::service::service_fn(move |req: Request<Incoming>| {
        router.clone().oneshot(req.map(axum::body::Body::new))
    });

    let builder = hyper_util::server::conn::auto::Builder::new(TokioExecutor::new());
    let conn = builder.serve_connection_with_upgrades(TokioIo::new(stream), service);
    let mut conn = std::pin::pin!(conn);

    let mut draining = false;
    loop {
        tokio::select! {
            result = conn.as_mut() => {
                if let Err(err) = result {
                    tracing::debug!(error = %err, "connection closed with error");
                }
                break;
            }
            _ = cancel.cancelled(), if !draining => {
                // Finish in-flight requests, then close.
                conn.as_mut().graceful_shutdown();
                draining = true;
            }
        }
    }
}
