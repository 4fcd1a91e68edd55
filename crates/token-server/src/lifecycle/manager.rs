//! [`Lifecycle`]: owns the listening socket and the single shutdown attempt.

use std::{future::Future, io, net::SocketAddr, time::Duration};

use axum::Router;
use hyper::{body::Incoming, Request};
use hyper_util::{
    rt::{TokioExecutor, TokioIo},
    server::conn::auto,
};
use thiserror::Error;
use tokio::{
    net::{TcpListener, TcpStream},
    sync::watch,
    task::{JoinHandle, JoinSet},
};
use tokio_util::sync::CancellationToken;
use tower::Service;
use tracing::{debug, error, info, warn};

use crate::config::ConfigError;

/// How long in-flight requests may run once shutdown has begun.
pub const SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(2);

/// Pause after a non-transient accept error.
const ACCEPT_BACKOFF: Duration = Duration::from_secs(1);

/// Errors that terminate the process.
#[derive(Debug, Error)]
pub enum StartupError {
    /// Required configuration is missing or invalid.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// The listener could not be bound.
    #[error("failed to bind {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        #[source]
        source: io::Error,
    },

    /// The bound listener became unusable.
    #[error("server error: {0}")]
    Serve(#[source] io::Error),
}

/// Observable lifecycle phase. Transitions only move forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleState {
    Created,
    Listening,
    ShuttingDown,
    Stopped,
}

/// Serves a router until shutdown is requested, then drains connections
/// for at most the shutdown timeout.
pub struct Lifecycle {
    router: Router,
    shutdown: CancellationToken,
    shutdown_timeout: Duration,
    state: watch::Sender<LifecycleState>,
}

impl Lifecycle {
    /// Create a lifecycle in the [`LifecycleState::Created`] state.
    pub fn new(router: Router) -> Self {
        let (state, _) = watch::channel(LifecycleState::Created);
        Self {
            router,
            shutdown: CancellationToken::new(),
            shutdown_timeout: SHUTDOWN_TIMEOUT,
            state,
        }
    }

    /// Override [`SHUTDOWN_TIMEOUT`].
    pub fn with_shutdown_timeout(mut self, timeout: Duration) -> Self {
        self.shutdown_timeout = timeout;
        self
    }

    /// Subscribe to state transitions.
    pub fn subscribe(&self) -> watch::Receiver<LifecycleState> {
        self.state.subscribe()
    }

    /// Token that starts shutdown when cancelled.
    pub fn shutdown_token(&self) -> CancellationToken {
        self.shutdown.clone()
    }

    /// Spawn the watcher that cancels the shutdown token once `signal`
    /// completes. The signal is consumed at most once.
    pub fn watch_signal<F>(&self, signal: F) -> JoinHandle<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let token = self.shutdown.clone();
        tokio::spawn(async move {
            tokio::select! {
                _ = signal => {
                    info!("shutdown signal received");
                    token.cancel();
                }
                _ = token.cancelled() => {}
            }
        })
    }

    /// Start the signal watcher, bind `addr`, and serve until shutdown
    /// completes.
    ///
    /// # Errors
    ///
    /// Returns [`StartupError::Bind`] if the listener cannot be bound and
    /// [`StartupError::Serve`] if the bound socket cannot be queried.
    pub async fn run<F>(self, addr: SocketAddr, signal: F) -> Result<(), StartupError>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let watcher = self.watch_signal(signal);

        let listener = match TcpListener::bind(addr).await {
            Ok(listener) => listener,
            Err(source) => {
                error!(addr = %addr, error = %source, "failed to bind listener");
                watcher.abort();
                return Err(StartupError::Bind { addr, source });
            }
        };

        let res = self.serve(listener).await;
        watcher.abort();
        res
    }

    /// Accept connections on `listener` until the shutdown token is
    /// cancelled, then drain.
    ///
    /// # Errors
    ///
    /// Returns [`StartupError::Serve`] if the listener's address cannot be read.
    pub async fn serve(self, listener: TcpListener) -> Result<(), StartupError> {
        let addr = listener.local_addr().map_err(StartupError::Serve)?;
        self.state.send_replace(LifecycleState::Listening);
        info!(addr = %addr, "listening");

        let mut connections = JoinSet::new();
        loop {
            tokio::select! {
                _ = self.shutdown.cancelled() => break,
                accepted = listener.accept() => match accepted {
                    Ok((stream, peer)) => {
                        debug!(%peer, "accepted connection");
                        connections.spawn(serve_connection(
                            stream,
                            self.router.clone(),
                            self.shutdown.clone(),
                        ));
                    }
                    Err(e) if is_connection_error(&e) => {
                        debug!(error = %e, "connection dropped before accept");
                    }
                    Err(e) => {
                        error!(error = %e, "accept error");
                        tokio::time::sleep(ACCEPT_BACKOFF).await;
                    }
                },
                Some(joined) = connections.join_next(), if !connections.is_empty() => {
                    if let Err(e) = joined {
                        warn!(error = %e, "connection task failed");
                    }
                }
            }
        }

        // No new connections from here on.
        drop(listener);
        self.state.send_replace(LifecycleState::ShuttingDown);
        info!(
            in_flight = connections.len(),
            timeout_ms = self.shutdown_timeout.as_millis() as u64,
            "shutting down"
        );

        let drained = tokio::time::timeout(self.shutdown_timeout, async {
            while connections.join_next().await.is_some() {}
        })
        .await;

        match drained {
            Ok(()) => info!("all connections drained"),
            Err(_) => {
                warn!(
                    abandoned = connections.len(),
                    "shutdown deadline elapsed; abandoning in-flight requests"
                );
                connections.abort_all();
                while connections.join_next().await.is_some() {}
            }
        }

        self.state.send_replace(LifecycleState::Stopped);
        info!("server stopped");
        Ok(())
    }
}

/// Serve one connection; on shutdown let the current request finish and
/// refuse further keep-alive requests.
async fn serve_connection(stream: TcpStream, router: Router, shutdown: CancellationToken) {
    let service = hyper::service::service_fn(move |request: Request<Incoming>| {
        router.clone().call(request)
    });
    let builder = auto::Builder::new(TokioExecutor::new());
    let conn = builder.serve_connection(TokioIo::new(stream), service);
    tokio::pin!(conn);

    tokio::select! {
        res = conn.as_mut() => {
            if let Err(e) = res {
                debug!(error = %e, "connection closed with error");
            }
        }
        _ = shutdown.cancelled() => {
            conn.as_mut().graceful_shutdown();
            if let Err(e) = conn.await {
                debug!(error = %e, "connection closed with error during shutdown");
            }
        }
    }
}

fn is_connection_error(e: &io::Error) -> bool {
    matches!(
        e.kind(),
        io::ErrorKind::ConnectionRefused
            | io::ErrorKind::ConnectionAborted
            | io::ErrorKind::ConnectionReset
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::routing::get;
    use std::time::Instant;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::sync::oneshot;

    fn slow_router(delay: Duration) -> Router {
        Router::new().route(
            "/slow",
            get(move || async move {
                tokio::time::sleep(delay).await;
                "done"
            }),
        )
    }

    async fn spawn(lifecycle: Lifecycle) -> (SocketAddr, JoinHandle<Result<(), StartupError>>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        (addr, tokio::spawn(lifecycle.serve(listener)))
    }

    async fn send_get(addr: SocketAddr, path: &str) -> TcpStream {
        let mut stream = TcpStream::connect(addr).await.unwrap();
        let req = format!("GET {path} HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n\r\n");
        stream.write_all(req.as_bytes()).await.unwrap();
        stream
    }

    #[tokio::test]
    async fn state_moves_forward_to_stopped() {
        let lifecycle = Lifecycle::new(slow_router(Duration::ZERO));
        let mut state = lifecycle.subscribe();
        let token = lifecycle.shutdown_token();
        assert_eq!(*state.borrow(), LifecycleState::Created);

        let (_, handle) = spawn(lifecycle).await;
        state
            .wait_for(|s| *s == LifecycleState::Listening)
            .await
            .unwrap();

        token.cancel();
        handle.await.unwrap().unwrap();
        assert_eq!(*state.borrow(), LifecycleState::Stopped);
    }

    #[tokio::test]
    async fn serves_requests_while_listening() {
        let lifecycle = Lifecycle::new(slow_router(Duration::ZERO));
        let token = lifecycle.shutdown_token();
        let (addr, handle) = spawn(lifecycle).await;

        let mut stream = send_get(addr, "/slow").await;
        let mut buf = String::new();
        stream.read_to_string(&mut buf).await.unwrap();
        assert!(buf.starts_with("HTTP/1.1 200"), "got: {buf}");

        token.cancel();
        handle.await.unwrap().unwrap();
    }

    #[tokio::test]
    async fn in_flight_request_completes_within_deadline() {
        let lifecycle = Lifecycle::new(slow_router(Duration::from_millis(300)));
        let token = lifecycle.shutdown_token();
        let (addr, handle) = spawn(lifecycle).await;

        let mut stream = send_get(addr, "/slow").await;
        // Let the request reach the handler before shutting down.
        tokio::time::sleep(Duration::from_millis(50)).await;
        token.cancel();

        let mut buf = String::new();
        stream.read_to_string(&mut buf).await.unwrap();
        assert!(buf.starts_with("HTTP/1.1 200"), "got: {buf}");
        assert!(buf.ends_with("done"));
        handle.await.unwrap().unwrap();
    }

    #[tokio::test]
    async fn stuck_request_is_abandoned_at_deadline() {
        let lifecycle = Lifecycle::new(slow_router(Duration::from_secs(30)))
            .with_shutdown_timeout(Duration::from_millis(200));
        let token = lifecycle.shutdown_token();
        let (addr, handle) = spawn(lifecycle).await;

        let mut stream = send_get(addr, "/slow").await;
        tokio::time::sleep(Duration::from_millis(50)).await;

        let started = Instant::now();
        token.cancel();
        tokio::time::timeout(Duration::from_secs(5), handle)
            .await
            .expect("shutdown did not respect its deadline")
            .unwrap()
            .unwrap();
        assert!(started.elapsed() < Duration::from_secs(2));

        // The connection is closed without a response.
        let mut buf = Vec::new();
        let _ = stream.read_to_end(&mut buf).await;
        assert!(!String::from_utf8_lossy(&buf).contains("200"));
    }

    #[tokio::test]
    async fn listener_is_closed_after_shutdown() {
        let lifecycle = Lifecycle::new(slow_router(Duration::ZERO));
        let token = lifecycle.shutdown_token();
        let (addr, handle) = spawn(lifecycle).await;

        token.cancel();
        handle.await.unwrap().unwrap();
        assert!(TcpStream::connect(addr).await.is_err());
    }

    #[tokio::test]
    async fn run_stops_when_signal_fires() {
        let (tx, rx) = oneshot::channel::<()>();
        let lifecycle = Lifecycle::new(slow_router(Duration::ZERO));
        let mut state = lifecycle.subscribe();

        let handle = tokio::spawn(lifecycle.run(([127, 0, 0, 1], 0).into(), async move {
            let _ = rx.await;
        }));
        state
            .wait_for(|s| *s == LifecycleState::Listening)
            .await
            .unwrap();

        tx.send(()).unwrap();
        handle.await.unwrap().unwrap();
        assert_eq!(*state.borrow(), LifecycleState::Stopped);
    }

    #[tokio::test]
    async fn bind_failure_is_fatal() {
        let taken = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = taken.local_addr().unwrap();

        let lifecycle = Lifecycle::new(Router::new());
        let state = lifecycle.subscribe();
        let res = lifecycle.run(addr, std::future::pending()).await;

        assert!(matches!(res, Err(StartupError::Bind { .. })));
        assert_eq!(*state.borrow(), LifecycleState::Created);
    }
}
