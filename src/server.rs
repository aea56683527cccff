//! Lifecycle Manager
//!
//! Owns startup (cache refresh scheduler, listener) and graceful shutdown
//! (readiness grace window, stop accepting, bounded drain of in-flight requests).

use std::fmt::Display;
use std::future::Future;
use std::io;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use hyper_util::rt::{TokioExecutor, TokioIo, TokioTimer};
use hyper_util::server::conn::auto::Builder;
use hyper_util::server::graceful::GracefulShutdown;
use hyper_util::service::TowerToHyperService;
use tokio::net::TcpListener;
use tokio::task::{JoinHandle, JoinSet};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::api::{create_router, AppState};
use crate::cache::CacheStore;
use crate::config::ServerConfig;
use crate::error::ServerError;
use crate::rotation::RotationStrategy;
use crate::tasks::{RefreshScheduler, SchedulerHandle};

/// Pause after an accept error that is not tied to a single connection
/// (e.g. file descriptor exhaustion) before accepting again.
const ACCEPT_ERROR_BACKOFF: Duration = Duration::from_secs(1);

// == Server ==
/// Ties the cache, its refresh scheduler and the HTTP listener together.
pub struct Server {
    config: Arc<ServerConfig>,
    cache: Arc<CacheStore>,
    strategy: Arc<dyn RotationStrategy>,
}

impl Server {
    pub fn new(
        config: Arc<ServerConfig>,
        cache: Arc<CacheStore>,
        strategy: Arc<dyn RotationStrategy>,
    ) -> Self {
        Self {
            config,
            cache,
            strategy,
        }
    }

    /// Runs the service until `shutdown` resolves.
    ///
    /// # Startup
    /// 1. Cold-start cache rotation, then periodic refresh in the background
    /// 2. Bind `host:port` (skipped when the port is `0`)
    /// 3. Accept connections
    ///
    /// # Shutdown
    /// 1. Keep serving for the readiness grace window (skipped at debug log level)
    /// 2. Stop accepting new connections
    /// 3. Drain in-flight requests within `http_server_shutdown_timeout`,
    ///    abandoning whatever is still running at the deadline
    /// 4. Stop the refresh scheduler
    ///
    /// # Errors
    /// A bind failure, or the listener dying before shutdown was requested.
    pub async fn listen_and_serve<F>(self, shutdown: F) -> Result<(), ServerError>
    where
        F: Future<Output = ()> + Send,
    {
        let scheduler = self.start_scheduler().await;
        let listener = match self.bind().await {
            Ok(listener) => listener,
            Err(e) => {
                scheduler.stop().await;
                return Err(e);
            }
        };
        self.run(scheduler, listener, shutdown).await
    }

    /// Like [`Server::listen_and_serve`] but on an already bound listener.
    pub async fn serve<F>(self, listener: TcpListener, shutdown: F) -> Result<(), ServerError>
    where
        F: Future<Output = ()> + Send,
    {
        let scheduler = self.start_scheduler().await;
        self.run(scheduler, Some(listener), shutdown).await
    }

    async fn start_scheduler(&self) -> SchedulerHandle {
        RefreshScheduler::new(
            self.cache.clone(),
            self.strategy.clone(),
            self.config.rotation_interval,
        )
        .start()
        .await
    }

    /// Binds the configured address, or returns `None` when the listener is disabled.
    async fn bind(&self) -> Result<Option<TcpListener>, ServerError> {
        if self.config.listener_disabled() {
            info!("HTTP listener disabled (port 0)");
            return Ok(None);
        }

        let addr = self.config.addr();
        let bound = TcpListener::bind(addr.as_str()).await;
        bound
            .map(Some)
            .map_err(|source| ServerError::Bind { addr, source })
    }

    async fn run<F>(
        self,
        scheduler: SchedulerHandle,
        listener: Option<TcpListener>,
        shutdown: F,
    ) -> Result<(), ServerError>
    where
        F: Future<Output = ()> + Send,
    {
        let Some(listener) = listener else {
            shutdown.await;
            info!("Shutdown signal received");
            scheduler.stop().await;
            return Ok(());
        };

        let app = create_router(AppState::new(self.cache.clone(), self.config.clone()));
        let settings = ConnectionSettings::from_config(&self.config);
        let mut listener = ListenerTask::spawn(listener, app, settings);
        info!(
            addr = %listener.display_addr(),
            hostname = %self.config.hostname,
            h2c = settings.h2c,
            "Starting HTTP server"
        );

        tokio::pin!(shutdown);
        tokio::select! {
            _ = &mut shutdown => {}
            crash = listener.crashed() => {
                scheduler.stop().await;
                return Err(crash);
            }
        }

        let timeout = self.config.http_server_shutdown_timeout;
        info!(
            timeout_secs = timeout.as_secs_f64(),
            "Shutting down HTTP server"
        );

        // Give the load balancer time to notice the failing readiness probe
        let grace = if self.config.is_debug() {
            Duration::ZERO
        } else {
            self.config.shutdown_grace
        };

        match listener.shutdown(grace, timeout).await {
            DrainOutcome::Drained => info!("All in-flight requests completed"),
            DrainOutcome::TimedOut { abandoned } => {
                warn!(abandoned, "HTTP server graceful shutdown timed out")
            }
            DrainOutcome::Failed(e) => warn!(error = %e, "HTTP server graceful shutdown failed"),
        }

        scheduler.stop().await;
        Ok(())
    }
}

// == Connection Settings ==
/// Protocol options applied to every accepted connection.
#[derive(Debug, Clone, Copy)]
pub(crate) struct ConnectionSettings {
    /// Also serve HTTP/2 with prior knowledge
    pub(crate) h2c: bool,
    /// How long a client may take to send a complete request head
    pub(crate) header_read_timeout: Duration,
    /// HTTP/2 keep-alive ping interval; an unanswered ping closes the connection
    pub(crate) keep_alive_interval: Duration,
}

impl ConnectionSettings {
    pub(crate) fn from_config(config: &ServerConfig) -> Self {
        Self {
            h2c: config.h2c,
            header_read_timeout: config.http_server_timeout,
            keep_alive_interval: config.http_server_timeout * 2,
        }
    }

    fn builder(&self) -> Builder<TokioExecutor> {
        let mut builder = Builder::new(TokioExecutor::new());
        builder
            .http1()
            .timer(TokioTimer::new())
            .header_read_timeout(self.header_read_timeout);
        builder
            .http2()
            .timer(TokioTimer::new())
            .keep_alive_interval(self.keep_alive_interval)
            .keep_alive_timeout(self.header_read_timeout);

        if self.h2c {
            builder
        } else {
            builder.http1_only()
        }
    }
}

// == Drain Outcome ==
/// Result of draining connections at shutdown.
#[derive(Debug)]
pub enum DrainOutcome {
    /// Every connection finished within the deadline
    Drained,
    /// The deadline passed; remaining connections were dropped
    TimedOut { abandoned: usize },
    /// The accept loop had already failed
    Failed(ServerError),
}

struct Connections {
    graceful: GracefulShutdown,
    tasks: JoinSet<()>,
}

// == Listener Task ==
/// Accept loop running in the background, with the handles needed to stop it.
pub(crate) struct ListenerTask {
    addr: Option<SocketAddr>,
    stop: CancellationToken,
    task: JoinHandle<Connections>,
}

impl ListenerTask {
    pub(crate) fn spawn(listener: TcpListener, app: Router, settings: ConnectionSettings) -> Self {
        let addr = listener.local_addr().ok();
        let stop = CancellationToken::new();
        let task = tokio::spawn(accept_loop(listener, app, settings, stop.clone()));
        Self { addr, stop, task }
    }

    fn display_addr(&self) -> String {
        self.addr
            .map(|addr| addr.to_string())
            .unwrap_or_else(|| "unknown".to_string())
    }

    /// Resolves only if the accept loop ends on its own.
    async fn crashed(&mut self) -> ServerError {
        let reason = match (&mut self.task).await {
            Ok(_) => "accept loop exited unexpectedly".to_string(),
            Err(e) => e.to_string(),
        };
        ServerError::ListenerCrashed(reason)
    }

    /// Keeps accepting for `grace`, then closes the listener and drains for at
    /// most `timeout`.
    pub(crate) async fn shutdown(self, grace: Duration, timeout: Duration) -> DrainOutcome {
        if !grace.is_zero() {
            info!(
                grace_secs = grace.as_secs_f64(),
                "Waiting for readiness probes before closing the listener"
            );
            tokio::time::sleep(grace).await;
        }

        self.stop.cancel();
        let Connections {
            graceful,
            mut tasks,
        } = match self.task.await {
            Ok(connections) => connections,
            Err(e) => return DrainOutcome::Failed(ServerError::ListenerCrashed(e.to_string())),
        };
        debug!("Stopped accepting connections");

        if tokio::time::timeout(timeout, graceful.shutdown()).await.is_ok() {
            return DrainOutcome::Drained;
        }

        tasks.abort_all();
        let mut abandoned = 0;
        while let Some(result) = tasks.join_next().await {
            if matches!(result, Err(e) if e.is_cancelled()) {
                abandoned += 1;
            }
        }
        DrainOutcome::TimedOut { abandoned }
    }
}

async fn accept_loop(
    listener: TcpListener,
    app: Router,
    settings: ConnectionSettings,
    stop: CancellationToken,
) -> Connections {
    let builder = settings.builder();
    let graceful = GracefulShutdown::new();
    let mut tasks = JoinSet::new();

    loop {
        tokio::select! {
            biased;
            _ = stop.cancelled() => break,
            Some(_) = tasks.join_next(), if !tasks.is_empty() => {}
            accepted = listener.accept() => {
                let (stream, peer) = match accepted {
                    Ok(conn) => conn,
                    Err(e) => match accept_retry_delay(&e) {
                        None => {
                            debug!(error = %e, "Connection failed during accept");
                            continue;
                        }
                        Some(delay) => {
                            warn!(error = %e, retry_ms = delay.as_millis() as u64, "Accept failed");
                            tokio::select! {
                                _ = stop.cancelled() => break,
                                _ = tokio::time::sleep(delay) => {}
                            }
                            continue;
                        }
                    },
                };

                let io = TokioIo::new(stream);
                let service = TowerToHyperService::new(app.clone());
                if settings.h2c {
                    let conn = builder.serve_connection_with_upgrades(io, service).into_owned();
                    track(&mut tasks, graceful.watch(conn), peer);
                } else {
                    // Only this path honors `http1_only`
                    let conn = builder.serve_connection(io, service).into_owned();
                    track(&mut tasks, graceful.watch(conn), peer);
                }
            }
        }
    }

    // Dropping the listener refuses new connections from here on
    drop(listener);
    Connections { graceful, tasks }
}

fn track<C, E>(tasks: &mut JoinSet<()>, conn: C, peer: SocketAddr)
where
    C: Future<Output = Result<(), E>> + Send + 'static,
    E: Display,
{
    tasks.spawn(async move {
        if let Err(e) = conn.await {
            debug!(peer = %peer, error = %e, "Connection ended with error");
        }
    });
}

/// `None` when the error only concerns the connection being accepted, otherwise
/// how long to wait before accepting again.
fn accept_retry_delay(e: &io::Error) -> Option<Duration> {
    match e.kind() {
        io::ErrorKind::ConnectionAborted
        | io::ErrorKind::ConnectionReset
        | io::ErrorKind::ConnectionRefused
        | io::ErrorKind::Interrupted
        | io::ErrorKind::WouldBlock
        | io::ErrorKind::TimedOut => None,
        _ => Some(ACCEPT_ERROR_BACKOFF),
    }
}
