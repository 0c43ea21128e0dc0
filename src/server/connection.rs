// Connection handling module
// Accepts a single TCP connection and serves it on its own task

use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use hyper::body::Incoming;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::Request;
use hyper_util::rt::{TokioIo, TokioTimer};
use tokio::net::TcpStream;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;

use super::watchdog::{Activity, StallLimits, TrackedStream};
use crate::config::AppState;
use crate::handler;
use crate::http::boxed_request_body;
use crate::logger;

/// How often the watchdog samples connection traffic
const WATCHDOG_TICK: Duration = Duration::from_millis(250);

/// Shared handles every connection task needs besides the app state
#[derive(Debug, Clone)]
pub struct ConnectionContext {
    pub counter: Arc<AtomicUsize>,
    pub tracker: TaskTracker,
    pub shutdown: CancellationToken,
}

impl ConnectionContext {
    pub fn new() -> Self {
        Self {
            counter: Arc::new(AtomicUsize::new(0)),
            tracker: TaskTracker::new(),
            shutdown: CancellationToken::new(),
        }
    }
}

impl Default for ConnectionContext {
    fn default() -> Self {
        Self::new()
    }
}

/// Accept a connection, enforcing `performance.max_connections`.
///
/// Over the limit the stream is dropped without a response.
pub fn accept_connection(
    stream: TcpStream,
    peer_addr: SocketAddr,
    state: &Arc<AppState>,
    ctx: &ConnectionContext,
) {
    // Increment first, then check, so two racing accepts cannot both slip in
    let prev_count = ctx.counter.fetch_add(1, Ordering::SeqCst);

    if let Some(max_conn) = state.config.performance.max_connections {
        if prev_count >= usize::try_from(max_conn).unwrap_or(usize::MAX) {
            ctx.counter.fetch_sub(1, Ordering::SeqCst);
            tracing::warn!(
                peer = %peer_addr,
                "Max connections reached: {prev_count}/{max_conn}. Connection rejected."
            );
            drop(stream);
            return;
        }
    }

    tracing::debug!(peer = %peer_addr, "accepted connection");
    handle_connection(stream, peer_addr, Arc::clone(state), ctx.clone());
}

/// Serve one connection on a task owned by the context's tracker.
///
/// - `read_timeout` bounds how long a request head may take to arrive.
/// - `keep_alive_timeout` closes the connection once no bytes have moved for
///   that long (`0` disables keep-alive).
/// - `write_timeout` closes it when a single write stays blocked that long.
///
/// A slow transfer that keeps making progress is never cut off. On shutdown
/// the connection finishes its in-flight request and then closes.
fn handle_connection(
    stream: TcpStream,
    peer_addr: SocketAddr,
    state: Arc<AppState>,
    ctx: ConnectionContext,
) {
    ctx.tracker.clone().spawn(async move {
        let activity = Arc::new(Activity::new());
        let io = TokioIo::new(TrackedStream::new(stream, Arc::clone(&activity)));

        let performance = &state.config.performance;
        let limits = StallLimits::from_config(performance);

        let mut builder = http1::Builder::new();
        builder
            .timer(TokioTimer::new())
            .keep_alive(performance.keep_alive_timeout > 0);
        if performance.read_timeout > 0 {
            builder.header_read_timeout(Duration::from_secs(performance.read_timeout));
        }

        let service_state = Arc::clone(&state);
        let conn = builder.serve_connection(
            io,
            service_fn(move |req: Request<Incoming>| {
                handler::handle_request(
                    req.map(boxed_request_body),
                    Arc::clone(&service_state),
                    peer_addr,
                )
            }),
        );
        tokio::pin!(conn);

        let mut watchdog = tokio::time::interval(WATCHDOG_TICK);
        let mut draining = false;
        loop {
            tokio::select! {
                result = conn.as_mut() => {
                    if let Err(err) = result {
                        logger::log_connection_error(&err);
                    }
                    break;
                }
                () = ctx.shutdown.cancelled(), if !draining => {
                    draining = true;
                    conn.as_mut().graceful_shutdown();
                }
                _ = watchdog.tick() => {
                    if let Some(stall) = activity.check(&limits) {
                        tracing::warn!(peer = %peer_addr, ?stall, "Closing stalled connection");
                        break;
                    }
                }
            }
        }

        ctx.counter.fetch_sub(1, Ordering::SeqCst);
    });
}
