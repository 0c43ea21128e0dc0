// Server loop module
// Accepts connections until a shutdown signal arrives, then drains them

use std::future::Future;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;

use tokio::net::TcpListener;

use super::connection::{accept_connection, ConnectionContext};
use crate::config::AppState;
use crate::logger;

/// Run the accept loop until `shutdown` resolves.
///
/// After the signal, open connections are asked to close once their current
/// request is answered, and the call waits up to `drain_timeout` for them.
/// Anything still running after that is aborted when the runtime stops.
pub async fn run<S>(
    listener: TcpListener,
    state: Arc<AppState>,
    shutdown: S,
    drain_timeout: Duration,
) -> Result<(), Box<dyn std::error::Error>>
where
    S: Future<Output = ()>,
{
    let ctx = ConnectionContext::new();
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            accept_result = listener.accept() => {
                match accept_result {
                    Ok((stream, peer_addr)) => {
                        accept_connection(stream, peer_addr, &state, &ctx);
                    }
                    Err(e) => {
                        logger::log_error(&format!("Failed to accept connection: {e}"));
                    }
                }
            }

            () = &mut shutdown => break,
        }
    }

    drop(listener);
    tracing::info!(
        active = ctx.counter.load(Ordering::SeqCst),
        "Shutdown requested, draining connections"
    );
    ctx.shutdown.cancel();
    ctx.tracker.close();

    if tokio::time::timeout(drain_timeout, ctx.tracker.wait()).await.is_err() {
        tracing::warn!(
            remaining = ctx.counter.load(Ordering::SeqCst),
            "Drain timeout after {} seconds, aborting remaining connections",
            drain_timeout.as_secs()
        );
    }
    Ok(())
}
