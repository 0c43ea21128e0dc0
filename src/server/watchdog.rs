// Connection watchdog module
// Tracks socket traffic so a connection is closed when it stalls, not when a
// fixed wall-clock budget runs out

use std::io;
use std::pin::Pin;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::task::{Context, Poll};
use std::time::Duration;

use tokio::io::{AsyncRead, AsyncWrite, ReadBuf};
use tokio::time::Instant;

use crate::config::PerformanceConfig;

const NOT_BLOCKED: u64 = u64::MAX;

/// Why a connection was judged stalled
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stall {
    /// No bytes moved in either direction for the idle limit
    Idle,
    /// A single write stayed pending past the write limit
    Write,
}

/// Stall limits derived from `performance`; `None` disables a check
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StallLimits {
    pub idle: Option<Duration>,
    pub write: Option<Duration>,
}

impl StallLimits {
    /// `keep_alive_timeout` bounds idle time; with keep-alive disabled the
    /// read timeout takes over so silent connections are still reaped.
    pub fn from_config(performance: &PerformanceConfig) -> Self {
        let secs = |s: u64| (s > 0).then(|| Duration::from_secs(s));
        Self {
            idle: secs(performance.keep_alive_timeout).or_else(|| secs(performance.read_timeout)),
            write: secs(performance.write_timeout),
        }
    }
}

/// Traffic timestamps for one connection, in milliseconds since accept
#[derive(Debug)]
pub struct Activity {
    origin: Instant,
    last_io: AtomicU64,
    write_blocked_since: AtomicU64,
}

impl Activity {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
            last_io: AtomicU64::new(0),
            write_blocked_since: AtomicU64::new(NOT_BLOCKED),
        }
    }

    fn now_ms(&self) -> u64 {
        u64::try_from(self.origin.elapsed().as_millis()).unwrap_or(NOT_BLOCKED - 1)
    }

    fn touch(&self) {
        self.last_io.store(self.now_ms(), Ordering::Relaxed);
    }

    fn write_blocked(&self) {
        // Keep the first timestamp of a run of pending polls
        let _ = self.write_blocked_since.compare_exchange(
            NOT_BLOCKED,
            self.now_ms(),
            Ordering::Relaxed,
            Ordering::Relaxed,
        );
    }

    fn write_unblocked(&self) {
        self.write_blocked_since.store(NOT_BLOCKED, Ordering::Relaxed);
    }

    /// Report a stall, if any limit has been exceeded
    pub fn check(&self, limits: &StallLimits) -> Option<Stall> {
        let now = self.now_ms();
        let exceeded = |since: u64, limit: Duration| {
            u128::from(now.saturating_sub(since)) >= limit.as_millis()
        };

        let blocked = self.write_blocked_since.load(Ordering::Relaxed);
        if blocked != NOT_BLOCKED && limits.write.is_some_and(|limit| exceeded(blocked, limit)) {
            return Some(Stall::Write);
        }
        let last_io = self.last_io.load(Ordering::Relaxed);
        if limits.idle.is_some_and(|limit| exceeded(last_io, limit)) {
            return Some(Stall::Idle);
        }
        None
    }
}

impl Default for Activity {
    fn default() -> Self {
        Self::new()
    }
}

/// Socket wrapper that reports every transfer to an [`Activity`]
#[derive(Debug)]
pub struct TrackedStream<S> {
    inner: S,
    activity: Arc<Activity>,
}

impl<S> TrackedStream<S> {
    pub const fn new(inner: S, activity: Arc<Activity>) -> Self {
        Self { inner, activity }
    }

    fn on_write(&self, poll: &Poll<io::Result<usize>>) {
        match poll {
            Poll::Pending => self.activity.write_blocked(),
            Poll::Ready(result) => {
                self.activity.write_unblocked();
                if matches!(result, Ok(n) if *n > 0) {
                    self.activity.touch();
                }
            }
        }
    }
}

impl<S: AsyncRead + Unpin> AsyncRead for TrackedStream<S> {
    fn poll_read(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        let this = self.get_mut();
        let before = buf.filled().len();
        let poll = Pin::new(&mut this.inner).poll_read(cx, buf);
        if matches!(poll, Poll::Ready(Ok(()))) && buf.filled().len() > before {
            this.activity.touch();
        }
        poll
    }
}

impl<S: AsyncWrite + Unpin> AsyncWrite for TrackedStream<S> {
    fn poll_write(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &[u8],
    ) -> Poll<io::Result<usize>> {
        let this = self.get_mut();
        let poll = Pin::new(&mut this.inner).poll_write(cx, buf);
        this.on_write(&poll);
        poll
    }

    fn poll_write_vectored(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        bufs: &[io::IoSlice<'_>],
    ) -> Poll<io::Result<usize>> {
        let this = self.get_mut();
        let poll = Pin::new(&mut this.inner).poll_write_vectored(cx, bufs);
        this.on_write(&poll);
        poll
    }

    fn is_write_vectored(&self) -> bool {
        self.inner.is_write_vectored()
    }

    fn poll_flush(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Pin::new(&mut self.get_mut().inner).poll_flush(cx)
    }

    fn poll_shutdown(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Pin::new(&mut self.get_mut().inner).poll_shutdown(cx)
    }
}
