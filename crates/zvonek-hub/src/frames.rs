//! # Frame Multiplexer
//!
//! Shares one camera acquisition session among any number of concurrent
//! stream consumers.
//!
//! ## Session Lifecycle
//!
//! - The first [`FrameMultiplexer::subscribe_frames`] call starts a session:
//!   a task that paces captures and fans frames out over a `broadcast`
//!   channel.
//! - Later subscribers join the running session.
//! - When the last consumer drops its stream, the acquisition task notices
//!   on its next tick and stops.
//! - A transient capture error (one bad frame) is skipped; consumers simply
//!   wait for the next frame.
//! - The camera going away, a capture task panic, or too many consecutive
//!   capture errors is an upstream failure. It ends every stream on that
//!   session, since they all share the one camera. The next subscriber
//!   starts a fresh session.
//!
//! Whether a session is running and whether a consumer may join it are
//! decided under one mutex, so a subscriber can never attach to a session
//! that is already winding down.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use futures::stream::{self, BoxStream, StreamExt};
use parking_lot::Mutex;
use tokio::sync::broadcast;
use tokio::sync::broadcast::error::RecvError;
use tokio::time::MissedTickBehavior;

use crate::camera::{CameraError, EncodedFrame, FrameSource};

/// Multiplexer tuning.
#[derive(Debug, Clone)]
pub struct MultiplexerConfig {
    /// Pause between captures.
    pub frame_interval: Duration,
    /// Frames buffered per consumer before the slowest one starts skipping.
    pub buffer: usize,
    /// Consecutive transient capture errors tolerated before the session
    /// is treated as failed.
    pub max_consecutive_failures: u32,
}

impl Default for MultiplexerConfig {
    fn default() -> Self {
        Self {
            frame_interval: Duration::from_millis(33),
            buffer: 4,
            max_consecutive_failures: 5,
        }
    }
}

#[derive(Debug, Clone)]
enum FramePacket {
    Frame(EncodedFrame),
    Ended,
}

struct Session {
    generation: u64,
    tx: broadcast::Sender<FramePacket>,
}

struct MuxInner {
    source: Arc<dyn FrameSource>,
    config: MultiplexerConfig,
    session: Mutex<Option<Session>>,
    sessions_started: AtomicU64,
}

impl MuxInner {
    /// Clear the session slot if it still belongs to `generation`.
    fn retire(&self, generation: u64) {
        let mut slot = self.session.lock();
        if slot.as_ref().map(|s| s.generation) == Some(generation) {
            *slot = None;
        }
    }
}

/// Fan-out of one camera to many stream consumers.
#[derive(Clone)]
pub struct FrameMultiplexer {
    inner: Arc<MuxInner>,
}

impl std::fmt::Debug for FrameMultiplexer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FrameMultiplexer")
            .field("source", &self.inner.source.name())
            .field("config", &self.inner.config)
            .field("active", &self.is_active())
            .finish()
    }
}

impl FrameMultiplexer {
    /// Multiplex frames from `source`.
    pub fn new(source: Arc<dyn FrameSource>, config: MultiplexerConfig) -> Self {
        Self {
            inner: Arc::new(MuxInner {
                source,
                config,
                session: Mutex::new(None),
                sessions_started: AtomicU64::new(0),
            }),
        }
    }

    /// Open a frame stream, starting acquisition if none is running.
    ///
    /// Must be called from within a Tokio runtime. The stream ends when the
    /// camera fails; consumers that fall behind skip frames rather than
    /// slowing the others down.
    pub fn subscribe_frames(&self) -> BoxStream<'static, EncodedFrame> {
        let rx = {
            let mut slot = self.inner.session.lock();
            match slot.as_ref() {
                Some(session) => session.tx.subscribe(),
                None => {
                    let generation = self.inner.sessions_started.fetch_add(1, Ordering::SeqCst) + 1;
                    let (tx, rx) = broadcast::channel(self.inner.config.buffer.max(1));
                    *slot = Some(Session {
                        generation,
                        tx: tx.clone(),
                    });
                    tracing::info!(
                        generation,
                        source = self.inner.source.name(),
                        "camera session started"
                    );
                    tokio::spawn(acquire(Arc::clone(&self.inner), generation, tx));
                    rx
                }
            }
        };

        stream::unfold(rx, |mut rx| async move {
            loop {
                match rx.recv().await {
                    Ok(FramePacket::Frame(frame)) => return Some((frame, rx)),
                    Ok(FramePacket::Ended) | Err(RecvError::Closed) => return None,
                    Err(RecvError::Lagged(skipped)) => {
                        tracing::debug!(skipped, "frame consumer lagging; skipping frames");
                    }
                }
            }
        })
        .boxed()
    }

    /// Whether an acquisition session is running.
    pub fn is_active(&self) -> bool {
        self.inner.session.lock().is_some()
    }

    /// Sessions started since creation.
    pub fn sessions_started(&self) -> u64 {
        self.inner.sessions_started.load(Ordering::SeqCst)
    }
}

async fn acquire(inner: Arc<MuxInner>, generation: u64, tx: broadcast::Sender<FramePacket>) {
    let mut ticker = tokio::time::interval(inner.config.frame_interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let mut frames: u64 = 0;
    let mut consecutive_failures: u32 = 0;

    loop {
        ticker.tick().await;

        {
            let mut slot = inner.session.lock();
            if tx.receiver_count() == 0 {
                if slot.as_ref().map(|s| s.generation) == Some(generation) {
                    *slot = None;
                }
                tracing::info!(generation, frames, "camera session idle; stopped");
                return;
            }
        }

        let source = Arc::clone(&inner.source);
        let failure = match tokio::task::spawn_blocking(move || source.capture()).await {
            Ok(Ok(frame)) => {
                frames += 1;
                consecutive_failures = 0;
                // No receivers left is handled on the next tick.
                let _ = tx.send(FramePacket::Frame(frame));
                continue;
            }
            Ok(Err(CameraError::Unavailable(reason))) => format!("camera unavailable: {reason}"),
            Ok(Err(err)) => {
                consecutive_failures += 1;
                if consecutive_failures <= inner.config.max_consecutive_failures {
                    tracing::warn!(generation, consecutive_failures, error = %err, "frame capture failed; skipping frame");
                    continue;
                }
                format!("{consecutive_failures} consecutive capture failures, last: {err}")
            }
            Err(join) => format!("capture task aborted: {join}"),
        };

        tracing::error!(generation, frames, error = %failure, "camera failed; ending streams");
        inner.retire(generation);
        let _ = tx.send(FramePacket::Ended);
        return;
    }
}
