//! Mock [`FeedStream`] implementations for testing.
//!
//! Three mock feed types for different testing needs:
//!
//! - [`ScriptedFeed`] — Pre-loaded connect/send results and frames.
//!   Best for: error handling, reconnection logic, retry behavior.
//!
//! - [`SilentFeed`] — Connects fine, then never yields a frame.
//!   Best for: staleness and keepalive behavior.
//!
//! - [`ChannelFeed`] — Channel-backed feed with external control handle.
//!   Best for: integration tests needing precise, on-demand frame delivery.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::error::Result;
use crate::feed::stream::{FeedFrame, FeedStream};

// ---------------------------------------------------------------------------
// ScriptedFeed
// ---------------------------------------------------------------------------

/// A mock feed with scripted connect/send results and a fixed frame queue.
///
/// Each call to `connect()` or `send()` pops the next result from the
/// corresponding queue (defaults to `Ok(())` when exhausted).
pub struct ScriptedFeed {
    connect_results: VecDeque<Result<()>>,
    send_results: VecDeque<Result<()>>,
    frames: VecDeque<Option<FeedFrame>>,
    connect_count: Arc<AtomicU32>,
    send_count: Arc<AtomicU32>,
    sent_frames: Arc<Mutex<Vec<String>>>,
}

impl ScriptedFeed {
    #[must_use]
    pub fn new() -> Self {
        Self {
            connect_results: VecDeque::new(),
            send_results: VecDeque::new(),
            frames: VecDeque::new(),
            connect_count: Arc::new(AtomicU32::new(0)),
            send_count: Arc::new(AtomicU32::new(0)),
            sent_frames: Arc::new(Mutex::new(Vec::new())),
        }
    }

    #[must_use]
    pub fn with_connect_results(mut self, results: Vec<Result<()>>) -> Self {
        self.connect_results = results.into();
        self
    }

    #[must_use]
    pub fn with_send_results(mut self, results: Vec<Result<()>>) -> Self {
        self.send_results = results.into();
        self
    }

    #[must_use]
    pub fn with_frames(mut self, frames: Vec<Option<FeedFrame>>) -> Self {
        self.frames = frames.into();
        self
    }

    /// Shared counters for asserting connect/send call counts.
    #[must_use]
    pub fn counts(&self) -> (Arc<AtomicU32>, Arc<AtomicU32>) {
        (self.connect_count.clone(), self.send_count.clone())
    }

    /// Every control frame sent so far.
    #[must_use]
    pub fn sent_frames(&self) -> Arc<Mutex<Vec<String>>> {
        self.sent_frames.clone()
    }

    #[must_use]
    pub fn connect_count(&self) -> u32 {
        self.connect_count.load(Ordering::SeqCst)
    }
}

impl Default for ScriptedFeed {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl FeedStream for ScriptedFeed {
    async fn connect(&mut self) -> Result<()> {
        self.connect_count.fetch_add(1, Ordering::SeqCst);
        self.connect_results.pop_front().unwrap_or(Ok(()))
    }

    async fn send(&mut self, frame: &str) -> Result<()> {
        self.send_count.fetch_add(1, Ordering::SeqCst);
        self.sent_frames.lock().push(frame.to_string());
        self.send_results.pop_front().unwrap_or(Ok(()))
    }

    async fn next_frame(&mut self) -> Option<FeedFrame> {
        self.frames.pop_front().flatten()
    }

    async fn ping(&mut self) -> Result<()> {
        Ok(())
    }

    fn venue_name(&self) -> &str {
        "mock"
    }
}

// ---------------------------------------------------------------------------
// SilentFeed
// ---------------------------------------------------------------------------

/// A mock feed that connects successfully but never yields a frame.
///
/// The session stays alive (not closed), it just produces nothing — ideal
/// for staleness detection tests.
pub struct SilentFeed {
    connect_count: Arc<AtomicU32>,
}

impl SilentFeed {
    #[must_use]
    pub fn new(connect_count: Arc<AtomicU32>) -> Self {
        Self { connect_count }
    }
}

#[async_trait]
impl FeedStream for SilentFeed {
    async fn connect(&mut self) -> Result<()> {
        self.connect_count.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn send(&mut self, _frame: &str) -> Result<()> {
        Ok(())
    }

    async fn next_frame(&mut self) -> Option<FeedFrame> {
        // Session stays alive but silent.
        std::future::pending().await
    }

    async fn ping(&mut self) -> Result<()> {
        Ok(())
    }

    fn venue_name(&self) -> &str {
        "mock"
    }
}

// ---------------------------------------------------------------------------
// ChannelFeed
// ---------------------------------------------------------------------------

/// A mock feed controlled externally via a [`ChannelFeedHandle`].
///
/// Frames are sent into the handle and read by the pipeline via
/// `next_frame()`. No real network I/O.
pub struct ChannelFeed {
    frame_rx: tokio::sync::mpsc::Receiver<Option<FeedFrame>>,
    connect_count: Arc<AtomicU32>,
    sent_frames: Arc<Mutex<Vec<String>>>,
}

/// Control handle for a [`ChannelFeed`].
#[derive(Clone)]
pub struct ChannelFeedHandle {
    frame_tx: tokio::sync::mpsc::Sender<Option<FeedFrame>>,
    connect_count: Arc<AtomicU32>,
    sent_frames: Arc<Mutex<Vec<String>>>,
}

impl ChannelFeedHandle {
    /// Deliver a text payload to the pipeline.
    pub async fn send_text(&self, payload: impl Into<String>) {
        let _ = self
            .frame_tx
            .send(Some(FeedFrame::Text(payload.into())))
            .await;
    }

    /// Close the session (pipeline sees `Closed` and schedules a retry).
    pub async fn close(&self, reason: impl Into<String>) {
        let _ = self
            .frame_tx
            .send(Some(FeedFrame::Closed {
                reason: reason.into(),
            }))
            .await;
    }

    /// How many times `connect()` was called.
    #[must_use]
    pub fn connect_count(&self) -> u32 {
        self.connect_count.load(Ordering::SeqCst)
    }

    /// Control frames the pipeline sent (subscriptions).
    #[must_use]
    pub fn sent_frames(&self) -> Vec<String> {
        self.sent_frames.lock().clone()
    }
}

/// Create a [`ChannelFeed`] and its control [`ChannelFeedHandle`].
#[must_use]
pub fn channel_feed(buffer: usize) -> (ChannelFeed, ChannelFeedHandle) {
    let (tx, rx) = tokio::sync::mpsc::channel(buffer);
    let connect_count = Arc::new(AtomicU32::new(0));
    let sent_frames = Arc::new(Mutex::new(Vec::new()));
    (
        ChannelFeed {
            frame_rx: rx,
            connect_count: connect_count.clone(),
            sent_frames: sent_frames.clone(),
        },
        ChannelFeedHandle {
            frame_tx: tx,
            connect_count,
            sent_frames,
        },
    )
}

#[async_trait]
impl FeedStream for ChannelFeed {
    async fn connect(&mut self) -> Result<()> {
        self.connect_count.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn send(&mut self, frame: &str) -> Result<()> {
        self.sent_frames.lock().push(frame.to_string());
        Ok(())
    }

    async fn next_frame(&mut self) -> Option<FeedFrame> {
        match self.frame_rx.recv().await {
            Some(Some(frame)) => Some(frame),
            Some(None) | None => None,
        }
    }

    async fn ping(&mut self) -> Result<()> {
        Ok(())
    }

    fn venue_name(&self) -> &str {
        "mock"
    }
}
