//! Per-venue ingestion pipeline.
//!
//! One tokio task per venue owns exactly one feed session and one set of
//! in-memory candle/backoff state. Retry waits are a `select!` between the
//! delay timer and the command channel, so shutdown or a forced reconnect
//! cancels a pending retry deterministically instead of waiting for the
//! next tick.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{interval, sleep, MissedTickBehavior};
use tracing::{error, info, warn};

use super::adapter::VenueAdapter;
use super::candles::CandleAggregator;
use super::normalize::normalize;
use super::reconnect::{Decision, ReconnectPolicy};
use super::stream::{FeedFrame, FeedStream};
use crate::bus::TradePublisher;
use crate::config::ReconnectionConfig;
use crate::domain::{Venue, VenueId};
use crate::health::HealthState;
use crate::store::{CandleStore, TradeStore};

/// Operator commands a running pipeline honors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineCommand {
    /// Reconnect immediately, regardless of backoff state. Also restarts a
    /// venue that tripped dead.
    ForceReconnect,
    /// Stop streaming and park until enabled again.
    Disable,
    /// Resume a disabled or dead venue.
    Enable,
    /// Flush and stop for good.
    Shutdown,
}

/// Handle to a spawned pipeline task.
pub struct PipelineHandle {
    venue: VenueId,
    commands: mpsc::Sender<PipelineCommand>,
    join: JoinHandle<()>,
}

impl PipelineHandle {
    #[must_use]
    pub fn venue(&self) -> &VenueId {
        &self.venue
    }

    /// Clone of the command sender, for the control-plane dispatcher.
    #[must_use]
    pub fn commands(&self) -> mpsc::Sender<PipelineCommand> {
        self.commands.clone()
    }

    /// Send a command. Errors (task already gone) are swallowed: commands
    /// are best-effort operator signals.
    pub async fn send(&self, command: PipelineCommand) {
        let _ = self.commands.send(command).await;
    }

    /// Request shutdown and wait for the task to flush and exit.
    pub async fn shutdown(self) {
        let _ = self.commands.send(PipelineCommand::Shutdown).await;
        let _ = self.join.await;
    }
}

/// Composition root for one venue:
/// feed -> normalize -> {candles, store, bus}.
pub struct IngestPipeline {
    pub venue: Venue,
    pub adapter: Box<dyn VenueAdapter>,
    pub feed: Box<dyn FeedStream>,
    pub trades: Arc<dyn TradeStore>,
    pub candles: Arc<dyn CandleStore>,
    pub publisher: TradePublisher,
    pub health: Arc<HealthState>,
    pub reconnection: ReconnectionConfig,
}

impl IngestPipeline {
    /// Spawn the pipeline task and return its handle.
    #[must_use]
    pub fn spawn(self) -> PipelineHandle {
        let (tx, rx) = mpsc::channel(16);
        let venue = self.venue.id.clone();
        let join = tokio::spawn(run(self, rx));
        PipelineHandle {
            venue,
            commands: tx,
            join,
        }
    }
}

/// How one feed session ended.
enum SessionEnd {
    /// Socket closed, errored, or never connected: backoff applies.
    Lost(String),
    /// Operator asked for an immediate reconnect.
    ForceReconnect,
    /// Operator disabled the venue.
    Disabled,
    /// Process shutdown.
    Shutdown,
}

async fn run(pipeline: IngestPipeline, mut commands: mpsc::Receiver<PipelineCommand>) {
    let IngestPipeline {
        venue,
        adapter,
        mut feed,
        trades,
        candles,
        publisher,
        health,
        reconnection,
    } = pipeline;

    let mut aggregator = CandleAggregator::new(venue.candle_interval_secs);
    let mut policy = ReconnectPolicy::new(reconnection.clone());
    let mut running = venue.enabled;

    if !running {
        info!(venue = %venue.id, "pipeline starting disabled");
    }

    'lifecycle: loop {
        // Parked: disabled, or dead after a trip. Only an operator command
        // gets us out.
        while !running {
            match commands.recv().await {
                None | Some(PipelineCommand::Shutdown) => break 'lifecycle,
                Some(PipelineCommand::Enable) | Some(PipelineCommand::ForceReconnect) => {
                    info!(venue = %venue.id, "pipeline restarted by operator");
                    policy.reset();
                    running = true;
                }
                Some(PipelineCommand::Disable) => {}
            }
        }

        let end = run_session(
            &venue,
            adapter.as_ref(),
            &mut feed,
            &mut aggregator,
            &trades,
            &candles,
            &publisher,
            &health,
            &mut policy,
            &mut commands,
            &reconnection,
        )
        .await;

        match end {
            SessionEnd::Shutdown => break 'lifecycle,
            SessionEnd::Disabled => {
                info!(venue = %venue.id, "pipeline disabled");
                flush_candles(&venue, &mut aggregator, &candles).await;
                running = false;
            }
            SessionEnd::ForceReconnect => {
                info!(venue = %venue.id, "forced reconnect");
                policy.reset();
            }
            SessionEnd::Lost(reason) => {
                warn!(venue = %venue.id, %reason, "connection lost");
                match policy.on_failure() {
                    Decision::Retry { attempt, delay_ms } => {
                        health.reconnects.record(&venue.id);
                        publisher.publish_reconnecting(&venue.id, attempt, delay_ms);
                        info!(venue = %venue.id, attempt, delay_ms, "reconnect scheduled");

                        tokio::select! {
                            () = sleep(Duration::from_millis(delay_ms)) => {}
                            command = commands.recv() => match command {
                                None | Some(PipelineCommand::Shutdown) => break 'lifecycle,
                                Some(PipelineCommand::Disable) => {
                                    info!(venue = %venue.id, "pending retry cancelled, pipeline disabled");
                                    flush_candles(&venue, &mut aggregator, &candles).await;
                                    running = false;
                                }
                                Some(PipelineCommand::ForceReconnect) => {
                                    info!(venue = %venue.id, "backoff cut short by operator");
                                }
                                Some(PipelineCommand::Enable) => {}
                            },
                        }
                    }
                    Decision::Trip { attempts } => {
                        error!(venue = %venue.id, attempts, "retries exhausted, venue marked dead");
                        health.breakers.trip(&venue.id, Utc::now());
                        publisher.publish_module_dead(&venue.id, attempts);
                        flush_candles(&venue, &mut aggregator, &candles).await;
                        running = false;
                    }
                }
            }
        }
    }

    flush_candles(&venue, &mut aggregator, &candles).await;
    info!(venue = %venue.id, "pipeline stopped");
}

/// Connect, subscribe and stream until something ends the session.
#[allow(clippy::too_many_arguments)]
async fn run_session(
    venue: &Venue,
    adapter: &dyn VenueAdapter,
    feed: &mut Box<dyn FeedStream>,
    aggregator: &mut CandleAggregator,
    trades: &Arc<dyn TradeStore>,
    candles: &Arc<dyn CandleStore>,
    publisher: &TradePublisher,
    health: &Arc<HealthState>,
    policy: &mut ReconnectPolicy,
    commands: &mut mpsc::Receiver<PipelineCommand>,
    reconnection: &ReconnectionConfig,
) -> SessionEnd {
    if let Err(error) = feed.connect().await {
        return SessionEnd::Lost(error.to_string());
    }

    let subscribe = adapter.subscribe_frame(&venue.symbols);
    if let Err(error) = feed.send(&subscribe).await {
        return SessionEnd::Lost(format!("subscribe failed: {error}"));
    }

    // The reconnect succeeded end to end: backoff returns to base.
    policy.on_success();
    info!(venue = %venue.id, symbols = venue.symbols.len(), "subscribed");

    let mut keepalive = interval(Duration::from_secs(reconnection.ping_interval_secs.max(1)));
    keepalive.set_missed_tick_behavior(MissedTickBehavior::Delay);
    // The first tick fires immediately; an extra ping after connect is
    // harmless.

    loop {
        // The select only picks a wake reason; acting on it happens after
        // the competing futures are dropped, so the feed is free again.
        let wake = tokio::select! {
            _ = keepalive.tick() => Wake::Keepalive,
            frame = feed.next_frame() => Wake::Frame(frame),
            command = commands.recv() => Wake::Command(command),
        };

        match wake {
            Wake::Keepalive => {
                if let Err(error) = feed.ping().await {
                    return SessionEnd::Lost(format!("keepalive failed: {error}"));
                }
            }
            Wake::Frame(Some(FeedFrame::Text(payload))) => {
                ingest_payload(
                    venue, adapter, &payload, aggregator, trades, candles, publisher, health,
                )
                .await;
            }
            Wake::Frame(Some(FeedFrame::Closed { reason })) => return SessionEnd::Lost(reason),
            Wake::Frame(None) => return SessionEnd::Lost("no session".into()),
            Wake::Command(None) | Wake::Command(Some(PipelineCommand::Shutdown)) => {
                return SessionEnd::Shutdown
            }
            Wake::Command(Some(PipelineCommand::Disable)) => return SessionEnd::Disabled,
            Wake::Command(Some(PipelineCommand::ForceReconnect)) => {
                return SessionEnd::ForceReconnect
            }
            Wake::Command(Some(PipelineCommand::Enable)) => {}
        }
    }
}

/// Why the session loop woke up.
enum Wake {
    Keepalive,
    Frame(Option<FeedFrame>),
    Command(Option<PipelineCommand>),
}

/// Route one inbound frame: extract, normalize, persist, publish.
///
/// A malformed frame or record is logged and dropped; a failed write is
/// logged and skipped. Nothing here stops the stream.
#[allow(clippy::too_many_arguments)]
async fn ingest_payload(
    venue: &Venue,
    adapter: &dyn VenueAdapter,
    payload: &str,
    aggregator: &mut CandleAggregator,
    trades: &Arc<dyn TradeStore>,
    candles: &Arc<dyn CandleStore>,
    publisher: &TradePublisher,
    health: &Arc<HealthState>,
) {
    let raws = match adapter.extract(payload) {
        Ok(raws) => raws,
        Err(error) => {
            warn!(venue = %venue.id, %error, "dropping malformed frame");
            return;
        }
    };

    for raw in raws {
        let trade = match normalize(raw, &venue.id) {
            Ok(trade) => trade,
            Err(error) => {
                warn!(venue = %venue.id, %error, "dropping malformed trade");
                continue;
            }
        };

        health.staleness.record_seen(&venue.id);

        let is_whale = trade.is_whale(venue.whale_threshold);
        if let Err(error) = trades.insert_trade(&trade, is_whale).await {
            warn!(venue = %venue.id, trade_id = %trade.id, %error, "trade write failed, continuing");
        }

        if let Some(flushed) = aggregator.on_trade(&trade) {
            if let Err(error) = candles.upsert_candle(&flushed).await {
                warn!(venue = %venue.id, candle = %flushed.id(), %error, "candle write failed, continuing");
            }
        }

        publisher.publish_trade(&trade, venue.whale_threshold);
    }
}

/// Flush every open candle. Failures are logged and the candle abandoned
/// rather than blocking shutdown.
async fn flush_candles(
    venue: &Venue,
    aggregator: &mut CandleAggregator,
    candles: &Arc<dyn CandleStore>,
) {
    for candle in aggregator.flush_all() {
        if let Err(error) = candles.upsert_candle(&candle).await {
            warn!(venue = %venue.id, candle = %candle.id(), %error, "abandoning candle flush");
        }
    }
}
