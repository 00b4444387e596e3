//! App orchestration module.
//!
//! Builds the shared stores, spawns one ingestion pipeline per configured
//! venue plus the control-plane listener, and handles graceful shutdown.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::signal;
use tokio::sync::broadcast;
use tokio::sync::mpsc;
use tracing::{info, warn};

use crate::bus::{BusMessage, ControlCommand, EventBus, InProcessBus, Subjects, TradePublisher};
use crate::config::Config;
use crate::db;
use crate::domain::{VenueId, VenueRegistry};
use crate::error::Result;
use crate::feed::{adapter_for, IngestPipeline, PipelineCommand, WsFeed};
use crate::health::{HealthAggregator, HealthState};
use crate::store::SqliteMarketStore;

/// Main application struct.
pub struct App;

impl App {
    /// Run the ingestion fleet until a shutdown signal arrives.
    ///
    /// Every configured venue gets its own pipeline task; disabled venues
    /// start parked and can be enabled over the control plane.
    pub async fn run(config: Config) -> Result<()> {
        let pool = db::create_pool(&config.database)?;
        db::run_migrations(&pool)?;
        let store = Arc::new(SqliteMarketStore::new(pool));

        let bus = InProcessBus::new(4096);
        let bus_dyn: Arc<dyn EventBus> = Arc::new(bus.clone());
        let subjects = Arc::new(Subjects::new(config.bus.root.clone()));

        let health = Arc::new(HealthState::with_staleness_threshold(
            config.health.staleness_threshold_secs as i64 * 1000,
        ));
        let registry = Arc::new(VenueRegistry::new());

        if config.venues.is_empty() {
            warn!("no venues configured, nothing to ingest");
        }

        let mut handles = Vec::new();
        let mut command_senders = HashMap::new();

        for venue_config in &config.venues {
            let adapter = adapter_for(venue_config.kind);
            let venue = venue_config.to_venue(adapter.default_symbols());
            registry.insert(venue.clone());
            health.breakers.configure_default(&venue.id);

            let feed = Box::new(WsFeed::new(venue.id.to_string(), venue.feed_urls.clone()));
            let publisher = TradePublisher::new(bus_dyn.clone(), subjects.clone());

            let pipeline = IngestPipeline {
                venue,
                adapter,
                feed,
                trades: store.clone(),
                candles: store.clone(),
                publisher,
                health: health.clone(),
                reconnection: config.reconnection.clone(),
            };
            let handle = pipeline.spawn();
            command_senders.insert(handle.venue().clone(), handle.commands());
            handles.push(handle);
        }

        info!(venues = handles.len(), "ingestion fleet started");

        let control = tokio::spawn(control_loop(
            bus.subscribe(),
            subjects.clone(),
            registry.clone(),
            command_senders,
        ));

        let aggregator = HealthAggregator::new(health.clone(), registry.clone());
        let quality_log = tokio::spawn(log_fleet_quality(aggregator));

        signal::ctrl_c().await?;
        info!("Shutdown signal received");

        for handle in handles {
            handle.shutdown().await;
        }
        control.abort();
        quality_log.abort();

        Ok(())
    }
}

/// Consume operator control subjects and drive the pipelines and registry.
async fn control_loop(
    mut messages: broadcast::Receiver<BusMessage>,
    subjects: Arc<Subjects>,
    registry: Arc<VenueRegistry>,
    senders: HashMap<VenueId, mpsc::Sender<PipelineCommand>>,
) {
    loop {
        let message = match messages.recv().await {
            Ok(message) => message,
            Err(broadcast::error::RecvError::Lagged(skipped)) => {
                warn!(skipped, "control listener lagged");
                continue;
            }
            Err(broadcast::error::RecvError::Closed) => break,
        };

        let Some(command) = subjects.parse_control(&message.subject) else {
            continue;
        };

        match command {
            ControlCommand::Reconnect(venue) => {
                info!(venue = %venue, "operator reconnect");
                forward(&senders, &venue, PipelineCommand::ForceReconnect).await;
            }
            ControlCommand::Disable(venue) => {
                info!(venue = %venue, "operator disable");
                registry.disable(&venue);
                forward(&senders, &venue, PipelineCommand::Disable).await;
            }
            ControlCommand::Enable(venue) => {
                info!(venue = %venue, "operator enable");
                registry.enable(&venue);
                forward(&senders, &venue, PipelineCommand::Enable).await;
            }
        }
    }
}

async fn forward(
    senders: &HashMap<VenueId, mpsc::Sender<PipelineCommand>>,
    venue: &VenueId,
    command: PipelineCommand,
) {
    match senders.get(venue) {
        Some(sender) => {
            let _ = sender.send(command).await;
        }
        None => warn!(venue = %venue, "control command for unknown venue"),
    }
}

/// Periodic fleet-quality heartbeat in the logs.
async fn log_fleet_quality(aggregator: HealthAggregator) {
    let mut tick = tokio::time::interval(Duration::from_secs(60));
    tick.tick().await; // skip the immediate first tick
    loop {
        tick.tick().await;
        let report = aggregator.quality_scores();
        let alerts = aggregator.alerts();
        info!(
            score = report.system_score,
            grade = %report.system_grade,
            critical = alerts.critical,
            warning = alerts.warning,
            "fleet quality"
        );
    }
}
