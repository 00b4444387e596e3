//! End-to-end pipeline tests over mock feeds, the in-memory store and the
//! in-process bus.

use std::sync::Arc;
use std::time::Duration;

use rust_decimal_macros::dec;

use tapewire::bus::{BusMessage, EventBus, InProcessBus, Subjects, TradePublisher};
use tapewire::config::ReconnectionConfig;
use tapewire::domain::Venue;
use tapewire::error::Error;
use tapewire::feed::{adapter_for, FeedStream, IngestPipeline, PipelineCommand, PipelineHandle};
use tapewire::health::{BreakerState, HealthState};
use tapewire::store::MemoryStore;
use tapewire::testkit::domain::{cex_trade_frame, venue};
use tapewire::testkit::{channel_feed, ScriptedFeed, SilentFeed};

/// Reconnection config with short delays so backoff-driven tests run fast.
fn fast_reconnection() -> ReconnectionConfig {
    ReconnectionConfig {
        base_delay_ms: 10,
        max_delay_ms: 50,
        max_attempts: 3,
        ping_interval_secs: 300,
    }
}

struct Fixture {
    store: Arc<MemoryStore>,
    bus: InProcessBus,
    health: Arc<HealthState>,
    handle: PipelineHandle,
}

fn spawn_pipeline(venue: Venue, feed: Box<dyn FeedStream>) -> Fixture {
    let store = Arc::new(MemoryStore::new());
    let bus = InProcessBus::new(256);
    let bus_dyn: Arc<dyn EventBus> = Arc::new(bus.clone());
    let subjects = Arc::new(Subjects::new("market"));
    let health = Arc::new(HealthState::new());

    let pipeline = IngestPipeline {
        adapter: adapter_for(venue.kind),
        venue,
        feed,
        trades: store.clone(),
        candles: store.clone(),
        publisher: TradePublisher::new(bus_dyn, subjects),
        health: health.clone(),
        reconnection: fast_reconnection(),
    };

    Fixture {
        store,
        bus,
        health,
        handle: pipeline.spawn(),
    }
}

/// Poll until `check` passes or a 2s deadline expires.
async fn eventually(check: impl Fn() -> bool) {
    tokio::time::timeout(Duration::from_secs(2), async {
        loop {
            if check() {
                return;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .expect("condition not met in time");
}

async fn recv_subject(
    rx: &mut tokio::sync::broadcast::Receiver<BusMessage>,
    subject: &str,
) -> BusMessage {
    tokio::time::timeout(Duration::from_secs(2), async {
        loop {
            let message = rx.recv().await.expect("bus closed");
            if message.subject == subject {
                return message;
            }
        }
    })
    .await
    .expect("subject not seen in time")
}

#[tokio::test]
async fn trades_flow_to_store_and_bus() {
    let (feed, feed_handle) = channel_feed(32);
    let fixture = spawn_pipeline(venue("binance"), Box::new(feed));
    let mut rx = fixture.bus.subscribe();

    feed_handle
        .send_text(cex_trade_frame("BTCUSDT", "50000", "0.5", 1, 1_700_000_000_000))
        .await;

    let message = recv_subject(&mut rx, "market.binance.tradeExecuted").await;
    assert_eq!(message.payload["trade"]["symbol"], "BTCUSDT");

    eventually(|| fixture.store.trade_count() == 1).await;
    let trades = fixture.store.trades_for(&"binance".into());
    assert_eq!(trades[0].price, dec!(50000));
    assert_eq!(trades[0].notional, dec!(25000));

    fixture.handle.shutdown().await;
}

#[tokio::test]
async fn subscribe_frame_is_sent_on_connect() {
    let (feed, feed_handle) = channel_feed(32);
    let fixture = spawn_pipeline(venue("binance"), Box::new(feed));

    eventually(|| !feed_handle.sent_frames().is_empty()).await;
    let frames = feed_handle.sent_frames();
    assert!(frames[0].contains("SUBSCRIBE"));
    assert!(frames[0].contains("btcusdt@trade"));

    fixture.handle.shutdown().await;
}

#[tokio::test]
async fn duplicate_delivery_after_reconnect_is_idempotent() {
    let (feed, feed_handle) = channel_feed(32);
    let fixture = spawn_pipeline(venue("binance"), Box::new(feed));

    let frame = cex_trade_frame("BTCUSDT", "50000", "0.5", 42, 1_700_000_000_000);
    feed_handle.send_text(frame.clone()).await;
    eventually(|| fixture.store.trade_count() == 1).await;

    // Drop the connection; the pipeline reconnects and the venue replays
    // the same trade.
    feed_handle.close("upstream hiccup").await;
    eventually(|| feed_handle.connect_count() >= 2).await;
    feed_handle.send_text(frame).await;

    // Still exactly one row.
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(fixture.store.trade_count(), 1);

    fixture.handle.shutdown().await;
}

#[tokio::test]
async fn whale_trade_emits_message_created() {
    let (feed, feed_handle) = channel_feed(32);
    // venue() has a 100_000 whale threshold.
    let fixture = spawn_pipeline(venue("binance"), Box::new(feed));
    let mut rx = fixture.bus.subscribe();

    // notional exactly at the threshold: 50_000 * 2.
    feed_handle
        .send_text(cex_trade_frame("BTCUSDT", "50000", "2", 7, 1_700_000_000_000))
        .await;

    let message = recv_subject(&mut rx, "market.binance.messageCreated").await;
    assert_eq!(message.payload["tags"]["symbol"], "BTCUSDT");
    assert_eq!(message.payload["tags"]["notional"], "100000");

    fixture.handle.shutdown().await;
}

#[tokio::test]
async fn below_threshold_trade_is_not_a_whale() {
    let (feed, feed_handle) = channel_feed(32);
    let fixture = spawn_pipeline(venue("binance"), Box::new(feed));
    let mut rx = fixture.bus.subscribe();

    feed_handle
        .send_text(cex_trade_frame("BTCUSDT", "49999.99", "2", 8, 1_700_000_000_000))
        .await;

    recv_subject(&mut rx, "market.binance.tradeExecuted").await;
    tokio::time::sleep(Duration::from_millis(50)).await;
    while let Ok(message) = rx.try_recv() {
        assert_ne!(message.subject, "market.binance.messageCreated");
    }

    fixture.handle.shutdown().await;
}

#[tokio::test]
async fn malformed_frames_are_dropped_without_killing_the_stream() {
    let (feed, feed_handle) = channel_feed(32);
    let fixture = spawn_pipeline(venue("binance"), Box::new(feed));

    feed_handle.send_text("not json at all").await;
    // Well-formed envelope, malformed price.
    feed_handle
        .send_text(r#"{"e":"trade","s":"BTCUSDT","p":"NaN-ish","q":"1","m":false,"t":9,"T":0}"#)
        .await;
    feed_handle
        .send_text(cex_trade_frame("BTCUSDT", "100", "1", 10, 1_700_000_000_000))
        .await;

    eventually(|| fixture.store.trade_count() == 1).await;
    assert_eq!(feed_handle.connect_count(), 1);

    fixture.handle.shutdown().await;
}

#[tokio::test]
async fn reconnect_is_tracked_and_announced() {
    let (feed, feed_handle) = channel_feed(32);
    let fixture = spawn_pipeline(venue("binance"), Box::new(feed));
    let mut rx = fixture.bus.subscribe();

    feed_handle.close("server went away").await;

    let message = recv_subject(&mut rx, "market.binance.reconnecting").await;
    assert_eq!(message.payload["attempt"], 1);
    assert_eq!(message.payload["delay"], 10);

    eventually(|| feed_handle.connect_count() >= 2).await;
    let now = chrono::Utc::now().timestamp_millis();
    assert_eq!(
        fixture.health.reconnects.count_within_hour(&"binance".into(), now),
        1
    );

    fixture.handle.shutdown().await;
}

#[tokio::test]
async fn exhausted_retries_trip_the_breaker_and_announce_death() {
    // Every connect fails; max_attempts is 3 in fast_reconnection().
    let feed = ScriptedFeed::new().with_connect_results(vec![
        Err(Error::Connection("refused".into())),
        Err(Error::Connection("refused".into())),
        Err(Error::Connection("refused".into())),
    ]);
    let v = venue("binance");
    let store = Arc::new(MemoryStore::new());
    let bus = InProcessBus::new(256);
    let bus_dyn: Arc<dyn EventBus> = Arc::new(bus.clone());
    let health = Arc::new(HealthState::new());
    health.breakers.configure_default(&v.id);
    let mut rx = bus.subscribe();

    let handle = IngestPipeline {
        adapter: adapter_for(v.kind),
        venue: v.clone(),
        feed: Box::new(feed),
        trades: store.clone(),
        candles: store,
        publisher: TradePublisher::new(bus_dyn, Arc::new(Subjects::new("market"))),
        health: health.clone(),
        reconnection: fast_reconnection(),
    }
    .spawn();

    let message = recv_subject(&mut rx, "market.module.dead.binance").await;
    assert_eq!(message.payload["attempts"], 3);

    let breaker = health.breakers.get(&v.id).unwrap();
    assert_eq!(breaker.state, BreakerState::Open);
    assert_eq!(breaker.trip_count, 1);

    // Dead is terminal until an operator acts: no further reconnecting
    // events show up.
    tokio::time::sleep(Duration::from_millis(100)).await;
    while let Ok(message) = rx.try_recv() {
        assert_ne!(message.subject, "market.binance.reconnecting");
    }

    handle.shutdown().await;
}

#[tokio::test]
async fn operator_reconnect_restarts_a_dead_venue() {
    let feed = ScriptedFeed::new().with_connect_results(vec![
        Err(Error::Connection("refused".into())),
        Err(Error::Connection("refused".into())),
        Err(Error::Connection("refused".into())),
    ]);
    let (connect_count, _) = feed.counts();
    let v = venue("binance");
    let store = Arc::new(MemoryStore::new());
    let bus = InProcessBus::new(256);
    let bus_dyn: Arc<dyn EventBus> = Arc::new(bus.clone());
    let health = Arc::new(HealthState::new());
    let mut rx = bus.subscribe();

    let handle = IngestPipeline {
        adapter: adapter_for(v.kind),
        venue: v,
        feed: Box::new(feed),
        trades: store.clone(),
        candles: store,
        publisher: TradePublisher::new(bus_dyn, Arc::new(Subjects::new("market"))),
        health,
        reconnection: fast_reconnection(),
    }
    .spawn();

    recv_subject(&mut rx, "market.module.dead.binance").await;
    let dead_connects = connect_count.load(std::sync::atomic::Ordering::SeqCst);

    handle.send(PipelineCommand::ForceReconnect).await;
    // Scripted connect results are exhausted, so the restart connects fine.
    eventually(|| connect_count.load(std::sync::atomic::Ordering::SeqCst) > dead_connects).await;

    handle.shutdown().await;
}

#[tokio::test]
async fn candles_flush_on_boundary_and_shutdown() {
    let (feed, feed_handle) = channel_feed(32);
    let fixture = spawn_pipeline(venue("binance"), Box::new(feed));

    // Two trades in the first 60s bucket, one at t=65s.
    feed_handle
        .send_text(cex_trade_frame("BTCUSDT", "100", "1", 1, 0))
        .await;
    feed_handle
        .send_text(cex_trade_frame("BTCUSDT", "120", "1", 2, 30_000))
        .await;
    feed_handle
        .send_text(cex_trade_frame("BTCUSDT", "110", "1", 3, 65_000))
        .await;

    // Boundary crossing flushed the first bucket.
    eventually(|| fixture.store.all_candles().len() == 1).await;

    fixture.handle.shutdown().await;

    // Shutdown flushed the open second bucket.
    let candles = fixture.store.all_candles();
    assert_eq!(candles.len(), 2);

    let first = &candles[0];
    assert_eq!(first.start.timestamp_millis(), 0);
    assert_eq!(first.open, dec!(100));
    assert_eq!(first.high, dec!(120));
    assert_eq!(first.close, dec!(120));
    assert_eq!(first.trade_count, 2);
    assert!(first.low <= first.open && first.open <= first.high);

    let second = &candles[1];
    assert_eq!(second.start.timestamp_millis(), 60_000);
    assert_eq!(second.trade_count, 1);
    assert_eq!(second.open, dec!(110));
}

#[tokio::test]
async fn active_venue_scores_a_perfect_grade() {
    use tapewire::domain::VenueRegistry;
    use tapewire::health::HealthAggregator;

    let (feed, feed_handle) = channel_feed(32);
    let v = venue("binance");
    let registry = Arc::new(VenueRegistry::new());
    registry.insert(v.clone());
    let fixture = spawn_pipeline(v, Box::new(feed));

    // Five trades within a second, no reconnects, not disabled.
    let base = chrono::Utc::now().timestamp_millis();
    for i in 0..5u64 {
        feed_handle
            .send_text(cex_trade_frame("BTCUSDT", "100", "1", i, base + i as i64 * 200))
            .await;
    }
    eventually(|| fixture.store.trade_count() == 5).await;

    let aggregator = HealthAggregator::new(fixture.health.clone(), registry);
    let report = aggregator.quality_scores();
    assert_eq!(report.system_score, 100);
    assert_eq!(report.system_grade, 'A');
    let quality = &report.venues[0];
    assert_eq!(
        (quality.freshness, quality.error_score, quality.rate_score),
        (100, 100, 100)
    );

    let alerts = aggregator.alerts();
    assert_eq!(alerts.total, 0);

    fixture.handle.shutdown().await;
}

#[tokio::test]
async fn silent_connection_counts_as_never_seen() {
    use tapewire::domain::VenueRegistry;
    use tapewire::health::HealthAggregator;

    let connect_count = Arc::new(std::sync::atomic::AtomicU32::new(0));
    let feed = SilentFeed::new(connect_count.clone());
    let v = venue("binance");
    let registry = Arc::new(VenueRegistry::new());
    registry.insert(v.clone());

    let fixture = spawn_pipeline(v, Box::new(feed));
    eventually(|| connect_count.load(std::sync::atomic::Ordering::SeqCst) == 1).await;

    // Connected but silent: no activity recorded, no reconnects, so the
    // quality score is carried by the error component alone.
    let aggregator = HealthAggregator::new(fixture.health.clone(), registry);
    let quality = aggregator.quality_scores();
    assert_eq!(quality.venues[0].freshness, 0);
    assert_eq!(quality.venues[0].rate_score, 0);
    assert_eq!(quality.venues[0].error_score, 100);
    assert_eq!(quality.venues[0].score, 30);

    fixture.handle.shutdown().await;
}

#[tokio::test]
async fn disable_parks_the_pipeline_until_enabled() {
    let (feed, feed_handle) = channel_feed(32);
    let fixture = spawn_pipeline(venue("binance"), Box::new(feed));

    eventually(|| feed_handle.connect_count() == 1).await;

    fixture.handle.send(PipelineCommand::Disable).await;
    tokio::time::sleep(Duration::from_millis(50)).await;

    // Frames delivered while disabled are never ingested.
    feed_handle
        .send_text(cex_trade_frame("BTCUSDT", "100", "1", 1, 0))
        .await;
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(fixture.store.trade_count(), 0);

    fixture.handle.send(PipelineCommand::Enable).await;
    eventually(|| feed_handle.connect_count() >= 2).await;

    fixture.handle.shutdown().await;
}
