//! SQLite persistence tests against a real database file.

use std::sync::Arc;

use chrono::{TimeZone, Utc};
use rust_decimal_macros::dec;

use tapewire::db::{create_pool, run_migrations};
use tapewire::domain::{Candle, Side, Trade, VenueId};
use tapewire::store::{CandleStore, SqliteMarketStore, TradeStore};

fn trade(native_id: &str, price: rust_decimal::Decimal) -> Trade {
    Trade::new(
        VenueId::new("binance"),
        "BTCUSDT",
        price,
        dec!(1),
        Side::Buy,
        Utc.timestamp_opt(60, 0).unwrap(),
        native_id,
    )
}

fn file_backed_store() -> (tempfile::TempDir, SqliteMarketStore) {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("tapewire-test.db");
    let pool = create_pool(path.to_str().unwrap()).unwrap();
    run_migrations(&pool).unwrap();
    (dir, SqliteMarketStore::new(pool))
}

#[tokio::test]
async fn trades_survive_roundtrip_on_disk() {
    let (_dir, store) = file_backed_store();
    let t = trade("t-1", dec!(50000.25));

    assert!(store.insert_trade(&t, false).await.unwrap());
    let fetched = store.get_trade(&t.id).await.unwrap().unwrap();
    assert_eq!(fetched, t);
}

#[tokio::test]
async fn reinserting_the_same_id_leaves_one_row() {
    let (_dir, store) = file_backed_store();
    let t = trade("t-1", dec!(50000));

    assert!(store.insert_trade(&t, true).await.unwrap());
    assert!(!store.insert_trade(&t, true).await.unwrap());
    assert!(!store.insert_trade(&t, true).await.unwrap());

    assert!(store.get_trade(&t.id).await.unwrap().is_some());
}

#[tokio::test]
async fn concurrent_writers_do_not_interfere() {
    let (_dir, store) = file_backed_store();
    let store = Arc::new(store);

    let mut tasks = Vec::new();
    for venue in ["binance", "kraken", "uniswap"] {
        let store = store.clone();
        tasks.push(tokio::spawn(async move {
            for i in 0..20 {
                let t = Trade::new(
                    VenueId::new(venue),
                    "BTCUSDT",
                    dec!(100),
                    dec!(1),
                    Side::Buy,
                    Utc.timestamp_opt(i, 0).unwrap(),
                    &format!("{venue}-{i}"),
                );
                store.insert_trade(&t, false).await.unwrap();
            }
        }));
    }
    for task in tasks {
        task.await.unwrap();
    }

    // Spot-check one row per venue.
    for venue in ["binance", "kraken", "uniswap"] {
        let t = Trade::new(
            VenueId::new(venue),
            "BTCUSDT",
            dec!(100),
            dec!(1),
            Side::Buy,
            Utc.timestamp_opt(0, 0).unwrap(),
            &format!("{venue}-0"),
        );
        assert!(store.get_trade(&t.id).await.unwrap().is_some());
    }
}

#[tokio::test]
async fn interrupted_flush_converges_on_reflush() {
    let (_dir, store) = file_backed_store();

    // First flush: partial aggregate.
    let mut candle = Candle::open_from(&trade("t-1", dec!(100)), 60);
    store.upsert_candle(&candle).await.unwrap();

    // More trades land, then the pipeline re-flushes the full aggregate
    // (crash-resume shape).
    candle.apply(&trade("t-2", dec!(150)));
    candle.apply(&trade("t-3", dec!(90)));
    store.upsert_candle(&candle).await.unwrap();
    store.upsert_candle(&candle).await.unwrap();

    let stored = store.get_candle(&candle.id()).await.unwrap().unwrap();
    assert_eq!(stored.high, dec!(150));
    assert_eq!(stored.low, dec!(90));
    assert_eq!(stored.trade_count, 3);
    assert_eq!(stored.volume, dec!(3));
}
