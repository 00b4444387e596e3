//! Configuration loading and validation tests.

use std::io::Write;

use tapewire::config::Config;
use tapewire::domain::VenueKind;

const FULL: &str = r#"
database = "tapewire.db"

[logging]
level = "debug"
format = "json"

[bus]
root = "feeds"

[health]
staleness_threshold_secs = 120

[reconnection]
base_delay_ms = 500
max_delay_ms = 10000
max_attempts = 5
ping_interval_secs = 15

[[venues]]
name = "binance"
kind = "cex"
whale_threshold = "100000"
symbols = ["BTCUSDT"]
candle_interval_secs = 60
feed_urls = ["wss://stream.example.test/ws", "wss://backup.example.test/ws"]

[[venues]]
name = "uniswap"
kind = "dex"
enabled = false
whale_threshold = "250000"
symbols = '["WETH-USDC"]'
feed_urls = ["wss://swaps.example.test/ws"]
"#;

#[test]
fn full_config_parses() {
    let config = Config::parse_toml(FULL).unwrap();
    assert_eq!(config.bus.root, "feeds");
    assert_eq!(config.health.staleness_threshold_secs, 120);
    assert_eq!(config.reconnection.base_delay_ms, 500);
    assert_eq!(config.venues.len(), 2);

    let binance = &config.venues[0];
    assert_eq!(binance.kind, VenueKind::Cex);
    assert_eq!(binance.feed_urls.len(), 2);
    assert!(binance.enabled);

    let uniswap = &config.venues[1];
    assert_eq!(uniswap.kind, VenueKind::Dex);
    assert!(!uniswap.enabled);
    // Settings-service JSON string shape resolves to a list.
    assert_eq!(uniswap.symbols.resolve("uniswap", &[]), vec!["WETH-USDC"]);
}

#[test]
fn load_reads_from_disk() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(FULL.as_bytes()).unwrap();

    let config = Config::load(file.path()).unwrap();
    assert_eq!(config.venues.len(), 2);
}

#[test]
fn missing_file_is_an_error() {
    assert!(Config::load("/definitely/not/here.toml").is_err());
}

#[test]
fn invalid_toml_is_an_error() {
    assert!(Config::parse_toml("this is not toml [").is_err());
}

#[test]
fn misconfigured_venue_fails_fast() {
    let bad = FULL.replace("whale_threshold = \"100000\"", "whale_threshold = \"-1\"");
    let error = Config::parse_toml(&bad).unwrap_err();
    assert!(error.to_string().contains("whale_threshold"));
}

#[test]
fn venue_config_materializes_defaults_for_bad_symbols() {
    let raw = r#"
        [[venues]]
        name = "polymarket"
        kind = "prediction"
        whale_threshold = "25000"
        symbols = 'not-a-json-array'
        feed_urls = ["wss://feed.example.test/ws"]
    "#;
    let config = Config::parse_toml(raw).unwrap();
    let venue = config.venues[0].to_venue(&["FED-CUT-SEP"]);
    assert_eq!(venue.symbols, vec!["FED-CUT-SEP"]);
    assert_eq!(venue.candle_interval_secs, 60);
}
