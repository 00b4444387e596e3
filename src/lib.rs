//! Tapewire - Multi-venue trade stream ingestion with fleet health scoring.
//!
//! This crate ingests real-time trade streams from many independent,
//! unreliable external venues (exchanges, DEX chains, prediction markets),
//! normalizes them into a canonical shape, persists them, republishes them
//! on an internal event bus, and exposes aggregated health signals about
//! the ingestion fleet.
//!
//! # Architecture
//!
//! One generic engine runs per venue; venue differences live behind a small
//! adapter trait:
//!
//! - **`feed::pipeline`** - Per-venue task: connect → subscribe →
//!   normalize → persist → publish → detect failure → reconnect or trip
//! - **`feed::adapter`** - The venue seam: wire format, side semantics,
//!   default watchlist
//! - **`health`** - Staleness/reconnect/circuit-breaker trackers and the
//!   aggregated alert + quality-score read side
//!
//! # Modules
//!
//! - [`config`] - Configuration loading from TOML files with venue settings
//! - [`domain`] - Venue-agnostic types: trades, candles, venues, ids
//! - [`error`] - Error types for the crate
//! - [`feed`] - WebSocket ingestion engine, normalization, backoff
//! - [`bus`] - Fire-and-forget event bus with hierarchical subjects
//! - [`store`] - Trade/candle persistence (SQLite via Diesel, in-memory)
//! - [`health`] - Fleet health trackers, alerts and quality scores
//! - [`app`] - Application orchestration
//!
//! # Example
//!
//! ```no_run
//! use tapewire::app::App;
//! use tapewire::config::Config;
//!
//! # async fn demo() -> tapewire::error::Result<()> {
//! let config = Config::load("config.toml")?;
//! App::run(config).await
//! # }
//! ```

pub mod app;
pub mod bus;
pub mod config;
pub mod db;
pub mod domain;
pub mod error;
pub mod feed;
pub mod health;
pub mod store;

#[cfg(any(test, feature = "testkit"))]
pub mod testkit;
