//! Streaming ingestion: adapters, normalization, transport, backoff and
//! the per-venue pipeline.

pub mod adapter;
pub mod candles;
pub mod normalize;
pub mod pipeline;
pub mod reconnect;
pub mod stream;
pub mod venues;

pub use adapter::{RawTimestamp, RawTrade, VenueAdapter};
pub use candles::CandleAggregator;
pub use normalize::normalize;
pub use pipeline::{IngestPipeline, PipelineCommand, PipelineHandle};
pub use reconnect::{Decision, ReconnectPolicy};
pub use stream::{FeedFrame, FeedStream, WsFeed};
pub use venues::adapter_for;
