//! Venue-agnostic domain types.

pub mod candle;
pub mod id;
pub mod trade;
pub mod venue;

pub use candle::{bucket_start, Candle};
pub use id::{TradeId, VenueId};
pub use trade::{Side, Trade};
pub use venue::{Venue, VenueKind, VenueRegistry};
