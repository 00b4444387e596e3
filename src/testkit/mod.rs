//! Shared test utilities available to both unit and integration tests.
//!
//! Enabled via the `testkit` feature; the crate depends on itself with the
//! feature turned on in dev-dependencies so integration tests can use
//! these helpers.

pub mod domain;
pub mod stream;

pub use stream::{channel_feed, ChannelFeed, ChannelFeedHandle, ScriptedFeed, SilentFeed};
