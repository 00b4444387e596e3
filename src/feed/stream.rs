//! WebSocket feed session.

use async_trait::async_trait;
use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio_tungstenite::{connect_async, tungstenite::Message, MaybeTlsStream, WebSocketStream};
use tracing::{debug, error, info, warn};

use crate::error::{Error, Result};

/// What the engine sees from a feed session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FeedFrame {
    /// An inbound text payload for the venue's message router.
    Text(String),
    /// The session is gone; the reconnect scheduler takes over.
    Closed { reason: String },
}

/// One venue's transport session.
///
/// Implementations own exactly one connection at a time; `connect` after a
/// close starts a fresh session, never reusing the old one.
#[async_trait]
pub trait FeedStream: Send {
    /// Establish a session. Called again for every reconnect attempt.
    async fn connect(&mut self) -> Result<()>;

    /// Send a control frame (subscriptions).
    async fn send(&mut self, frame: &str) -> Result<()>;

    /// Receive the next frame. Returns `None` when no session is open.
    async fn next_frame(&mut self) -> Option<FeedFrame>;

    /// Send a keepalive ping, independent of traffic.
    async fn ping(&mut self) -> Result<()>;

    /// Venue name for logging.
    fn venue_name(&self) -> &str;
}

/// Allow generic engine code over boxed streams.
#[async_trait]
impl FeedStream for Box<dyn FeedStream> {
    async fn connect(&mut self) -> Result<()> {
        (**self).connect().await
    }

    async fn send(&mut self, frame: &str) -> Result<()> {
        (**self).send(frame).await
    }

    async fn next_frame(&mut self) -> Option<FeedFrame> {
        (**self).next_frame().await
    }

    async fn ping(&mut self) -> Result<()> {
        (**self).ping().await
    }

    fn venue_name(&self) -> &str {
        (**self).venue_name()
    }
}

/// WebSocket-backed feed with candidate-URL fallback.
///
/// Candidate URLs are tried in order on connect; the first one that accepts
/// the connection becomes the sticky active URL and is reused by every
/// subsequent reconnect.
pub struct WsFeed {
    venue: String,
    candidates: Vec<String>,
    active: Option<String>,
    ws: Option<WebSocketStream<MaybeTlsStream<TcpStream>>>,
}

impl WsFeed {
    #[must_use]
    pub fn new(venue: impl Into<String>, candidates: Vec<String>) -> Self {
        Self {
            venue: venue.into(),
            candidates,
            active: None,
            ws: None,
        }
    }

    async fn connect_url(&mut self, url: &str) -> Result<()> {
        let (ws_stream, response) = connect_async(url).await?;
        info!(venue = %self.venue, url, status = %response.status(), "WebSocket connected");
        self.ws = Some(ws_stream);
        Ok(())
    }
}

#[async_trait]
impl FeedStream for WsFeed {
    async fn connect(&mut self) -> Result<()> {
        self.ws = None;

        if let Some(url) = self.active.clone() {
            return self.connect_url(&url).await;
        }

        let mut last_error = Error::Connection("no feed URLs configured".into());
        for url in self.candidates.clone() {
            match self.connect_url(&url).await {
                Ok(()) => {
                    self.active = Some(url);
                    return Ok(());
                }
                Err(e) => {
                    warn!(venue = %self.venue, %url, error = %e, "candidate URL failed");
                    last_error = e;
                }
            }
        }
        Err(last_error)
    }

    async fn send(&mut self, frame: &str) -> Result<()> {
        let ws = self
            .ws
            .as_mut()
            .ok_or_else(|| Error::Connection("not connected".into()))?;
        ws.send(Message::Text(frame.to_string())).await?;
        Ok(())
    }

    async fn next_frame(&mut self) -> Option<FeedFrame> {
        let venue = self.venue.clone();
        let frame = {
            let ws = self.ws.as_mut()?;
            loop {
                let Some(message) = ws.next().await else {
                    break FeedFrame::Closed {
                        reason: "stream ended".into(),
                    };
                };

                match message {
                    Ok(Message::Text(text)) => break FeedFrame::Text(text),
                    Ok(Message::Ping(data)) => {
                        debug!(venue = %venue, "Received ping");
                        if ws.send(Message::Pong(data)).await.is_err() {
                            break FeedFrame::Closed {
                                reason: "failed to send pong".into(),
                            };
                        }
                    }
                    // Protocol-level pongs are keepalive answers, not data.
                    Ok(Message::Pong(_)) => continue,
                    Ok(Message::Close(close)) => {
                        info!(venue = %venue, frame = ?close, "WebSocket closed by server");
                        break FeedFrame::Closed {
                            reason: close.map(|f| f.reason.to_string()).unwrap_or_default(),
                        };
                    }
                    Ok(_) => continue,
                    Err(e) => {
                        error!(venue = %venue, error = %e, "WebSocket error");
                        break FeedFrame::Closed {
                            reason: e.to_string(),
                        };
                    }
                }
            }
        };

        if matches!(frame, FeedFrame::Closed { .. }) {
            self.ws = None;
        }
        Some(frame)
    }

    async fn ping(&mut self) -> Result<()> {
        let ws = self
            .ws
            .as_mut()
            .ok_or_else(|| Error::Connection("not connected".into()))?;
        ws.send(Message::Ping(Vec::new())).await?;
        Ok(())
    }

    fn venue_name(&self) -> &str {
        &self.venue
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn unconnected_feed_yields_no_frames_and_errors_on_send() {
        let mut feed = WsFeed::new("binance", vec!["wss://example.invalid/ws".into()]);
        assert!(feed.next_frame().await.is_none());
        assert!(feed.send("{}").await.is_err());
        assert!(feed.ping().await.is_err());
    }

    #[tokio::test]
    async fn connect_with_no_candidates_fails() {
        let mut feed = WsFeed::new("binance", Vec::new());
        let result = feed.connect().await;
        assert!(matches!(result, Err(Error::Connection(_))));
    }
}
