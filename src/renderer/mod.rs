//! Browser page abstraction.
//!
//! Defines the [`EventPage`] trait the capture orchestrator drives, so the
//! state machine can be exercised with a scripted fake instead of a live
//! Chromium (currently the only real backend, via chromiumoxide).

pub mod chromium;

use anyhow::Result;
use async_trait::async_trait;
use tokio::sync::mpsc;

/// A raw network response surfaced by the page's response observer.
///
/// Only classifier candidates reach this stream; the body is still undecoded
/// text (possibly base64-flagged by the transport).
#[derive(Debug, Clone)]
pub struct SniffedResponse {
    /// The response URL.
    pub url: String,
    /// Raw body text.
    pub body: String,
    /// Whether the transport delivered the body base64-encoded.
    pub base64: bool,
}

/// One live page scoped to a single capture run.
///
/// All operations are best-effort from the caller's perspective: a click or
/// scroll that returns `Ok` proves nothing. Capture success is only ever
/// observed through the response stream.
#[async_trait]
pub trait EventPage: Send {
    /// Navigate with a hard timeout. Failure here is fatal for the run.
    async fn navigate(&mut self, url: &str, timeout_ms: u64) -> Result<()>;

    /// Evaluate a script in the page. The result is advisory only.
    async fn evaluate(&self, script: &str) -> Result<serde_json::Value>;

    /// Issue one coarse mouse-wheel scroll on the window.
    async fn wheel(&self, delta_y: f64) -> Result<()>;

    /// The rendered page markup.
    async fn html(&self) -> Result<String>;

    /// Take the response stream. Registered before navigation so no
    /// in-flight response is missed; callable once per page.
    fn take_responses(&mut self) -> Option<mpsc::UnboundedReceiver<SniffedResponse>>;

    /// Tear the page down.
    async fn close(self: Box<Self>) -> Result<()>;
}
