//! Chromium-backed event page using chromiumoxide.
//!
//! The response observer is wired over CDP: `Network.responseReceived`
//! records candidate URLs by request id, `Network.loadingFinished` triggers
//! the body fetch. Bodies are forwarded raw; decoding happens in the
//! capture layer.

use super::{EventPage, SniffedResponse};
use crate::classify::Classifier;
use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::cdp::browser_protocol::input::{
    DispatchMouseEventParams, DispatchMouseEventType,
};
use chromiumoxide::cdp::browser_protocol::network::{
    EnableParams, EventLoadingFinished, EventResponseReceived, GetResponseBodyParams, RequestId,
};
use chromiumoxide::page::Page;
use futures::StreamExt;
use std::collections::HashMap;
use std::path::PathBuf;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

const USER_AGENT: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) \
                          AppleWebKit/605.1.15 (KHTML, like Gecko) \
                          Version/17.5 Safari/605.1.15";

/// Window midpoint for wheel events (1400x1000 viewport).
const WHEEL_X: f64 = 700.0;
const WHEEL_Y: f64 = 500.0;

/// Find the Chromium binary path.
pub fn find_chromium() -> Option<PathBuf> {
    // 1. SPLITCAP_CHROMIUM_PATH env
    if let Ok(p) = std::env::var("SPLITCAP_CHROMIUM_PATH") {
        let path = PathBuf::from(&p);
        if path.exists() {
            return Some(path);
        }
    }

    // 2. ~/.splitcap/chromium/
    if let Some(home) = dirs::home_dir() {
        let candidates = if cfg!(target_os = "macos") {
            vec![
                home.join(".splitcap/chromium/chrome-mac-arm64/Google Chrome for Testing.app/Contents/MacOS/Google Chrome for Testing"),
                home.join(".splitcap/chromium/chrome-mac-x64/Google Chrome for Testing.app/Contents/MacOS/Google Chrome for Testing"),
                home.join(".splitcap/chromium/chrome"),
            ]
        } else {
            vec![
                home.join(".splitcap/chromium/chrome-linux64/chrome"),
                home.join(".splitcap/chromium/chrome"),
            ]
        };
        for c in candidates {
            if c.exists() {
                return Some(c);
            }
        }
    }

    // 3. System PATH
    for name in ["google-chrome", "chromium", "chromium-browser"] {
        if let Ok(path) = which::which(name) {
            return Some(path);
        }
    }

    // 4. Common macOS location
    if cfg!(target_os = "macos") {
        let common =
            PathBuf::from("/Applications/Google Chrome.app/Contents/MacOS/Google Chrome");
        if common.exists() {
            return Some(common);
        }
    }

    None
}

/// A launched Chromium instance scoped to one capture run.
pub struct ChromiumSession {
    browser: Browser,
    handler_task: JoinHandle<()>,
}

impl ChromiumSession {
    /// Launch Chromium, headless unless asked otherwise.
    pub async fn launch(headful: bool) -> Result<Self> {
        let chrome_path = find_chromium()
            .context("Chromium not found. Set SPLITCAP_CHROMIUM_PATH or install Chrome.")?;

        let mut builder = BrowserConfig::builder()
            .chrome_executable(chrome_path)
            .window_size(1400, 1000)
            .arg("--disable-gpu")
            .arg("--no-sandbox")
            .arg("--disable-dev-shm-usage")
            .arg("--disable-extensions")
            .arg("--disable-background-networking")
            .arg(format!("--user-agent={USER_AGENT}"));
        if headful {
            builder = builder.with_head();
        }
        let config = builder
            .build()
            .map_err(|e| anyhow::anyhow!("failed to build browser config: {e}"))?;

        let (browser, mut handler) = Browser::launch(config)
            .await
            .context("failed to launch Chromium")?;

        // Drive the CDP connection for the lifetime of the session.
        let handler_task = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                let _ = event;
            }
        });

        Ok(Self {
            browser,
            handler_task,
        })
    }

    /// Open a page with the response observer already attached.
    ///
    /// The observer must exist before any navigation so the earliest feed
    /// responses are not missed.
    pub async fn open_page(&self, classifier: Classifier) -> Result<Box<dyn EventPage>> {
        let page = self
            .browser
            .new_page("about:blank")
            .await
            .context("failed to create page")?;

        page.execute(EnableParams::default())
            .await
            .context("failed to enable network events")?;

        let responses = spawn_sniffer(&page, classifier).await?;

        Ok(Box::new(ChromiumPage {
            page,
            responses: Some(responses),
        }))
    }

    /// Tear the browser down.
    pub async fn shutdown(mut self) -> Result<()> {
        if let Err(e) = self.browser.close().await {
            tracing::debug!("browser close failed: {e}");
        }
        self.handler_task.abort();
        Ok(())
    }
}

/// Forward candidate response bodies into an unbounded channel.
///
/// `responseReceived` fires before the body is readable; the fetch waits for
/// `loadingFinished` of the same request id. Bodies that cannot be read
/// (evicted from the buffer, connection reset) are logged and dropped.
async fn spawn_sniffer(
    page: &Page,
    classifier: Classifier,
) -> Result<mpsc::UnboundedReceiver<SniffedResponse>> {
    let (tx, rx) = mpsc::unbounded_channel();

    let mut received = page
        .event_listener::<EventResponseReceived>()
        .await
        .context("failed to listen for responses")?;
    let mut finished = page
        .event_listener::<EventLoadingFinished>()
        .await
        .context("failed to listen for load completion")?;

    let page = page.clone();
    tokio::spawn(async move {
        let mut pending: HashMap<RequestId, String> = HashMap::new();
        loop {
            tokio::select! {
                ev = received.next() => {
                    let Some(ev) = ev else { break };
                    if classifier.is_candidate(&ev.response.url) {
                        pending.insert(ev.request_id.clone(), ev.response.url.clone());
                    }
                }
                ev = finished.next() => {
                    let Some(ev) = ev else { break };
                    let Some(url) = pending.remove(&ev.request_id) else { continue };
                    match page.execute(GetResponseBodyParams::new(ev.request_id.clone())).await {
                        Ok(resp) => {
                            let sniffed = SniffedResponse {
                                url,
                                body: resp.body.clone(),
                                base64: resp.base64_encoded,
                            };
                            if tx.send(sniffed).is_err() {
                                break;
                            }
                        }
                        Err(e) => tracing::debug!(%url, "response body unavailable: {e}"),
                    }
                }
            }
        }
    });

    Ok(rx)
}

/// A single live Chromium page.
pub struct ChromiumPage {
    page: Page,
    responses: Option<mpsc::UnboundedReceiver<SniffedResponse>>,
}

#[async_trait]
impl EventPage for ChromiumPage {
    async fn navigate(&mut self, url: &str, timeout_ms: u64) -> Result<()> {
        let result = tokio::time::timeout(
            std::time::Duration::from_millis(timeout_ms),
            self.page.goto(url),
        )
        .await;

        match result {
            Ok(Ok(_)) => {
                let _ = self.page.wait_for_navigation().await;
                Ok(())
            }
            Ok(Err(e)) => bail!("navigation failed: {e}"),
            Err(_) => bail!("navigation timed out after {timeout_ms}ms"),
        }
    }

    async fn evaluate(&self, script: &str) -> Result<serde_json::Value> {
        let result = self
            .page
            .evaluate(script)
            .await
            .context("JS evaluation failed")?;

        // Scripts returning undefined are fine; callers treat the result
        // as advisory.
        Ok(result.value().cloned().unwrap_or(serde_json::Value::Null))
    }

    async fn wheel(&self, delta_y: f64) -> Result<()> {
        let params = DispatchMouseEventParams::builder()
            .r#type(DispatchMouseEventType::MouseWheel)
            .x(WHEEL_X)
            .y(WHEEL_Y)
            .delta_x(0.0)
            .delta_y(delta_y)
            .build()
            .map_err(|e| anyhow::anyhow!("failed to build wheel event: {e}"))?;
        self.page
            .execute(params)
            .await
            .context("wheel dispatch failed")?;
        Ok(())
    }

    async fn html(&self) -> Result<String> {
        let result = self
            .page
            .evaluate("document.documentElement.outerHTML")
            .await
            .context("failed to read markup")?;
        let html: String = result
            .into_value()
            .map_err(|e| anyhow::anyhow!("failed to convert markup result: {e:?}"))?;
        Ok(html)
    }

    fn take_responses(&mut self) -> Option<mpsc::UnboundedReceiver<SniffedResponse>> {
        self.responses.take()
    }

    async fn close(self: Box<Self>) -> Result<()> {
        let _ = self.page.close().await;
        Ok(())
    }
}
