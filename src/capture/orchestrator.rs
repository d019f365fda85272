//! The capture state machine.
//!
//! Starting → Listening → Polling → {Resolved, TimedOut}. The response
//! listener runs as a spawned task for the whole session, decoding candidate
//! bodies into write-once slots; the polling loop keeps poking the page UI
//! (alternating tab clicks, scroll bursts) until both slots fill or the
//! wall-clock deadline passes. The split feed is mandatory; a run that ends
//! without it fails with [`CaptureError::Timeout`].
//!
//! The page is reached only through [`EventPage`], so the whole machine runs
//! against a scripted fake in tests. The session is torn down on every exit
//! path that ends polling.

use super::{ui, CaptureError, CapturedFeed, FeedSlots};
use crate::classify::{Classifier, FeedKind};
use crate::harvest;
use crate::renderer::{EventPage, SniffedResponse};
use base64::Engine as _;
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// Timing knobs and tab label sets for one capture run.
#[derive(Debug, Clone)]
pub struct CaptureConfig {
    /// Overall wall-clock budget, measured from navigation start.
    pub deadline: Duration,
    /// Budget for the initial page load.
    pub navigation_timeout: Duration,
    /// Settle after DOM readiness before the first UI action.
    pub dom_settle: Duration,
    /// Scroll budget per warm-up pass.
    pub warmup_scroll: Duration,
    /// Scroll budget per polling iteration.
    pub loop_scroll: Duration,
    /// Pause between polling iterations.
    pub loop_settle: Duration,
    /// Budget per tab-click attempt.
    pub tab_attempt_timeout: Duration,
    /// Settle after a successful tab click.
    pub tab_settle: Duration,
    /// Labels tried for the splits tab, in order.
    pub split_labels: Vec<String>,
    /// Labels tried for the results tab, in order. Sites vary.
    pub results_labels: Vec<String>,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            deadline: Duration::from_secs(120),
            navigation_timeout: Duration::from_secs(60),
            dom_settle: Duration::from_millis(800),
            warmup_scroll: Duration::from_secs(2),
            loop_scroll: Duration::from_millis(1800),
            loop_settle: Duration::from_millis(350),
            tab_attempt_timeout: Duration::from_millis(900),
            tab_settle: Duration::from_millis(350),
            split_labels: vec!["Splits".into(), "SPLITS".into(), "Split".into()],
            results_labels: vec![
                "Results".into(),
                "RESULTS".into(),
                "Individuals".into(),
                "INDIVIDUALS".into(),
                "Individual".into(),
                "Athletes".into(),
            ],
        }
    }
}

/// What one run sniffed out of the page. The split feed is guaranteed;
/// results may still need the fallback path.
#[derive(Debug)]
pub struct SniffReport {
    pub split: CapturedFeed,
    pub results: Option<CapturedFeed>,
    /// Team key → logo URL, harvested from markup first, then feeds.
    pub logos: BTreeMap<String, String>,
}

/// Run one capture session against the event URL.
///
/// Owns the page for the duration and closes it on every exit path.
pub async fn run(
    mut page: Box<dyn EventPage>,
    url: &str,
    classifier: &Classifier,
    config: &CaptureConfig,
) -> Result<SniffReport, CaptureError> {
    let result = drive(page.as_mut(), url, classifier, config).await;
    if let Err(e) = page.close().await {
        tracing::debug!("page close failed: {e}");
    }
    result
}

async fn drive(
    page: &mut dyn EventPage,
    url: &str,
    classifier: &Classifier,
    config: &CaptureConfig,
) -> Result<SniffReport, CaptureError> {
    let slots = Arc::new(FeedSlots::default());

    // Listening starts before navigation so no in-flight response is missed.
    let responses = page
        .take_responses()
        .ok_or_else(|| CaptureError::Navigation("response stream unavailable".into()))?;
    let listener = spawn_listener(responses, classifier.clone(), Arc::clone(&slots));

    let started = Instant::now();
    tracing::info!(%url, "navigating");
    if let Err(e) = page
        .navigate(url, config.navigation_timeout.as_millis() as u64)
        .await
    {
        listener.abort();
        return Err(CaptureError::Navigation(format!("{e:#}")));
    }
    tokio::time::sleep(config.dom_settle).await;

    // Warm-up: one pass over each tab. Some sites fire both feed requests
    // off a single tab, others need each tab rendered once.
    ui::click_tab(page, &config.results_labels, config.tab_attempt_timeout, config.tab_settle)
        .await;
    ui::scroll_everywhere(page, config.warmup_scroll).await;
    ui::click_tab(page, &config.split_labels, config.tab_attempt_timeout, config.tab_settle)
        .await;
    ui::scroll_everywhere(page, config.warmup_scroll).await;

    // Alternate tabs until both feeds land or the deadline passes.
    let deadline = started + config.deadline;
    let mut want_splits = true;
    while !slots.both_present() && Instant::now() < deadline {
        let labels = if want_splits {
            &config.split_labels
        } else {
            &config.results_labels
        };
        want_splits = !want_splits;

        ui::click_tab(page, labels, config.tab_attempt_timeout, config.tab_settle).await;
        if slots.both_present() {
            break;
        }
        ui::scroll_everywhere(page, config.loop_scroll).await;
        tokio::time::sleep(config.loop_settle).await;
    }

    // Resolved (or timed out): harvest logos while the page is still alive.
    let mut logos = BTreeMap::new();
    match page.html().await {
        Ok(html) => harvest::logos_from_markup(&html, &mut logos),
        Err(e) => tracing::warn!("could not read page markup for logo harvest: {e}"),
    }

    listener.abort();

    let split = slots.take(FeedKind::Split);
    let results = slots.take(FeedKind::Results);

    if let Some(feed) = &split {
        harvest::logos_from_feed(&feed.payload, &mut logos);
    }
    if let Some(feed) = &results {
        harvest::logos_from_feed(&feed.payload, &mut logos);
    }

    let elapsed = started.elapsed();
    match split {
        Some(split) => {
            tracing::info!(
                elapsed_ms = elapsed.as_millis() as u64,
                results_captured = results.is_some(),
                logos = logos.len(),
                "capture resolved"
            );
            Ok(SniffReport {
                split,
                results,
                logos,
            })
        }
        None => {
            tracing::error!(
                elapsed_ms = elapsed.as_millis() as u64,
                "split feed never arrived"
            );
            Err(CaptureError::Timeout)
        }
    }
}

/// Drain the response stream into the slots.
///
/// Duplicate matches for a present slot are dropped, so retried requests
/// cannot overwrite the first capture. Decode failures are logged and the
/// response ignored; they never abort the run.
fn spawn_listener(
    mut responses: mpsc::UnboundedReceiver<SniffedResponse>,
    classifier: Classifier,
    slots: Arc<FeedSlots>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(resp) = responses.recv().await {
            let Some(kind) = classifier.classify(&resp.url) else {
                continue;
            };
            if slots.present(kind) {
                continue;
            }
            let Some(doc) = decode_feed_body(&resp.body, resp.base64) else {
                tracing::warn!(url = %resp.url, "feed URL matched but body would not decode");
                continue;
            };
            if !doc.is_object() {
                continue;
            }
            if slots.set_if_absent(kind, doc, resp.url.clone()) {
                tracing::info!(url = %resp.url, ?kind, "captured feed");
            }
        }
    })
}

/// Decode a response body into JSON: native parse first, then the
/// base64-flagged path, then a whitespace/BOM-tolerant retry.
pub(crate) fn decode_feed_body(body: &str, base64_flagged: bool) -> Option<Value> {
    if let Ok(v) = serde_json::from_str::<Value>(body) {
        return Some(v);
    }
    if base64_flagged {
        let bytes = base64::engine::general_purpose::STANDARD
            .decode(body.trim())
            .ok()?;
        let text = String::from_utf8(bytes).ok()?;
        return serde_json::from_str(&text).ok();
    }
    serde_json::from_str(body.trim_start_matches('\u{feff}').trim()).ok()
}
