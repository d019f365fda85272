//! Feed capture: write-once slots, the orchestrator state machine, and the
//! terminal outcome of a run.

pub mod orchestrator;
pub mod ui;

use crate::classify::FeedKind;
use crate::fallback;
use crate::http::FetchClient;
use self::orchestrator::SniffReport;
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::Mutex;

/// A captured feed: opaque payload plus the URL it arrived from.
#[derive(Debug, Clone)]
pub struct CapturedFeed {
    pub payload: Value,
    pub source_url: String,
}

/// Write-once holder for one feed. First match wins; later writes are
/// ignored for the rest of the run.
#[derive(Debug, Default)]
pub struct FeedSlot {
    feed: Option<CapturedFeed>,
}

impl FeedSlot {
    /// Store the feed unless one is already present. Returns whether the
    /// write won.
    pub fn set_if_absent(&mut self, payload: Value, source_url: String) -> bool {
        if self.feed.is_some() {
            return false;
        }
        self.feed = Some(CapturedFeed {
            payload,
            source_url,
        });
        true
    }

    pub fn is_present(&self) -> bool {
        self.feed.is_some()
    }
}

/// Both slots, shared between the response listener task and the polling
/// loop. Set-if-absent is the only mutation, so plain mutexes with short
/// critical sections are enough; ties go to arrival order.
#[derive(Debug, Default)]
pub struct FeedSlots {
    split: Mutex<FeedSlot>,
    results: Mutex<FeedSlot>,
}

impl FeedSlots {
    fn slot(&self, kind: FeedKind) -> &Mutex<FeedSlot> {
        match kind {
            FeedKind::Split => &self.split,
            FeedKind::Results => &self.results,
        }
    }

    /// First-match-wins write. Returns whether the write won.
    pub fn set_if_absent(&self, kind: FeedKind, payload: Value, source_url: String) -> bool {
        self.slot(kind)
            .lock()
            .expect("feed slot poisoned")
            .set_if_absent(payload, source_url)
    }

    pub fn present(&self, kind: FeedKind) -> bool {
        self.slot(kind).lock().expect("feed slot poisoned").is_present()
    }

    pub fn both_present(&self) -> bool {
        self.present(FeedKind::Split) && self.present(FeedKind::Results)
    }

    /// Remove and return a captured feed.
    pub fn take(&self, kind: FeedKind) -> Option<CapturedFeed> {
        self.slot(kind)
            .lock()
            .expect("feed slot poisoned")
            .feed
            .take()
    }
}

/// The two conditions that end a run with a nonzero exit.
///
/// Everything else (decode failures, missed clicks, fallback exhaustion,
/// asset fetch errors) is recovered locally and logged.
#[derive(Debug, thiserror::Error)]
pub enum CaptureError {
    #[error("navigation failed: {0}")]
    Navigation(String),
    #[error("deadline exceeded before the split feed was captured")]
    Timeout,
}

/// Terminal value of one capture run. Total failure is the error path.
#[derive(Debug)]
pub enum CaptureOutcome {
    /// Both feeds arrived over the network.
    Success {
        split: CapturedFeed,
        results: CapturedFeed,
    },
    /// The split feed arrived; results were synthesized by the fallback
    /// resolver (or degraded to the empty placeholder).
    Partial {
        split: CapturedFeed,
        results_fallback: Value,
    },
}

impl CaptureOutcome {
    pub fn split(&self) -> &CapturedFeed {
        match self {
            CaptureOutcome::Success { split, .. } => split,
            CaptureOutcome::Partial { split, .. } => split,
        }
    }

    pub fn results_payload(&self) -> &Value {
        match self {
            CaptureOutcome::Success { results, .. } => &results.payload,
            CaptureOutcome::Partial {
                results_fallback, ..
            } => results_fallback,
        }
    }

    /// Source URL of the results feed, when it was a real capture.
    pub fn results_source(&self) -> Option<&str> {
        match self {
            CaptureOutcome::Success { results, .. } => Some(results.source_url.as_str()),
            CaptureOutcome::Partial { .. } => None,
        }
    }
}

/// Resolve a sniff report into a terminal outcome, running the fallback
/// path when the results feed never arrived.
pub async fn resolve_outcome(
    report: SniffReport,
    client: &FetchClient,
    url: &str,
) -> (CaptureOutcome, BTreeMap<String, String>) {
    let SniffReport {
        split,
        results,
        logos,
    } = report;

    let outcome = match results {
        Some(results) => CaptureOutcome::Success { split, results },
        None => {
            let results_fallback = match fallback::resolve(client, url).await {
                Some(doc) => doc,
                None => {
                    tracing::warn!("no results data obtainable; writing empty placeholder");
                    fallback::empty_placeholder()
                }
            };
            CaptureOutcome::Partial {
                split,
                results_fallback,
            }
        }
    };

    (outcome, logos)
}
