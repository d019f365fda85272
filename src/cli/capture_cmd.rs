//! `splitcap capture --url <event-url>` — capture both feeds and team
//! colors for one event.

use crate::capture::{self, orchestrator, CaptureOutcome};
use crate::classify::Classifier;
use crate::colors;
use crate::http::FetchClient;
use crate::renderer::chromium::ChromiumSession;
use crate::store::{self, EventStore};
use anyhow::{Context, Result};
use std::path::Path;
use std::time::Duration;

/// Run the capture command. Exits early on a cache hit.
pub async fn run(
    url: &str,
    out_dir: &Path,
    force: bool,
    headful: bool,
    deadline_secs: u64,
) -> Result<()> {
    let parsed = url::Url::parse(url).with_context(|| format!("invalid event URL: {url}"))?;
    if !matches!(parsed.scheme(), "http" | "https") {
        anyhow::bail!("unsupported URL scheme: {}", parsed.scheme());
    }

    let event_id = store::event_id_from_url(url);
    let event_store = EventStore::new(out_dir, &event_id);

    if !force && event_store.is_complete() {
        tracing::info!(event = %event_id, "cache hit, skipping capture");
        println!("cache hit → {}", event_store.dir().display());
        return Ok(());
    }
    event_store.ensure()?;

    let classifier = Classifier::default();
    let config = orchestrator::CaptureConfig {
        deadline: Duration::from_secs(deadline_secs),
        ..orchestrator::CaptureConfig::default()
    };

    let session = ChromiumSession::launch(headful).await?;
    let report = match session.open_page(classifier.clone()).await {
        Ok(page) => orchestrator::run(page, url, &classifier, &config).await,
        Err(e) => {
            let _ = session.shutdown().await;
            return Err(e);
        }
    };
    if let Err(e) = session.shutdown().await {
        tracing::debug!("browser shutdown failed: {e:#}");
    }
    let report = report?;

    let client = FetchClient::new(30_000);
    let (outcome, logos) = capture::resolve_outcome(report, &client, url).await;

    // Terminal outcome reached; only now touch the disk.
    let split_path = event_store.write_split(&outcome.split().payload)?;
    println!("wrote {}", split_path.display());

    if let CaptureOutcome::Partial { .. } = outcome {
        tracing::warn!("results feed not captured; wrote synthesized document");
    }
    let results_path = event_store.write_results(outcome.results_payload())?;
    println!("wrote {}", results_path.display());

    let team_colors = colors::build_team_colors(&client, &logos).await;
    let colors_path = event_store.write_colors(&team_colors)?;
    println!("wrote {} ({} teams)", colors_path.display(), team_colors.len());

    println!("done → {}", event_store.dir().display());
    Ok(())
}
