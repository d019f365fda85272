//! `splitcap batch --input race_input.txt` — capture every race in a
//! curated list, then write the events manifest.
//!
//! Entries run strictly sequentially with a fixed inter-run delay. A failed
//! entry is counted and logged, never fatal for the batch.

use crate::batch;
use crate::cli::capture_cmd;
use crate::manifest;
use anyhow::{bail, Context, Result};
use std::fs;
use std::path::Path;
use std::time::Duration;

pub async fn run(
    input: &Path,
    out_dir: &Path,
    force: bool,
    headful: bool,
    deadline_secs: u64,
    dry_run: bool,
    delay_secs: u64,
) -> Result<()> {
    let text = fs::read_to_string(input)
        .with_context(|| format!("failed to read race list: {}", input.display()))?;
    let races = batch::parse_input(&text);
    if races.is_empty() {
        bail!("no races found in {}", input.display());
    }
    println!("found {} races in {}", races.len(), input.display());

    let mut captured = 0usize;
    let mut failed = 0usize;

    for (i, race) in races.iter().enumerate() {
        println!("[{}/{}] {}", i + 1, races.len(), race.name);

        if dry_run {
            println!("  dry run, would capture {}", race.url);
            continue;
        }

        match capture_cmd::run(&race.url, out_dir, force, headful, deadline_secs).await {
            Ok(()) => captured += 1,
            Err(e) => {
                failed += 1;
                tracing::error!(url = %race.url, "capture failed: {e:#}");
            }
        }

        if i + 1 < races.len() {
            tokio::time::sleep(Duration::from_secs(delay_secs)).await;
        }
    }

    if !dry_run {
        let events = manifest::from_races(&races);
        let path = manifest::write(out_dir, &events)?;
        println!("wrote {} ({} events)", path.display(), events.len());
    }

    println!("batch complete: {captured} captured, {failed} failed");
    Ok(())
}
