//! `events.json` manifest generation.
//!
//! The manifest is the catalog the result-viewer UI loads: one record per
//! captured event, newest first. It can be derived from a parsed race list
//! (rich metadata) or rebuilt by scanning the output directory (minimal
//! metadata for events whose list entry is long gone).

use crate::batch::RaceEntry;
use crate::store::SPLIT_FILE;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Manifest filename under the output root.
pub const MANIFEST_FILE: &str = "events.json";

/// One manifest record. The capture URL is deliberately absent.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ManifestEvent {
    pub id: String,
    pub name: String,
    pub date: String,
    pub location: String,
    pub gender: String,
    pub distance: String,
}

/// Build a manifest from a parsed race list, sorted by date descending.
pub fn from_races(races: &[RaceEntry]) -> Vec<ManifestEvent> {
    let mut events: Vec<ManifestEvent> = races
        .iter()
        .map(|r| ManifestEvent {
            id: r.id.clone(),
            name: r.name.clone(),
            date: r.date.clone(),
            location: r.location.clone(),
            gender: r.gender.clone(),
            distance: r.distance.clone(),
        })
        .collect();
    events.sort_by(|a, b| b.date.cmp(&a.date));
    events
}

/// Rebuild a minimal manifest by scanning event directories.
///
/// Only directories holding a split report count as events; anything else
/// under the root is skipped.
pub fn from_store(root: &Path) -> Result<Vec<ManifestEvent>> {
    let mut events = Vec::new();
    let entries = fs::read_dir(root)
        .with_context(|| format!("failed to read output root: {}", root.display()))?;

    let mut dirs: Vec<PathBuf> = entries
        .flatten()
        .map(|e| e.path())
        .filter(|p| p.is_dir())
        .collect();
    dirs.sort();

    for dir in dirs {
        if !dir.join(SPLIT_FILE).exists() {
            tracing::debug!(dir = %dir.display(), "skipping: no split report");
            continue;
        }
        let Some(id) = dir.file_name().and_then(|n| n.to_str()) else {
            continue;
        };
        events.push(ManifestEvent {
            id: id.to_string(),
            name: format!("Event {id}"),
            date: "Unknown".to_string(),
            location: "Unknown".to_string(),
            gender: "Unknown".to_string(),
            distance: "5K".to_string(),
        });
    }
    Ok(events)
}

/// Write the manifest under the output root.
pub fn write(root: &Path, events: &[ManifestEvent]) -> Result<PathBuf> {
    fs::create_dir_all(root)
        .with_context(|| format!("failed to create output root: {}", root.display()))?;
    let path = root.join(MANIFEST_FILE);
    let text = serde_json::to_string_pretty(events).context("failed to serialize manifest")?;
    fs::write(&path, text).with_context(|| format!("failed to write {}", path.display()))?;
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::batch::parse_input;
    use serde_json::json;

    #[test]
    fn test_from_races_sorted_newest_first_and_no_url() {
        let races = parse_input(
            "Women 5000m\nEarly Meet | Sep 1, 2025 | 9 AM\nhttps://x.com/events/xc/1\n\n\
             Men 8000m\nLate Meet | Oct 31, 2025 | 9 AM\nhttps://x.com/events/xc/2\n",
        );
        let events = from_races(&races);
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].id, "2");
        assert_eq!(events[1].id, "1");

        let text = serde_json::to_string(&events).expect("serialize");
        assert!(!text.contains("\"url\""));
    }

    #[test]
    fn test_from_store_requires_split_report() {
        let root = tempfile::tempdir().expect("tempdir");
        fs::create_dir_all(root.path().join("100")).expect("mkdir");
        fs::create_dir_all(root.path().join("200")).expect("mkdir");
        fs::write(
            root.path().join("200").join(SPLIT_FILE),
            serde_json::to_string(&json!({"_source": {}})).expect("serialize"),
        )
        .expect("write");

        let events = from_store(root.path()).expect("scan failed");
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].id, "200");
        assert_eq!(events[0].name, "Event 200");
    }

    #[test]
    fn test_write_round_trip() {
        let root = tempfile::tempdir().expect("tempdir");
        let events = vec![ManifestEvent {
            id: "7".into(),
            name: "Event 7".into(),
            date: "2025-10-31".into(),
            location: "Unknown".into(),
            gender: "Women".into(),
            distance: "5K".into(),
        }];
        let path = write(root.path(), &events).expect("write failed");
        let back: Vec<ManifestEvent> =
            serde_json::from_str(&fs::read_to_string(path).expect("read")).expect("parse");
        assert_eq!(back.len(), 1);
        assert_eq!(back[0].id, "7");
    }
}
