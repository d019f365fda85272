//! Team color extraction from SVG logo assets.
//!
//! Pure per logo: fetch the raw vector markup, pattern-match every six-digit
//! hex literal, then pick a "primary" color by skipping near-black and
//! near-white values. Asset fetch failures degrade to an entry with no
//! palette; they are never fatal.

use crate::http::FetchClient;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Near-black / near-white values that never read as a team color.
const NEUTRAL_HEXES: [&str; 9] = [
    "#000000", "#0D0D0D", "#111111", "#1A1A1A", "#212121", "#FFFFFF", "#FFFDFD", "#FEFEFE",
    "#F6F6F6",
];

/// One team's derived colors, keyed by team name in the output document.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TeamColorEntry {
    /// The logo asset the colors came from.
    pub logo_url: String,
    /// Primary color, empty when no usable color was found.
    pub primary_hex: String,
    /// Every distinct hex literal in the asset, uppercased, sorted.
    pub palette: Vec<String>,
}

/// All distinct six-digit hex literals in the markup, uppercased and sorted.
pub fn extract_hexes(svg_text: &str) -> Vec<String> {
    let re = Regex::new(r"#[0-9A-Fa-f]{6}").expect("hex regex is valid");
    let uniq: BTreeSet<String> = re
        .find_iter(svg_text)
        .map(|m| m.as_str().to_ascii_lowercase())
        .collect();
    uniq.into_iter().map(|h| h.to_ascii_uppercase()).collect()
}

/// First non-neutral palette entry, else the first entry, else none.
pub fn pick_primary(hexes: &[String]) -> Option<String> {
    hexes
        .iter()
        .find(|h| !NEUTRAL_HEXES.contains(&h.to_ascii_uppercase().as_str()))
        .or_else(|| hexes.first())
        .cloned()
}

/// Fetch logo markup. Only vector assets are worth fetching; anything else
/// (raster logos, empty URLs) is skipped without a request.
pub async fn fetch_vector_text(client: &FetchClient, url: &str) -> Option<String> {
    if url.is_empty() || !url.to_ascii_lowercase().contains(".svg") {
        return None;
    }
    match client.get_text(url, 20_000).await {
        Ok(f) if f.status < 400 => Some(f.body),
        Ok(f) => {
            tracing::debug!(status = f.status, %url, "logo fetch rejected");
            None
        }
        Err(e) => {
            tracing::debug!(%url, "logo fetch failed: {e:#}");
            None
        }
    }
}

/// Build the team → color mapping for every harvested logo.
///
/// Teams with an empty name fall back to the logo filename as their key.
pub async fn build_team_colors(
    client: &FetchClient,
    logos: &BTreeMap<String, String>,
) -> BTreeMap<String, TeamColorEntry> {
    let mut out = BTreeMap::new();
    for (team, url) in logos {
        let hexes = match fetch_vector_text(client, url).await {
            Some(svg) => extract_hexes(&svg),
            None => Vec::new(),
        };
        let primary = pick_primary(&hexes).unwrap_or_default();
        let key = if team.is_empty() {
            url.rsplit('/').next().unwrap_or(url).to_string()
        } else {
            team.clone()
        };
        out.insert(
            key,
            TeamColorEntry {
                logo_url: url.clone(),
                primary_hex: primary,
                palette: hexes,
            },
        );
    }
    out
}
