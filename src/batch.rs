//! Curated race list parsing.
//!
//! The input is a plain text file of blank-line-separated three-line blocks:
//!
//! ```text
//! Women 5000m College
//! 2025 Sun Belt XC Championship | Oct 31, 2025 | 9:32 AM EDT
//! https://live.xpresstiming.com/meets/57259/events/xc/2149044
//! ```
//!
//! Parsing is forgiving: malformed blocks are logged and skipped, never
//! fatal, so one bad entry cannot sink a whole batch.

use crate::store::event_id_from_url;
use chrono::NaiveDate;

/// One parsed race entry, ready to drive a capture run.
#[derive(Debug, Clone)]
pub struct RaceEntry {
    /// Event id extracted from the URL.
    pub id: String,
    /// Display name, e.g. `2025 Sun Belt XC Championship - Women's 5K`.
    pub name: String,
    /// ISO date when parseable, the raw text otherwise.
    pub date: String,
    pub location: String,
    pub gender: String,
    pub distance: String,
    /// The event URL to capture.
    pub url: String,
}

/// Parse the whole input file into race entries.
pub fn parse_input(text: &str) -> Vec<RaceEntry> {
    let mut entries = Vec::new();
    let mut block: Vec<&str> = Vec::new();

    for line in text.lines() {
        let line = line.trim();
        if !line.is_empty() {
            block.push(line);
            continue;
        }
        flush_block(&mut block, &mut entries);
    }
    // A file that does not end with a blank line still has a final block.
    flush_block(&mut block, &mut entries);

    entries
}

fn flush_block(block: &mut Vec<&str>, entries: &mut Vec<RaceEntry>) {
    if block.is_empty() {
        return;
    }
    match parse_entry(block) {
        Some(entry) => {
            tracing::debug!(name = %entry.name, date = %entry.date, "parsed race entry");
            entries.push(entry);
        }
        None => tracing::warn!(lines = ?block, "skipping malformed race entry"),
    }
    block.clear();
}

/// Parse one three-line block: description / `meet | date | time` / URL.
fn parse_entry(lines: &[&str]) -> Option<RaceEntry> {
    if lines.len() != 3 {
        return None;
    }
    let description = lines[0];
    let metadata = lines[1];
    let url = lines[2];

    let gender = parse_gender(description);
    let distance = parse_distance(description);

    let parts: Vec<&str> = metadata.split('|').map(str::trim).collect();
    let meet_name = parts.first().copied().unwrap_or("Unknown Meet");
    let date = parts.get(1).map(|d| parse_date(d)).unwrap_or_else(|| "Unknown".to_string());

    Some(RaceEntry {
        id: event_id_from_url(url),
        name: format!("{meet_name} - {gender}'s {distance}"),
        date,
        location: "Unknown".to_string(),
        gender: gender.to_string(),
        distance,
        url: url.to_string(),
    })
}

/// `women`/`female` before `men`: every "women" also contains "men".
fn parse_gender(line: &str) -> &'static str {
    let l = line.to_ascii_lowercase();
    if l.contains("women") || l.contains("female") {
        "Women"
    } else if l.contains("men") || l.contains("male") {
        "Men"
    } else {
        "Unknown"
    }
}

/// Map metric distances to the display forms the manifest uses.
fn parse_distance(line: &str) -> String {
    const DISTANCES: [(&str, &str); 8] = [
        ("5000m", "5K"),
        ("5k", "5K"),
        ("6000m", "6K"),
        ("6k", "6K"),
        ("8000m", "8K"),
        ("8k", "8K"),
        ("10000m", "10K"),
        ("10k", "10K"),
    ];
    let l = line.to_ascii_lowercase();
    for (token, display) in DISTANCES {
        if l.contains(token) {
            return display.to_string();
        }
    }
    "Unknown".to_string()
}

/// Normalize `Oct 31, 2025` or `October 31, 2025` to `2025-10-31`;
/// anything else passes through unchanged.
fn parse_date(text: &str) -> String {
    let text = text.trim();
    for fmt in ["%b %d, %Y", "%B %d, %Y"] {
        if let Ok(d) = NaiveDate::parse_from_str(text, fmt) {
            return d.format("%Y-%m-%d").to_string();
        }
    }
    text.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    const INPUT: &str = "\
Women 5000m College
2025 Sun Belt XC Championship | Oct 31, 2025 | 9:32 AM EDT
https://live.xpresstiming.com/meets/57259/events/xc/2149044

Men 8000m College
2025 Sun Belt XC Championship | October 31, 2025 | 10:15 AM EDT
https://live.xpresstiming.com/meets/57259/events/xc/2149045
";

    #[test]
    fn test_parse_input_blocks() {
        let races = parse_input(INPUT);
        assert_eq!(races.len(), 2);

        let women = &races[0];
        assert_eq!(women.id, "2149044");
        assert_eq!(women.name, "2025 Sun Belt XC Championship - Women's 5K");
        assert_eq!(women.date, "2025-10-31");
        assert_eq!(women.gender, "Women");
        assert_eq!(women.distance, "5K");

        let men = &races[1];
        assert_eq!(men.gender, "Men");
        assert_eq!(men.distance, "8K");
        assert_eq!(men.date, "2025-10-31");
    }

    #[test]
    fn test_final_block_without_trailing_blank_line() {
        let races = parse_input(INPUT.trim_end());
        assert_eq!(races.len(), 2);
    }

    #[test]
    fn test_malformed_block_skipped() {
        let text = "just one line\n\nWomen 6000m\nMeet | Nov 1, 2025 | 9 AM\nhttps://x.com/events/xc/7\n";
        let races = parse_input(text);
        assert_eq!(races.len(), 1);
        assert_eq!(races[0].id, "7");
        assert_eq!(races[0].distance, "6K");
    }

    #[test]
    fn test_gender_ordering_women_before_men() {
        assert_eq!(parse_gender("Women 5000m"), "Women");
        assert_eq!(parse_gender("Men 8000m"), "Men");
        assert_eq!(parse_gender("Open 4 mile"), "Unknown");
    }

    #[test]
    fn test_unparseable_date_passes_through() {
        assert_eq!(parse_date("Halloween 2025"), "Halloween 2025");
        assert_eq!(parse_date(" Oct 31, 2025 "), "2025-10-31");
    }
}
