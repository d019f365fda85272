//! Logo harvesting from rendered page markup and captured feed payloads.
//!
//! Feed documents belong to the external site, not to us: every field walked
//! here is optional and absence is tolerated. First occurrence per team wins,
//! so harvest order (markup, then feeds) decides ties.

use scraper::{Html, Selector};
use serde_json::Value;
use std::collections::BTreeMap;

/// Harvest `img` tags following the site's team-asset convention
/// (a `team-images` path segment and an `.svg` suffix).
pub fn logos_from_markup(html: &str, logos: &mut BTreeMap<String, String>) {
    let doc = Html::parse_document(html);
    let sel = match Selector::parse(r#"img[src*="team-images"][src$=".svg"]"#) {
        Ok(s) => s,
        Err(_) => return,
    };
    for img in doc.select(&sel) {
        let Some(src) = img.value().attr("src") else {
            continue;
        };
        if src.is_empty() {
            continue;
        }
        let alt = img.value().attr("alt").map(str::trim).unwrap_or("");
        let key = if alt.is_empty() {
            logo_filename(src)
        } else {
            alt.to_string()
        };
        logos.entry(key).or_insert_with(|| src.to_string());
    }
}

/// Harvest team/logo pairs from a captured feed payload.
///
/// Walks the known nested arrays (`_source.spr`, `_source.r`), unwrapping the
/// per-row `r` record where present, then reads the team node at `a.t` with
/// `f`/`n` name fields and `lg`/`logo` URL fields.
pub fn logos_from_feed(doc: &Value, logos: &mut BTreeMap<String, String>) {
    let Some(source) = doc.get("_source") else {
        return;
    };
    for arr_key in ["spr", "r"] {
        let Some(rows) = source.get(arr_key).and_then(Value::as_array) else {
            continue;
        };
        for entry in rows {
            let record = match entry.get("r") {
                Some(r) if r.is_object() => r,
                _ => entry,
            };
            let Some(team_node) = record.get("a").and_then(|a| a.get("t")) else {
                continue;
            };
            let team = str_field(team_node, &["f", "n"]);
            let logo = str_field(team_node, &["lg", "logo"]);
            if let (Some(team), Some(logo)) = (team, logo) {
                logos
                    .entry(team.to_string())
                    .or_insert_with(|| logo.to_string());
            }
        }
    }
}

/// First non-empty string value among the given keys.
fn str_field<'a>(v: &'a Value, keys: &[&str]) -> Option<&'a str> {
    keys.iter()
        .filter_map(|k| v.get(*k).and_then(Value::as_str))
        .find(|s| !s.is_empty())
}

fn logo_filename(src: &str) -> String {
    src.rsplit('/').next().unwrap_or(src).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_markup_harvest_matches_convention() {
        let html = r#"
            <div>
              <img src="/cdn/team-images/gulls.svg" alt="Sea Gulls">
              <img src="/cdn/team-images/owls.svg" alt="">
              <img src="/cdn/other/banner.svg" alt="Banner">
              <img src="/cdn/team-images/hawks.png" alt="Hawks">
            </div>"#;
        let mut logos = BTreeMap::new();
        logos_from_markup(html, &mut logos);

        assert_eq!(logos.get("Sea Gulls").map(String::as_str), Some("/cdn/team-images/gulls.svg"));
        // Blank alt falls back to the asset filename.
        assert_eq!(logos.get("owls.svg").map(String::as_str), Some("/cdn/team-images/owls.svg"));
        // Non-matching path and non-vector assets are skipped.
        assert_eq!(logos.len(), 2);
    }

    #[test]
    fn test_markup_harvest_first_wins() {
        let html = r#"
            <img src="/a/team-images/one.svg" alt="Gulls">
            <img src="/a/team-images/two.svg" alt="Gulls">"#;
        let mut logos = BTreeMap::new();
        logos_from_markup(html, &mut logos);
        assert_eq!(logos.get("Gulls").map(String::as_str), Some("/a/team-images/one.svg"));
    }

    #[test]
    fn test_feed_harvest_wrapped_and_plain_rows() {
        let doc = json!({
            "_source": {
                "spr": [
                    { "r": { "a": { "t": { "f": "Sea Gulls", "lg": "https://x/gulls.svg" } } } }
                ],
                "r": [
                    { "a": { "t": { "n": "Owls", "logo": "https://x/owls.svg" } } }
                ]
            }
        });
        let mut logos = BTreeMap::new();
        logos_from_feed(&doc, &mut logos);
        assert_eq!(logos.get("Sea Gulls").map(String::as_str), Some("https://x/gulls.svg"));
        assert_eq!(logos.get("Owls").map(String::as_str), Some("https://x/owls.svg"));
    }

    #[test]
    fn test_feed_harvest_empty_name_falls_through() {
        // An empty `f` must not shadow a usable `n`.
        let doc = json!({
            "_source": {
                "r": [
                    { "a": { "t": { "f": "", "n": "Hawks", "lg": "https://x/hawks.svg" } } }
                ]
            }
        });
        let mut logos = BTreeMap::new();
        logos_from_feed(&doc, &mut logos);
        assert_eq!(logos.get("Hawks").map(String::as_str), Some("https://x/hawks.svg"));
    }

    #[test]
    fn test_feed_harvest_tolerates_absent_fields() {
        for doc in [
            json!({}),
            json!({ "_source": {} }),
            json!({ "_source": { "spr": "not-an-array" } }),
            json!({ "_source": { "r": [ {} ] } }),
            json!({ "_source": { "r": [ { "a": {} } ] } }),
            json!({ "_source": { "r": [ { "a": { "t": { "f": "NoLogo" } } } ] } }),
        ] {
            let mut logos = BTreeMap::new();
            logos_from_feed(&doc, &mut logos);
            assert!(logos.is_empty(), "unexpected harvest from {doc}");
        }
    }

    #[test]
    fn test_feed_harvest_does_not_overwrite_markup_hit() {
        let mut logos = BTreeMap::new();
        logos.insert("Gulls".to_string(), "/dom/gulls.svg".to_string());
        let doc = json!({
            "_source": { "r": [ { "a": { "t": { "f": "Gulls", "lg": "/feed/gulls.svg" } } } ] }
        });
        logos_from_feed(&doc, &mut logos);
        assert_eq!(logos.get("Gulls").map(String::as_str), Some("/dom/gulls.svg"));
    }
}
