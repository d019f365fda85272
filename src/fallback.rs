//! Degraded results extraction when the network feed never shows up.
//!
//! One static GET of the event page (no JS runs), then a minimal structural
//! scrape: the first table's rows, or list-item texts when there is no
//! table. The synthesized document carries a marker note so downstream
//! consumers can tell it apart from a real capture.

use crate::http::FetchClient;
use scraper::{Html, Selector};
use serde_json::{json, Value};

/// Marker for a document synthesized from static markup.
pub const FALLBACK_NOTE: &str = "fallback_dom_scrape_minimal";
/// Marker for the structurally-valid-but-empty last resort.
pub const PLACEHOLDER_NOTE: &str = "empty_placeholder";

/// The empty results document written when every extraction path came up dry.
pub fn empty_placeholder() -> Value {
    json!({ "source": { "rows": [] }, "note": PLACEHOLDER_NOTE })
}

/// Fetch the event page statically and synthesize a minimal results document.
///
/// Returns `None` when the fetch fails or the markup yields no rows; the
/// caller then falls through to [`empty_placeholder`].
pub async fn resolve(client: &FetchClient, url: &str) -> Option<Value> {
    let fetched = match client.get_text(url, 30_000).await {
        Ok(f) if f.status < 400 => f,
        Ok(f) => {
            tracing::warn!(status = f.status, "fallback fetch rejected");
            return None;
        }
        Err(e) => {
            tracing::warn!("fallback fetch failed: {e:#}");
            return None;
        }
    };
    let doc = synthesize_from_markup(&fetched.body);
    if doc.is_some() {
        tracing::info!("built minimal results document from static markup");
    }
    doc
}

/// Walk the first `<table>` (rows of `th`/`td` text cells) or, absent a
/// table, every non-empty `<li>` as a one-cell row.
pub fn synthesize_from_markup(html: &str) -> Option<Value> {
    let doc = Html::parse_document(html);
    let table_sel = Selector::parse("table").ok()?;

    let mut rows: Vec<Value> = Vec::new();
    if let Some(table) = doc.select(&table_sel).next() {
        let tr_sel = Selector::parse("tr").ok()?;
        let cell_sel = Selector::parse("th, td").ok()?;
        for tr in table.select(&tr_sel) {
            let cells: Vec<String> = tr.select(&cell_sel).map(|c| element_text(&c)).collect();
            if !cells.is_empty() {
                rows.push(json!({ "cells": cells }));
            }
        }
    } else {
        let li_sel = Selector::parse("li").ok()?;
        for li in doc.select(&li_sel) {
            let txt = element_text(&li);
            if !txt.is_empty() {
                rows.push(json!({ "cells": [txt] }));
            }
        }
    }

    if rows.is_empty() {
        return None;
    }
    Some(json!({ "source": { "rows": rows }, "note": FALLBACK_NOTE }))
}

/// Collect visible text, trimmed and whitespace-collapsed.
fn element_text(el: &scraper::ElementRef<'_>) -> String {
    el.text()
        .collect::<Vec<_>>()
        .join(" ")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_json_diff::assert_json_eq;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn test_table_scrape_row_count() {
        let html = r#"
            <table>
              <tr><th>Place</th><th>Name</th></tr>
              <tr><td>1</td><td>A. Runner</td></tr>
              <tr></tr>
              <tr><td>2</td><td>B. Runner</td></tr>
            </table>"#;
        let doc = synthesize_from_markup(html).expect("no document");
        let rows = doc["source"]["rows"].as_array().expect("rows missing");
        // The cell-less <tr> is dropped.
        assert_eq!(rows.len(), 3);
        assert_eq!(doc["note"], FALLBACK_NOTE);
        assert_json_eq!(rows[1], serde_json::json!({ "cells": ["1", "A. Runner"] }));
    }

    #[test]
    fn test_list_items_without_table() {
        let html = "<ul><li>1. A. Runner 17:02</li><li>  </li><li>2. B. Runner 17:10</li></ul>";
        let doc = synthesize_from_markup(html).expect("no document");
        let rows = doc["source"]["rows"].as_array().expect("rows missing");
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0]["cells"][0], "1. A. Runner 17:02");
    }

    #[test]
    fn test_whitespace_collapsed_in_cells() {
        let html = "<table><tr><td>  A.\n   Runner </td></tr></table>";
        let doc = synthesize_from_markup(html).expect("no document");
        assert_eq!(doc["source"]["rows"][0]["cells"][0], "A. Runner");
    }

    #[test]
    fn test_empty_markup_yields_none() {
        assert!(synthesize_from_markup("").is_none());
        assert!(synthesize_from_markup("<p>nothing tabular here</p>").is_none());
        assert!(synthesize_from_markup("<table></table>").is_none());
    }

    #[test]
    fn test_placeholder_shape() {
        let doc = empty_placeholder();
        assert_eq!(doc["note"], PLACEHOLDER_NOTE);
        assert!(doc["source"]["rows"].as_array().expect("rows").is_empty());
    }

    #[tokio::test]
    async fn test_resolve_against_static_page() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/events/xc/777"))
            .respond_with(ResponseTemplate::new(200).set_body_string(
                "<html><body><table><tr><td>1</td><td>A. Runner</td></tr></table></body></html>",
            ))
            .mount(&server)
            .await;

        let client = FetchClient::new(5_000);
        let doc = resolve(&client, &format!("{}/events/xc/777", server.uri()))
            .await
            .expect("no document");
        assert_eq!(doc["note"], FALLBACK_NOTE);
        assert_eq!(doc["source"]["rows"].as_array().expect("rows").len(), 1);
    }

    #[tokio::test]
    async fn test_resolve_error_status_yields_none() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let client = FetchClient::new(5_000);
        assert!(resolve(&client, &format!("{}/gone", server.uri())).await.is_none());
    }
}
