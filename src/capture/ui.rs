//! Best-effort UI driving: tab clicks and exhaustive scrolling.
//!
//! Nothing here is trusted as proof of progress. A click that "succeeds" may
//! hit a decorative element; a scroll may land on a fully-loaded list. The
//! orchestrator keeps calling these until the response stream says the feeds
//! arrived.

use crate::renderer::EventPage;
use serde_json::Value;
use std::time::{Duration, Instant};

/// Delay between wheel bursts while scrolling.
const WHEEL_INTERVAL: Duration = Duration::from_millis(160);

/// Hard cap on the one-shot overflow-container walk.
const OVERFLOW_EVAL_TIMEOUT: Duration = Duration::from_secs(5);

/// Forces every scrollable overflow container to its bottom. Virtualized
/// lists only materialize rows near the viewport; bottoming them out makes
/// the tail render (and fetch). The 120px threshold skips trivial overflow.
const OVERFLOW_SCROLL_JS: &str = r#"(() => {
  let n = 0;
  for (const el of document.querySelectorAll('*')) {
    const s = getComputedStyle(el);
    const delta = el.scrollHeight - el.clientHeight;
    if (delta > 120 && (s.overflowY === 'auto' || s.overflowY === 'scroll')) {
      el.scrollTop = el.scrollHeight;
      n++;
    }
  }
  return n;
})()"#;

/// Try each label in order: accessible-role lookup first, visible-text
/// second. Returns true on the first successful click. Never raises; the
/// caller retries on the next polling iteration.
pub async fn click_tab(
    page: &dyn EventPage,
    labels: &[String],
    attempt_timeout: Duration,
    settle: Duration,
) -> bool {
    for label in labels {
        let script = tab_click_script(label);
        match tokio::time::timeout(attempt_timeout, page.evaluate(&script)).await {
            Ok(Ok(result)) => {
                let clicked = result
                    .get("clicked")
                    .and_then(Value::as_bool)
                    .unwrap_or(false);
                if clicked {
                    let via = result.get("via").and_then(Value::as_str).unwrap_or("?");
                    tracing::debug!(%label, via, "clicked tab");
                    tokio::time::sleep(settle).await;
                    return true;
                }
            }
            Ok(Err(e)) => tracing::debug!(%label, "tab click failed: {e}"),
            Err(_) => tracing::debug!(%label, "tab click timed out"),
        }
    }
    false
}

/// Wheel-scroll the window for the budget, then bottom out every scrollable
/// overflow container in one DOM walk.
pub async fn scroll_everywhere(page: &dyn EventPage, budget: Duration) {
    let start = Instant::now();
    while start.elapsed() < budget {
        if let Err(e) = page.wheel(900.0).await {
            tracing::debug!("wheel scroll failed: {e}");
            break;
        }
        tokio::time::sleep(WHEEL_INTERVAL.min(budget)).await;
    }

    match tokio::time::timeout(OVERFLOW_EVAL_TIMEOUT, page.evaluate(OVERFLOW_SCROLL_JS)).await {
        Ok(Ok(n)) => tracing::trace!(containers = %n, "bottomed out overflow containers"),
        Ok(Err(e)) => tracing::debug!("overflow scroll failed: {e}"),
        Err(_) => tracing::debug!("overflow scroll timed out"),
    }
}

fn tab_click_script(label: &str) -> String {
    format!(
        r#"(() => {{
  const label = '{}';
  for (const t of document.querySelectorAll('[role="tab"]')) {{
    if (((t.textContent) || '').trim().includes(label)) {{
      t.click();
      return {{ clicked: true, via: 'role' }};
    }}
  }}
  for (const el of document.querySelectorAll('a, button, div, span, li')) {{
    const txt = ((el.textContent) || '').trim();
    if (txt && txt.length < 40 && txt.includes(label)) {{
      el.click();
      return {{ clicked: true, via: 'text' }};
    }}
  }}
  return {{ clicked: false }};
}})()"#,
        sanitize_js_string(label)
    )
}

/// Sanitize a string for safe injection into a JS string literal.
///
/// Escapes everything that could break out of the string context, strips
/// null bytes, and hex-escapes angle brackets.
fn sanitize_js_string(s: &str) -> String {
    let mut result = String::with_capacity(s.len() + 8);
    for ch in s.chars() {
        match ch {
            '\\' => result.push_str("\\\\"),
            '\'' => result.push_str("\\'"),
            '"' => result.push_str("\\\""),
            '`' => result.push_str("\\`"),
            '\n' => result.push_str("\\n"),
            '\r' => result.push_str("\\r"),
            '\t' => result.push_str("\\t"),
            '\0' => {}
            '<' => result.push_str("\\x3c"),
            '>' => result.push_str("\\x3e"),
            _ => result.push(ch),
        }
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_basic() {
        assert_eq!(sanitize_js_string("Splits"), "Splits");
        assert_eq!(sanitize_js_string("it's"), "it\\'s");
        assert_eq!(sanitize_js_string("a\"b"), "a\\\"b");
    }

    #[test]
    fn test_sanitize_script_breakout() {
        let malicious = r#"</script><script>alert(1)</script>"#;
        let sanitized = sanitize_js_string(malicious);
        assert!(!sanitized.contains("</script>"));
    }

    #[test]
    fn test_sanitize_null_bytes() {
        assert_eq!(sanitize_js_string("ab\0c"), "abc");
    }

    #[test]
    fn test_click_script_embeds_escaped_label() {
        let script = tab_click_script("Results'");
        assert!(script.contains("const label = 'Results\\''"));
        assert!(script.contains(r#"[role="tab"]"#));
    }
}
