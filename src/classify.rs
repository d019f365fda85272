//! Feed classification by URL heuristics.
//!
//! The live-results site loads its data through XHR endpoints whose paths
//! carry recognizable tokens. Classification is intentionally permissive: a
//! false positive costs one wasted body decode, a false negative loses the
//! feed for the whole run. The token sets are plain fields so callers can
//! tighten or extend them without touching the matching logic.

use serde::{Deserialize, Serialize};

/// Which event feed a network response belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FeedKind {
    /// Per-split timing report.
    Split,
    /// Individual results list.
    Results,
}

/// URL classifier for the two event feeds.
///
/// Matching is case-insensitive substring containment. Split tokens are
/// checked before results tokens, so a URL carrying both classifies as
/// [`FeedKind::Split`].
#[derive(Debug, Clone)]
pub struct Classifier {
    /// Substrings identifying the split-report endpoint.
    pub split_tokens: Vec<String>,
    /// Substrings identifying individual-results endpoints.
    pub results_tokens: Vec<String>,
    /// Looser results tokens that only count on `/api/` paths.
    pub api_results_tokens: Vec<String>,
}

impl Default for Classifier {
    fn default() -> Self {
        Self {
            split_tokens: vec!["split_report".into()],
            results_tokens: vec!["ind_res_list_doc".into(), "ind_res_list".into()],
            api_results_tokens: vec!["res_list".into()],
        }
    }
}

impl Classifier {
    /// Classify a response URL, or `None` for unrelated traffic.
    pub fn classify(&self, url: &str) -> Option<FeedKind> {
        let ul = url.to_ascii_lowercase();
        if self.split_tokens.iter().any(|t| ul.contains(t.as_str())) {
            return Some(FeedKind::Split);
        }
        if self.results_tokens.iter().any(|t| ul.contains(t.as_str())) {
            return Some(FeedKind::Results);
        }
        if ul.contains("/api/")
            && self.api_results_tokens.iter().any(|t| ul.contains(t.as_str()))
        {
            return Some(FeedKind::Results);
        }
        None
    }

    /// Cheap pre-filter: is this URL worth fetching a response body for?
    pub fn is_candidate(&self, url: &str) -> bool {
        self.classify(url).is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_split() {
        let c = Classifier::default();
        assert_eq!(
            c.classify("https://live.example.com/feeds/split_report.json"),
            Some(FeedKind::Split)
        );
        assert_eq!(
            c.classify("https://live.example.com/SPLIT_REPORT?v=2"),
            Some(FeedKind::Split)
        );
    }

    #[test]
    fn test_classify_results_variants() {
        let c = Classifier::default();
        assert_eq!(
            c.classify("https://x.com/docs/ind_res_list_doc"),
            Some(FeedKind::Results)
        );
        assert_eq!(
            c.classify("https://x.com/feeds/IND_RES_LIST.json"),
            Some(FeedKind::Results)
        );
    }

    #[test]
    fn test_api_scoped_token_requires_api_path() {
        let c = Classifier::default();
        assert_eq!(
            c.classify("https://x.com/api/v3/res_list?id=9"),
            Some(FeedKind::Results)
        );
        // Bare res_list outside an API path is too loose to trust.
        assert_eq!(c.classify("https://x.com/page/res_list.html"), None);
    }

    #[test]
    fn test_unrelated_urls() {
        let c = Classifier::default();
        assert_eq!(c.classify("https://x.com/assets/app.js"), None);
        assert_eq!(c.classify("https://x.com/api/heartbeat"), None);
        assert!(!c.is_candidate("https://x.com/favicon.ico"));
    }

    #[test]
    fn test_split_wins_over_results() {
        let c = Classifier::default();
        assert_eq!(
            c.classify("https://x.com/api/split_report/ind_res_list"),
            Some(FeedKind::Split)
        );
    }

    #[test]
    fn test_custom_tokens() {
        let c = Classifier {
            split_tokens: vec!["lap_times".into()],
            results_tokens: vec!["finishers".into()],
            api_results_tokens: Vec::new(),
        };
        assert_eq!(c.classify("https://x.com/lap_times"), Some(FeedKind::Split));
        assert_eq!(c.classify("https://x.com/finishers"), Some(FeedKind::Results));
        assert_eq!(c.classify("https://x.com/split_report"), None);
    }
}
