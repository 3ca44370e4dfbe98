//! Analyzer configuration.
//!
//! Defaults are usable as-is; [`AnalyzerConfig::from_env`] overlays environment
//! variables. Unparseable values silently keep the default.

use std::time::Duration;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AnalyzerConfig {
    pub fetch: FetchConfig,
    pub selectors: ExtractorSelectors,
    pub keywords: KeywordConfig,
    /// Path to a VADER-format lexicon replacing the built-in one.
    pub lexicon_path: Option<String>,
    /// Remote review summarizer; `None` keeps the `reviews` field deterministic.
    pub remote_summary: Option<RemoteSummaryConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FetchConfig {
    pub timeout_secs: u64,
    /// Total attempts per page, including the first one.
    pub max_attempts: u32,
    pub backoff_ms: u64,
    /// Number of review pages to request per product.
    pub review_pages: u32,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 15,
            max_attempts: 2,
            backoff_ms: 1000,
            review_pages: 3,
        }
    }
}

impl FetchConfig {
    /// Per-attempt fetch timeout, never shorter than one second.
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs.max(1))
    }

    /// Backoff before the given retry (1-based), growing linearly.
    pub fn backoff(&self, attempt: u32) -> Duration {
        Duration::from_millis(self.backoff_ms.saturating_mul(attempt as u64))
    }
}

/// CSS selectors for the listing site, each a list of fallbacks tried in order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractorSelectors {
    pub title: Vec<String>,
    pub image: Vec<String>,
    /// Container of one review; enables block mode when any match.
    pub review_block: Vec<String>,
    pub review_text: Vec<String>,
    pub location: Vec<String>,
}

impl Default for ExtractorSelectors {
    fn default() -> Self {
        Self {
            title: vec![
                "a.wjcEIp.AbG6iz".to_string(),
                "span.VU-ZEz".to_string(),
                "[itemprop='name']".to_string(),
                "h1".to_string(),
            ],
            image: vec![
                "img.DByuf4".to_string(),
                "img.product-image".to_string(),
                "[itemprop='image']".to_string(),
            ],
            review_block: vec![
                "div.EPCmJX".to_string(),
                "div.review-card".to_string(),
                "[itemprop='review']".to_string(),
            ],
            review_text: vec![
                "div.ZmyHeo".to_string(),
                ".review-text".to_string(),
                "[itemprop='reviewBody']".to_string(),
            ],
            location: vec![
                "p.MztJPv".to_string(),
                ".review-location".to_string(),
            ],
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KeywordConfig {
    pub limit: usize,
    pub min_len: usize,
}

impl Default for KeywordConfig {
    fn default() -> Self {
        Self {
            limit: 20,
            min_len: 3,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemoteSummaryConfig {
    pub api_url: String,
    #[serde(skip_serializing)]
    pub api_key: String,
    pub model: String,
    pub timeout_secs: u64,
}

impl RemoteSummaryConfig {
    pub const DEFAULT_API_URL: &'static str = "https://api.groq.com/openai/v1/chat/completions";
    pub const DEFAULT_MODEL: &'static str = "gemma2-9b-it";

    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_url: Self::DEFAULT_API_URL.to_string(),
            api_key: api_key.into(),
            model: Self::DEFAULT_MODEL.to_string(),
            timeout_secs: 30,
        }
    }
}

impl AnalyzerConfig {
    /// Defaults overlaid with environment variables.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Defaults overlaid with whatever `lookup` returns for each variable name.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let env_parse = |key: &str| lookup(key).and_then(|s| s.trim().parse::<u64>().ok());
        let mut config = Self::default();

        if let Some(v) = env_parse("FETCH_TIMEOUT_SECS") {
            config.fetch.timeout_secs = v.max(1);
        }
        if let Some(v) = env_parse("FETCH_MAX_ATTEMPTS") {
            config.fetch.max_attempts = v.clamp(1, u32::MAX as u64) as u32;
        }
        if let Some(v) = env_parse("FETCH_BACKOFF_MS") {
            config.fetch.backoff_ms = v;
        }
        if let Some(v) = env_parse("REVIEW_PAGES") {
            config.fetch.review_pages = v.clamp(1, u32::MAX as u64) as u32;
        }
        if let Some(v) = env_parse("KEYWORD_LIMIT") {
            config.keywords.limit = v as usize;
        }
        if let Some(v) = env_parse("KEYWORD_MIN_LEN") {
            config.keywords.min_len = v as usize;
        }

        config.lexicon_path = lookup("SENTIMENT_LEXICON").filter(|p| !p.trim().is_empty());

        let api_key = lookup("SUMMARY_API_KEY")
            .filter(|k| !k.trim().is_empty())
            .or_else(|| lookup("GROQ_API_KEY"))
            .filter(|k| !k.trim().is_empty());
        config.remote_summary = api_key.map(|key| {
            let mut remote = RemoteSummaryConfig::new(key);
            if let Some(url) = lookup("SUMMARY_API_URL") {
                remote.api_url = url;
            }
            if let Some(model) = lookup("SUMMARY_MODEL") {
                remote.model = model;
            }
            remote
        });

        config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_values() {
        let config = AnalyzerConfig::default();
        assert_eq!(config.fetch.timeout(), Duration::from_secs(15));
        assert_eq!(config.fetch.max_attempts, 2);
        assert_eq!(config.fetch.review_pages, 3);
        assert_eq!(config.keywords.limit, 20);
        assert_eq!(config.keywords.min_len, 3);
        assert!(config.remote_summary.is_none());
    }

    #[test]
    fn backoff_grows_with_attempt() {
        let fetch = FetchConfig {
            backoff_ms: 250,
            ..FetchConfig::default()
        };
        assert_eq!(fetch.backoff(1), Duration::from_millis(250));
        assert_eq!(fetch.backoff(3), Duration::from_millis(750));
    }

    #[test]
    fn huge_backoff_saturates_and_zero_timeout_is_raised() {
        let fetch = FetchConfig {
            backoff_ms: u64::MAX,
            timeout_secs: 0,
            ..FetchConfig::default()
        };
        assert_eq!(fetch.backoff(4), Duration::from_millis(u64::MAX));
        assert_eq!(fetch.timeout(), Duration::from_secs(1));
    }

    fn lookup<'a>(vars: &'a [(&'a str, &'a str)]) -> impl Fn(&str) -> Option<String> + 'a {
        move |key: &str| {
            vars.iter()
                .find(|(k, _)| *k == key)
                .map(|(_, v)| v.to_string())
        }
    }

    #[test]
    fn environment_overrides_defaults() {
        let config = AnalyzerConfig::from_lookup(lookup(&[
            ("FETCH_TIMEOUT_SECS", "5"),
            ("FETCH_MAX_ATTEMPTS", "4"),
            ("FETCH_BACKOFF_MS", " 200 "),
            ("REVIEW_PAGES", "6"),
            ("KEYWORD_LIMIT", "10"),
            ("KEYWORD_MIN_LEN", "4"),
            ("SENTIMENT_LEXICON", "/etc/vader_lexicon.txt"),
            ("GROQ_API_KEY", "gsk-test"),
            ("SUMMARY_MODEL", "llama3-8b-8192"),
        ]));
        assert_eq!(config.fetch.timeout(), Duration::from_secs(5));
        assert_eq!(config.fetch.max_attempts, 4);
        assert_eq!(config.fetch.backoff_ms, 200);
        assert_eq!(config.fetch.review_pages, 6);
        assert_eq!(config.keywords.limit, 10);
        assert_eq!(config.keywords.min_len, 4);
        assert_eq!(config.lexicon_path.as_deref(), Some("/etc/vader_lexicon.txt"));
        let remote = config.remote_summary.expect("remote summary configured");
        assert_eq!(remote.api_key, "gsk-test");
        assert_eq!(remote.model, "llama3-8b-8192");
        assert_eq!(remote.api_url, RemoteSummaryConfig::DEFAULT_API_URL);
    }

    #[test]
    fn unparseable_or_out_of_range_values_keep_safe_defaults() {
        let config = AnalyzerConfig::from_lookup(lookup(&[
            ("FETCH_TIMEOUT_SECS", "0"),
            ("FETCH_MAX_ATTEMPTS", "0"),
            ("FETCH_BACKOFF_MS", "soon"),
            ("REVIEW_PAGES", "-2"),
            ("KEYWORD_LIMIT", "many"),
            ("SENTIMENT_LEXICON", "  "),
            ("SUMMARY_API_KEY", ""),
        ]));
        assert_eq!(config.fetch.timeout(), Duration::from_secs(1));
        assert_eq!(config.fetch.max_attempts, 1);
        assert_eq!(config.fetch.backoff_ms, 1000);
        assert_eq!(config.fetch.review_pages, 3);
        assert_eq!(config.keywords.limit, 20);
        assert!(config.lexicon_path.is_none());
        assert!(config.remote_summary.is_none());
    }

    #[test]
    fn api_key_is_never_serialized() {
        let remote = RemoteSummaryConfig::new("secret-key");
        let json = serde_json::to_string(&remote).unwrap();
        assert!(!json.contains("secret-key"));
    }
}
