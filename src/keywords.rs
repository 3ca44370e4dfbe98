//! Keyword ranking across all scored reviews.

use std::collections::{HashMap, HashSet};

use once_cell::sync::Lazy;

use crate::config::KeywordConfig;
use crate::model::{KeywordCount, ScoredReview};

// English stop words (NLTK corpus), contractions split on the apostrophe.
static STOP_WORDS: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    vec![
        "i", "me", "my", "myself", "we", "our", "ours", "ourselves", "you", "your",
        "yours", "yourself", "yourselves", "he", "him", "his", "himself", "she",
        "her", "hers", "herself", "it", "its", "itself", "they", "them", "their",
        "theirs", "themselves", "what", "which", "who", "whom", "this", "that",
        "these", "those", "am", "is", "are", "was", "were", "be", "been", "being",
        "have", "has", "had", "having", "do", "does", "did", "doing", "a", "an",
        "the", "and", "but", "if", "or", "because", "as", "until", "while", "of",
        "at", "by", "for", "with", "about", "against", "between", "into",
        "through", "during", "before", "after", "above", "below", "to", "from",
        "up", "down", "in", "out", "on", "off", "over", "under", "again",
        "further", "then", "once", "here", "there", "when", "where", "why", "how",
        "all", "any", "both", "each", "few", "more", "most", "other", "some",
        "such", "no", "nor", "not", "only", "own", "same", "so", "than", "too",
        "very", "can", "will", "just", "don", "should", "now", "ain", "aren",
        "couldn", "didn", "doesn", "hadn", "hasn", "haven", "isn", "mightn",
        "mustn", "needn", "shan", "shouldn", "wasn", "weren", "won", "wouldn",
        "also", "would", "could", "one", "get", "got",
    ]
    .into_iter()
    .collect()
});

pub struct KeywordRanker {
    limit: usize,
    min_len: usize,
}

impl Default for KeywordRanker {
    fn default() -> Self {
        Self::new(&KeywordConfig::default())
    }
}

impl KeywordRanker {
    pub fn new(config: &KeywordConfig) -> Self {
        Self {
            limit: config.limit,
            min_len: config.min_len,
        }
    }

    fn keep(&self, token: &str) -> bool {
        token.chars().count() >= self.min_len
            && !token.chars().all(|c| c.is_ascii_digit())
            && !STOP_WORDS.contains(token)
    }

    /// Counts surviving tokens, most frequent first; equal counts keep
    /// first-occurrence order. Truncated to the configured limit.
    pub fn rank(&self, reviews: &[ScoredReview]) -> Vec<KeywordCount> {
        // word -> (count, first occurrence)
        let mut counts: HashMap<String, (usize, usize)> = HashMap::new();
        let mut next_index = 0usize;

        for review in reviews {
            let lower = review.text().to_lowercase();
            for token in lower.split(|c: char| !c.is_alphanumeric()) {
                if token.is_empty() || !self.keep(token) {
                    continue;
                }
                let entry = counts.entry(token.to_string()).or_insert_with(|| {
                    next_index += 1;
                    (0, next_index)
                });
                entry.0 += 1;
            }
        }

        let mut ranked: Vec<(String, usize, usize)> = counts
            .into_iter()
            .map(|(word, (count, first))| (word, count, first))
            .collect();
        ranked.sort_by(|a, b| b.1.cmp(&a.1).then(a.2.cmp(&b.2)));

        ranked
            .into_iter()
            .take(self.limit)
            .map(|(word, count, _)| KeywordCount { word, count })
            .collect()
    }
}
