//! Deterministic text summaries of a scored review set.

use crate::model::{KeywordCount, ScoredReview, SentimentBreakdown, SentimentLabel};

pub const NO_REVIEWS_INSIGHT: &str = "No reviews available for this product.";
pub const NO_REVIEWS_DIGEST: &str = "No reviews to summarize.";

const EXCERPT_CHARS: usize = 200;
const MENTIONED_KEYWORDS: usize = 3;

fn plural(n: usize, word: &str) -> String {
    if n == 1 {
        format!("{} {}", n, word)
    } else {
        format!("{} {}s", n, word)
    }
}

fn percent(part: usize, total: usize) -> usize {
    ((part as f64 / total as f64) * 100.0).round() as usize
}

/// Label with the highest count, or `None` when the top count is shared.
pub fn dominant_label(breakdown: &SentimentBreakdown) -> Option<SentimentLabel> {
    let counts = [
        (SentimentLabel::Positive, breakdown.positive),
        (SentimentLabel::Negative, breakdown.negative),
        (SentimentLabel::Neutral, breakdown.neutral),
    ];
    let top = counts.iter().map(|(_, c)| *c).max().unwrap_or(0);
    let mut leaders = counts.iter().filter(|(_, c)| *c == top);
    match (leaders.next(), leaders.next()) {
        (Some((label, _)), None) => Some(*label),
        _ => None,
    }
}

/// `"a"`, `"a" and "b"`, `"a", "b" and "c"`.
fn quoted_list(words: &[&str]) -> String {
    let quoted: Vec<String> = words.iter().map(|w| format!("\"{}\"", w)).collect();
    match quoted.split_last() {
        None => String::new(),
        Some((last, [])) => last.clone(),
        Some((last, rest)) => format!("{} and {}", rest.join(", "), last),
    }
}

/// Short paragraph naming the dominant sentiment, review volume and the top keywords.
pub fn summarize(reviews: &[ScoredReview], overall: f64, keywords: &[KeywordCount]) -> String {
    if reviews.is_empty() {
        return NO_REVIEWS_INSIGHT.to_string();
    }

    let breakdown = SentimentBreakdown::from_reviews(reviews);
    let n = reviews.len();
    let mood = match dominant_label(&breakdown) {
        Some(label) => format!("mostly {}", label.as_str()),
        None => "mixed".to_string(),
    };

    let mut text = format!(
        "Based on {}, customer sentiment is {} ({}% positive, {}% negative, {}% neutral; overall score {:.2}).",
        plural(n, "review"),
        mood,
        percent(breakdown.positive, n),
        percent(breakdown.negative, n),
        percent(breakdown.neutral, n),
        overall,
    );

    let top: Vec<&str> = keywords
        .iter()
        .take(MENTIONED_KEYWORDS)
        .map(|k| k.word.as_str())
        .collect();
    if !top.is_empty() {
        text.push_str(&format!(" Reviewers most often mention {}.", quoted_list(&top)));
    }
    text
}

fn excerpt(text: &str) -> String {
    if text.chars().count() <= EXCERPT_CHARS {
        return text.to_string();
    }
    let cut: String = text.chars().take(EXCERPT_CHARS).collect();
    format!("{}…", cut.trim_end())
}

/// Human-readable digest of the reviews themselves: volume plus the most
/// positive and most critical review.
pub fn digest_reviews(reviews: &[ScoredReview]) -> String {
    let Some(first) = reviews.first() else {
        return NO_REVIEWS_DIGEST.to_string();
    };

    let most_positive = reviews
        .iter()
        .filter(|r| r.label == SentimentLabel::Positive)
        .reduce(|best, r| if r.polarity > best.polarity { r } else { best });
    let most_critical = reviews
        .iter()
        .filter(|r| r.label == SentimentLabel::Negative)
        .reduce(|worst, r| if r.polarity < worst.polarity { r } else { worst });

    let mut digest = format!("{} collected.", plural(reviews.len(), "review"));
    if let Some(r) = most_positive {
        digest.push_str(&format!(" Most positive: \"{}\"", excerpt(r.text())));
    }
    if let Some(r) = most_critical {
        digest.push_str(&format!(" Most critical: \"{}\"", excerpt(r.text())));
    }
    if most_positive.is_none() && most_critical.is_none() {
        digest.push_str(&format!(" Representative: \"{}\"", excerpt(first.text())));
    }
    digest
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::RawReview;

    fn review(text: &str, polarity: f64) -> ScoredReview {
        ScoredReview::new(RawReview::new(text, None), polarity)
    }

    fn kw(word: &str, count: usize) -> KeywordCount {
        KeywordCount {
            word: word.to_string(),
            count,
        }
    }

    #[test]
    fn zero_reviews_placeholder() {
        assert_eq!(summarize(&[], 0.5, &[]), NO_REVIEWS_INSIGHT);
        assert_eq!(digest_reviews(&[]), NO_REVIEWS_DIGEST);
    }

    #[test]
    fn names_dominant_label_volume_and_keywords() {
        let reviews = vec![review("a", 0.6), review("b", 0.4), review("c", -0.3)];
        let keywords = vec![kw("battery", 3), kw("screen", 2), kw("camera", 1), kw("price", 1)];
        assert_eq!(
            summarize(&reviews, 0.62, &keywords),
            "Based on 3 reviews, customer sentiment is mostly positive (67% positive, 33% negative, 0% neutral; overall score 0.62). Reviewers most often mention \"battery\", \"screen\" and \"camera\"."
        );
    }

    #[test]
    fn tie_is_reported_as_mixed() {
        let reviews = vec![review("a", 0.6), review("b", -0.6)];
        let text = summarize(&reviews, 0.5, &[kw("fan", 2)]);
        assert!(text.starts_with("Based on 2 reviews, customer sentiment is mixed"));
        assert!(text.ends_with("Reviewers most often mention \"fan\"."));
    }

    #[test]
    fn keyword_lists_read_naturally() {
        assert_eq!(quoted_list(&["a", "b"]), "\"a\" and \"b\"");
        assert_eq!(quoted_list(&["a"]), "\"a\"");
    }

    #[test]
    fn digest_picks_extremes() {
        let reviews = vec![
            review("fine", 0.2),
            review("superb", 0.9),
            review("meh", 0.0),
            review("awful", -0.7),
            review("also superb", 0.9),
        ];
        assert_eq!(
            digest_reviews(&reviews),
            "5 reviews collected. Most positive: \"superb\" Most critical: \"awful\""
        );
        assert_eq!(
            digest_reviews(&[review("meh", 0.0)]),
            "1 review collected. Representative: \"meh\""
        );
    }

    #[test]
    fn long_reviews_are_excerpted() {
        let long = "word ".repeat(100);
        let digest = digest_reviews(&[review(&long, 0.5)]);
        assert!(digest.ends_with("…\""));
        assert!(digest.chars().count() < 260);
    }
}
