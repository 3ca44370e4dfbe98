//! Data records passed between pipeline stages, plus the serialized payload.

use serde::{Deserialize, Serialize};

pub const UNTITLED_PRODUCT: &str = "Untitled Product";

/// Normalized product page, produced by the extractor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductPage {
    pub title: String,
    #[serde(rename = "imageURL")]
    pub image_url: String,
    pub reviews: Vec<RawReview>,
}

impl Default for ProductPage {
    fn default() -> Self {
        Self {
            title: UNTITLED_PRODUCT.to_string(),
            image_url: String::new(),
            reviews: Vec::new(),
        }
    }
}

/// One review block in page order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawReview {
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
}

impl RawReview {
    pub fn new(text: impl Into<String>, location: Option<&str>) -> Self {
        Self {
            text: text.into(),
            location: location.map(str::to_string),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SentimentLabel {
    Positive,
    Negative,
    Neutral,
}

impl SentimentLabel {
    /// Polarity above this is positive, below its negation negative.
    pub const THRESHOLD: f64 = 0.05;

    pub fn from_polarity(polarity: f64) -> Self {
        if polarity > Self::THRESHOLD {
            SentimentLabel::Positive
        } else if polarity < -Self::THRESHOLD {
            SentimentLabel::Negative
        } else {
            SentimentLabel::Neutral
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SentimentLabel::Positive => "positive",
            SentimentLabel::Negative => "negative",
            SentimentLabel::Neutral => "neutral",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredReview {
    #[serde(flatten)]
    pub review: RawReview,
    pub polarity: f64,
    pub label: SentimentLabel,
}

impl ScoredReview {
    /// Builds a scored review, clamping polarity into [-1, 1] and deriving the label.
    pub fn new(review: RawReview, polarity: f64) -> Self {
        let polarity = polarity.clamp(-1.0, 1.0);
        Self {
            review,
            polarity,
            label: SentimentLabel::from_polarity(polarity),
        }
    }

    pub fn text(&self) -> &str {
        &self.review.text
    }

    pub fn location(&self) -> Option<&str> {
        self.review.location.as_deref()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeywordCount {
    pub word: String,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeoSentiment {
    pub location: String,
    pub sentiment: f64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SentimentBreakdown {
    pub positive: usize,
    pub negative: usize,
    pub neutral: usize,
}

impl SentimentBreakdown {
    pub fn from_reviews(reviews: &[ScoredReview]) -> Self {
        reviews.iter().fold(Self::default(), |mut acc, r| {
            match r.label {
                SentimentLabel::Positive => acc.positive += 1,
                SentimentLabel::Negative => acc.negative += 1,
                SentimentLabel::Neutral => acc.neutral += 1,
            }
            acc
        })
    }

    pub fn total(&self) -> usize {
        self.positive + self.negative + self.neutral
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Analysis {
    pub overall_sentiment: f64,
    pub sentiment_breakdown: SentimentBreakdown,
    pub top_keywords: Vec<KeywordCount>,
    pub geographical_data: Vec<GeoSentiment>,
}

/// Final payload of one `analyze` call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub title: String,
    #[serde(rename = "imageURL")]
    pub image_url: String,
    pub analysis: Analysis,
    pub reviews: String,
    pub insights: String,
}

/// Maps mean polarity in [-1, 1] onto [0, 1]. An empty set scores 0.5.
pub fn overall_sentiment(reviews: &[ScoredReview]) -> f64 {
    if reviews.is_empty() {
        return 0.5;
    }
    let mean = reviews.iter().map(|r| r.polarity).sum::<f64>() / reviews.len() as f64;
    ((mean + 1.0) / 2.0).clamp(0.0, 1.0)
}
