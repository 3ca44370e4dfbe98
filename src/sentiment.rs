//! Lexicon-based sentiment scoring.
//!
//! A rule scorer in the VADER family: each lexicon word carries a valence in
//! roughly [-4, 4], adjusted by nearby boosters, negations, ALL-CAPS emphasis,
//! a contrastive "but" and trailing exclamation marks. The summed valence is
//! squashed into [-1, 1]. No model files or network access are needed, and the
//! same text always gets the same polarity.

use std::collections::{HashMap, HashSet};

use once_cell::sync::Lazy;
use rayon::prelude::*;
use tracing::debug;

use crate::error::SetupError;
use crate::model::{RawReview, ScoredReview};

const NEGATION_SCALAR: f64 = -0.74;
const BOOSTER_INCREMENT: f64 = 0.293;
const CAPS_INCREMENT: f64 = 0.733;
const EXCLAMATION_INCREMENT: f64 = 0.292;
const MAX_EXCLAMATIONS: usize = 4;
const NORMALIZATION_ALPHA: f64 = 15.0;

static DEFAULT_VALENCES: &[(&str, f64)] = &[
    // positive
    ("good", 1.9), ("great", 3.1), ("excellent", 2.7), ("amazing", 2.8),
    ("awesome", 3.1), ("wonderful", 2.7), ("fantastic", 2.6), ("superb", 3.1),
    ("outstanding", 3.0), ("brilliant", 2.8), ("love", 3.2), ("loved", 2.9),
    ("loves", 2.7), ("loving", 2.9), ("best", 3.2), ("better", 1.9),
    ("nice", 1.8), ("perfect", 2.7), ("perfectly", 2.7), ("happy", 2.7),
    ("satisfied", 1.8), ("satisfying", 2.0), ("recommend", 1.5),
    ("recommended", 1.4), ("impressive", 2.3), ("impressed", 2.1),
    ("beautiful", 2.9), ("comfortable", 1.5), ("reliable", 1.9),
    ("helpful", 1.8), ("useful", 1.9), ("pleasant", 2.3), ("delightful", 2.8),
    ("incredible", 2.2), ("exceptional", 1.6), ("fine", 0.8), ("decent", 1.4),
    ("liked", 1.8), ("enjoy", 2.2), ("enjoyed", 2.3), ("glad", 2.0),
    ("thanks", 1.9), ("thank", 1.5), ("success", 2.7), ("successful", 2.8),
    ("efficient", 1.8), ("effective", 2.1), ("valuable", 2.1),
    ("beneficial", 1.9), ("favorite", 2.0), ("cool", 1.3), ("fun", 2.3),
    ("worthy", 1.9), ("superior", 2.3), ("flawless", 2.3), ("genuine", 1.6),
    ("affordable", 1.4), ("smooth", 1.2), ("sturdy", 1.2), ("premium", 1.0),
    ("worth", 0.9), ("classy", 1.9), ("gorgeous", 3.0), ("lovely", 2.8),
    ("fabulous", 2.4), ("terrific", 2.1), ("pleased", 1.9), ("wow", 2.8),
    // negative
    ("bad", -2.5), ("terrible", -2.1), ("awful", -2.0), ("horrible", -2.5),
    ("poor", -2.1), ("worst", -3.1), ("worse", -2.1), ("hate", -2.7),
    ("hated", -3.2), ("hates", -1.9), ("dislike", -1.6),
    ("disappointing", -2.2), ("disappointed", -1.9), ("disappoints", -1.6),
    ("disappointment", -2.3), ("failure", -2.3), ("failed", -2.3),
    ("fail", -2.5), ("fails", -1.8), ("sad", -2.1), ("unhappy", -1.8),
    ("angry", -2.3), ("annoyed", -1.6), ("annoying", -1.8),
    ("frustrated", -2.4), ("frustrating", -1.9), ("problem", -1.7),
    ("problems", -1.7), ("issue", -0.8), ("issues", -0.8), ("broken", -1.4),
    ("broke", -1.8), ("crash", -1.7), ("crashed", -1.8), ("defective", -1.9),
    ("damaged", -1.9), ("error", -1.7), ("errors", -1.7), ("useless", -1.8),
    ("waste", -1.8), ("wasted", -2.2), ("scam", -2.1), ("fraud", -2.8),
    ("fake", -2.1), ("unreliable", -1.6), ("slow", -0.7), ("difficult", -1.5),
    ("confusing", -1.3), ("expensive", -0.9), ("overpriced", -1.5),
    ("worthless", -1.9), ("garbage", -1.5), ("trash", -1.7),
    ("rubbish", -1.9), ("pathetic", -2.2), ("mediocre", -1.0),
    ("flimsy", -1.3), ("faulty", -1.9), ("fault", -1.7), ("regret", -1.9),
    ("ugly", -2.3), ("avoid", -1.1), ("lag", -1.0), ("lags", -1.0),
    ("lagging", -1.0), ("noisy", -0.9), ("cheated", -2.4), ("horrid", -2.5),
    ("disgusting", -2.4), ("hopeless", -2.0),
];

static DEFAULT_BOOSTERS: &[(&str, f64)] = &[
    ("absolutely", BOOSTER_INCREMENT), ("amazingly", BOOSTER_INCREMENT),
    ("completely", BOOSTER_INCREMENT), ("extremely", BOOSTER_INCREMENT),
    ("highly", BOOSTER_INCREMENT), ("incredibly", BOOSTER_INCREMENT),
    ("really", BOOSTER_INCREMENT), ("so", BOOSTER_INCREMENT),
    ("super", BOOSTER_INCREMENT), ("totally", BOOSTER_INCREMENT),
    ("very", BOOSTER_INCREMENT), ("truly", BOOSTER_INCREMENT),
    ("utterly", BOOSTER_INCREMENT), ("most", BOOSTER_INCREMENT),
    ("barely", -BOOSTER_INCREMENT), ("hardly", -BOOSTER_INCREMENT),
    ("slightly", -BOOSTER_INCREMENT), ("somewhat", -BOOSTER_INCREMENT),
    ("marginally", -BOOSTER_INCREMENT), ("kinda", -BOOSTER_INCREMENT),
    ("partly", -BOOSTER_INCREMENT), ("occasionally", -BOOSTER_INCREMENT),
];

static DEFAULT_NEGATIONS: &[&str] = &[
    "not", "no", "never", "none", "nobody", "nothing", "neither", "nor",
    "nowhere", "cannot", "without", "isnt", "dont", "doesnt", "didnt",
    "wasnt", "wont", "cant", "couldnt", "shouldnt", "wouldnt", "aint",
    "arent", "hasnt", "havent", "hadnt", "werent", "mustnt", "neednt",
    "rarely", "seldom",
];

static DEFAULT_LEXICON: Lazy<Lexicon> = Lazy::new(|| Lexicon {
    valences: DEFAULT_VALENCES
        .iter()
        .map(|(w, v)| (w.to_string(), *v))
        .collect(),
    boosters: DEFAULT_BOOSTERS
        .iter()
        .map(|(w, v)| (w.to_string(), *v))
        .collect(),
    negations: DEFAULT_NEGATIONS.iter().map(|w| w.to_string()).collect(),
});

/// Word valences plus the modifier word lists. Read-only once built.
#[derive(Debug, Clone)]
pub struct Lexicon {
    valences: HashMap<String, f64>,
    boosters: HashMap<String, f64>,
    negations: HashSet<String>,
}

impl Default for Lexicon {
    fn default() -> Self {
        DEFAULT_LEXICON.clone()
    }
}

impl Lexicon {
    /// Parses VADER's `vader_lexicon.txt` layout: `token<TAB>mean<TAB>...`.
    /// Valences replace the built-in ones; boosters and negations are kept.
    pub fn from_vader_str(content: &str) -> Result<Self, String> {
        let mut valences = HashMap::new();
        for (lineno, line) in content.lines().enumerate() {
            let line = line.trim_end();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let mut cols = line.split('\t');
            let (Some(token), Some(mean)) = (cols.next(), cols.next()) else {
                return Err(format!("line {}: expected token and valence", lineno + 1));
            };
            let mean: f64 = mean
                .trim()
                .parse()
                .map_err(|e| format!("line {}: bad valence {:?}: {}", lineno + 1, mean, e))?;
            if !mean.is_finite() {
                return Err(format!("line {}: non-finite valence {}", lineno + 1, mean));
            }
            valences.insert(token.trim().to_lowercase(), mean);
        }
        if valences.is_empty() {
            return Err("lexicon has no entries".to_string());
        }
        Ok(Self {
            valences,
            ..Self::default()
        })
    }

    pub fn load(path: &str) -> Result<Self, SetupError> {
        let content = std::fs::read_to_string(path).map_err(|e| SetupError::Lexicon {
            path: path.to_string(),
            reason: e.to_string(),
        })?;
        Self::from_vader_str(&content).map_err(|reason| SetupError::Lexicon {
            path: path.to_string(),
            reason,
        })
    }

    pub fn len(&self) -> usize {
        self.valences.len()
    }

    pub fn is_empty(&self) -> bool {
        self.valences.is_empty()
    }

    fn valence(&self, word: &str) -> Option<f64> {
        self.valences.get(word).copied()
    }

    fn booster(&self, word: &str) -> Option<f64> {
        self.boosters.get(word).copied()
    }

    fn is_negation(&self, word: &str) -> bool {
        self.negations.contains(word) || word.ends_with("n't")
    }
}

struct Token {
    raw: String,
    lower: String,
}

fn tokenize(text: &str) -> Vec<Token> {
    text.split_whitespace()
        // typographic apostrophes ("isn’t") count as plain ones
        .map(|w| w.replace('\u{2019}', "'"))
        .filter_map(|w| {
            let raw = w
                .trim_matches(|c: char| !c.is_alphanumeric() && c != '\'')
                .trim_matches('\'');
            (!raw.is_empty()).then(|| Token {
                raw: raw.to_string(),
                lower: raw.to_lowercase(),
            })
        })
        .collect()
}

fn is_shouting(word: &str) -> bool {
    word.chars().any(char::is_alphabetic)
        && word.chars().filter(|c| c.is_alphabetic()).all(char::is_uppercase)
        && word.chars().filter(|c| c.is_alphabetic()).count() > 1
}

pub struct SentimentScorer {
    lexicon: Lexicon,
}

impl Default for SentimentScorer {
    fn default() -> Self {
        Self::new(Lexicon::default())
    }
}

impl SentimentScorer {
    pub fn new(lexicon: Lexicon) -> Self {
        Self { lexicon }
    }

    /// Polarity in [-1, 1]; 0.0 when no lexicon word is present.
    pub fn polarity(&self, text: &str) -> f64 {
        let tokens = tokenize(text);
        if tokens.is_empty() {
            return 0.0;
        }

        let shouting: Vec<bool> = tokens.iter().map(|t| is_shouting(&t.raw)).collect();
        // Emphasis only counts when the rest of the text is not shouting too.
        let caps_differential = shouting.iter().any(|s| *s) && !shouting.iter().all(|s| *s);
        let but_index = tokens.iter().position(|t| t.lower == "but");

        let mut sum = 0.0;
        let mut hits = 0usize;
        for (i, token) in tokens.iter().enumerate() {
            let Some(mut valence) = self.lexicon.valence(&token.lower) else {
                continue;
            };
            hits += 1;

            if caps_differential && shouting[i] {
                valence += CAPS_INCREMENT * valence.signum();
            }

            for (distance, damping) in [(1usize, 1.0), (2, 0.95), (3, 0.9)] {
                if i < distance {
                    break;
                }
                if let Some(boost) = self.lexicon.booster(&tokens[i - distance].lower) {
                    valence += boost * valence.signum() * damping;
                }
            }

            let negated = (1..=3)
                .filter(|d| i >= *d)
                .any(|d| self.lexicon.is_negation(&tokens[i - d].lower));
            if negated {
                valence *= NEGATION_SCALAR;
            }

            if let Some(but) = but_index {
                if i < but {
                    valence *= 0.5;
                } else if i > but {
                    valence *= 1.5;
                }
            }

            sum += valence;
        }

        if hits == 0 || sum == 0.0 {
            return 0.0;
        }

        let exclamations = text.matches('!').count().min(MAX_EXCLAMATIONS);
        sum += exclamations as f64 * EXCLAMATION_INCREMENT * sum.signum();

        (sum / (sum * sum + NORMALIZATION_ALPHA).sqrt()).clamp(-1.0, 1.0)
    }

    /// Scores one review. Whitespace-only text yields `None`.
    pub fn score(&self, review: RawReview) -> Option<ScoredReview> {
        if review.text.trim().is_empty() {
            return None;
        }
        let polarity = self.polarity(&review.text);
        Some(ScoredReview::new(review, polarity))
    }

    /// Scores every review in parallel, keeping page order.
    pub fn score_all(&self, reviews: Vec<RawReview>) -> Vec<ScoredReview> {
        let total = reviews.len();
        let scored: Vec<ScoredReview> = reviews
            .into_par_iter()
            .filter_map(|r| self.score(r))
            .collect();
        debug!(
            "🧠 Scored {} reviews ({} skipped as empty)",
            scored.len(),
            total - scored.len()
        );
        scored
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::SentimentLabel;

    fn label(text: &str) -> SentimentLabel {
        SentimentLabel::from_polarity(SentimentScorer::default().polarity(text))
    }

    #[test]
    fn test_positive_sentiment() {
        let text =
            "This product is amazing and wonderful. I love it so much. Best purchase ever!";
        assert_eq!(label(text), SentimentLabel::Positive);
    }

    #[test]
    fn test_negative_sentiment() {
        let text =
            "This is terrible and horrible. I hate it. Worst experience ever, total failure.";
        assert_eq!(label(text), SentimentLabel::Negative);
    }

    #[test]
    fn test_neutral_sentiment() {
        let text = "The item arrived on time. It works as described in the listing.";
        assert_eq!(label(text), SentimentLabel::Neutral);
        assert_eq!(label("It's okay, nothing special"), SentimentLabel::Neutral);
    }

    #[test]
    fn negation_flips_polarity() {
        let scorer = SentimentScorer::default();
        assert!(scorer.polarity("good phone") > 0.0);
        assert!(scorer.polarity("not good phone") < 0.0);
        assert!(scorer.polarity("it isn't good") < 0.0);
    }

    #[test]
    fn curly_apostrophe_negates_too() {
        let scorer = SentimentScorer::default();
        assert!(scorer.polarity("it isn\u{2019}t good") < 0.0);
        assert_eq!(
            scorer.polarity("don\u{2019}t love it"),
            scorer.polarity("don't love it")
        );
    }

    #[test]
    fn modifiers_strengthen_or_soften() {
        let scorer = SentimentScorer::default();
        let base = scorer.polarity("good phone");
        assert!(scorer.polarity("very good phone") > base);
        assert!(scorer.polarity("slightly good phone") < base);
        assert!(scorer.polarity("GOOD phone") > base);
        assert!(scorer.polarity("good phone!!!") > base);
    }

    #[test]
    fn clause_after_but_dominates() {
        assert_eq!(
            label("The screen is good but the battery is terrible"),
            SentimentLabel::Negative
        );
    }

    #[test]
    fn polarity_is_bounded_and_deterministic() {
        let scorer = SentimentScorer::default();
        let text = "BEST BEST BEST amazing awesome superb love love love!!!!!!";
        let p = scorer.polarity(text);
        assert!(p > 0.9 && p <= 1.0);
        assert_eq!(p, scorer.polarity(text));
    }

    #[test]
    fn empty_reviews_are_not_scored() {
        let scorer = SentimentScorer::default();
        assert!(scorer.score(RawReview::new("   ", None)).is_none());
        let scored = scorer.score_all(vec![
            RawReview::new("great", None),
            RawReview::new("\t", None),
            RawReview::new("awful", Some("Goa")),
        ]);
        assert_eq!(scored.len(), 2);
        assert_eq!(scored[0].text(), "great");
        assert_eq!(scored[1].location(), Some("Goa"));
    }

    #[test]
    fn vader_file_format_replaces_valences() {
        let lexicon =
            Lexicon::from_vader_str("# comment\nsplendid\t2.5\t0.5\t[2, 3]\nmeh\t-0.6\t0.4\n")
                .unwrap();
        assert_eq!(lexicon.len(), 2);
        let scorer = SentimentScorer::new(lexicon);
        assert!(scorer.polarity("splendid") > 0.0);
        assert!(scorer.polarity("really meh") < 0.0);
        assert_eq!(scorer.polarity("great"), 0.0);
    }

    #[test]
    fn malformed_lexicon_is_rejected() {
        assert!(Lexicon::from_vader_str("word-without-valence\n").is_err());
        assert!(Lexicon::from_vader_str("word\tnot-a-number\n").is_err());
        assert!(Lexicon::from_vader_str("\n\n").is_err());
        for bad in ["good\tnan\t0.1\n", "good\tinf\n", "bad\t-inf\n"] {
            let err = Lexicon::from_vader_str(bad).unwrap_err();
            assert!(err.contains("non-finite"), "{err}");
        }
    }
}
