//! Sentiment grouped by reviewer location.

use std::collections::HashMap;

use crate::model::{GeoSentiment, ScoredReview};

/// Mean polarity per distinct location. Reviews without a location are left
/// out. Locations with more reviews come first; ties keep first-seen order.
pub fn aggregate(reviews: &[ScoredReview]) -> Vec<GeoSentiment> {
    // location -> index into `groups`
    let mut index: HashMap<&str, usize> = HashMap::new();
    let mut groups: Vec<(&str, f64, usize)> = Vec::new();

    for review in reviews {
        let Some(location) = review.location().filter(|l| !l.trim().is_empty()) else {
            continue;
        };
        let slot = *index.entry(location).or_insert_with(|| {
            groups.push((location, 0.0, 0));
            groups.len() - 1
        });
        let group = &mut groups[slot];
        group.1 += review.polarity;
        group.2 += 1;
    }

    // stable sort keeps first-seen order among equal counts
    groups.sort_by(|a, b| b.2.cmp(&a.2));

    groups
        .into_iter()
        .map(|(location, sum, n)| GeoSentiment {
            location: location.to_string(),
            sentiment: (sum / n as f64).clamp(-1.0, 1.0),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::RawReview;

    fn review(location: Option<&str>, polarity: f64) -> ScoredReview {
        ScoredReview::new(RawReview::new("text", location), polarity)
    }

    #[test]
    fn empty_and_locationless_input() {
        assert!(aggregate(&[]).is_empty());
        assert!(aggregate(&[review(None, 0.5), review(None, -0.2)]).is_empty());
    }

    #[test]
    fn means_per_location_ordered_by_volume() {
        let reviews = vec![
            review(Some("Delhi"), -0.5),
            review(Some("Mumbai"), 0.8),
            review(None, 1.0),
            review(Some("Mumbai"), 0.2),
            review(Some("Chennai"), 0.1),
        ];
        let geo = aggregate(&reviews);
        let names: Vec<&str> = geo.iter().map(|g| g.location.as_str()).collect();
        assert_eq!(names, vec!["Mumbai", "Delhi", "Chennai"]);
        assert!((geo[0].sentiment - 0.5).abs() < 1e-9);
        assert_eq!(geo[1].sentiment, -0.5);
        assert_eq!(geo[2].sentiment, 0.1);
    }
}
