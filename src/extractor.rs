//! Structured extractor: listing HTML → [`ProductPage`].
//!
//! Everything markup-specific lives here. Missing elements degrade to
//! placeholders; only empty or non-markup input is rejected.

use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use serde_json::Value;
use tracing::debug;

use crate::config::ExtractorSelectors;
use crate::error::{ExtractionError, SetupError};
use crate::model::{ProductPage, RawReview, UNTITLED_PRODUCT};

static WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("valid whitespace regex"));

// "…READ MORE" / "... Read more" truncation markers left by collapsed review bodies
static READ_MORE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\s*(?:\.{3}|…)?\s*read\s+more\s*$").expect("valid read-more regex")
});

static CERTIFIED_BUYER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)certified\s+buyer").expect("valid buyer regex"));

static JSON_LD: Lazy<Selector> = Lazy::new(|| {
    Selector::parse("script[type='application/ld+json']").expect("valid JSON-LD selector")
});
static OG_TITLE: Lazy<Selector> =
    Lazy::new(|| Selector::parse("meta[property='og:title']").expect("valid og:title selector"));
static OG_IMAGE: Lazy<Selector> =
    Lazy::new(|| Selector::parse("meta[property='og:image']").expect("valid og:image selector"));
static DOC_TITLE: Lazy<Selector> =
    Lazy::new(|| Selector::parse("title").expect("valid title selector"));

/// Which strategy produced the reviews of a page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReviewSource {
    Blocks,
    Paired,
    JsonLd,
    None,
}

pub struct StructuredExtractor {
    title: Vec<Selector>,
    image: Vec<Selector>,
    review_block: Vec<Selector>,
    review_text: Vec<Selector>,
    location: Vec<Selector>,
}

fn compile(selectors: &[String]) -> Result<Vec<Selector>, SetupError> {
    selectors
        .iter()
        .map(|s| {
            Selector::parse(s).map_err(|e| SetupError::InvalidSelector {
                selector: s.clone(),
                reason: format!("{e:?}"),
            })
        })
        .collect()
}

impl StructuredExtractor {
    pub fn new(selectors: &ExtractorSelectors) -> Result<Self, SetupError> {
        Ok(Self {
            title: compile(&selectors.title)?,
            image: compile(&selectors.image)?,
            review_block: compile(&selectors.review_block)?,
            review_text: compile(&selectors.review_text)?,
            location: compile(&selectors.location)?,
        })
    }

    pub fn extract(&self, html: &str) -> Result<ProductPage, ExtractionError> {
        self.extract_with_source(html).map(|(page, _)| page)
    }

    /// Like [`extract`](Self::extract), also reporting the review strategy used.
    pub fn extract_with_source(
        &self,
        html: &str,
    ) -> Result<(ProductPage, ReviewSource), ExtractionError> {
        let trimmed = html.trim();
        if trimmed.is_empty() {
            return Err(ExtractionError::EmptyDocument);
        }
        if !trimmed.contains('<') {
            return Err(ExtractionError::NotMarkup(trimmed.len()));
        }

        let document = Html::parse_document(html);
        let product = json_ld_product(&document);

        let title = self
            .select_title(&document)
            .or_else(|| product.as_ref().and_then(ld_name))
            .or_else(|| meta_content(&document, &OG_TITLE))
            .or_else(|| {
                document
                    .select(&DOC_TITLE)
                    .next()
                    .map(element_text)
                    .filter(|t| !t.is_empty())
            })
            .unwrap_or_else(|| UNTITLED_PRODUCT.to_string());

        let image_url = self
            .select_image(&document)
            .or_else(|| product.as_ref().and_then(ld_image))
            .or_else(|| meta_content(&document, &OG_IMAGE))
            .unwrap_or_default();

        let (reviews, source) = if let Some(reviews) = self.block_reviews(&document) {
            (reviews, ReviewSource::Blocks)
        } else if let Some(reviews) = self.paired_reviews(&document) {
            (reviews, ReviewSource::Paired)
        } else if let Some(reviews) = product.as_ref().and_then(ld_reviews) {
            (reviews, ReviewSource::JsonLd)
        } else {
            (Vec::new(), ReviewSource::None)
        };

        debug!(
            "Extracted {:?} with {} reviews via {:?}",
            title,
            reviews.len(),
            source
        );

        Ok((
            ProductPage {
                title,
                image_url,
                reviews,
            },
            source,
        ))
    }

    fn select_title(&self, document: &Html) -> Option<String> {
        self.title.iter().find_map(|sel| {
            document.select(sel).find_map(|el| {
                el.value()
                    .attr("title")
                    .map(collapse_whitespace)
                    .filter(|t| !t.is_empty())
                    .or_else(|| Some(element_text(el)).filter(|t| !t.is_empty()))
            })
        })
    }

    fn select_image(&self, document: &Html) -> Option<String> {
        self.image.iter().find_map(|sel| {
            document.select(sel).find_map(|el| {
                ["src", "data-src", "content"]
                    .iter()
                    .filter_map(|attr| el.value().attr(attr))
                    .map(str::trim)
                    .find(|src| !src.is_empty())
                    .map(str::to_string)
            })
        })
    }

    /// One review per container element, text and location looked up inside it.
    fn block_reviews(&self, document: &Html) -> Option<Vec<RawReview>> {
        self.review_block.iter().find_map(|sel| {
            let reviews: Vec<RawReview> = document
                .select(sel)
                .filter_map(|block| {
                    let text = first_within(block, &self.review_text)
                        .map(clean_review_text)
                        .filter(|t| !t.is_empty())?;
                    let location = first_within(block, &self.location)
                        .and_then(|el| normalize_location(&element_text(el)));
                    Some(RawReview { text, location })
                })
                .collect();
            Some(reviews).filter(|r| !r.is_empty())
        })
    }

    /// Page-wide review texts paired by index with page-wide location elements.
    fn paired_reviews(&self, document: &Html) -> Option<Vec<RawReview>> {
        let texts: Vec<String> = self.review_text.iter().find_map(|sel| {
            let found: Vec<String> = document.select(sel).map(clean_review_text).collect();
            Some(found).filter(|f| !f.is_empty())
        })?;

        let locations: Vec<Option<String>> = self
            .location
            .iter()
            .find_map(|sel| {
                let found: Vec<Option<String>> = document
                    .select(sel)
                    .map(|el| normalize_location(&element_text(el)))
                    .collect();
                Some(found).filter(|f| !f.is_empty())
            })
            .unwrap_or_default();

        let reviews: Vec<RawReview> = texts
            .into_iter()
            .enumerate()
            .filter(|(_, text)| !text.is_empty())
            .map(|(i, text)| RawReview {
                text,
                location: locations.get(i).cloned().flatten(),
            })
            .collect();
        Some(reviews).filter(|r| !r.is_empty())
    }
}

fn first_within<'a>(block: ElementRef<'a>, selectors: &[Selector]) -> Option<ElementRef<'a>> {
    selectors.iter().find_map(|sel| block.select(sel).next())
}

fn element_text(el: ElementRef<'_>) -> String {
    collapse_whitespace(&el.text().collect::<Vec<_>>().join(" "))
}

pub fn collapse_whitespace(text: &str) -> String {
    WHITESPACE.replace_all(text.trim(), " ").into_owned()
}

fn clean_review_text(el: ElementRef<'_>) -> String {
    strip_boilerplate(&element_text(el))
}

/// Removes trailing truncation markers and normalizes whitespace.
pub fn strip_boilerplate(text: &str) -> String {
    let collapsed = collapse_whitespace(text);
    READ_MORE.replace(&collapsed, "").trim().to_string()
}

/// "Certified Buyer, Mumbai" → "Mumbai". Empty results become `None`.
pub fn normalize_location(raw: &str) -> Option<String> {
    let without_marker = CERTIFIED_BUYER.replace_all(raw, "");
    let parts: Vec<String> = without_marker
        .split(',')
        .map(collapse_whitespace)
        .filter(|p| !p.is_empty())
        .collect();
    Some(parts.join(", ")).filter(|l| !l.is_empty())
}

fn meta_content(document: &Html, selector: &Selector) -> Option<String> {
    document
        .select(selector)
        .filter_map(|el| el.value().attr("content"))
        .map(collapse_whitespace)
        .find(|c| !c.is_empty())
}

fn json_ld_product(document: &Html) -> Option<Value> {
    document
        .select(&JSON_LD)
        .filter_map(|el| serde_json::from_str::<Value>(&el.text().collect::<String>()).ok())
        .find_map(|value| find_product(&value).cloned())
}

fn is_product(value: &Value) -> bool {
    match value.get("@type") {
        Some(Value::String(t)) => t == "Product",
        Some(Value::Array(types)) => types.iter().any(|t| t == "Product"),
        _ => false,
    }
}

fn find_product(value: &Value) -> Option<&Value> {
    match value {
        Value::Array(items) => items.iter().find_map(find_product),
        Value::Object(map) => {
            if is_product(value) {
                Some(value)
            } else {
                map.get("@graph").and_then(find_product)
            }
        }
        _ => None,
    }
}

fn ld_name(product: &Value) -> Option<String> {
    product
        .get("name")
        .and_then(Value::as_str)
        .map(collapse_whitespace)
        .filter(|n| !n.is_empty())
}

fn ld_image(product: &Value) -> Option<String> {
    let image = product.get("image")?;
    let url = match image {
        Value::String(s) => Some(s.as_str()),
        Value::Array(items) => items.iter().find_map(|i| {
            i.as_str().or_else(|| i.get("url").and_then(Value::as_str))
        }),
        Value::Object(_) => image.get("url").and_then(Value::as_str),
        _ => None,
    }?;
    Some(url.trim().to_string()).filter(|u| !u.is_empty())
}

fn ld_reviews(product: &Value) -> Option<Vec<RawReview>> {
    let entries: Vec<&Value> = match product.get("review")? {
        Value::Array(items) => items.iter().collect(),
        single @ Value::Object(_) => vec![single],
        _ => return None,
    };
    let reviews: Vec<RawReview> = entries
        .into_iter()
        .filter_map(|r| {
            r.get("reviewBody")
                .or_else(|| r.get("description"))
                .and_then(Value::as_str)
        })
        .map(strip_boilerplate)
        .filter(|t| !t.is_empty())
        .map(|text| RawReview {
            text,
            location: None,
        })
        .collect();
    Some(reviews).filter(|r| !r.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn extractor() -> StructuredExtractor {
        StructuredExtractor::new(&ExtractorSelectors::default()).unwrap()
    }

    #[test]
    fn rejects_empty_and_plain_text() {
        assert_eq!(extractor().extract("  \n ").unwrap_err(), ExtractionError::EmptyDocument);
        assert_eq!(
            extractor().extract("just words").unwrap_err(),
            ExtractionError::NotMarkup(10)
        );
    }

    #[test]
    fn invalid_selector_fails_construction() {
        let selectors = ExtractorSelectors {
            title: vec!["div[".to_string()],
            ..ExtractorSelectors::default()
        };
        assert!(matches!(
            StructuredExtractor::new(&selectors),
            Err(SetupError::InvalidSelector { .. })
        ));
    }

    #[test]
    fn missing_elements_fall_back_to_placeholders() {
        let page = extractor().extract("<html><body><p>nothing here</p></body></html>").unwrap();
        assert_eq!(page.title, UNTITLED_PRODUCT);
        assert_eq!(page.image_url, "");
        assert!(page.reviews.is_empty());
    }

    #[test]
    fn paired_mode_matches_listing_markup() {
        let html = r#"
            <html><body>
              <a class="wjcEIp AbG6iz" title="Acme Phone 5G (Blue, 128 GB)" href="/p">Acme Phone</a>
              <img class="DByuf4" src="https://img.example/phone.jpg">
              <div class="ZmyHeo"><div><div>Battery   life is
                 superb</div><span class="wTYmpv"><span>READ MORE</span></span></div></div>
              <p class="MztJPv"><span>Certified Buyer</span><span>, Pune</span></p>
              <div class="ZmyHeo"><div>Camera is average</div></div>
            </body></html>"#;
        let (page, source) = extractor().extract_with_source(html).unwrap();
        assert_eq!(source, ReviewSource::Paired);
        assert_eq!(page.title, "Acme Phone 5G (Blue, 128 GB)");
        assert_eq!(page.image_url, "https://img.example/phone.jpg");
        assert_eq!(
            page.reviews,
            vec![
                RawReview::new("Battery life is superb", Some("Pune")),
                RawReview::new("Camera is average", None),
            ]
        );
    }

    #[test]
    fn block_mode_keeps_location_per_review() {
        let html = r#"
            <div class="review-card"><p class="review-text">Solid build</p></div>
            <div class="review-card">
              <p class="review-text">Loud fan</p>
              <span class="review-location">Certified Buyer, Kochi</span>
            </div>
            <div class="review-card"><p class="review-text">   </p></div>"#;
        let (page, source) = extractor().extract_with_source(html).unwrap();
        assert_eq!(source, ReviewSource::Blocks);
        assert_eq!(
            page.reviews,
            vec![
                RawReview::new("Solid build", None),
                RawReview::new("Loud fan", Some("Kochi")),
            ]
        );
    }

    #[test]
    fn json_ld_supplies_missing_fields() {
        let html = r#"
            <html><head>
            <script type="application/ld+json">
            {"@context":"https://schema.org","@graph":[
              {"@type":"BreadcrumbList"},
              {"@type":"Product","name":"Trail Shoe","image":["https://img.example/shoe.png"],
               "review":[{"@type":"Review","reviewBody":"Great grip on wet rock"},
                         {"@type":"Review","reviewBody":""}]}
            ]}
            </script></head><body></body></html>"#;
        let (page, source) = extractor().extract_with_source(html).unwrap();
        assert_eq!(source, ReviewSource::JsonLd);
        assert_eq!(page.title, "Trail Shoe");
        assert_eq!(page.image_url, "https://img.example/shoe.png");
        assert_eq!(page.reviews, vec![RawReview::new("Great grip on wet rock", None)]);
    }

    #[test]
    fn open_graph_and_title_fallbacks() {
        let html = r#"<html><head><title> Plain  Title </title>
            <meta property="og:image" content="https://img.example/og.jpg"></head></html>"#;
        let page = extractor().extract(html).unwrap();
        assert_eq!(page.title, "Plain Title");
        assert_eq!(page.image_url, "https://img.example/og.jpg");
    }

    #[test]
    fn boilerplate_and_locations_are_normalized() {
        assert_eq!(strip_boilerplate("Nice  phone...READ MORE"), "Nice phone");
        assert_eq!(strip_boilerplate("Read more about it later"), "Read more about it later");
        assert_eq!(normalize_location("Certified Buyer , New Delhi"), Some("New Delhi".into()));
        assert_eq!(normalize_location(" Certified Buyer "), None);
    }
}
