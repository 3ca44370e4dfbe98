//! Prints what the extractor finds in a saved listing page. Handy when the
//! site's markup changes and the selectors need adjusting.

use anyhow::{Context, Result};
use review_analyzer::config::ExtractorSelectors;
use review_analyzer::extractor::StructuredExtractor;

fn main() -> Result<()> {
    let path = std::env::args()
        .nth(1)
        .context("usage: debug_extract <saved-page.html>")?;
    let html = std::fs::read_to_string(&path).with_context(|| format!("reading {}", path))?;

    println!("🕵️ Extracting from {} ({} bytes)", path, html.len());
    let extractor = StructuredExtractor::new(&ExtractorSelectors::default())?;
    let (page, source) = extractor.extract_with_source(&html)?;

    println!("Title:   {}", page.title);
    println!("Image:   {}", if page.image_url.is_empty() { "-" } else { &page.image_url });
    println!("Reviews: {} (via {:?})", page.reviews.len(), source);
    for (i, review) in page.reviews.iter().enumerate() {
        println!(
            "{:>3}. [{}] {}",
            i + 1,
            review.location.as_deref().unwrap_or("-"),
            review.text
        );
    }
    Ok(())
}
