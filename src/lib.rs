//! Review analysis pipeline: fetch a product listing, extract its reviews,
//! score them, rank keywords, group sentiment by region and summarize.
//!
//! ```no_run
//! # async fn demo() -> anyhow::Result<()> {
//! use review_analyzer::{Analyzer, AnalyzerConfig};
//!
//! let analyzer = Analyzer::new(AnalyzerConfig::from_env())?;
//! let result = analyzer.analyze("https://www.flipkart.com/product-reviews/itm123?pid=ABC").await?;
//! println!("{}", serde_json::to_string_pretty(&result)?);
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod error;
pub mod extractor;
pub mod fetcher;
pub mod geo;
pub mod keywords;
pub mod model;
pub mod pipeline;
pub mod remote_summary;
pub mod sentiment;
pub mod summary;

pub use config::AnalyzerConfig;
pub use error::{AnalysisError, ExtractionError, FetchError, SetupError, Stage, StageError};
pub use fetcher::{HttpFetcher, PageFetcher};
pub use model::{
    Analysis, AnalysisResult, GeoSentiment, KeywordCount, ProductPage, RawReview, ScoredReview,
    SentimentBreakdown, SentimentLabel,
};
pub use pipeline::{Analyzer, PipelineRun, PipelineState};
