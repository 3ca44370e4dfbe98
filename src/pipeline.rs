//! Pipeline orchestrator.
//!
//! `Idle → Fetching → Extracting → Scoring → Aggregating → Done`, with
//! `Failed { stage, cause }` reachable from any non-terminal state. Each
//! `analyze` call owns its own [`PipelineRun`]; nothing is shared between calls
//! except the read-only components held by [`Analyzer`].
//!
//! Dropping the `analyze` future cancels any in-flight fetch.

use std::fmt;
use std::sync::Arc;
use std::time::Instant;

use reqwest::Url;
use tracing::{debug, error, info, info_span, warn, Instrument};
use uuid::Uuid;

use crate::config::{AnalyzerConfig, FetchConfig};
use crate::error::{AnalysisError, FetchError, InvalidTransition, SetupError, Stage, StageError};
use crate::extractor::StructuredExtractor;
use crate::fetcher::{parse_listing_url, review_page_url, HttpFetcher, PageFetcher};
use crate::geo;
use crate::keywords::KeywordRanker;
use crate::model::{
    overall_sentiment, Analysis, AnalysisResult, ProductPage, ScoredReview, SentimentBreakdown,
    UNTITLED_PRODUCT,
};
use crate::remote_summary::RemoteSummarizer;
use crate::sentiment::{Lexicon, SentimentScorer};
use crate::summary;

#[derive(Debug, Clone, PartialEq)]
pub enum PipelineState {
    Idle,
    Fetching,
    Extracting,
    Scoring,
    Aggregating,
    Done,
    Failed { stage: Stage, cause: String },
}

impl PipelineState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, PipelineState::Done | PipelineState::Failed { .. })
    }

    fn for_stage(stage: Stage) -> Self {
        match stage {
            Stage::Fetching => PipelineState::Fetching,
            Stage::Extracting => PipelineState::Extracting,
            Stage::Scoring => PipelineState::Scoring,
            Stage::Aggregating => PipelineState::Aggregating,
        }
    }

    /// Whether `self → next` is an allowed step. A pre-fetched page may skip
    /// straight from `Idle` to `Extracting`.
    pub fn can_transition(&self, next: &PipelineState) -> bool {
        use PipelineState::*;
        match (self, next) {
            (Idle, Fetching)
            | (Idle, Extracting)
            | (Fetching, Extracting)
            | (Extracting, Scoring)
            | (Scoring, Aggregating)
            | (Aggregating, Done) => true,
            (from, Failed { .. }) => !from.is_terminal(),
            _ => false,
        }
    }
}

impl fmt::Display for PipelineState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PipelineState::Idle => f.write_str("idle"),
            PipelineState::Fetching => f.write_str("fetching"),
            PipelineState::Extracting => f.write_str("extracting"),
            PipelineState::Scoring => f.write_str("scoring"),
            PipelineState::Aggregating => f.write_str("aggregating"),
            PipelineState::Done => f.write_str("done"),
            PipelineState::Failed { stage, .. } => write!(f, "failed({})", stage),
        }
    }
}

/// State of a single `analyze` call, with the path it took.
#[derive(Debug)]
pub struct PipelineRun {
    id: Uuid,
    state: PipelineState,
    history: Vec<PipelineState>,
    started: Instant,
}

impl Default for PipelineRun {
    fn default() -> Self {
        Self::new()
    }
}

impl PipelineRun {
    pub fn new() -> Self {
        Self {
            id: Uuid::new_v4(),
            state: PipelineState::Idle,
            history: vec![PipelineState::Idle],
            started: Instant::now(),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn state(&self) -> &PipelineState {
        &self.state
    }

    pub fn history(&self) -> &[PipelineState] {
        &self.history
    }

    fn advance(&mut self, next: PipelineState) -> Result<(), InvalidTransition> {
        if !self.state.can_transition(&next) {
            return Err(InvalidTransition {
                from: self.state.to_string(),
                to: next.to_string(),
            });
        }
        debug!("Pipeline {} -> {}", self.state, next);
        self.state = next.clone();
        self.history.push(next);
        Ok(())
    }

    /// Moves into `stage`, failing the run if that step is not allowed.
    pub fn enter(&mut self, stage: Stage) -> Result<(), AnalysisError> {
        self.advance(PipelineState::for_stage(stage))
            .map_err(|e| self.fail(stage, e.into()))
    }

    pub fn finish(&mut self) -> Result<(), AnalysisError> {
        self.advance(PipelineState::Done)
            .map_err(|e| self.fail(Stage::Aggregating, e.into()))
    }

    /// Records the failure and returns the error to surface.
    pub fn fail(&mut self, stage: Stage, cause: StageError) -> AnalysisError {
        error!(
            "❌ Analysis {} failed while {} after {:.2}s: {}",
            self.id,
            stage,
            self.started.elapsed().as_secs_f32(),
            cause
        );
        let failed = PipelineState::Failed {
            stage,
            cause: cause.to_string(),
        };
        if self.state.can_transition(&failed) {
            self.state = failed.clone();
            self.history.push(failed);
        }
        AnalysisError::new(stage, cause)
    }
}

/// Runs the whole pipeline. Cheap to share; holds only read-only components.
pub struct Analyzer {
    fetch: FetchConfig,
    fetcher: Arc<dyn PageFetcher>,
    extractor: StructuredExtractor,
    scorer: Arc<SentimentScorer>,
    ranker: Arc<KeywordRanker>,
    remote: Option<RemoteSummarizer>,
}

impl Analyzer {
    /// Builds an analyzer that fetches over HTTP.
    pub fn new(config: AnalyzerConfig) -> Result<Self, SetupError> {
        let fetcher = HttpFetcher::new(&config.fetch)?;
        Self::with_fetcher(config, Arc::new(fetcher))
    }

    /// Builds an analyzer around any page source.
    pub fn with_fetcher(
        config: AnalyzerConfig,
        fetcher: Arc<dyn PageFetcher>,
    ) -> Result<Self, SetupError> {
        let lexicon = match &config.lexicon_path {
            Some(path) => {
                let lexicon = Lexicon::load(path)?;
                info!("Loaded sentiment lexicon from {} ({} entries)", path, lexicon.len());
                lexicon
            }
            None => Lexicon::default(),
        };
        let remote = config
            .remote_summary
            .clone()
            .map(RemoteSummarizer::new)
            .transpose()?;

        Ok(Self {
            extractor: StructuredExtractor::new(&config.selectors)?,
            scorer: Arc::new(SentimentScorer::new(lexicon)),
            ranker: Arc::new(KeywordRanker::new(&config.keywords)),
            fetch: config.fetch,
            fetcher,
            remote,
        })
    }

    /// Fetches the listing at `url` and analyzes its reviews. All-or-nothing:
    /// any fatal failure yields an [`AnalysisError`] and no partial result.
    pub async fn analyze(&self, url: &str) -> Result<AnalysisResult, AnalysisError> {
        let mut run = PipelineRun::new();
        self.analyze_tracked(url, &mut run).await
    }

    /// Same as [`analyze`](Self::analyze), recording state changes in `run`.
    pub async fn analyze_tracked(
        &self,
        url: &str,
        run: &mut PipelineRun,
    ) -> Result<AnalysisResult, AnalysisError> {
        let span = info_span!("analysis", id = %run.id(), url = %url);
        self.run_url(url, run).instrument(span).await
    }

    /// Analyzes an already-fetched page, skipping the fetch stage.
    pub async fn analyze_html(&self, html: &str) -> Result<AnalysisResult, AnalysisError> {
        let mut run = PipelineRun::new();
        let span = info_span!("analysis", id = %run.id(), url = "<inline>");
        self.run_html(html, &mut run).instrument(span).await
    }

    async fn run_url(
        &self,
        url: &str,
        run: &mut PipelineRun,
    ) -> Result<AnalysisResult, AnalysisError> {
        info!("🔎 Starting analysis");
        run.enter(Stage::Fetching)?;
        let base = parse_listing_url(url).map_err(|e| run.fail(Stage::Fetching, e.into()))?;
        let pages = self
            .fetch_pages(&base)
            .await
            .map_err(|e| run.fail(Stage::Fetching, e.into()))?;

        run.enter(Stage::Extracting)?;
        let page = self
            .extract_pages(&pages)
            .map_err(|e| run.fail(Stage::Extracting, e))?;

        self.analyze_page(page, run).await
    }

    async fn run_html(
        &self,
        html: &str,
        run: &mut PipelineRun,
    ) -> Result<AnalysisResult, AnalysisError> {
        run.enter(Stage::Extracting)?;
        let page = self
            .extractor
            .extract(html)
            .map_err(|e| run.fail(Stage::Extracting, e.into()))?;
        self.analyze_page(page, run).await
    }

    async fn fetch_with_retry(&self, url: &Url) -> Result<String, FetchError> {
        let max_attempts = self.fetch.max_attempts.max(1);
        let timeout = self.fetch.timeout();
        let mut attempt = 1;
        loop {
            // Bound every attempt here; injected fetchers may not time out themselves.
            let outcome = tokio::time::timeout(timeout, self.fetcher.fetch(url))
                .await
                .unwrap_or(Err(FetchError::Timeout(timeout)));
            match outcome {
                Ok(html) => return Ok(html),
                Err(e) if e.is_transient() && attempt < max_attempts => {
                    let wait = self.fetch.backoff(attempt);
                    warn!(
                        "⚠️ Attempt {}/{} for {} failed: {}. Retrying in {:.1}s",
                        attempt,
                        max_attempts,
                        url,
                        e,
                        wait.as_secs_f32()
                    );
                    tokio::time::sleep(wait).await;
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }

    /// Page 1 is mandatory; later review pages are best effort.
    async fn fetch_pages(&self, base: &Url) -> Result<Vec<String>, FetchError> {
        let start = Instant::now();
        let mut pages = vec![self.fetch_with_retry(base).await?];

        for n in 2..=self.fetch.review_pages {
            let url = review_page_url(base, n);
            match self.fetch_with_retry(&url).await {
                Ok(html) => pages.push(html),
                Err(e) => {
                    warn!("Stopping pagination at page {}: {}", n, e);
                    break;
                }
            }
        }

        info!(
            "Fetched {} page(s) in {:.2}s",
            pages.len(),
            start.elapsed().as_secs_f32()
        );
        Ok(pages)
    }

    /// Merges review pages in order. Only the first page can fail the run.
    fn extract_pages(&self, pages: &[String]) -> Result<ProductPage, StageError> {
        let Some((first, rest)) = pages.split_first() else {
            return Ok(ProductPage::default());
        };
        let mut merged = self.extractor.extract(first)?;
        let mut previous = merged.reviews.clone();

        for (i, html) in rest.iter().enumerate() {
            let page_no = i + 2;
            let page = match self.extractor.extract(html) {
                Ok(page) => page,
                Err(e) => {
                    warn!("Ignoring review page {}: {}", page_no, e);
                    break;
                }
            };
            // Sites clamp out-of-range page numbers to the last page.
            if page.reviews.is_empty() || page.reviews == previous {
                debug!("Review page {} adds nothing new, stopping", page_no);
                break;
            }
            if merged.title == UNTITLED_PRODUCT {
                merged.title = page.title;
            }
            if merged.image_url.is_empty() {
                merged.image_url = page.image_url;
            }
            previous = page.reviews.clone();
            merged.reviews.extend(page.reviews);
        }

        info!(
            "Extracted {:?}: {} reviews, {} with location",
            merged.title,
            merged.reviews.len(),
            merged.reviews.iter().filter(|r| r.location.is_some()).count()
        );
        Ok(merged)
    }

    async fn analyze_page(
        &self,
        page: ProductPage,
        run: &mut PipelineRun,
    ) -> Result<AnalysisResult, AnalysisError> {
        let ProductPage {
            title,
            image_url,
            reviews,
        } = page;

        run.enter(Stage::Scoring)?;
        let scorer = Arc::clone(&self.scorer);
        let scored = tokio::task::spawn_blocking(move || scorer.score_all(reviews))
            .await
            .map_err(|e| run.fail(Stage::Scoring, StageError::Worker(e.to_string())))?;

        // Ranking and geo grouping both need the complete scored set.
        run.enter(Stage::Aggregating)?;
        let ranker = Arc::clone(&self.ranker);
        let (scored, top_keywords, geographical_data) = tokio::task::spawn_blocking(move || {
            let (keywords, geo) = rayon::join(|| ranker.rank(&scored), || geo::aggregate(&scored));
            (scored, keywords, geo)
        })
        .await
        .map_err(|e| run.fail(Stage::Aggregating, StageError::Worker(e.to_string())))?;

        let overall = overall_sentiment(&scored);
        let sentiment_breakdown = SentimentBreakdown::from_reviews(&scored);
        let insights = summary::summarize(&scored, overall, &top_keywords);
        let reviews = self.review_digest(&scored).await;

        run.finish()?;
        info!(
            "✅ Analysis complete: {} reviews, overall {:.2}, {} keywords, {} locations",
            scored.len(),
            overall,
            top_keywords.len(),
            geographical_data.len()
        );

        Ok(AnalysisResult {
            title,
            image_url,
            analysis: Analysis {
                overall_sentiment: overall,
                sentiment_breakdown,
                top_keywords,
                geographical_data,
            },
            reviews,
            insights,
        })
    }

    async fn review_digest(&self, scored: &[ScoredReview]) -> String {
        match &self.remote {
            Some(remote) if !scored.is_empty() => match remote.summarize(scored).await {
                Ok(text) => text,
                Err(e) => {
                    warn!("Remote summary unavailable, using digest: {:#}", e);
                    summary::digest_reviews(scored)
                }
            },
            _ => summary::digest_reviews(scored),
        }
    }
}
