//! Error taxonomy for the analysis pipeline.
//!
//! Soft failures (missing title, image, location) never show up here; they are
//! absorbed by the extractor with placeholder values. Only I/O failures and
//! documents that are not markup at all are fatal.

use std::fmt;
use std::time::Duration;

use serde::Serialize;
use thiserror::Error;

/// Failure while retrieving a page.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request timed out after {0:?}")]
    Timeout(Duration),

    #[error("HTTP {status} returned by {url}")]
    HttpStatus { status: u16, url: String },

    #[error("network error: {0}")]
    Network(String),

    #[error("invalid URL {url:?}: {reason}")]
    InvalidUrl { url: String, reason: String },
}

impl FetchError {
    /// Whether a repeated request could plausibly succeed.
    pub fn is_transient(&self) -> bool {
        match self {
            FetchError::Timeout(_) | FetchError::Network(_) => true,
            FetchError::HttpStatus { status, .. } => {
                matches!(*status, 408 | 429) || (500..600).contains(status)
            }
            FetchError::InvalidUrl { .. } => false,
        }
    }
}

/// Unrecoverable markup problems. Missing elements are not errors.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ExtractionError {
    #[error("document is empty")]
    EmptyDocument,

    #[error("document contains no markup ({0} bytes of plain text)")]
    NotMarkup(usize),
}

/// Problems detected while building an [`crate::Analyzer`].
#[derive(Debug, Error)]
pub enum SetupError {
    #[error("invalid CSS selector {selector:?}: {reason}")]
    InvalidSelector { selector: String, reason: String },

    #[error("failed to build HTTP client: {0}")]
    HttpClient(#[from] reqwest::Error),

    #[error("failed to load sentiment lexicon from {path}: {reason}")]
    Lexicon { path: String, reason: String },
}

/// Pipeline stage a failure is attributed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Stage {
    Fetching,
    Extracting,
    Scoring,
    Aggregating,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Fetching => "fetching",
            Stage::Extracting => "extracting",
            Stage::Scoring => "scoring",
            Stage::Aggregating => "aggregating",
        };
        f.write_str(name)
    }
}

/// Root cause carried by an [`AnalysisError`].
#[derive(Debug, Error)]
pub enum StageError {
    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error(transparent)]
    Extraction(#[from] ExtractionError),

    /// A blocking worker panicked or was cancelled.
    #[error("worker task failed: {0}")]
    Worker(String),

    #[error(transparent)]
    Transition(#[from] InvalidTransition),
}

/// A pipeline state change outside the allowed sequence.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("illegal pipeline transition from {from} to {to}")]
pub struct InvalidTransition {
    pub from: String,
    pub to: String,
}

/// Umbrella error returned by `analyze`: the first fatal failure and where it happened.
#[derive(Debug, Error)]
#[error("analysis failed while {stage}: {cause}")]
pub struct AnalysisError {
    pub stage: Stage,
    #[source]
    pub cause: StageError,
}

impl AnalysisError {
    pub fn new(stage: Stage, cause: impl Into<StageError>) -> Self {
        Self {
            stage,
            cause: cause.into(),
        }
    }
}
