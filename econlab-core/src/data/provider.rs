//! Transport trait and structured error types.
//!
//! The Transport trait abstracts over the HTTP client so the fetcher can be
//! driven by scripted payloads in tests.

use serde_json::Value;
use thiserror::Error;

/// Structured error types for data acquisition.
///
/// Transport and schema failures are fatal to a run. Missing or unparseable
/// numeric values are not errors; they become `None` in the canonical rows.
#[derive(Debug, Error)]
pub enum DataError {
    #[error("request to {url} failed after {attempts} attempt(s): {reason}")]
    Transport {
        url: String,
        attempts: u32,
        reason: String,
    },

    #[error("HTTP {status} from {url}")]
    HttpStatus { status: u16, url: String },

    #[error("unexpected response schema: {0}")]
    Schema(String),

    #[error("indicator {indicator}, page {page}: {source}")]
    Page {
        indicator: String,
        page: u32,
        #[source]
        source: Box<DataError>,
    },
}

impl DataError {
    /// Attach the indicator code and page number a failure happened on.
    pub fn on_page(self, indicator: &str, page: u32) -> Self {
        DataError::Page {
            indicator: indicator.to_string(),
            page,
            source: Box::new(self),
        }
    }

    /// The innermost error, looking through page context.
    pub fn root(&self) -> &DataError {
        match self {
            DataError::Page { source, .. } => source.root(),
            other => other,
        }
    }

    pub fn is_transport(&self) -> bool {
        matches!(
            self.root(),
            DataError::Transport { .. } | DataError::HttpStatus { .. }
        )
    }

    pub fn is_schema(&self) -> bool {
        matches!(self.root(), DataError::Schema(_))
    }
}

/// Blocking JSON-over-HTTP transport.
///
/// Implementations own their retry behaviour; callers see either a decoded
/// JSON payload or a final error.
pub trait Transport {
    fn get_json(&self, url: &str, query: &[(String, String)]) -> Result<Value, DataError>;
}

/// Progress callback for multi-indicator fetches.
pub trait FetchProgress {
    /// Called when starting to fetch an indicator.
    fn on_start(&self, name: &str, code: &str, index: usize, total: usize);

    /// Called when an indicator fetch completes, with the number of canonical rows.
    fn on_complete(&self, name: &str, index: usize, total: usize, result: Result<usize, &DataError>);
}

/// Simple progress reporter that prints to stdout.
pub struct StdoutProgress;

impl FetchProgress for StdoutProgress {
    fn on_start(&self, name: &str, code: &str, index: usize, total: usize) {
        println!("[{}/{}] {name} ({code}) ...", index + 1, total);
    }

    fn on_complete(&self, name: &str, _index: usize, _total: usize, result: Result<usize, &DataError>) {
        match result {
            Ok(rows) => println!("  OK: {name}: {rows} rows"),
            Err(e) => println!("  FAIL: {name}: {e}"),
        }
    }
}
