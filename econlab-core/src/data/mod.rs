//! Indicator acquisition: transport, pagination, normalization, merge

pub mod merge;
pub mod normalize;
pub mod provider;
pub mod transport;
pub mod worldbank;

pub use merge::merge_indicators;
pub use normalize::Normalizer;
pub use provider::{DataError, FetchProgress, StdoutProgress, Transport};
pub use transport::{Backoff, HttpTransport, RetryPolicy, TransportConfig};
pub use worldbank::{Fetcher, FetchedPages, IndicatorQuery, DEFAULT_BASE_URL, PAGE_DELAY};
