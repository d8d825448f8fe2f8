//! Derived statistics over the wide table. Pure functions, no I/O.

pub mod correlation;
pub mod growth;
pub mod metrics;
pub mod rolling;

pub use correlation::{pearson, CorrelationEngine, CorrelationMatrix, CountryCorrelation};
pub use growth::cagr;
pub use metrics::{CountryMetrics, MetricsEngine, MetricsOutput, DEFAULT_ROLLING_WINDOW};
pub use rolling::trailing_mean;
