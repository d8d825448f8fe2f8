//! Domain types for EconLab

pub mod series;
pub mod wide;

pub use series::{CanonicalRow, IndicatorSeries, YearRange};
pub use wide::{RowKey, WideRow, WideTable};
