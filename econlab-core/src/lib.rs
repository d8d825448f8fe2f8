//! EconLab Core: indicator acquisition and analytics.
//!
//! This crate contains the data pipeline and the numerical core:
//! - Transport client with bounded retry and backoff
//! - Paginating fetcher for the World Bank indicator API
//! - Normalizer from nested API records to canonical rows
//! - Outer-join merge into a per-country/per-year wide table
//! - Growth rate, latest snapshot and rolling averages per country
//! - Pearson correlation per country and across the dataset
//!
//! Nothing here touches the filesystem; export lives in `econlab-runner`.

pub mod analytics;
pub mod data;
pub mod domain;
