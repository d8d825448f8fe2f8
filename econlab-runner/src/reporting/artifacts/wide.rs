//! Wide table export (CSV/Parquet).

use anyhow::{Context, Result};
use econlab_core::domain::WideTable;
use polars::prelude::{Column, DataFrame, NamedFrom, ParquetWriter, Series};
use std::fs::File;
use std::path::Path;

use crate::reporting::csv_cell;

/// Header: `country, country_code, year`, then indicator and derived columns.
pub fn wide_header(table: &WideTable) -> Vec<String> {
    let mut header = vec![
        "country".to_string(),
        "country_code".to_string(),
        "year".to_string(),
    ];
    header.extend(table.value_columns().into_iter().map(str::to_string));
    header
}

pub fn write_wide_csv(path: &Path, table: &WideTable) -> Result<()> {
    let mut wtr = csv::Writer::from_path(path)
        .with_context(|| format!("Failed to create wide CSV {}", path.display()))?;
    wtr.write_record(wide_header(table))?;

    for row in &table.rows {
        let mut record = vec![
            row.country().to_string(),
            row.country_code().to_string(),
            row.year().to_string(),
        ];
        record.extend(row.values.iter().chain(row.derived.iter()).map(|v| csv_cell(*v)));
        wtr.write_record(&record)?;
    }

    wtr.flush()
        .with_context(|| format!("Failed to flush wide CSV {}", path.display()))?;
    Ok(())
}

pub fn write_wide_parquet(path: &Path, table: &WideTable) -> Result<()> {
    let countries: Vec<&str> = table.rows.iter().map(|r| r.country()).collect();
    let codes: Vec<&str> = table.rows.iter().map(|r| r.country_code()).collect();
    let years: Vec<i32> = table.rows.iter().map(|r| r.year()).collect();

    let mut columns = vec![
        Column::Series(Series::new("country".into(), countries).into()),
        Column::Series(Series::new("country_code".into(), codes).into()),
        Column::Series(Series::new("year".into(), years).into()),
    ];
    for name in table.value_columns() {
        let values: Vec<Option<f64>> = table.column(name);
        columns.push(Column::Series(Series::new(name.into(), values).into()));
    }

    let mut df = DataFrame::new(columns).context("Failed to build wide dataframe")?;

    let mut file = File::create(path)
        .with_context(|| format!("Failed to create wide parquet {}", path.display()))?;
    ParquetWriter::new(&mut file)
        .finish(&mut df)
        .context("Failed to write wide parquet")?;
    Ok(())
}
