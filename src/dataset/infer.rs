//! Column role inference for loaded datasets
//!
//! Every loaded column gets an explicit role up front, so the rest of the
//! pipeline never guesses at library defaults. The rules:
//!
//! - integer and float dtypes are [`ColumnRole::Numeric`];
//! - a string column whose non-null, non-empty values all parse as floats
//!   (with at least one such value) is normalized to `Float64` at load time
//!   and becomes Numeric;
//! - any remaining string column is [`ColumnRole::Categorical`];
//! - booleans, dates, datetimes and everything else are [`ColumnRole::Other`]:
//!   previewable and exported in CSV, but never filterable or chartable.

use polars::prelude::*;
use serde::{Deserialize, Serialize};

use crate::{ChartdeckError, Result};

/// How a column participates in filtering and charting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnRole {
    /// Eligible for line/histogram/scatter/box values and the correlation matrix.
    Numeric,
    /// Eligible for filtering and bar/pie/box grouping.
    Categorical,
    /// Carried through previews and CSV output only.
    Other,
}

impl std::fmt::Display for ColumnRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ColumnRole::Numeric => write!(f, "numeric"),
            ColumnRole::Categorical => write!(f, "categorical"),
            ColumnRole::Other => write!(f, "other"),
        }
    }
}

/// Check whether every non-null, non-empty value of a string column parses as
/// a float, with at least one value present.
fn is_numeric_string_column(series: &Series) -> bool {
    let Ok(ca) = series.str() else {
        return false;
    };
    let mut seen = false;
    for val in ca.into_iter().flatten() {
        if val.trim().is_empty() {
            continue;
        }
        if val.trim().parse::<f64>().is_err() {
            return false;
        }
        seen = true;
    }
    seen
}

/// Parse a numeric-looking string column into `Float64`, mapping nulls and
/// empty strings to null.
fn parse_numeric_strings(series: &Series) -> Result<Series> {
    let ca = series
        .str()
        .map_err(|e| ChartdeckError::InternalError(format!("expected string column: {e}")))?;
    let values: Vec<Option<f64>> = ca
        .into_iter()
        .map(|opt| opt.and_then(|v| v.trim().parse::<f64>().ok()))
        .collect();
    Ok(Series::new(series.name().clone(), values))
}

/// Rewrite string columns that hold numbers as `Float64` columns.
///
/// Runs once at load time, so role inference afterwards can read roles
/// straight from dtypes.
pub(crate) fn normalize_frame(mut frame: DataFrame) -> Result<DataFrame> {
    let numeric_like: Vec<String> = frame
        .get_columns()
        .iter()
        .filter(|col| col.dtype() == &DataType::String)
        .filter(|col| is_numeric_string_column(col.as_materialized_series()))
        .map(|col| col.name().to_string())
        .collect();
    for name in numeric_like {
        let parsed = {
            let col = frame
                .column(&name)
                .map_err(|e| ChartdeckError::InternalError(e.to_string()))?;
            parse_numeric_strings(col.as_materialized_series())?
        };
        frame
            .with_column(parsed)
            .map_err(|e| ChartdeckError::InternalError(e.to_string()))?;
    }
    Ok(frame)
}

/// Assign a role to every column of a normalized frame.
pub(crate) fn infer_roles(frame: &DataFrame) -> Vec<(String, ColumnRole)> {
    frame
        .get_columns()
        .iter()
        .map(|col| (col.name().to_string(), role_for_dtype(col.dtype())))
        .collect()
}

fn role_for_dtype(dtype: &DataType) -> ColumnRole {
    use DataType::*;
    match dtype {
        Int8 | Int16 | Int32 | Int64 | UInt8 | UInt16 | UInt32 | UInt64 | Float32 | Float64 => {
            ColumnRole::Numeric
        }
        String => ColumnRole::Categorical,
        _ => ColumnRole::Other,
    }
}
