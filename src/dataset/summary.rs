//! Numeric summary table for the Summary view
//!
//! Mirrors a describe() table: one row per numeric column with non-null
//! count, mean, sample standard deviation, min, quartiles and max. Columns
//! with no usable values report a count of zero and empty statistics.

use serde::Serialize;

use super::Dataset;
use crate::chart::stats;
use crate::Result;

/// Summary statistics for one numeric column.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ColumnSummary {
    pub column: String,
    pub count: usize,
    pub mean: Option<f64>,
    pub std: Option<f64>,
    pub min: Option<f64>,
    pub q25: Option<f64>,
    pub median: Option<f64>,
    pub q75: Option<f64>,
    pub max: Option<f64>,
}

/// Describe every numeric column of the dataset, in column order.
pub fn summarize(dataset: &Dataset) -> Result<Vec<ColumnSummary>> {
    let mut summaries = Vec::new();
    for column in dataset.numeric_columns() {
        let mut values = dataset.numeric_values(&column)?;
        values.sort_by(|a, b| a.total_cmp(b));
        summaries.push(ColumnSummary {
            count: values.len(),
            mean: stats::mean(&values),
            std: stats::std_dev(&values),
            min: values.first().copied(),
            q25: stats::quantile(&values, 0.25),
            median: stats::quantile(&values, 0.5),
            q75: stats::quantile(&values, 0.75),
            max: values.last().copied(),
            column,
        });
    }
    Ok(summaries)
}

#[cfg(test)]
mod tests {
    use super::*;
    use polars::prelude::*;

    #[test]
    fn test_describe_matches_known_values() {
        let df = df!(
            "v" => [1.0f64, 2.0, 3.0, 4.0],
            "label" => ["a", "b", "c", "d"],
        )
        .unwrap();
        let ds = Dataset::from_frame(df).unwrap();
        let summaries = summarize(&ds).unwrap();
        assert_eq!(summaries.len(), 1);
        let s = &summaries[0];
        assert_eq!(s.column, "v");
        assert_eq!(s.count, 4);
        assert_eq!(s.mean, Some(2.5));
        assert!((s.std.unwrap() - 1.2909944487358056).abs() < 1e-12);
        assert_eq!(s.min, Some(1.0));
        assert_eq!(s.q25, Some(1.75));
        assert_eq!(s.median, Some(2.5));
        assert_eq!(s.q75, Some(3.25));
        assert_eq!(s.max, Some(4.0));
    }

    #[test]
    fn test_all_null_column_reports_zero_count() {
        let df = df!("v" => [None::<f64>, None, None]).unwrap();
        let ds = Dataset::from_frame(df).unwrap();
        let summaries = summarize(&ds).unwrap();
        assert_eq!(summaries[0].count, 0);
        assert_eq!(summaries[0].mean, None);
        assert_eq!(summaries[0].max, None);
    }

    #[test]
    fn test_single_value_has_no_std() {
        let df = df!("v" => [42.0f64]).unwrap();
        let ds = Dataset::from_frame(df).unwrap();
        let summaries = summarize(&ds).unwrap();
        assert_eq!(summaries[0].std, None);
        assert_eq!(summaries[0].median, Some(42.0));
    }
}
