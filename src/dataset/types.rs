//! The in-memory dataset and its role-aware column accessors

use polars::prelude::*;

use super::infer;
use crate::{ChartdeckError, ColumnRole, Result};

/// A loaded table plus an explicit role per column.
///
/// Construction runs normalization (numeric-looking string columns become
/// `Float64`) followed by role inference, so a `Dataset` never changes roles
/// after it exists. Filtering produces a narrowed copy; nothing mutates a
/// dataset in place.
#[derive(Debug, Clone)]
pub struct Dataset {
    frame: DataFrame,
    roles: Vec<(String, ColumnRole)>,
}

impl Dataset {
    /// Normalize a freshly parsed frame and infer column roles.
    pub fn from_frame(frame: DataFrame) -> Result<Self> {
        let frame = infer::normalize_frame(frame)?;
        let roles = infer::infer_roles(&frame);
        Ok(Self { frame, roles })
    }

    /// Same columns, fewer rows. Roles carry over unchanged.
    pub(crate) fn with_narrowed_frame(&self, frame: DataFrame) -> Self {
        Self {
            frame,
            roles: self.roles.clone(),
        }
    }

    pub fn frame(&self) -> &DataFrame {
        &self.frame
    }

    pub fn height(&self) -> usize {
        self.frame.height()
    }

    pub fn width(&self) -> usize {
        self.frame.width()
    }

    /// Column names with their roles, in column order.
    pub fn roles(&self) -> &[(String, ColumnRole)] {
        &self.roles
    }

    pub fn role(&self, column: &str) -> Option<ColumnRole> {
        self.roles
            .iter()
            .find(|(name, _)| name == column)
            .map(|(_, role)| *role)
    }

    pub fn numeric_columns(&self) -> Vec<String> {
        self.columns_with_role(ColumnRole::Numeric)
    }

    pub fn categorical_columns(&self) -> Vec<String> {
        self.columns_with_role(ColumnRole::Categorical)
    }

    fn columns_with_role(&self, role: ColumnRole) -> Vec<String> {
        self.roles
            .iter()
            .filter(|(_, r)| *r == role)
            .map(|(name, _)| name.clone())
            .collect()
    }

    /// First `rows` rows, for previews.
    pub fn head(&self, rows: usize) -> DataFrame {
        self.frame.head(Some(rows))
    }

    /// Distinct values of a categorical column in first-occurrence order,
    /// nulls skipped. Errors with `FilterError` when the column is missing
    /// or not categorical, since the filter surface is the caller.
    pub fn distinct_values(&self, column: &str) -> Result<Vec<String>> {
        match self.role(column) {
            Some(ColumnRole::Categorical) => {}
            Some(role) => {
                return Err(ChartdeckError::FilterError(format!(
                    "column \"{column}\" is {role}, not categorical"
                )))
            }
            None => {
                return Err(ChartdeckError::FilterError(format!(
                    "unknown column \"{column}\""
                )))
            }
        }
        let ca = self.str_column(column)?;
        let mut seen = std::collections::HashSet::new();
        let mut values = Vec::new();
        for val in ca.into_iter().flatten() {
            if seen.insert(val.to_string()) {
                values.push(val.to_string());
            }
        }
        Ok(values)
    }

    /// All values of a categorical column in row order, nulls preserved.
    pub fn string_values(&self, column: &str) -> Result<Vec<Option<String>>> {
        self.expect_role(column, ColumnRole::Categorical)?;
        let ca = self.str_column(column)?;
        Ok(ca.into_iter().map(|v| v.map(str::to_string)).collect())
    }

    /// Non-null values of a numeric column as `f64`, in row order.
    pub fn numeric_values(&self, column: &str) -> Result<Vec<f64>> {
        self.expect_role(column, ColumnRole::Numeric)?;
        Ok(self.f64_options(column)?.into_iter().flatten().collect())
    }

    /// All values of a numeric column in row order, nulls preserved.
    pub fn numeric_options(&self, column: &str) -> Result<Vec<Option<f64>>> {
        self.expect_role(column, ColumnRole::Numeric)?;
        self.f64_options(column)
    }

    /// Paired values of two numeric columns; rows where either side is null
    /// are dropped.
    pub fn numeric_pairs(&self, x: &str, y: &str) -> Result<Vec<(f64, f64)>> {
        self.expect_role(x, ColumnRole::Numeric)?;
        self.expect_role(y, ColumnRole::Numeric)?;
        let xs = self.f64_options(x)?;
        let ys = self.f64_options(y)?;
        Ok(xs
            .into_iter()
            .zip(ys)
            .filter_map(|pair| match pair {
                (Some(a), Some(b)) => Some((a, b)),
                _ => None,
            })
            .collect())
    }

    /// Numeric values grouped by a categorical column, groups in
    /// first-occurrence order. Rows with a null on either side are dropped.
    pub fn numeric_by_group(&self, group: &str, value: &str) -> Result<Vec<(String, Vec<f64>)>> {
        self.expect_role(group, ColumnRole::Categorical)?;
        self.expect_role(value, ColumnRole::Numeric)?;
        let labels = self.string_values(group)?;
        let values = self.f64_options(value)?;
        let mut order: Vec<String> = Vec::new();
        let mut grouped: std::collections::HashMap<String, Vec<f64>> =
            std::collections::HashMap::new();
        for (label, val) in labels.into_iter().zip(values) {
            let (Some(label), Some(val)) = (label, val) else {
                continue;
            };
            if !grouped.contains_key(&label) {
                order.push(label.clone());
            }
            grouped.entry(label).or_default().push(val);
        }
        Ok(order
            .into_iter()
            .map(|label| {
                let vals = grouped.remove(&label).unwrap_or_default();
                (label, vals)
            })
            .collect())
    }

    fn expect_role(&self, column: &str, expected: ColumnRole) -> Result<()> {
        match self.role(column) {
            Some(role) if role == expected => Ok(()),
            Some(role) => Err(ChartdeckError::ChartError(format!(
                "column \"{column}\" is {role}, not {expected}"
            ))),
            None => Err(ChartdeckError::ChartError(format!(
                "unknown column \"{column}\""
            ))),
        }
    }

    fn str_column(&self, column: &str) -> Result<&StringChunked> {
        self.frame
            .column(column)
            .and_then(|col| col.str())
            .map_err(|e| ChartdeckError::InternalError(e.to_string()))
    }

    fn f64_options(&self, column: &str) -> Result<Vec<Option<f64>>> {
        let series = self
            .frame
            .column(column)
            .map_err(|e| ChartdeckError::InternalError(e.to_string()))?
            .as_materialized_series()
            .cast(&DataType::Float64)
            .map_err(|e| ChartdeckError::InternalError(e.to_string()))?;
        let ca = series
            .f64()
            .map_err(|e| ChartdeckError::InternalError(e.to_string()))?;
        Ok(ca.into_iter().collect())
    }
}
