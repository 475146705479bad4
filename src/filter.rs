//! Categorical row filtering and filtered-CSV export
//!
//! A [`FilterSelection`] maps categorical column names to the set of values
//! kept for that column. Applying it narrows the dataset to rows whose
//! value, for every filtered column, is a member of that column's set
//! (logical AND across columns). Membership is strict: a null never matches,
//! so rows with a null in a filtered column are dropped even when every
//! listed value is selected. Columns absent from the selection are
//! unrestricted.

use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

use crate::{ChartdeckError, Dataset, Result};

/// Per-column sets of included values.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FilterSelection {
    selections: BTreeMap<String, BTreeSet<String>>,
}

/// One categorical column's filter state, as shown by the filter view:
/// every distinct value plus the currently selected subset.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FilterOptions {
    pub column: String,
    pub values: Vec<String>,
    pub selected: Vec<String>,
}

impl FilterSelection {
    /// No restrictions on any column.
    pub fn empty() -> Self {
        Self::default()
    }

    /// The filter view's default: every categorical column mapped to all of
    /// its distinct values.
    pub fn all_of(dataset: &Dataset) -> Result<Self> {
        let mut selection = Self::default();
        for column in dataset.categorical_columns() {
            let values = dataset.distinct_values(&column)?;
            selection.set(column, values);
        }
        Ok(selection)
    }

    /// Replace the selection for one column.
    pub fn set<I, S>(&mut self, column: impl Into<String>, values: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.selections
            .insert(column.into(), values.into_iter().map(Into::into).collect());
    }

    pub fn get(&self, column: &str) -> Option<&BTreeSet<String>> {
        self.selections.get(column)
    }

    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.selections.keys().map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.selections.is_empty()
    }

    /// Check that every filtered column exists and is categorical.
    pub fn validate(&self, dataset: &Dataset) -> Result<()> {
        for column in self.selections.keys() {
            match dataset.role(column) {
                Some(crate::ColumnRole::Categorical) => {}
                Some(role) => {
                    return Err(ChartdeckError::FilterError(format!(
                        "cannot filter column \"{column}\": it is {role}, not categorical"
                    )))
                }
                None => {
                    return Err(ChartdeckError::FilterError(format!(
                        "cannot filter unknown column \"{column}\""
                    )))
                }
            }
        }
        Ok(())
    }

    /// Narrow the dataset to rows matching every column's selection.
    pub fn apply(&self, dataset: &Dataset) -> Result<Dataset> {
        self.validate(dataset)?;
        if self.selections.is_empty() {
            return Ok(dataset.clone());
        }
        let mut combined: Option<BooleanChunked> = None;
        for (column, allowed) in &self.selections {
            let ca = dataset
                .frame()
                .column(column)
                .and_then(|col| col.str())
                .map_err(|e| ChartdeckError::InternalError(e.to_string()))?;
            let mask: BooleanChunked = ca
                .into_iter()
                .map(|value| value.map(|v| allowed.contains(v)).unwrap_or(false))
                .collect();
            combined = Some(match combined {
                Some(acc) => &acc & &mask,
                None => mask,
            });
        }
        let mask = combined.ok_or_else(|| {
            ChartdeckError::InternalError("filter produced no mask".to_string())
        })?;
        let narrowed = dataset
            .frame()
            .filter(&mask)
            .map_err(|e| ChartdeckError::InternalError(e.to_string()))?;
        tracing::debug!(
            rows_in = dataset.height(),
            rows_out = narrowed.height(),
            columns = self.selections.len(),
            "filter applied"
        );
        Ok(dataset.with_narrowed_frame(narrowed))
    }
}

/// Filter state for every categorical column, in column order. Columns
/// without an explicit selection report all values as selected.
pub fn filter_options(dataset: &Dataset, selection: &FilterSelection) -> Result<Vec<FilterOptions>> {
    let mut options = Vec::new();
    for column in dataset.categorical_columns() {
        let values = dataset.distinct_values(&column)?;
        let selected = match selection.get(&column) {
            Some(set) => set.iter().cloned().collect(),
            None => values.clone(),
        };
        options.push(FilterOptions {
            column,
            values,
            selected,
        });
    }
    Ok(options)
}

/// Serialize a dataset as downloadable CSV: UTF-8, comma-delimited, header
/// row, no index column.
pub fn to_csv_bytes(dataset: &Dataset) -> Result<Vec<u8>> {
    let mut buf = Vec::new();
    let mut frame = dataset.frame().clone();
    CsvWriter::new(&mut buf)
        .include_header(true)
        .finish(&mut frame)
        .map_err(|e| ChartdeckError::InternalError(format!("cannot serialize CSV: {e}")))?;
    Ok(buf)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dataset() -> Dataset {
        let df = df!(
            "dept" => ["Sales", "HR", "Sales", "IT", "HR"],
            "site" => ["north", "north", "south", "south", "north"],
            "salary" => [100i64, 80, 95, 90, 85],
        )
        .unwrap();
        Dataset::from_frame(df).unwrap()
    }

    #[test]
    fn test_all_values_selection_is_identity() {
        let ds = dataset();
        let selection = FilterSelection::all_of(&ds).unwrap();
        let filtered = selection.apply(&ds).unwrap();
        assert!(filtered.frame().equals(ds.frame()));
    }

    #[test]
    fn test_single_column_membership() {
        let ds = dataset();
        let mut selection = FilterSelection::empty();
        selection.set("dept", ["Sales"]);
        let filtered = selection.apply(&ds).unwrap();
        assert_eq!(filtered.height(), 2);
        let depts = filtered.string_values("dept").unwrap();
        assert!(depts.iter().all(|d| d.as_deref() == Some("Sales")));
    }

    #[test]
    fn test_selections_combine_with_and() {
        let ds = dataset();
        let mut selection = FilterSelection::empty();
        selection.set("dept", ["Sales", "HR"]);
        selection.set("site", ["north"]);
        let filtered = selection.apply(&ds).unwrap();
        // Rows 0 (Sales/north), 1 (HR/north) and 4 (HR/north) survive.
        assert_eq!(filtered.height(), 3);
    }

    #[test]
    fn test_empty_selection_matches_nothing() {
        let ds = dataset();
        let mut selection = FilterSelection::empty();
        selection.set("dept", Vec::<String>::new());
        assert_eq!(selection.apply(&ds).unwrap().height(), 0);
    }

    #[test]
    fn test_unknown_values_are_ignored() {
        let ds = dataset();
        let mut selection = FilterSelection::empty();
        selection.set("dept", ["Sales", "Bogus"]);
        assert_eq!(selection.apply(&ds).unwrap().height(), 2);
    }

    #[test]
    fn test_null_rows_drop_when_column_is_filtered() {
        let df = df!(
            "dept" => [Some("Sales"), None, Some("HR")],
            "salary" => [1i64, 2, 3],
        )
        .unwrap();
        let ds = Dataset::from_frame(df).unwrap();
        let selection = FilterSelection::all_of(&ds).unwrap();
        let filtered = selection.apply(&ds).unwrap();
        assert_eq!(filtered.height(), 2);
    }

    #[test]
    fn test_filtering_numeric_column_is_an_error() {
        let ds = dataset();
        let mut selection = FilterSelection::empty();
        selection.set("salary", ["100"]);
        assert!(matches!(
            selection.apply(&ds).unwrap_err(),
            ChartdeckError::FilterError(_)
        ));
    }

    #[test]
    fn test_filter_options_report_defaults() {
        let ds = dataset();
        let options = filter_options(&ds, &FilterSelection::empty()).unwrap();
        assert_eq!(options.len(), 2);
        assert_eq!(options[0].column, "dept");
        assert_eq!(options[0].values, vec!["Sales", "HR", "IT"]);
        assert_eq!(options[0].selected, options[0].values);
    }

    #[test]
    fn test_csv_bytes_round_trip() {
        let ds = dataset();
        let mut selection = FilterSelection::empty();
        selection.set("dept", ["IT"]);
        let filtered = selection.apply(&ds).unwrap();
        let bytes = to_csv_bytes(&filtered).unwrap();
        let text = String::from_utf8(bytes.clone()).unwrap();
        assert!(text.starts_with("dept,site,salary"));
        assert!(text.contains("IT,south,90"));
        // The export parses back with the same shape.
        let reloaded = crate::load_dataset("filtered.csv", &bytes).unwrap();
        assert_eq!(reloaded.frame().shape(), filtered.frame().shape());
    }

    proptest::proptest! {
        /// Membership law: a row survives iff every filtered column's value
        /// is inside that column's selection.
        #[test]
        fn prop_filter_membership(
            rows in proptest::collection::vec(
                (0usize..3, 0usize..2),
                0..40,
            ),
            dept_sel in proptest::collection::hash_set(0usize..3, 0..4),
            site_sel in proptest::collection::hash_set(0usize..2, 0..3),
        ) {
            let dept_pool = ["Sales", "HR", "IT"];
            let site_pool = ["north", "south"];
            let depts: Vec<&str> = rows.iter().map(|(d, _)| dept_pool[*d]).collect();
            let sites: Vec<&str> = rows.iter().map(|(_, s)| site_pool[*s]).collect();
            let df = df!("dept" => depts.clone(), "site" => sites.clone()).unwrap();
            let ds = Dataset::from_frame(df).unwrap();

            let dept_allowed: Vec<&str> = dept_sel.iter().map(|i| dept_pool[*i]).collect();
            let site_allowed: Vec<&str> = site_sel.iter().map(|i| site_pool[*i]).collect();
            let mut selection = FilterSelection::empty();
            selection.set("dept", dept_allowed.clone());
            selection.set("site", site_allowed.clone());

            let filtered = selection.apply(&ds).unwrap();
            let expected = depts
                .iter()
                .zip(&sites)
                .filter(|(d, s)| dept_allowed.contains(d) && site_allowed.contains(s))
                .count();
            proptest::prop_assert_eq!(filtered.height(), expected);
        }
    }
}
