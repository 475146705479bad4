//! Excel workbook input via calamine
//!
//! Reads the first worksheet of an .xls/.xlsx upload. The first row supplies
//! column names; each remaining column is scanned once to pick a storage
//! type before any `Series` is built:
//!
//! - any non-empty text cell makes the whole column a string column;
//! - numeric cells narrow to `Int64` when every value is a whole number,
//!   otherwise `Float64`;
//! - pure boolean and pure datetime columns keep those types;
//! - any other mix falls back to strings via cell display text.

use calamine::{open_workbook_auto_from_rs, Data, Reader};
use chrono::NaiveDateTime;
use polars::prelude::{DataFrame, NamedFrom, Series};
use std::io::Cursor;

use crate::{ChartdeckError, Result};

/// Parse workbook bytes into a frame using the first worksheet.
pub(crate) fn frame_from_workbook(bytes: &[u8]) -> Result<DataFrame> {
    let mut workbook = open_workbook_auto_from_rs(Cursor::new(bytes.to_vec()))
        .map_err(|e| ChartdeckError::LoadError(format!("cannot open workbook: {e}")))?;
    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| ChartdeckError::LoadError("workbook has no worksheets".to_string()))?
        .map_err(|e| ChartdeckError::LoadError(format!("cannot read worksheet: {e}")))?;
    sheet_to_frame(&range)
}

fn sheet_to_frame(range: &calamine::Range<Data>) -> Result<DataFrame> {
    let mut rows = range.rows();
    let header_row = rows
        .next()
        .ok_or_else(|| ChartdeckError::LoadError("worksheet is empty".to_string()))?;
    let data_rows: Vec<&[Data]> = rows.collect();

    let mut columns = Vec::with_capacity(header_row.len());
    for (col_idx, header) in header_row.iter().enumerate() {
        let name = match header {
            Data::Empty => format!("column_{}", col_idx + 1),
            other => {
                let text = other.to_string().trim().to_string();
                if text.is_empty() {
                    format!("column_{}", col_idx + 1)
                } else {
                    text
                }
            }
        };
        let cells: Vec<&Data> = data_rows
            .iter()
            .map(|row| row.get(col_idx).unwrap_or(&Data::Empty))
            .collect();
        let col_type = infer_column_type(&cells);
        let series = column_to_series(&name, &cells, col_type);
        columns.push(series.into());
    }

    DataFrame::new_infer_height(columns)
        .map_err(|e| ChartdeckError::LoadError(format!("cannot assemble worksheet: {e}")))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ExcelColType {
    Int64,
    Float64,
    Boolean,
    Datetime,
    Utf8,
}

fn infer_column_type(cells: &[&Data]) -> ExcelColType {
    let mut has_string = false;
    let mut has_int = false;
    let mut has_fractional = false;
    let mut has_bool = false;
    let mut has_datetime = false;
    for cell in cells {
        match cell {
            Data::Empty => {}
            Data::String(s) => {
                if !s.trim().is_empty() {
                    has_string = true;
                }
            }
            Data::Int(_) => has_int = true,
            Data::Float(v) => {
                if v.fract() == 0.0 {
                    has_int = true;
                } else {
                    has_fractional = true;
                }
            }
            Data::Bool(_) => has_bool = true,
            Data::DateTime(_) | Data::DateTimeIso(_) => has_datetime = true,
            Data::DurationIso(_) | Data::Error(_) => has_string = true,
        }
    }
    let has_number = has_int || has_fractional;
    if has_string {
        ExcelColType::Utf8
    } else if has_datetime && !has_number && !has_bool {
        ExcelColType::Datetime
    } else if has_bool && !has_number && !has_datetime {
        ExcelColType::Boolean
    } else if has_number && !has_bool && !has_datetime {
        if has_fractional {
            ExcelColType::Float64
        } else {
            ExcelColType::Int64
        }
    } else {
        // Mixed bool/number/datetime columns keep their display text.
        ExcelColType::Utf8
    }
}

fn column_to_series(name: &str, cells: &[&Data], col_type: ExcelColType) -> Series {
    match col_type {
        ExcelColType::Int64 => {
            let v: Vec<Option<i64>> = cells
                .iter()
                .map(|cell| match cell {
                    Data::Int(i) => Some(*i),
                    Data::Float(f) => Some(*f as i64),
                    _ => None,
                })
                .collect();
            Series::new(name.into(), v)
        }
        ExcelColType::Float64 => {
            let v: Vec<Option<f64>> = cells
                .iter()
                .map(|cell| match cell {
                    Data::Int(i) => Some(*i as f64),
                    Data::Float(f) => Some(*f),
                    _ => None,
                })
                .collect();
            Series::new(name.into(), v)
        }
        ExcelColType::Boolean => {
            let v: Vec<Option<bool>> = cells
                .iter()
                .map(|cell| match cell {
                    Data::Bool(b) => Some(*b),
                    _ => None,
                })
                .collect();
            Series::new(name.into(), v)
        }
        ExcelColType::Datetime => {
            let v: Vec<Option<NaiveDateTime>> = cells
                .iter()
                .map(|cell| match cell {
                    Data::DateTime(dt) => dt.as_datetime(),
                    Data::DateTimeIso(s) => parse_iso_datetime(s),
                    _ => None,
                })
                .collect();
            Series::new(name.into(), v)
        }
        ExcelColType::Utf8 => {
            let v: Vec<Option<String>> = cells
                .iter()
                .map(|cell| match cell {
                    Data::Empty => None,
                    Data::String(s) => {
                        let trimmed = s.trim();
                        if trimmed.is_empty() {
                            None
                        } else {
                            Some(trimmed.to_string())
                        }
                    }
                    other => Some(other.to_string()),
                })
                .collect();
            Series::new(name.into(), v)
        }
    }
}

fn parse_iso_datetime(s: &str) -> Option<NaiveDateTime> {
    NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f")
        .ok()
        .or_else(|| {
            chrono::NaiveDate::parse_from_str(s, "%Y-%m-%d")
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use polars::prelude::DataType;

    #[test]
    fn test_infer_prefers_strings() {
        let cells = vec![Data::Float(1.0), Data::String("x".to_string())];
        let refs: Vec<&Data> = cells.iter().collect();
        assert_eq!(infer_column_type(&refs), ExcelColType::Utf8);
    }

    #[test]
    fn test_whole_floats_narrow_to_int() {
        let cells = vec![Data::Float(3.0), Data::Int(4), Data::Empty];
        let refs: Vec<&Data> = cells.iter().collect();
        assert_eq!(infer_column_type(&refs), ExcelColType::Int64);
        let series = column_to_series("n", &refs, ExcelColType::Int64);
        assert_eq!(series.dtype(), &DataType::Int64);
        assert_eq!(series.null_count(), 1);
    }

    #[test]
    fn test_fractional_floats_stay_float() {
        let cells = vec![Data::Float(3.5), Data::Int(4)];
        let refs: Vec<&Data> = cells.iter().collect();
        assert_eq!(infer_column_type(&refs), ExcelColType::Float64);
    }

    #[test]
    fn test_mixed_bool_and_number_falls_back_to_text() {
        let cells = vec![Data::Bool(true), Data::Int(1)];
        let refs: Vec<&Data> = cells.iter().collect();
        assert_eq!(infer_column_type(&refs), ExcelColType::Utf8);
    }

    #[test]
    fn test_sheet_to_frame_reads_headers_and_rows() {
        let mut range = calamine::Range::new((0, 0), (2, 1));
        range.set_value((0, 0), Data::String("dept".to_string()));
        range.set_value((0, 1), Data::String("salary".to_string()));
        range.set_value((1, 0), Data::String("Sales".to_string()));
        range.set_value((1, 1), Data::Float(100.5));
        range.set_value((2, 0), Data::String("HR".to_string()));
        range.set_value((2, 1), Data::Float(80.0));
        let df = sheet_to_frame(&range).unwrap();
        assert_eq!(df.shape(), (2, 2));
        assert_eq!(
            df.get_column_names()
                .iter()
                .map(|s| s.as_str())
                .collect::<Vec<_>>(),
            vec!["dept", "salary"]
        );
        assert_eq!(df.column("salary").unwrap().dtype(), &DataType::Float64);
    }

    #[test]
    fn test_empty_header_cell_gets_positional_name() {
        let mut range = calamine::Range::new((0, 0), (1, 1));
        range.set_value((0, 0), Data::String("a".to_string()));
        range.set_value((1, 0), Data::Int(1));
        range.set_value((1, 1), Data::Int(2));
        let df = sheet_to_frame(&range).unwrap();
        assert_eq!(
            df.get_column_names()
                .iter()
                .map(|s| s.as_str())
                .collect::<Vec<_>>(),
            vec!["a", "column_2"]
        );
    }
}
