//! Upload parsing: extension dispatch into the format readers
//!
//! Uploads arrive as a file name plus raw bytes. The lowercased extension
//! alone picks the reader, matching the upload surface's contract:
//! `.csv` (comma), `.txt` (tab), `.json` (array of records), `.xls`/`.xlsx`
//! (first worksheet). Anything else is a load error.

use polars::prelude::*;
use std::io::Cursor;
use std::num::NonZeroUsize;

use super::Dataset;
#[cfg(feature = "excel")]
use super::excel;
use crate::{ChartdeckError, Result};

/// Schema inference window for the text readers.
const INFER_SCHEMA_ROWS: usize = 100;

/// Parse an uploaded file into a [`Dataset`].
///
/// Dispatches on the file extension only; the content is never sniffed.
pub fn load_dataset(file_name: &str, bytes: &[u8]) -> Result<Dataset> {
    let lower = file_name.to_lowercase();
    let ext = lower.rsplit_once('.').map(|(_, ext)| ext).unwrap_or("");
    let frame = match ext {
        "csv" => frame_from_delimited(bytes, b',')?,
        "txt" => frame_from_delimited(bytes, b'\t')?,
        "json" => frame_from_json(bytes)?,
        #[cfg(feature = "excel")]
        "xls" | "xlsx" => excel::frame_from_workbook(bytes)?,
        #[cfg(not(feature = "excel"))]
        "xls" | "xlsx" => {
            return Err(ChartdeckError::LoadError(
                "this build has no Excel support".to_string(),
            ))
        }
        other => {
            return Err(ChartdeckError::LoadError(format!(
                "unsupported file extension \"{other}\" (expected csv, xls, xlsx, json or txt)"
            )))
        }
    };
    let dataset = Dataset::from_frame(frame)?;
    tracing::info!(
        file = file_name,
        rows = dataset.height(),
        columns = dataset.width(),
        "dataset loaded"
    );
    Ok(dataset)
}

fn frame_from_delimited(bytes: &[u8], separator: u8) -> Result<DataFrame> {
    CsvReadOptions::default()
        .with_has_header(true)
        .with_infer_schema_length(Some(INFER_SCHEMA_ROWS))
        .map_parse_options(|opts| {
            opts.with_separator(separator)
                .with_try_parse_dates(true)
        })
        .into_reader_with_file_handle(Cursor::new(bytes))
        .finish()
        .map_err(|e| ChartdeckError::LoadError(format!("cannot parse delimited text: {e}")))
}

fn frame_from_json(bytes: &[u8]) -> Result<DataFrame> {
    JsonReader::new(Cursor::new(bytes))
        .with_json_format(JsonFormat::Json)
        .infer_schema_len(NonZeroUsize::new(INFER_SCHEMA_ROWS))
        .finish()
        .map_err(|e| ChartdeckError::LoadError(format!("cannot parse JSON: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ColumnRole;

    #[test]
    fn test_csv_preserves_shape_and_roles() {
        let bytes = b"dept,salary\nSales,100\nHR,80\nSales,95\n";
        let ds = load_dataset("staff.csv", bytes).unwrap();
        assert_eq!(ds.frame().shape(), (3, 2));
        assert_eq!(ds.role("dept"), Some(ColumnRole::Categorical));
        assert_eq!(ds.role("salary"), Some(ColumnRole::Numeric));
    }

    #[test]
    fn test_extension_match_is_case_insensitive() {
        let bytes = b"a,b\n1,2\n";
        let ds = load_dataset("DATA.CSV", bytes).unwrap();
        assert_eq!(ds.frame().shape(), (1, 2));
    }

    #[test]
    fn test_txt_is_tab_delimited() {
        let bytes = b"name\tscore\nalice\t10\nbob\t12\n";
        let ds = load_dataset("scores.txt", bytes).unwrap();
        assert_eq!(ds.frame().shape(), (2, 2));
        assert_eq!(ds.categorical_columns(), vec!["name"]);
    }

    #[test]
    fn test_json_records() {
        let bytes = br#"[{"dept":"Sales","salary":100},{"dept":"HR","salary":80}]"#;
        let ds = load_dataset("staff.json", bytes).unwrap();
        assert_eq!(ds.frame().shape(), (2, 2));
        assert_eq!(ds.role("salary"), Some(ColumnRole::Numeric));
    }

    #[test]
    fn test_date_columns_are_other() {
        let bytes = b"hired\n2024-01-01\n2024-03-15\n";
        let ds = load_dataset("dates.csv", bytes).unwrap();
        assert_eq!(ds.role("hired"), Some(ColumnRole::Other));
    }

    #[test]
    fn test_unsupported_extension_is_load_error() {
        let err = load_dataset("data.parquet", b"whatever").unwrap_err();
        let msg = err.to_string();
        assert!(matches!(err, ChartdeckError::LoadError(_)));
        assert!(msg.contains("parquet"), "unexpected message: {msg}");
    }

    #[test]
    fn test_malformed_json_is_load_error() {
        let err = load_dataset("broken.json", b"{not json").unwrap_err();
        assert!(matches!(err, ChartdeckError::LoadError(_)));
    }
}
