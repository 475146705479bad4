//! chartdeck: upload, filter and visualize tabular data, then export the
//! charts as a PDF report.
//!
//! The pipeline has four stages, each usable on its own:
//!
//! 1. [`dataset`] loads an uploaded file (CSV, Excel, JSON or tab-delimited
//!    text) into a [`Dataset`] with an explicit role per column.
//! 2. [`filter`] narrows the dataset to rows whose categorical values are
//!    all inside the per-column selections, and serializes the result as CSV.
//! 3. [`chart`] validates a list of chart specifications against the column
//!    roles and renders one themed PNG figure per slot.
//! 4. [`report`] assembles the generated figures into a multi-page PDF,
//!    one captioned page per figure.
//!
//! [`session`] ties the stages together for the HTTP surface: each session
//! owns a dataset, a filter selection and the most recent figure list, with
//! downstream products invalidated whenever an upstream input changes.

use thiserror::Error;

pub mod chart;
pub mod dataset;
pub mod filter;
pub mod report;
pub mod session;

pub use chart::{build_figures, ChartKind, ChartSpec, ChartType, Figure, Theme};
pub use dataset::{load_dataset, ColumnRole, Dataset};
pub use filter::FilterSelection;
pub use report::render_report;
pub use session::{Session, SessionManager};

/// Crate version, exposed by the CLI and the REST API.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Errors produced by the chartdeck pipeline.
///
/// Each variant corresponds to one pipeline stage, so surfaces that report
/// errors (CLI, REST) can map them without inspecting message text.
#[derive(Error, Debug)]
pub enum ChartdeckError {
    /// File could not be parsed into a dataset.
    #[error("Load error: {0}")]
    LoadError(String),

    /// Filter selection referenced a column that cannot be filtered.
    #[error("Filter error: {0}")]
    FilterError(String),

    /// Chart specification was invalid or a figure failed to render.
    #[error("Chart error: {0}")]
    ChartError(String),

    /// Report assembly failed or there was nothing to export.
    #[error("Export error: {0}")]
    ExportError(String),

    /// Session was missing or had no dataset for the requested operation.
    #[error("Session error: {0}")]
    SessionError(String),

    /// Unexpected internal failure.
    #[error("Internal error: {0}")]
    InternalError(String),
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, ChartdeckError>;
