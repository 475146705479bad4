//! Dataset loading, typing and summaries
//!
//! This module family turns an uploaded file into a [`Dataset`]: `loader`
//! dispatches on the file extension, `excel` bridges calamine worksheets
//! into frames, `infer` assigns every column an explicit [`ColumnRole`],
//! and `summary` produces the describe table for the Summary view.

#[cfg(feature = "excel")]
mod excel;
mod infer;
mod loader;
mod summary;
mod types;

pub use infer::ColumnRole;
pub use loader::load_dataset;
pub use summary::{summarize, ColumnSummary};
pub use types::Dataset;
