//! Chart rendering
//!
//! Turns a dataset plus a list of [`ChartSpec`] slots into PNG
//! [`Figure`]s. Each of the seven chart kinds validates its column
//! selection against the dataset before drawing, so an impossible slot
//! fails with a message instead of producing an empty picture.

pub mod stats;

mod kind;
mod pixelfont;
mod render;
mod theme;
mod types;

pub use kind::{kind_for, ChartArea, ChartBackend, ChartKind};
pub use render::{build_figures, render_figure, MAX_CHARTS};
pub use theme::{Theme, TABLEAU10};
pub use types::{ChartSelection, ChartSpec, ChartType, Figure};
