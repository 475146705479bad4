//! Per-kind chart renderers
//!
//! Each chart kind is a unit struct implementing [`ChartKind`]: an
//! eligibility check against the dataset plus the actual drawing.
//! [`kind_for`] maps a [`ChartType`] to its renderer.

mod bar;
mod boxplot;
mod heatmap;
mod histogram;
mod line;
mod pie;
mod scatter;

use std::ops::Range;

use plotters::coord::cartesian::Cartesian2d;
use plotters::coord::types::RangedCoordf64;
use plotters::coord::Shift;
use plotters::prelude::{
    BitMapBackend, ChartBuilder, ChartContext, DrawingArea, IntoFont, LabelAreaPosition, TextStyle,
};
use plotters::style::{Color, TRANSPARENT};

use super::pixelfont::PixelTextBackend;
use super::{ChartSelection, ChartType, Theme};
use crate::{ChartdeckError, Dataset, Result};

/// Raster backend every chart draws on: an RGB bitmap wrapped so text goes
/// through the built-in glyph renderer.
pub type ChartBackend<'a> = PixelTextBackend<BitMapBackend<'a>>;

/// Drawing surface handed to a renderer.
pub type ChartArea<'a> = DrawingArea<ChartBackend<'a>, Shift>;

/// One chart kind: knows what it needs from a dataset and how to draw it.
pub trait ChartKind: std::fmt::Debug + Send + Sync {
    fn chart_type(&self) -> ChartType;

    /// Check that the dataset and column selection can produce this chart.
    /// Runs before any drawing so a bad slot fails with a clear message.
    fn validate(&self, dataset: &Dataset, selection: &ChartSelection) -> Result<()>;

    /// Draw onto `area`, which is already filled with the theme background.
    fn render(
        &self,
        dataset: &Dataset,
        selection: &ChartSelection,
        caption: &str,
        theme: Theme,
        area: &ChartArea<'_>,
    ) -> Result<()>;
}

/// Renderer for a chart type.
pub fn kind_for(chart_type: ChartType) -> &'static dyn ChartKind {
    match chart_type {
        ChartType::Bar => &bar::Bar,
        ChartType::Line => &line::Line,
        ChartType::Histogram => &histogram::Histogram,
        ChartType::BoxPlot => &boxplot::BoxPlot,
        ChartType::Scatter => &scatter::Scatter,
        ChartType::Pie => &pie::Pie,
        ChartType::CorrelationHeatmap => &heatmap::CorrelationHeatmap,
    }
}

/// A selection variant reached the wrong renderer. Dispatch pairs the two,
/// so this is a bug, not user input.
fn selection_mismatch(chart: ChartType) -> ChartdeckError {
    ChartdeckError::InternalError(format!("selection does not match the {chart} renderer"))
}

fn draw_error(err: impl std::fmt::Display) -> ChartdeckError {
    ChartdeckError::ChartError(format!("drawing failed: {err}"))
}

/// Dataset offers no numeric column at all, so a numeric slot cannot be
/// filled. Reported as a chart error, never silently skipped.
fn require_numeric_columns(dataset: &Dataset, chart: ChartType, needed: usize) -> Result<()> {
    let available = dataset.numeric_columns().len();
    if available < needed {
        return Err(ChartdeckError::ChartError(format!(
            "{chart} needs {needed} numeric column(s), but the current dataset has {available}"
        )));
    }
    Ok(())
}

fn require_categorical_columns(dataset: &Dataset, chart: ChartType) -> Result<()> {
    if dataset.categorical_columns().is_empty() {
        return Err(ChartdeckError::ChartError(format!(
            "{chart} needs a categorical column, but the current dataset has none"
        )));
    }
    Ok(())
}

fn caption_style(theme: Theme) -> TextStyle<'static> {
    ("sans-serif", 22).into_font().color(&theme.foreground())
}

fn label_style(theme: Theme) -> TextStyle<'static> {
    ("sans-serif", 13).into_font().color(&theme.foreground())
}

/// Chart context over two numeric axes, shared by most renderers.
type NumericChart<'a, 'b> =
    ChartContext<'a, ChartBackend<'b>, Cartesian2d<RangedCoordf64, RangedCoordf64>>;

fn numeric_chart<'a, 'b>(
    area: &'a ChartArea<'b>,
    caption: &str,
    theme: Theme,
    x_range: Range<f64>,
    y_range: Range<f64>,
) -> Result<NumericChart<'a, 'b>> {
    ChartBuilder::on(area)
        .caption(caption, caption_style(theme))
        .margin(15)
        .set_label_area_size(LabelAreaPosition::Left, 60)
        .set_label_area_size(LabelAreaPosition::Bottom, 45)
        .build_cartesian_2d(x_range, y_range)
        .map_err(draw_error)
}

fn standard_mesh(
    chart: &mut NumericChart<'_, '_>,
    theme: Theme,
    x_desc: &str,
    y_desc: &str,
) -> Result<()> {
    chart
        .configure_mesh()
        .bold_line_style(theme.grid().mix(0.4))
        .light_line_style(&TRANSPARENT)
        .axis_style(theme.axis().stroke_width(1))
        .label_style(label_style(theme))
        .x_desc(x_desc)
        .y_desc(y_desc)
        .draw()
        .map_err(draw_error)?;
    Ok(())
}

/// Axis range covering `values` with a little padding, widened when the
/// data is empty or constant so the chart always has a usable span.
fn padded_range<I: IntoIterator<Item = f64>>(values: I) -> Range<f64> {
    let (mut lo, mut hi) = (f64::INFINITY, f64::NEG_INFINITY);
    for v in values {
        lo = lo.min(v);
        hi = hi.max(v);
    }
    if !lo.is_finite() || !hi.is_finite() {
        return 0.0..1.0;
    }
    if (hi - lo).abs() < f64::EPSILON {
        lo -= 1.0;
        hi += 1.0;
    }
    let pad = (hi - lo) * 0.05;
    (lo - pad)..(hi + pad)
}

#[cfg(test)]
fn test_draw(dataset: &Dataset, selection: ChartSelection) -> Result<Vec<u8>> {
    use plotters::prelude::IntoDrawingArea;

    let (width, height) = selection.chart_type().pixel_size();
    let mut buf = vec![0u8; (width * height * 3) as usize];
    {
        let backend =
            PixelTextBackend::new(BitMapBackend::with_buffer(&mut buf, (width, height)));
        let area = backend.into_drawing_area();
        area.fill(&plotters::style::WHITE).map_err(draw_error)?;
        let kind = kind_for(selection.chart_type());
        kind.validate(dataset, &selection)?;
        kind.render(dataset, &selection, "caption", Theme::Light, &area)?;
        area.present().map_err(draw_error)?;
    }
    Ok(buf)
}

/// Number of pixels that differ from pure white. Rendering tests use this
/// to prove something was drawn without pinning exact raster output.
#[cfg(test)]
fn painted_pixels(buf: &[u8]) -> usize {
    buf.chunks_exact(3)
        .filter(|px| px[0] != 255 || px[1] != 255 || px[2] != 255)
        .count()
}
