//! Line chart of a numeric column over row index

use plotters::prelude::*;

use super::{
    draw_error, numeric_chart, padded_range, require_numeric_columns, selection_mismatch,
    standard_mesh, ChartArea, ChartKind,
};
use crate::chart::{ChartSelection, ChartType, Theme};
use crate::{Dataset, Result};

/// One numeric column in row order, with a gap wherever a value is null.
#[derive(Debug, Clone, Copy)]
pub struct Line;

impl ChartKind for Line {
    fn chart_type(&self) -> ChartType {
        ChartType::Line
    }

    fn validate(&self, dataset: &Dataset, selection: &ChartSelection) -> Result<()> {
        require_numeric_columns(dataset, self.chart_type(), 1)?;
        dataset.numeric_options(column_of(selection)?).map(|_| ())
    }

    fn render(
        &self,
        dataset: &Dataset,
        selection: &ChartSelection,
        caption: &str,
        theme: Theme,
        area: &ChartArea<'_>,
    ) -> Result<()> {
        let column = column_of(selection)?;
        let values = dataset.numeric_options(column)?;
        draw_line(area, &values, column, caption, theme)
    }
}

fn column_of(selection: &ChartSelection) -> Result<&str> {
    match selection {
        ChartSelection::Line { column } => Ok(column),
        _ => Err(selection_mismatch(ChartType::Line)),
    }
}

fn draw_line(
    area: &ChartArea<'_>,
    values: &[Option<f64>],
    column: &str,
    caption: &str,
    theme: Theme,
) -> Result<()> {
    let x_max = values.len().saturating_sub(1).max(1) as f64;
    let y_range = padded_range(values.iter().copied().flatten());

    let mut chart = numeric_chart(area, caption, theme, 0.0..x_max, y_range)?;
    standard_mesh(&mut chart, theme, "row", column)?;

    // Null values break the line, so each run of present values is its own
    // series.
    let mut segments: Vec<Vec<(f64, f64)>> = Vec::new();
    let mut current: Vec<(f64, f64)> = Vec::new();
    for (i, value) in values.iter().enumerate() {
        match value {
            Some(v) => current.push((i as f64, *v)),
            None => {
                if current.len() > 1 {
                    segments.push(std::mem::take(&mut current));
                } else {
                    current.clear();
                }
            }
        }
    }
    if current.len() > 1 {
        segments.push(current);
    }

    let color = theme.series_color(0);
    for segment in segments {
        chart
            .draw_series(LineSeries::new(segment, color.stroke_width(2)))
            .map_err(draw_error)?;
    }
    Ok(())
}
