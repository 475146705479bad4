//! Histogram of a numeric column with a density overlay

use plotters::prelude::*;

use super::{
    draw_error, numeric_chart, require_numeric_columns, selection_mismatch, standard_mesh,
    ChartArea, ChartKind,
};
use crate::chart::{stats, ChartSelection, ChartType, Theme};
use crate::{Dataset, Result};

/// Binned counts of one numeric column plus a kernel density curve scaled
/// to the same count axis.
#[derive(Debug, Clone, Copy)]
pub struct Histogram;

impl ChartKind for Histogram {
    fn chart_type(&self) -> ChartType {
        ChartType::Histogram
    }

    fn validate(&self, dataset: &Dataset, selection: &ChartSelection) -> Result<()> {
        require_numeric_columns(dataset, self.chart_type(), 1)?;
        dataset.numeric_values(column_of(selection)?).map(|_| ())
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
        let values = dataset.numeric_values(column)?;
        draw_histogram(area, &values, column, caption, theme)
    }
}

fn column_of(selection: &ChartSelection) -> Result<&str> {
    match selection {
        ChartSelection::Histogram { column } => Ok(column),
        _ => Err(selection_mismatch(ChartType::Histogram)),
    }
}

fn draw_histogram(
    area: &ChartArea<'_>,
    values: &[f64],
    column: &str,
    caption: &str,
    theme: Theme,
) -> Result<()> {
    let bins = stats::histogram(values);

    let (x_range, y_max, kde) = match &bins {
        Some(b) => {
            let lo = b.edges[0];
            let hi = *b.edges.last().unwrap_or(&1.0);
            // The density curve integrates to one; count scale needs
            // n * bin_width.
            let scale = values.len() as f64 * b.bin_width();
            let kde: Vec<(f64, f64)> = stats::kde_curve(values, lo, hi, 200)
                .into_iter()
                .map(|(x, d)| (x, d * scale))
                .collect();
            let top = b.max_count() as f64;
            let kde_top = kde.iter().map(|(_, y)| *y).fold(0.0, f64::max);
            (lo..hi, top.max(kde_top) * 1.1, kde)
        }
        None => (0.0..1.0, 1.0, Vec::new()),
    };

    let mut chart = numeric_chart(area, caption, theme, x_range, 0.0..y_max.max(1.0))?;
    standard_mesh(&mut chart, theme, column, "count")?;

    if let Some(b) = &bins {
        let fill = theme.series_color(0).mix(0.6);
        chart
            .draw_series(b.counts.iter().enumerate().map(|(i, count)| {
                Rectangle::new(
                    [(b.edges[i], 0.0), (b.edges[i + 1], *count as f64)],
                    fill.filled(),
                )
            }))
            .map_err(draw_error)?;
        if kde.len() > 1 {
            chart
                .draw_series(LineSeries::new(kde, theme.series_color(0).stroke_width(2)))
                .map_err(draw_error)?;
        }
    }
    Ok(())
}
