//! Scatter chart of two numeric columns

use plotters::prelude::*;

use super::{
    draw_error, numeric_chart, padded_range, require_numeric_columns, selection_mismatch,
    standard_mesh, ChartArea, ChartKind,
};
use crate::chart::{ChartSelection, ChartType, Theme};
use crate::{Dataset, Result};

/// One point per row; rows with a null on either side are dropped.
#[derive(Debug, Clone, Copy)]
pub struct Scatter;

impl ChartKind for Scatter {
    fn chart_type(&self) -> ChartType {
        ChartType::Scatter
    }

    fn validate(&self, dataset: &Dataset, selection: &ChartSelection) -> Result<()> {
        require_numeric_columns(dataset, self.chart_type(), 1)?;
        let (x, y) = columns_of(selection)?;
        dataset.numeric_pairs(x, y).map(|_| ())
    }

    fn render(
        &self,
        dataset: &Dataset,
        selection: &ChartSelection,
        caption: &str,
        theme: Theme,
        area: &ChartArea<'_>,
    ) -> Result<()> {
        let (x, y) = columns_of(selection)?;
        let pairs = dataset.numeric_pairs(x, y)?;
        draw_points(area, &pairs, x, y, caption, theme)
    }
}

fn columns_of(selection: &ChartSelection) -> Result<(&str, &str)> {
    match selection {
        ChartSelection::Scatter { x, y } => Ok((x, y)),
        _ => Err(selection_mismatch(ChartType::Scatter)),
    }
}

fn draw_points(
    area: &ChartArea<'_>,
    pairs: &[(f64, f64)],
    x_col: &str,
    y_col: &str,
    caption: &str,
    theme: Theme,
) -> Result<()> {
    let x_range = padded_range(pairs.iter().map(|(a, _)| *a));
    let y_range = padded_range(pairs.iter().map(|(_, b)| *b));

    let mut chart = numeric_chart(area, caption, theme, x_range, y_range)?;
    standard_mesh(&mut chart, theme, x_col, y_col)?;

    let color = theme.series_color(0).mix(0.7);
    chart
        .draw_series(
            pairs
                .iter()
                .map(|(a, b)| Circle::new((*a, *b), 4, color.filled())),
        )
        .map_err(draw_error)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use polars::prelude::*;

    use super::super::{painted_pixels, test_draw};
    use super::*;

    #[test]
    fn test_renders_points() {
        let frame = df!(
            "x" => [1.0, 2.0, 3.0, 4.0, 5.0],
            "y" => [2.0, 4.1, 5.9, 8.2, 9.8],
        )
        .unwrap();
        let data = Dataset::from_frame(frame).unwrap();
        let buf = test_draw(
            &data,
            ChartSelection::Scatter {
                x: "x".to_string(),
                y: "y".to_string(),
            },
        )
        .unwrap();
        assert!(painted_pixels(&buf) > 1_000);
    }

    #[test]
    fn test_same_column_both_axes() {
        let frame = df!("x" => [1.0, 2.0, 3.0]).unwrap();
        let data = Dataset::from_frame(frame).unwrap();
        let buf = test_draw(
            &data,
            ChartSelection::Scatter {
                x: "x".to_string(),
                y: "x".to_string(),
            },
        )
        .unwrap();
        assert!(painted_pixels(&buf) > 500);
    }

    #[test]
    fn test_unknown_column_rejected() {
        let frame = df!("x" => [1.0, 2.0]).unwrap();
        let data = Dataset::from_frame(frame).unwrap();
        let err = test_draw(
            &data,
            ChartSelection::Scatter {
                x: "x".to_string(),
                y: "missing".to_string(),
            },
        )
        .unwrap_err();
        assert!(err.to_string().contains("unknown column"), "{err}");
    }
}
