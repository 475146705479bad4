//! Bar chart of category frequencies

use plotters::prelude::*;

use super::{
    caption_style, draw_error, label_style, require_categorical_columns, selection_mismatch,
    ChartArea, ChartKind,
};
use crate::chart::{stats, ChartSelection, ChartType, Theme};
use crate::{Dataset, Result};

/// Vertical bars counting each value of one categorical column, most
/// frequent first.
#[derive(Debug, Clone, Copy)]
pub struct Bar;

impl ChartKind for Bar {
    fn chart_type(&self) -> ChartType {
        ChartType::Bar
    }

    fn validate(&self, dataset: &Dataset, selection: &ChartSelection) -> Result<()> {
        require_categorical_columns(dataset, self.chart_type())?;
        dataset.string_values(column_of(selection)?).map(|_| ())
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
        let counts = stats::value_counts(&dataset.string_values(column)?);
        draw_bars(area, &counts, column, caption, theme)
    }
}

fn column_of(selection: &ChartSelection) -> Result<&str> {
    match selection {
        ChartSelection::Bar { column } => Ok(column),
        _ => Err(selection_mismatch(ChartType::Bar)),
    }
}

fn draw_bars(
    area: &ChartArea<'_>,
    counts: &[(String, u32)],
    column: &str,
    caption: &str,
    theme: Theme,
) -> Result<()> {
    let n = counts.len().max(1) as u32;
    let top = counts.iter().map(|(_, c)| *c).max().unwrap_or(0).max(1);
    let y_max = top + (top + 9) / 10;

    let mut chart = ChartBuilder::on(area)
        .caption(caption, caption_style(theme))
        .margin(15)
        .set_label_area_size(LabelAreaPosition::Left, 60)
        .set_label_area_size(LabelAreaPosition::Bottom, 45)
        .build_cartesian_2d((0u32..n).into_segmented(), 0u32..y_max)
        .map_err(draw_error)?;

    chart
        .configure_mesh()
        .disable_x_mesh()
        .bold_line_style(theme.grid().mix(0.4))
        .light_line_style(&TRANSPARENT)
        .axis_style(theme.axis().stroke_width(1))
        .label_style(label_style(theme))
        .x_desc(column)
        .y_desc("count")
        .x_labels(counts.len().clamp(1, 20))
        .x_label_formatter(&|seg| match seg {
            SegmentValue::CenterOf(i) => counts
                .get(*i as usize)
                .map(|(label, _)| label.clone())
                .unwrap_or_default(),
            _ => String::new(),
        })
        .draw()
        .map_err(draw_error)?;

    chart
        .draw_series(
            Histogram::vertical(&chart)
                .style(theme.series_color(0).filled())
                .margin(6)
                .data(counts.iter().enumerate().map(|(i, (_, c))| (i as u32, *c))),
        )
        .map_err(draw_error)?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use polars::prelude::*;

    use super::super::{painted_pixels, test_draw};
    use super::*;
    use crate::ChartdeckError;

    fn dataset() -> Dataset {
        let frame = df!(
            "dept" => ["Sales", "IT", "Sales", "HR", "Sales"],
            "salary" => [50.0, 90.0, 60.0, 55.0, 58.0],
        )
        .unwrap();
        Dataset::from_frame(frame).unwrap()
    }

    #[test]
    fn test_renders_category_counts() {
        let buf = test_draw(
            &dataset(),
            ChartSelection::Bar {
                column: "dept".to_string(),
            },
        )
        .unwrap();
        assert!(painted_pixels(&buf) > 2_000);
    }

    #[test]
    fn test_rejects_numeric_column() {
        let err = test_draw(
            &dataset(),
            ChartSelection::Bar {
                column: "salary".to_string(),
            },
        )
        .unwrap_err();
        assert!(matches!(err, ChartdeckError::ChartError(_)));
    }

    #[test]
    fn test_reports_missing_categorical_columns() {
        let frame = df!("salary" => [50.0, 90.0]).unwrap();
        let data = Dataset::from_frame(frame).unwrap();
        let err = test_draw(
            &data,
            ChartSelection::Bar {
                column: "dept".to_string(),
            },
        )
        .unwrap_err();
        assert!(err.to_string().contains("categorical"), "{err}");
    }
}
