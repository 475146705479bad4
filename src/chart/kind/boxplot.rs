//! Box-and-whisker chart of a numeric column grouped by a categorical one

use plotters::prelude::*;

use super::{
    caption_style, draw_error, label_style, padded_range, require_categorical_columns,
    require_numeric_columns, selection_mismatch, ChartArea, ChartKind,
};
use crate::chart::{stats, ChartSelection, ChartType, Theme};
use crate::{Dataset, Result};

/// One box per category: quartiles, whiskers at the furthest values within
/// 1.5 IQR of the box, outliers as points.
#[derive(Debug, Clone, Copy)]
pub struct BoxPlot;

impl ChartKind for BoxPlot {
    fn chart_type(&self) -> ChartType {
        ChartType::BoxPlot
    }

    fn validate(&self, dataset: &Dataset, selection: &ChartSelection) -> Result<()> {
        require_categorical_columns(dataset, self.chart_type())?;
        require_numeric_columns(dataset, self.chart_type(), 1)?;
        let (x, y) = columns_of(selection)?;
        dataset.numeric_by_group(x, y).map(|_| ())
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
        let boxes: Vec<(String, stats::BoxStats)> = dataset
            .numeric_by_group(x, y)?
            .into_iter()
            .filter_map(|(label, values)| stats::box_stats(&values).map(|s| (label, s)))
            .collect();
        draw_boxes(area, &boxes, x, y, caption, theme)
    }
}

fn columns_of(selection: &ChartSelection) -> Result<(&str, &str)> {
    match selection {
        ChartSelection::BoxPlot { x, y } => Ok((x, y)),
        _ => Err(selection_mismatch(ChartType::BoxPlot)),
    }
}

fn draw_boxes(
    area: &ChartArea<'_>,
    boxes: &[(String, stats::BoxStats)],
    x_col: &str,
    y_col: &str,
    caption: &str,
    theme: Theme,
) -> Result<()> {
    let n = boxes.len();
    let y_range = padded_range(boxes.iter().flat_map(|(_, b)| {
        let ends = [b.whisker_low, b.whisker_high];
        ends.into_iter().chain(b.outliers.iter().copied())
    }));
    // Boxes sit on integer positions so axis labels line up with them.
    let x_range = -0.6..(n.saturating_sub(1) as f64 + 0.6);

    let mut chart = ChartBuilder::on(area)
        .caption(caption, caption_style(theme))
        .margin(15)
        .set_label_area_size(LabelAreaPosition::Left, 60)
        .set_label_area_size(LabelAreaPosition::Bottom, 45)
        .build_cartesian_2d(x_range, y_range)
        .map_err(draw_error)?;

    chart
        .configure_mesh()
        .disable_x_mesh()
        .bold_line_style(theme.grid().mix(0.4))
        .light_line_style(&TRANSPARENT)
        .axis_style(theme.axis().stroke_width(1))
        .label_style(label_style(theme))
        .x_desc(x_col)
        .y_desc(y_col)
        .x_labels(n.clamp(1, 20) + 1)
        .x_label_formatter(&|v| {
            let idx = v.round();
            if (v - idx).abs() < 0.01 && idx >= 0.0 && (idx as usize) < n {
                boxes[idx as usize].0.clone()
            } else {
                String::new()
            }
        })
        .draw()
        .map_err(draw_error)?;

    let stroke = theme.foreground();
    for (i, (_, b)) in boxes.iter().enumerate() {
        let x = i as f64;
        let fill = theme.series_color(i).mix(0.7);
        chart
            .draw_series([
                Rectangle::new([(x - 0.3, b.q1), (x + 0.3, b.q3)], fill.filled()),
                Rectangle::new([(x - 0.3, b.q1), (x + 0.3, b.q3)], stroke.stroke_width(1)),
            ])
            .map_err(draw_error)?;
        chart
            .draw_series([
                PathElement::new(
                    vec![(x - 0.3, b.median), (x + 0.3, b.median)],
                    stroke.stroke_width(2),
                ),
                PathElement::new(vec![(x, b.q3), (x, b.whisker_high)], stroke.stroke_width(1)),
                PathElement::new(vec![(x, b.whisker_low), (x, b.q1)], stroke.stroke_width(1)),
                PathElement::new(
                    vec![(x - 0.15, b.whisker_high), (x + 0.15, b.whisker_high)],
                    stroke.stroke_width(1),
                ),
                PathElement::new(
                    vec![(x - 0.15, b.whisker_low), (x + 0.15, b.whisker_low)],
                    stroke.stroke_width(1),
                ),
            ])
            .map_err(draw_error)?;
        chart
            .draw_series(
                b.outliers
                    .iter()
                    .map(|o| Circle::new((x, *o), 3, stroke.stroke_width(1))),
            )
            .map_err(draw_error)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use polars::prelude::*;

    use super::super::{painted_pixels, test_draw};
    use super::*;

    fn dataset() -> Dataset {
        let frame = df!(
            "dept" => ["Sales", "Sales", "Sales", "IT", "IT", "IT", "Sales"],
            "salary" => [50.0, 60.0, 55.0, 90.0, 85.0, 95.0, 150.0],
        )
        .unwrap();
        Dataset::from_frame(frame).unwrap()
    }

    #[test]
    fn test_renders_grouped_boxes() {
        let buf = test_draw(
            &dataset(),
            ChartSelection::BoxPlot {
                x: "dept".to_string(),
                y: "salary".to_string(),
            },
        )
        .unwrap();
        assert!(painted_pixels(&buf) > 2_000);
    }

    #[test]
    fn test_swapped_roles_rejected() {
        let err = test_draw(
            &dataset(),
            ChartSelection::BoxPlot {
                x: "salary".to_string(),
                y: "dept".to_string(),
            },
        )
        .unwrap_err();
        assert!(err.to_string().contains("not"), "{err}");
    }
}
