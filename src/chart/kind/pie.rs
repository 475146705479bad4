//! Pie chart of category proportions

use plotters::prelude::*;
use plotters::style::text_anchor::{HPos, Pos, VPos};

use super::{
    caption_style, draw_error, label_style, require_categorical_columns, selection_mismatch,
    ChartArea, ChartKind,
};
use crate::chart::{stats, ChartSelection, ChartType, Theme};
use crate::{Dataset, Result};

/// Wedges sized by value counts, starting at twelve o'clock and sweeping
/// counter-clockwise. Each wedge carries its share as a percentage.
#[derive(Debug, Clone, Copy)]
pub struct Pie;

impl ChartKind for Pie {
    fn chart_type(&self) -> ChartType {
        ChartType::Pie
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
        draw_pie(area, &counts, caption, theme)
    }
}

fn column_of(selection: &ChartSelection) -> Result<&str> {
    match selection {
        ChartSelection::Pie { column } => Ok(column),
        _ => Err(selection_mismatch(ChartType::Pie)),
    }
}

fn draw_pie(
    area: &ChartArea<'_>,
    counts: &[(String, u32)],
    caption: &str,
    theme: Theme,
) -> Result<()> {
    let (w, h) = area.dim_in_pixel();
    let cx = w as i32 / 2;
    let cy = h as i32 / 2 + 15;
    let radius = f64::from(w.min(h)) * 0.32;

    let title = caption_style(theme).pos(Pos::new(HPos::Center, VPos::Top));
    area.draw(&Text::new(caption.to_string(), (cx, 18), title))
        .map_err(draw_error)?;

    let total: f64 = counts.iter().map(|(_, c)| f64::from(*c)).sum();
    if total <= 0.0 {
        return Ok(());
    }

    let centered = label_style(theme).pos(Pos::new(HPos::Center, VPos::Center));
    let mut start = 90.0_f64;
    for (i, (label, count)) in counts.iter().enumerate() {
        let frac = f64::from(*count) / total;
        let sweep = frac * 360.0;
        let end = start + sweep;

        let steps = ((sweep / 2.0).ceil() as usize).max(2);
        let mut points: Vec<(i32, i32)> = Vec::with_capacity(steps + 2);
        points.push((cx, cy));
        for s in 0..=steps {
            let angle = (start + sweep * s as f64 / steps as f64).to_radians();
            points.push((
                cx + (radius * angle.cos()).round() as i32,
                cy - (radius * angle.sin()).round() as i32,
            ));
        }
        area.draw(&Polygon::new(points, theme.series_color(i).filled()))
            .map_err(draw_error)?;

        let mid = (start + end) / 2.0;
        let mid = mid.to_radians();
        let pct_at = |dist: f64| {
            (
                cx + (radius * dist * mid.cos()).round() as i32,
                cy - (radius * dist * mid.sin()).round() as i32,
            )
        };
        area.draw(&Text::new(
            format!("{:.1}%", frac * 100.0),
            pct_at(0.6),
            centered.clone(),
        ))
        .map_err(draw_error)?;
        area.draw(&Text::new(label.clone(), pct_at(1.18), centered.clone()))
            .map_err(draw_error)?;

        start = end;
    }
    Ok(())
}
