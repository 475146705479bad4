//! Correlation heatmap over every numeric column

use plotters::prelude::*;
use plotters::style::text_anchor::{HPos, Pos, VPos};

use super::{
    caption_style, draw_error, label_style, require_numeric_columns, selection_mismatch, ChartArea,
    ChartKind,
};
use crate::chart::{stats, ChartSelection, ChartType, Theme};
use crate::{Dataset, Result};

/// Pairwise Pearson matrix, one annotated cell per column pair on a
/// blue-to-red diverging scale. Undefined cells (a constant column) stay
/// blank.
#[derive(Debug, Clone, Copy)]
pub struct CorrelationHeatmap;

impl ChartKind for CorrelationHeatmap {
    fn chart_type(&self) -> ChartType {
        ChartType::CorrelationHeatmap
    }

    fn validate(&self, dataset: &Dataset, selection: &ChartSelection) -> Result<()> {
        match selection {
            ChartSelection::CorrelationHeatmap => {}
            _ => return Err(selection_mismatch(ChartType::CorrelationHeatmap)),
        }
        require_numeric_columns(dataset, self.chart_type(), 2)
    }

    fn render(
        &self,
        dataset: &Dataset,
        selection: &ChartSelection,
        caption: &str,
        theme: Theme,
        area: &ChartArea<'_>,
    ) -> Result<()> {
        match selection {
            ChartSelection::CorrelationHeatmap => {}
            _ => return Err(selection_mismatch(ChartType::CorrelationHeatmap)),
        }
        let columns = dataset.numeric_columns();
        let matrix = correlation_matrix(dataset, &columns)?;
        draw_heatmap(area, &columns, &matrix, caption, theme)
    }
}

/// Pearson coefficients over pairwise-complete rows. `None` where either
/// side has no variance or fewer than two shared values.
fn correlation_matrix(dataset: &Dataset, columns: &[String]) -> Result<Vec<Vec<Option<f64>>>> {
    let n = columns.len();
    let mut matrix = vec![vec![None; n]; n];
    for i in 0..n {
        for j in 0..=i {
            let (xs, ys): (Vec<f64>, Vec<f64>) = dataset
                .numeric_pairs(&columns[i], &columns[j])?
                .into_iter()
                .unzip();
            let r = stats::pearson(&xs, &ys);
            matrix[i][j] = r;
            matrix[j][i] = r;
        }
    }
    Ok(matrix)
}

fn draw_heatmap(
    area: &ChartArea<'_>,
    columns: &[String],
    matrix: &[Vec<Option<f64>>],
    caption: &str,
    theme: Theme,
) -> Result<()> {
    let (w, h) = area.dim_in_pixel();
    let (w, h) = (w as i32, h as i32);
    let n = columns.len() as i32;

    let left = 160.min(w / 4);
    let top = 60;
    let grid_w = w - left - 40;
    let grid_h = h - top - 70;

    let title = caption_style(theme).pos(Pos::new(HPos::Center, VPos::Top));
    area.draw(&Text::new(caption.to_string(), (w / 2, 18), title))
        .map_err(draw_error)?;

    let row_label = label_style(theme).pos(Pos::new(HPos::Right, VPos::Center));
    let col_label = label_style(theme).pos(Pos::new(HPos::Center, VPos::Top));

    for (i, row) in matrix.iter().enumerate() {
        let y0 = top + grid_h * i as i32 / n;
        let y1 = top + grid_h * (i as i32 + 1) / n;
        area.draw(&Text::new(
            columns[i].clone(),
            (left - 8, (y0 + y1) / 2),
            row_label.clone(),
        ))
        .map_err(draw_error)?;

        for (j, value) in row.iter().enumerate() {
            let x0 = left + grid_w * j as i32 / n;
            let x1 = left + grid_w * (j as i32 + 1) / n;
            let cell = match value {
                Some(r) => theme.diverging(*r),
                None => theme.background(),
            };
            area.draw(&Rectangle::new([(x0, y0), (x1, y1)], cell.filled()))
                .map_err(draw_error)?;
            if let Some(r) = value {
                let text = ("sans-serif", 13)
                    .into_font()
                    .color(&annotation_color(cell))
                    .pos(Pos::new(HPos::Center, VPos::Center));
                area.draw(&Text::new(
                    format!("{r:.2}"),
                    ((x0 + x1) / 2, (y0 + y1) / 2),
                    text,
                ))
                .map_err(draw_error)?;
            }
        }
    }

    for (j, column) in columns.iter().enumerate() {
        let x0 = left + grid_w * j as i32 / n;
        let x1 = left + grid_w * (j as i32 + 1) / n;
        area.draw(&Text::new(
            column.clone(),
            ((x0 + x1) / 2, top + grid_h + 8),
            col_label.clone(),
        ))
        .map_err(draw_error)?;
    }
    Ok(())
}

/// Dark text on light cells, light text on saturated ones.
fn annotation_color(cell: RGBColor) -> RGBColor {
    let luma = 0.299 * f64::from(cell.0) + 0.587 * f64::from(cell.1) + 0.114 * f64::from(cell.2);
    if luma < 140.0 {
        RGBColor(245, 245, 245)
    } else {
        RGBColor(25, 25, 25)
    }
}
