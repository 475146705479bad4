//! Figure building: validate each slot, draw it, encode the raster as PNG

use plotters::prelude::{BitMapBackend, IntoDrawingArea};

use super::kind::kind_for;
use super::pixelfont::PixelTextBackend;
use super::{ChartSpec, Figure, Theme};
use crate::{ChartdeckError, Dataset, Result};

/// Most chart slots a single request may ask for.
pub const MAX_CHARTS: usize = 10;

/// Render every requested slot in order. Fails as a whole when any slot
/// fails, with the slot number in the message.
pub fn build_figures(dataset: &Dataset, specs: &[ChartSpec], theme: Theme) -> Result<Vec<Figure>> {
    if specs.is_empty() || specs.len() > MAX_CHARTS {
        return Err(ChartdeckError::ChartError(format!(
            "chart count must be between 1 and {MAX_CHARTS}, got {}",
            specs.len()
        )));
    }
    let figures = specs
        .iter()
        .enumerate()
        .map(|(slot, spec)| render_figure(dataset, spec, theme).map_err(|err| slot_error(slot, err)))
        .collect::<Result<Vec<_>>>()?;
    tracing::info!(figures = figures.len(), theme = %theme, "figures rendered");
    Ok(figures)
}

fn slot_error(slot: usize, err: ChartdeckError) -> ChartdeckError {
    match err {
        ChartdeckError::ChartError(msg) => {
            ChartdeckError::ChartError(format!("chart {}: {msg}", slot + 1))
        }
        other => other,
    }
}

/// Render one chart slot to a PNG figure.
pub fn render_figure(dataset: &Dataset, spec: &ChartSpec, theme: Theme) -> Result<Figure> {
    let kind = kind_for(spec.chart_type());
    kind.validate(dataset, &spec.selection)?;

    let caption = spec.caption_or_default();
    let (width, height) = spec.chart_type().pixel_size();
    let mut buf = vec![0u8; (width * height * 3) as usize];
    {
        let backend = PixelTextBackend::new(BitMapBackend::with_buffer(&mut buf, (width, height)));
        let area = backend.into_drawing_area();
        area.fill(&theme.background())
            .map_err(|e| ChartdeckError::ChartError(format!("drawing failed: {e}")))?;
        kind.render(dataset, &spec.selection, &caption, theme, &area)?;
        area.present()
            .map_err(|e| ChartdeckError::ChartError(format!("drawing failed: {e}")))?;
    }
    let png = encode_png(&buf, width, height)?;
    tracing::debug!(kind = %spec.chart_type(), width, height, bytes = png.len(), "figure rendered");
    Ok(Figure {
        caption,
        png,
        width,
        height,
    })
}

fn encode_png(rgb: &[u8], width: u32, height: u32) -> Result<Vec<u8>> {
    let img = image::RgbImage::from_raw(width, height, rgb.to_vec())
        .ok_or_else(|| ChartdeckError::InternalError("pixel buffer size mismatch".to_string()))?;
    let mut bytes = Vec::new();
    img.write_to(
        &mut std::io::Cursor::new(&mut bytes),
        image::ImageFormat::Png,
    )
    .map_err(|e| ChartdeckError::InternalError(format!("png encoding failed: {e}")))?;
    Ok(bytes)
}

#[cfg(test)]
mod tests {
    use polars::prelude::*;

    use super::*;
    use crate::chart::ChartSelection;

    fn dataset() -> Dataset {
        let frame = df!(
            "dept" => ["Sales", "IT", "Sales", "HR", "Sales", "IT"],
            "salary" => [50.0, 90.0, 60.0, 55.0, 58.0, 88.0],
            "age" => [31.0, 45.0, 28.0, 39.0, 33.0, 41.0],
        )
        .unwrap();
        Dataset::from_frame(frame).unwrap()
    }

    fn bar_spec(caption: &str) -> ChartSpec {
        ChartSpec::new(
            ChartSelection::Bar {
                column: "dept".to_string(),
            },
            caption,
        )
    }

    #[test]
    fn test_build_figures_keeps_slot_order() {
        let specs = vec![
            bar_spec("First"),
            ChartSpec::new(
                ChartSelection::Scatter {
                    x: "age".to_string(),
                    y: "salary".to_string(),
                },
                "Second",
            ),
        ];
        let figures = build_figures(&dataset(), &specs, Theme::Light).unwrap();
        assert_eq!(figures.len(), 2);
        assert_eq!(figures[0].caption, "First");
        assert_eq!(figures[1].caption, "Second");
        for figure in &figures {
            assert_eq!(&figure.png[..4], b"\x89PNG");
        }
    }

    #[test]
    fn test_figure_dimensions_match_declared() {
        let figure = render_figure(&dataset(), &bar_spec(""), Theme::Light).unwrap();
        assert_eq!((figure.width, figure.height), (960, 600));
        let decoded = image::load_from_memory(&figure.png).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (960, 600));
    }

    #[test]
    fn test_empty_caption_defaults_to_kind_name() {
        let figure = render_figure(&dataset(), &bar_spec("  "), Theme::Light).unwrap();
        assert_eq!(figure.caption, "My Bar Chart");
    }

    #[test]
    fn test_zero_slots_rejected() {
        let err = build_figures(&dataset(), &[], Theme::Light).unwrap_err();
        assert!(err.to_string().contains("between 1 and 10"), "{err}");
    }

    #[test]
    fn test_too_many_slots_rejected() {
        let specs = vec![bar_spec("x"); 11];
        let err = build_figures(&dataset(), &specs, Theme::Light).unwrap_err();
        assert!(err.to_string().contains("got 11"), "{err}");
    }

    #[test]
    fn test_failing_slot_is_named() {
        let specs = vec![
            bar_spec("ok"),
            ChartSpec::new(
                ChartSelection::Histogram {
                    column: "dept".to_string(),
                },
                "bad",
            ),
        ];
        let err = build_figures(&dataset(), &specs, Theme::Light).unwrap_err();
        assert!(err.to_string().contains("chart 2"), "{err}");
    }

    #[test]
    fn test_dark_theme_changes_background() {
        let light = render_figure(&dataset(), &bar_spec("c"), Theme::Light).unwrap();
        let dark = render_figure(&dataset(), &bar_spec("c"), Theme::Dark).unwrap();
        assert_ne!(light.png, dark.png);
    }
}
