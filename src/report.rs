//! PDF report assembly
//!
//! Lays the generated figures out as an A4 portrait document, one page per
//! figure: the caption wrapped at the top, the chart image below it scaled
//! to the full content width.

use printpdf::{
    BuiltinFont, ColorBits, ColorSpace, Image, ImageTransform, ImageXObject, Mm, PdfDocument, Px,
};

use crate::chart::Figure;
use crate::{ChartdeckError, Result};

const PAGE_WIDTH_MM: f32 = 210.0;
const PAGE_HEIGHT_MM: f32 = 297.0;
const MARGIN_MM: f32 = 10.0;
const LINE_HEIGHT_MM: f32 = 10.0;
const CAPTION_PT: f32 = 12.0;
/// Characters per caption line at 12pt Helvetica inside the margins.
const CAPTION_WRAP: usize = 90;
const IMAGE_WIDTH_MM: f32 = 180.0;
const IMAGE_TOP_MM: f32 = 30.0;

/// Assemble the figures into a PDF, in figure order.
///
/// Refuses an empty list: there is nothing to export before charts were
/// generated.
pub fn render_report(figures: &[Figure]) -> Result<Vec<u8>> {
    if figures.is_empty() {
        return Err(ChartdeckError::ExportError(
            "no figures to export; generate charts first".to_string(),
        ));
    }

    let doc = PdfDocument::empty("chartdeck report");
    let font = doc
        .add_builtin_font(BuiltinFont::Helvetica)
        .map_err(|e| ChartdeckError::ExportError(format!("font setup failed: {e}")))?;

    for figure in figures {
        let (page, layer) = doc.add_page(Mm(PAGE_WIDTH_MM), Mm(PAGE_HEIGHT_MM), "Layer 1");
        let layer = doc.get_page(page).get_layer(layer);

        for (i, line) in wrap_caption(&figure.caption, CAPTION_WRAP).iter().enumerate() {
            let y = PAGE_HEIGHT_MM - MARGIN_MM - 7.0 - i as f32 * LINE_HEIGHT_MM;
            layer.use_text(line.clone(), CAPTION_PT, Mm(MARGIN_MM), Mm(y), &font);
        }

        let decoded = image::load_from_memory(&figure.png)
            .map_err(|e| ChartdeckError::ExportError(format!("figure PNG is unreadable: {e}")))?
            .to_rgb8();
        let (width, height) = (decoded.width(), decoded.height());
        let display_height = IMAGE_WIDTH_MM * height as f32 / width as f32;

        let xobject = ImageXObject {
            width: Px(width as usize),
            height: Px(height as usize),
            color_space: ColorSpace::Rgb,
            bits_per_component: ColorBits::Bit8,
            interpolate: true,
            image_data: decoded.into_raw(),
            image_filter: None,
            clipping_bbox: None,
            smask: None,
        };
        // dpi chosen so the image lands at the full content width.
        let dpi = width as f32 * 25.4 / IMAGE_WIDTH_MM;
        Image::from(xobject).add_to_layer(
            layer,
            ImageTransform {
                translate_x: Some(Mm(MARGIN_MM)),
                translate_y: Some(Mm(PAGE_HEIGHT_MM - IMAGE_TOP_MM - display_height)),
                dpi: Some(dpi),
                ..Default::default()
            },
        );
    }

    let bytes = doc
        .save_to_bytes()
        .map_err(|e| ChartdeckError::ExportError(format!("pdf serialization failed: {e}")))?;
    tracing::info!(pages = figures.len(), bytes = bytes.len(), "report assembled");
    Ok(bytes)
}

/// Greedy word wrap; tokens longer than a line are hard-broken.
fn wrap_caption(text: &str, max_chars: usize) -> Vec<String> {
    let mut lines: Vec<String> = Vec::new();
    let mut current = String::new();
    for word in text.split_whitespace() {
        let mut rest = word;
        while rest.chars().count() > max_chars {
            if !current.is_empty() {
                lines.push(std::mem::take(&mut current));
            }
            let cut = rest
                .char_indices()
                .nth(max_chars)
                .map(|(i, _)| i)
                .unwrap_or(rest.len());
            lines.push(rest[..cut].to_string());
            rest = &rest[cut..];
        }
        if rest.is_empty() {
            continue;
        }
        let fits = current.is_empty()
            || current.chars().count() + 1 + rest.chars().count() <= max_chars;
        if !fits {
            lines.push(std::mem::take(&mut current));
        }
        if !current.is_empty() {
            current.push(' ');
        }
        current.push_str(rest);
    }
    if !current.is_empty() {
        lines.push(current);
    }
    if lines.is_empty() {
        lines.push(String::new());
    }
    lines
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tiny_figure(caption: &str) -> Figure {
        let img = image::RgbImage::from_pixel(8, 6, image::Rgb([200, 10, 10]));
        let mut png = Vec::new();
        img.write_to(&mut std::io::Cursor::new(&mut png), image::ImageFormat::Png)
            .unwrap();
        Figure {
            caption: caption.to_string(),
            png,
            width: 8,
            height: 6,
        }
    }

    fn count_occurrences(haystack: &[u8], needle: &[u8]) -> usize {
        haystack
            .windows(needle.len())
            .filter(|w| *w == needle)
            .count()
    }

    #[test]
    fn test_empty_figure_list_is_an_export_error() {
        let err = render_report(&[]).unwrap_err();
        assert!(err.to_string().contains("generate charts first"), "{err}");
    }

    #[test]
    fn test_one_page_per_figure() {
        let figures = vec![tiny_figure("a"), tiny_figure("b"), tiny_figure("c")];
        let bytes = render_report(&figures).unwrap();
        assert_eq!(&bytes[..5], b"%PDF-");
        let pages_nodes = count_occurrences(&bytes, b"/Type/Pages");
        let page_nodes = count_occurrences(&bytes, b"/Type/Page") - pages_nodes;
        assert_eq!(pages_nodes, 1);
        assert_eq!(page_nodes, 3);
    }

    #[test]
    fn test_single_figure_report() {
        let bytes = render_report(&[tiny_figure("only one")]).unwrap();
        let pages_nodes = count_occurrences(&bytes, b"/Type/Pages");
        assert_eq!(
            count_occurrences(&bytes, b"/Type/Page") - pages_nodes,
            1
        );
    }

    #[test]
    fn test_wrap_keeps_short_caption_on_one_line() {
        assert_eq!(wrap_caption("My Bar Chart", 90), vec!["My Bar Chart"]);
    }

    #[test]
    fn test_wrap_splits_on_word_boundaries() {
        let lines = wrap_caption("one two three four", 9);
        assert_eq!(lines, vec!["one two", "three", "four"]);
    }

    #[test]
    fn test_wrap_hard_breaks_long_tokens() {
        let lines = wrap_caption("abcdefghij", 4);
        assert_eq!(lines, vec!["abcd", "efgh", "ij"]);
    }

    #[test]
    fn test_wrap_empty_caption_yields_one_blank_line() {
        assert_eq!(wrap_caption("", 90), vec![String::new()]);
    }
}
