//! Text rendering backend for headless chart output
//!
//! plotters is built without its ttf/ab_glyph font providers, because those
//! pull in system font libraries that are unreliable on headless hosts. The
//! replacement provider panics as soon as a label is drawn, so this wrapper
//! intercepts every text operation on the way to the inner backend and
//! rasterizes labels itself from a built-in 5x7 pixel font. Geometry calls
//! pass straight through. Metrics come from the same glyph table that draws,
//! so label areas and anchors stay consistent.

use plotters_backend::{
    text_anchor::{HPos, VPos},
    BackendColor, BackendCoord, BackendStyle, BackendTextStyle, DrawingBackend, DrawingErrorKind,
};

const GLYPH_HEIGHT: i32 = 7;

#[derive(Debug, Clone, Copy)]
struct Glyph {
    width: u8,
    rows: [u8; 7],
}

const fn g(width: u8, rows: [u8; 7]) -> Glyph {
    Glyph { width, rows }
}

/// 5x7 bitmap for a character; lowercase letters reuse the uppercase forms.
/// Unknown characters render as a hollow box.
fn glyph_for(ch: char) -> Glyph {
    match ch.to_ascii_uppercase() {
        ' ' => g(3, [0, 0, 0, 0, 0, 0, 0]),
        'A' => g(5, [0b01110, 0b10001, 0b10001, 0b11111, 0b10001, 0b10001, 0b10001]),
        'B' => g(5, [0b11110, 0b10001, 0b10001, 0b11110, 0b10001, 0b10001, 0b11110]),
        'C' => g(5, [0b01110, 0b10001, 0b10000, 0b10000, 0b10000, 0b10001, 0b01110]),
        'D' => g(5, [0b11100, 0b10010, 0b10001, 0b10001, 0b10001, 0b10010, 0b11100]),
        'E' => g(5, [0b11111, 0b10000, 0b10000, 0b11110, 0b10000, 0b10000, 0b11111]),
        'F' => g(5, [0b11111, 0b10000, 0b10000, 0b11110, 0b10000, 0b10000, 0b10000]),
        'G' => g(5, [0b01110, 0b10001, 0b10000, 0b10111, 0b10001, 0b10001, 0b01111]),
        'H' => g(5, [0b10001, 0b10001, 0b10001, 0b11111, 0b10001, 0b10001, 0b10001]),
        'I' => g(5, [0b01110, 0b00100, 0b00100, 0b00100, 0b00100, 0b00100, 0b01110]),
        'J' => g(5, [0b00111, 0b00010, 0b00010, 0b00010, 0b00010, 0b10010, 0b01100]),
        'K' => g(5, [0b10001, 0b10010, 0b10100, 0b11000, 0b10100, 0b10010, 0b10001]),
        'L' => g(5, [0b10000, 0b10000, 0b10000, 0b10000, 0b10000, 0b10000, 0b11111]),
        'M' => g(5, [0b10001, 0b11011, 0b10101, 0b10101, 0b10001, 0b10001, 0b10001]),
        'N' => g(5, [0b10001, 0b10001, 0b11001, 0b10101, 0b10011, 0b10001, 0b10001]),
        'O' => g(5, [0b01110, 0b10001, 0b10001, 0b10001, 0b10001, 0b10001, 0b01110]),
        'P' => g(5, [0b11110, 0b10001, 0b10001, 0b11110, 0b10000, 0b10000, 0b10000]),
        'Q' => g(5, [0b01110, 0b10001, 0b10001, 0b10001, 0b10101, 0b10010, 0b01101]),
        'R' => g(5, [0b11110, 0b10001, 0b10001, 0b11110, 0b10100, 0b10010, 0b10001]),
        'S' => g(5, [0b01111, 0b10000, 0b10000, 0b01110, 0b00001, 0b00001, 0b11110]),
        'T' => g(5, [0b11111, 0b00100, 0b00100, 0b00100, 0b00100, 0b00100, 0b00100]),
        'U' => g(5, [0b10001, 0b10001, 0b10001, 0b10001, 0b10001, 0b10001, 0b01110]),
        'V' => g(5, [0b10001, 0b10001, 0b10001, 0b10001, 0b10001, 0b01010, 0b00100]),
        'W' => g(5, [0b10001, 0b10001, 0b10001, 0b10101, 0b10101, 0b10101, 0b01010]),
        'X' => g(5, [0b10001, 0b10001, 0b01010, 0b00100, 0b01010, 0b10001, 0b10001]),
        'Y' => g(5, [0b10001, 0b10001, 0b01010, 0b00100, 0b00100, 0b00100, 0b00100]),
        'Z' => g(5, [0b11111, 0b00001, 0b00010, 0b00100, 0b01000, 0b10000, 0b11111]),
        '0' => g(5, [0b01110, 0b10001, 0b10011, 0b10101, 0b11001, 0b10001, 0b01110]),
        '1' => g(5, [0b00100, 0b01100, 0b00100, 0b00100, 0b00100, 0b00100, 0b01110]),
        '2' => g(5, [0b01110, 0b10001, 0b00001, 0b00010, 0b00100, 0b01000, 0b11111]),
        '3' => g(5, [0b11111, 0b00010, 0b00100, 0b00010, 0b00001, 0b10001, 0b01110]),
        '4' => g(5, [0b00010, 0b00110, 0b01010, 0b10010, 0b11111, 0b00010, 0b00010]),
        '5' => g(5, [0b11111, 0b10000, 0b11110, 0b00001, 0b00001, 0b10001, 0b01110]),
        '6' => g(5, [0b00110, 0b01000, 0b10000, 0b11110, 0b10001, 0b10001, 0b01110]),
        '7' => g(5, [0b11111, 0b00001, 0b00010, 0b00100, 0b01000, 0b01000, 0b01000]),
        '8' => g(5, [0b01110, 0b10001, 0b10001, 0b01110, 0b10001, 0b10001, 0b01110]),
        '9' => g(5, [0b01110, 0b10001, 0b10001, 0b01111, 0b00001, 0b00010, 0b01100]),
        '.' => g(2, [0, 0, 0, 0, 0, 0b11, 0b11]),
        ',' => g(2, [0, 0, 0, 0, 0, 0b01, 0b10]),
        ':' => g(2, [0, 0b11, 0b11, 0, 0b11, 0b11, 0]),
        '-' => g(4, [0, 0, 0, 0b1111, 0, 0, 0]),
        '+' => g(5, [0, 0b00100, 0b00100, 0b11111, 0b00100, 0b00100, 0]),
        '%' => g(5, [0b11001, 0b11010, 0b00010, 0b00100, 0b01000, 0b01011, 0b10011]),
        '(' => g(3, [0b001, 0b010, 0b100, 0b100, 0b100, 0b010, 0b001]),
        ')' => g(3, [0b100, 0b010, 0b001, 0b001, 0b001, 0b010, 0b100]),
        '[' => g(3, [0b111, 0b100, 0b100, 0b100, 0b100, 0b100, 0b111]),
        ']' => g(3, [0b111, 0b001, 0b001, 0b001, 0b001, 0b001, 0b111]),
        '/' => g(5, [0b00001, 0b00001, 0b00010, 0b00100, 0b01000, 0b10000, 0b10000]),
        '_' => g(5, [0, 0, 0, 0, 0, 0, 0b11111]),
        '<' => g(4, [0b0001, 0b0010, 0b0100, 0b1000, 0b0100, 0b0010, 0b0001]),
        '>' => g(4, [0b1000, 0b0100, 0b0010, 0b0001, 0b0010, 0b0100, 0b1000]),
        '=' => g(4, [0, 0, 0b1111, 0, 0b1111, 0, 0]),
        '\'' => g(1, [1, 1, 0, 0, 0, 0, 0]),
        '"' => g(3, [0b101, 0b101, 0, 0, 0, 0, 0]),
        '!' => g(1, [1, 1, 1, 1, 1, 0, 1]),
        '?' => g(5, [0b01110, 0b10001, 0b00001, 0b00010, 0b00100, 0, 0b00100]),
        '*' => g(5, [0, 0b00100, 0b10101, 0b01110, 0b10101, 0b00100, 0]),
        '#' => g(5, [0b01010, 0b01010, 0b11111, 0b01010, 0b11111, 0b01010, 0b01010]),
        '&' => g(5, [0b01100, 0b10010, 0b10100, 0b01000, 0b10101, 0b10010, 0b01101]),
        _ => g(5, [0b11111, 0b10001, 0b10001, 0b10001, 0b10001, 0b10001, 0b11111]),
    }
}

/// Pixel scale for a requested point size. Keeps small labels at 1x and
/// captions around 2x.
fn scale_for(size: f64) -> i32 {
    ((size / 10.0).round() as i32).max(1)
}

/// Width and height of a rendered string at the given scale.
fn measure(text: &str, scale: i32) -> (u32, u32) {
    let mut width = 0i32;
    for ch in text.chars() {
        width += (glyph_for(ch).width as i32 + 1) * scale;
    }
    if width > 0 {
        width -= scale;
    }
    (width as u32, (GLYPH_HEIGHT * scale) as u32)
}

/// Backend wrapper that owns all text drawing. Everything else delegates.
pub struct PixelTextBackend<DB> {
    inner: DB,
}

impl<DB: DrawingBackend> PixelTextBackend<DB> {
    pub fn new(inner: DB) -> Self {
        Self { inner }
    }
}

impl<DB: DrawingBackend> DrawingBackend for PixelTextBackend<DB> {
    type ErrorType = DB::ErrorType;

    fn get_size(&self) -> (u32, u32) {
        self.inner.get_size()
    }

    fn ensure_prepared(&mut self) -> Result<(), DrawingErrorKind<Self::ErrorType>> {
        self.inner.ensure_prepared()
    }

    fn present(&mut self) -> Result<(), DrawingErrorKind<Self::ErrorType>> {
        self.inner.present()
    }

    fn draw_pixel(
        &mut self,
        point: BackendCoord,
        color: BackendColor,
    ) -> Result<(), DrawingErrorKind<Self::ErrorType>> {
        self.inner.draw_pixel(point, color)
    }

    fn draw_line<S: BackendStyle>(
        &mut self,
        from: BackendCoord,
        to: BackendCoord,
        style: &S,
    ) -> Result<(), DrawingErrorKind<Self::ErrorType>> {
        self.inner.draw_line(from, to, style)
    }

    fn draw_rect<S: BackendStyle>(
        &mut self,
        upper_left: BackendCoord,
        bottom_right: BackendCoord,
        style: &S,
        fill: bool,
    ) -> Result<(), DrawingErrorKind<Self::ErrorType>> {
        self.inner.draw_rect(upper_left, bottom_right, style, fill)
    }

    fn draw_circle<S: BackendStyle>(
        &mut self,
        center: BackendCoord,
        radius: u32,
        style: &S,
        fill: bool,
    ) -> Result<(), DrawingErrorKind<Self::ErrorType>> {
        self.inner.draw_circle(center, radius, style, fill)
    }

    fn draw_path<S: BackendStyle, I: IntoIterator<Item = BackendCoord>>(
        &mut self,
        path: I,
        style: &S,
    ) -> Result<(), DrawingErrorKind<Self::ErrorType>> {
        self.inner.draw_path(path, style)
    }

    fn fill_polygon<S: BackendStyle, I: IntoIterator<Item = BackendCoord>>(
        &mut self,
        vert: I,
        style: &S,
    ) -> Result<(), DrawingErrorKind<Self::ErrorType>> {
        self.inner.fill_polygon(vert, style)
    }

    fn blit_bitmap(
        &mut self,
        pos: BackendCoord,
        (iw, ih): (u32, u32),
        src: &[u8],
    ) -> Result<(), DrawingErrorKind<Self::ErrorType>> {
        self.inner.blit_bitmap(pos, (iw, ih), src)
    }

    fn estimate_text_size<TStyle: BackendTextStyle>(
        &self,
        text: &str,
        style: &TStyle,
    ) -> Result<(u32, u32), DrawingErrorKind<Self::ErrorType>> {
        Ok(measure(text, scale_for(style.size())))
    }

    fn draw_text<TStyle: BackendTextStyle>(
        &mut self,
        text: &str,
        style: &TStyle,
        pos: BackendCoord,
    ) -> Result<(), DrawingErrorKind<Self::ErrorType>> {
        let color = style.color();
        if color.alpha <= 0.0 || text.is_empty() {
            return Ok(());
        }
        let scale = scale_for(style.size());
        let (width, height) = measure(text, scale);
        let anchor_dx = match style.anchor().h_pos {
            HPos::Left => 0,
            HPos::Center => -(width as i32) / 2,
            HPos::Right => -(width as i32),
        };
        let anchor_dy = match style.anchor().v_pos {
            VPos::Top => 0,
            VPos::Center => -(height as i32) / 2,
            VPos::Bottom => -(height as i32),
        };
        let transform = style.transform();
        let mut cursor = 0i32;
        for ch in text.chars() {
            let glyph = glyph_for(ch);
            for (row_idx, row) in glyph.rows.iter().enumerate() {
                for col in 0..glyph.width as i32 {
                    if row & (1 << (glyph.width as i32 - 1 - col)) == 0 {
                        continue;
                    }
                    for sy in 0..scale {
                        for sx in 0..scale {
                            let gx = anchor_dx + cursor + col * scale + sx;
                            let gy = anchor_dy + row_idx as i32 * scale + sy;
                            let (tx, ty) = transform.transform(gx, gy);
                            self.inner.draw_pixel((pos.0 + tx, pos.1 + ty), color)?;
                        }
                    }
                }
            }
            cursor += (glyph.width as i32 + 1) * scale;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use plotters::prelude::*;

    #[test]
    fn test_measure_grows_with_text() {
        let (short, _) = measure("ab", 1);
        let (long, height) = measure("abc", 1);
        assert!(long > short);
        assert_eq!(height, 7);
        assert_eq!(measure("", 2), (0, 14));
    }

    #[test]
    fn test_measure_scales_linearly() {
        let (w1, h1) = measure("Salary", 1);
        let (w2, h2) = measure("Salary", 2);
        assert_eq!(w2, w1 * 2);
        assert_eq!(h2, h1 * 2);
    }

    #[test]
    fn test_unknown_characters_use_fallback_box() {
        let boxed = glyph_for('\u{263a}');
        assert_eq!(boxed.width, 5);
        assert_eq!(boxed.rows[0], 0b11111);
    }

    #[test]
    fn test_draw_text_writes_pixels() {
        let width = 120u32;
        let height = 40u32;
        let mut buf = vec![255u8; (width * height * 3) as usize];
        {
            let inner = BitMapBackend::with_buffer(&mut buf, (width, height));
            let mut backend = PixelTextBackend::new(inner);
            let style = ("sans-serif", 14).into_font().color(&BLACK);
            backend.draw_text("Churn 42%", &style, (5, 5)).unwrap();
            backend.present().unwrap();
        }
        assert!(buf.iter().any(|b| *b != 255));
    }

    #[test]
    fn test_draw_text_respects_alpha_zero() {
        let width = 60u32;
        let height = 20u32;
        let mut buf = vec![255u8; (width * height * 3) as usize];
        {
            let inner = BitMapBackend::with_buffer(&mut buf, (width, height));
            let mut backend = PixelTextBackend::new(inner);
            let style = ("sans-serif", 14).into_font().color(&BLACK.mix(0.0));
            backend.draw_text("hidden", &style, (2, 2)).unwrap();
        }
        assert!(buf.iter().all(|b| *b == 255));
    }
}
