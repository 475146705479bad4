//! Chart themes and color handling
//!
//! A [`Theme`] carries everything the renderers need to style a figure:
//! background, text and grid colors plus the categorical series palette and
//! the diverging scale used by the correlation heatmap. Light and dark
//! variants restyle the figure only; data colors stay identical so a chart
//! reads the same in both.

use palette::{FromColor, LinSrgb, Mix, Oklab, Srgb};
use plotters::style::RGBColor;
use serde::{Deserialize, Serialize};

/// Tableau 10, the default categorical series palette.
pub const TABLEAU10: &[RGBColor] = &[
    RGBColor(78, 121, 167),
    RGBColor(242, 142, 43),
    RGBColor(225, 87, 89),
    RGBColor(118, 183, 178),
    RGBColor(89, 161, 79),
    RGBColor(237, 201, 72),
    RGBColor(176, 122, 161),
    RGBColor(255, 157, 167),
    RGBColor(156, 117, 95),
    RGBColor(186, 176, 172),
];

/// Diverging endpoints for correlations: blue for -1, red for +1.
const DIVERGING_LOW: RGBColor = RGBColor(59, 76, 192);
const DIVERGING_HIGH: RGBColor = RGBColor(180, 4, 38);
const DIVERGING_MID: RGBColor = RGBColor(221, 221, 221);

/// Figure styling variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

impl std::str::FromStr for Theme {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "light" => Ok(Theme::Light),
            "dark" => Ok(Theme::Dark),
            other => Err(format!("unknown theme \"{other}\" (expected light or dark)")),
        }
    }
}

impl std::fmt::Display for Theme {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Theme::Light => write!(f, "light"),
            Theme::Dark => write!(f, "dark"),
        }
    }
}

impl Theme {
    pub fn background(&self) -> RGBColor {
        match self {
            Theme::Light => RGBColor(255, 255, 255),
            Theme::Dark => RGBColor(30, 32, 38),
        }
    }

    /// Captions, axis labels and annotations.
    pub fn foreground(&self) -> RGBColor {
        match self {
            Theme::Light => RGBColor(33, 37, 41),
            Theme::Dark => RGBColor(222, 226, 230),
        }
    }

    pub fn grid(&self) -> RGBColor {
        match self {
            Theme::Light => RGBColor(222, 226, 230),
            Theme::Dark => RGBColor(66, 70, 78),
        }
    }

    pub fn axis(&self) -> RGBColor {
        match self {
            Theme::Light => RGBColor(108, 117, 125),
            Theme::Dark => RGBColor(134, 142, 150),
        }
    }

    /// Categorical series color for slot `index`, cycling past the palette.
    pub fn series_color(&self, index: usize) -> RGBColor {
        TABLEAU10[index % TABLEAU10.len()]
    }

    /// Single-series accent color.
    pub fn accent(&self) -> RGBColor {
        self.series_color(0)
    }

    /// Diverging color for a correlation in [-1, 1], interpolated in Oklab
    /// so the ramp stays perceptually even.
    pub fn diverging(&self, t: f64) -> RGBColor {
        let t = t.clamp(-1.0, 1.0) as f32;
        if t < 0.0 {
            mix_oklab(DIVERGING_MID, DIVERGING_LOW, -t)
        } else {
            mix_oklab(DIVERGING_MID, DIVERGING_HIGH, t)
        }
    }
}

fn mix_oklab(a: RGBColor, b: RGBColor, factor: f32) -> RGBColor {
    let a_lab = Oklab::from_color(to_linear(a));
    let b_lab = Oklab::from_color(to_linear(b));
    let mixed = a_lab.mix(b_lab, factor.clamp(0.0, 1.0));
    let rgb = Srgb::from_linear(LinSrgb::from_color(mixed));
    RGBColor(
        (rgb.red * 255.0).round().clamp(0.0, 255.0) as u8,
        (rgb.green * 255.0).round().clamp(0.0, 255.0) as u8,
        (rgb.blue * 255.0).round().clamp(0.0, 255.0) as u8,
    )
}

fn to_linear(color: RGBColor) -> LinSrgb {
    Srgb::new(
        color.0 as f32 / 255.0,
        color.1 as f32 / 255.0,
        color.2 as f32 / 255.0,
    )
    .into_linear()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_series_palette_cycles() {
        let theme = Theme::Light;
        assert_eq!(theme.series_color(0), theme.series_color(TABLEAU10.len()));
        assert_ne!(theme.series_color(0), theme.series_color(1));
    }

    #[test]
    fn test_diverging_endpoints() {
        let theme = Theme::Light;
        assert_eq!(theme.diverging(-1.0), DIVERGING_LOW);
        assert_eq!(theme.diverging(1.0), DIVERGING_HIGH);
        assert_eq!(theme.diverging(0.0), DIVERGING_MID);
    }

    #[test]
    fn test_diverging_midpoints_are_between() {
        let theme = Theme::Light;
        let half = theme.diverging(0.5);
        // Redder than neutral, lighter than the endpoint.
        assert!(half.0 > half.2);
        assert_ne!(half, DIVERGING_MID);
        assert_ne!(half, DIVERGING_HIGH);
    }

    #[test]
    fn test_theme_parse() {
        assert_eq!(Theme::from_str("dark").unwrap(), Theme::Dark);
        assert_eq!(Theme::from_str("LIGHT").unwrap(), Theme::Light);
        assert!(Theme::from_str("sepia").is_err());
    }

    #[test]
    fn test_dark_theme_swaps_surfaces_not_series() {
        assert_ne!(Theme::Dark.background(), Theme::Light.background());
        assert_eq!(
            Theme::Dark.series_color(3),
            Theme::Light.series_color(3)
        );
    }
}
