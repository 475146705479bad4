//! Chart specification types
//!
//! A [`ChartSpec`] is one requested chart slot: the kind plus the column
//! selection it needs and a caption. Selections are an internally tagged
//! enum so a slot serializes as, for example,
//! `{"kind": "bar", "column": "dept", "caption": "My Bar Chart"}`.

use serde::{Deserialize, Serialize};

/// The seven supported chart kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChartType {
    Bar,
    Line,
    Histogram,
    BoxPlot,
    Scatter,
    Pie,
    CorrelationHeatmap,
}

impl std::fmt::Display for ChartType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            ChartType::Bar => "Bar Chart",
            ChartType::Line => "Line Chart",
            ChartType::Histogram => "Histogram",
            ChartType::BoxPlot => "Box Plot",
            ChartType::Scatter => "Scatter Plot",
            ChartType::Pie => "Pie Chart",
            ChartType::CorrelationHeatmap => "Correlation Heatmap",
        };
        write!(f, "{name}")
    }
}

impl ChartType {
    /// Output raster size in pixels. The heatmap gets a wider canvas, like
    /// the larger figure it replaces.
    pub fn pixel_size(&self) -> (u32, u32) {
        match self {
            ChartType::CorrelationHeatmap => (1280, 800),
            _ => (960, 600),
        }
    }
}

/// Column selection for one chart slot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ChartSelection {
    /// Frequency of a categorical column.
    Bar { column: String },
    /// A numeric column in row order.
    Line { column: String },
    /// Distribution of a numeric column with a density overlay.
    Histogram { column: String },
    /// A numeric column grouped by a categorical one.
    BoxPlot { x: String, y: String },
    /// Two numeric columns against each other.
    Scatter { x: String, y: String },
    /// Value-count proportions of a categorical column.
    Pie { column: String },
    /// Pairwise Pearson matrix over every numeric column.
    CorrelationHeatmap,
}

impl ChartSelection {
    pub fn chart_type(&self) -> ChartType {
        match self {
            ChartSelection::Bar { .. } => ChartType::Bar,
            ChartSelection::Line { .. } => ChartType::Line,
            ChartSelection::Histogram { .. } => ChartType::Histogram,
            ChartSelection::BoxPlot { .. } => ChartType::BoxPlot,
            ChartSelection::Scatter { .. } => ChartType::Scatter,
            ChartSelection::Pie { .. } => ChartType::Pie,
            ChartSelection::CorrelationHeatmap => ChartType::CorrelationHeatmap,
        }
    }
}

/// One requested chart slot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartSpec {
    /// Caption shown on the figure and its report page. Empty means
    /// "My <kind name>".
    #[serde(default)]
    pub caption: String,
    #[serde(flatten)]
    pub selection: ChartSelection,
}

impl ChartSpec {
    pub fn new(selection: ChartSelection, caption: impl Into<String>) -> Self {
        Self {
            caption: caption.into(),
            selection,
        }
    }

    pub fn chart_type(&self) -> ChartType {
        self.selection.chart_type()
    }

    pub fn caption_or_default(&self) -> String {
        let trimmed = self.caption.trim();
        if trimmed.is_empty() {
            format!("My {}", self.chart_type())
        } else {
            trimmed.to_string()
        }
    }
}

/// A rendered chart: PNG bytes plus the caption it was built with.
#[derive(Debug, Clone)]
pub struct Figure {
    pub caption: String,
    pub png: Vec<u8>,
    pub width: u32,
    pub height: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_selection_serde_shape() {
        let spec = ChartSpec::new(
            ChartSelection::Bar {
                column: "dept".to_string(),
            },
            "Headcount",
        );
        let json = serde_json::to_value(&spec).unwrap();
        assert_eq!(json["kind"], "bar");
        assert_eq!(json["column"], "dept");
        assert_eq!(json["caption"], "Headcount");

        let back: ChartSpec = serde_json::from_value(json).unwrap();
        assert_eq!(back, spec);
    }

    #[test]
    fn test_heatmap_needs_no_columns() {
        let spec: ChartSpec =
            serde_json::from_str(r#"{"kind": "correlation_heatmap"}"#).unwrap();
        assert_eq!(spec.chart_type(), ChartType::CorrelationHeatmap);
        assert_eq!(spec.caption_or_default(), "My Correlation Heatmap");
    }

    #[test]
    fn test_caption_defaults_name_the_kind() {
        let spec = ChartSpec::new(
            ChartSelection::Scatter {
                x: "a".to_string(),
                y: "b".to_string(),
            },
            "  ",
        );
        assert_eq!(spec.caption_or_default(), "My Scatter Plot");
    }

    #[test]
    fn test_box_plot_round_trip() {
        let json = r#"{"kind": "box_plot", "x": "dept", "y": "salary", "caption": "Pay"}"#;
        let spec: ChartSpec = serde_json::from_str(json).unwrap();
        assert_eq!(
            spec.selection,
            ChartSelection::BoxPlot {
                x: "dept".to_string(),
                y: "salary".to_string()
            }
        );
    }
}
