//! Serializable subset of the plotly.js figure schema, see <https://plotly.com/javascript/reference/>.
//!
//! Only structs and vectors are used so that serialization is deterministic.

use serde::Serialize;

/// Chrome shared by all panels.
const FONT_FAMILY: &str = "Arial, sans-serif";
const TITLE_FONT_SIZE: f64 = 24.0;
const AXIS_TITLE_FONT_SIZE: f64 = 16.0;
const BACKGROUND_COLOR: &str = "white";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Figure {
    pub data: Vec<Trace>,
    pub layout: Layout,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Trace {
    Indicator(Indicator),
    Bar(Bar),
    Scatter(Scatter),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Indicator {
    pub mode: &'static str,
    pub value: f64,
    pub title: Title,
    pub gauge: Gauge,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Gauge {
    pub axis: GaugeAxis,
    pub bar: Marker,
    pub steps: Vec<GaugeStep>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GaugeAxis {
    pub range: [i32; 2],
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GaugeStep {
    pub name: &'static str,
    pub range: [i32; 2],
    pub color: &'static str,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Bar {
    pub name: String,
    pub x: Vec<String>,
    pub y: Vec<f64>,
    pub marker: Marker,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Scatter {
    pub name: String,
    pub mode: &'static str,
    pub x: Vec<String>,
    pub y: Vec<f64>,
    pub line: Line,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Marker {
    pub color: &'static str,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Line {
    pub width: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Title {
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub font: Option<Font>,
}

impl Title {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            font: None,
        }
    }

    fn sized(text: impl Into<String>, size: f64) -> Self {
        Self {
            text: text.into(),
            font: Some(Font {
                family: None,
                size: Some(size),
            }),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Font {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub family: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Axis {
    pub title: Title,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub axis_type: Option<&'static str>,
}

impl Axis {
    pub fn new(title: &str) -> Self {
        Self {
            title: Title::sized(title, AXIS_TITLE_FONT_SIZE),
            axis_type: None,
        }
    }

    pub fn dates(title: &str) -> Self {
        Self {
            axis_type: Some("date"),
            ..Self::new(title)
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Layout {
    pub title: Title,
    pub font: Font,
    pub paper_bgcolor: &'static str,
    pub plot_bgcolor: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub xaxis: Option<Axis>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub yaxis: Option<Axis>,
}

impl Layout {
    /// Layout with the shared dashboard chrome and a title.
    pub fn titled(title: impl Into<String>) -> Self {
        Self {
            title: Title::sized(title, TITLE_FONT_SIZE),
            font: Font {
                family: Some(FONT_FAMILY),
                size: None,
            },
            paper_bgcolor: BACKGROUND_COLOR,
            plot_bgcolor: BACKGROUND_COLOR,
            xaxis: None,
            yaxis: None,
        }
    }
}
