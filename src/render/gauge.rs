//! Gauge of the current composite index against the standard severity bands.

use super::figure::{Figure, Gauge, GaugeAxis, GaugeStep, Indicator, Layout, Marker, Title, Trace};

/// Lower and upper bound of the gauge scale.
pub const GAUGE_RANGE: (i32, i32) = (0, 300);

const NEEDLE_COLOR: &str = "#1f2d3d";

/// A fixed sub-range of the composite index with its severity tier.
#[derive(Debug, PartialEq, Eq)]
pub struct SeverityBand {
    /// Inclusive.
    pub lower: i32,
    /// Inclusive.
    pub upper: i32,
    pub name: &'static str,
    pub color: &'static str,
}

pub static SEVERITY_BANDS: [SeverityBand; 5] = [
    SeverityBand {
        lower: 0,
        upper: 50,
        name: "Good",
        color: "#00e400",
    },
    SeverityBand {
        lower: 51,
        upper: 100,
        name: "Moderate",
        color: "#ffff00",
    },
    SeverityBand {
        lower: 101,
        upper: 150,
        name: "Unhealthy for Sensitive Groups",
        color: "#ff7e00",
    },
    SeverityBand {
        lower: 151,
        upper: 200,
        name: "Unhealthy",
        color: "#ff0000",
    },
    SeverityBand {
        lower: 201,
        upper: 300,
        name: "Very Unhealthy / Hazardous",
        color: "#8f3f97",
    },
];

impl SeverityBand {
    pub fn contains(&self, index: i32) -> bool {
        self.lower <= index && index <= self.upper
    }

    /// The band containing `index`, `None` when it lies outside [`GAUGE_RANGE`].
    pub fn classify(index: i32) -> Option<&'static SeverityBand> {
        SEVERITY_BANDS.iter().find(|band| band.contains(index))
    }
}

/// Gauge panel specification. The value is shown as published, values outside
/// [`GAUGE_RANGE`] are not clamped and fall outside the visible arc.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GaugeSpec {
    pub index: i32,
}

impl GaugeSpec {
    pub fn new(index: i32) -> Self {
        Self { index }
    }

    pub fn band(&self) -> Option<&'static SeverityBand> {
        SeverityBand::classify(self.index)
    }

    pub fn exceeds_range(&self) -> bool {
        self.index < GAUGE_RANGE.0 || self.index > GAUGE_RANGE.1
    }

    pub fn title(&self) -> String {
        match self.band() {
            Some(band) => format!("Air Quality Index: {}", band.name),
            None => "Air Quality Index".to_owned(),
        }
    }

    pub fn figure(&self) -> Figure {
        let steps = SEVERITY_BANDS
            .iter()
            .map(|band| GaugeStep {
                name: band.name,
                range: [band.lower, band.upper],
                color: band.color,
            })
            .collect();

        Figure {
            data: vec![Trace::Indicator(Indicator {
                mode: "gauge+number",
                value: f64::from(self.index),
                title: Title::new(self.title()),
                gauge: Gauge {
                    axis: GaugeAxis {
                        range: [GAUGE_RANGE.0, GAUGE_RANGE.1],
                    },
                    bar: Marker {
                        color: NEEDLE_COLOR,
                    },
                    steps,
                },
            })],
            layout: Layout::titled("Current Air Quality Index"),
        }
    }
}
