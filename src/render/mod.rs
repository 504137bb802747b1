//! Build the chart specification of each dashboard panel from the [`Extracted`] views, see
//! [`render()`]. Nothing here performs I/O.

pub mod figure;
pub mod gauge;

use figure::{Axis, Bar, Figure, Layout, Line, Marker, Scatter, Trace};
pub use gauge::{GaugeSpec, SeverityBand, GAUGE_RANGE, SEVERITY_BANDS};

use crate::extract::{Extracted, ForecastSeries, PollutantSnapshot};

const BAR_COLOR: &str = "#1f77b4";
const LINE_WIDTH: f64 = 3.0;

/// One bar per reported pollutant.
#[derive(Debug, Clone, PartialEq)]
pub struct BarSpec {
    /// `(label, value)` in snapshot order.
    pub bars: Vec<(&'static str, f64)>,
}

impl BarSpec {
    pub fn new(snapshot: &PollutantSnapshot) -> Self {
        Self {
            bars: snapshot
                .readings()
                .iter()
                .map(|reading| (reading.pollutant.label(), reading.value))
                .collect(),
        }
    }

    pub fn figure(&self) -> Figure {
        let mut layout = Layout::titled("Current Pollutant Levels");
        layout.xaxis = Some(Axis::new("Pollutant"));
        layout.yaxis = Some(Axis::new("Individual AQI"));

        Figure {
            data: vec![Trace::Bar(Bar {
                name: "Current".to_owned(),
                x: self.bars.iter().map(|(label, _)| (*label).to_owned()).collect(),
                y: self.bars.iter().map(|(_, value)| *value).collect(),
                marker: Marker { color: BAR_COLOR },
            })],
            layout,
        }
    }
}

/// Forecast time series, one marker per day.
#[derive(Debug, Clone, PartialEq)]
pub struct LineSpec {
    pub title: String,
    pub y_title: String,
    pub series: ForecastSeries,
}

impl LineSpec {
    pub fn new(series: &ForecastSeries, station_name: &str) -> Self {
        let pollutant = series.pollutant.display_name();
        Self {
            title: format!("Forecasted {} Levels in {}", pollutant, station_name),
            y_title: format!("{} Level (µg/m³)", pollutant),
            series: series.clone(),
        }
    }

    pub fn figure(&self) -> Figure {
        let mut layout = Layout::titled(self.title.as_str());
        layout.xaxis = Some(Axis::dates("Date"));
        layout.yaxis = Some(Axis::new(&self.y_title));

        Figure {
            data: vec![Trace::Scatter(Scatter {
                name: self.series.pollutant.label().to_owned(),
                mode: "lines+markers",
                x: self
                    .series
                    .points
                    .iter()
                    .map(|point| point.date.format("%Y-%m-%d").to_string())
                    .collect(),
                y: self.series.points.iter().map(|point| point.value).collect(),
                line: Line { width: LINE_WIDTH },
            })],
            layout,
        }
    }
}

/// A rendered chart and the id of the element it is drawn into.
#[derive(Debug, Clone, PartialEq)]
pub struct Panel {
    pub id: &'static str,
    /// Spans both columns of the dashboard grid.
    pub wide: bool,
    pub figure: Figure,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Panels {
    pub gauge: Panel,
    pub bar: Panel,
    pub line: Panel,
}

impl Panels {
    /// Panels in document order.
    pub fn iter(&self) -> impl Iterator<Item = &Panel> {
        [&self.gauge, &self.bar, &self.line].into_iter()
    }
}

/// Build the three dashboard panels.
#[tracing::instrument(skip(extracted))]
pub fn render(extracted: &Extracted, station_name: &str) -> Panels {
    let gauge = GaugeSpec::new(extracted.current_index);
    match gauge.band() {
        Some(band) => tracing::info!("Current index {} is {}", gauge.index, band.name),
        None => tracing::warn!(
            "Current index {} is outside the gauge range {:?}",
            gauge.index,
            GAUGE_RANGE
        ),
    }
    if extracted.forecast.points.is_empty() {
        tracing::warn!("Forecast series is empty, the forecast panel will have no data");
    }

    Panels {
        gauge: Panel {
            id: "aqi-gauge",
            wide: true,
            figure: gauge.figure(),
        },
        bar: Panel {
            id: "pollutant-bar",
            wide: false,
            figure: BarSpec::new(&extracted.snapshot).figure(),
        },
        line: Panel {
            id: "forecast-line",
            wide: false,
            figure: LineSpec::new(&extracted.forecast, station_name).figure(),
        },
    }
}
