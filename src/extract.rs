//! Reshape a [`FeedEnvelope`] into the typed views shown on the dashboard, see [`extract()`].
//!
//! Each view has its own extraction function so that it can be checked independently against a
//! crafted envelope.

use chrono::NaiveDate;
use tabled::{Table, Tabled};
use waqi::{FeedEnvelope, Pollutant, StationData};

/// The pollutant whose daily forecast is charted.
pub const FORECAST_POLLUTANT: Pollutant = Pollutant::Pm25;

/// Number of forecast rows included in the logged preview table.
const PREVIEW_ROWS: usize = 5;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The feed answered, but not with `status: "ok"`. Usually a wrong station id or an upstream
    /// outage.
    #[error("Feed status is `{}` instead of `ok`, response: {}", .envelope.status, envelope_json(.envelope))]
    UpstreamStatus { envelope: Box<FeedEnvelope> },
    #[error("Expected field `{path}` is missing from the feed response")]
    MissingField { path: String },
    #[error("Feed data does not have the expected shape")]
    Shape(#[source] serde_json::Error),
    #[error("Unable to parse `{path}` value {value:?} as a date")]
    InvalidDate {
        path: String,
        value: String,
        #[source]
        source: chrono::ParseError,
    },
}

pub(crate) fn envelope_json(envelope: &FeedEnvelope) -> String {
    serde_json::to_string(envelope).unwrap_or_else(|_| format!("{:?}", envelope))
}

fn missing(path: impl Into<String>) -> Error {
    Error::MissingField { path: path.into() }
}

/// Current reading of one pollutant.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PollutantReading {
    pub pollutant: Pollutant,
    pub value: f64,
}

/// Current readings for the recognized pollutants a station reports, in
/// [`Pollutant::enumerate()`] order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PollutantSnapshot(Vec<PollutantReading>);

impl PollutantSnapshot {
    pub fn readings(&self) -> &[PollutantReading] {
        &self.0
    }

    pub fn get(&self, pollutant: Pollutant) -> Option<f64> {
        self.0
            .iter()
            .find(|reading| reading.pollutant == pollutant)
            .map(|reading| reading.value)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ForecastPoint {
    pub date: NaiveDate,
    /// Forecast daily average.
    pub value: f64,
}

/// Daily forecast for a single pollutant, in the order the feed lists the days.
#[derive(Debug, Clone, PartialEq)]
pub struct ForecastSeries {
    pub pollutant: Pollutant,
    pub points: Vec<ForecastPoint>,
}

/// Descriptive station details from the feed. Nothing here is required.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StationInfo {
    /// Station name as published by the feed.
    pub name: Option<String>,
    /// Local time of the measurement, with utc offset when published.
    pub observed_at: Option<String>,
}

/// Everything the dashboard is rendered from.
#[derive(Debug, Clone, PartialEq)]
pub struct Extracted {
    pub current_index: i32,
    pub snapshot: PollutantSnapshot,
    pub forecast: ForecastSeries,
    pub station: StationInfo,
}

/// Check the envelope status and interpret its `data`.
pub fn station_data(envelope: &FeedEnvelope) -> Result<StationData, Error> {
    if !envelope.is_ok() {
        return Err(Error::UpstreamStatus {
            envelope: Box::new(envelope.clone()),
        });
    }
    if envelope.data.is_null() {
        return Err(missing("data"));
    }
    envelope.station_data().map_err(Error::Shape)
}

/// The current composite index, `data.aqi`.
pub fn current_index(data: &StationData) -> Result<i32, Error> {
    data.aqi
        .as_ref()
        .and_then(waqi::Aqi::index)
        .ok_or_else(|| missing("data.aqi"))
}

/// Current value of every recognized pollutant present in `data.iaqi`. Pollutants the station
/// doesn't report are left out.
pub fn pollutant_snapshot(data: &StationData) -> Result<PollutantSnapshot, Error> {
    if data.iaqi.is_none() {
        tracing::warn!("Feed contains no `data.iaqi` readings");
        return Ok(PollutantSnapshot::default());
    }

    let readings = Pollutant::enumerate()
        .iter()
        .filter_map(|pollutant| {
            data.reading(*pollutant).map(|reading| {
                reading
                    .map_err(Error::Shape)?
                    .v
                    .map(|value| PollutantReading {
                        pollutant: *pollutant,
                        value,
                    })
                    .ok_or_else(|| missing(format!("data.iaqi.{}.v", pollutant.code())))
            })
        })
        .collect::<Result<Vec<_>, Error>>()?;

    let unrecognized = data.unrecognized_iaqi_codes();
    if !unrecognized.is_empty() {
        tracing::debug!("Ignoring iaqi entries: {}", unrecognized.join(", "));
    }

    Ok(PollutantSnapshot(readings))
}

/// The daily forecast for `pollutant`, `data.forecast.daily.<code>`.
pub fn forecast_series(data: &StationData, pollutant: Pollutant) -> Result<ForecastSeries, Error> {
    let path = format!("data.forecast.daily.{}", pollutant.code());
    let records = data
        .forecast
        .as_ref()
        .ok_or_else(|| missing("data.forecast"))?
        .daily
        .as_ref()
        .ok_or_else(|| missing("data.forecast.daily"))?
        .get(pollutant.code())
        .ok_or_else(|| missing(path.as_str()))?;

    let points = records
        .iter()
        .enumerate()
        .map(|(i, record)| {
            let day = record
                .day
                .as_deref()
                .ok_or_else(|| missing(format!("{}[{}].day", path, i)))?;
            let date = NaiveDate::parse_from_str(day, "%Y-%m-%d").map_err(|source| {
                Error::InvalidDate {
                    path: format!("{}[{}].day", path, i),
                    value: day.to_owned(),
                    source,
                }
            })?;
            let value = record
                .avg
                .ok_or_else(|| missing(format!("{}[{}].avg", path, i)))?;
            Ok(ForecastPoint { date, value })
        })
        .collect::<Result<Vec<_>, Error>>()?;

    Ok(ForecastSeries { pollutant, points })
}

pub fn station_info(data: &StationData) -> StationInfo {
    let observed_at = data.time.as_ref().and_then(|time| {
        time.local.as_ref().map(|local| match &time.tz {
            Some(tz) => format!("{} (UTC{})", local, tz),
            None => local.clone(),
        })
    });
    StationInfo {
        name: data.city.as_ref().and_then(|city| city.name.clone()),
        observed_at,
    }
}

#[derive(Tabled)]
struct PreviewRow {
    date: NaiveDate,
    avg: f64,
}

/// A table of the first few days of `series`, for logging.
pub fn preview_table(series: &ForecastSeries) -> String {
    Table::new(series.points.iter().take(PREVIEW_ROWS).map(|point| PreviewRow {
        date: point.date,
        avg: point.value,
    }))
    .to_string()
}

/// Pull all dashboard views out of `envelope`. Fails on the first missing or malformed view.
#[tracing::instrument(skip_all)]
pub fn extract(envelope: &FeedEnvelope) -> Result<Extracted, Error> {
    let data = station_data(envelope)?;
    let current_index = current_index(&data)?;
    let snapshot = pollutant_snapshot(&data)?;
    let forecast = forecast_series(&data, FORECAST_POLLUTANT)?;
    let station = station_info(&data);

    tracing::debug!(
        "{} forecast preview:\n{}",
        forecast.pollutant.display_name(),
        preview_table(&forecast)
    );
    tracing::info!(
        "Extracted index {}, {} pollutant readings, {} forecast days",
        current_index,
        snapshot.len(),
        forecast.points.len()
    );

    Ok(Extracted {
        current_index,
        snapshot,
        forecast,
        station,
    })
}
