//! Types for the `data` object of a successful feed response.
//!
//! Every field is optional, the feed omits sections for stations which don't report them, and
//! callers decide which absences are fatal.

use std::collections::BTreeMap;

use serde::Deserialize;

use crate::Pollutant;

/// Station data returned with `status: "ok"`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct StationData {
    /// Current composite air quality index.
    pub aqi: Option<Aqi>,
    /// Numeric station identifier.
    pub idx: Option<i64>,
    pub city: Option<City>,
    /// Code of the pollutant currently dominating the composite index.
    #[serde(rename = "dominentpol")]
    pub dominant_pollutant: Option<String>,
    /// Time of the measurement.
    pub time: Option<ObservationTime>,
    /// Individual air quality index, current reading for each reported pollutant (and some
    /// weather variables such as `t`, `h`, `w`). Entries are kept raw, see
    /// [`StationData::reading()`].
    pub iaqi: Option<BTreeMap<String, serde_json::Value>>,
    pub forecast: Option<Forecast>,
}

impl StationData {
    /// The current reading of `pollutant`, `None` when the station doesn't report it. Only
    /// recognized entries are interpreted, so a malformed weather entry is never an error.
    pub fn reading(&self, pollutant: Pollutant) -> Option<Result<Reading, serde_json::Error>> {
        self.iaqi
            .as_ref()
            .and_then(|iaqi| iaqi.get(pollutant.code()))
            .map(Reading::deserialize)
    }

    /// Keys present in [`StationData::iaqi`] which are not a recognized [`Pollutant`].
    pub fn unrecognized_iaqi_codes(&self) -> Vec<&str> {
        self.iaqi
            .iter()
            .flat_map(BTreeMap::keys)
            .map(String::as_str)
            .filter(|code| Pollutant::from_code(code).is_none())
            .collect()
    }
}

/// The composite index. Stations which are temporarily not reporting publish `"-"` instead of a
/// number.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum Aqi {
    Index(i32),
    Unavailable(String),
}

impl Aqi {
    pub fn index(&self) -> Option<i32> {
        match self {
            Aqi::Index(index) => Some(*index),
            Aqi::Unavailable(_) => None,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct City {
    /// Name of the monitoring station.
    pub name: Option<String>,
    /// Web page for the monitoring station.
    pub url: Option<String>,
    /// WGS84 `[latitude, longitude]`.
    pub geo: Option<Vec<f64>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ObservationTime {
    /// Local measurement time, e.g. `2024-06-01 14:00:00`.
    #[serde(rename = "s")]
    pub local: Option<String>,
    /// UTC offset of the station, e.g. `+05:30`.
    pub tz: Option<String>,
}

/// A single current reading in [`StationData::iaqi`].
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct Reading {
    pub v: Option<f64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Forecast {
    /// Daily forecast records for each forecast pollutant code, in the feed's day order.
    pub daily: Option<BTreeMap<String, Vec<DailyRecord>>>,
}

/// Forecast for one pollutant on one day.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct DailyRecord {
    /// Date formatted as `YYYY-MM-DD`.
    pub day: Option<String>,
    pub avg: Option<f64>,
    pub min: Option<f64>,
    pub max: Option<f64>,
}
