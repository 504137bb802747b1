use std::fmt::Display;

use once_cell::sync::Lazy;
use strum::IntoEnumIterator;
use strum_macros::EnumIter;

/// Pollutants recognized in the `iaqi` and `forecast.daily` sections of a station feed.
///
/// Variant order is significant, it is the order in which pollutants are presented.
#[derive(EnumIter, Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Pollutant {
    /// Fine particulate matter, diameter <= 2.5µm.
    Pm25,
    /// Particulate matter, diameter <= 10µm.
    Pm10,
    /// Ozone.
    O3,
    /// Nitrogen dioxide.
    No2,
    /// Sulphur dioxide.
    So2,
    /// Carbon monoxide.
    Co,
}

static POLLUTANT_VARIANTS: Lazy<Vec<Pollutant>> = Lazy::new(|| Pollutant::iter().collect());

impl Pollutant {
    /// Enumerate all variants of Pollutant, in presentation order.
    pub fn enumerate() -> &'static [Pollutant] {
        POLLUTANT_VARIANTS.as_slice()
    }

    /// Key used for this pollutant in the feed json.
    pub fn code(&self) -> &'static str {
        match self {
            Pollutant::Pm25 => "pm25",
            Pollutant::Pm10 => "pm10",
            Pollutant::O3 => "o3",
            Pollutant::No2 => "no2",
            Pollutant::So2 => "so2",
            Pollutant::Co => "co",
        }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        Self::enumerate()
            .iter()
            .find(|pollutant| pollutant.code() == code)
            .copied()
    }

    /// Uppercased [`Pollutant::code()`], used as a chart category label.
    pub fn label(&self) -> &'static str {
        match self {
            Pollutant::Pm25 => "PM25",
            Pollutant::Pm10 => "PM10",
            Pollutant::O3 => "O3",
            Pollutant::No2 => "NO2",
            Pollutant::So2 => "SO2",
            Pollutant::Co => "CO",
        }
    }

    /// Conventional chemical/particulate notation, used in titles.
    pub fn display_name(&self) -> &'static str {
        match self {
            Pollutant::Pm25 => "PM2.5",
            Pollutant::Pm10 => "PM10",
            Pollutant::O3 => "O₃",
            Pollutant::No2 => "NO₂",
            Pollutant::So2 => "SO₂",
            Pollutant::Co => "CO",
        }
    }
}

impl Display for Pollutant {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.code())
    }
}

#[cfg(test)]
mod test {
    use super::Pollutant;

    #[test]
    fn enumerate_order() {
        let codes: Vec<&str> = Pollutant::enumerate()
            .iter()
            .map(Pollutant::code)
            .collect();
        assert_eq!(vec!["pm25", "pm10", "o3", "no2", "so2", "co"], codes);
    }

    #[test]
    fn label_is_uppercased_code() {
        for pollutant in Pollutant::enumerate() {
            assert_eq!(pollutant.code().to_uppercase(), pollutant.label());
        }
    }

    #[test]
    fn from_code() {
        assert_eq!(Some(Pollutant::No2), Pollutant::from_code("no2"));
        assert_eq!(None, Pollutant::from_code("uvi"));
        assert_eq!(None, Pollutant::from_code("PM25"));
    }
}
