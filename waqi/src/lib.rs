//! Client for the World Air Quality Index project's station feed API, see
//! <https://aqicn.org/json-api/doc/>.

use std::fmt::Display;

pub mod pollutant;
pub mod station;

pub use pollutant::Pollutant;
pub use station::{Aqi, City, DailyRecord, Forecast, ObservationTime, Reading, StationData};

use reqwest::{Method, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};

/// Base url of the public feed API.
pub const DEFAULT_BASE_URL: &str = "https://api.waqi.info";

const REDACTED: &str = "REDACTED";

/// The `status` of a [`FeedEnvelope`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Status {
    Ok,
    Error,
    /// Any other status string, preserved verbatim.
    Other(String),
}

impl Default for Status {
    fn default() -> Self {
        Status::Other(String::new())
    }
}

impl Status {
    /// `true` for the status of a reply which had no `status` key.
    pub fn is_missing(&self) -> bool {
        matches!(self, Status::Other(status) if status.is_empty())
    }
}

impl From<String> for Status {
    fn from(status: String) -> Self {
        match status.as_str() {
            "ok" => Status::Ok,
            "error" => Status::Error,
            _ => Status::Other(status),
        }
    }
}

impl From<Status> for String {
    fn from(status: Status) -> Self {
        match status {
            Status::Ok => "ok".to_owned(),
            Status::Error => "error".to_owned(),
            Status::Other(status) => status,
        }
    }
}

impl Display for Status {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Status::Ok => f.write_str("ok"),
            Status::Error => f.write_str("error"),
            Status::Other(status) if status.is_empty() => f.write_str("(missing)"),
            Status::Other(status) => f.write_str(status),
        }
    }
}

/// Top level of every feed response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeedEnvelope {
    /// Replies without a `status` key (some error replies) deserialize to an empty
    /// [`Status::Other`].
    #[serde(default, skip_serializing_if = "Status::is_missing")]
    pub status: Status,
    /// [`StationData`] when `status` is [`Status::Ok`], otherwise usually a message string such
    /// as `"Unknown station"`.
    #[serde(default, skip_serializing_if = "serde_json::Value::is_null")]
    pub data: serde_json::Value,
}

impl FeedEnvelope {
    pub fn is_ok(&self) -> bool {
        self.status == Status::Ok
    }

    /// Interpret `data` as [`StationData`].
    pub fn station_data(&self) -> Result<StationData, serde_json::Error> {
        StationData::deserialize(&self.data)
    }
}

/// Parameters for a single station feed request.
#[derive(buildstructor::Builder)]
pub struct FeedParameters {
    /// Station identifier, e.g. `@10522` or a city name such as `beijing`.
    pub station: String,
    /// API access token, see <https://aqicn.org/data-platform/token/>.
    pub token: SecretString,
    /// Defaults to [`DEFAULT_BASE_URL`].
    pub base_url: Option<url::Url>,
}

impl std::fmt::Debug for FeedParameters {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FeedParameters")
            .field("station", &self.station)
            .field("token", &REDACTED)
            .field("base_url", &self.base_url)
            .finish()
    }
}

#[derive(Serialize)]
struct FeedQuery<'a> {
    token: &'a str,
}

impl FeedParameters {
    fn url_with_token(&self, token: &str) -> Result<String, Error> {
        let base_url = self
            .base_url
            .as_ref()
            .map(url::Url::as_str)
            .unwrap_or(DEFAULT_BASE_URL)
            .trim_end_matches('/');
        let query = serde_urlencoded::to_string(FeedQuery { token })?;
        Ok(format!("{}/feed/{}/?{}", base_url, self.station, query))
    }

    /// The request url, including the access token.
    pub fn url(&self) -> Result<String, Error> {
        self.url_with_token(self.token.expose_secret())
    }

    /// The request url with the access token replaced, safe for logging and error messages.
    pub fn redacted_url(&self) -> Result<String, Error> {
        self.url_with_token(REDACTED)
    }
}

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("Error while performing request to {url}")]
    Request {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("Response status unsuccessful, url: {url}, code: {code}, body: {body}")]
    ResponseStatusNotSuccessful {
        url: String,
        code: StatusCode,
        body: String,
    },
    #[error("Error while parsing json")]
    SerdeJson(#[from] serde_json::Error),
    #[error("Error while serializing url query parameters")]
    SerdeUrlencoded(#[from] serde_urlencoded::ser::Error),
}

/// Obtain the raw json body of a station feed.
pub async fn obtain_feed_json(
    client: &reqwest::Client,
    parameters: &FeedParameters,
) -> Result<String, Error> {
    let url = parameters.url()?;
    let redacted_url = parameters.redacted_url()?;
    tracing::trace!("GET {}", redacted_url);

    // The token is part of the url, which reqwest includes in its errors.
    let request_error = |source: reqwest::Error| Error::Request {
        url: redacted_url.clone(),
        source: source.without_url(),
    };

    let response = client
        .request(Method::GET, url)
        .send()
        .await
        .map_err(request_error)?;

    if response.status().is_success() {
        response.text().await.map_err(request_error)
    } else {
        Err(Error::ResponseStatusNotSuccessful {
            url: redacted_url.clone(),
            code: response.status(),
            body: response.text().await.unwrap_or_default(),
        })
    }
}

/// Obtain and parse a station feed. The returned envelope may still have a status other than
/// [`Status::Ok`].
pub async fn obtain_feed(
    client: &reqwest::Client,
    parameters: &FeedParameters,
) -> Result<FeedEnvelope, Error> {
    obtain_feed_json(client, parameters)
        .await
        .and_then(|json| Ok(serde_json::from_str(&json)?))
}

#[cfg(test)]
mod test {
    use secrecy::SecretString;
    use serde_json::json;
    use wiremock::{matchers, Mock, MockServer, ResponseTemplate};

    use crate::{
        obtain_feed, Aqi, Error, FeedEnvelope, FeedParameters, Pollutant, Status, StationData,
    };

    fn parameters(base_url: Option<&str>) -> FeedParameters {
        FeedParameters::builder()
            .station("@10522")
            .token(SecretString::new("secret-token".to_owned()))
            .and_base_url(base_url.map(|url| url.parse::<url::Url>().unwrap()))
            .build()
    }

    #[test]
    fn status_deserialize() {
        let envelope: FeedEnvelope =
            serde_json::from_value(json!({"status": "error", "data": "Unknown station"})).unwrap();
        assert_eq!(Status::Error, envelope.status);
        assert!(!envelope.is_ok());
        assert_eq!(json!("Unknown station"), envelope.data);

        let envelope: FeedEnvelope = serde_json::from_value(json!({"status": "nope"})).unwrap();
        assert_eq!(Status::Other("nope".to_owned()), envelope.status);
        assert_eq!(json!({"status": "nope"}), serde_json::to_value(&envelope).unwrap());
    }

    #[test]
    fn status_absent() {
        let envelope: FeedEnvelope =
            serde_json::from_value(json!({"data": "Invalid key"})).unwrap();
        assert!(envelope.status.is_missing());
        assert!(!envelope.is_ok());
        assert_eq!(json!({"data": "Invalid key"}), serde_json::to_value(&envelope).unwrap());
    }

    #[test]
    fn station_data_deserialize() {
        let envelope: FeedEnvelope = serde_json::from_value(json!({
            "status": "ok",
            "data": {
                "aqi": 153,
                "idx": 10522,
                "attributions": [{"url": "https://app.cpcbccr.com/", "name": "CPCB"}],
                "city": {
                    "geo": [22.6, 75.69],
                    "name": "Sector-2 Industrial Area, Pithampur, India",
                    "url": "https://aqicn.org/city/india/pithampur/sector-2-industrial-area"
                },
                "dominentpol": "pm25",
                "iaqi": {
                    "co": {"v": 9.1},
                    "h": {"v": 70.2},
                    "pm25": {"v": 153}
                },
                "time": {"s": "2024-06-01 14:00:00", "tz": "+05:30", "v": 1717250400},
                "forecast": {
                    "daily": {
                        "pm25": [
                            {"avg": 154, "day": "2024-06-01", "max": 158, "min": 138},
                            {"avg": 140, "day": "2024-06-02", "max": 155, "min": 120}
                        ],
                        "uvi": [{"avg": 0, "day": "2024-06-01", "max": 0, "min": 0}]
                    }
                }
            }
        }))
        .unwrap();

        assert!(envelope.is_ok());
        let data: StationData = envelope.station_data().unwrap();
        assert_eq!(Some(Aqi::Index(153)), data.aqi);
        assert_eq!(Some(10522), data.idx);
        assert_eq!(Some("pm25"), data.dominant_pollutant.as_deref());
        assert_eq!(
            Some("+05:30"),
            data.time.as_ref().and_then(|time| time.tz.as_deref())
        );
        assert_eq!(Some(153.0), data.reading(Pollutant::Pm25).unwrap().unwrap().v);
        assert!(data.reading(Pollutant::O3).is_none());
        assert_eq!(vec!["h"], data.unrecognized_iaqi_codes());

        let daily = data.forecast.unwrap().daily.unwrap();
        let pm25 = &daily[Pollutant::Pm25.code()];
        assert_eq!(2, pm25.len());
        assert_eq!(Some("2024-06-01"), pm25[0].day.as_deref());
        assert_eq!(Some(140.0), pm25[1].avg);
        assert_eq!(Some(120.0), pm25[1].min);
    }

    #[test]
    fn unrecognized_iaqi_entries_are_not_interpreted() {
        let data: StationData = serde_json::from_value(json!({
            "iaqi": {
                "pm25": {"v": 42},
                "wg": {"v": "calm"},
                "dew": "-"
            }
        }))
        .unwrap();
        assert_eq!(Some(42.0), data.reading(Pollutant::Pm25).unwrap().unwrap().v);
        assert_eq!(vec!["dew", "wg"], data.unrecognized_iaqi_codes());

        let data: StationData =
            serde_json::from_value(json!({"iaqi": {"pm10": {"v": "high"}}})).unwrap();
        assert!(data.reading(Pollutant::Pm10).unwrap().is_err());
    }

    #[test]
    fn aqi_unavailable() {
        let data: StationData = serde_json::from_value(json!({"aqi": "-"})).unwrap();
        assert_eq!(Some(Aqi::Unavailable("-".to_owned())), data.aqi);
        assert_eq!(None, data.aqi.unwrap().index());
    }

    #[test]
    fn feed_url() {
        let parameters = parameters(None);
        assert_eq!(
            "https://api.waqi.info/feed/@10522/?token=secret-token",
            parameters.url().unwrap()
        );
        assert_eq!(
            "https://api.waqi.info/feed/@10522/?token=REDACTED",
            parameters.redacted_url().unwrap()
        );
        assert!(!format!("{:?}", parameters).contains("secret-token"));

        let parameters = self::parameters(Some("http://localhost:8080/"));
        assert_eq!(
            "http://localhost:8080/feed/@10522/?token=secret-token",
            parameters.url().unwrap()
        );
    }

    #[tokio::test]
    async fn obtain_feed_ok() {
        let mock_server = MockServer::start().await;

        Mock::given(matchers::method("GET"))
            .and(matchers::path("/feed/@10522/"))
            .and(matchers::query_param("token", "secret-token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "status": "ok",
                "data": {"aqi": 42}
            })))
            .expect(1)
            .mount(&mock_server)
            .await;

        let client = reqwest::Client::new();
        let envelope = obtain_feed(&client, &parameters(Some(&mock_server.uri())))
            .await
            .unwrap();
        assert!(envelope.is_ok());
        assert_eq!(Some(Aqi::Index(42)), envelope.station_data().unwrap().aqi);
    }

    #[tokio::test]
    async fn obtain_feed_status_not_successful() {
        let mock_server = MockServer::start().await;

        Mock::given(matchers::method("GET"))
            .respond_with(ResponseTemplate::new(503).set_body_string("upstream unavailable"))
            .expect(1)
            .mount(&mock_server)
            .await;

        let client = reqwest::Client::new();
        let error = obtain_feed(&client, &parameters(Some(&mock_server.uri())))
            .await
            .unwrap_err();
        match error {
            Error::ResponseStatusNotSuccessful { url, code, body } => {
                assert_eq!(503, code.as_u16());
                assert_eq!("upstream unavailable", body);
                assert!(url.ends_with("/feed/@10522/?token=REDACTED"));
            }
            unexpected => panic!("unexpected error: {:?}", unexpected),
        }
    }

    #[tokio::test]
    async fn obtain_feed_malformed_json() {
        let mock_server = MockServer::start().await;

        Mock::given(matchers::method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>Not json</html>"))
            .mount(&mock_server)
            .await;

        let client = reqwest::Client::new();
        let error = obtain_feed(&client, &parameters(Some(&mock_server.uri())))
            .await
            .unwrap_err();
        assert!(matches!(error, Error::SerdeJson(_)), "{:?}", error);
    }

    #[tokio::test]
    async fn obtain_feed_connection_refused() {
        // Nothing listens on the discard port.
        let client = reqwest::Client::new();
        let error = obtain_feed(&client, &parameters(Some("http://127.0.0.1:9/")))
            .await
            .unwrap_err();
        match &error {
            Error::Request { url, .. } => {
                assert!(url.contains("REDACTED"));
                assert!(!format!("{:?}", error).contains("secret-token"));
            }
            unexpected => panic!("unexpected error: {:?}", unexpected),
        }
    }
}
