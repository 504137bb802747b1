//! The fetch, extract, render, assemble sequence producing one dashboard file.

use std::{
    fmt::Display,
    path::{Path, PathBuf},
};

use secrecy::SecretString;
use waqi::{FeedEnvelope, FeedParameters};

use crate::{
    assemble::{self, DashboardTemplate},
    extract::{self, envelope_json},
    feed_service,
    options::Options,
    render,
};

/// Pipeline stage an [`Error`] occurred in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Fetch,
    Extract,
    Assemble,
}

impl Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Stage::Fetch => "fetch",
            Stage::Extract => "extract",
            Stage::Assemble => "assemble",
        })
    }
}

/// Malformed feed content, either not json at all or json of the wrong shape.
#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    #[error(transparent)]
    Feed(waqi::Error),
    #[error(transparent)]
    Extract(extract::Error),
}

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Connection, timeout or non-success http status.
    #[error("Unable to obtain the station feed")]
    Network(#[source] waqi::Error),
    #[error("Unable to parse the station feed")]
    Parse {
        stage: Stage,
        #[source]
        source: ParseError,
    },
    #[error("Feed status is `{}` instead of `ok`, response: {}", .envelope.status, envelope_json(.envelope))]
    UpstreamStatus { envelope: Box<FeedEnvelope> },
    #[error("Expected field `{path}` is missing from the feed response")]
    MissingField { path: String },
    #[error("Unable to build the dashboard document")]
    Template(#[source] assemble::Error),
    #[error("Unable to write the dashboard to {path:?}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl Error {
    pub fn stage(&self) -> Stage {
        match self {
            Error::Network(_) => Stage::Fetch,
            Error::Parse { stage, .. } => *stage,
            Error::UpstreamStatus { .. } | Error::MissingField { .. } => Stage::Extract,
            Error::Template(_) | Error::Io { .. } => Stage::Assemble,
        }
    }
}

impl From<waqi::Error> for Error {
    fn from(error: waqi::Error) -> Self {
        match error {
            waqi::Error::SerdeJson(_) => Error::Parse {
                stage: Stage::Fetch,
                source: ParseError::Feed(error),
            },
            _ => Error::Network(error),
        }
    }
}

impl From<extract::Error> for Error {
    fn from(error: extract::Error) -> Self {
        match error {
            extract::Error::UpstreamStatus { envelope } => Error::UpstreamStatus { envelope },
            extract::Error::MissingField { path } => Error::MissingField { path },
            extract::Error::Shape(_) | extract::Error::InvalidDate { .. } => Error::Parse {
                stage: Stage::Extract,
                source: ParseError::Extract(error),
            },
        }
    }
}

impl From<assemble::Error> for Error {
    fn from(error: assemble::Error) -> Self {
        Error::Template(error)
    }
}

/// Everything a single run needs.
#[derive(Debug)]
pub struct Config {
    pub parameters: FeedParameters,
    /// Shown in the dashboard title, header and forecast chart title.
    pub station_name: String,
    pub output: PathBuf,
}

impl Config {
    pub fn new(options: &Options, token: SecretString) -> Self {
        Self {
            parameters: FeedParameters::builder()
                .station(options.station.clone())
                .token(token)
                .base_url(options.feed_url.clone())
                .build(),
            station_name: options.station_name.clone(),
            output: options.output.clone(),
        }
    }
}

/// Summary of a successful run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Outcome {
    pub output: PathBuf,
    pub current_index: i32,
    /// Size of the written document in bytes.
    pub document_len: usize,
}

pub struct Pipeline<'a> {
    feed_service: &'a dyn feed_service::Port,
    config: Config,
}

impl<'a> Pipeline<'a> {
    pub fn new(feed_service: &'a dyn feed_service::Port, config: Config) -> Self {
        Self {
            feed_service,
            config,
        }
    }

    pub fn output(&self) -> &Path {
        &self.config.output
    }

    /// Run every stage once. The output file is only written when all previous stages succeed.
    #[tracing::instrument(skip_all, fields(station = %self.config.parameters.station))]
    pub async fn run(&self) -> Result<Outcome, Error> {
        let envelope = self
            .feed_service
            .obtain_feed(&self.config.parameters)
            .await?;
        tracing::debug!("Feed status: {}", envelope.status);

        let extracted = extract::extract(&envelope)?;
        if let Some(name) = &extracted.station.name {
            tracing::debug!("Feed station name: {}", name);
        }

        let panels = render::render(&extracted, &self.config.station_name);

        let html = DashboardTemplate {
            station_name: &self.config.station_name,
            observed_at: extracted.station.observed_at.as_deref(),
            panels: &panels,
        }
        .to_html()?;

        assemble::write_dashboard(&self.config.output, &html)
            .await
            .map_err(|source| Error::Io {
                path: self.config.output.clone(),
                source,
            })?;

        Ok(Outcome {
            output: self.config.output.clone(),
            current_index: extracted.current_index,
            document_len: html.len(),
        })
    }
}

#[cfg(test)]
mod test {
    use std::path::Path;

    use secrecy::SecretString;
    use serde_json::json;
    use waqi::FeedEnvelope;

    use super::{Config, Error, Pipeline, Stage};
    use crate::{feed_service::MockPort, options::Options};

    fn config(output: &Path) -> Config {
        let options = Options {
            station: "@10522".to_owned(),
            station_name: "Test Station".to_owned(),
            output: output.to_owned(),
            ..Options::default()
        };
        Config::new(&options, SecretString::new("secret-token".to_owned()))
    }

    fn feed_returning(value: serde_json::Value) -> MockPort {
        let envelope: FeedEnvelope = serde_json::from_value(value).unwrap();
        let mut feed = MockPort::new();
        feed.expect_obtain_feed()
            .times(1)
            .withf(|parameters| parameters.station == "@10522")
            .returning(move |_| Ok(envelope.clone()));
        feed
    }

    fn ok_feed() -> MockPort {
        feed_returning(json!({
            "status": "ok",
            "data": {
                "aqi": 42,
                "iaqi": {"pm25": {"v": 42}, "pm10": {"v": 30}},
                "time": {"s": "2024-06-01 14:00:00", "tz": "+05:30"},
                "forecast": {"daily": {"pm25": [{"day": "2024-06-01", "avg": 42}]}}
            }
        }))
    }

    #[tokio::test]
    async fn writes_dashboard() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("dashboard.html");
        let feed = ok_feed();

        let outcome = Pipeline::new(&feed, config(&output)).run().await.unwrap();

        assert_eq!(output, outcome.output);
        assert_eq!(42, outcome.current_index);
        let html = std::fs::read_to_string(&output).unwrap();
        assert_eq!(html.len(), outcome.document_len);
        assert!(html.contains("Air Quality Dashboard: Test Station"));
        assert!(html.contains("2024-06-01 14:00:00"));
    }

    #[tokio::test]
    async fn upstream_status_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("dashboard.html");
        let feed = feed_returning(json!({"status": "error", "data": "Unknown station"}));

        let error = Pipeline::new(&feed, config(&output))
            .run()
            .await
            .unwrap_err();

        assert!(matches!(error, Error::UpstreamStatus { .. }), "{:?}", error);
        assert_eq!(Stage::Extract, error.stage());
        assert!(error.to_string().contains("Unknown station"));
        assert!(!output.exists());
    }

    #[tokio::test]
    async fn reply_without_status_is_upstream_error() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("dashboard.html");
        let feed = feed_returning(json!({"data": "Invalid key"}));

        let error = Pipeline::new(&feed, config(&output))
            .run()
            .await
            .unwrap_err();

        assert!(matches!(error, Error::UpstreamStatus { .. }), "{:?}", error);
        assert_eq!(Stage::Extract, error.stage());
        assert!(!output.exists());
    }

    #[tokio::test]
    async fn missing_field_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("dashboard.html");
        let feed = feed_returning(json!({
            "status": "ok",
            "data": {"aqi": 42, "iaqi": {}}
        }));

        let error = Pipeline::new(&feed, config(&output))
            .run()
            .await
            .unwrap_err();

        match &error {
            Error::MissingField { path } => assert_eq!("data.forecast", path),
            other => panic!("unexpected error {:?}", other),
        }
        assert!(!output.exists());
    }

    #[tokio::test]
    async fn malformed_feed_is_a_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("dashboard.html");
        let mut feed = MockPort::new();
        feed.expect_obtain_feed().times(1).returning(|_| {
            let json_error = serde_json::from_str::<FeedEnvelope>("<html>").unwrap_err();
            Err(waqi::Error::SerdeJson(json_error))
        });

        let error = Pipeline::new(&feed, config(&output))
            .run()
            .await
            .unwrap_err();

        assert!(matches!(error, Error::Parse { .. }), "{:?}", error);
        assert_eq!(Stage::Fetch, error.stage());
        assert!(!output.exists());
    }

    #[tokio::test]
    async fn unwritable_output_is_an_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("dashboard.html");
        std::fs::create_dir(&output).unwrap();
        let feed = ok_feed();

        let error = Pipeline::new(&feed, config(&output))
            .run()
            .await
            .unwrap_err();

        assert!(matches!(error, Error::Io { .. }), "{:?}", error);
        assert_eq!(Stage::Assemble, error.stage());
    }

    #[test]
    fn config_from_options() {
        let config = config(Path::new("out.html"));
        assert_eq!("@10522", config.parameters.station);
        assert_eq!(
            "https://api.waqi.info/feed/@10522/?token=REDACTED",
            config.parameters.redacted_url().unwrap()
        );
        assert!(!format!("{:?}", config).contains("secret-token"));
    }
}
