//! Command line arguments and the optional RON options file.

use std::{
    fmt::Display,
    path::{Path, PathBuf},
    time::Duration,
};

use clap::Parser;
use eyre::Context;
use secrecy::SecretString;
use serde::{Deserialize, Deserializer};

/// Render a static air quality dashboard for a single monitoring station.
#[derive(Debug, Default, Parser)]
#[command(name = "aqi-dashboard", version, about)]
pub struct Cli {
    /// Station identifier in the feed, e.g. `@10522`.
    #[arg(long)]
    pub station: Option<String>,
    /// Human readable station name shown in the dashboard.
    #[arg(long)]
    pub station_name: Option<String>,
    /// Feed access token. Prefer the `AQI_API_KEY` environment variable.
    #[arg(long)]
    pub token: Option<String>,
    /// Path of the html file to write.
    #[arg(long)]
    pub output: Option<PathBuf>,
    /// Base url of the feed api.
    #[arg(long)]
    pub feed_url: Option<url::Url>,
    /// Request timeout, e.g. `30s`.
    #[arg(long, value_parser = humantime::parse_duration)]
    pub timeout: Option<Duration>,
    /// Directory where application data is stored (including logs).
    #[arg(long)]
    pub data_dir: Option<PathBuf>,
}

/// Global options for the application.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Options {
    /// Station identifier in the feed.
    ///
    /// Default is `@10522`.
    #[serde(default = "default_station")]
    pub station: String,
    /// Name shown in the dashboard title, header and forecast chart title.
    ///
    /// Default is `Pithampur (Sector-2)`.
    #[serde(default = "default_station_name")]
    pub station_name: String,
    /// Feed access token, see [`crate::secrets`] for the other ways to provide it.
    #[serde(default)]
    pub access_token: Option<SecretString>,
    /// Default is `dashboard.html`.
    #[serde(default = "default_output")]
    pub output: PathBuf,
    /// Default is [`waqi::DEFAULT_BASE_URL`].
    #[serde(default = "default_feed_url")]
    pub feed_url: url::Url,
    /// Request timeout in humantime format.
    ///
    /// Default is `30s`.
    #[serde(
        default = "default_timeout",
        deserialize_with = "deserialize_humantime"
    )]
    pub timeout: Duration,
    /// Directory where application data is stored (including logs).
    ///
    /// Default is `data`.
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
    /// Directory where secrets are loaded from.
    ///
    /// Default is `secrets`.
    #[serde(default = "default_secrets_dir")]
    pub secrets_dir: PathBuf,
}

fn default_station() -> String {
    "@10522".to_owned()
}

fn default_station_name() -> String {
    "Pithampur (Sector-2)".to_owned()
}

fn default_output() -> PathBuf {
    "dashboard.html".into()
}

fn default_feed_url() -> url::Url {
    url::Url::parse(waqi::DEFAULT_BASE_URL).expect("Unable to parse default feed url")
}

fn default_timeout() -> Duration {
    Duration::from_secs(30)
}

fn default_data_dir() -> PathBuf {
    "data".into()
}

fn default_secrets_dir() -> PathBuf {
    "secrets".into()
}

fn deserialize_humantime<'de, D>(deserializer: D) -> Result<Duration, D::Error>
where
    D: Deserializer<'de>,
{
    let value = String::deserialize(deserializer)?;
    humantime::parse_duration(&value).map_err(serde::de::Error::custom)
}

impl Default for Options {
    fn default() -> Self {
        Self {
            station: default_station(),
            station_name: default_station_name(),
            access_token: None,
            output: default_output(),
            feed_url: default_feed_url(),
            timeout: default_timeout(),
            data_dir: default_data_dir(),
            secrets_dir: default_secrets_dir(),
        }
    }
}

/// Where the options were loaded from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OptionsSource {
    /// RON string in the `OPTIONS` environment variable.
    EnvironmentVariable,
    /// File named by the `OPTIONS` environment variable.
    EnvironmentFile(PathBuf),
    /// `options.ron` in the working directory.
    DefaultFile(PathBuf),
    Defaults,
}

impl Display for OptionsSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OptionsSource::EnvironmentVariable => f.write_str("`OPTIONS` environment variable"),
            OptionsSource::EnvironmentFile(path) => write!(
                f,
                "file specified in `OPTIONS` environment variable: {:?}",
                path
            ),
            OptionsSource::DefaultFile(path) => write!(f, "default file: {:?}", path),
            OptionsSource::Defaults => f.write_str("defaults"),
        }
    }
}

async fn read_options_file(path: &Path) -> eyre::Result<Options> {
    let options_str = tokio::fs::read_to_string(path)
        .await
        .wrap_err_with(|| format!("Error reading options file: {:?}", path))?;
    ron::from_str(&options_str)
        .wrap_err_with(|| format!("Error deserializing options file: {:?}", path))
}

/// Load options using the `OPTIONS` environment variable, otherwise from `options.ron` if it
/// exists, otherwise use the defaults. If `OPTIONS` contains a RON definition it is used
/// directly, otherwise it is treated as a file path.
async fn load_options() -> eyre::Result<(Options, OptionsSource)> {
    match std::env::var("OPTIONS") {
        Ok(options) => match ron::from_str(&options) {
            Ok(options) => Ok((options, OptionsSource::EnvironmentVariable)),
            Err(error) => {
                let path = PathBuf::from(options);
                if path.is_file() {
                    let options = read_options_file(&path).await?;
                    Ok((options, OptionsSource::EnvironmentFile(path)))
                } else {
                    Err(error).wrap_err(
                        "Error deserializing options from `OPTIONS` environment variable \
                        string, or you have specified a file path which does not exist",
                    )
                }
            }
        },
        Err(std::env::VarError::NotPresent) => {
            let path = Path::new("options.ron");
            if path.is_file() {
                let options = read_options_file(path).await?;
                Ok((options, OptionsSource::DefaultFile(path.to_owned())))
            } else {
                Ok((Options::default(), OptionsSource::Defaults))
            }
        }
        Err(error) => Err(error).wrap_err("Error reading `OPTIONS` environment variable"),
    }
}

impl Options {
    /// Apply the command line arguments, which take precedence over the loaded options.
    #[must_use]
    pub fn merge(mut self, cli: Cli) -> Self {
        if let Some(station) = cli.station {
            self.station = station;
        }
        if let Some(station_name) = cli.station_name {
            self.station_name = station_name;
        }
        if let Some(token) = cli.token {
            self.access_token = Some(SecretString::new(token));
        }
        if let Some(output) = cli.output {
            self.output = output;
        }
        if let Some(feed_url) = cli.feed_url {
            self.feed_url = feed_url;
        }
        if let Some(timeout) = cli.timeout {
            self.timeout = timeout;
        }
        if let Some(data_dir) = cli.data_dir {
            self.data_dir = data_dir;
        }
        self
    }

    /// Initialize the options, see [`load_options()`], with `cli` applied on top.
    pub async fn initialize(cli: Cli) -> eyre::Result<(Self, OptionsSource)> {
        let (options, source) = load_options().await?;
        Ok((options.merge(cli), source))
    }
}
