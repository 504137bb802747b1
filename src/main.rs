use aqi_dashboard::{
    feed_service::Gateway,
    fs,
    options::{Cli, Options},
    pipeline::{self, Config, Pipeline},
    reporting::{self, ReportingOptions},
    secrets,
};
use clap::Parser;
use color_eyre::Help;
use eyre::Context;
use tracing_appender::rolling::Rotation;

#[tokio::main(flavor = "current_thread")]
async fn main() -> eyre::Result<()> {
    let cli = Cli::parse();
    let (options, options_source) = Options::initialize(cli).await?;

    fs::create_dir_if_not_exists(&options.data_dir)
        .wrap_err_with(|| format!("Unable to create data directory {:?}", options.data_dir))?;

    let _reporting_guard = reporting::setup_reporting(&ReportingOptions {
        data_dir: options.data_dir.clone(),
        log_rotation: Rotation::DAILY,
    })?;

    tracing::info!("Options loaded from {}", options_source);
    tracing::debug!("{:?}", options);

    let access_token =
        secrets::initialize_access_token(options.access_token.as_ref(), &options.secrets_dir)
            .await?;

    let http_client = reqwest::Client::builder()
        .timeout(options.timeout)
        .build()
        .wrap_err("Unable to build http client")?;
    let feed_service = Gateway::new(http_client);

    let pipeline = Pipeline::new(&feed_service, Config::new(&options, access_token.token));

    match pipeline.run().await {
        Ok(outcome) => {
            tracing::info!(
                "Dashboard for index {} written to {:?} ({} bytes)",
                outcome.current_index,
                outcome.output,
                outcome.document_len
            );
            Ok(())
        }
        Err(error) => {
            let stage = error.stage();
            let suggestion = match &error {
                pipeline::Error::UpstreamStatus { .. } => Some(
                    "Check the station identifier and the access token, see \
                    https://aqicn.org/data-platform/token/",
                ),
                pipeline::Error::Network(_) => {
                    Some("Check the network connection, `--feed-url` and `--timeout`")
                }
                _ => None,
            };
            let report = eyre::Report::new(error)
                .wrap_err(format!("Dashboard {} stage failed", stage));
            Err(match suggestion {
                Some(suggestion) => report.suggestion(suggestion),
                None => report,
            })
        }
    }
}
