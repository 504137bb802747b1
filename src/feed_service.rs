//! External air quality feed service.
//! See [Port].

use async_trait::async_trait;
use waqi::{FeedEnvelope, FeedParameters};

/// Trait used to allow mocking the [waqi] feed service.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Port: Send + Sync {
    /// Obtain a station feed using [waqi::obtain_feed()].
    async fn obtain_feed(&self, parameters: &FeedParameters) -> Result<FeedEnvelope, waqi::Error>;
}

/// Concrete implementation of [Port].
pub struct Gateway {
    http_client: reqwest::Client,
}

impl Gateway {
    /// Construct a new [Gateway].
    #[must_use]
    pub fn new(http_client: reqwest::Client) -> Self {
        Self { http_client }
    }
}

#[async_trait]
impl Port for Gateway {
    async fn obtain_feed(&self, parameters: &FeedParameters) -> Result<FeedEnvelope, waqi::Error> {
        let json = waqi::obtain_feed_json(&self.http_client, parameters).await?;
        tracing::trace!("Feed response: {}", json);
        Ok(serde_json::from_str(&json)?)
    }
}
