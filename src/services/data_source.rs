//! External data source client.
//!
//! # Responsibilities
//! - Fetch a JSON document from the configured upstream
//! - Apply the demo business transformation to it
//! - Surface timeouts and non-2xx answers as errors

use serde_json::Value;
use std::time::Duration;
use url::Url;

use crate::config::ExternalApiConfig;

#[derive(Debug, thiserror::Error)]
pub enum DataSourceError {
    #[error("invalid upstream URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("upstream request failed: {0}")]
    Request(#[from] reqwest::Error),
}

/// HTTP client for the upstream data API.
#[derive(Debug, Clone)]
pub struct DataSource {
    client: reqwest::Client,
    endpoint: Url,
}

impl DataSource {
    pub fn new(config: &ExternalApiConfig) -> Result<Self, DataSourceError> {
        let endpoint = Url::parse(&config.url)?;
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self { client, endpoint })
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    /// GET the upstream document.
    pub async fn fetch(&self) -> Result<Value, DataSourceError> {
        let response = self
            .client
            .get(self.endpoint.clone())
            .send()
            .await?
            .error_for_status()?;

        let body = response.json::<Value>().await?;
        tracing::debug!(endpoint = %self.endpoint, "Upstream data fetched");
        Ok(body)
    }
}

/// Mark objects carrying a `title` as processed and add its upper-case form.
pub fn process(mut data: Value) -> Value {
    if let Value::Object(map) = &mut data {
        let upper = map.get("title").and_then(Value::as_str).map(str::to_uppercase);
        if let Some(upper) = upper {
            map.insert("processed".to_string(), Value::Bool(true));
            map.insert("title_upper".to_string(), Value::String(upper));
        }
    }
    data
}
