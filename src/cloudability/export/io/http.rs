use chrono::NaiveDate;
use reqwest::blocking::Client;
use serde_json::Value;
use tracing::{debug, info};

use crate::cloudability::export::error::{ReportError, Result};
use crate::cloudability::export::registry::ViewConfig;

const CLOUDABILITY_API_BASE: &str = "https://api.cloudability.com/v3";

/// Source of raw cost-report data for one provider/view/date-range request.
///
/// The production implementation is [`CloudabilityClient`]; tests substitute
/// in-memory fakes.
pub trait ReportSource {
    /// Fetches the raw report body for the given view configuration.
    fn fetch(
        &self,
        provider: &str,
        view: &str,
        config: &ViewConfig,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Value>;
}

/// Blocking HTTP client for the Cloudability cost-report API.
#[derive(Debug, Clone)]
pub struct CloudabilityClient {
    client: Client,
    base_url: String,
    api_key: String,
}

impl CloudabilityClient {
    /// Creates a client authenticating with the given bearer token.
    pub fn new(api_key: impl Into<String>) -> Result<Self> {
        let api_key = api_key.into();
        if api_key.is_empty() {
            return Err(ReportError::MissingApiKey);
        }

        let client = Client::builder()
            .user_agent(concat!("cloudability-export/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            client,
            base_url: CLOUDABILITY_API_BASE.to_string(),
            api_key,
        })
    }

    /// Creates a client from the `CLOUDABILITY_API_KEY` environment variable.
    pub fn from_env() -> Result<Self> {
        let api_key =
            std::env::var("CLOUDABILITY_API_KEY").map_err(|_| ReportError::MissingApiKey)?;
        Self::new(api_key)
    }

    /// Overrides the API base URL. Used by tests to point at a local server.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }
}

impl ReportSource for CloudabilityClient {
    fn fetch(
        &self,
        provider: &str,
        view: &str,
        config: &ViewConfig,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Value> {
        let url = format!("{}/reports/cost", self.base_url);
        let params = report_query(config, start, end);
        info!(provider, view, "fetching report");
        debug!(url = %url, ?params, "issuing cost report request");

        let response = self
            .client
            .get(&url)
            .bearer_auth(&self.api_key)
            .query(&params)
            .send()?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().unwrap_or_default();
            return Err(ReportError::Api {
                status: status.as_u16(),
                message,
            });
        }

        Ok(response.json()?)
    }
}

/// Builds the query string parameters for one cost-report request.
fn report_query(config: &ViewConfig, start: NaiveDate, end: NaiveDate) -> Vec<(String, String)> {
    vec![
        ("start_date".to_string(), start.format("%Y-%m-%d").to_string()),
        ("end_date".to_string(), end.format("%Y-%m-%d").to_string()),
        ("dimensions".to_string(), config.dimensions.join(",")),
        ("metrics".to_string(), config.metrics.join(",")),
    ]
}
