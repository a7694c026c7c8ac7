//! Generic HTTP fetcher
//!
//! For platforms without a structured status page: GET the endpoint itself,
//! follow redirects, and treat anything other than a final 200 as DOWN.
//! Non-200 codes are captured into the report, not raised.

use async_trait::async_trait;

use super::{StatusClient, StatusFetcher};
use crate::error::FetchError;
use crate::report::StatusReport;

pub struct GenericHttpFetcher {
    client: StatusClient,
}

impl GenericHttpFetcher {
    pub(crate) fn new(client: StatusClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl StatusFetcher for GenericHttpFetcher {
    async fn fetch(&self, endpoint: &str) -> Result<StatusReport, FetchError> {
        let response = match self.client.get(endpoint).await {
            Ok(response) => response,
            Err(problem) => return Ok(StatusReport::down(problem)),
        };

        let code = response.status().as_u16();
        if code == 200 {
            return Ok(StatusReport::Ok);
        }
        Ok(StatusReport::down(format!(
            "HTTP status code {code} received instead of 200"
        )))
    }
}
