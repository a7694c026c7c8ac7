//! Instatus fetcher
//!
//! Reads `{origin}/summary.json`. DOWN when the page status is
//! `"HASISSUES"` or any active incident is listed; the description is the
//! first active incident's name, or empty when the indicator triggered
//! without a listed incident.

use async_trait::async_trait;
use serde::Deserialize;

use super::{Fetched, StatusClient, StatusFetcher, page_origin};
use crate::error::FetchError;
use crate::report::StatusReport;

pub struct InstatusFetcher {
    client: StatusClient,
}

#[derive(Deserialize)]
struct Summary {
    page: Page,
    #[serde(default, rename = "activeIncidents")]
    active_incidents: Vec<ActiveIncident>,
}

#[derive(Deserialize)]
struct Page {
    status: String,
}

#[derive(Deserialize)]
struct ActiveIncident {
    name: String,
}

impl InstatusFetcher {
    pub(crate) fn new(client: StatusClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl StatusFetcher for InstatusFetcher {
    async fn fetch(&self, endpoint: &str) -> Result<StatusReport, FetchError> {
        let origin = page_origin(endpoint)?;
        let url = format!("{origin}/summary.json");

        let summary = match self.client.get_json::<Summary>(&url).await? {
            Fetched::Json(summary) => summary,
            Fetched::Unreachable(problem) => return Ok(StatusReport::down(problem)),
        };

        let has_issues =
            summary.page.status == "HASISSUES" || !summary.active_incidents.is_empty();
        if !has_issues {
            return Ok(StatusReport::Ok);
        }

        let problem = summary
            .active_incidents
            .first()
            .map(|incident| incident.name.clone())
            .unwrap_or_default();
        Ok(StatusReport::down(problem))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetcher::{FetchConfig, Registry};
    use crate::report::FetcherKind;

    async fn fetch(server: &mockito::ServerGuard) -> Result<StatusReport, FetchError> {
        let registry = Registry::new(FetchConfig::default()).unwrap();
        let fetcher = registry.resolve_kind(FetcherKind::Instatus).unwrap();
        fetcher.fetch(&server.url()).await
    }

    #[tokio::test]
    async fn up_with_no_incidents_is_ok() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/summary.json")
            .with_status(200)
            .with_body(r#"{"page":{"status":"UP"},"activeIncidents":[]}"#)
            .create_async()
            .await;

        assert_eq!(fetch(&server).await.unwrap(), StatusReport::Ok);
    }

    #[tokio::test]
    async fn active_incident_names_the_problem() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/summary.json")
            .with_status(200)
            .with_body(
                r#"{"page":{"status":"UP"},"activeIncidents":[{"status":"INVESTIGATING","name":"API latency"}]}"#,
            )
            .create_async()
            .await;

        assert_eq!(
            fetch(&server).await.unwrap(),
            StatusReport::down("API latency")
        );
    }

    #[tokio::test]
    async fn hasissues_with_empty_incidents_is_down_with_empty_description() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/summary.json")
            .with_status(200)
            .with_body(r#"{"page":{"status":"HASISSUES"},"activeIncidents":[]}"#)
            .create_async()
            .await;

        assert_eq!(fetch(&server).await.unwrap(), StatusReport::down(""));
    }

    #[tokio::test]
    async fn missing_incident_array_is_tolerated() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/summary.json")
            .with_status(200)
            .with_body(r#"{"page":{"status":"UP"}}"#)
            .create_async()
            .await;

        assert_eq!(fetch(&server).await.unwrap(), StatusReport::Ok);
    }

    #[tokio::test]
    async fn missing_page_status_is_a_shape_error() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/summary.json")
            .with_status(200)
            .with_body(r#"{"activeIncidents":[]}"#)
            .create_async()
            .await;

        let err = fetch(&server).await.unwrap_err();
        assert!(matches!(err, FetchError::UnexpectedShape { .. }));
    }
}
