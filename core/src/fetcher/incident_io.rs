//! Incident.io fetcher
//!
//! Incident.io status pages expose their API through a same-host proxy:
//! `{origin}/proxy/{host}` carries the summary, and
//! `{origin}/proxy/{host}/incidents` the incident feed. DOWN when any
//! component is listed as affected.

use async_trait::async_trait;
use serde::Deserialize;

use super::atlassian::NO_INCIDENT_DETAILS;
use super::{Fetched, StatusClient, StatusFetcher, page_host, page_origin};
use crate::error::FetchError;
use crate::report::StatusReport;

pub struct IncidentIoFetcher {
    client: StatusClient,
}

#[derive(Deserialize)]
struct SummaryEnvelope {
    summary: Summary,
}

#[derive(Deserialize)]
struct Summary {
    affected_components: Vec<serde_json::Value>,
}

#[derive(Deserialize)]
struct IncidentsEnvelope {
    incidents: Vec<Incident>,
}

#[derive(Deserialize)]
struct Incident {
    #[serde(default)]
    updates: Vec<IncidentUpdate>,
}

#[derive(Deserialize)]
struct IncidentUpdate {
    message_string: String,
}

impl IncidentIoFetcher {
    pub(crate) fn new(client: StatusClient) -> Self {
        Self { client }
    }

    async fn latest_incident(&self, origin: &str, host: &str) -> String {
        let url = format!("{origin}/proxy/{host}/incidents");
        match self.client.get_json::<IncidentsEnvelope>(&url).await {
            Ok(Fetched::Json(envelope)) => envelope
                .incidents
                .first()
                .and_then(|incident| incident.updates.first())
                .map(|update| update.message_string.clone())
                .unwrap_or_else(|| NO_INCIDENT_DETAILS.to_string()),
            Ok(Fetched::Unreachable(_)) | Err(_) => NO_INCIDENT_DETAILS.to_string(),
        }
    }
}

#[async_trait]
impl StatusFetcher for IncidentIoFetcher {
    async fn fetch(&self, endpoint: &str) -> Result<StatusReport, FetchError> {
        let origin = page_origin(endpoint)?;
        let host = page_host(endpoint)?;
        let url = format!("{origin}/proxy/{host}");

        let envelope = match self.client.get_json::<SummaryEnvelope>(&url).await? {
            Fetched::Json(envelope) => envelope,
            Fetched::Unreachable(problem) => return Ok(StatusReport::down(problem)),
        };

        if envelope.summary.affected_components.is_empty() {
            return Ok(StatusReport::Ok);
        }
        Ok(StatusReport::down(self.latest_incident(&origin, &host).await))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetcher::{FetchConfig, Registry};
    use crate::report::FetcherKind;

    async fn fetch(server: &mockito::ServerGuard) -> Result<StatusReport, FetchError> {
        let registry = Registry::new(FetchConfig::default()).unwrap();
        let fetcher = registry.resolve_kind(FetcherKind::Incident).unwrap();
        fetcher.fetch(&server.url()).await
    }

    fn proxy_path(server: &mockito::ServerGuard, suffix: &str) -> String {
        // Mock endpoints live on the same host the fetcher proxies through.
        let host = server.host_with_port();
        format!("/proxy/{host}{suffix}")
    }

    #[tokio::test]
    async fn no_affected_components_is_ok() {
        let mut server = mockito::Server::new_async().await;
        let path = proxy_path(&server, "");
        server
            .mock("GET", path.as_str())
            .with_status(200)
            .with_body(r#"{"summary":{"affected_components":[]}}"#)
            .create_async()
            .await;

        assert_eq!(fetch(&server).await.unwrap(), StatusReport::Ok);
    }

    #[tokio::test]
    async fn affected_components_report_latest_update() {
        let mut server = mockito::Server::new_async().await;
        let summary_path = proxy_path(&server, "");
        let incidents_path = proxy_path(&server, "/incidents");
        server
            .mock("GET", summary_path.as_str())
            .with_status(200)
            .with_body(r#"{"summary":{"affected_components":[{"id":"comp-1"}]}}"#)
            .create_async()
            .await;
        server
            .mock("GET", incidents_path.as_str())
            .with_status(200)
            .with_body(
                r#"{"incidents":[{"name":"Degraded API","updates":[{"message_string":"Investigating elevated error rates"}]}]}"#,
            )
            .create_async()
            .await;

        assert_eq!(
            fetch(&server).await.unwrap(),
            StatusReport::down("Investigating elevated error rates")
        );
    }

    #[tokio::test]
    async fn empty_incident_feed_falls_back() {
        let mut server = mockito::Server::new_async().await;
        let summary_path = proxy_path(&server, "");
        let incidents_path = proxy_path(&server, "/incidents");
        server
            .mock("GET", summary_path.as_str())
            .with_status(200)
            .with_body(r#"{"summary":{"affected_components":[{"id":"comp-1"}]}}"#)
            .create_async()
            .await;
        server
            .mock("GET", incidents_path.as_str())
            .with_status(200)
            .with_body(r#"{"incidents":[]}"#)
            .create_async()
            .await;

        assert_eq!(
            fetch(&server).await.unwrap(),
            StatusReport::down(NO_INCIDENT_DETAILS)
        );
    }

    #[tokio::test]
    async fn missing_summary_is_a_shape_error() {
        let mut server = mockito::Server::new_async().await;
        let path = proxy_path(&server, "");
        server
            .mock("GET", path.as_str())
            .with_status(200)
            .with_body(r#"{"ontology":{}}"#)
            .create_async()
            .await;

        let err = fetch(&server).await.unwrap_err();
        assert!(matches!(err, FetchError::UnexpectedShape { .. }));
    }
}
