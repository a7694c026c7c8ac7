//! Atlassian Statuspage fetcher
//!
//! Reads `{origin}/api/v2/status.json` and maps the overall indicator:
//! `"none"` means healthy, anything else is DOWN. On DOWN a second request
//! to `{origin}/api/v2/incidents/unresolved.json` supplies the problem
//! description.

use async_trait::async_trait;
use serde::Deserialize;

use super::{Fetched, StatusClient, StatusFetcher, page_origin};
use crate::error::FetchError;
use crate::report::StatusReport;

/// Description used when the indicator shows trouble but the unresolved
/// incident list is empty or unavailable.
pub const NO_INCIDENT_DETAILS: &str = "No incident details available";

pub struct AtlassianFetcher {
    client: StatusClient,
}

#[derive(Deserialize)]
struct StatusEnvelope {
    status: Indicator,
}

#[derive(Deserialize)]
struct Indicator {
    indicator: String,
}

#[derive(Deserialize)]
struct IncidentsEnvelope {
    incidents: Vec<Incident>,
}

#[derive(Deserialize)]
struct Incident {
    #[serde(default)]
    incident_updates: Vec<IncidentUpdate>,
}

#[derive(Deserialize)]
struct IncidentUpdate {
    body: String,
}

impl AtlassianFetcher {
    pub(crate) fn new(client: StatusClient) -> Self {
        Self { client }
    }

    /// First update of the first unresolved incident, or the generic
    /// fallback. DOWN is already established when this runs, so a failure
    /// here only degrades the description.
    async fn unresolved_incident(&self, origin: &str) -> String {
        let url = format!("{origin}/api/v2/incidents/unresolved.json");
        match self.client.get_json::<IncidentsEnvelope>(&url).await {
            Ok(Fetched::Json(envelope)) => envelope
                .incidents
                .first()
                .and_then(|incident| incident.incident_updates.first())
                .map(|update| update.body.clone())
                .unwrap_or_else(|| NO_INCIDENT_DETAILS.to_string()),
            Ok(Fetched::Unreachable(_)) | Err(_) => NO_INCIDENT_DETAILS.to_string(),
        }
    }
}

#[async_trait]
impl StatusFetcher for AtlassianFetcher {
    async fn fetch(&self, endpoint: &str) -> Result<StatusReport, FetchError> {
        let origin = page_origin(endpoint)?;
        let url = format!("{origin}/api/v2/status.json");

        let envelope = match self.client.get_json::<StatusEnvelope>(&url).await? {
            Fetched::Json(envelope) => envelope,
            Fetched::Unreachable(problem) => return Ok(StatusReport::down(problem)),
        };

        if envelope.status.indicator == "none" {
            return Ok(StatusReport::Ok);
        }
        Ok(StatusReport::down(self.unresolved_incident(&origin).await))
    }
}
