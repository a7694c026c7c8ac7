//! Status data model
//!
//! Defines the platform record the core polls and the normalized results it
//! produces. Platforms are owned by the store; everything else here is
//! ephemeral and rebuilt on every poll.

use serde::{Deserialize, Serialize};

use crate::error::FetchError;

/// Placeholder description attached to healthy platforms so API clients
/// always receive a string.
pub const NO_PROBLEM: &str = "No problem description available";

// ============================================================================
// Platform (input)
// ============================================================================

/// One monitored service: where its status page lives and which fetcher
/// understands it.
///
/// Read-only input to this crate. The store guarantees `kind` is a registered
/// fetcher tag before a record ever reaches the aggregator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Platform {
    /// Opaque unique key, assigned by the store.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Base URL of the platform's public status page.
    pub url: String,
    /// Which status-page convention the endpoint speaks.
    pub kind: FetcherKind,
}

/// The closed set of status-page conventions statusdeck understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FetcherKind {
    /// Atlassian Statuspage (`/api/v2/status.json`)
    Atlassian,
    /// Instatus (`/summary.json`)
    Instatus,
    /// Incident.io (`/proxy/{host}`)
    Incident,
    /// Plain HTTP 200 check against the endpoint itself
    Generic,
}

impl FetcherKind {
    /// Every registered kind, in the order the API advertises them.
    pub const ALL: [FetcherKind; 4] = [
        FetcherKind::Incident,
        FetcherKind::Atlassian,
        FetcherKind::Instatus,
        FetcherKind::Generic,
    ];

    /// The wire tag for this kind.
    pub fn as_str(&self) -> &'static str {
        match self {
            FetcherKind::Atlassian => "atlassian",
            FetcherKind::Instatus => "instatus",
            FetcherKind::Incident => "incident",
            FetcherKind::Generic => "generic",
        }
    }
}

impl std::fmt::Display for FetcherKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for FetcherKind {
    type Err = FetchError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "atlassian" => Ok(FetcherKind::Atlassian),
            "instatus" => Ok(FetcherKind::Instatus),
            "incident" => Ok(FetcherKind::Incident),
            "generic" => Ok(FetcherKind::Generic),
            other => Err(FetchError::UnknownFetcherType(other.to_string())),
        }
    }
}

// ============================================================================
// StatusReport (per-fetch result)
// ============================================================================

/// The normalized outcome of a single status fetch.
///
/// Transport-level unreachability is folded into [`StatusReport::Down`] by
/// the fetchers: "can't tell" and "down" are operationally equivalent to the
/// caller of this crate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StatusReport {
    /// The platform reports itself healthy.
    Ok,
    /// The platform is down or unreachable.
    Down {
        /// Human-readable cause. May be empty when the status page signalled
        /// trouble without listing an incident.
        problem: String,
    },
}

impl StatusReport {
    pub fn down(problem: impl Into<String>) -> Self {
        StatusReport::Down {
            problem: problem.into(),
        }
    }

    pub fn is_down(&self) -> bool {
        matches!(self, StatusReport::Down { .. })
    }
}

// ============================================================================
// PlatformStatus (aggregated output)
// ============================================================================

/// One platform's resolved status within a poll cycle, shaped for the API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlatformStatus {
    /// Display name of the platform.
    pub name: String,
    /// `"OK"` or `"DOWN"`.
    pub status: StatusLabel,
    /// Problem description; [`NO_PROBLEM`] when the status is OK.
    pub problem_description: String,
    /// Link to the platform's status page, for display.
    pub status_page: String,
}

/// Wire label for a resolved status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StatusLabel {
    #[serde(rename = "OK")]
    Ok,
    #[serde(rename = "DOWN")]
    Down,
}

impl PlatformStatus {
    /// Merge a platform record with the report its fetcher produced.
    pub fn new(platform: &Platform, report: StatusReport) -> Self {
        let (status, problem_description) = match report {
            StatusReport::Ok => (StatusLabel::Ok, NO_PROBLEM.to_string()),
            StatusReport::Down { problem } => (StatusLabel::Down, problem),
        };
        Self {
            name: platform.name.clone(),
            status,
            problem_description,
            status_page: platform.url.clone(),
        }
    }
}
