//! Fetcher abstraction and registry
//!
//! A [`StatusFetcher`] maps a status-page endpoint URL to a normalized
//! [`StatusReport`]. One implementation exists per supported status-page
//! convention; the [`Registry`] is the closed lookup table from
//! [`FetcherKind`] tags to those implementations, built once at startup.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::de::DeserializeOwned;

use crate::error::FetchError;
use crate::report::{FetcherKind, StatusReport};

pub mod atlassian;
pub mod generic;
pub mod incident_io;
pub mod instatus;

pub use atlassian::AtlassianFetcher;
pub use generic::GenericHttpFetcher;
pub use incident_io::IncidentIoFetcher;
pub use instatus::InstatusFetcher;

/// Maps a status-page endpoint URL to a normalized [`StatusReport`].
///
/// Contract: the only side effect is the outbound request. Transport
/// failures (timeout, refused connection, no response) are reported as
/// `Down`, never as `Err`; `Err` is reserved for configuration and parse
/// problems (see [`FetchError`]).
#[async_trait]
pub trait StatusFetcher: Send + Sync {
    async fn fetch(&self, endpoint: &str) -> Result<StatusReport, FetchError>;
}

impl std::fmt::Debug for dyn StatusFetcher + '_ {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("StatusFetcher")
    }
}

/// Tuning for outbound status requests.
#[derive(Debug, Clone)]
pub struct FetchConfig {
    /// Per-request timeout. One hanging endpoint only costs its own wait.
    pub timeout: Duration,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(10),
        }
    }
}

// ============================================================================
// Shared HTTP client
// ============================================================================

/// Outcome of a JSON GET that did not fail the fetch outright.
pub(crate) enum Fetched<T> {
    /// The remote replied with a parseable body.
    Json(T),
    /// The remote could not be reached; the payload is the problem
    /// description to report as `Down`.
    Unreachable(String),
}

/// The reqwest client shared by all fetchers, plus the timeout it was built
/// with so transport problems can name it.
#[derive(Clone)]
pub(crate) struct StatusClient {
    http: reqwest::Client,
    timeout: Duration,
}

impl StatusClient {
    fn new(timeout: Duration) -> Result<Self, FetchError> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(FetchError::Client)?;
        Ok(Self { http, timeout })
    }

    /// GET `url` and decode the body as JSON.
    ///
    /// Unknown fields are ignored by serde; a missing required field is an
    /// [`FetchError::UnexpectedShape`], as is a non-2xx reply from what
    /// should be a status API.
    pub(crate) async fn get_json<T: DeserializeOwned>(
        &self,
        url: &str,
    ) -> Result<Fetched<T>, FetchError> {
        let response = match self.http.get(url).send().await {
            Ok(response) => response,
            Err(err) => return Ok(Fetched::Unreachable(self.describe(&err))),
        };

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::UnexpectedShape {
                url: url.to_string(),
                reason: format!("HTTP status {status}"),
            });
        }

        match response.json::<T>().await {
            Ok(body) => Ok(Fetched::Json(body)),
            Err(err) if err.is_decode() => Err(FetchError::UnexpectedShape {
                url: url.to_string(),
                reason: err.to_string(),
            }),
            Err(err) => Ok(Fetched::Unreachable(self.describe(&err))),
        }
    }

    /// GET `url` without interpreting the body. Redirects are followed by
    /// the client; the returned response carries the final status code.
    pub(crate) async fn get(&self, url: &str) -> Result<reqwest::Response, String> {
        self.http.get(url).send().await.map_err(|err| self.describe(&err))
    }

    /// Human-readable cause for a transport failure.
    pub(crate) fn describe(&self, err: &reqwest::Error) -> String {
        if err.is_timeout() {
            format!("Request timed out after {} seconds", self.timeout.as_secs())
        } else if err.is_connect() {
            "No response received from the endpoint".to_string()
        } else {
            format!("Request failed: {err}")
        }
    }
}

/// Reduce an endpoint URL to the origin its status API hangs off of,
/// preserving scheme and port.
pub(crate) fn page_origin(endpoint: &str) -> Result<String, FetchError> {
    let url = reqwest::Url::parse(endpoint).map_err(|err| FetchError::InvalidUrl {
        url: endpoint.to_string(),
        reason: err.to_string(),
    })?;
    let host = url.host_str().ok_or_else(|| FetchError::InvalidUrl {
        url: endpoint.to_string(),
        reason: "missing host".to_string(),
    })?;
    let mut origin = format!("{}://{}", url.scheme(), host);
    if let Some(port) = url.port() {
        origin.push_str(&format!(":{port}"));
    }
    Ok(origin)
}

/// Host (with port, if any) of an endpoint URL. Incident.io proxy paths
/// embed it.
pub(crate) fn page_host(endpoint: &str) -> Result<String, FetchError> {
    let url = reqwest::Url::parse(endpoint).map_err(|err| FetchError::InvalidUrl {
        url: endpoint.to_string(),
        reason: err.to_string(),
    })?;
    let host = url.host_str().ok_or_else(|| FetchError::InvalidUrl {
        url: endpoint.to_string(),
        reason: "missing host".to_string(),
    })?;
    Ok(match url.port() {
        Some(port) => format!("{host}:{port}"),
        None => host.to_string(),
    })
}

// ============================================================================
// Registry
// ============================================================================

/// The closed mapping from fetcher tags to implementations.
///
/// Single source of truth for "what tags are valid": the HTTP layer
/// validates platform mutations against [`Registry::tags`], so the
/// aggregator only ever sees resolvable kinds and poll-time failures are
/// network or parse failures, never configuration errors.
pub struct Registry {
    fetchers: HashMap<FetcherKind, Arc<dyn StatusFetcher>>,
}

impl Registry {
    /// Build the lookup table and the shared HTTP client.
    pub fn new(config: FetchConfig) -> Result<Self, FetchError> {
        let client = StatusClient::new(config.timeout)?;
        let mut fetchers: HashMap<FetcherKind, Arc<dyn StatusFetcher>> = HashMap::new();
        fetchers.insert(
            FetcherKind::Atlassian,
            Arc::new(AtlassianFetcher::new(client.clone())),
        );
        fetchers.insert(
            FetcherKind::Instatus,
            Arc::new(InstatusFetcher::new(client.clone())),
        );
        fetchers.insert(
            FetcherKind::Incident,
            Arc::new(IncidentIoFetcher::new(client.clone())),
        );
        fetchers.insert(
            FetcherKind::Generic,
            Arc::new(GenericHttpFetcher::new(client)),
        );
        Ok(Self { fetchers })
    }

    /// The registered tags, in advertised order.
    pub fn tags(&self) -> Vec<&'static str> {
        FetcherKind::ALL.iter().map(|kind| kind.as_str()).collect()
    }

    /// Look up the fetcher for a wire tag.
    pub fn resolve(&self, tag: &str) -> Result<&dyn StatusFetcher, FetchError> {
        self.resolve_kind(tag.parse()?)
    }

    /// Look up the fetcher for an already-parsed kind. The table is total by
    /// construction; a miss is still reported as an error rather than a
    /// panic so a bad record only costs its own platform.
    pub fn resolve_kind(&self, kind: FetcherKind) -> Result<&dyn StatusFetcher, FetchError> {
        self.fetchers
            .get(&kind)
            .map(|fetcher| fetcher.as_ref())
            .ok_or_else(|| FetchError::UnknownFetcherType(kind.as_str().to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_advertised_tag_resolves() {
        let registry = Registry::new(FetchConfig::default()).unwrap();
        for tag in registry.tags() {
            assert!(registry.resolve(tag).is_ok(), "tag {tag} did not resolve");
        }
    }

    #[test]
    fn unknown_tag_fails_resolution() {
        let registry = Registry::new(FetchConfig::default()).unwrap();
        let err = registry.resolve("betteruptime").unwrap_err();
        assert!(matches!(err, FetchError::UnknownFetcherType(_)));
    }

    #[test]
    fn origin_preserves_scheme_and_port() {
        assert_eq!(
            page_origin("http://127.0.0.1:8080/some/page").unwrap(),
            "http://127.0.0.1:8080"
        );
        assert_eq!(
            page_origin("https://status.example.com/").unwrap(),
            "https://status.example.com"
        );
    }

    #[test]
    fn origin_rejects_garbage() {
        assert!(matches!(
            page_origin("not a url"),
            Err(FetchError::InvalidUrl { .. })
        ));
    }

    #[test]
    fn host_includes_port() {
        assert_eq!(page_host("http://127.0.0.1:8080").unwrap(), "127.0.0.1:8080");
        assert_eq!(
            page_host("https://status.example.com/x").unwrap(),
            "status.example.com"
        );
    }
}
