//! Fetch-layer errors.
//!
//! Only configuration and parse problems surface as errors. Network
//! unreachability is not represented here: fetchers convert it into a
//! `DOWN` report, so a poll cycle never fails because an endpoint is slow
//! or offline.

/// Errors a fetcher (or the registry) can produce.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    /// The tag is not a member of the registered fetcher set. Validated at
    /// the mutation boundary; contained to a single platform if it ever
    /// reaches the aggregator.
    #[error("unknown fetcher type: {0}")]
    UnknownFetcherType(String),

    /// The endpoint URL could not be parsed into an origin to poll.
    #[error("invalid endpoint url {url}: {reason}")]
    InvalidUrl { url: String, reason: String },

    /// The remote replied, but not with the JSON shape this fetcher needs.
    #[error("unexpected response shape from {url}: {reason}")]
    UnexpectedShape { url: String, reason: String },

    /// The shared HTTP client could not be constructed.
    #[error("failed to build http client: {0}")]
    Client(#[source] reqwest::Error),
}
