//! # statusdeck-core
//!
//! The status-fetching layer of statusdeck: fetchers that normalize the
//! status-page conventions of Atlassian Statuspage, Instatus, Incident.io and
//! plain HTTP endpoints into one uniform [`StatusReport`], a closed
//! [`Registry`] mapping fetcher tags to implementations, and an
//! [`Aggregator`] that polls every registered platform concurrently while
//! containing per-platform failures.
//!
//! Persistence and the HTTP surface live in `statusdeck-store` and
//! `statusdeck-http`; this crate only needs a list of [`Platform`] records to
//! poll and returns a list of [`PlatformStatus`] entries.

pub mod aggregate;
pub mod error;
pub mod fetcher;
pub mod report;

pub use aggregate::Aggregator;
pub use error::FetchError;
pub use fetcher::{FetchConfig, Registry, StatusFetcher};
pub use report::{FetcherKind, Platform, PlatformStatus, StatusLabel, StatusReport};

// Prelude module
pub mod prelude {
    pub use crate::aggregate::Aggregator;
    pub use crate::error::FetchError;
    pub use crate::fetcher::{FetchConfig, Registry, StatusFetcher};
    pub use crate::report::{FetcherKind, Platform, PlatformStatus, StatusLabel, StatusReport};
}
