//! Error taxonomy for the pipeline and the upstream client.
//!
//! Out-of-range readings are not represented here: the outlier filter treats
//! them as a normal case and forward-fills. Empty payloads are not errors
//! either, the client returns an empty record list.

use thiserror::Error;

/// A sample that cannot enter the pipeline. The normalizer logs it and drops
/// the sample; it never escapes a poll loop.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PipelineError {
    #[error("record has no timestamp field")]
    MissingTimestamp,

    #[error("unparseable timestamp '{0}'")]
    UnparseableTimestamp(String),
}

/// Failure talking to the weather backend. Caught at the poll-loop boundary.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request to {url} failed")]
    Request {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("request to {url} returned status {status}")]
    Status {
        url: String,
        status: reqwest::StatusCode,
    },

    #[error("response from {url} is not valid JSON")]
    Decode {
        url: String,
        #[source]
        source: reqwest::Error,
    },
}
