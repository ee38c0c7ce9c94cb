use thiserror::Error;

/// Failure of a single HTTP exchange. Every variant is retried.
#[derive(Error, Debug)]
pub enum TransportError {
    #[error("request to {url} failed: {source}")]
    Request {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("{url} returned HTTP {status}")]
    Status { url: String, status: u16 },

    #[error("{url} returned a body that is not JSON: {reason}")]
    Body { url: String, reason: String },

    #[error("invalid header {name:?}: {reason}")]
    Header { name: String, reason: String },
}

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("gave up on {url} after {attempts} attempt(s): {last}")]
    RetriesExhausted {
        url: String,
        attempts: u32,
        #[source]
        last: TransportError,
    },

    #[error("invalid URL {url}: {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("unexpected {what} response shape: {source}")]
    Shape {
        what: &'static str,
        #[source]
        source: serde_json::Error,
    },

    #[error("{operation} returned GraphQL errors: {messages}")]
    Graphql {
        operation: &'static str,
        messages: String,
    },
}
