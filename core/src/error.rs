//! Error types for the Cobbler API client.
//!
//! # Design
//! Transport failures keep the transport's own error as the source so callers
//! can downcast to the concrete type (for `UreqTransport`, a `ureq::Error`).
//! An XML-RPC fault is a well-formed answer from the server and gets its own
//! variant, separate from responses that could not be decoded at all.

use thiserror::Error;

use crate::http::TransportError;

/// Errors returned by `CobblerClient` and the envelope decoders.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The request never produced an HTTP response.
    #[error("{0}")]
    Transport(#[source] TransportError),

    /// The server answered with a non-2xx status.
    #[error("HTTP {status}: {body}")]
    HttpError { status: u16, body: String },

    /// The server answered with an XML-RPC `<fault>`.
    #[error("remote fault {code}: {message}")]
    Fault { code: i32, message: String },

    /// The response body did not decode into the expected shape.
    #[error("deserialization failed: {0}")]
    Deserialization(String),

    /// A step of a multi-call workflow was answered with `false`.
    #[error("server rejected {operation}")]
    Rejected { operation: String },

    /// Client configuration is incomplete.
    #[error("configuration error: {0}")]
    Config(String),
}
