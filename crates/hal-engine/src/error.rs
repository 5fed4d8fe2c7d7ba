//! # Engine Errors
//!
//! This module defines the error taxonomy used throughout the engine.
//! By centralizing error definitions, we ensure consistent classification
//! across the resolver, renderer, and client proxy.
//!
//! # Fatal vs Non-Fatal
//! The engine distinguishes two failure classes:
//!
//! - **Fatal**: malformed metadata ([`MetadataError`]) and root-level failures
//!   ([`ResolveError`]) abort the whole `resolve` call and propagate as a
//!   single typed error.
//! - **Non-fatal**: a failure scoped to one relation (accessor error, remote
//!   fetch error, per-relation timeout) degrades to an
//!   [`ErrorEntry`](crate::response::ErrorEntry) attached to the affected
//!   node. Sibling relations are unaffected and the response stays
//!   well-formed.

use crate::response::ErrorEntry;

/// Boxed error type used at the domain accessor seam.
///
/// Resource implementations carry their own error types; they cross into the
/// engine as a boxed `std::error::Error` so the engine can preserve the cause
/// chain without knowing the concrete type.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Upper bound on the number of cause-chain entries copied into an
/// [`ErrorEntry`]. Deeper chains are cut off with a truncation marker so a
/// pathological error source cannot blow up the response size.
pub const MAX_CAUSE_DEPTH: usize = 8;

/// Errors raised while building or resolving resource type descriptors.
///
/// These indicate a malformed type registration and are always fatal; they
/// surface at startup (builder validation) or on first use of a type (lazy
/// target-type resolution).
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum MetadataError {
    #[error("duplicate relation `{relation}` on resource type `{type_name}`")]
    DuplicateRelation { type_name: String, relation: String },
    #[error("duplicate template variable `{variable}` on relation `{relation}`")]
    DuplicateVariable { relation: String, variable: String },
    #[error("unknown resource type `{0}`")]
    UnknownType(String),
}

/// Fatal failure of a `resolve` call.
///
/// Everything else that goes wrong during resolution is captured as an
/// [`ErrorEntry`] on the affected node instead.
#[derive(Debug, thiserror::Error)]
pub enum ResolveError {
    /// The root resource's own state could not be computed.
    #[error("root state could not be computed")]
    RootState(#[source] BoxError),
    /// The root resource declared itself non-linkable. Only resources reached
    /// through an embedded relation may omit a self link.
    #[error("root resource has no self link")]
    RootSelfLink,
    /// The root's own computation was still pending when the deadline
    /// expired. Relations overtaken by the deadline degrade to timeout
    /// entries, but without a root node there is no response to attach
    /// them to.
    #[error("root resource was still resolving when the deadline expired")]
    RootDeadline,
    /// A resource type involved in the resolution had no valid descriptor.
    #[error(transparent)]
    Metadata(#[from] MetadataError),
}

/// Failure reported by a [`Fetcher`](crate::client::Fetcher) implementation.
///
/// The transport layer itself is out of scope for the engine; this type is
/// the boundary contract. `upstream` carries error entries parsed from the
/// remote error body, when the fetcher could decode them.
#[derive(Debug, Clone, thiserror::Error)]
#[error("transport failure for `{uri}`: {message}")]
pub struct TransportError {
    pub uri: String,
    pub status: Option<u16>,
    pub message: String,
    pub upstream: Vec<ErrorEntry>,
}

impl TransportError {
    pub fn new(uri: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            uri: uri.into(),
            status: None,
            message: message.into(),
            upstream: Vec::new(),
        }
    }

    pub fn with_status(mut self, status: u16) -> Self {
        self.status = Some(status);
        self
    }

    pub fn with_upstream(mut self, entries: Vec<ErrorEntry>) -> Self {
        self.upstream = entries;
        self
    }
}

/// Client-side failure while navigating a remote resource.
///
/// Carries the original request context so callers can decide whether the
/// failing relation was mandatory for their own logic. The type is `Clone`
/// because the proxy caches the outcome of each relation (success or
/// failure) and replays it on repeated accessor calls.
#[derive(Debug, Clone, thiserror::Error)]
#[error("remote resource error for `{uri}`: {detail}")]
pub struct RemoteResourceError {
    /// The URI of the failed request, or the proxy's own self href for
    /// failures that never reached the network (e.g. an unexpanded template).
    pub uri: String,
    pub status: Option<u16>,
    pub detail: String,
    /// Error entries decoded from the upstream error document, if any.
    pub upstream: Vec<ErrorEntry>,
}

impl RemoteResourceError {
    pub fn new(uri: impl Into<String>, detail: impl Into<String>) -> Self {
        Self {
            uri: uri.into(),
            status: None,
            detail: detail.into(),
            upstream: Vec::new(),
        }
    }
}

impl From<TransportError> for RemoteResourceError {
    fn from(e: TransportError) -> Self {
        Self {
            uri: e.uri,
            status: e.status,
            detail: e.message,
            upstream: e.upstream,
        }
    }
}

/// Walks an error's source chain into displayable strings, bounded by
/// [`MAX_CAUSE_DEPTH`].
pub fn cause_chain(err: &(dyn std::error::Error + 'static)) -> Vec<String> {
    let mut causes = Vec::new();
    let mut current = err.source();
    while let Some(cause) = current {
        if causes.len() == MAX_CAUSE_DEPTH {
            causes.push("(cause chain truncated)".to_string());
            break;
        }
        causes.push(cause.to_string());
        current = cause.source();
    }
    causes
}

/// Normalizes a failure into a relation-scoped [`ErrorEntry`].
///
/// `about` links the entry back to the offending resource when its identity
/// is known.
pub fn error_entry(
    title: impl Into<String>,
    status: u16,
    err: &(dyn std::error::Error + 'static),
    about: Option<String>,
) -> ErrorEntry {
    ErrorEntry {
        title: title.into(),
        status,
        detail: Some(err.to_string()),
        about,
        causes: cause_chain(err),
    }
}
