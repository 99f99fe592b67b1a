//! Error types.
//!
//! Trace-time failures are fatal and typed: a graph is either fully traced
//! or not produced at all. Host-time failures are never raised locally;
//! they come back as wire envelopes and decode into [`HostError`].

use thiserror::Error;

use crate::uri::Uri;
use crate::vocab;

/// A fatal failure while building a graph.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TraceError {
    /// The operator has no symbolic encoding for the given operand classes.
    #[error("operation {op:?} has no symbolic encoding for operand classes {operands:?}")]
    UnsupportedOperation {
        /// The operator name (`add`, `gte`, `if`, ...).
        op: &'static str,
        /// The classes of the offending operands.
        operands: Vec<Uri>,
    },

    /// A name was assigned twice within one context.
    #[error("name {0:?} is already assigned in this context")]
    NameCollision(String),

    /// A return-type name or a closure free variable could not be resolved.
    #[error("unable to resolve {0}")]
    Resolution(String),

    /// A graph with no assignments and no result cannot be finalized.
    #[error("cannot finalize an empty context")]
    EmptyContext,

    /// The context was already finalized and is read-only.
    #[error("context is frozen")]
    Frozen,
}

impl TraceError {
    /// Builds an [`TraceError::UnsupportedOperation`] for a binary operator.
    #[must_use]
    pub fn unsupported(op: &'static str, lhs: &Uri, rhs: &Uri) -> Self {
        Self::UnsupportedOperation {
            op,
            operands: vec![lhs.clone(), rhs.clone()],
        }
    }
}

/// A failure while decoding a wire payload.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    /// The payload used a type tag outside the recognized vocabulary.
    #[error("unrecognized type tag {0:?}")]
    UnknownTag(String),

    /// The tag was recognized but its payload had the wrong shape.
    #[error("malformed payload for {tag:?}: {reason}")]
    Malformed {
        /// The type tag whose payload was rejected.
        tag: String,
        /// What was wrong with it.
        reason: String,
    },
}

impl DecodeError {
    /// Builds a [`DecodeError::Malformed`].
    #[must_use]
    pub fn malformed(tag: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Malformed {
            tag: tag.into(),
            reason: reason.into(),
        }
    }
}

/// The closed set of error codes a host may return.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    /// The request was structurally invalid.
    BadRequest,
    /// The caller is authenticated but not permitted.
    Forbidden,
    /// The host failed internally.
    Internal,
    /// The subject does not support the requested method.
    MethodNotAllowed,
    /// The subject or key does not exist.
    NotFound,
    /// The operation is specified but not available on this host.
    NotImplemented,
    /// The operation did not complete in time.
    Timeout,
    /// The caller is not authenticated.
    Unauthorized,
}

impl ErrorCode {
    /// All codes, in wire-path order.
    pub const ALL: [ErrorCode; 8] = [
        ErrorCode::BadRequest,
        ErrorCode::Forbidden,
        ErrorCode::Internal,
        ErrorCode::MethodNotAllowed,
        ErrorCode::NotFound,
        ErrorCode::NotImplemented,
        ErrorCode::Timeout,
        ErrorCode::Unauthorized,
    ];

    /// Returns the wire path of this code.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorCode::BadRequest => "/error/bad_request",
            ErrorCode::Forbidden => "/error/forbidden",
            ErrorCode::Internal => "/error/internal",
            ErrorCode::MethodNotAllowed => "/error/method_not_allowed",
            ErrorCode::NotFound => "/error/not_found",
            ErrorCode::NotImplemented => "/error/not_implemented",
            ErrorCode::Timeout => "/error/timeout",
            ErrorCode::Unauthorized => "/error/unauthorized",
        }
    }

    /// Returns the code's wire path as a [`Uri`].
    #[must_use]
    pub fn uri(self) -> Uri {
        Uri::new(self.as_str())
    }

    /// Looks up a code by its wire path.
    #[must_use]
    pub fn from_path(path: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|code| code.as_str() == path)
    }

    /// Returns true if the given tag is under the error envelope prefix.
    #[must_use]
    pub fn is_error_tag(tag: &str) -> bool {
        tag == vocab::ERROR || tag.starts_with("/error/")
    }
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A typed, inspectable error returned by the execution host.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{code}: {message}")]
pub struct HostError {
    /// Which failure class the host reported.
    pub code: ErrorCode,
    /// The host's human-readable message.
    pub message: String,
}

impl HostError {
    /// Creates a host error with the given code and message.
    #[must_use]
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

/// A failure while handling a host response: either the host reported an
/// error envelope, or the payload could not be decoded.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ResponseError {
    /// The host returned an error envelope.
    #[error(transparent)]
    Host(#[from] HostError),

    /// The response payload could not be decoded.
    #[error(transparent)]
    Decode(#[from] DecodeError),
}
