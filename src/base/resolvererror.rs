use std::{io, sync::Arc};
use thiserror::Error;

use crate::executor::ExecutorKind;

/// Errors raised while parsing targets, looking up hosts or driving the
/// resolver lifecycle.
///
/// Only [`ResolverError::HostUnresolvable`] is transient; every other
/// variant reports a caller bug or a malformed target and is never retried.
#[derive(Debug, Error, Clone)]
pub enum ResolverError {
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Invalid port in address: segment={segment:?}, port={port:?}")]
    InvalidPort { segment: String, port: String },

    #[error("Host not resolvable: {host}")]
    HostUnresolvable {
        host: String,
        #[source]
        source: Arc<io::Error>,
    },

    #[error("Illegal state: {0}")]
    IllegalState(&'static str),

    #[error("Shared {kind} executor released without a matching acquire")]
    ResourceMismatch { kind: ExecutorKind },

    #[error("Failed to create shared {kind} executor")]
    ExecutorUnavailable {
        kind: ExecutorKind,
        #[source]
        source: Arc<io::Error>,
    },
}

/// Coarse classification of a [`ResolverError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    InvalidArgument,
    HostUnresolvable,
    IllegalState,
    Resource,
}

impl ResolverError {
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::InvalidArgument(message.into())
    }

    pub fn invalid_port(segment: impl Into<String>, port: impl Into<String>) -> Self {
        Self::InvalidPort {
            segment: segment.into(),
            port: port.into(),
        }
    }

    pub fn host_unresolvable(host: impl Into<String>, source: io::Error) -> Self {
        Self::HostUnresolvable {
            host: host.into(),
            source: Arc::new(source),
        }
    }

    /// Lookup returned successfully but without a single address.
    pub fn no_addresses(host: impl Into<String>) -> Self {
        Self::host_unresolvable(
            host,
            io::Error::new(io::ErrorKind::NotFound, "No addresses returned"),
        )
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidArgument(_) | Self::InvalidPort { .. } => ErrorKind::InvalidArgument,
            Self::HostUnresolvable { .. } => ErrorKind::HostUnresolvable,
            Self::IllegalState(_) => ErrorKind::IllegalState,
            Self::ResourceMismatch { .. } | Self::ExecutorUnavailable { .. } => ErrorKind::Resource,
        }
    }

    /// Whether a resolution attempt failing with this error should be
    /// rescheduled.
    pub fn is_retryable(&self) -> bool {
        self.kind() == ErrorKind::HostUnresolvable
    }
}
