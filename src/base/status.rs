//! Failure reports delivered to resolver listeners.

use crate::base::resolvererror::{ErrorKind, ResolverError};
use std::fmt;

/// Status codes understood by the RPC channel (gRPC numbering).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Code {
    Ok = 0,
    InvalidArgument = 3,
    Internal = 13,
    Unavailable = 14,
}

impl Code {
    pub fn as_i32(&self) -> i32 {
        *self as i32
    }
}

/// Outcome reported to [`Listener::on_error`](crate::resolver::Listener::on_error).
#[derive(Debug, Clone)]
pub struct Status {
    code: Code,
    description: String,
    cause: Option<ResolverError>,
}

impl Status {
    pub fn new(code: Code, description: impl Into<String>) -> Self {
        Self {
            code,
            description: description.into(),
            cause: None,
        }
    }

    /// Name resolution failed transiently; the channel should treat the
    /// target as temporarily unreachable.
    pub fn unavailable(cause: ResolverError) -> Self {
        Self::new(Code::Unavailable, "Name resolution failed").with_cause(cause)
    }

    /// Maps an error onto the status code the channel expects for it.
    pub fn from_error(err: ResolverError) -> Self {
        match err.kind() {
            ErrorKind::HostUnresolvable => Self::unavailable(err),
            ErrorKind::InvalidArgument => {
                Self::new(Code::InvalidArgument, err.to_string()).with_cause(err)
            }
            ErrorKind::IllegalState | ErrorKind::Resource => {
                Self::new(Code::Internal, err.to_string()).with_cause(err)
            }
        }
    }

    pub fn with_cause(mut self, cause: ResolverError) -> Self {
        self.cause = Some(cause);
        self
    }

    pub fn code(&self) -> Code {
        self.code
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn cause(&self) -> Option<&ResolverError> {
        self.cause.as_ref()
    }

    pub fn is_ok(&self) -> bool {
        self.code == Code::Ok
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}: {}", self.code, self.description)?;
        if let Some(cause) = &self.cause {
            write!(f, " ({cause})")?;
        }
        Ok(())
    }
}
