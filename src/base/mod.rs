//! Base types and error handling.
//!
//! Provides foundational types shared by every resolver component:
//! - [`ResolverError`]: error taxonomy for parsing, lookup and lifecycle
//! - [`Status`]: the failure report delivered to resolver listeners
//! - [`ResolverState`]: lifecycle states of a name resolver

pub mod context;
pub mod resolvererror;
pub mod resolverstate;
pub mod status;

pub use resolvererror::{ErrorKind, ResolverError};
pub use resolverstate::ResolverState;
pub use status::{Code, Status};
