use crate::address::ResolvedEndpoint;
use crate::base::status::Status;

/// Receives the results of a [`NameResolver`](super::NameResolver).
///
/// Owned by the caller; the resolver keeps only a weak reference, taken at
/// `start` and dropped at `shutdown`. Callbacks run on a worker thread with
/// no resolver lock held, so implementations may call back into the
/// resolver (`refresh`, `shutdown`).
pub trait Listener: Send + Sync {
    /// A fresh, complete endpoint list. Replaces any previous one.
    fn on_addresses(&self, endpoints: Vec<ResolvedEndpoint>);

    /// Resolution failed. For lookup failures the status is
    /// [`Code::Unavailable`](crate::base::Code::Unavailable) and a retry
    /// has already been scheduled.
    fn on_error(&self, status: Status);
}
