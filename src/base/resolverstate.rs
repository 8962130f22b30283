/// Lifecycle of a name resolver.
///
/// Transitions only move forward: `Created -> Started -> ShutDown`, or
/// straight from `Created` to `ShutDown`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ResolverState {
    /// Constructed, no listener registered yet.
    #[default]
    Created,

    /// A listener is registered and resolutions may run.
    Started,

    /// Terminal. No further notifications are delivered.
    ShutDown,
}

impl ResolverState {
    pub fn is_started(&self) -> bool {
        matches!(self, ResolverState::Started)
    }

    pub fn is_shut_down(&self) -> bool {
        matches!(self, ResolverState::ShutDown)
    }
}
