//! Request context.

/// Per-request call context threaded through every collaborator seam.
///
/// Carries the caller identity used by the rights gates. Deadlines and
/// cancellation follow the runtime's model: dropping the request future
/// aborts in-flight operations before any event is published or downlink
/// task enqueued.
#[derive(Debug, Clone, Default)]
pub struct Context {
    /// Identity of the caller, as established by the transport layer.
    pub caller: String,
}

impl Context {
    /// A context for the given caller identity.
    #[must_use]
    pub fn new(caller: impl Into<String>) -> Self {
        Self {
            caller: caller.into(),
        }
    }
}
