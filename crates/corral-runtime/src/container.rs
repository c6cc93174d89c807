//! Container record and the lifecycle state machine.

use corral_common::types::{ContainerId, ContainerState, ContainerSummary};

/// A lifecycle operation that acts on an existing record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    /// Launch through the external runtime.
    Start,
    /// Signal the running container to terminate.
    Stop,
    /// Remove the record and its bundle.
    Delete,
    /// Run an extra command inside the running container.
    Exec,
}

impl Operation {
    /// Returns the lowercase operation name used in logs.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Start => "start",
            Self::Stop => "stop",
            Self::Delete => "delete",
            Self::Exec => "exec",
        }
    }
}

/// Returns whether `op` is legal from `state`.
#[must_use]
pub const fn permits(state: ContainerState, op: Operation) -> bool {
    matches!(
        (state, op),
        (
            ContainerState::Created | ContainerState::Stopped,
            Operation::Start | Operation::Delete
        ) | (ContainerState::Running, Operation::Stop | Operation::Exec)
    )
}

/// Returns the state reached by applying `op` to `state`.
///
/// `None` means the transition is illegal, or, for [`Operation::Delete`],
/// that the record leaves the registry.
#[must_use]
pub const fn next_state(state: ContainerState, op: Operation) -> Option<ContainerState> {
    if !permits(state, op) {
        return None;
    }
    match op {
        Operation::Start => Some(ContainerState::Running),
        Operation::Stop => Some(ContainerState::Stopped),
        Operation::Exec => Some(state),
        Operation::Delete => None,
    }
}

/// A registered container.
///
/// Everything except `state` is fixed at creation.
#[derive(Debug, Clone)]
pub struct ContainerRecord {
    id: ContainerId,
    name: String,
    image: String,
    command: String,
    state: ContainerState,
    created_at: String,
}

impl ContainerRecord {
    /// Creates a record in the `Created` state.
    #[must_use]
    pub fn new(id: ContainerId, name: String, image: String, command: String) -> Self {
        Self {
            id,
            name,
            image,
            command,
            state: ContainerState::Created,
            created_at: chrono::Utc::now().to_rfc3339(),
        }
    }

    /// Unique identifier, also the runtime's container name.
    #[must_use]
    pub const fn id(&self) -> &ContainerId {
        &self.id
    }

    /// Display label, used as the container hostname.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Root filesystem path.
    #[must_use]
    pub fn image(&self) -> &str {
        &self.image
    }

    /// Shell command run as the entrypoint.
    #[must_use]
    pub fn command(&self) -> &str {
        &self.command
    }

    /// Current lifecycle state.
    #[must_use]
    pub const fn state(&self) -> ContainerState {
        self.state
    }

    /// Returns whether `op` may be applied to this record now.
    #[must_use]
    pub const fn permits(&self, op: Operation) -> bool {
        permits(self.state, op)
    }

    /// Applies a state-changing transition.
    ///
    /// Returns `false` and leaves the record untouched when the transition
    /// is illegal. Callers run the external side effect first and only then
    /// commit the transition here.
    pub fn transition(&mut self, op: Operation) -> bool {
        match next_state(self.state, op) {
            Some(next) => {
                tracing::debug!(id = %self.id, from = %self.state, to = %next, op = op.as_str(), "state transition");
                self.state = next;
                true
            }
            None => false,
        }
    }

    /// Snapshot used by `list`.
    #[must_use]
    pub fn summary(&self) -> ContainerSummary {
        ContainerSummary {
            id: self.id.clone(),
            name: self.name.clone(),
            image: self.image.clone(),
            status: self.state,
            created_at: self.created_at.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record() -> ContainerRecord {
        ContainerRecord::new(
            ContainerId::new("ctr-test"),
            "web".into(),
            "/images/alpine".into(),
            "echo hi".into(),
        )
    }

    #[test]
    fn new_record_is_created() {
        let r = record();
        assert_eq!(r.state(), ContainerState::Created);
        assert_eq!(r.name(), "web");
        assert_eq!(r.command(), "echo hi");
    }

    #[test]
    fn transition_table_matches_lifecycle() {
        use ContainerState::{Created, Running, Stopped};

        assert_eq!(next_state(Created, Operation::Start), Some(Running));
        assert_eq!(next_state(Stopped, Operation::Start), Some(Running));
        assert_eq!(next_state(Running, Operation::Start), None);

        assert_eq!(next_state(Running, Operation::Stop), Some(Stopped));
        assert_eq!(next_state(Created, Operation::Stop), None);
        assert_eq!(next_state(Stopped, Operation::Stop), None);

        assert_eq!(next_state(Running, Operation::Exec), Some(Running));
        assert_eq!(next_state(Created, Operation::Exec), None);

        assert!(permits(Created, Operation::Delete));
        assert!(permits(Stopped, Operation::Delete));
        assert!(!permits(Running, Operation::Delete));
    }

    #[test]
    fn illegal_transition_leaves_state() {
        let mut r = record();
        assert!(!r.transition(Operation::Stop));
        assert_eq!(r.state(), ContainerState::Created);

        assert!(r.transition(Operation::Start));
        assert!(r.transition(Operation::Stop));
        assert!(!r.transition(Operation::Stop));
        assert_eq!(r.state(), ContainerState::Stopped);
    }

    #[test]
    fn summary_reflects_current_state() {
        let mut r = record();
        assert!(r.transition(Operation::Start));
        let s = r.summary();
        assert_eq!(s.id.as_str(), "ctr-test");
        assert_eq!(s.image, "/images/alpine");
        assert_eq!(s.status, ContainerState::Running);
    }
}
