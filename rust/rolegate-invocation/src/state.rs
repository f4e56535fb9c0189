use crate::RolegateInvocationError;
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

/// Progress of an invocation.
///
/// States are ordered and a handle only ever moves to a later state.
/// `Starting`, `Running`, `Waiting` and `Finalizing` are driven by the
/// service body; the runner moves the handle to `Completed` once the body
/// has returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum State {
    /// The handle exists but the body has not started.
    Idle = 0,
    /// The body is setting up.
    Starting = 1,
    /// The body is making progress.
    Running = 2,
    /// The body is blocked on something outside of itself.
    Waiting = 3,
    /// The body has computed its result and is about to finish.
    Finalizing = 4,
    /// The body has returned. Results may be read.
    Completed = 5,
}

impl State {
    /// Every state, in order.
    pub const ALL: [State; 6] = [
        State::Idle,
        State::Starting,
        State::Running,
        State::Waiting,
        State::Finalizing,
        State::Completed,
    ];

    /// Returns true for [`State::Completed`].
    pub fn is_terminal(self) -> bool {
        self == State::Completed
    }
}

impl From<State> for u8 {
    fn from(state: State) -> Self {
        state as u8
    }
}

impl TryFrom<u8> for State {
    type Error = RolegateInvocationError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        State::ALL
            .get(value as usize)
            .copied()
            .ok_or(RolegateInvocationError::InvalidState(value))
    }
}

impl Display for State {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            State::Idle => "idle",
            State::Starting => "starting",
            State::Running => "running",
            State::Waiting => "waiting",
            State::Finalizing => "finalizing",
            State::Completed => "completed",
        };
        f.write_str(name)
    }
}
