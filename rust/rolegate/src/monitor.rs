use crate::{RegistryState, RoleId, RolegateRegistryError, ServiceId, UserId};
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

/// Locally unique identifier of a [`ReferenceMonitor`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MonitorId(pub u64);

impl Display for MonitorId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "monitor:{}", self.0)
    }
}

/// Where a [`ReferenceMonitor`] is in its decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MonitorState {
    /// No decision has been attempted.
    Idle,
    /// A decision is underway.
    Pending,
    /// Access was granted.
    Authorized,
    /// Access was refused.
    Unauthorized,
}

/// Decides whether one user may invoke one service.
///
/// A user may invoke a service when at least one of the user's roles is
/// authorized for it. A monitor decides once and then remembers the
/// outcome.
#[derive(Debug, Clone)]
pub struct ReferenceMonitor {
    id: MonitorId,
    user: UserId,
    service: ServiceId,
    state: MonitorState,
    granted_by: Option<RoleId>,
}

impl ReferenceMonitor {
    /// Creates an undecided monitor.
    pub fn new(id: MonitorId, user: UserId, service: ServiceId) -> Self {
        Self {
            id,
            user,
            service,
            state: MonitorState::Idle,
            granted_by: None,
        }
    }

    /// This monitor's identifier.
    pub fn id(&self) -> MonitorId {
        self.id
    }

    /// The requesting user.
    pub fn user(&self) -> UserId {
        self.user
    }

    /// The requested service.
    pub fn service(&self) -> ServiceId {
        self.service
    }

    /// The monitor's progress.
    pub fn state(&self) -> MonitorState {
        self.state
    }

    /// The role through which access was granted, once authorized.
    pub fn granted_by(&self) -> Option<RoleId> {
        self.granted_by
    }

    /// Renders the decision against a registry snapshot.
    ///
    /// The user's roles are consulted in ascending order and the first one
    /// authorized for the service grants access. A user or service that does
    /// not exist is an error, never a refusal; the monitor then stays
    /// undecided.
    pub fn decide(&mut self, state: &RegistryState) -> Result<bool, RolegateRegistryError> {
        match self.state {
            MonitorState::Authorized => return Ok(true),
            MonitorState::Unauthorized => return Ok(false),
            MonitorState::Idle | MonitorState::Pending => {}
        }

        self.state = MonitorState::Pending;
        if let Err(error) = state
            .users
            .require(self.user)
            .and_then(|_| state.services.require(self.service))
        {
            self.state = MonitorState::Idle;
            return Err(error);
        }

        self.granted_by = state
            .membership
            .forward_neighbors(self.user.0)
            .find(|role| state.authorization.contains(*role, self.service.0))
            .map(RoleId);

        let granted = self.granted_by.is_some();
        self.state = if granted {
            MonitorState::Authorized
        } else {
            MonitorState::Unauthorized
        };

        tracing::debug!(
            monitor = %self.id,
            user = %self.user,
            service = %self.service,
            granted,
            "Access decided"
        );
        Ok(granted)
    }
}
