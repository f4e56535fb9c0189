use crate::{RoleId, ServiceId};
use serde::{Deserialize, Serialize};

/// An opaque tag qualifying an authorization. It is carried alongside the
/// authorization but never interpreted by the registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AccessType(pub i32);

impl From<i32> for AccessType {
    fn from(value: i32) -> Self {
        Self(value)
    }
}

/// The payload of an authorization: `role` may invoke `service` with the
/// given access type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Right {
    /// The authorized role.
    pub role: RoleId,
    /// The service it may invoke.
    pub service: ServiceId,
    /// Opaque qualifier.
    pub access_type: AccessType,
}

impl Right {
    /// Creates a right.
    pub fn new(role: RoleId, service: ServiceId, access_type: impl Into<AccessType>) -> Self {
        Self {
            role,
            service,
            access_type: access_type.into(),
        }
    }
}
