use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

/// The kinds of entity a registry keeps track of.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityKind {
    /// A subject that can be assigned to roles.
    User,
    /// A named grouping through which users gain authorization.
    Role,
    /// A protected operation.
    Service,
}

impl Display for EntityKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            EntityKind::User => "user",
            EntityKind::Role => "role",
            EntityKind::Service => "service",
        })
    }
}

/// A typed, 32-bit entity identifier.
pub trait Identifier: Copy + Ord + Display + From<u32> + Into<u32> {
    /// The kind of entity this identifier names.
    const KIND: EntityKind;
}

macro_rules! identifier {
    ($(#[$meta:meta])* $name:ident => $kind:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub u32);

        impl Identifier for $name {
            const KIND: EntityKind = EntityKind::$kind;
        }

        impl From<u32> for $name {
            fn from(value: u32) -> Self {
                Self(value)
            }
        }

        impl From<$name> for u32 {
            fn from(id: $name) -> Self {
                id.0
            }
        }

        impl Display for $name {
            fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}:{}", EntityKind::$kind, self.0)
            }
        }
    };
}

identifier! {
    /// Identifies a user.
    UserId => User
}

identifier! {
    /// Identifies a role.
    RoleId => Role
}

identifier! {
    /// Identifies a service.
    ServiceId => Service
}
