#![warn(missing_docs)]

//! A role-based access-control registry.
//!
//! A [`Registry`] tracks three kinds of entity (users, roles and services)
//! and two many-to-many relations between them:
//!
//! - *membership* assigns roles to users, and
//! - *authorization* lets roles invoke services, qualified by an opaque
//!   [`AccessType`].
//!
//! A user may invoke a service when at least one of its roles is authorized
//! for it. Each [`Request`] is decided by a fresh [`ReferenceMonitor`]; if
//! access is granted the service body starts on its own thread and the caller
//! gets back a [`Handle`] to follow its progress and read its result.
//!
//! ```
//! use rolegate::{Registry, Request};
//! use rolegate::invocation::{Service, ServiceContext, ServiceError, State};
//! use std::sync::Arc;
//!
//! struct Clock;
//!
//! impl Service for Clock {
//!     fn name(&self) -> &str {
//!         "clock"
//!     }
//!
//!     fn run(&self, context: &ServiceContext) -> Result<(), ServiceError> {
//!         context.set_result(1_700_000_000i64.to_be_bytes().to_vec())?;
//!         Ok(())
//!     }
//! }
//!
//! let registry = Registry::default();
//! let ada = registry.create_user("ada").unwrap();
//! let staff = registry.create_role("staff").unwrap();
//! let clock = registry.register_service(Arc::new(Clock)).unwrap();
//!
//! registry.assign_role(ada, staff).unwrap();
//! registry.authorize_role(staff, clock, 1).unwrap();
//!
//! let handle = registry.request(Request::new(ada, clock)).unwrap();
//! assert_eq!(handle.join(None), State::Completed);
//! assert_eq!(handle.long_result().unwrap(), 1_700_000_000);
//! ```

pub use rolegate_invocation as invocation;
pub use rolegate_invocation::Handle;
pub use rolegate_relation as relation;

mod ids;
pub use ids::*;

mod right;
pub use right::*;

mod error;
pub use error::*;

mod config;
pub use config::*;

mod directory;
pub use directory::*;

mod state;
pub use state::*;

mod verify;
pub use verify::*;

mod monitor;
pub use monitor::*;

mod request;
pub use request::*;

mod registry;
pub use registry::*;

mod observability;
pub use observability::*;
