#![warn(missing_docs)]

//! Execution handles for service invocations.
//!
//! Once a caller has been authorized to invoke a [`Service`], [`invoke`]
//! schedules the service body on its own thread and hands back a [`Handle`]
//! straight away. The handle is the caller's view of the running body:
//!
//! - **Progress**: the body moves the handle through the [`State`]s
//!   `Idle → Starting → Running → Waiting → Finalizing → Completed`. States
//!   only ever move forward. Callers block on a transition with
//!   [`Handle::wait_for_state`] / [`Handle::join`], or await one with
//!   [`Handle::changed`] / [`Handle::completed`].
//! - **Messages**: a handle may be wired to a byte transport with
//!   [`Handle::connect`]; the body then reads and writes it through its
//!   [`ServiceContext`].
//! - **Results**: before finishing, the body may publish a result. Once the
//!   handle is [`State::Completed`] the caller reads it back with one of the
//!   typed getters ([`Handle::int_result`], [`Handle::string_result`], …).
//!
//! ```
//! use rolegate_invocation::{
//!     Arguments, RunnerOptions, Service, ServiceContext, ServiceError, State, invoke,
//! };
//! use std::sync::Arc;
//!
//! struct Answer;
//!
//! impl Service for Answer {
//!     fn name(&self) -> &str {
//!         "answer"
//!     }
//!
//!     fn run(&self, context: &ServiceContext) -> Result<(), ServiceError> {
//!         context.set_state(State::Running)?;
//!         context.set_result(42i32.to_be_bytes().to_vec())?;
//!         Ok(())
//!     }
//! }
//!
//! let handle = invoke(
//!     Arc::new(Answer),
//!     Arguments::default(),
//!     None,
//!     &RunnerOptions::default(),
//! )
//! .unwrap();
//!
//! handle.join(None);
//! assert_eq!(handle.int_result().unwrap(), 42);
//! ```

mod error;
pub use error::*;

mod state;
pub use state::*;

mod result;
pub use result::*;

mod stream;
pub use stream::*;

mod handle;
pub use handle::*;

mod service;
pub use service::*;

mod runner;
pub use runner::*;
