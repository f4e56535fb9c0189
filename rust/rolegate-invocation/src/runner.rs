use crate::{Arguments, Duplex, Handle, RolegateInvocationError, Service, ServiceContext, State};
use serde::{Deserialize, Serialize};
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;

/// Prefix given to service thread names when none is configured.
pub const DEFAULT_THREAD_PREFIX: &str = "rolegate-service-";

/// How the runner starts service bodies.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunnerOptions {
    /// Prepended to the service name to name the body's thread.
    pub thread_prefix: String,
    /// Stack size of the body's thread in bytes. `None` uses the platform
    /// default.
    pub stack_size: Option<usize>,
}

impl Default for RunnerOptions {
    fn default() -> Self {
        Self {
            thread_prefix: DEFAULT_THREAD_PREFIX.to_string(),
            stack_size: None,
        }
    }
}

/// Starts `service` on a thread of its own and returns its handle at once.
///
/// When `streams` is given, it is connected to the handle before the body
/// starts. Once the body returns, any buffered output is flushed and the
/// handle is moved to [`State::Completed`]. A body that returns an error or
/// panics still completes; the reason is kept in [`Handle::failure`].
pub fn invoke(
    service: Arc<dyn Service>,
    arguments: Arguments,
    streams: Option<Duplex>,
    options: &RunnerOptions,
) -> Result<Handle, RolegateInvocationError> {
    let handle = Handle::new();
    if let Some(streams) = streams {
        handle.connect(streams);
    }

    let name = service.name().to_string();
    let mut builder =
        std::thread::Builder::new().name(format!("{}{}", options.thread_prefix, name));
    if let Some(stack_size) = options.stack_size {
        builder = builder.stack_size(stack_size);
    }

    let context = ServiceContext::new(handle.clone(), arguments);
    builder
        .spawn(move || run_to_completion(service.as_ref(), context))
        .map_err(|error| RolegateInvocationError::Spawn {
            service: name.clone(),
            reason: error.to_string(),
        })?;

    tracing::debug!(service = %name, "Service invoked");
    Ok(handle)
}

fn run_to_completion(service: &dyn Service, context: ServiceContext) {
    let handle = context.handle().clone();

    match catch_unwind(AssertUnwindSafe(|| service.run(&context))) {
        Ok(Ok(())) => {}
        Ok(Err(error)) => {
            tracing::warn!(service = service.name(), %error, "Service body failed");
            handle.record_failure(error.to_string());
        }
        Err(panic) => {
            let reason = panic_message(panic.as_ref());
            tracing::warn!(service = service.name(), %reason, "Service body panicked");
            handle.record_failure(reason);
        }
    }

    if let Err(error) = handle.flush_output() {
        tracing::warn!(service = service.name(), %error, "Unable to flush service output");
    }

    // Completed is the last state, so this cannot roll back.
    let _ = handle.set_state(State::Completed);
    tracing::debug!(service = service.name(), "Service completed");
}

fn panic_message(panic: &(dyn std::any::Any + Send)) -> String {
    if let Some(message) = panic.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message.clone()
    } else {
        "service body panicked".to_string()
    }
}
