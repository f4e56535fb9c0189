use crate::{Handle, Input, Output, ResultBody, RolegateInvocationError, ServiceError, State};
use parking_lot::MappedMutexGuard;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::io::Read;

/// A unit of behavior that may be invoked once a caller is authorized.
///
/// Implementations run on a thread of their own. A body reports progress
/// with [`ServiceContext::set_state`], may publish a result with
/// [`ServiceContext::set_result`], and returns when it is done; the runner
/// then completes the handle.
pub trait Service: Send + Sync {
    /// Human readable name of the service. Also used to name the thread the
    /// body runs on.
    fn name(&self) -> &str;

    /// The service body.
    fn run(&self, context: &ServiceContext) -> Result<(), ServiceError>;
}

/// Arguments passed to a service body: positional values and named options.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Arguments {
    vector: Vec<String>,
    map: BTreeMap<String, String>,
}

impl Arguments {
    /// Builds arguments from positional values and named options.
    pub fn new(vector: Vec<String>, map: BTreeMap<String, String>) -> Self {
        Self { vector, map }
    }

    /// Appends a positional argument.
    pub fn with_arg(mut self, value: impl Into<String>) -> Self {
        self.vector.push(value.into());
        self
    }

    /// Sets a named option.
    pub fn with_option(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.map.insert(key.into(), value.into());
        self
    }

    /// Positional arguments, in order.
    pub fn vector(&self) -> &[String] {
        &self.vector
    }

    /// Named options.
    pub fn map(&self) -> &BTreeMap<String, String> {
        &self.map
    }

    /// Looks up a named option.
    pub fn option(&self, key: &str) -> Option<&str> {
        self.map.get(key).map(String::as_str)
    }
}

/// Everything a service body can reach while it runs.
#[derive(Debug)]
pub struct ServiceContext {
    handle: Handle,
    arguments: Arguments,
}

impl ServiceContext {
    /// Creates a context for a body driving `handle`.
    pub fn new(handle: Handle, arguments: Arguments) -> Self {
        Self { handle, arguments }
    }

    /// The arguments of this invocation.
    pub fn arguments(&self) -> &Arguments {
        &self.arguments
    }

    /// The handle the caller observes.
    pub fn handle(&self) -> &Handle {
        &self.handle
    }

    /// See [`Handle::set_state`].
    pub fn set_state(&self, state: State) -> Result<(), RolegateInvocationError> {
        self.handle.set_state(state)
    }

    /// See [`Handle::set_result`].
    pub fn set_result(&self, body: impl Into<ResultBody>) -> Result<(), RolegateInvocationError> {
        self.handle.set_result(body)
    }

    /// See [`Handle::set_stream`].
    pub fn set_stream<R>(
        &self,
        reader: R,
        declared: Option<usize>,
    ) -> Result<(), RolegateInvocationError>
    where
        R: Read + Send + 'static,
    {
        self.handle.set_stream(reader, declared)
    }

    /// Locks the caller's message stream for reading.
    pub fn input(&self) -> Result<MappedMutexGuard<'_, Input>, RolegateInvocationError> {
        self.handle.input()
    }

    /// Locks the reply stream for writing.
    pub fn output(&self) -> Result<MappedMutexGuard<'_, Output>, RolegateInvocationError> {
        self.handle.output()
    }
}
