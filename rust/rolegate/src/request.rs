use crate::{ServiceId, UserId};
use rolegate_invocation::{Arguments, Duplex};
use std::io::{Read, Write};

/// A user's request to invoke a service, as passed to
/// [`Registry::request`](crate::Registry::request).
#[derive(Debug)]
pub struct Request {
    pub(crate) user: UserId,
    pub(crate) service: ServiceId,
    pub(crate) arguments: Arguments,
    pub(crate) streams: Option<Duplex>,
}

impl Request {
    /// A request by `user` to invoke `service`, with no arguments and no
    /// streams.
    pub fn new(user: UserId, service: ServiceId) -> Self {
        Self {
            user,
            service,
            arguments: Arguments::default(),
            streams: None,
        }
    }

    /// Appends a positional argument.
    pub fn arg(mut self, value: impl Into<String>) -> Self {
        self.arguments = self.arguments.with_arg(value);
        self
    }

    /// Sets a named option.
    pub fn option(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.arguments = self.arguments.with_option(key, value);
        self
    }

    /// Replaces all arguments.
    pub fn arguments(mut self, arguments: Arguments) -> Self {
        self.arguments = arguments;
        self
    }

    /// Connects a byte transport that the service body reads messages from
    /// and writes replies to.
    pub fn connect<R, W>(mut self, reader: R, writer: W) -> Self
    where
        R: Read + Send + 'static,
        W: Write + Send + 'static,
    {
        self.streams = Some(Duplex::new(reader, writer));
        self
    }

    /// The requesting user.
    pub fn user(&self) -> UserId {
        self.user
    }

    /// The requested service.
    pub fn service(&self) -> ServiceId {
        self.service
    }
}
