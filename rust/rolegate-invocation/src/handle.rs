use crate::{Duplex, Input, Output, ResultBody, RolegateInvocationError, State};
use bytes::Bytes;
use parking_lot::{Condvar, MappedMutexGuard, Mutex, MutexGuard};
use rolegate_common::{Deadline, Duration};
use std::io::{Read, Write};
use std::sync::Arc;
use tokio::sync::watch;

struct Progress {
    state: State,
    /// Number of transitions so far; lets "any change" waiters tell a real
    /// transition apart from a spurious wakeup.
    transitions: u64,
    result: Option<ResultBody>,
    failure: Option<String>,
}

struct Shared {
    progress: Mutex<Progress>,
    signal: Condvar,
    watch: watch::Sender<State>,
    input: Mutex<Option<Input>>,
    output: Mutex<Option<Output>>,
}

/// The caller's view of one service invocation.
///
/// A `Handle` is cheap to clone; every clone observes the same invocation.
/// The caller and the service body each hold one.
#[derive(Clone)]
pub struct Handle(Arc<Shared>);

impl Default for Handle {
    fn default() -> Self {
        Self::new()
    }
}

impl Handle {
    /// Creates a handle in [`State::Idle`] with no result and no transport.
    pub fn new() -> Self {
        let (watch, _) = watch::channel(State::Idle);
        Self(Arc::new(Shared {
            progress: Mutex::new(Progress {
                state: State::Idle,
                transitions: 0,
                result: None,
                failure: None,
            }),
            signal: Condvar::new(),
            watch,
            input: Mutex::new(None),
            output: Mutex::new(None),
        }))
    }

    /// The current state.
    pub fn state(&self) -> State {
        self.0.progress.lock().state
    }

    /// Moves the handle to `next` and wakes every waiter.
    ///
    /// Moving to the current state is a no-op; moving to an earlier state
    /// is rejected with [`RolegateInvocationError::Rollback`].
    pub fn set_state(&self, next: State) -> Result<(), RolegateInvocationError> {
        let mut progress = self.0.progress.lock();
        let current = progress.state;

        if next < current {
            return Err(RolegateInvocationError::Rollback {
                from: current,
                to: next,
            });
        }
        if next == current {
            return Ok(());
        }

        progress.state = next;
        progress.transitions += 1;
        self.0.watch.send_replace(next);
        self.0.signal.notify_all();

        tracing::trace!(from = %current, to = %next, "Handle transition");
        Ok(())
    }

    /// Publishes the invocation's result. A result published later
    /// replaces an earlier one, up until the handle completes.
    pub fn set_result(&self, body: impl Into<ResultBody>) -> Result<(), RolegateInvocationError> {
        let mut progress = self.0.progress.lock();
        if progress.state.is_terminal() {
            return Err(RolegateInvocationError::AlreadyCompleted);
        }
        progress.result = Some(body.into());
        Ok(())
    }

    /// Publishes a streamed result. `declared` is the number of bytes the
    /// stream will yield, if known.
    pub fn set_stream<R>(
        &self,
        reader: R,
        declared: Option<usize>,
    ) -> Result<(), RolegateInvocationError>
    where
        R: Read + Send + 'static,
    {
        self.set_result(ResultBody::Stream {
            reader: Box::new(reader),
            declared,
        })
    }

    /// Records why the service body failed. The first failure is kept.
    pub(crate) fn record_failure(&self, reason: String) {
        let mut progress = self.0.progress.lock();
        if progress.failure.is_none() {
            progress.failure = Some(reason);
        }
    }

    /// Why the service body failed, if it did.
    pub fn failure(&self) -> Option<String> {
        self.0.progress.lock().failure.clone()
    }

    /// Blocks until the handle reaches `target`, or until its next
    /// transition of any kind when `target` is `None`.
    ///
    /// Gives up once `timeout` has elapsed; `None` waits indefinitely.
    /// Either way, returns the state observed on return. Returns at once
    /// when the awaited transition can no longer happen: `target` already
    /// lies behind the current state, or the handle has completed.
    pub fn wait_for_state(&self, target: Option<State>, timeout: Option<Duration>) -> State {
        let deadline = Deadline::after(timeout);
        let mut progress = self.0.progress.lock();
        let seen = progress.transitions;

        loop {
            let settled = match target {
                Some(target) => progress.state >= target,
                None => progress.transitions != seen || progress.state.is_terminal(),
            };
            if settled {
                break;
            }

            match deadline.instant() {
                Some(instant) => {
                    if self.0.signal.wait_until(&mut progress, instant).timed_out() {
                        break;
                    }
                }
                None => self.0.signal.wait(&mut progress),
            }
        }

        progress.state
    }

    /// Blocks until the handle completes, or `timeout` elapses.
    pub fn join(&self, timeout: Option<Duration>) -> State {
        self.wait_for_state(Some(State::Completed), timeout)
    }

    /// Waits for the next transition without blocking the executor.
    ///
    /// Resolves at once with the current state if the handle has already
    /// completed.
    pub async fn changed(&self) -> State {
        let mut receiver = self.0.watch.subscribe();
        if receiver.borrow().is_terminal() {
            return *receiver.borrow();
        }
        // The sender lives as long as `self`, so this never observes a
        // closed channel.
        let _ = receiver.changed().await;
        *receiver.borrow_and_update()
    }

    /// Waits for the handle to complete without blocking the executor.
    pub async fn completed(&self) {
        let mut receiver = self.0.watch.subscribe();
        let _ = receiver.wait_for(|state| state.is_terminal()).await;
    }

    /// A receiver that observes every future state of this handle.
    pub fn subscribe(&self) -> watch::Receiver<State> {
        self.0.watch.subscribe()
    }

    /// Connects a byte transport to the handle, replacing any earlier one.
    pub fn connect(&self, duplex: Duplex) {
        let Duplex { input, output } = duplex;
        *self.0.input.lock() = Some(input);
        *self.0.output.lock() = Some(output);
    }

    /// Returns true when a transport is connected.
    pub fn is_connected(&self) -> bool {
        self.0.input.lock().is_some()
    }

    pub(crate) fn input(&self) -> Result<MappedMutexGuard<'_, Input>, RolegateInvocationError> {
        MutexGuard::try_map(self.0.input.lock(), Option::as_mut)
            .map_err(|_| RolegateInvocationError::NotConnected("input"))
    }

    pub(crate) fn output(&self) -> Result<MappedMutexGuard<'_, Output>, RolegateInvocationError> {
        MutexGuard::try_map(self.0.output.lock(), Option::as_mut)
            .map_err(|_| RolegateInvocationError::NotConnected("output"))
    }

    /// Flushes any buffered output. Succeeds trivially when nothing is
    /// connected.
    pub(crate) fn flush_output(&self) -> std::io::Result<()> {
        match self.0.output.lock().as_mut() {
            Some(output) => output.flush(),
            None => Ok(()),
        }
    }

    /// Reads the result of a completed handle with `read`, checking its
    /// declared size against `width` first when given. The result is
    /// released only when `read` succeeds.
    fn read_result<T>(
        &self,
        width: Option<usize>,
        read: impl FnOnce(&mut ResultBody) -> Result<T, RolegateInvocationError>,
    ) -> Result<T, RolegateInvocationError> {
        let mut progress = self.0.progress.lock();
        if !progress.state.is_terminal() {
            return Err(RolegateInvocationError::NotCompleted {
                state: progress.state,
            });
        }

        let body = progress
            .result
            .as_mut()
            .ok_or(RolegateInvocationError::NoResult)?;
        if let Some(expected) = width {
            let declared = body.declared_len();
            if declared != expected as i64 {
                return Err(RolegateInvocationError::WrongWidth { expected, declared });
            }
        }

        let value = read(body)?;
        progress.result = None;
        Ok(value)
    }

    fn fixed<const N: usize>(&self) -> Result<[u8; N], RolegateInvocationError> {
        self.read_result(Some(N), |body| Ok(body.read_fixed::<N>()?))
    }

    /// Reads a one byte result.
    pub fn byte_result(&self) -> Result<i8, RolegateInvocationError> {
        Ok(i8::from_be_bytes(self.fixed::<1>()?))
    }

    /// Reads a big-endian two byte result.
    pub fn short_result(&self) -> Result<i16, RolegateInvocationError> {
        Ok(i16::from_be_bytes(self.fixed::<2>()?))
    }

    /// Reads a big-endian four byte result.
    pub fn int_result(&self) -> Result<i32, RolegateInvocationError> {
        Ok(i32::from_be_bytes(self.fixed::<4>()?))
    }

    /// Reads a big-endian eight byte result.
    pub fn long_result(&self) -> Result<i64, RolegateInvocationError> {
        Ok(i64::from_be_bytes(self.fixed::<8>()?))
    }

    /// Reads a big-endian IEEE 754 single precision result.
    pub fn float_result(&self) -> Result<f32, RolegateInvocationError> {
        Ok(f32::from_be_bytes(self.fixed::<4>()?))
    }

    /// Reads a big-endian IEEE 754 double precision result.
    pub fn double_result(&self) -> Result<f64, RolegateInvocationError> {
        Ok(f64::from_be_bytes(self.fixed::<8>()?))
    }

    /// Reads the whole result as raw bytes.
    pub fn bytes_result(&self) -> Result<Bytes, RolegateInvocationError> {
        self.read_result(None, |body| Ok(Bytes::from(body.read_all()?)))
    }

    /// Reads the whole result as UTF-8 text.
    pub fn string_result(&self) -> Result<String, RolegateInvocationError> {
        self.read_result(None, |body| {
            String::from_utf8(body.read_all()?).map_err(|error| {
                body.unread(error.as_bytes().to_vec());
                error.into()
            })
        })
    }

    /// Hands the result over as a reader, whatever its declared size.
    pub fn stream_result(&self) -> Result<Box<dyn Read + Send>, RolegateInvocationError> {
        self.read_result(None, |body| {
            let taken = std::mem::replace(body, ResultBody::Sized(Bytes::new()));
            Ok(taken.into_reader())
        })
    }
}

impl std::fmt::Debug for Handle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let progress = self.0.progress.lock();
        f.debug_struct("Handle")
            .field("state", &progress.state)
            .field("result", &progress.result)
            .field("failure", &progress.failure)
            .finish()
    }
}
