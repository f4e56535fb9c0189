use pretty_assertions::assert_eq;
use rolegate_invocation::{
    Arguments, Duplex, RolegateInvocationError, RunnerOptions, Service, ServiceContext,
    ServiceError, State, invoke,
};
use std::io::{BufRead, Cursor, Write};
use std::sync::Arc;
use std::sync::mpsc;
use std::time::Duration;

const PATIENCE: Option<Duration> = Some(Duration::from_secs(5));

/// Echoes each line of input back, upper-cased, and returns the number of
/// lines it saw.
struct Shout;

impl Service for Shout {
    fn name(&self) -> &str {
        "shout"
    }

    fn run(&self, context: &ServiceContext) -> Result<(), ServiceError> {
        context.set_state(State::Running)?;
        let mut lines = 0i32;
        loop {
            let mut line = String::new();
            if context.input()?.read_line(&mut line)? == 0 {
                break;
            }
            writeln!(context.output()?, "{}", line.trim_end().to_uppercase())?;
            lines += 1;
        }
        context.set_state(State::Finalizing)?;
        context.set_result(lines.to_be_bytes().to_vec())?;
        Ok(())
    }
}

/// Blocks until released, so tests can observe intermediate states.
struct Gate {
    release: parking_lot::Mutex<mpsc::Receiver<()>>,
}

impl Service for Gate {
    fn name(&self) -> &str {
        "gate"
    }

    fn run(&self, context: &ServiceContext) -> Result<(), ServiceError> {
        context.set_state(State::Waiting)?;
        self.release
            .lock()
            .recv()
            .map_err(|error| ServiceError::Failed(error.to_string()))?;
        context.set_result(context.arguments().vector().join(" ").into_bytes())?;
        Ok(())
    }
}

struct Failing;

impl Service for Failing {
    fn name(&self) -> &str {
        "failing"
    }

    fn run(&self, _context: &ServiceContext) -> Result<(), ServiceError> {
        Err(ServiceError::Failed("no luck".into()))
    }
}

struct Panicking;

impl Service for Panicking {
    fn name(&self) -> &str {
        "panicking"
    }

    fn run(&self, _context: &ServiceContext) -> Result<(), ServiceError> {
        panic!("boom")
    }
}

#[derive(Clone, Default)]
struct Sink(Arc<parking_lot::Mutex<Vec<u8>>>);

impl Write for Sink {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.lock().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

#[test_log::test]
fn it_runs_a_body_over_duplex_streams() -> anyhow::Result<()> {
    let sink = Sink::default();
    let handle = invoke(
        Arc::new(Shout),
        Arguments::default(),
        Some(Duplex::new(Cursor::new(b"hello\nworld\n".to_vec()), sink.clone())),
        &RunnerOptions::default(),
    )?;

    assert_eq!(handle.join(PATIENCE), State::Completed);
    assert_eq!(handle.int_result()?, 2);
    assert_eq!(handle.failure(), None);
    assert_eq!(String::from_utf8(sink.0.lock().clone())?, "HELLO\nWORLD\n");
    Ok(())
}

#[test_log::test]
fn it_returns_before_the_body_finishes() -> anyhow::Result<()> {
    let (release, receiver) = mpsc::channel();
    let handle = invoke(
        Arc::new(Gate {
            release: parking_lot::Mutex::new(receiver),
        }),
        Arguments::default().with_arg("let").with_arg("go"),
        None,
        &RunnerOptions::default(),
    )?;

    assert_eq!(
        handle.wait_for_state(Some(State::Waiting), PATIENCE),
        State::Waiting
    );
    assert!(matches!(
        handle.string_result(),
        Err(RolegateInvocationError::NotCompleted {
            state: State::Waiting
        })
    ));

    release.send(())?;
    assert_eq!(handle.join(PATIENCE), State::Completed);
    assert_eq!(handle.string_result()?, "let go");
    Ok(())
}

#[test_log::test]
fn it_completes_bodies_that_fail() -> anyhow::Result<()> {
    let handle = invoke(
        Arc::new(Failing),
        Arguments::default(),
        None,
        &RunnerOptions::default(),
    )?;

    assert_eq!(handle.join(PATIENCE), State::Completed);
    assert_eq!(handle.failure().as_deref(), Some("Service failed: no luck"));
    assert!(matches!(
        handle.bytes_result(),
        Err(RolegateInvocationError::NoResult)
    ));
    Ok(())
}

#[test_log::test]
fn it_completes_bodies_that_panic() -> anyhow::Result<()> {
    let options = RunnerOptions {
        thread_prefix: "test-".into(),
        stack_size: Some(256 * 1024),
    };
    let handle = invoke(Arc::new(Panicking), Arguments::default(), None, &options)?;

    assert_eq!(handle.join(PATIENCE), State::Completed);
    assert_eq!(handle.failure().as_deref(), Some("boom"));
    Ok(())
}

#[test_log::test(tokio::test)]
async fn it_can_be_awaited() -> anyhow::Result<()> {
    let (release, receiver) = mpsc::channel();
    let handle = invoke(
        Arc::new(Gate {
            release: parking_lot::Mutex::new(receiver),
        }),
        Arguments::default().with_arg("done"),
        None,
        &RunnerOptions::default(),
    )?;

    release.send(())?;
    tokio::time::timeout(Duration::from_secs(5), handle.completed()).await?;
    assert_eq!(handle.state(), State::Completed);
    assert_eq!(handle.string_result()?, "done");
    Ok(())
}
