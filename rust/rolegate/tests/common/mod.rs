#![allow(dead_code)]

use parking_lot::Mutex;
use rolegate::invocation::{Service, ServiceContext, ServiceError, State};
use std::io::{BufRead, Write};
use std::sync::Arc;

/// Keeps running statistics over numbers read one per line from its input.
///
/// After each number it writes `count sum min max mean` to its output. The
/// line `exit` (or the end of input) stops it; its result is the final sum,
/// eight bytes big-endian, as an `i64` or, with `type=double`, an `f64`.
/// It stays `Waiting` for as long as it reads.
pub struct Accumulator;

impl Service for Accumulator {
    fn name(&self) -> &str {
        "accumulator"
    }

    fn run(&self, context: &ServiceContext) -> Result<(), ServiceError> {
        let double = context
            .arguments()
            .option("type")
            .or_else(|| context.arguments().vector().first().map(String::as_str))
            .is_some_and(|kind| kind.eq_ignore_ascii_case("double"));

        context.set_state(State::Running)?;
        // Blocked on input from here until the stream ends.
        context.set_state(State::Waiting)?;

        let mut count = 0u64;
        let mut sum = 0f64;
        let mut min = f64::INFINITY;
        let mut max = f64::NEG_INFINITY;

        loop {
            let mut line = String::new();
            if context.input()?.read_line(&mut line)? == 0 {
                break;
            }
            let line = line.trim();
            if line.eq_ignore_ascii_case("exit") {
                break;
            }

            let value = line
                .parse::<f64>()
                .map_err(|error| ServiceError::Failed(format!("'{line}' is not a number: {error}")))?;
            count += 1;
            sum += value;
            min = min.min(value);
            max = max.max(value);

            let mut output = context.output()?;
            writeln!(output, "{count} {sum} {min} {max} {}", sum / count as f64)?;
            output.flush()?;
        }

        context.set_state(State::Finalizing)?;
        if double {
            context.set_result(sum.to_be_bytes().to_vec())?;
        } else {
            context.set_result((sum as i64).to_be_bytes().to_vec())?;
        }
        Ok(())
    }
}

/// Publishes a fixed result without reading any input.
pub struct Constant(pub &'static str, pub i32);

impl Service for Constant {
    fn name(&self) -> &str {
        self.0
    }

    fn run(&self, context: &ServiceContext) -> Result<(), ServiceError> {
        context.set_state(State::Running)?;
        context.set_result(self.1.to_be_bytes().to_vec())?;
        Ok(())
    }
}

/// A writer whose contents can be inspected after the body is done with it.
#[derive(Clone, Default)]
pub struct SharedBuffer(Arc<Mutex<Vec<u8>>>);

impl SharedBuffer {
    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.lock()).into_owned()
    }
}

impl Write for SharedBuffer {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.lock().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}
