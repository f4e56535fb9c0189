use std::io::{BufReader, BufWriter, Read, Write};

/// Buffered message source handed to a service body.
pub type Input = BufReader<Box<dyn Read + Send>>;

/// Buffered message sink handed to a service body.
pub type Output = BufWriter<Box<dyn Write + Send>>;

/// A pair of byte streams connecting a caller to a service body.
///
/// The body reads the caller's messages from the input and writes replies
/// to the output. Anything left buffered in the output is flushed when the
/// body returns.
pub struct Duplex {
    pub(crate) input: Input,
    pub(crate) output: Output,
}

impl Duplex {
    /// Wraps a reader and a writer in buffers.
    pub fn new<R, W>(reader: R, writer: W) -> Self
    where
        R: Read + Send + 'static,
        W: Write + Send + 'static,
    {
        Self {
            input: BufReader::new(Box::new(reader)),
            output: BufWriter::new(Box::new(writer)),
        }
    }
}

impl std::fmt::Debug for Duplex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Duplex").finish_non_exhaustive()
    }
}
