use bytes::Bytes;
use std::fmt::{Debug, Formatter};
use std::io::{Cursor, ErrorKind, Read};

/// A result published by a service body.
pub enum ResultBody {
    /// A result held in memory. Its declared size is its length.
    Sized(Bytes),
    /// A result read lazily from a stream.
    Stream {
        /// Source of the result bytes.
        reader: Box<dyn Read + Send>,
        /// Number of bytes the stream will yield, if known.
        declared: Option<usize>,
    },
}

impl ResultBody {
    /// Declared size of the result in bytes, or `-1` when it is an
    /// unbounded stream.
    pub fn declared_len(&self) -> i64 {
        match self {
            ResultBody::Sized(bytes) => bytes.len() as i64,
            ResultBody::Stream {
                declared: Some(declared),
                ..
            } => *declared as i64,
            ResultBody::Stream { declared: None, .. } => -1,
        }
    }

    /// Reads exactly `N` bytes from the front of the result.
    ///
    /// On failure the result is left as it was: bytes already pulled from a
    /// stream are pushed back in front of it.
    pub(crate) fn read_fixed<const N: usize>(&mut self) -> std::io::Result<[u8; N]> {
        let mut buffer = [0u8; N];
        match self {
            ResultBody::Sized(bytes) => match bytes.get(..N) {
                Some(prefix) => buffer.copy_from_slice(prefix),
                None => return Err(ErrorKind::UnexpectedEof.into()),
            },
            ResultBody::Stream { reader, .. } => {
                let mut filled = 0;
                while filled < N {
                    match reader.read(&mut buffer[filled..]) {
                        Ok(0) => break,
                        Ok(read) => filled += read,
                        Err(error) if error.kind() == ErrorKind::Interrupted => {}
                        Err(error) => {
                            self.unread(buffer[..filled].to_vec());
                            return Err(error);
                        }
                    }
                }
                if filled < N {
                    self.unread(buffer[..filled].to_vec());
                    return Err(ErrorKind::UnexpectedEof.into());
                }
            }
        }
        Ok(buffer)
    }

    /// Reads the whole result.
    ///
    /// A stream that fails part way keeps the bytes read so far in front of
    /// whatever it has left.
    pub(crate) fn read_all(&mut self) -> std::io::Result<Vec<u8>> {
        match self {
            ResultBody::Sized(bytes) => Ok(bytes.to_vec()),
            ResultBody::Stream { reader, .. } => {
                let mut buffer = Vec::new();
                match reader.read_to_end(&mut buffer) {
                    Ok(_) => Ok(buffer),
                    Err(error) => {
                        self.unread(buffer);
                        Err(error)
                    }
                }
            }
        }
    }

    /// Puts `prefix` back in front of a stream. Sized results are never
    /// consumed by a read, so they are left alone.
    pub(crate) fn unread(&mut self, prefix: Vec<u8>) {
        if prefix.is_empty() {
            return;
        }
        if let ResultBody::Stream { reader, .. } = self {
            let rest = std::mem::replace(reader, Box::new(std::io::empty()));
            *reader = Box::new(Cursor::new(prefix).chain(rest));
        }
    }

    /// Converts the result into a reader over its bytes.
    pub fn into_reader(self) -> Box<dyn Read + Send> {
        match self {
            ResultBody::Sized(bytes) => Box::new(Cursor::new(bytes)),
            ResultBody::Stream { reader, .. } => reader,
        }
    }
}

impl From<Bytes> for ResultBody {
    fn from(bytes: Bytes) -> Self {
        ResultBody::Sized(bytes)
    }
}

impl From<Vec<u8>> for ResultBody {
    fn from(bytes: Vec<u8>) -> Self {
        ResultBody::Sized(Bytes::from(bytes))
    }
}

impl Debug for ResultBody {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResultBody")
            .field("declared_len", &self.declared_len())
            .finish_non_exhaustive()
    }
}
