//! Reader-based decoder implementation.
//!
//! _Requires Cargo feature `std`._

use std::{boxed::Box, io::Read};

use crate::content::Content;

use super::{Decoder, Error, Source, SourceError};

extern crate std;

/// A [`Source`] pulling bytes from a reader.
///
/// Reads are not buffered. Wrap unbuffered readers, such as files, in a
/// [`std::io::BufReader`] first.
///
/// _Requires Cargo feature `std`._
#[derive(Debug)]
pub struct IoSource<R> {
    inner: R,
}

impl<R: Read> IoSource<R> {
    pub fn new(inner: R) -> Self {
        Self { inner }
    }

    pub fn get_ref(&self) -> &R {
        &self.inner
    }

    pub fn into_inner(self) -> R {
        self.inner
    }
}

impl<R: Read> Source for IoSource<R> {
    fn fill_exact(&mut self, buf: &mut [u8]) -> Result<(), SourceError> {
        let mut read = 0;

        while read < buf.len() {
            match self.inner.read(&mut buf[read..]) {
                Ok(0) => return Err(SourceError::EndOfStream { read }),
                Ok(n) => read += n,
                Err(e) if e.kind() == std::io::ErrorKind::Interrupted => {}
                Err(e) => return Err(SourceError::Failed(Box::new(e))),
            }
        }

        Ok(())
    }
}

/// Decode a document from a reader.
///
/// The reader is left positioned after the file CRC.
///
/// This method is also re-exported as `fitfile::avec::decode_reader`.
///
/// _Requires Cargo feature `std`._
pub fn decode(r: &mut impl Read) -> Result<Content, Error> {
    Decoder::new(IoSource::new(r)).decode()
}

#[cfg(test)]
mod tests {
    use std::io;

    use super::*;

    /// Reader yielding one byte per call, interrupting every other call.
    struct Trickle<'a> {
        data: &'a [u8],
        interrupt: bool,
    }

    impl Read for Trickle<'_> {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            self.interrupt = !self.interrupt;
            if self.interrupt {
                return Err(io::ErrorKind::Interrupted.into());
            }

            let Some((first, rest)) = self.data.split_first() else {
                return Ok(0);
            };

            buf[0] = *first;
            self.data = rest;
            Ok(1)
        }
    }

    #[test]
    fn fill_across_short_reads() {
        let mut source = IoSource::new(Trickle {
            data: &[1, 2, 3],
            interrupt: false,
        });

        let mut buf = [0; 2];
        source.fill_exact(&mut buf).unwrap();
        assert_eq!(buf, [1, 2]);

        let mut buf = [0; 2];
        assert!(matches!(
            source.fill_exact(&mut buf),
            Err(SourceError::EndOfStream { read: 1 })
        ));
    }

    #[test]
    fn reader_failure() {
        struct Broken;

        impl Read for Broken {
            fn read(&mut self, _: &mut [u8]) -> io::Result<usize> {
                Err(io::Error::other("unplugged"))
            }
        }

        let mut source = IoSource::new(Broken);
        assert!(matches!(
            source.fill_exact(&mut [0; 1]),
            Err(SourceError::Failed(_))
        ));
    }
}
