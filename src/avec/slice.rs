//! Slice-based decoder implementation.

use crate::content::Content;

use super::{Decoder, Error, Source, SourceError};

/// A slice is consumed from the front as bytes are taken.
impl Source for &[u8] {
    fn fill_exact(&mut self, buf: &mut [u8]) -> Result<(), SourceError> {
        let Some((head, tail)) = self.split_at_checked(buf.len()) else {
            let read = self.len();
            *self = &[];
            return Err(SourceError::EndOfStream { read });
        };

        buf.copy_from_slice(head);
        *self = tail;
        Ok(())
    }
}

/// Decode a document from a slice.
///
/// Bytes following the file CRC are ignored.
///
/// This method is also re-exported as `fitfile::avec::decode_slice`.
pub fn decode(r: &[u8]) -> Result<Content, Error> {
    Decoder::new(r).decode()
}
