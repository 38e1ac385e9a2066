//! Growable byte buffer with an embedded read cursor.
//!
//! Writes append at the end, reads advance `pos`. Already-read bytes stay in
//! place until [`Buffer::discard_consumed`] or [`Buffer::clear`] is called, so
//! a decoder can [`Buffer::rewind`] after a failed attempt.
//!
//! `Buffer` implements [`std::io::Read`] and [`std::io::Write`], which makes
//! it a synchronous byte channel for every codec in this crate.

use std::io;

use bytes::{Bytes, BytesMut};

use crate::error::{ProtocolError, Result};

/// Owned byte sequence plus a read cursor. Invariant: `pos <= data.len()`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Buffer {
    data: Vec<u8>,
    pos: usize,
}

impl Buffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            data: Vec::with_capacity(capacity),
            pos: 0,
        }
    }

    /// Wrap existing bytes; the cursor starts at the beginning.
    pub fn from_bytes(data: impl Into<Vec<u8>>) -> Self {
        Self {
            data: data.into(),
            pos: 0,
        }
    }

    /// Total number of stored bytes, read or not.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Current read cursor.
    pub fn position(&self) -> usize {
        self.pos
    }

    /// Bytes between the cursor and the end.
    pub fn remaining(&self) -> usize {
        self.data.len() - self.pos
    }

    pub fn has_remaining(&self) -> bool {
        self.pos < self.data.len()
    }

    /// Append raw bytes at the end.
    pub fn write_bytes(&mut self, bytes: &[u8]) {
        self.data.extend_from_slice(bytes);
    }

    pub fn push(&mut self, byte: u8) {
        self.data.push(byte);
    }

    /// Read exactly `n` bytes and advance the cursor.
    ///
    /// # Errors
    /// Returns `ProtocolError::UnexpectedEnd` if fewer than `n` bytes remain.
    /// The cursor is moved to the end in that case and the error carries the
    /// bytes that were still available.
    pub fn read_exact(&mut self, n: usize) -> Result<&[u8]> {
        let start = self.pos;
        if self.remaining() < n {
            self.pos = self.data.len();
            return Err(ProtocolError::UnexpectedEnd {
                expected: n,
                partial: self.data[start..].to_vec(),
            });
        }
        self.pos += n;
        Ok(&self.data[start..self.pos])
    }

    /// Read a single byte.
    pub fn read_byte(&mut self) -> Result<u8> {
        Ok(self.read_exact(1)?[0])
    }

    /// Consume and return everything after the cursor.
    pub fn take_remaining(&mut self) -> &[u8] {
        let start = self.pos;
        self.pos = self.data.len();
        &self.data[start..]
    }

    /// Unread bytes, without moving the cursor.
    pub fn peek(&self) -> &[u8] {
        &self.data[self.pos..]
    }

    /// Move the cursor back to `pos`.
    ///
    /// # Errors
    /// Returns `ProtocolError::Format` if `pos` lies past the stored bytes.
    pub fn rewind(&mut self, pos: usize) -> Result<()> {
        if pos > self.data.len() {
            return Err(ProtocolError::format(format!(
                "cannot rewind to {pos}, buffer holds {} bytes",
                self.data.len()
            )));
        }
        self.pos = pos;
        Ok(())
    }

    /// Drop bytes already read and shift the unread tail to the front.
    pub fn discard_consumed(&mut self) {
        self.data.drain(..self.pos);
        self.pos = 0;
    }

    /// Drop every byte and reset the cursor.
    pub fn clear(&mut self) {
        self.data.clear();
        self.pos = 0;
    }

    /// Whole contents, including bytes already read.
    pub fn as_slice(&self) -> &[u8] {
        &self.data
    }

    pub fn into_inner(self) -> Vec<u8> {
        self.data
    }

    pub fn freeze(self) -> Bytes {
        Bytes::from(self.data)
    }
}

impl From<Vec<u8>> for Buffer {
    fn from(data: Vec<u8>) -> Self {
        Self::from_bytes(data)
    }
}

impl From<&[u8]> for Buffer {
    fn from(data: &[u8]) -> Self {
        Self::from_bytes(data.to_vec())
    }
}

impl From<BytesMut> for Buffer {
    fn from(data: BytesMut) -> Self {
        Self::from_bytes(data.to_vec())
    }
}

impl io::Read for Buffer {
    fn read(&mut self, out: &mut [u8]) -> io::Result<usize> {
        let n = out.len().min(self.remaining());
        out[..n].copy_from_slice(&self.data[self.pos..self.pos + n]);
        self.pos += n;
        Ok(n)
    }
}

impl io::Write for Buffer {
    fn write(&mut self, bytes: &[u8]) -> io::Result<usize> {
        self.data.extend_from_slice(bytes);
        Ok(bytes.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    #[allow(clippy::unwrap_used)]
    fn test_read_advances_cursor() {
        let mut buf = Buffer::from_bytes(vec![1, 2, 3, 4]);
        assert_eq!(buf.read_exact(2).unwrap(), &[1, 2]);
        assert_eq!(buf.position(), 2);
        assert_eq!(buf.remaining(), 2);
        assert_eq!(buf.peek(), &[3, 4]);
        assert_eq!(buf.len(), 4);
    }

    #[test]
    fn test_read_past_end_reports_partial() {
        let mut buf = Buffer::from_bytes(vec![9, 8]);
        match buf.read_exact(5) {
            Err(ProtocolError::UnexpectedEnd { expected, partial }) => {
                assert_eq!(expected, 5);
                assert_eq!(partial, vec![9, 8]);
            }
            other => panic!("unexpected: {other:?}"),
        }
        assert!(!buf.has_remaining());
    }

    #[test]
    #[allow(clippy::unwrap_used)]
    fn test_discard_consumed_keeps_unread_tail() {
        let mut buf = Buffer::from_bytes(vec![1, 2, 3]);
        buf.read_byte().unwrap();
        buf.write_bytes(&[4]);
        buf.discard_consumed();
        assert_eq!(buf.position(), 0);
        assert_eq!(buf.as_slice(), &[2, 3, 4]);
    }

    #[test]
    #[allow(clippy::unwrap_used)]
    fn test_clear_and_rewind() {
        let mut buf = Buffer::from_bytes(vec![1, 2, 3]);
        buf.read_exact(3).unwrap();
        buf.rewind(1).unwrap();
        assert_eq!(buf.read_byte().unwrap(), 2);
        assert!(buf.rewind(10).is_err());
        buf.clear();
        assert!(buf.is_empty());
        assert_eq!(buf.position(), 0);
    }
}
