//! Bounds-checked argument buffer primitives
//!
//! [`WireBuffer`] is the 60-octet argument area of an AIM packet. Writes
//! advance an internal cursor and are all-or-nothing; reads go through a
//! caller-owned [`Cursor`] and never fail hard: a read past capacity
//! yields a zero value and bumps the caller's [`SoftErrors`] tally so that
//! decoding always runs to completion.

use thiserror::Error;
use tracing::warn;

use super::MAX_ARGS_SIZE;

/// Rejected write: not enough room left in the argument buffer.
///
/// The buffer is unchanged; nothing is partially written.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("argument buffer full: need {needed} bytes, {remaining} remaining")]
pub struct BufferFull {
    /// Bytes the write needed
    pub needed: usize,
    /// Bytes actually remaining
    pub remaining: usize,
}

/// Outcome of writing a bounded string field.
///
/// Both truncated outcomes still leave the packet sendable; capacity
/// exhaustion is the more severe of the two since it means the buffer ran
/// out rather than a declared field limit applying.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StrWrite {
    /// The whole string fit within the field limit and the buffer
    Complete,
    /// Truncated to the field's declared protocol maximum
    TruncatedToLimit,
    /// Truncated because the buffer itself ran out of space
    TruncatedToCapacity,
}

impl StrWrite {
    /// Check whether any truncation applied.
    #[must_use]
    pub const fn is_truncated(self) -> bool {
        !matches!(self, Self::Complete)
    }
}

/// Checked read position within the argument buffer.
///
/// Independent of the buffer's write cursor; a caller may hold several
/// cursors over the same buffer and re-read fields freely.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Cursor(usize);

impl Cursor {
    /// Cursor at the start of the argument buffer.
    #[must_use]
    pub const fn new() -> Self {
        Self(0)
    }

    /// Current octet offset.
    #[must_use]
    pub const fn pos(self) -> usize {
        self.0
    }

    /// Advance by `width` octets, refusing to move past capacity.
    /// Returns the offset the field starts at.
    fn take(&mut self, width: usize) -> Option<usize> {
        if self.0 + width <= MAX_ARGS_SIZE {
            let at = self.0;
            self.0 += width;
            Some(at)
        } else {
            None
        }
    }
}

/// Tally of field-level decode/encode anomalies.
///
/// Out-of-range values, truncations, and reads past capacity accumulate
/// here while processing continues; the schema-level caller inspects the
/// final count and decides whether the message is usable.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SoftErrors(u32);

impl SoftErrors {
    /// Fresh tally with no errors recorded.
    #[must_use]
    pub const fn new() -> Self {
        Self(0)
    }

    /// Record one anomaly.
    pub fn bump(&mut self) {
        self.0 += 1;
    }

    /// Number of anomalies recorded so far.
    #[must_use]
    pub const fn count(self) -> u32 {
        self.0
    }

    /// Check whether no anomalies were recorded.
    #[must_use]
    pub const fn is_clean(self) -> bool {
        self.0 == 0
    }
}

/// Bounded argument buffer with a write cursor.
#[derive(Debug, Clone)]
pub struct WireBuffer {
    data: [u8; MAX_ARGS_SIZE],
    len: usize,
}

impl Default for WireBuffer {
    fn default() -> Self {
        Self::new()
    }
}

impl WireBuffer {
    /// Empty, zeroed buffer.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            data: [0u8; MAX_ARGS_SIZE],
            len: 0,
        }
    }

    /// Zero the contents and reset the write cursor.
    pub fn clear(&mut self) {
        self.data.fill(0);
        self.len = 0;
    }

    /// Number of octets written so far.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.len
    }

    /// Check whether no argument octets have been written.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Octets of capacity still available for writes.
    #[must_use]
    pub const fn remaining(&self) -> usize {
        MAX_ARGS_SIZE - self.len
    }

    /// The written portion of the buffer.
    #[must_use]
    pub fn as_slice(&self) -> &[u8] {
        &self.data[..self.len]
    }

    /// Replace the contents with received argument octets, capped at
    /// capacity; the unused tail is zeroed so reads past the received
    /// data yield zero values.
    pub fn fill_from(&mut self, bytes: &[u8]) {
        self.data.fill(0);
        let n = bytes.len().min(MAX_ARGS_SIZE);
        self.data[..n].copy_from_slice(&bytes[..n]);
        self.len = n;
    }

    fn put(&mut self, bytes: &[u8]) -> Result<(), BufferFull> {
        let remaining = self.remaining();
        if bytes.len() > remaining {
            return Err(BufferFull {
                needed: bytes.len(),
                remaining,
            });
        }
        self.data[self.len..self.len + bytes.len()].copy_from_slice(bytes);
        self.len += bytes.len();
        Ok(())
    }

    /// Append an unsigned 8-bit integer.
    pub fn write_u8(&mut self, value: u8) -> Result<(), BufferFull> {
        self.put(&[value])
    }

    /// Append an unsigned 16-bit integer, big-endian.
    pub fn write_u16(&mut self, value: u16) -> Result<(), BufferFull> {
        self.put(&value.to_be_bytes())
    }

    /// Append an unsigned 32-bit integer, big-endian.
    pub fn write_u32(&mut self, value: u32) -> Result<(), BufferFull> {
        self.put(&value.to_be_bytes())
    }

    /// Append a terminated string field, truncating to `max_len` octets
    /// (the field's protocol maximum) or to the remaining buffer space,
    /// whichever is tighter. Either truncation still produces a sendable
    /// packet; the returned [`StrWrite`] distinguishes the cause.
    pub fn write_str(&mut self, value: &str, max_len: usize) -> StrWrite {
        let bytes = value.as_bytes();
        let mut status = StrWrite::Complete;
        let mut len = bytes.len();

        if len > max_len {
            status = StrWrite::TruncatedToLimit;
            len = max_len;
            warn!(len = bytes.len(), max_len, "string exceeds field limit, truncated");
        }

        let remaining = self.remaining();
        if remaining < len + 1 {
            status = StrWrite::TruncatedToCapacity;
            len = remaining.saturating_sub(1);
            warn!(
                needed = bytes.len() + 1,
                remaining, "string exceeds buffer space, truncated"
            );
        }
        if remaining == 0 {
            // No room for even the terminator; leave the buffer untouched.
            return status;
        }

        self.data[self.len..self.len + len].copy_from_slice(&bytes[..len]);
        self.data[self.len + len] = 0;
        self.len += len + 1;
        status
    }

    /// Read an unsigned 8-bit integer at the cursor.
    ///
    /// Past capacity: returns 0 and bumps the tally.
    #[must_use]
    pub fn read_u8(&self, cursor: &mut Cursor, errors: &mut SoftErrors) -> u8 {
        match cursor.take(1) {
            Some(at) => self.data[at],
            None => {
                warn!(pos = cursor.pos(), "u8 read past buffer capacity");
                errors.bump();
                0
            }
        }
    }

    /// Read an unsigned 16-bit integer, big-endian, at the cursor.
    ///
    /// Past capacity: returns 0 and bumps the tally.
    #[must_use]
    pub fn read_u16(&self, cursor: &mut Cursor, errors: &mut SoftErrors) -> u16 {
        match cursor.take(2) {
            Some(at) => u16::from_be_bytes([self.data[at], self.data[at + 1]]),
            None => {
                warn!(pos = cursor.pos(), "u16 read past buffer capacity");
                errors.bump();
                0
            }
        }
    }

    /// Read an unsigned 32-bit integer, big-endian, at the cursor.
    ///
    /// Past capacity: returns 0 and bumps the tally.
    #[must_use]
    pub fn read_u32(&self, cursor: &mut Cursor, errors: &mut SoftErrors) -> u32 {
        match cursor.take(4) {
            Some(at) => u32::from_be_bytes([
                self.data[at],
                self.data[at + 1],
                self.data[at + 2],
                self.data[at + 3],
            ]),
            None => {
                warn!(pos = cursor.pos(), "u32 read past buffer capacity");
                errors.bump();
                0
            }
        }
    }

    /// Read a terminated string field at the cursor.
    ///
    /// The same two truncation causes as [`write_str`](Self::write_str)
    /// apply, each bumping the tally: a string with no terminator before
    /// the end of the buffer (capacity exhaustion; the cursor drains to
    /// the end), and a terminated string longer than `max_len` (the value
    /// is cut to `max_len` but the cursor skips the whole on-wire string
    /// so subsequent fields stay aligned). Never mutates the buffer.
    #[must_use]
    pub fn read_str(&self, cursor: &mut Cursor, max_len: usize, errors: &mut SoftErrors) -> String {
        let start = cursor.pos();
        if start >= MAX_ARGS_SIZE {
            warn!(pos = start, "string read past buffer capacity");
            errors.bump();
            return String::new();
        }

        let tail = &self.data[start..MAX_ARGS_SIZE];
        let (raw_len, consumed) = match tail.iter().position(|&b| b == 0) {
            Some(nul) => (nul, nul + 1),
            None => {
                warn!(pos = start, "string not terminated before end of buffer");
                errors.bump();
                (tail.len(), tail.len())
            }
        };

        let mut value_len = raw_len;
        if value_len > max_len {
            warn!(len = raw_len, max_len, "string exceeds field limit, truncated");
            errors.bump();
            value_len = max_len;
        }

        cursor.0 = start + consumed;
        String::from_utf8_lossy(&tail[..value_len]).into_owned()
    }
}
