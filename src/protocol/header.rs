//! AIM packet header
//!
//! The header is a fixed 4-octet prefix:
//!
//! ```text
//!  offset 0    protocol version (u8)
//!  offset 1    event            (u8)
//!  offset 2-3  transaction id   (u16, big-endian)
//! ```

use super::HEADER_SIZE;

/// Fixed 4-octet AIM packet header.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Header {
    version: u8,
    event: u8,
    trans_id: u16,
}

impl Header {
    /// Create a header with every field zeroed (event undefined,
    /// transaction unset).
    #[must_use]
    pub const fn new() -> Self {
        Self {
            version: 0,
            event: 0,
            trans_id: 0,
        }
    }

    /// Protocol version octet.
    #[must_use]
    pub const fn version(&self) -> u8 {
        self.version
    }

    /// Set the protocol version octet.
    pub fn set_version(&mut self, version: u8) {
        self.version = version;
    }

    /// Raw event octet.
    #[must_use]
    pub const fn event(&self) -> u8 {
        self.event
    }

    /// Set the raw event octet.
    pub fn set_event(&mut self, event: u8) {
        self.event = event;
    }

    /// Transaction id; 0 means "no transaction".
    #[must_use]
    pub const fn trans_id(&self) -> u16 {
        self.trans_id
    }

    /// Set the transaction id.
    pub fn set_trans_id(&mut self, trans_id: u16) {
        self.trans_id = trans_id;
    }

    /// Encode the header in wire order.
    #[must_use]
    pub fn to_bytes(&self) -> [u8; HEADER_SIZE] {
        let tid = self.trans_id.to_be_bytes();
        [self.version, self.event, tid[0], tid[1]]
    }

    /// Parse a header from the first [`HEADER_SIZE`] octets of a frame.
    ///
    /// Performs no validation beyond length; the frame validation ladder
    /// lives in [`Packet::receive`](super::Packet::receive).
    #[must_use]
    pub fn from_bytes(bytes: &[u8]) -> Option<Self> {
        if bytes.len() < HEADER_SIZE {
            return None;
        }
        Some(Self {
            version: bytes[0],
            event: bytes[1],
            trans_id: u16::from_be_bytes([bytes[2], bytes[3]]),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_header_roundtrip() {
        let mut header = Header::new();
        header.set_version(1);
        header.set_event(9);
        header.set_trans_id(0xBEEF);

        let bytes = header.to_bytes();
        assert_eq!(bytes, [1, 9, 0xBE, 0xEF]);
        assert_eq!(Header::from_bytes(&bytes), Some(header));
    }

    #[test]
    fn test_header_too_short() {
        assert_eq!(Header::from_bytes(&[1, 2, 3]), None);
    }
}
