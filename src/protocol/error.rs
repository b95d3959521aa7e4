//! AIM return codes and frame-level errors

use std::fmt;

use thiserror::Error;

use super::{HEADER_SIZE, MAX_PKT_SIZE};

/// AIM return codes, carried as the first octet of ACK and NACK packets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[repr(u8)]
pub enum RetCode {
    /// No error
    Ok = 0,
    /// Generic, unclassified error (avoid where a specific code exists)
    Generic = 1,
    /// Unsupported protocol version
    ProtocolVersion = 2,
    /// Unsupported event
    EventUnsupported = 3,
    /// Packet is too large
    TooLarge = 4,
    /// Malformed packet contents
    Malformed = 5,
    /// Argument value out of range
    OutOfRange = 6,
}

impl RetCode {
    /// Convert from byte
    #[must_use]
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(Self::Ok),
            1 => Some(Self::Generic),
            2 => Some(Self::ProtocolVersion),
            3 => Some(Self::EventUnsupported),
            4 => Some(Self::TooLarge),
            5 => Some(Self::Malformed),
            6 => Some(Self::OutOfRange),
            _ => None,
        }
    }

    /// Convert to byte
    #[must_use]
    pub const fn as_u8(self) -> u8 {
        self as u8
    }
}

impl fmt::Display for RetCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Ok => "ok",
            Self::Generic => "generic error",
            Self::ProtocolVersion => "unsupported protocol version",
            Self::EventUnsupported => "unsupported event",
            Self::TooLarge => "packet too large",
            Self::Malformed => "malformed packet",
            Self::OutOfRange => "argument out of range",
        };
        write!(f, "{name}")
    }
}

/// Hard frame-level errors
///
/// Any of these aborts decoding of the current frame entirely; the
/// dispatcher answers with a NACK carrying the matching [`RetCode`].
/// Field-level anomalies are not errors in this sense; they accumulate in a
/// [`SoftErrors`](super::SoftErrors) tally while decoding continues.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FrameError {
    /// Frame shorter than the fixed header
    #[error("malformed frame: {len} bytes (header alone is {HEADER_SIZE})")]
    Malformed {
        /// Received frame length
        len: usize,
    },

    /// Frame longer than the maximum packet size
    #[error("frame too large: {len} bytes (max {MAX_PKT_SIZE})")]
    TooLarge {
        /// Received frame length
        len: usize,
    },

    /// Event octet not among the implemented events
    #[error("unsupported event code {code:#x} (reserved: {reserved})")]
    EventUnsupported {
        /// The offending event octet
        code: u8,
        /// Whether the code is a declared-but-unimplemented event rather
        /// than an entirely unknown one
        reserved: bool,
    },

    /// Header version beyond what this implementation speaks
    #[error("unsupported protocol version {version} (max {max})")]
    VersionUnsupported {
        /// Version octet from the received header
        version: u8,
        /// Highest locally supported version
        max: u8,
    },
}

impl FrameError {
    /// The wire return code sent back in the NACK for this error.
    #[must_use]
    pub const fn ret_code(&self) -> RetCode {
        match self {
            Self::Malformed { .. } => RetCode::Malformed,
            Self::TooLarge { .. } => RetCode::TooLarge,
            Self::EventUnsupported { .. } => RetCode::EventUnsupported,
            Self::VersionUnsupported { .. } => RetCode::ProtocolVersion,
        }
    }
}

/// Result type alias for frame decoding
pub type Result<T> = std::result::Result<T, FrameError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ret_code_roundtrip() {
        for byte in 0..=6 {
            let code = RetCode::from_u8(byte).unwrap();
            assert_eq!(code.as_u8(), byte);
        }
        assert_eq!(RetCode::from_u8(7), None);
    }

    #[test]
    fn test_frame_error_maps_to_ret_code() {
        assert_eq!(
            FrameError::Malformed { len: 3 }.ret_code(),
            RetCode::Malformed
        );
        assert_eq!(
            FrameError::TooLarge { len: 70 }.ret_code(),
            RetCode::TooLarge
        );
        assert_eq!(
            FrameError::EventUnsupported {
                code: 100,
                reserved: true
            }
            .ret_code(),
            RetCode::EventUnsupported
        );
        assert_eq!(
            FrameError::VersionUnsupported { version: 2, max: 1 }.ret_code(),
            RetCode::ProtocolVersion
        );
    }
}
