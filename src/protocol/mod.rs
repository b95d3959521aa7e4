//! AIM protocol core implementation
//!
//! This module provides the wire format, event schemas, and codec for AIM.

mod error;
mod header;
mod message;
mod packet;
mod transaction;
mod types;
mod wire;

#[cfg(feature = "debug-tools")]
pub mod dump;

pub use error::{FrameError, Result, RetCode};
pub use header::Header;
pub use message::{Decoded, DeviceAttrs, Message};
pub use packet::Packet;
pub use transaction::TransactionIds;
pub use types::{Action, DeviceType, EventClass, EventCode};
pub use wire::{BufferFull, Cursor, SoftErrors, StrWrite, WireBuffer};

/// Highest AIM protocol version this implementation speaks.
pub const PROTOCOL_VERSION: u8 = 1;

/// Default destination UDP port for AIM traffic.
pub const DEFAULT_PORT: u16 = 7770;

/// Maximum total packet size in octets (header + arguments).
pub const MAX_PKT_SIZE: usize = 64;

/// Header size in octets (version, event, 16-bit transaction id).
pub const HEADER_SIZE: usize = 4;

/// Maximum argument buffer size in octets.
pub const MAX_ARGS_SIZE: usize = MAX_PKT_SIZE - HEADER_SIZE;

/// Maximum location string length in octets (terminator excluded).
pub const LOC_MAX: usize = 12;

/// Maximum device class string length in octets (terminator excluded).
pub const CLASS_MAX: usize = 12;

/// Maximum units string length in octets (terminator excluded).
pub const UNITS_MAX: usize = 12;

/// Maximum diagnostic string length in an ACK/NACK, computed as the
/// argument capacity minus the return-code octet and the terminator.
pub const DIAG_MAX: usize = MAX_ARGS_SIZE - 1 - 1;
