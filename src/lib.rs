//! AIM (Amenable Interactive Mesh) - compact fixed-frame protocol for
//! device-to-server messaging over unreliable datagrams
//!
//! This library implements the AIM packet codec and dispatch engine:
//! every message fits one 64-octet frame (4-octet header plus up to 60
//! argument octets), and a poll-driven [`Dispatcher`] routes decoded
//! packets to application handlers with ACK/NACK semantics.
//!
//! # Quick Start
//!
//! ```rust
//! use aim::{
//!     ChannelTransport, Dispatcher, DispatcherConfig, EventCode, Message, Replier, RetCode,
//!     RxMeta,
//! };
//!
//! let (end_a, end_b) = ChannelTransport::pair(
//!     "192.168.1.10:7770".parse().unwrap(),
//!     "192.168.1.20:7770".parse().unwrap(),
//! );
//! let mut node = Dispatcher::new(DispatcherConfig::default(), end_a);
//! let mut peer = Dispatcher::new(DispatcherConfig::default(), end_b);
//!
//! // Answer liveness probes with an ACK echoing the probe's transaction id.
//! node.register(
//!     EventCode::UAlive,
//!     |meta: &RxMeta, _msg: &Message, replier: &mut Replier<'_>| {
//!         let ack = Message::Ack { code: RetCode::Ok.as_u8(), diag: String::new() };
//!         match replier.send(&ack, meta.source, meta.trans_id) {
//!             Ok(_) => RetCode::Ok,
//!             Err(_) => RetCode::Generic,
//!         }
//!     },
//! );
//!
//! peer.send(
//!     &Message::UAlive { id: 7 },
//!     "192.168.1.10:7770".parse().unwrap(),
//! )?;
//! node.poll()?; // decodes the probe, runs the handler, sends the ACK
//! peer.poll()?; // receives the ACK
//! # Ok::<(), std::io::Error>(())
//! ```
//!
//! # Features
//!
//! - **Bounds-safe codec** - fixed-capacity argument buffer with checked
//!   cursors; truncation is reported, never an overflow
//! - **Accumulate-and-continue decoding** - field-level anomalies tally up
//!   while the partial message stays available to handlers
//! - **Typed events** - the twelve implemented AIM events as a Rust enum,
//!   with reserved codes recognized and rejected distinctly
//! - **Pluggable transport** - anything that moves whole datagrams; UDP
//!   and in-memory adapters included

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_possible_wrap)]
#![allow(clippy::cast_sign_loss)]

pub mod dispatch;
pub mod protocol;
pub mod transport;

pub use dispatch::{
    Dispatcher, DispatcherConfig, Handler, HandlerRegistry, Poll, Replier, RxMeta,
};
pub use protocol::{
    Action, BufferFull, CLASS_MAX, Cursor, DEFAULT_PORT, DIAG_MAX, Decoded, DeviceAttrs,
    DeviceType, EventClass, EventCode, FrameError, HEADER_SIZE, Header, LOC_MAX, MAX_ARGS_SIZE,
    MAX_PKT_SIZE, Message, PROTOCOL_VERSION, Packet, Result, RetCode, SoftErrors, StrWrite,
    TransactionIds, UNITS_MAX, WireBuffer,
};
pub use transport::{ChannelTransport, Datagram, Transport, UdpTransport};
