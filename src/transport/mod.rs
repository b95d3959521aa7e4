//! Datagram transport adapters
//!
//! The codec core only ever calls two transport operations: send a frame
//! to an address, and poll for a received frame. Anything that can carry
//! whole datagrams can implement [`Transport`]; the crate ships a UDP
//! adapter and an in-memory loopback for tests and single-process use.

mod mem;
mod udp;

pub use mem::ChannelTransport;
pub use udp::UdpTransport;

use std::io;
use std::net::SocketAddr;

use bytes::Bytes;

/// One received datagram: the raw frame plus where it came from.
#[derive(Debug, Clone)]
pub struct Datagram {
    /// Raw frame octets as delivered by the transport
    pub payload: Bytes,
    /// Sender's address and port
    pub source: SocketAddr,
}

/// Non-blocking datagram transport contract.
///
/// `try_receive` hands over a whole datagram or nothing; it must never
/// block waiting for data. Delivery is unreliable and unordered; the
/// protocol layer assumes at-most-once per datagram and nothing more.
pub trait Transport {
    /// Send one frame to the destination address.
    fn send(&mut self, frame: &[u8], dest: SocketAddr) -> io::Result<()>;

    /// Poll for a pending datagram, returning immediately either way.
    fn try_receive(&mut self) -> io::Result<Option<Datagram>>;
}
