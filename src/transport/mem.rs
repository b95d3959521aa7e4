//! In-memory loopback transport
//!
//! Connects two endpoints through queues in the same process. Useful for
//! tests and for embedding a device and its controller without a network.

use std::collections::VecDeque;
use std::io;
use std::net::SocketAddr;
use std::sync::mpsc::{Receiver, Sender, TryRecvError, channel};

use bytes::Bytes;

use super::{Datagram, Transport};

/// One end of an in-memory datagram channel.
///
/// Every frame sent from one end arrives at the other, whatever the
/// destination address says; the pair models a two-node subnet, so
/// broadcast and unicast destinations both land on the peer. Requested
/// destinations are recorded and can be popped with
/// [`ChannelTransport::sent_to`] for assertions.
#[derive(Debug)]
pub struct ChannelTransport {
    addr: SocketAddr,
    tx: Sender<Datagram>,
    rx: Receiver<Datagram>,
    sent_to: VecDeque<SocketAddr>,
}

impl ChannelTransport {
    /// Create a connected pair of endpoints with the given addresses.
    #[must_use]
    pub fn pair(a_addr: SocketAddr, b_addr: SocketAddr) -> (Self, Self) {
        let (a_tx, b_rx) = channel();
        let (b_tx, a_rx) = channel();
        (
            Self {
                addr: a_addr,
                tx: a_tx,
                rx: a_rx,
                sent_to: VecDeque::new(),
            },
            Self {
                addr: b_addr,
                tx: b_tx,
                rx: b_rx,
                sent_to: VecDeque::new(),
            },
        )
    }

    /// This end's address.
    #[must_use]
    pub const fn local_addr(&self) -> SocketAddr {
        self.addr
    }

    /// Pop the destination address of the oldest recorded send.
    pub fn sent_to(&mut self) -> Option<SocketAddr> {
        self.sent_to.pop_front()
    }
}

impl Transport for ChannelTransport {
    fn send(&mut self, frame: &[u8], dest: SocketAddr) -> io::Result<()> {
        self.sent_to.push_back(dest);
        self.tx
            .send(Datagram {
                payload: Bytes::copy_from_slice(frame),
                source: self.addr,
            })
            .map_err(|_| io::Error::new(io::ErrorKind::BrokenPipe, "peer endpoint dropped"))
    }

    fn try_receive(&mut self) -> io::Result<Option<Datagram>> {
        match self.rx.try_recv() {
            Ok(dgram) => Ok(Some(dgram)),
            Err(TryRecvError::Empty | TryRecvError::Disconnected) => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pair_delivers_both_ways() {
        let (mut a, mut b) = ChannelTransport::pair(
            "192.168.1.10:7770".parse().unwrap(),
            "192.168.1.20:7770".parse().unwrap(),
        );

        assert!(a.try_receive().unwrap().is_none());
        a.send(&[1, 2, 3], b.local_addr()).unwrap();
        let dgram = b.try_receive().unwrap().unwrap();
        assert_eq!(dgram.payload.as_ref(), &[1, 2, 3]);
        assert_eq!(dgram.source, a.local_addr());

        b.send(&[9], a.local_addr()).unwrap();
        assert_eq!(a.try_receive().unwrap().unwrap().payload.as_ref(), &[9]);
    }

    #[test]
    fn test_sent_destinations_recorded() {
        let (mut a, _b) = ChannelTransport::pair(
            "192.168.1.10:7770".parse().unwrap(),
            "192.168.1.20:7770".parse().unwrap(),
        );
        let dest: SocketAddr = "192.168.1.255:7770".parse().unwrap();
        a.send(&[0], dest).unwrap();
        assert_eq!(a.sent_to(), Some(dest));
        assert_eq!(a.sent_to(), None);
    }
}
