//! UDP transport adapter

use std::io;
use std::net::{SocketAddr, UdpSocket};

use bytes::Bytes;
use tracing::trace;

use super::{Datagram, Transport};
use crate::protocol::MAX_PKT_SIZE;

/// [`Transport`] over a non-blocking standard UDP socket.
///
/// The socket is opened with broadcast enabled since announcement events
/// are sent to the subnet broadcast address.
#[derive(Debug)]
pub struct UdpTransport {
    socket: UdpSocket,
    // Oversized datagrams must still reach the codec so it can answer
    // TOOLARGE; receive with headroom beyond MAX_PKT_SIZE.
    recv_buf: [u8; MAX_PKT_SIZE * 4],
}

impl UdpTransport {
    /// Bind a non-blocking, broadcast-capable socket on the given address.
    pub fn bind(addr: SocketAddr) -> io::Result<Self> {
        let socket = UdpSocket::bind(addr)?;
        socket.set_nonblocking(true)?;
        socket.set_broadcast(true)?;
        Ok(Self {
            socket,
            recv_buf: [0u8; MAX_PKT_SIZE * 4],
        })
    }

    /// The locally bound address.
    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.socket.local_addr()
    }
}

impl Transport for UdpTransport {
    fn send(&mut self, frame: &[u8], dest: SocketAddr) -> io::Result<()> {
        let sent = self.socket.send_to(frame, dest)?;
        trace!(len = sent, %dest, "sent datagram");
        Ok(())
    }

    fn try_receive(&mut self) -> io::Result<Option<Datagram>> {
        match self.socket.recv_from(&mut self.recv_buf) {
            Ok((len, source)) => {
                trace!(len, %source, "received datagram");
                Ok(Some(Datagram {
                    payload: Bytes::copy_from_slice(&self.recv_buf[..len]),
                    source,
                }))
            }
            Err(err) if err.kind() == io::ErrorKind::WouldBlock => Ok(None),
            Err(err) => Err(err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_loopback_send_receive() {
        let mut a = UdpTransport::bind("127.0.0.1:0".parse().unwrap()).unwrap();
        let mut b = UdpTransport::bind("127.0.0.1:0".parse().unwrap()).unwrap();
        let b_addr = b.local_addr().unwrap();

        assert!(b.try_receive().unwrap().is_none());

        a.send(&[1, 7, 0, 9, 0, 3], b_addr).unwrap();
        // Loopback delivery is fast but not instantaneous.
        let mut received = None;
        for _ in 0..100 {
            if let Some(dgram) = b.try_receive().unwrap() {
                received = Some(dgram);
                break;
            }
            std::thread::sleep(std::time::Duration::from_millis(1));
        }
        let dgram = received.expect("datagram not delivered on loopback");
        assert_eq!(dgram.payload.as_ref(), &[1, 7, 0, 9, 0, 3]);
        assert_eq!(dgram.source, a.local_addr().unwrap());
    }
}
