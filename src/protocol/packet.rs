//! AIM packet: header plus argument buffer
//!
//! A [`Packet`] is transient scratch state, reinitialized at the start of
//! each encode or decode and exclusively owned by whichever call is
//! currently working on it. The dispatcher keeps one packet per direction
//! and reuses them across polls.

use tracing::warn;

use super::{
    EventClass, EventCode, FrameError, HEADER_SIZE, Header, MAX_PKT_SIZE, Result, WireBuffer,
};

/// One AIM wire frame: fixed header plus up to 60 argument octets.
#[derive(Debug, Clone, Default)]
pub struct Packet {
    header: Header,
    args: WireBuffer,
}

impl Packet {
    /// Fresh packet with an undefined event and empty arguments.
    #[must_use]
    pub fn new() -> Self {
        Self {
            header: Header::new(),
            args: WireBuffer::new(),
        }
    }

    /// Reset the packet for encoding a new outbound message.
    ///
    /// Version and transaction id start at zero; the sender fills them in
    /// just before transmission.
    pub fn init_for_write(&mut self, event: EventCode) {
        self.header = Header::new();
        self.header.set_event(event.as_u8());
        self.args.clear();
    }

    /// Protocol version octet from the header.
    #[must_use]
    pub const fn version(&self) -> u8 {
        self.header.version()
    }

    /// Set the protocol version octet.
    pub fn set_version(&mut self, version: u8) {
        self.header.set_version(version);
    }

    /// The implemented event this packet carries, if the event octet is
    /// one of the twelve.
    #[must_use]
    pub fn event(&self) -> Option<EventCode> {
        EventCode::from_u8(self.header.event())
    }

    /// Raw event octet.
    #[must_use]
    pub const fn event_byte(&self) -> u8 {
        self.header.event()
    }

    /// Transaction id; 0 means "no transaction".
    #[must_use]
    pub const fn trans_id(&self) -> u16 {
        self.header.trans_id()
    }

    /// Set the transaction id.
    pub fn set_trans_id(&mut self, trans_id: u16) {
        self.header.set_trans_id(trans_id);
    }

    /// Borrow the argument buffer for reads.
    #[must_use]
    pub const fn args(&self) -> &WireBuffer {
        &self.args
    }

    /// Borrow the argument buffer for writes.
    pub fn args_mut(&mut self) -> &mut WireBuffer {
        &mut self.args
    }

    /// Encode the packet into a wire frame: header octets followed by the
    /// written portion of the argument buffer.
    #[must_use]
    pub fn encode(&self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(HEADER_SIZE + self.args.len());
        bytes.extend_from_slice(&self.header.to_bytes());
        bytes.extend_from_slice(self.args.as_slice());
        bytes
    }

    /// Decode a received frame into this packet, validating in wire order
    /// and short-circuiting on the first hard failure:
    ///
    /// 1. shorter than the header → [`FrameError::Malformed`]
    /// 2. event octet not implemented → [`FrameError::EventUnsupported`]
    ///    (reserved codes and unknown codes are logged distinctly)
    /// 3. longer than the maximum frame → [`FrameError::TooLarge`]
    ///
    /// Header fields are recorded progressively as they are read, so a
    /// NACK reply can echo the transaction id learned so far: zero when
    /// the event check fails, since the id octets come after the event.
    ///
    /// The caller hands over the whole datagram, so a failed decode
    /// leaves nothing behind for the next receive.
    pub fn receive(&mut self, frame: &[u8]) -> Result<()> {
        self.header = Header::new();
        self.args.clear();

        if frame.len() < HEADER_SIZE {
            return Err(FrameError::Malformed { len: frame.len() });
        }

        self.header.set_version(frame[0]);
        self.header.set_event(frame[1]);
        match EventCode::classify(frame[1]) {
            EventClass::Implemented(_) => {}
            EventClass::Reserved(code) => {
                warn!(code, "received reserved (unimplemented) AIM event");
                return Err(FrameError::EventUnsupported {
                    code,
                    reserved: true,
                });
            }
            EventClass::Unknown(code) => {
                warn!(code, "received unknown AIM event");
                return Err(FrameError::EventUnsupported {
                    code,
                    reserved: false,
                });
            }
        }

        self.header
            .set_trans_id(u16::from_be_bytes([frame[2], frame[3]]));

        if frame.len() > MAX_PKT_SIZE {
            return Err(FrameError::TooLarge { len: frame.len() });
        }

        self.args.fill_from(&frame[HEADER_SIZE..]);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::{Cursor, SoftErrors};

    #[test]
    fn test_encode_layout() {
        let mut pkt = Packet::new();
        pkt.init_for_write(EventCode::Report);
        pkt.set_version(1);
        pkt.set_trans_id(0x0102);
        pkt.args_mut().write_u16(7).unwrap();

        let frame = pkt.encode();
        assert_eq!(frame, vec![1, 51, 0x01, 0x02, 0x00, 0x07]);
    }

    #[test]
    fn test_receive_roundtrip() {
        let mut pkt = Packet::new();
        pkt.receive(&[1, 8, 0xAA, 0xBB, 5]).unwrap();

        assert_eq!(pkt.version(), 1);
        assert_eq!(pkt.event(), Some(EventCode::Query));
        assert_eq!(pkt.trans_id(), 0xAABB);

        let mut cur = Cursor::new();
        let mut errs = SoftErrors::new();
        assert_eq!(pkt.args().read_u8(&mut cur, &mut errs), 5);
        assert!(errs.is_clean());
    }

    #[test]
    fn test_receive_header_too_short() {
        let mut pkt = Packet::new();
        let err = pkt.receive(&[1, 8, 0]).unwrap_err();
        assert_eq!(err, FrameError::Malformed { len: 3 });
        assert_eq!(pkt.trans_id(), 0);
    }

    #[test]
    fn test_receive_oversize_frame() {
        let mut pkt = Packet::new();
        let mut frame = vec![1, 8, 0x12, 0x34];
        frame.resize(70, 0);
        let err = pkt.receive(&frame).unwrap_err();
        assert_eq!(err, FrameError::TooLarge { len: 70 });
        // The transaction id was read before the size check.
        assert_eq!(pkt.trans_id(), 0x1234);
    }

    #[test]
    fn test_receive_unknown_event() {
        let mut pkt = Packet::new();
        let err = pkt.receive(&[1, 0xC8, 0x12, 0x34]).unwrap_err();
        assert_eq!(
            err,
            FrameError::EventUnsupported {
                code: 0xC8,
                reserved: false
            }
        );
        // Event is checked before the transaction id octets are read.
        assert_eq!(pkt.trans_id(), 0);
    }

    #[test]
    fn test_receive_reserved_event() {
        let mut pkt = Packet::new();
        let err = pkt.receive(&[1, 100, 0, 1]).unwrap_err();
        assert_eq!(
            err,
            FrameError::EventUnsupported {
                code: 100,
                reserved: true
            }
        );
    }

    #[test]
    fn test_receive_max_size_frame() {
        let mut pkt = Packet::new();
        let mut frame = vec![1, 1, 0, 1];
        frame.resize(MAX_PKT_SIZE, 0x5A);
        pkt.receive(&frame).unwrap();
        assert_eq!(pkt.args().len(), MAX_PKT_SIZE - HEADER_SIZE);
    }
}
