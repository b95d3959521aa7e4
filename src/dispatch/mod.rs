//! Poll-driven AIM dispatch engine
//!
//! The [`Dispatcher`] owns the transport, one packet per direction, the
//! transaction id generator, and the handler registry. It is explicitly
//! constructed and explicitly owned by whatever code drives the poll
//! loop; there is no hidden global instance. Each [`Dispatcher::poll`]
//! performs at most one packet's worth of work, never blocks, and always
//! returns with the dispatcher idle.

mod handler;

pub use handler::{Handler, HandlerRegistry, RxMeta};

use std::io;
use std::net::{Ipv4Addr, SocketAddr, SocketAddrV4};

use tracing::{debug, warn};

use crate::protocol::{
    DEFAULT_PORT, EventCode, Message, PROTOCOL_VERSION, Packet, RetCode, SoftErrors,
    TransactionIds,
};
use crate::transport::Transport;

/// Diagnostic carried in a NACK for a frame that failed hard validation.
const DIAG_BAD_FRAME: &str = "can't parse packet";

/// Diagnostic carried in a NACK when a handler refuses a packet.
const DIAG_HANDLER_FAILED: &str = "request failed";

/// Dispatcher configuration.
#[derive(Debug, Clone, Copy)]
pub struct DispatcherConfig {
    /// Highest protocol version accepted and stamped on outbound packets
    pub protocol_version: u8,
    /// This node's IPv4 address, used to derive the subnet broadcast
    /// address for announcement events
    pub local_ip: Ipv4Addr,
    /// UDP port announcements are broadcast to
    pub port: u16,
}

impl Default for DispatcherConfig {
    fn default() -> Self {
        Self {
            protocol_version: PROTOCOL_VERSION,
            local_ip: Ipv4Addr::UNSPECIFIED,
            port: DEFAULT_PORT,
        }
    }
}

impl DispatcherConfig {
    /// The subnet broadcast address announcements are sent to.
    ///
    /// AIM devices are assumed to share a /24 subnet, so the broadcast
    /// address is the local address with its last octet set to 255.
    #[must_use]
    pub fn broadcast_addr(&self) -> SocketAddr {
        let [a, b, c, _] = self.local_ip.octets();
        SocketAddr::V4(SocketAddrV4::new(Ipv4Addr::new(a, b, c, 255), self.port))
    }
}

/// Outcome of one poll cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Poll {
    /// No datagram was pending
    Idle,
    /// A frame was decoded and dispatched to its handler
    Handled {
        /// The event that was dispatched
        event: EventCode,
        /// The handler's return code ([`RetCode::Ok`] unless it refused
        /// the packet, in which case a NACK went back to the sender)
        code: RetCode,
    },
    /// A frame failed hard validation; a NACK went back to the sender
    Rejected(RetCode),
}

/// Reply capability handed to handlers.
///
/// Borrows the dispatcher's outbound packet and transport so a handler
/// can answer the sender (echoing the request's transaction id) without
/// owning either.
pub struct Replier<'a> {
    out: &'a mut Packet,
    transport: &'a mut dyn Transport,
    broadcast: SocketAddr,
    version: u8,
}

impl Replier<'_> {
    /// Encode and send a message with the given transaction id.
    ///
    /// Announcement events (IAMHERE, ATTRCHG) go to the subnet broadcast
    /// address regardless of `dest`. Returns the encode-side soft-error
    /// tally; a truncated diagnostic still goes out.
    pub fn send(&mut self, msg: &Message, dest: SocketAddr, trans_id: u16) -> io::Result<SoftErrors> {
        let errors = msg.encode_into(self.out);
        self.out.set_version(self.version);
        self.out.set_trans_id(trans_id);

        let event = msg.event();
        let actual_dest = if event.is_announcement() {
            self.broadcast
        } else {
            dest
        };
        debug!(%event, dest = %actual_dest, trans_id, "sending packet");
        self.transport.send(&self.out.encode(), actual_dest)?;
        Ok(errors)
    }
}

/// Poll-driven protocol engine: decode, validate, dispatch, acknowledge.
pub struct Dispatcher<T: Transport> {
    config: DispatcherConfig,
    transport: T,
    handlers: HandlerRegistry,
    in_pkt: Packet,
    out_pkt: Packet,
    trans_ids: TransactionIds,
}

impl<T: Transport> Dispatcher<T> {
    /// Create a dispatcher over the given transport.
    pub fn new(config: DispatcherConfig, transport: T) -> Self {
        Self {
            config,
            transport,
            handlers: HandlerRegistry::new(),
            in_pkt: Packet::new(),
            out_pkt: Packet::new(),
            trans_ids: TransactionIds::new(),
        }
    }

    /// Register a handler for an event, replacing any existing one.
    /// Events without a handler are logged and ignored.
    pub fn register(&mut self, event: EventCode, handler: impl Handler + 'static) {
        self.handlers.register(event, handler);
    }

    /// The active configuration.
    #[must_use]
    pub const fn config(&self) -> &DispatcherConfig {
        &self.config
    }

    /// Borrow the underlying transport.
    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    /// Send a new (non-reply) message, minting a fresh transaction id.
    ///
    /// Returns the transaction id used, so the caller can correlate a
    /// later ACK or NACK.
    pub fn send(&mut self, msg: &Message, dest: SocketAddr) -> io::Result<u16> {
        let trans_id = self.trans_ids.next();
        self.send_with(msg, dest, trans_id)?;
        Ok(trans_id)
    }

    /// Send a reply, echoing the transaction id of the packet it answers.
    pub fn send_reply(&mut self, msg: &Message, dest: SocketAddr, trans_id: u16) -> io::Result<()> {
        self.send_with(msg, dest, trans_id)
    }

    fn send_with(&mut self, msg: &Message, dest: SocketAddr, trans_id: u16) -> io::Result<()> {
        let mut replier = Replier {
            out: &mut self.out_pkt,
            transport: &mut self.transport,
            broadcast: self.config.broadcast_addr(),
            version: self.config.protocol_version,
        };
        let errors = replier.send(msg, dest, trans_id)?;
        if !errors.is_clean() {
            warn!(
                event = %msg.event(),
                count = errors.count(),
                "message encoded with field errors"
            );
        }
        Ok(())
    }

    fn send_nack(
        &mut self,
        dest: SocketAddr,
        trans_id: u16,
        code: RetCode,
        diag: &str,
    ) -> io::Result<()> {
        let nack = Message::Nack {
            code: code.as_u8(),
            diag: diag.to_owned(),
        };
        self.send_with(&nack, dest, trans_id)
    }

    /// Run one poll cycle: at most one frame's worth of work, returning
    /// immediately when nothing is pending.
    ///
    /// A frame failing hard validation is answered with a NACK carrying
    /// the error code and echoing whatever transaction id was parsed
    /// before the failure (0 when the failure came first). A structurally
    /// valid frame is schema-decoded, soft errors and all, and handed
    /// to the registered handler; a non-OK handler return code also turns
    /// into a NACK to the original sender.
    ///
    /// Errors from the transport itself (not protocol errors) are the
    /// only way this returns `Err`.
    pub fn poll(&mut self) -> io::Result<Poll> {
        // Taking the whole datagram up front is what keeps the channel
        // synchronized: a frame that fails validation is already fully
        // consumed, so the next receive starts on a fresh datagram.
        let Some(dgram) = self.transport.try_receive()? else {
            return Ok(Poll::Idle);
        };

        if let Err(err) = self.in_pkt.receive(&dgram.payload) {
            let code = err.ret_code();
            warn!(%err, source = %dgram.source, "rejecting frame");
            let trans_id = self.in_pkt.trans_id();
            self.send_nack(dgram.source, trans_id, code, DIAG_BAD_FRAME)?;
            return Ok(Poll::Rejected(code));
        }

        // Version gate: before any field decoding.
        if self.in_pkt.version() > self.config.protocol_version {
            warn!(
                version = self.in_pkt.version(),
                max = self.config.protocol_version,
                source = %dgram.source,
                "rejecting frame with unsupported protocol version"
            );
            let trans_id = self.in_pkt.trans_id();
            self.send_nack(
                dgram.source,
                trans_id,
                RetCode::ProtocolVersion,
                DIAG_BAD_FRAME,
            )?;
            return Ok(Poll::Rejected(RetCode::ProtocolVersion));
        }

        let decoded = Message::decode_from(&self.in_pkt).expect("event admitted by frame validation");
        let event = decoded.value.event();
        if !decoded.soft_errors.is_clean() {
            debug!(
                %event,
                count = decoded.soft_errors.count(),
                "message decoded with field errors"
            );
        }

        let meta = RxMeta {
            source: dgram.source,
            trans_id: self.in_pkt.trans_id(),
            soft_errors: decoded.soft_errors,
        };

        let code = match self.handlers.get_mut(event) {
            Some(handler) => {
                let mut replier = Replier {
                    out: &mut self.out_pkt,
                    transport: &mut self.transport,
                    broadcast: self.config.broadcast_addr(),
                    version: self.config.protocol_version,
                };
                handler.handle(&meta, &decoded.value, &mut replier)
            }
            None => {
                debug!(%event, source = %meta.source, "no handler registered, ignoring");
                RetCode::Ok
            }
        };

        if code != RetCode::Ok {
            warn!(%event, %code, "handler refused packet");
            self.send_nack(meta.source, meta.trans_id, code, DIAG_HANDLER_FAILED)?;
        }
        Ok(Poll::Handled { event, code })
    }
}

impl<T: Transport> std::fmt::Debug for Dispatcher<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dispatcher")
            .field("config", &self.config)
            .field("handlers", &self.handlers)
            .field("last_trans_id", &self.trans_ids.last())
            .finish_non_exhaustive()
    }
}
