//! Event handler contract and registry
//!
//! Events are dispatched through an explicit registry mapping event codes
//! to handler objects. Handlers are the host application's surface: they
//! receive the decoded message plus receive-side metadata and may send
//! replies through the [`Replier`] capability. An event with no
//! registered handler is logged and acknowledged as handled; the
//! protocol layer never NACKs merely because the application is not
//! interested.

use std::collections::HashMap;
use std::net::SocketAddr;

use super::Replier;
use crate::protocol::{EventCode, Message, RetCode, SoftErrors};

/// Receive-side metadata handed to a handler along with the message.
#[derive(Debug, Clone, Copy)]
pub struct RxMeta {
    /// Address the packet came from; replies go back here
    pub source: SocketAddr,
    /// Transaction id of the received packet; an ACK/NACK reply must
    /// echo this value
    pub trans_id: u16,
    /// Field-level anomalies tallied while decoding; the message is
    /// delivered even when degraded, and the handler decides whether to
    /// trust it
    pub soft_errors: SoftErrors,
}

/// Host-application hook for one event code.
///
/// Returning anything other than [`RetCode::Ok`] makes the dispatcher
/// answer the sender with a NACK carrying that code.
pub trait Handler {
    /// Process one received message.
    fn handle(&mut self, meta: &RxMeta, msg: &Message, replier: &mut Replier<'_>) -> RetCode;
}

impl<F> Handler for F
where
    F: FnMut(&RxMeta, &Message, &mut Replier<'_>) -> RetCode,
{
    fn handle(&mut self, meta: &RxMeta, msg: &Message, replier: &mut Replier<'_>) -> RetCode {
        self(meta, msg, replier)
    }
}

/// Registry mapping event codes to handlers.
///
/// At most one handler per event; registering again replaces the
/// previous entry.
#[derive(Default)]
pub struct HandlerRegistry {
    handlers: HashMap<EventCode, Box<dyn Handler>>,
}

impl HandlerRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self {
            handlers: HashMap::new(),
        }
    }

    /// Register a handler for an event, replacing any existing one.
    pub fn register(&mut self, event: EventCode, handler: impl Handler + 'static) {
        self.handlers.insert(event, Box::new(handler));
    }

    /// Look up the handler for an event.
    pub fn get_mut(&mut self, event: EventCode) -> Option<&mut (dyn Handler + 'static)> {
        self.handlers.get_mut(&event).map(|h| &mut **h)
    }

    /// Check whether a handler is registered for an event.
    #[must_use]
    pub fn is_registered(&self, event: EventCode) -> bool {
        self.handlers.contains_key(&event)
    }
}

impl std::fmt::Debug for HandlerRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HandlerRegistry")
            .field("events", &self.handlers.keys().collect::<Vec<_>>())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_register_and_replace() {
        let mut registry = HandlerRegistry::new();
        assert!(!registry.is_registered(EventCode::Query));

        registry.register(EventCode::Query, |_: &RxMeta, _: &Message, _: &mut Replier<'_>| {
            RetCode::Ok
        });
        assert!(registry.is_registered(EventCode::Query));
        assert!(registry.get_mut(EventCode::Query).is_some());
        assert!(registry.get_mut(EventCode::Report).is_none());

        // Re-registering replaces rather than accumulating.
        registry.register(EventCode::Query, |_: &RxMeta, _: &Message, _: &mut Replier<'_>| {
            RetCode::Generic
        });
        assert!(registry.is_registered(EventCode::Query));
    }
}
