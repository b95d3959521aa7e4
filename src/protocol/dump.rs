//! Human-readable packet dumps (debug tooling)
//!
//! Renders a packet's header, a hex dump of its argument octets, and the
//! decoded fields into a multi-line `String` for logs and interactive
//! debugging. Compiled only with the `debug-tools` feature.

use std::fmt::Write as _;

use super::{EventClass, EventCode, Message, Packet};

/// Render a packet in human-readable form.
#[must_use]
pub fn describe(pkt: &Packet) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "AIM packet ({} argument octets)", pkt.args().len());
    let _ = writeln!(out, "  version: {}", pkt.version());
    match EventCode::classify(pkt.event_byte()) {
        EventClass::Implemented(event) => {
            let _ = writeln!(out, "  event:   {} ({})", pkt.event_byte(), event);
        }
        EventClass::Reserved(code) => {
            let _ = writeln!(out, "  event:   {code} (reserved)");
        }
        EventClass::Unknown(code) => {
            let _ = writeln!(out, "  event:   {code} (unknown)");
        }
    }
    let _ = writeln!(out, "  trans:   {}", pkt.trans_id());

    if pkt.args().is_empty() {
        let _ = writeln!(out, "  args:    <none>");
    } else {
        let _ = write!(out, "  args:   ");
        for octet in pkt.args().as_slice() {
            let _ = write!(out, " {octet:02x}");
        }
        out.push('\n');
    }

    if let Some(decoded) = Message::decode_from(pkt) {
        let _ = writeln!(out, "  decoded: {:?}", decoded.value);
        if !decoded.soft_errors.is_clean() {
            let _ = writeln!(out, "  field errors: {}", decoded.soft_errors.count());
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::PROTOCOL_VERSION;

    #[test]
    fn test_describe_report_packet() {
        let msg = Message::Report { id: 12, value: -3 };
        let mut pkt = Packet::new();
        msg.encode_into(&mut pkt);
        pkt.set_version(PROTOCOL_VERSION);
        pkt.set_trans_id(77);

        let text = describe(&pkt);
        assert!(text.contains("REPORT"));
        assert!(text.contains("trans:   77"));
        assert!(text.contains("decoded:"));
    }

    #[test]
    fn test_describe_empty_args() {
        let mut pkt = Packet::new();
        Message::Hello.encode_into(&mut pkt);
        let text = describe(&pkt);
        assert!(text.contains("<none>"));
    }
}
