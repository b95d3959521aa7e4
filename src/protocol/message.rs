//! Typed AIM messages and their per-event schemas
//!
//! Each event has a fixed, ordered field layout built from the
//! [`WireBuffer`] primitives; encode and decode are exact inverses for
//! values within the declared field limits. Field-level anomalies never
//! abort a decode; they accumulate in the returned tally and the partial
//! message stays available to the caller.

use tracing::warn;

use super::{
    Action, CLASS_MAX, Cursor, DIAG_MAX, EventCode, LOC_MAX, Packet, SoftErrors, UNITS_MAX,
    WireBuffer,
};

/// A decoded value together with the soft-error tally accumulated while
/// producing it.
#[derive(Debug, Clone, PartialEq)]
pub struct Decoded<T> {
    /// The decoded value, possibly carrying zeroed or truncated fields
    /// when the tally is non-empty
    pub value: T,
    /// Field-level anomalies encountered during the decode
    pub soft_errors: SoftErrors,
}

/// Device attribute set carried by an ATTRS packet.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DeviceAttrs {
    /// Mesh-wide device id assigned by the server
    pub id: u16,
    /// Human-readable location, at most [`LOC_MAX`] octets
    pub location: String,
    /// Number of devices in the group (1 when the device stands alone)
    pub group_size: u8,
    /// Position of the device within its group, `1..=group_size`
    pub group_id: u8,
    /// Raw device type octet; see [`DeviceType`](super::DeviceType)
    pub device_type: u8,
    /// Decimal scaling: actual value = reported value * 10^scale
    pub scale: i8,
    /// Human-readable device classification, at most [`CLASS_MAX`] octets
    pub class: String,
    /// Lowest valid device value
    pub range_low: i16,
    /// Highest valid device value
    pub range_high: i16,
    /// Zero point within the value range
    pub zero_point: i16,
    /// Measurement units, at most [`UNITS_MAX`] octets
    pub units: String,
}

/// One AIM message, the typed form of a packet's event plus arguments.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Message {
    /// Positive acknowledgement; echoes the request's transaction id
    Ack {
        /// Return code octet, normally [`RetCode::Ok`](super::RetCode::Ok)
        code: u8,
        /// Optional human-readable diagnostic, at most [`DIAG_MAX`] octets
        diag: String,
    },
    /// Negative acknowledgement; echoes the request's transaction id
    Nack {
        /// Return code octet describing the failure
        code: u8,
        /// Optional human-readable diagnostic, at most [`DIAG_MAX`] octets
        diag: String,
    },
    /// Solicit presence announcements; no arguments
    Hello,
    /// Periodic presence announcement, always broadcast
    IAmHere {
        /// Mesh-wide device id, 0 until assigned
        id: u16,
        /// Number of devices in the group
        group_size: u8,
        /// Position within the group, `1..=group_size`
        group_id: u8,
    },
    /// Server assigns a device its id and location
    UAre {
        /// Position within the group of the addressed device
        group_id: u8,
        /// Assigned mesh-wide device id
        id: u16,
        /// Assigned location string
        location: String,
    },
    /// Server tells a device to drop its id and location
    Forget {
        /// Position within the group of the addressed device
        group_id: u8,
    },
    /// Liveness check for a device id
    UAlive {
        /// Mesh-wide device id being probed
        id: u16,
    },
    /// Request a device's attributes
    Query {
        /// Position within the group of the addressed device
        group_id: u8,
    },
    /// Attribute description, the reply to a QUERY
    Attrs(DeviceAttrs),
    /// Announcement that an attribute changed, always broadcast
    AttrChg {
        /// Mesh-wide device id whose attributes changed
        id: u16,
    },
    /// Set or read a device value
    Control {
        /// Mesh-wide device id being controlled
        id: u16,
        /// Raw action octet; see [`Action`]
        action: u8,
        /// For SET the target value; for READ 0 = once, n > 0 = every n ms
        value: i16,
    },
    /// Report a device value
    Report {
        /// Mesh-wide device id the value belongs to
        id: u16,
        /// The reported value
        value: i16,
    },
}

fn put_u8(buf: &mut WireBuffer, value: u8, errors: &mut SoftErrors) {
    if let Err(err) = buf.write_u8(value) {
        warn!(%err, "u8 field dropped");
        errors.bump();
    }
}

fn put_u16(buf: &mut WireBuffer, value: u16, errors: &mut SoftErrors) {
    if let Err(err) = buf.write_u16(value) {
        warn!(%err, "u16 field dropped");
        errors.bump();
    }
}

fn put_str(buf: &mut WireBuffer, value: &str, max_len: usize, errors: &mut SoftErrors) {
    if buf.write_str(value, max_len).is_truncated() {
        errors.bump();
    }
}

impl Message {
    /// The event code this message encodes as.
    #[must_use]
    pub const fn event(&self) -> EventCode {
        match self {
            Self::Ack { .. } => EventCode::Ack,
            Self::Nack { .. } => EventCode::Nack,
            Self::Hello => EventCode::Hello,
            Self::IAmHere { .. } => EventCode::IAmHere,
            Self::UAre { .. } => EventCode::UAre,
            Self::Forget { .. } => EventCode::Forget,
            Self::UAlive { .. } => EventCode::UAlive,
            Self::Query { .. } => EventCode::Query,
            Self::Attrs(_) => EventCode::Attrs,
            Self::AttrChg { .. } => EventCode::AttrChg,
            Self::Control { .. } => EventCode::Control,
            Self::Report { .. } => EventCode::Report,
        }
    }

    /// Encode this message into a packet, reinitializing it first.
    ///
    /// Truncated strings and dropped fields bump the returned tally but
    /// still leave a sendable packet; the sender fills in version and
    /// transaction id afterwards.
    pub fn encode_into(&self, pkt: &mut Packet) -> SoftErrors {
        pkt.init_for_write(self.event());
        let mut errors = SoftErrors::new();
        let buf = pkt.args_mut();

        match self {
            Self::Ack { code, diag } | Self::Nack { code, diag } => {
                put_u8(buf, *code, &mut errors);
                put_str(buf, diag, DIAG_MAX, &mut errors);
            }
            Self::Hello => {}
            Self::IAmHere {
                id,
                group_size,
                group_id,
            } => {
                put_u16(buf, *id, &mut errors);
                put_u8(buf, *group_size, &mut errors);
                put_u8(buf, *group_id, &mut errors);
            }
            Self::UAre {
                group_id,
                id,
                location,
            } => {
                put_u8(buf, *group_id, &mut errors);
                put_u16(buf, *id, &mut errors);
                put_str(buf, location, LOC_MAX, &mut errors);
            }
            Self::Forget { group_id } | Self::Query { group_id } => {
                put_u8(buf, *group_id, &mut errors);
            }
            Self::UAlive { id } | Self::AttrChg { id } => {
                put_u16(buf, *id, &mut errors);
            }
            Self::Attrs(attrs) => {
                put_u16(buf, attrs.id, &mut errors);
                put_str(buf, &attrs.location, LOC_MAX, &mut errors);
                put_u8(buf, attrs.group_size, &mut errors);
                put_u8(buf, attrs.group_id, &mut errors);
                put_u8(buf, attrs.device_type, &mut errors);
                put_u8(buf, attrs.scale as u8, &mut errors);
                put_str(buf, &attrs.class, CLASS_MAX, &mut errors);
                put_u16(buf, attrs.range_low as u16, &mut errors);
                put_u16(buf, attrs.range_high as u16, &mut errors);
                put_u16(buf, attrs.zero_point as u16, &mut errors);
                put_str(buf, &attrs.units, UNITS_MAX, &mut errors);
            }
            Self::Control { id, action, value } => {
                put_u16(buf, *id, &mut errors);
                put_u8(buf, *action, &mut errors);
                put_u16(buf, *value as u16, &mut errors);
            }
            Self::Report { id, value } => {
                put_u16(buf, *id, &mut errors);
                put_u16(buf, *value as u16, &mut errors);
            }
        }
        errors
    }

    /// Decode the typed message from a received packet's arguments.
    ///
    /// Returns `None` when the packet's event octet is not one of the
    /// implemented events (frame validation normally rules that out
    /// before this is called). Field-level anomalies (zeroed reads past
    /// capacity, truncated strings, out-of-range values) bump the tally
    /// while decoding runs to completion.
    #[must_use]
    pub fn decode_from(pkt: &Packet) -> Option<Decoded<Self>> {
        let event = pkt.event()?;
        let buf = pkt.args();
        let mut cur = Cursor::new();
        let mut errors = SoftErrors::new();

        let value = match event {
            EventCode::Ack => Self::Ack {
                code: buf.read_u8(&mut cur, &mut errors),
                diag: buf.read_str(&mut cur, DIAG_MAX, &mut errors),
            },
            EventCode::Nack => Self::Nack {
                code: buf.read_u8(&mut cur, &mut errors),
                diag: buf.read_str(&mut cur, DIAG_MAX, &mut errors),
            },
            EventCode::Hello => Self::Hello,
            EventCode::IAmHere => {
                let id = buf.read_u16(&mut cur, &mut errors);
                let group_size = buf.read_u8(&mut cur, &mut errors);
                let group_id = buf.read_u8(&mut cur, &mut errors);
                if group_id < 1 || group_id > group_size {
                    warn!(group_id, group_size, "group id outside group range");
                    errors.bump();
                }
                Self::IAmHere {
                    id,
                    group_size,
                    group_id,
                }
            }
            EventCode::UAre => Self::UAre {
                group_id: buf.read_u8(&mut cur, &mut errors),
                id: buf.read_u16(&mut cur, &mut errors),
                location: buf.read_str(&mut cur, LOC_MAX, &mut errors),
            },
            EventCode::Forget => Self::Forget {
                group_id: buf.read_u8(&mut cur, &mut errors),
            },
            EventCode::UAlive => Self::UAlive {
                id: buf.read_u16(&mut cur, &mut errors),
            },
            EventCode::Query => Self::Query {
                group_id: buf.read_u8(&mut cur, &mut errors),
            },
            EventCode::Attrs => Self::Attrs(DeviceAttrs {
                id: buf.read_u16(&mut cur, &mut errors),
                location: buf.read_str(&mut cur, LOC_MAX, &mut errors),
                group_size: buf.read_u8(&mut cur, &mut errors),
                group_id: buf.read_u8(&mut cur, &mut errors),
                device_type: buf.read_u8(&mut cur, &mut errors),
                scale: buf.read_u8(&mut cur, &mut errors) as i8,
                class: buf.read_str(&mut cur, CLASS_MAX, &mut errors),
                range_low: buf.read_u16(&mut cur, &mut errors) as i16,
                range_high: buf.read_u16(&mut cur, &mut errors) as i16,
                zero_point: buf.read_u16(&mut cur, &mut errors) as i16,
                units: buf.read_str(&mut cur, UNITS_MAX, &mut errors),
            }),
            EventCode::AttrChg => Self::AttrChg {
                id: buf.read_u16(&mut cur, &mut errors),
            },
            EventCode::Control => {
                let id = buf.read_u16(&mut cur, &mut errors);
                let action = buf.read_u8(&mut cur, &mut errors);
                let value = buf.read_u16(&mut cur, &mut errors) as i16;
                if Action::from_u8(action).is_none() {
                    warn!(action, "control action not one of SET/READ");
                    errors.bump();
                }
                Self::Control { id, action, value }
            }
            EventCode::Report => Self::Report {
                id: buf.read_u16(&mut cur, &mut errors),
                value: buf.read_u16(&mut cur, &mut errors) as i16,
            },
        };

        Some(Decoded {
            value,
            soft_errors: errors,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::{EventClass, PROTOCOL_VERSION, RetCode};

    /// Encode, push through the wire frame, and decode again.
    fn wire_roundtrip(msg: &Message) -> Decoded<Message> {
        let mut out = Packet::new();
        let errors = msg.encode_into(&mut out);
        assert!(errors.is_clean(), "encode reported errors: {errors:?}");
        out.set_version(PROTOCOL_VERSION);
        out.set_trans_id(42);

        let mut inp = Packet::new();
        inp.receive(&out.encode()).unwrap();
        assert_eq!(inp.trans_id(), 42);
        Message::decode_from(&inp).unwrap()
    }

    #[test]
    fn test_roundtrip_every_schema() {
        let messages = [
            Message::Ack {
                code: RetCode::Ok.as_u8(),
                diag: String::from("fine"),
            },
            Message::Nack {
                code: RetCode::Malformed.as_u8(),
                diag: String::from("can't parse packet"),
            },
            Message::Hello,
            Message::IAmHere {
                id: 301,
                group_size: 4,
                group_id: 2,
            },
            Message::UAre {
                group_id: 2,
                id: 301,
                location: String::from("kitchen"),
            },
            Message::Forget { group_id: 2 },
            Message::UAlive { id: 301 },
            Message::Query { group_id: 1 },
            Message::Attrs(DeviceAttrs {
                id: 301,
                location: String::from("kitchen"),
                group_size: 4,
                group_id: 2,
                device_type: 2,
                scale: -1,
                class: String::from("thermometer"),
                range_low: -400,
                range_high: 1250,
                zero_point: 0,
                units: String::from("degrees C"),
            }),
            Message::AttrChg { id: 301 },
            Message::Control {
                id: 301,
                action: Action::Set.as_u8(),
                value: -75,
            },
            Message::Report { id: 301, value: -75 },
        ];

        for msg in messages {
            let decoded = wire_roundtrip(&msg);
            assert!(decoded.soft_errors.is_clean(), "soft errors for {msg:?}");
            assert_eq!(decoded.value, msg);
        }
    }

    #[test]
    fn test_iamhere_group_range_is_soft_error() {
        let msg = Message::IAmHere {
            id: 9,
            group_size: 3,
            group_id: 5,
        };
        let mut pkt = Packet::new();
        msg.encode_into(&mut pkt);

        let decoded = Message::decode_from(&pkt).unwrap();
        assert_eq!(decoded.soft_errors.count(), 1);
        // The degraded message is still delivered in full.
        assert_eq!(decoded.value, msg);
    }

    #[test]
    fn test_group_id_zero_is_out_of_range() {
        let msg = Message::IAmHere {
            id: 9,
            group_size: 3,
            group_id: 0,
        };
        let mut pkt = Packet::new();
        msg.encode_into(&mut pkt);
        let decoded = Message::decode_from(&pkt).unwrap();
        assert_eq!(decoded.soft_errors.count(), 1);
    }

    #[test]
    fn test_control_action_validated() {
        let msg = Message::Control {
            id: 1,
            action: 9,
            value: 0,
        };
        let mut pkt = Packet::new();
        msg.encode_into(&mut pkt);
        let decoded = Message::decode_from(&pkt).unwrap();
        assert_eq!(decoded.soft_errors.count(), 1);
        assert_eq!(decoded.value, msg);
    }

    #[test]
    fn test_overlong_location_truncates_but_stays_sendable() {
        let msg = Message::UAre {
            group_id: 1,
            id: 7,
            location: String::from("ThisIsAVeryLongLocationName"),
        };
        let mut pkt = Packet::new();
        let errors = msg.encode_into(&mut pkt);
        assert_eq!(errors.count(), 1);

        let decoded = Message::decode_from(&pkt).unwrap();
        assert!(decoded.soft_errors.is_clean());
        assert_eq!(
            decoded.value,
            Message::UAre {
                group_id: 1,
                id: 7,
                location: String::from("ThisIsAVeryL"),
            }
        );
    }

    #[test]
    fn test_empty_frame_decodes_to_zeroed_fields() {
        // A REPORT with no argument octets: reads stay within capacity
        // over the zeroed tail, so the fields come back as zeros with a
        // clean tally.
        let mut pkt = Packet::new();
        pkt.receive(&[PROTOCOL_VERSION, EventCode::Report.as_u8(), 0, 0])
            .unwrap();
        let decoded = Message::decode_from(&pkt).unwrap();
        assert_eq!(decoded.value, Message::Report { id: 0, value: 0 });
    }

    #[test]
    fn test_reserved_codes_recognized() {
        // The five reserved v1 events must classify as reserved, not
        // unknown, and must not decode.
        for code in [100u8, 101, 102, 150, 151] {
            assert!(matches!(EventCode::classify(code), EventClass::Reserved(_)));
        }
    }

    // Property-based tests
    #[cfg(test)]
    mod proptests {
        use super::*;
        use proptest::prelude::*;

        fn short_string() -> impl Strategy<Value = String> {
            "[A-Za-z0-9 ]{0,12}"
        }

        proptest! {
            /// Property: in-limit ATTRS values roundtrip exactly.
            #[test]
            fn prop_attrs_roundtrip(
                id in any::<u16>(),
                location in short_string(),
                group_size in 1u8..=8,
                group_id in 1u8..=8,
                device_type in 1u8..=6,
                scale in any::<i8>(),
                class in short_string(),
                range_low in any::<i16>(),
                range_high in any::<i16>(),
                zero_point in any::<i16>(),
                units in short_string(),
            ) {
                let msg = Message::Attrs(DeviceAttrs {
                    id, location, group_size, group_id, device_type,
                    scale, class, range_low, range_high, zero_point, units,
                });
                let mut pkt = Packet::new();
                let errors = msg.encode_into(&mut pkt);
                prop_assert!(errors.is_clean());
                let decoded = Message::decode_from(&pkt).unwrap();
                prop_assert!(decoded.soft_errors.is_clean());
                prop_assert_eq!(decoded.value, msg);
            }

            /// Property: CONTROL roundtrips for both defined actions and
            /// any value.
            #[test]
            fn prop_control_roundtrip(
                id in any::<u16>(),
                action in 1u8..=2,
                value in any::<i16>(),
            ) {
                let msg = Message::Control { id, action, value };
                let mut pkt = Packet::new();
                msg.encode_into(&mut pkt);
                let decoded = Message::decode_from(&pkt).unwrap();
                prop_assert!(decoded.soft_errors.is_clean());
                prop_assert_eq!(decoded.value, msg);
            }

            /// Property: encoded frames never exceed the maximum packet
            /// size, whatever the inputs.
            #[test]
            fn prop_encode_never_oversizes(
                code in any::<u8>(),
                diag in "[ -~]{0,80}",
            ) {
                let msg = Message::Nack { code, diag };
                let mut pkt = Packet::new();
                msg.encode_into(&mut pkt);
                pkt.set_version(PROTOCOL_VERSION);
                let frame = pkt.encode();
                prop_assert!(frame.len() <= crate::protocol::MAX_PKT_SIZE);
            }
        }
    }
}
