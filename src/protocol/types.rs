//! AIM event codes, control actions, and device types

use std::fmt;

/// AIM event codes
///
/// One octet in the packet header identifying the message schema. The five
/// menu/handoff codes from the v1 protocol are declared but not implemented;
/// see [`EventClass`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[repr(u8)]
pub enum EventCode {
    /// Positive acknowledgement of a request
    Ack = 1,
    /// Negative acknowledgement carrying a return code
    Nack = 2,
    /// Solicit presence announcements
    Hello = 3,
    /// Periodic presence announcement (broadcast)
    IAmHere = 4,
    /// Server assigns a device its id and location
    UAre = 5,
    /// Server tells a device to drop its id and location
    Forget = 6,
    /// Liveness check for a device id
    UAlive = 7,
    /// Request a device's attributes
    Query = 8,
    /// Attribute description, reply to QUERY
    Attrs = 9,
    /// Announcement that an attribute changed (broadcast)
    AttrChg = 10,
    /// Set or read a device value
    Control = 50,
    /// Report a device value
    Report = 51,
}

/// Reserved v1 event codes that are recognized but not implemented.
const RESERVED_EVENTS: [u8; 5] = [100, 101, 102, 150, 151];

/// Classification of a raw event octet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventClass {
    /// One of the twelve implemented events
    Implemented(EventCode),
    /// Declared in the protocol but not implemented (menu/handoff family)
    Reserved(u8),
    /// Outside every defined range
    Unknown(u8),
}

impl EventCode {
    /// Convert from byte
    #[must_use]
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            1 => Some(Self::Ack),
            2 => Some(Self::Nack),
            3 => Some(Self::Hello),
            4 => Some(Self::IAmHere),
            5 => Some(Self::UAre),
            6 => Some(Self::Forget),
            7 => Some(Self::UAlive),
            8 => Some(Self::Query),
            9 => Some(Self::Attrs),
            10 => Some(Self::AttrChg),
            50 => Some(Self::Control),
            51 => Some(Self::Report),
            _ => None,
        }
    }

    /// Convert to byte
    #[must_use]
    pub const fn as_u8(self) -> u8 {
        self as u8
    }

    /// Classify a raw event octet as implemented, reserved, or unknown.
    #[must_use]
    pub fn classify(value: u8) -> EventClass {
        match Self::from_u8(value) {
            Some(event) => EventClass::Implemented(event),
            None if RESERVED_EVENTS.contains(&value) => EventClass::Reserved(value),
            None => EventClass::Unknown(value),
        }
    }

    /// Check if this event is an announcement, always sent to the subnet
    /// broadcast address regardless of the requested destination.
    #[must_use]
    pub const fn is_announcement(self) -> bool {
        matches!(self, Self::IAmHere | Self::AttrChg)
    }

    /// Check if this event is a reply correlating to an earlier request.
    #[must_use]
    pub const fn is_reply(self) -> bool {
        matches!(self, Self::Ack | Self::Nack)
    }
}

impl fmt::Display for EventCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Ack => "ACK",
            Self::Nack => "NACK",
            Self::Hello => "HELLO",
            Self::IAmHere => "IAMHERE",
            Self::UAre => "UARE",
            Self::Forget => "FORGET",
            Self::UAlive => "UALIVE",
            Self::Query => "QUERY",
            Self::Attrs => "ATTRS",
            Self::AttrChg => "ATTRCHG",
            Self::Control => "CONTROL",
            Self::Report => "REPORT",
        };
        write!(f, "{name}")
    }
}

/// CONTROL packet actions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[repr(u8)]
pub enum Action {
    /// Set the device to the supplied value
    Set = 1,
    /// Read the device value: 0 = report once, n > 0 = report every n ms
    Read = 2,
}

impl Action {
    /// Convert from byte
    #[must_use]
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            1 => Some(Self::Set),
            2 => Some(Self::Read),
            _ => None,
        }
    }

    /// Convert to byte
    #[must_use]
    pub const fn as_u8(self) -> u8 {
        self as u8
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Set => "SET",
            Self::Read => "READ",
        };
        write!(f, "{name}")
    }
}

/// AIM device types carried in the ATTRS schema.
///
/// New types may be defined over time; the ATTRS schema carries the raw
/// octet so unrecognized types pass through undisturbed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[repr(u8)]
pub enum DeviceType {
    /// The coordinating server (GRAMS)
    Server = 1,
    /// Monitored device
    Monitored = 2,
    /// Controlled device
    Controlled = 3,
    /// Smart (menu-driven) device
    Smart = 4,
    /// Local menu-driver and controller
    Menu = 5,
    /// Display device
    Display = 6,
}

impl DeviceType {
    /// Convert from byte
    #[must_use]
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            1 => Some(Self::Server),
            2 => Some(Self::Monitored),
            3 => Some(Self::Controlled),
            4 => Some(Self::Smart),
            5 => Some(Self::Menu),
            6 => Some(Self::Display),
            _ => None,
        }
    }

    /// Convert to byte
    #[must_use]
    pub const fn as_u8(self) -> u8 {
        self as u8
    }
}

impl fmt::Display for DeviceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Server => "SERVER",
            Self::Monitored => "MONITORED",
            Self::Controlled => "CONTROLLED",
            Self::Smart => "SMART",
            Self::Menu => "MENU",
            Self::Display => "DISPLAY",
        };
        write!(f, "{name}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_code_roundtrip() {
        let codes = [
            EventCode::Ack,
            EventCode::Query,
            EventCode::Control,
            EventCode::Report,
        ];

        for code in codes {
            let byte = code.as_u8();
            let decoded = EventCode::from_u8(byte).unwrap();
            assert_eq!(code, decoded);
        }
    }

    #[test]
    fn test_classify_reserved_vs_unknown() {
        assert!(matches!(
            EventCode::classify(4),
            EventClass::Implemented(EventCode::IAmHere)
        ));
        for reserved in [100, 101, 102, 150, 151] {
            assert_eq!(EventCode::classify(reserved), EventClass::Reserved(reserved));
        }
        assert_eq!(EventCode::classify(0), EventClass::Unknown(0));
        assert_eq!(EventCode::classify(0xC8), EventClass::Unknown(0xC8));
    }

    #[test]
    fn test_announcement_events() {
        assert!(EventCode::IAmHere.is_announcement());
        assert!(EventCode::AttrChg.is_announcement());
        assert!(!EventCode::Report.is_announcement());
    }

    #[test]
    fn test_action_from_u8() {
        assert_eq!(Action::from_u8(1), Some(Action::Set));
        assert_eq!(Action::from_u8(2), Some(Action::Read));
        assert_eq!(Action::from_u8(3), None);
    }
}
