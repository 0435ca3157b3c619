//! Button slot vocabulary: debounce modes and action mappings.
//!
//! Each of the 7 button slots holds a switch debounce mode byte followed by a
//! mapping: a signed type discriminant and 5 data bytes. The first data byte
//! carries the action code for every known mapping type:
//!   - Mouse: button bit mask (left 1, right 2, middle 4, back 8, forward 16)
//!   - Scroll: signed direction (+1 up, -1 down)
//!   - Keyboard: HID keyboard usage
//!   - CPI: target CPI level
//!   - Media: consumer-page usage (low byte)

use crate::codec::{Mapping, MAPPING_DATA_LEN};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Mouse button bits.
pub mod mouse_keys {
    pub const LEFT: u8 = 1;
    pub const RIGHT: u8 = 2;
    pub const MIDDLE: u8 = 4;
    pub const BACK: u8 = 8;
    pub const FORWARD: u8 = 16;
}

/// Scroll directions.
pub mod scroll {
    pub const UP: i8 = 1;
    pub const DOWN: i8 = -1;
}

/// Consumer-page media usages.
pub mod media_keys {
    pub const PLAY_PAUSE: u8 = 0xcd;
    pub const NEXT: u8 = 0xb5;
    pub const PREVIOUS: u8 = 0xb6;
    pub const MUTE: u8 = 0xe2;
    pub const VOLUME_UP: u8 = 0xe9;
    pub const VOLUME_DOWN: u8 = 0xea;
    pub const BROWSER: u8 = 0x96;
    pub const EXPLORER: u8 = 0x94;
}

/// Switch debounce mode of a button.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SpdtMode {
    Off,
    Safe,
    Speed,
    Unknown(u8),
}

impl SpdtMode {
    pub fn from_raw(raw: u8) -> Self {
        match raw {
            0x00 => Self::Off,
            0xf0 => Self::Safe,
            0xf1 => Self::Speed,
            other => Self::Unknown(other),
        }
    }

    pub fn raw(&self) -> u8 {
        match self {
            Self::Off => 0x00,
            Self::Safe => 0xf0,
            Self::Speed => 0xf1,
            Self::Unknown(raw) => *raw,
        }
    }
}

/// Mapping type discriminant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MappingKind {
    Mouse,
    Scroll,
    Keyboard,
    CpiLoop,
    Cpi,
    Media,
    Disabled,
    Unknown(i8),
}

impl MappingKind {
    pub fn from_raw(raw: i8) -> Self {
        match raw {
            0 => Self::Mouse,
            1 => Self::Scroll,
            2 => Self::Keyboard,
            9 => Self::CpiLoop,
            12 => Self::Cpi,
            32 => Self::Media,
            -1 => Self::Disabled,
            other => Self::Unknown(other),
        }
    }

    pub fn raw(&self) -> i8 {
        match self {
            Self::Mouse => 0,
            Self::Scroll => 1,
            Self::Keyboard => 2,
            Self::CpiLoop => 9,
            Self::Cpi => 12,
            Self::Media => 32,
            Self::Disabled => -1,
            Self::Unknown(raw) => *raw,
        }
    }
}

/// Decoded action of a button slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ButtonAction {
    /// Mouse button(s) by bit mask.
    Mouse(u8),
    ScrollUp,
    ScrollDown,
    /// Keyboard usage code.
    Key(u8),
    CpiLoop,
    /// Jump to a CPI level.
    Cpi(u8),
    /// Consumer-page usage.
    Media(u8),
    Disabled,
    /// Mapping type this crate does not interpret.
    Unknown { kind: i8, code: u8 },
}

impl ButtonAction {
    /// Interpret a raw mapping.
    pub fn from_mapping(mapping: &Mapping) -> Self {
        let code = mapping.data[0];
        match MappingKind::from_raw(mapping.kind) {
            MappingKind::Mouse => Self::Mouse(code),
            MappingKind::Scroll => match code as i8 {
                scroll::UP => Self::ScrollUp,
                scroll::DOWN => Self::ScrollDown,
                _ => Self::Unknown {
                    kind: mapping.kind,
                    code,
                },
            },
            MappingKind::Keyboard => Self::Key(code),
            MappingKind::CpiLoop => Self::CpiLoop,
            MappingKind::Cpi => Self::Cpi(code),
            MappingKind::Media => Self::Media(code),
            MappingKind::Disabled => Self::Disabled,
            MappingKind::Unknown(kind) => Self::Unknown { kind, code },
        }
    }

    /// Build the raw mapping for this action. Unused data bytes are zero.
    pub fn to_mapping(&self) -> Mapping {
        let (kind, code) = match *self {
            Self::Mouse(mask) => (MappingKind::Mouse, mask),
            Self::ScrollUp => (MappingKind::Scroll, scroll::UP as u8),
            Self::ScrollDown => (MappingKind::Scroll, scroll::DOWN as u8),
            Self::Key(usage) => (MappingKind::Keyboard, usage),
            Self::CpiLoop => (MappingKind::CpiLoop, 0),
            Self::Cpi(level) => (MappingKind::Cpi, level),
            Self::Media(usage) => (MappingKind::Media, usage),
            Self::Disabled => (MappingKind::Disabled, 0),
            Self::Unknown { kind, code } => (MappingKind::Unknown(kind), code),
        };
        let mut data = [0u8; MAPPING_DATA_LEN];
        data[0] = code;
        Mapping {
            kind: kind.raw(),
            data,
        }
    }
}

fn mouse_label(mask: u8) -> Option<&'static str> {
    match mask {
        mouse_keys::LEFT => Some("Left Click"),
        mouse_keys::RIGHT => Some("Right Click"),
        mouse_keys::MIDDLE => Some("Middle Click"),
        mouse_keys::BACK => Some("Back"),
        mouse_keys::FORWARD => Some("Forward"),
        _ => None,
    }
}

fn media_label(usage: u8) -> Option<&'static str> {
    match usage {
        media_keys::PLAY_PAUSE => Some("Play/Pause"),
        media_keys::NEXT => Some("Next Track"),
        media_keys::PREVIOUS => Some("Previous Track"),
        media_keys::MUTE => Some("Mute"),
        media_keys::VOLUME_UP => Some("Volume Up"),
        media_keys::VOLUME_DOWN => Some("Volume Down"),
        media_keys::BROWSER => Some("Browser"),
        media_keys::EXPLORER => Some("Explorer"),
        _ => None,
    }
}

impl fmt::Display for ButtonAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Mouse(mask) => match mouse_label(*mask) {
                Some(label) => f.write_str(label),
                None => write!(f, "Mouse Buttons 0x{mask:02x}"),
            },
            Self::ScrollUp => f.write_str("Scroll Up"),
            Self::ScrollDown => f.write_str("Scroll Down"),
            Self::Key(usage) => write!(f, "Key 0x{usage:02x}"),
            Self::CpiLoop => f.write_str("CPI Cycle"),
            Self::Cpi(level) => write!(f, "CPI Level {level}"),
            Self::Media(usage) => match media_label(*usage) {
                Some(label) => f.write_str(label),
                None => write!(f, "Media 0x{usage:02x}"),
            },
            Self::Disabled => f.write_str("Disabled"),
            Self::Unknown { kind, code } => write!(f, "Unknown (type {kind}, code 0x{code:02x})"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn spdt_mode_roundtrip() {
        for raw in [0x00, 0xf0, 0xf1, 0x42] {
            assert_eq!(SpdtMode::from_raw(raw).raw(), raw);
        }
        assert_eq!(SpdtMode::from_raw(0xf1), SpdtMode::Speed);
    }

    #[test]
    fn mapping_kind_roundtrip() {
        for raw in [0, 1, 2, 9, 12, 32, -1, 77] {
            assert_eq!(MappingKind::from_raw(raw).raw(), raw);
        }
        assert_eq!(MappingKind::from_raw(-1), MappingKind::Disabled);
        assert_eq!(MappingKind::from_raw(5), MappingKind::Unknown(5));
    }

    #[test]
    fn decode_mouse_mapping() {
        let m = Mapping {
            kind: 0,
            data: [mouse_keys::BACK, 0, 0, 0, 0],
        };
        let action = ButtonAction::from_mapping(&m);
        assert_eq!(action, ButtonAction::Mouse(mouse_keys::BACK));
        assert_eq!(action.to_string(), "Back");
    }

    #[test]
    fn decode_scroll_direction() {
        let up = Mapping {
            kind: 1,
            data: [0x01, 0, 0, 0, 0],
        };
        let down = Mapping {
            kind: 1,
            data: [0xff, 0, 0, 0, 0],
        };
        assert_eq!(ButtonAction::from_mapping(&up), ButtonAction::ScrollUp);
        assert_eq!(ButtonAction::from_mapping(&down), ButtonAction::ScrollDown);
    }

    #[test]
    fn decode_media_and_disabled() {
        let media = Mapping {
            kind: 32,
            data: [media_keys::MUTE, 0, 0, 0, 0],
        };
        assert_eq!(ButtonAction::from_mapping(&media).to_string(), "Mute");

        let disabled = Mapping {
            kind: -1,
            data: [0; 5],
        };
        assert_eq!(ButtonAction::from_mapping(&disabled), ButtonAction::Disabled);
    }

    #[test]
    fn unknown_kind_keeps_raw_values() {
        let m = Mapping {
            kind: 40,
            data: [0x11, 0, 0, 0, 0],
        };
        let action = ButtonAction::from_mapping(&m);
        assert_eq!(action, ButtonAction::Unknown { kind: 40, code: 0x11 });
        assert_eq!(action.to_mapping(), m);
    }

    #[test]
    fn actions_encode_to_mappings() {
        for action in [
            ButtonAction::Mouse(mouse_keys::LEFT),
            ButtonAction::ScrollUp,
            ButtonAction::ScrollDown,
            ButtonAction::Key(0x04),
            ButtonAction::CpiLoop,
            ButtonAction::Cpi(2),
            ButtonAction::Media(media_keys::NEXT),
            ButtonAction::Disabled,
        ] {
            assert_eq!(ButtonAction::from_mapping(&action.to_mapping()), action);
        }
    }
}
