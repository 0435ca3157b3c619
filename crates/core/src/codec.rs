//! Fixed-layout encoding and decoding of the vendor feature reports.
//!
//! Two structures travel over the feature-report channel:
//! - Command envelope: 64 bytes (opcode + 62 reserved)
//! - Configuration record: 994 bytes (opcode + settings + reserved runs)
//!
//! All multi-byte integers are little-endian. Reserved runs are carried
//! verbatim: the firmware reads the record positionally, so their widths are
//! part of the wire format even where their meaning is unknown.
//!
//! Configuration record layout (absolute offsets):
//!
//! ```text
//!   0  u16       opcode
//!   2  [u8; 19]  reserved0 (17 = firmware minor, 18 = firmware major)
//!  21  u8        polling divisor
//!  22  u8        filter flags
//!  23  [u8; 2]   reserved1
//!  25  u8        lift-off distance
//!  26  bool      angle snapping
//!  27  bool      ripple control
//!  28  bool      motion sync
//!  29  [u8; 1]   reserved2
//!  30  u8        CPI level count
//!  31  [u8; 20]  reserved3
//!  51  4 x CPI   xy_split: bool, x: u16, y: u16
//!  71  [u8; 6]   reserved4
//!  77  7 x BTN   spdt_mode: u8, kind: i8, data: [u8; 5]
//! 126  u16       custom flags
//! 128  [u8; 866] reserved5
//! ```

use crate::error::{Error, Result};
use std::fmt;

/// Encoded size of a [`CommandEnvelope`].
pub const ENVELOPE_LEN: usize = 64;
/// Encoded size of a [`ConfigRecord`].
pub const RECORD_LEN: usize = 994;

/// Number of CPI profile slots in the record.
pub const CPI_SLOTS: usize = 4;
/// Number of button slots in the record.
pub const BUTTON_SLOTS: usize = 7;
/// Data bytes carried by one button mapping.
pub const MAPPING_DATA_LEN: usize = 5;

const ENVELOPE_RESERVED_LEN: usize = ENVELOPE_LEN - 2;
const RESERVED0_LEN: usize = 19;
const RESERVED1_LEN: usize = 2;
const RESERVED2_LEN: usize = 1;
const RESERVED3_LEN: usize = 20;
const RESERVED4_LEN: usize = 6;
const RESERVED5_LEN: usize = RECORD_LEN - offsets::RESERVED5;

/// Absolute byte offsets of the configuration record fields.
pub mod offsets {
    pub const OPCODE: usize = 0;
    pub const RESERVED0: usize = 2;
    /// Firmware minor version, inside reserved0.
    pub const FIRMWARE_MINOR: usize = 17;
    /// Firmware major version, inside reserved0.
    pub const FIRMWARE_MAJOR: usize = 18;
    pub const POLLING_DIVISOR: usize = 21;
    pub const FILTER_FLAGS: usize = 22;
    pub const RESERVED1: usize = 23;
    pub const LIFT_OFF_DISTANCE: usize = 25;
    pub const ANGLE_SNAPPING: usize = 26;
    pub const RIPPLE_CONTROL: usize = 27;
    pub const MOTION_SYNC: usize = 28;
    pub const RESERVED2: usize = 29;
    pub const CPI_LEVELS: usize = 30;
    pub const RESERVED3: usize = 31;
    pub const CPIS: usize = 51;
    pub const RESERVED4: usize = 71;
    pub const BUTTONS: usize = 77;
    pub const CUSTOM_FLAGS: usize = 126;
    pub const RESERVED5: usize = 128;
}

/// Device operation codes. The low byte doubles as the HID report ID.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u16)]
pub enum OpCode {
    None = 0x00a1,
    StoreConfig = 0x11a0,
    LoadConfig = 0x12a1,
    FactoryReset = 0x13a1,
    FirmwareVersion = 0x02a1,
}

impl OpCode {
    /// Look up an opcode from its raw wire value.
    pub fn from_raw(raw: u16) -> Option<Self> {
        match raw {
            0x00a1 => Some(Self::None),
            0x11a0 => Some(Self::StoreConfig),
            0x12a1 => Some(Self::LoadConfig),
            0x13a1 => Some(Self::FactoryReset),
            0x02a1 => Some(Self::FirmwareVersion),
            _ => None,
        }
    }

    /// Raw wire value.
    pub fn raw(&self) -> u16 {
        *self as u16
    }

    /// Short name for logs.
    pub fn name(&self) -> &'static str {
        match self {
            Self::None => "none",
            Self::StoreConfig => "store-config",
            Self::LoadConfig => "load-config",
            Self::FactoryReset => "factory-reset",
            Self::FirmwareVersion => "firmware-version",
        }
    }
}

impl fmt::Display for OpCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (0x{:04x})", self.name(), self.raw())
    }
}

/// Fail with `SizeMismatch` unless `data` is exactly `expected` bytes.
fn check_len(data: &[u8], expected: usize) -> Result<()> {
    if data.len() != expected {
        return Err(Error::SizeMismatch {
            expected,
            actual: data.len(),
        });
    }
    Ok(())
}

struct Writer {
    buf: Vec<u8>,
}

impl Writer {
    fn with_capacity(len: usize) -> Self {
        Self {
            buf: Vec::with_capacity(len),
        }
    }

    fn u8(&mut self, v: u8) {
        self.buf.push(v);
    }

    fn i8(&mut self, v: i8) {
        self.buf.push(v as u8);
    }

    fn bool(&mut self, v: bool) {
        self.buf.push(v as u8);
    }

    fn u16(&mut self, v: u16) {
        self.buf.extend_from_slice(&v.to_le_bytes());
    }

    fn bytes(&mut self, v: &[u8]) {
        self.buf.extend_from_slice(v);
    }

    fn finish(self) -> Vec<u8> {
        self.buf
    }
}

/// Sequential reader over a buffer whose length was already checked.
struct Reader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    fn u8(&mut self) -> u8 {
        let v = self.data[self.pos];
        self.pos += 1;
        v
    }

    fn i8(&mut self) -> i8 {
        self.u8() as i8
    }

    fn bool(&mut self) -> bool {
        self.u8() != 0
    }

    fn u16(&mut self) -> u16 {
        let v = u16::from_le_bytes([self.data[self.pos], self.data[self.pos + 1]]);
        self.pos += 2;
        v
    }

    fn array<const N: usize>(&mut self) -> [u8; N] {
        let mut out = [0u8; N];
        out.copy_from_slice(&self.data[self.pos..self.pos + N]);
        self.pos += N;
        out
    }
}

/// Opcode-only request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandEnvelope {
    pub opcode: u16,
    pub reserved: [u8; ENVELOPE_RESERVED_LEN],
}

impl CommandEnvelope {
    /// Envelope for `op` with zeroed padding.
    pub fn new(op: OpCode) -> Self {
        Self {
            opcode: op.raw(),
            reserved: [0; ENVELOPE_RESERVED_LEN],
        }
    }

    pub fn encode(&self) -> Vec<u8> {
        let mut w = Writer::with_capacity(ENVELOPE_LEN);
        w.u16(self.opcode);
        w.bytes(&self.reserved);
        w.finish()
    }

    pub fn decode(data: &[u8]) -> Result<Self> {
        check_len(data, ENVELOPE_LEN)?;
        let mut r = Reader::new(data);
        Ok(Self {
            opcode: r.u16(),
            reserved: r.array(),
        })
    }
}

/// One CPI (sensitivity) profile slot.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Cpi {
    /// X and Y sensitivities are set independently.
    pub xy_split: bool,
    pub x: u16,
    pub y: u16,
}

/// Action bound to a button: a signed type discriminant plus data bytes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Mapping {
    pub kind: i8,
    pub data: [u8; MAPPING_DATA_LEN],
}

/// One button slot.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ButtonConfig {
    /// Switch debounce mode (see [`crate::buttons::SpdtMode`]).
    pub spdt_mode: u8,
    pub mapping: Mapping,
}

/// Full device settings as exchanged by load and store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigRecord {
    pub opcode: u16,
    pub reserved0: [u8; RESERVED0_LEN],
    pub polling_divisor: u8,
    pub filter_flags: u8,
    pub reserved1: [u8; RESERVED1_LEN],
    pub lift_off_distance: u8,
    pub angle_snapping: bool,
    pub ripple_control: bool,
    pub motion_sync: bool,
    pub reserved2: [u8; RESERVED2_LEN],
    pub cpi_levels: u8,
    pub reserved3: [u8; RESERVED3_LEN],
    pub cpis: [Cpi; CPI_SLOTS],
    pub reserved4: [u8; RESERVED4_LEN],
    pub buttons: [ButtonConfig; BUTTON_SLOTS],
    pub custom_flags: u16,
    pub reserved5: [u8; RESERVED5_LEN],
}

impl Default for ConfigRecord {
    fn default() -> Self {
        Self {
            opcode: OpCode::None.raw(),
            reserved0: [0; RESERVED0_LEN],
            polling_divisor: 0,
            filter_flags: 0,
            reserved1: [0; RESERVED1_LEN],
            lift_off_distance: 0,
            angle_snapping: false,
            ripple_control: false,
            motion_sync: false,
            reserved2: [0; RESERVED2_LEN],
            cpi_levels: 0,
            reserved3: [0; RESERVED3_LEN],
            cpis: [Cpi::default(); CPI_SLOTS],
            reserved4: [0; RESERVED4_LEN],
            buttons: [ButtonConfig::default(); BUTTON_SLOTS],
            custom_flags: 0,
            reserved5: [0; RESERVED5_LEN],
        }
    }
}

impl ConfigRecord {
    /// Encode into exactly [`RECORD_LEN`] bytes.
    pub fn encode(&self) -> Vec<u8> {
        let mut w = Writer::with_capacity(RECORD_LEN);
        w.u16(self.opcode);
        w.bytes(&self.reserved0);
        w.u8(self.polling_divisor);
        w.u8(self.filter_flags);
        w.bytes(&self.reserved1);
        w.u8(self.lift_off_distance);
        w.bool(self.angle_snapping);
        w.bool(self.ripple_control);
        w.bool(self.motion_sync);
        w.bytes(&self.reserved2);
        w.u8(self.cpi_levels);
        w.bytes(&self.reserved3);
        for cpi in &self.cpis {
            w.bool(cpi.xy_split);
            w.u16(cpi.x);
            w.u16(cpi.y);
        }
        w.bytes(&self.reserved4);
        for button in &self.buttons {
            w.u8(button.spdt_mode);
            w.i8(button.mapping.kind);
            w.bytes(&button.mapping.data);
        }
        w.u16(self.custom_flags);
        w.bytes(&self.reserved5);
        w.finish()
    }

    /// Decode a record. The buffer must be exactly [`RECORD_LEN`] bytes.
    pub fn decode(data: &[u8]) -> Result<Self> {
        check_len(data, RECORD_LEN)?;
        let mut r = Reader::new(data);
        let opcode = r.u16();
        let reserved0 = r.array();
        let polling_divisor = r.u8();
        let filter_flags = r.u8();
        let reserved1 = r.array();
        let lift_off_distance = r.u8();
        let angle_snapping = r.bool();
        let ripple_control = r.bool();
        let motion_sync = r.bool();
        let reserved2 = r.array();
        let cpi_levels = r.u8();
        let reserved3 = r.array();
        let cpis = std::array::from_fn(|_| Cpi {
            xy_split: r.bool(),
            x: r.u16(),
            y: r.u16(),
        });
        let reserved4 = r.array();
        let buttons = std::array::from_fn(|_| ButtonConfig {
            spdt_mode: r.u8(),
            mapping: Mapping {
                kind: r.i8(),
                data: r.array(),
            },
        });
        let custom_flags = r.u16();
        let reserved5 = r.array();

        Ok(Self {
            opcode,
            reserved0,
            polling_divisor,
            filter_flags,
            reserved1,
            lift_off_distance,
            angle_snapping,
            ripple_control,
            motion_sync,
            reserved2,
            cpi_levels,
            reserved3,
            cpis,
            reserved4,
            buttons,
            custom_flags,
            reserved5,
        })
    }

    /// Firmware version carried in reserved0 of a version-query response.
    pub fn firmware_version(&self) -> FirmwareVersion {
        FirmwareVersion {
            major: self.reserved0[offsets::FIRMWARE_MAJOR - offsets::RESERVED0],
            minor: self.reserved0[offsets::FIRMWARE_MINOR - offsets::RESERVED0],
        }
    }
}

/// Firmware version, rendered as unpadded lowercase hex `major.minor`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FirmwareVersion {
    pub major: u8,
    pub minor: u8,
}

impl fmt::Display for FirmwareVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:x}.{:x}", self.major, self.minor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Record with every field and reserved byte set to a distinct value.
    fn patterned_record() -> ConfigRecord {
        let mut encoded: Vec<u8> = (0..RECORD_LEN).map(|i| (i * 7 + 3) as u8).collect();
        // bool bytes only round-trip as 0/1
        for off in [
            offsets::ANGLE_SNAPPING,
            offsets::RIPPLE_CONTROL,
            offsets::MOTION_SYNC,
        ] {
            encoded[off] = (off % 2) as u8;
        }
        for slot in 0..CPI_SLOTS {
            encoded[offsets::CPIS + slot * 5] = (slot % 2) as u8;
        }
        ConfigRecord::decode(&encoded).unwrap()
    }

    #[test]
    fn envelope_is_64_bytes() {
        let env = CommandEnvelope::new(OpCode::LoadConfig);
        let encoded = env.encode();
        assert_eq!(encoded.len(), ENVELOPE_LEN);
        assert_eq!(&encoded[..2], &[0xa1, 0x12]);
        assert!(encoded[2..].iter().all(|&b| b == 0));
    }

    #[test]
    fn envelope_decode_rejects_wrong_length() {
        let err = CommandEnvelope::decode(&[0xa1, 0x12]).unwrap_err();
        assert!(matches!(
            err,
            Error::SizeMismatch {
                expected: 64,
                actual: 2
            }
        ));
    }

    #[test]
    fn envelope_decode_reads_opcode() {
        let mut data = vec![0u8; ENVELOPE_LEN];
        data[0] = 0xa1;
        data[1] = 0x13;
        data[63] = 0x55;
        let env = CommandEnvelope::decode(&data).unwrap();
        assert_eq!(OpCode::from_raw(env.opcode), Some(OpCode::FactoryReset));
        assert_eq!(env.reserved[61], 0x55);
    }

    #[test]
    fn record_default_encodes_to_fixed_size() {
        assert_eq!(ConfigRecord::default().encode().len(), RECORD_LEN);
    }

    #[test]
    fn record_size_independent_of_values() {
        let mut rec = patterned_record();
        assert_eq!(rec.encode().len(), RECORD_LEN);
        rec.custom_flags = u16::MAX;
        rec.cpis[3].x = u16::MAX;
        rec.buttons[6].mapping.kind = -1;
        assert_eq!(rec.encode().len(), RECORD_LEN);
    }

    #[test]
    fn record_roundtrip_preserves_reserved_bytes() {
        let rec = patterned_record();
        let decoded = ConfigRecord::decode(&rec.encode()).unwrap();
        assert_eq!(decoded, rec);
        assert_eq!(decoded.reserved5, rec.reserved5);
        assert_eq!(decoded.reserved3, rec.reserved3);
    }

    #[test]
    fn record_fields_land_at_fixed_offsets() {
        let mut rec = ConfigRecord::default();
        rec.opcode = OpCode::StoreConfig.raw();
        rec.polling_divisor = 8;
        rec.filter_flags = 0x3c;
        rec.lift_off_distance = 2;
        rec.angle_snapping = true;
        rec.motion_sync = true;
        rec.cpi_levels = 4;
        rec.cpis[0] = Cpi {
            xy_split: true,
            x: 0x0320,
            y: 0x0640,
        };
        rec.cpis[3].y = 0xbeef;
        rec.buttons[0].spdt_mode = 0xf1;
        rec.buttons[0].mapping = Mapping {
            kind: 9,
            data: [1, 2, 3, 4, 5],
        };
        rec.buttons[6].mapping.kind = -1;
        rec.custom_flags = 0x1234;
        rec.reserved5[RESERVED5_LEN - 1] = 0xee;

        let buf = rec.encode();
        assert_eq!(&buf[0..2], &[0xa0, 0x11]);
        assert_eq!(buf[offsets::POLLING_DIVISOR], 8);
        assert_eq!(buf[offsets::FILTER_FLAGS], 0x3c);
        assert_eq!(buf[offsets::LIFT_OFF_DISTANCE], 2);
        assert_eq!(buf[offsets::ANGLE_SNAPPING], 1);
        assert_eq!(buf[offsets::RIPPLE_CONTROL], 0);
        assert_eq!(buf[offsets::MOTION_SYNC], 1);
        assert_eq!(buf[offsets::CPI_LEVELS], 4);
        assert_eq!(
            &buf[offsets::CPIS..offsets::CPIS + 5],
            &[0x01, 0x20, 0x03, 0x40, 0x06]
        );
        assert_eq!(&buf[offsets::CPIS + 18..offsets::CPIS + 20], &[0xef, 0xbe]);
        assert_eq!(
            &buf[offsets::BUTTONS..offsets::BUTTONS + 7],
            &[0xf1, 0x09, 1, 2, 3, 4, 5]
        );
        assert_eq!(buf[offsets::BUTTONS + 6 * 7 + 1], 0xff);
        assert_eq!(
            &buf[offsets::CUSTOM_FLAGS..offsets::CUSTOM_FLAGS + 2],
            &[0x34, 0x12]
        );
        assert_eq!(buf[RECORD_LEN - 1], 0xee);
    }

    #[test]
    fn reserved_runs_tile_the_record() {
        assert_eq!(offsets::RESERVED0 + RESERVED0_LEN, offsets::POLLING_DIVISOR);
        assert_eq!(
            offsets::RESERVED1 + RESERVED1_LEN,
            offsets::LIFT_OFF_DISTANCE
        );
        assert_eq!(offsets::RESERVED2 + RESERVED2_LEN, offsets::CPI_LEVELS);
        assert_eq!(offsets::RESERVED3 + RESERVED3_LEN, offsets::CPIS);
        assert_eq!(offsets::CPIS + CPI_SLOTS * 5, offsets::RESERVED4);
        assert_eq!(offsets::RESERVED4 + RESERVED4_LEN, offsets::BUTTONS);
        assert_eq!(
            offsets::BUTTONS + BUTTON_SLOTS * (2 + MAPPING_DATA_LEN),
            offsets::CUSTOM_FLAGS
        );
        assert_eq!(RESERVED5_LEN, 866);
    }

    #[test]
    fn record_decode_rejects_wrong_length() {
        for len in [0, ENVELOPE_LEN, RECORD_LEN - 1, RECORD_LEN + 1] {
            let err = ConfigRecord::decode(&vec![0u8; len]).unwrap_err();
            match err {
                Error::SizeMismatch { expected, actual } => {
                    assert_eq!(expected, RECORD_LEN);
                    assert_eq!(actual, len);
                }
                other => panic!("unexpected error: {other}"),
            }
        }
    }

    #[test]
    fn bool_bytes_decode_as_nonzero() {
        let mut buf = vec![0u8; RECORD_LEN];
        buf[offsets::RIPPLE_CONTROL] = 0x02;
        let rec = ConfigRecord::decode(&buf).unwrap();
        assert!(rec.ripple_control);
        assert_eq!(rec.encode()[offsets::RIPPLE_CONTROL], 1);
    }

    #[test]
    fn mapping_kind_passes_through_unvalidated() {
        let mut buf = vec![0u8; RECORD_LEN];
        buf[offsets::BUTTONS + 1] = 0x7f;
        let rec = ConfigRecord::decode(&buf).unwrap();
        assert_eq!(rec.buttons[0].mapping.kind, 0x7f);
        assert_eq!(rec.encode(), buf);
    }

    #[test]
    fn firmware_version_formats_as_hex() {
        let mut buf = vec![0u8; RECORD_LEN];
        buf[offsets::FIRMWARE_MAJOR] = 0x1;
        buf[offsets::FIRMWARE_MINOR] = 0xa;
        let rec = ConfigRecord::decode(&buf).unwrap();
        assert_eq!(rec.firmware_version().to_string(), "1.a");

        let v = FirmwareVersion {
            major: 0x12,
            minor: 0x03,
        };
        assert_eq!(v.to_string(), "12.3");
    }

    #[test]
    fn opcode_roundtrip() {
        for op in [
            OpCode::None,
            OpCode::StoreConfig,
            OpCode::LoadConfig,
            OpCode::FactoryReset,
            OpCode::FirmwareVersion,
        ] {
            assert_eq!(OpCode::from_raw(op.raw()), Some(op));
        }
        assert_eq!(OpCode::from_raw(0xffff), None);
    }
}
