//! Safety layer: validates outgoing requests and record contents before
//! anything is sent to the device.
//!
//! The codec carries values verbatim. Everything that decides whether a
//! value may reach the firmware lives here.
//!
//! ## Opcodes
//! Only the five known opcodes are ever sent. Unknown opcodes could address
//! bootloader or calibration functions whose effects are not understood.
//!
//! ## Polling divisor
//! - **Supported values**: 1, 2, 4, 8 (8000, 4000, 2000, 1000 Hz)
//! - A record holding any other divisor is refused by the store exchange,
//!   which also keeps a never-loaded, all-zero record off the device.
//!
//! Every other settings byte, CPI level count included, is written back as
//! the device reported it.

use crate::codec::{ConfigRecord, OpCode};
use crate::error::{Error, Result};
use crate::rate::PollingRate;

/// Risk notice for user-facing output about device writes.
pub const FLASH_DISCLAIMER: &str = "\
WARNING: Storing a configuration rewrites the mouse's complete settings record, \
including undocumented handshake bytes. Values are checked against known-safe sets \
before sending, but an unexpected firmware revision could still misinterpret them. \
Use at your own risk; a factory reset restores the shipped settings.";

/// Opcodes that may be sent to the device.
const ALLOWED_OPCODES: &[OpCode] = &[
    OpCode::None,
    OpCode::StoreConfig,
    OpCode::LoadConfig,
    OpCode::FactoryReset,
    OpCode::FirmwareVersion,
];

/// Validate the opcode of an outgoing report.
pub fn validate_opcode(raw: u16) -> Result<OpCode> {
    OpCode::from_raw(raw)
        .filter(|op| ALLOWED_OPCODES.contains(op))
        .ok_or(Error::Unsupported {
            field: "opcode",
            value: raw as u32,
        })
}

/// Validate a raw polling divisor.
pub fn validate_polling_divisor(divisor: u8) -> Result<PollingRate> {
    PollingRate::from_divisor(divisor).ok_or(Error::Unsupported {
        field: "polling_divisor",
        value: divisor as u32,
    })
}

/// Check a record before it is stored.
pub fn validate_record(record: &ConfigRecord) -> Result<()> {
    validate_polling_divisor(record.polling_divisor)?;
    Ok(())
}
