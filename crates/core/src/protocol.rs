//! Opcode exchanges over feature reports.
//!
//! Every exchange starts by sending a 64-byte command envelope (or, for a
//! store, the full record) as a feature report:
//!   - FirmwareVersion (0x02a1): response is a record; version in reserved0
//!   - LoadConfig (0x12a1): response is the device's current record
//!   - StoreConfig (0x11a0): the request *is* the record; no response
//!   - FactoryReset (0x13a1): no response
//!
//! Each send is checked against the number of bytes the transport reports
//! as written. hidapi only reports success or failure for feature reports,
//! so on real hardware that count is always the full length and the
//! partial-write error comes only from transports that report counts.
//!
//! The low opcode byte sits in byte 0, which hidapi sends as the report ID.
//! Responses are read into a buffer whose leading opcode is pre-filled with
//! `OpCode::None` so that the report ID byte is 0xa1.

use crate::codec::{CommandEnvelope, ConfigRecord, FirmwareVersion, OpCode, RECORD_LEN};
use crate::error::{Error, Result};
use crate::safety;
use crate::transport::{receive_report, send_report, FeatureTransport};
use tracing::{debug, info, warn};

/// Bytes the firmware expects in reserved regions of every stored record.
///
/// Required handshake, meaning unknown. A store without them is ignored by
/// the device regardless of which settings changed.
pub mod handshake {
    /// Written to reserved2 (offset 29).
    pub const STORE_MARKER: u8 = 0x02;

    /// Written over reserved3 (offsets 31..51).
    pub const STORE_SEQUENCE_A: [u8; 20] = [
        0xff, 0xff, 0x00, 0x01, 0x01, 0x00, 0x00, 0xff, 0x01, 0x02, 0xff, 0x00, 0x00, 0x01, 0x03,
        0x00, 0xff, 0x00, 0x01, 0x04,
    ];

    /// Written over reserved4 (offsets 71..77).
    pub const STORE_SEQUENCE_B: [u8; 6] = [0x00, 0x01, 0x00, 0x00, 0x00, 0x00];
}

/// Stamp the store handshake bytes into `record`.
pub fn stamp_store_handshake(record: &mut ConfigRecord) {
    record.reserved2[0] = handshake::STORE_MARKER;
    record.reserved3 = handshake::STORE_SEQUENCE_A;
    record.reserved4 = handshake::STORE_SEQUENCE_B;
}

fn check_written(op: OpCode, written: usize, expected: usize) -> Result<()> {
    if written != expected {
        warn!(
            op = op.name(),
            written, expected, "Device consumed a partial report"
        );
        return Err(Error::Protocol {
            opcode: op.raw(),
            written,
            expected,
        });
    }
    Ok(())
}

/// Send an opcode-only command envelope.
fn send_command(transport: &dyn FeatureTransport, op: OpCode) -> Result<()> {
    let envelope = CommandEnvelope::new(op);
    safety::validate_opcode(envelope.opcode)?;
    let encoded = envelope.encode();
    debug!(op = op.name(), "Sending command");
    let written = send_report(transport, &encoded)?;
    check_written(op, written, encoded.len())
}

/// Read a record-sized response.
fn read_record(transport: &dyn FeatureTransport) -> Result<ConfigRecord> {
    let mut buf = vec![0u8; RECORD_LEN];
    buf[..2].copy_from_slice(&OpCode::None.raw().to_le_bytes());
    receive_report(transport, &mut buf)?;
    ConfigRecord::decode(&buf)
}

/// Query the firmware version.
pub fn query_version(transport: &dyn FeatureTransport) -> Result<FirmwareVersion> {
    send_command(transport, OpCode::FirmwareVersion)?;
    let response = read_record(transport)?;
    let version = response.firmware_version();
    debug!(%version, "Firmware version");
    Ok(version)
}

/// Read the device's current configuration record.
pub fn load_config(transport: &dyn FeatureTransport) -> Result<ConfigRecord> {
    send_command(transport, OpCode::LoadConfig)?;
    let record = read_record(transport)?;
    debug!(
        polling_divisor = record.polling_divisor,
        cpi_levels = record.cpi_levels,
        "Loaded configuration"
    );
    Ok(record)
}

/// Write `record` to the device.
///
/// The handshake bytes and the store opcode are applied to a copy; `record`
/// itself is untouched. Returns the record exactly as sent.
pub fn store_config(
    transport: &dyn FeatureTransport,
    record: &ConfigRecord,
) -> Result<ConfigRecord> {
    safety::validate_record(record)?;

    let mut outgoing = record.clone();
    stamp_store_handshake(&mut outgoing);
    outgoing.opcode = OpCode::StoreConfig.raw();
    safety::validate_opcode(outgoing.opcode)?;

    let encoded = outgoing.encode();
    let written = send_report(transport, &encoded)?;
    check_written(OpCode::StoreConfig, written, encoded.len())?;

    info!(
        polling_divisor = outgoing.polling_divisor,
        len = encoded.len(),
        "Stored configuration"
    );
    Ok(outgoing)
}

/// Restore the factory configuration.
pub fn factory_reset(transport: &dyn FeatureTransport) -> Result<()> {
    send_command(transport, OpCode::FactoryReset)?;
    info!("Factory reset sent");
    Ok(())
}
