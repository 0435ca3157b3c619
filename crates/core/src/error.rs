//! Error types for pollswitch-core.

use thiserror::Error;

/// Core library error type.
#[derive(Debug, Error)]
pub enum Error {
    /// hidapi context could not be created or refreshed.
    #[error("HID error: {0}")]
    Hid(String),

    /// Discovery matched no HID interface.
    #[error("device not found: {0}")]
    DeviceNotFound(String),

    /// A resolved path could not be opened (permissions, unplugged).
    #[error("device unavailable: {0}")]
    DeviceUnavailable(String),

    /// Transport-level failure or short read.
    #[error("I/O error: {0}")]
    Io(String),

    /// A buffer handed to the codec has the wrong length.
    #[error("size mismatch: expected {expected} bytes, got {actual}")]
    SizeMismatch { expected: usize, actual: usize },

    /// The device consumed only part of a feature report.
    #[error("protocol error: opcode 0x{opcode:04x} wrote {written} of {expected} bytes")]
    Protocol {
        opcode: u16,
        written: usize,
        expected: usize,
    },

    /// A pending change cannot be stored before the device state was loaded.
    #[error("configuration not loaded from device")]
    NotLoaded,

    /// Value the firmware does not accept.
    #[error("unsupported {field}: {value}")]
    Unsupported { field: &'static str, value: u32 },
}

/// Convenience Result alias.
pub type Result<T> = std::result::Result<T, Error>;
