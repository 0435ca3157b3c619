//! pollswitch-core: feature-report protocol, device discovery, and the
//! cached configuration store for 8 kHz gaming mice (VID 0x3367).
//!
//! The device exposes one 994-byte settings record over a vendor-defined
//! HID interface. This crate reads it, changes the polling divisor, and
//! writes the whole record back with the handshake bytes the firmware
//! requires.

pub mod buttons;
pub mod codec;
pub mod comm;
pub mod device;
pub mod error;
pub mod profile;
pub mod protocol;
pub mod rate;
pub mod safety;
pub mod store;
pub mod transport;

pub use codec::{ConfigRecord, FirmwareVersion, OpCode};
pub use device::{DeviceSelector, DEFAULT_SELECTOR};
pub use error::{Error, Result};
pub use rate::{PollingRate, RateProfile};
pub use store::ConfigStore;
