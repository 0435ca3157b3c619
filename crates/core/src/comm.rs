//! Error classification and device status.
//!
//! The core never retries. Callers that run a monitoring loop use the
//! classification to decide whether to re-run discovery, prompt the user,
//! or give up.

use crate::error::Error;
use crate::store::ConfigStore;
use tracing::debug;

/// Classification of device errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    /// Device is absent or was unplugged; discovery may succeed later.
    Disconnected,
    /// The OS refused access to the interface.
    PermissionDenied,
    /// The device rejected or partially consumed a report.
    Protocol,
    /// Unexpected sizes, unsupported values, or host-side failures.
    InvalidData,
}

impl ErrorClass {
    pub fn classify(err: &Error) -> Self {
        match err {
            Error::DeviceNotFound(_) => Self::Disconnected,
            Error::DeviceUnavailable(msg) | Error::Io(msg) | Error::Hid(msg) => {
                let lower = msg.to_lowercase();
                if lower.contains("permission")
                    || lower.contains("access denied")
                    || lower.contains("access is denied")
                {
                    Self::PermissionDenied
                } else if matches!(err, Error::DeviceUnavailable(_))
                    || lower.contains("disconnect")
                    || lower.contains("no such device")
                {
                    Self::Disconnected
                } else {
                    Self::InvalidData
                }
            }
            Error::Protocol { .. } => Self::Protocol,
            Error::SizeMismatch { .. } | Error::NotLoaded | Error::Unsupported { .. } => {
                Self::InvalidData
            }
        }
    }

    /// Whether re-running discovery could help.
    pub fn should_rediscover(&self) -> bool {
        matches!(self, Self::Disconnected)
    }

    /// User-facing suggestion.
    pub fn hint(&self) -> &'static str {
        match self {
            Self::Disconnected => "check that the mouse is plugged in (wired or via its receiver)",
            Self::PermissionDenied => {
                "grant access to the hidraw node (udev rule for VID 3367) or run with elevated rights"
            }
            Self::Protocol => "the device rejected the report; reload the configuration and retry",
            Self::InvalidData => "unexpected data from the device; the firmware may be unsupported",
        }
    }
}

/// Device connection status for display.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceStatus {
    /// Device is connected and responding.
    Connected,
    /// Device is not found / disconnected.
    Disconnected,
    /// Permission denied; needs udev/driver setup.
    PermissionError,
    /// Communication error.
    Error,
}

/// Check connectivity with a firmware version query.
pub fn check_device_status(store: &ConfigStore) -> DeviceStatus {
    match store.query_version() {
        Ok(version) => {
            debug!(%version, "Device responded");
            DeviceStatus::Connected
        }
        Err(ref e) => match ErrorClass::classify(e) {
            ErrorClass::Disconnected => DeviceStatus::Disconnected,
            ErrorClass::PermissionDenied => DeviceStatus::PermissionError,
            _ => DeviceStatus::Error,
        },
    }
}
