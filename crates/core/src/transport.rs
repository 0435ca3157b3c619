//! Feature-report transport abstraction.
//!
//! Provides a trait-based transport layer so that real HID devices and
//! mock devices share the same interface. A transport handle is opened for a
//! single exchange and closed when dropped.

use crate::error::{Error, Result};
use tracing::trace;

/// Abstraction over raw HID feature-report I/O.
pub trait FeatureTransport {
    /// Send a feature report. Byte 0 is the report ID. Returns bytes written.
    fn send_feature_report(&self, data: &[u8]) -> Result<usize>;

    /// Read a feature report into `buf`. `buf[0]` must hold the report ID on
    /// entry. Returns bytes read.
    fn get_feature_report(&self, buf: &mut [u8]) -> Result<usize>;
}

/// Feature-report transport over an open hidapi device.
pub struct HidFeatureTransport {
    device: hidapi::HidDevice,
}

impl HidFeatureTransport {
    pub fn new(device: hidapi::HidDevice) -> Self {
        Self { device }
    }
}

impl FeatureTransport for HidFeatureTransport {
    fn send_feature_report(&self, data: &[u8]) -> Result<usize> {
        // hidapi only reports failure; a successful call consumed the whole report
        self.device
            .send_feature_report(data)
            .map_err(|e| Error::Io(format!("send_feature_report: {e}")))?;
        Ok(data.len())
    }

    fn get_feature_report(&self, buf: &mut [u8]) -> Result<usize> {
        self.device
            .get_feature_report(buf)
            .map_err(|e| Error::Io(format!("get_feature_report: {e}")))
    }
}

/// Send `data` and return the number of bytes the device accepted.
pub fn send_report(transport: &dyn FeatureTransport, data: &[u8]) -> Result<usize> {
    trace!(
        len = data.len(),
        report_hex = format_args!("{:02X?}", &data[..data.len().min(32)]),
        "feature TX"
    );
    let written = transport.send_feature_report(data)?;
    trace!(written, "feature TX done");
    Ok(written)
}

/// Read exactly `buf.len()` bytes. A short or long read is an I/O error.
pub fn receive_report(transport: &dyn FeatureTransport, buf: &mut [u8]) -> Result<()> {
    let read = transport.get_feature_report(buf)?;
    trace!(
        read,
        report_hex = format_args!("{:02X?}", &buf[..read.min(buf.len()).min(32)]),
        "feature RX"
    );
    if read != buf.len() {
        return Err(Error::Io(format!(
            "feature report read returned {read} bytes, expected {}",
            buf.len()
        )));
    }
    Ok(())
}
