//! Device model: discovery and opening of the vendor configuration interface.

use crate::error::{Error, Result};
use crate::transport::{FeatureTransport, HidFeatureTransport};
use std::ffi::CString;
use std::fmt;
use std::sync::{Mutex, PoisonError};
use tracing::{debug, info, warn};

/// USB Vendor ID of the supported mouse.
pub const VENDOR_ID: u16 = 0x3367;
/// USB Product ID of the supported mouse.
pub const PRODUCT_ID: u16 = 0x1966;
/// HID usage of the vendor configuration collection.
pub const CONFIG_USAGE: u16 = 0x0002;
/// Vendor-defined usage page of the configuration collection.
pub const CONFIG_USAGE_PAGE: u16 = 0xFF01;

/// Identifiers of the HID interface that carries configuration reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeviceSelector {
    pub vendor_id: u16,
    pub product_id: u16,
    pub usage: u16,
    pub usage_page: u16,
}

/// Selector for the supported mouse.
pub const DEFAULT_SELECTOR: DeviceSelector = DeviceSelector {
    vendor_id: VENDOR_ID,
    product_id: PRODUCT_ID,
    usage: CONFIG_USAGE,
    usage_page: CONFIG_USAGE_PAGE,
};

impl Default for DeviceSelector {
    fn default() -> Self {
        DEFAULT_SELECTOR
    }
}

impl DeviceSelector {
    /// All four identifiers must match.
    pub fn matches(&self, iface: &HidInterface) -> bool {
        iface.vendor_id == self.vendor_id
            && iface.product_id == self.product_id
            && iface.usage == self.usage
            && iface.usage_page == self.usage_page
    }
}

impl fmt::Display for DeviceSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "VID=0x{:04X} PID=0x{:04X} usage=0x{:04X} usage_page=0x{:04X}",
            self.vendor_id, self.product_id, self.usage, self.usage_page
        )
    }
}

/// One enumerated HID interface.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HidInterface {
    pub vendor_id: u16,
    pub product_id: u16,
    pub usage: u16,
    pub usage_page: u16,
    pub interface_number: i32,
    pub path: String,
    pub product: Option<String>,
}

impl HidInterface {
    fn from_info(info: &hidapi::DeviceInfo) -> Self {
        Self {
            vendor_id: info.vendor_id(),
            product_id: info.product_id(),
            usage: info.usage(),
            usage_page: info.usage_page(),
            interface_number: info.interface_number(),
            path: info.path().to_string_lossy().into_owned(),
            product: info.product_string().map(|s| s.to_string()),
        }
    }
}

/// Host HID access: enumeration plus opening a path.
pub trait DeviceBackend: Send + Sync {
    /// List every HID interface currently present.
    fn enumerate(&self) -> Result<Vec<HidInterface>>;

    /// Open a transport handle on `path`. The handle closes on drop.
    fn open(&self, path: &str) -> Result<Box<dyn FeatureTransport>>;
}

/// [`DeviceBackend`] over hidapi.
pub struct HidBackend {
    api: Mutex<hidapi::HidApi>,
}

impl HidBackend {
    pub fn new() -> Result<Self> {
        let api = hidapi::HidApi::new().map_err(|e| Error::Hid(e.to_string()))?;
        Ok(Self {
            api: Mutex::new(api),
        })
    }
}

impl DeviceBackend for HidBackend {
    fn enumerate(&self) -> Result<Vec<HidInterface>> {
        let mut api = self.api.lock().unwrap_or_else(PoisonError::into_inner);
        api.refresh_devices()
            .map_err(|e| Error::Hid(format!("refresh devices: {e}")))?;
        Ok(api.device_list().map(HidInterface::from_info).collect())
    }

    fn open(&self, path: &str) -> Result<Box<dyn FeatureTransport>> {
        let c_path = CString::new(path)
            .map_err(|e| Error::DeviceUnavailable(format!("invalid path {path:?}: {e}")))?;
        let api = self.api.lock().unwrap_or_else(PoisonError::into_inner);
        let device = api
            .open_path(&c_path)
            .map_err(|e| Error::DeviceUnavailable(format!("open {path}: {e}")))?;
        debug!(path, "Opened configuration interface");
        Ok(Box::new(HidFeatureTransport::new(device)))
    }
}

/// Find the configuration interface matching `selector`.
///
/// Fails with `DeviceNotFound` when nothing matches; the first match wins
/// when several do.
pub fn resolve_device(
    backend: &dyn DeviceBackend,
    selector: &DeviceSelector,
) -> Result<HidInterface> {
    debug!(%selector, "Starting HID device enumeration");
    let interfaces = backend.enumerate()?;
    let total = interfaces.len();

    let mut matching = interfaces.into_iter().filter(|i| selector.matches(i));
    let Some(found) = matching.next() else {
        debug!(total, "No matching interface");
        return Err(Error::DeviceNotFound(selector.to_string()));
    };

    let extra = matching.count();
    if extra > 0 {
        warn!(extra, "Several matching interfaces, using the first");
    }

    info!(
        vid = format_args!("0x{:04X}", found.vendor_id),
        pid = format_args!("0x{:04X}", found.product_id),
        interface = found.interface_number,
        path = %found.path,
        "Found configuration interface"
    );
    Ok(found)
}

/// Every interface belonging to `selector`'s vendor and product, matching or not.
pub fn list_interfaces(
    backend: &dyn DeviceBackend,
    selector: &DeviceSelector,
) -> Result<Vec<HidInterface>> {
    let interfaces = backend.enumerate()?;
    Ok(interfaces
        .into_iter()
        .filter(|i| i.vendor_id == selector.vendor_id && i.product_id == selector.product_id)
        .collect())
}
