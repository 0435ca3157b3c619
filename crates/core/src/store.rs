//! Cached device configuration with dirty tracking.
//!
//! `ConfigStore` owns the single in-memory copy of the device's settings
//! record, the resolved device path, and a dirty flag. All state sits behind
//! one mutex and every public operation (discovery, open, exchange, mutation,
//! commit) runs inside that critical section, so mutators and commits from
//! several threads are serialized.
//!
//! Lifecycle: `load` populates the record, the profile selectors mutate it
//! in memory, `commit` writes the whole record back when dirty. A failed
//! exchange never modifies the cached record. `apply_rate`/`apply_profile`
//! select and commit under one lock acquisition, so the stored record
//! carries the caller's rate even with other writers around.

use crate::codec::{ConfigRecord, FirmwareVersion};
use crate::device::{resolve_device, DeviceBackend, DeviceSelector, HidBackend};
use crate::error::{Error, Result};
use crate::protocol;
use crate::rate::{PollingRate, RateProfile};
use crate::transport::FeatureTransport;
use std::sync::{Mutex, MutexGuard, PoisonError};
use tracing::{debug, info, warn};

#[derive(Debug, Default)]
struct StoreState {
    path: Option<String>,
    record: ConfigRecord,
    loaded: bool,
    dirty: bool,
    firmware: Option<FirmwareVersion>,
}

/// The device's configuration as seen by this process.
pub struct ConfigStore {
    backend: Box<dyn DeviceBackend>,
    selector: DeviceSelector,
    state: Mutex<StoreState>,
}

impl ConfigStore {
    pub fn new(backend: Box<dyn DeviceBackend>, selector: DeviceSelector) -> Self {
        Self {
            backend,
            selector,
            state: Mutex::new(StoreState::default()),
        }
    }

    /// Store backed by hidapi.
    pub fn with_hidapi(selector: DeviceSelector) -> Result<Self> {
        Ok(Self::new(Box::new(HidBackend::new()?), selector))
    }

    pub fn selector(&self) -> &DeviceSelector {
        &self.selector
    }

    fn lock(&self) -> MutexGuard<'_, StoreState> {
        // state is only written after an exchange succeeded, so it stays
        // consistent even if a holder panicked
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn resolve_locked(&self, state: &mut StoreState) -> Result<String> {
        if let Some(path) = &state.path {
            return Ok(path.clone());
        }
        let found = resolve_device(self.backend.as_ref(), &self.selector)?;
        state.path = Some(found.path.clone());
        Ok(found.path)
    }

    /// Open a handle, run one exchange on it, and close it.
    fn exchange<T>(
        &self,
        state: &mut StoreState,
        op: impl FnOnce(&dyn FeatureTransport) -> Result<T>,
    ) -> Result<T> {
        let path = self.resolve_locked(state)?;
        let transport = match self.backend.open(&path) {
            Ok(t) => t,
            Err(e) => {
                if matches!(e, Error::DeviceUnavailable(_)) {
                    warn!(path = %path, error = %e, "Dropping cached device path");
                    state.path = None;
                }
                return Err(e);
            }
        };
        op(transport.as_ref())
    }

    /// Resolve the device path, running discovery only if none is cached.
    pub fn resolve(&self) -> Result<String> {
        let mut state = self.lock();
        self.resolve_locked(&mut state)
    }

    /// Cached device path, if discovery has succeeded.
    pub fn device_path(&self) -> Option<String> {
        self.lock().path.clone()
    }

    /// Drop the cached device path so the next operation re-runs discovery.
    pub fn forget_device(&self) {
        self.lock().path = None;
    }

    /// Query the firmware version.
    pub fn query_version(&self) -> Result<FirmwareVersion> {
        let mut state = self.lock();
        let version = self.exchange(&mut state, protocol::query_version)?;
        state.firmware = Some(version);
        Ok(version)
    }

    /// Firmware version from the last successful query.
    pub fn firmware(&self) -> Option<FirmwareVersion> {
        self.lock().firmware
    }

    /// Replace the cached record with the device's current one.
    ///
    /// Discards uncommitted changes.
    pub fn load(&self) -> Result<()> {
        let mut state = self.lock();
        let record = self.exchange(&mut state, protocol::load_config)?;
        if state.dirty {
            warn!("Discarding uncommitted changes on reload");
        }
        state.record = record;
        state.loaded = true;
        state.dirty = false;
        Ok(())
    }

    pub fn is_loaded(&self) -> bool {
        self.lock().loaded
    }

    pub fn is_dirty(&self) -> bool {
        self.lock().dirty
    }

    /// Copy of the cached record.
    pub fn snapshot(&self) -> ConfigRecord {
        self.lock().record.clone()
    }

    /// Polling rate of the cached record, if its divisor is a known one.
    pub fn polling_rate(&self) -> Option<PollingRate> {
        PollingRate::from_divisor(self.lock().record.polling_divisor)
    }

    fn set_rate_locked(state: &mut StoreState, rate: PollingRate) -> bool {
        if state.record.polling_divisor == rate.divisor() {
            debug!(%rate, "Polling rate unchanged");
            return false;
        }
        state.record.polling_divisor = rate.divisor();
        state.dirty = true;
        info!(%rate, "Polling rate changed");
        true
    }

    /// Set the cached polling rate. Marks dirty and returns true only if the
    /// divisor actually changed.
    ///
    /// Another thread may change the rate again before this one commits; use
    /// [`ConfigStore::apply_rate`] when the rate written must be this one.
    pub fn set_polling_rate(&self, rate: PollingRate) -> bool {
        Self::set_rate_locked(&mut self.lock(), rate)
    }

    pub fn select_profile(&self, profile: RateProfile) -> bool {
        self.set_polling_rate(profile.rate())
    }

    /// Select the maximum polling rate (divisor 1).
    pub fn select_high_rate_profile(&self) -> bool {
        self.select_profile(RateProfile::High)
    }

    /// Select the reduced polling rate (divisor 8).
    pub fn select_low_rate_profile(&self) -> bool {
        self.select_profile(RateProfile::Low)
    }

    /// Write pending changes to the device.
    ///
    /// Returns `Ok(false)` without touching the device when nothing is
    /// pending. On failure the dirty flag and the cached record are kept so
    /// the next commit retries the same change.
    pub fn commit(&self) -> Result<bool> {
        let mut state = self.lock();
        self.commit_locked(&mut state)
    }

    /// Set `rate` and commit it in one critical section.
    ///
    /// The record written carries exactly `rate`; no other thread can change
    /// the cached record in between. Returns whether a store was sent, so
    /// `Ok(false)` means the device already had `rate` and nothing else was
    /// pending.
    pub fn apply_rate(&self, rate: PollingRate) -> Result<bool> {
        let mut state = self.lock();
        Self::set_rate_locked(&mut state, rate);
        self.commit_locked(&mut state)
    }

    /// [`ConfigStore::apply_rate`] for a profile.
    pub fn apply_profile(&self, profile: RateProfile) -> Result<bool> {
        self.apply_rate(profile.rate())
    }

    fn commit_locked(&self, state: &mut StoreState) -> Result<bool> {
        if !state.dirty {
            debug!("Nothing to commit");
            return Ok(false);
        }
        if !state.loaded {
            return Err(Error::NotLoaded);
        }

        let pending = state.record.clone();
        match self.exchange(state, |t| protocol::store_config(t, &pending)) {
            Ok(sent) => {
                state.record = sent;
                state.dirty = false;
                Ok(true)
            }
            Err(e) => {
                warn!(error = %e, "Commit failed, change kept pending");
                Err(e)
            }
        }
    }

    /// Restore factory settings. The cached record is invalidated and must
    /// be reloaded before the next commit.
    pub fn factory_reset(&self) -> Result<()> {
        let mut state = self.lock();
        self.exchange(&mut state, protocol::factory_reset)?;
        state.record = ConfigRecord::default();
        state.loaded = false;
        state.dirty = false;
        Ok(())
    }
}
