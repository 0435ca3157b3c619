//! Polling rate encoding.
//!
//! The sensor reports at a fixed 8 kHz base rate; the configuration record
//! stores a divisor applied to it:
//!   1 = 8000 Hz, 2 = 4000 Hz, 4 = 2000 Hz, 8 = 1000 Hz
//!
//! A lower divisor means a higher effective polling rate.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Base report rate before the divisor is applied.
pub const BASE_RATE_HZ: u32 = 8000;

/// Polling rates the firmware accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum PollingRate {
    Hz8000 = 1,
    Hz4000 = 2,
    Hz2000 = 4,
    Hz1000 = 8,
}

impl PollingRate {
    /// All supported rates, fastest first.
    pub const ALL: &'static [PollingRate] = &[
        PollingRate::Hz8000,
        PollingRate::Hz4000,
        PollingRate::Hz2000,
        PollingRate::Hz1000,
    ];

    /// Convert from the raw record divisor.
    pub fn from_divisor(divisor: u8) -> Option<Self> {
        match divisor {
            1 => Some(Self::Hz8000),
            2 => Some(Self::Hz4000),
            4 => Some(Self::Hz2000),
            8 => Some(Self::Hz1000),
            _ => None,
        }
    }

    /// Convert from a rate in Hz.
    pub fn from_hz(hz: u32) -> Option<Self> {
        Self::ALL.iter().copied().find(|r| r.as_hz() == hz)
    }

    /// Raw record divisor.
    pub fn divisor(&self) -> u8 {
        *self as u8
    }

    pub fn as_hz(&self) -> u32 {
        BASE_RATE_HZ / self.divisor() as u32
    }
}

impl fmt::Display for PollingRate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} Hz", self.as_hz())
    }
}

/// The two profiles an external monitor switches between.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RateProfile {
    /// Maximum polling rate.
    High,
    /// Reduced polling rate for applications that stutter at 8 kHz.
    Low,
}

impl RateProfile {
    pub fn rate(&self) -> PollingRate {
        match self {
            Self::High => PollingRate::Hz8000,
            Self::Low => PollingRate::Hz1000,
        }
    }

    /// Parse a profile name (case-insensitive): "high"/"8k", "low"/"1k".
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_lowercase().as_str() {
            "high" | "8k" | "max" => Some(Self::High),
            "low" | "1k" => Some(Self::Low),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn divisor_roundtrip() {
        for rate in PollingRate::ALL {
            assert_eq!(PollingRate::from_divisor(rate.divisor()), Some(*rate));
        }
    }

    #[test]
    fn lower_divisor_is_faster() {
        assert_eq!(PollingRate::Hz8000.divisor(), 1);
        assert_eq!(PollingRate::Hz1000.divisor(), 8);
        assert!(PollingRate::Hz8000.as_hz() > PollingRate::Hz1000.as_hz());
    }

    #[test]
    fn from_hz_accepts_known_rates() {
        assert_eq!(PollingRate::from_hz(8000), Some(PollingRate::Hz8000));
        assert_eq!(PollingRate::from_hz(2000), Some(PollingRate::Hz2000));
        assert_eq!(PollingRate::from_hz(1000), Some(PollingRate::Hz1000));
    }

    #[test]
    fn rejects_unknown_values() {
        assert_eq!(PollingRate::from_divisor(0), None);
        assert_eq!(PollingRate::from_divisor(3), None);
        assert_eq!(PollingRate::from_hz(500), None);
    }

    #[test]
    fn profiles_map_to_extremes() {
        assert_eq!(RateProfile::High.rate().divisor(), 1);
        assert_eq!(RateProfile::Low.rate().divisor(), 8);
    }

    #[test]
    fn profile_from_name() {
        assert_eq!(RateProfile::from_name("HIGH"), Some(RateProfile::High));
        assert_eq!(RateProfile::from_name("1k"), Some(RateProfile::Low));
        assert_eq!(RateProfile::from_name("medium"), None);
    }

    #[test]
    fn display_in_hz() {
        assert_eq!(PollingRate::Hz4000.to_string(), "4000 Hz");
    }
}
