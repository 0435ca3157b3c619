//! Serializable view of a device configuration record.

use crate::buttons::{ButtonAction, SpdtMode};
use crate::codec::{ConfigRecord, FirmwareVersion};
use crate::rate::PollingRate;
use serde::{Deserialize, Serialize};

/// One CPI slot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CpiProfile {
    pub xy_split: bool,
    pub x: u16,
    pub y: u16,
}

/// One button slot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ButtonProfile {
    pub index: usize,
    pub spdt_mode: SpdtMode,
    pub action: ButtonAction,
    /// Human-readable action.
    pub label: String,
}

/// Decoded settings of a mouse, without the reserved regions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    pub firmware: Option<String>,
    pub polling_divisor: u8,
    /// `None` when the divisor is not one the firmware documents.
    pub polling_rate: Option<PollingRate>,
    pub filter_flags: u8,
    pub lift_off_distance: u8,
    pub angle_snapping: bool,
    pub ripple_control: bool,
    pub motion_sync: bool,
    pub cpi_levels: u8,
    pub cpis: Vec<CpiProfile>,
    pub buttons: Vec<ButtonProfile>,
    pub custom_flags: u16,
}

impl Profile {
    pub fn from_record(record: &ConfigRecord, firmware: Option<FirmwareVersion>) -> Self {
        let cpis = record
            .cpis
            .iter()
            .map(|c| CpiProfile {
                xy_split: c.xy_split,
                x: c.x,
                y: c.y,
            })
            .collect();
        let buttons = record
            .buttons
            .iter()
            .enumerate()
            .map(|(index, b)| {
                let action = ButtonAction::from_mapping(&b.mapping);
                ButtonProfile {
                    index,
                    spdt_mode: SpdtMode::from_raw(b.spdt_mode),
                    label: action.to_string(),
                    action,
                }
            })
            .collect();

        Self {
            firmware: firmware.map(|v| v.to_string()),
            polling_divisor: record.polling_divisor,
            polling_rate: PollingRate::from_divisor(record.polling_divisor),
            filter_flags: record.filter_flags,
            lift_off_distance: record.lift_off_distance,
            angle_snapping: record.angle_snapping,
            ripple_control: record.ripple_control,
            motion_sync: record.motion_sync,
            cpi_levels: record.cpi_levels,
            cpis,
            buttons,
            custom_flags: record.custom_flags,
        }
    }

    /// Active CPI slots, limited by the level count.
    pub fn active_cpis(&self) -> &[CpiProfile] {
        let n = (self.cpi_levels as usize).min(self.cpis.len());
        &self.cpis[..n]
    }

    pub fn to_json_pretty(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::buttons::mouse_keys;
    use crate::codec::{BUTTON_SLOTS, CPI_SLOTS};

    fn sample_record() -> ConfigRecord {
        let mut rec = ConfigRecord {
            polling_divisor: 1,
            cpi_levels: 2,
            motion_sync: true,
            ..ConfigRecord::default()
        };
        rec.cpis[0].x = 800;
        rec.cpis[0].y = 800;
        rec.cpis[1].x = 1600;
        rec.cpis[1].y = 3200;
        rec.cpis[1].xy_split = true;
        rec.buttons[0].mapping = ButtonAction::Mouse(mouse_keys::LEFT).to_mapping();
        rec.buttons[5].spdt_mode = 0xf1;
        rec.buttons[5].mapping = ButtonAction::CpiLoop.to_mapping();
        rec
    }

    #[test]
    fn profile_reflects_record() {
        let fw = FirmwareVersion { major: 1, minor: 0xb };
        let p = Profile::from_record(&sample_record(), Some(fw));
        assert_eq!(p.firmware.as_deref(), Some("1.b"));
        assert_eq!(p.polling_rate, Some(PollingRate::Hz8000));
        assert!(p.motion_sync);
        assert_eq!(p.cpis.len(), CPI_SLOTS);
        assert_eq!(p.buttons.len(), BUTTON_SLOTS);
        assert_eq!(p.buttons[0].label, "Left Click");
        assert_eq!(p.buttons[5].spdt_mode, SpdtMode::Speed);
        assert_eq!(p.buttons[5].action, ButtonAction::CpiLoop);
    }

    #[test]
    fn active_cpis_follow_level_count() {
        let p = Profile::from_record(&sample_record(), None);
        let active = p.active_cpis();
        assert_eq!(active.len(), 2);
        assert!(active[1].xy_split);
        assert_eq!(active[1].y, 3200);
    }

    #[test]
    fn unknown_divisor_has_no_rate() {
        let rec = ConfigRecord {
            polling_divisor: 3,
            ..ConfigRecord::default()
        };
        let p = Profile::from_record(&rec, None);
        assert_eq!(p.polling_rate, None);
        assert_eq!(p.polling_divisor, 3);
    }

    #[test]
    fn profile_serialization_roundtrip() {
        let profile = Profile::from_record(&sample_record(), None);
        let json = profile.to_json_pretty().expect("serialize profile");
        let deserialized: Profile = serde_json::from_str(&json).expect("deserialize profile");
        assert_eq!(deserialized, profile);
    }
}
