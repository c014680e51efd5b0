use serde::{Deserialize, Serialize};

use crate::error::{check_range, ConfigError};
use crate::specs::{FittingsSpec, MaterialSpec, SupportSpec};

/// Scene-level configuration: clearance and the defaults new supports start from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Internal gap between the instruments and the case walls.
    pub clearance: f64,
    pub support_defaults: SupportSpec,
    pub materials: MaterialSpec,
    pub fittings: FittingsSpec,
}

impl Settings {
    pub const MIN_CLEARANCE: f64 = 0.01;
    pub const MAX_CLEARANCE: f64 = 0.05;

    /// Parse settings from JSON. Missing fields take their defaults.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let settings: Settings =
            serde_json::from_str(json).map_err(|e| ConfigError::Parse {
                reason: e.to_string(),
            })?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn to_json(&self) -> Result<String, ConfigError> {
        serde_json::to_string_pretty(self).map_err(|e| ConfigError::Parse {
            reason: e.to_string(),
        })
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        check_clearance(self.clearance)?;
        self.support_defaults.validate()?;
        self.materials.validate()?;
        self.fittings.validate()?;
        Ok(())
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            clearance: Self::MIN_CLEARANCE,
            support_defaults: SupportSpec::default(),
            materials: MaterialSpec::default(),
            fittings: FittingsSpec::default(),
        }
    }
}

pub fn check_clearance(clearance: f64) -> Result<(), ConfigError> {
    check_range(
        "clearance",
        clearance,
        Settings::MIN_CLEARANCE,
        Settings::MAX_CLEARANCE,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_json_fills_defaults() {
        let s = Settings::from_json(r#"{ "clearance": 0.02, "materials": { "l_sec_thickness": 0.006 } }"#)
            .unwrap();
        assert_eq!(s.clearance, 0.02);
        assert_eq!(s.materials.l_sec_thickness, 0.006);
        assert_eq!(s.materials.int_ply_thickness, 0.005);
        assert_eq!(s.support_defaults, SupportSpec::default());
    }

    #[test]
    fn test_json_round_trip_preserves_values() {
        let mut s = Settings::default();
        s.support_defaults.slot_length = 0.015;
        let json = s.to_json().unwrap();
        assert_eq!(Settings::from_json(&json).unwrap(), s);
    }

    #[test]
    fn test_clearance_out_of_range() {
        assert!(matches!(
            Settings::from_json(r#"{ "clearance": 0.1 }"#),
            Err(ConfigError::AboveMaximum { field: "clearance", .. })
        ));
        assert!(matches!(
            Settings::from_json(r#"{ "clearance": 0.001 }"#),
            Err(ConfigError::BelowMinimum { field: "clearance", .. })
        ));
    }

    #[test]
    fn test_malformed_json() {
        assert!(matches!(
            Settings::from_json("{ clearance"),
            Err(ConfigError::Parse { .. })
        ));
    }

    #[test]
    fn test_nested_minimum_is_enforced_on_load() {
        let r = Settings::from_json(r#"{ "support_defaults": { "thickness": 0.001 } }"#);
        assert!(matches!(
            r,
            Err(ConfigError::BelowMinimum { field: "thickness", .. })
        ));
    }
}
