use serde::{Deserialize, Serialize};

use crate::error::{check_min, ConfigError};

/// Per-support dimensional parameters. All lengths in metres.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SupportSpec {
    /// Offset along the instrument axis from the instrument's origin.
    pub position: f64,
    /// Pad wall thickness.
    pub thickness: f64,
    /// Span of the support along the instrument axis.
    pub support_dim_x: f64,
    /// How far the support extends beyond the pad on each side.
    pub extension: f64,
    /// Gap between the base and lid halves.
    pub separation: f64,
    /// Minimum distance the flange reaches past the support side.
    pub flange_extension: f64,
    /// Minimum flange thickness.
    pub flange_dim_z: f64,
    pub screw_diam: f64,
    pub screw_length: f64,
    /// Nut diameter across corners.
    pub nut_diam: f64,
    pub washer_diam: f64,
    pub washer_depth: f64,
    pub slot_length: f64,
}

impl SupportSpec {
    pub const MIN: SupportSpec = SupportSpec {
        position: 0.025,
        thickness: 0.005,
        support_dim_x: 0.005,
        extension: 0.005,
        separation: 0.002,
        flange_extension: 0.01,
        flange_dim_z: 0.003,
        screw_diam: 0.003,
        screw_length: 0.016,
        nut_diam: 0.006,
        washer_diam: 0.006,
        washer_depth: 0.0005,
        slot_length: 0.010,
    };

    pub fn validate(&self) -> Result<(), ConfigError> {
        let min = Self::MIN;
        check_min("position", self.position, min.position)?;
        check_min("thickness", self.thickness, min.thickness)?;
        check_min("support_dim_x", self.support_dim_x, min.support_dim_x)?;
        check_min("extension", self.extension, min.extension)?;
        check_min("separation", self.separation, min.separation)?;
        check_min("flange_extension", self.flange_extension, min.flange_extension)?;
        check_min("flange_dim_z", self.flange_dim_z, min.flange_dim_z)?;
        check_min("screw_diam", self.screw_diam, min.screw_diam)?;
        check_min("screw_length", self.screw_length, min.screw_length)?;
        check_min("nut_diam", self.nut_diam, min.nut_diam)?;
        check_min("washer_diam", self.washer_diam, min.washer_diam)?;
        check_min("washer_depth", self.washer_depth, min.washer_depth)?;
        check_min("slot_length", self.slot_length, min.slot_length)?;
        Ok(())
    }

    /// Overwrite the fastener fields with scene-level fittings.
    pub fn apply_fittings(&mut self, fittings: &FittingsSpec) {
        self.screw_diam = fittings.screw_diam;
        self.screw_length = fittings.screw_length;
        self.nut_diam = fittings.nut_diam;
        self.washer_diam = fittings.washer_diam;
        self.washer_depth = fittings.washer_depth;
    }
}

impl Default for SupportSpec {
    fn default() -> Self {
        Self {
            position: 0.025,
            thickness: 0.005,
            support_dim_x: 0.025,
            extension: 0.005,
            separation: 0.002,
            flange_extension: 0.01,
            flange_dim_z: 0.003,
            screw_diam: 0.0048,
            screw_length: 0.016,
            nut_diam: 0.00882,
            washer_diam: 0.00982,
            washer_depth: 0.00095,
            slot_length: 0.010,
        }
    }
}

/// Case wall and L-section bracket stock dimensions.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MaterialSpec {
    pub ext_ply_thickness: f64,
    pub int_ply_thickness: f64,
    pub l_sec_width: f64,
    pub l_sec_thickness: f64,
}

impl MaterialSpec {
    pub const MIN: MaterialSpec = MaterialSpec {
        ext_ply_thickness: 0.005,
        int_ply_thickness: 0.005,
        l_sec_width: 0.020,
        l_sec_thickness: 0.005,
    };

    pub fn validate(&self) -> Result<(), ConfigError> {
        let min = Self::MIN;
        check_min("ext_ply_thickness", self.ext_ply_thickness, min.ext_ply_thickness)?;
        check_min("int_ply_thickness", self.int_ply_thickness, min.int_ply_thickness)?;
        check_min("l_sec_width", self.l_sec_width, min.l_sec_width)?;
        check_min("l_sec_thickness", self.l_sec_thickness, min.l_sec_thickness)?;
        Ok(())
    }
}

impl Default for MaterialSpec {
    fn default() -> Self {
        Self::MIN
    }
}

/// Scene-level fastener dimensions, copied into new supports.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FittingsSpec {
    pub screw_diam: f64,
    pub screw_length: f64,
    pub nut_diam: f64,
    pub washer_diam: f64,
    pub washer_depth: f64,
}

impl FittingsSpec {
    pub fn validate(&self) -> Result<(), ConfigError> {
        let min = SupportSpec::MIN;
        check_min("screw_diam", self.screw_diam, min.screw_diam)?;
        check_min("screw_length", self.screw_length, min.screw_length)?;
        check_min("nut_diam", self.nut_diam, min.nut_diam)?;
        check_min("washer_diam", self.washer_diam, min.washer_diam)?;
        check_min("washer_depth", self.washer_depth, min.washer_depth)?;
        Ok(())
    }
}

impl Default for FittingsSpec {
    fn default() -> Self {
        let s = SupportSpec::default();
        Self {
            screw_diam: s.screw_diam,
            screw_length: s.screw_length,
            nut_diam: s.nut_diam,
            washer_diam: s.washer_diam,
            washer_depth: s.washer_depth,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        SupportSpec::default().validate().unwrap();
        MaterialSpec::default().validate().unwrap();
        FittingsSpec::default().validate().unwrap();
        SupportSpec::MIN.validate().unwrap();
    }

    #[test]
    fn test_below_minimum_is_rejected() {
        let spec = SupportSpec {
            separation: 0.001,
            ..Default::default()
        };
        assert_eq!(
            spec.validate(),
            Err(ConfigError::BelowMinimum {
                field: "separation",
                value: 0.001,
                min: 0.002,
            })
        );
    }

    #[test]
    fn test_nan_is_rejected() {
        let m = MaterialSpec {
            l_sec_thickness: f64::NAN,
            ..Default::default()
        };
        assert!(matches!(
            m.validate(),
            Err(ConfigError::NotFinite {
                field: "l_sec_thickness"
            })
        ));
    }

    #[test]
    fn test_apply_fittings_overwrites_fasteners_only() {
        let mut spec = SupportSpec {
            position: 0.3,
            ..Default::default()
        };
        let fittings = FittingsSpec {
            screw_diam: 0.006,
            screw_length: 0.02,
            nut_diam: 0.01,
            washer_diam: 0.012,
            washer_depth: 0.001,
        };
        spec.apply_fittings(&fittings);
        assert_eq!(spec.screw_diam, 0.006);
        assert_eq!(spec.screw_length, 0.02);
        assert_eq!(spec.nut_diam, 0.01);
        assert_eq!(spec.washer_diam, 0.012);
        assert_eq!(spec.washer_depth, 0.001);
        assert_eq!(spec.position, 0.3);
        assert_eq!(spec.slot_length, SupportSpec::default().slot_length);
    }
}
