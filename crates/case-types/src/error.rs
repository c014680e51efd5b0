/// A parameter was rejected at the input boundary.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConfigError {
    #[error("{field} = {value} is below its minimum of {min}")]
    BelowMinimum {
        field: &'static str,
        value: f64,
        min: f64,
    },

    #[error("{field} = {value} is above its maximum of {max}")]
    AboveMaximum {
        field: &'static str,
        value: f64,
        max: f64,
    },

    #[error("{field} must be a finite number")]
    NotFinite { field: &'static str },

    #[error("settings could not be parsed: {reason}")]
    Parse { reason: String },
}

/// Reject non-finite values and values below `min`.
pub fn check_min(field: &'static str, value: f64, min: f64) -> Result<(), ConfigError> {
    if !value.is_finite() {
        return Err(ConfigError::NotFinite { field });
    }
    if value < min {
        return Err(ConfigError::BelowMinimum { field, value, min });
    }
    Ok(())
}

/// Reject values outside `[min, max]`.
pub fn check_range(field: &'static str, value: f64, min: f64, max: f64) -> Result<(), ConfigError> {
    check_min(field, value, min)?;
    if value > max {
        return Err(ConfigError::AboveMaximum { field, value, max });
    }
    Ok(())
}
