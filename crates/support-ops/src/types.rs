use case_types::ConfigError;
use geom_engine::{EngineError, SolidHandle};

/// The four persistent solids produced for one support.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SupportSolids {
    /// Support body with flange and screw slots (`<name>H`).
    pub support: SolidHandle,
    /// Pad hugging the instrument (`<name>P`).
    pub pad: SolidHandle,
    /// Spacer between the pad halves (`<name>C`).
    pub clamp: SolidHandle,
    /// Plate carrying the captive nuts (`<name>N`).
    pub nut_plate: SolidHandle,
}

impl SupportSolids {
    pub fn handles(&self) -> [SolidHandle; 4] {
        [self.support, self.pad, self.clamp, self.nut_plate]
    }
}

/// Errors from support operations.
#[derive(Debug, Clone, thiserror::Error)]
pub enum OpError {
    #[error("engine error: {0}")]
    Engine(#[from] EngineError),

    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("precondition failed: {reason}")]
    Precondition { reason: String },

    #[error("expected 2 loose parts, found {found}")]
    PartCount { found: usize },
}
