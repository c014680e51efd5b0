use case_types::{ConfigError, SupportSpec};
use geom_engine::{EngineError, SolidHandle};
use support_ops::{OpError, SupportSolids};
use uuid::Uuid;

/// One support on an instrument.
#[derive(Debug, Clone, PartialEq)]
pub struct SupportEntry {
    /// Unique identifier.
    pub id: Uuid,
    /// User-visible name, `<instrument>_S<n>`.
    pub name: String,
    /// Parameters the solids are built from.
    pub spec: SupportSpec,
    /// Generated solids, all four or none.
    pub solids: Option<SupportSolids>,
}

/// A registered instrument and its supports.
#[derive(Debug, Clone, PartialEq)]
pub struct InstrumentEntry {
    /// Unique identifier.
    pub id: Uuid,
    /// The instrument solid. Owned by the engine.
    pub instrument: SolidHandle,
    /// Object name at registration, used as the support name prefix.
    pub name: String,
    /// Ordered supports.
    pub supports: Vec<SupportEntry>,
    /// Selected support, if any.
    pub support_index: Option<usize>,
    /// Supports ever added; only grows, so generated names stay unique.
    pub support_count: u32,
}

/// Errors from session commands.
#[derive(Debug, Clone, thiserror::Error)]
pub enum SessionError {
    #[error("command '{command}' is not available")]
    Unavailable { command: &'static str },

    #[error("index {index} out of range for {len} entries")]
    IndexOutOfRange { index: usize, len: usize },

    #[error("support operation failed: {0}")]
    Op(#[from] OpError),

    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("engine error: {0}")]
    Engine(#[from] EngineError),
}
