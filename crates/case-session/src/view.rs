use serde::Serialize;
use uuid::Uuid;

use case_types::{Case, SupportSpec};

use crate::session::CaseSession;

/// Serializable snapshot of the session for a UI layer. Engine handles are
/// not included; `generated` tells whether a support has solids.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionView {
    pub case: Case,
    pub clearance: f64,
    pub instrument_index: Option<usize>,
    pub instruments: Vec<InstrumentView>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InstrumentView {
    pub id: Uuid,
    pub name: String,
    pub support_index: Option<usize>,
    pub supports: Vec<SupportView>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SupportView {
    pub id: Uuid,
    pub name: String,
    pub spec: SupportSpec,
    pub generated: bool,
}

impl From<&CaseSession> for SessionView {
    fn from(session: &CaseSession) -> Self {
        Self {
            case: *session.case(),
            clearance: session.settings().clearance,
            instrument_index: session.instrument_index(),
            instruments: session
                .instruments()
                .iter()
                .map(|i| InstrumentView {
                    id: i.id,
                    name: i.name.clone(),
                    support_index: i.support_index,
                    supports: i
                        .supports
                        .iter()
                        .map(|s| SupportView {
                            id: s.id,
                            name: s.name.clone(),
                            spec: s.spec,
                            generated: s.solids.is_some(),
                        })
                        .collect(),
                })
                .collect(),
        }
    }
}
