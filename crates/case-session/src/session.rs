//! The case session: instrument and support lists plus the commands that
//! edit them.
//!
//! Every command has a `can_*` predicate; calling a command whose predicate is
//! false returns [`SessionError::Unavailable`] and changes nothing.

use std::collections::HashSet;

use tracing::{info, instrument, warn};
use uuid::Uuid;

use case_types::{
    check_clearance, Case, FittingsSpec, MaterialSpec, Orientation, Settings, SupportSpec,
};
use geom_engine::{GeometryEngine, SolidHandle};
use support_ops::{build_support, recompute_case, SupportSolids};

use crate::entries::reselect;
use crate::types::{InstrumentEntry, SessionError, SupportEntry};
use crate::view::SessionView;

/// Delete a support's solids, skipping any already gone from the engine.
fn delete_solids(
    engine: &mut dyn GeometryEngine,
    solids: &SupportSolids,
) -> Result<(), SessionError> {
    for handle in solids.handles() {
        if engine.contains(handle) {
            engine.delete(handle)?;
        } else {
            warn!(%handle, "support solid already deleted");
        }
    }
    Ok(())
}

fn ensure(available: bool, command: &'static str) -> Result<(), SessionError> {
    if available {
        Ok(())
    } else {
        Err(SessionError::Unavailable { command })
    }
}

/// Scene state for one case design.
#[derive(Debug, Clone, Default)]
pub struct CaseSession {
    settings: Settings,
    case: Case,
    instruments: Vec<InstrumentEntry>,
    instrument_index: Option<usize>,
}

impl CaseSession {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a session from validated settings.
    pub fn with_settings(settings: Settings) -> Result<Self, SessionError> {
        settings.validate()?;
        Ok(Self {
            settings,
            ..Self::default()
        })
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn case(&self) -> &Case {
        &self.case
    }

    pub fn instruments(&self) -> &[InstrumentEntry] {
        &self.instruments
    }

    pub fn instrument_index(&self) -> Option<usize> {
        self.instrument_index
    }

    pub fn current_instrument(&self) -> Option<&InstrumentEntry> {
        self.instrument_index.and_then(|i| self.instruments.get(i))
    }

    fn current_instrument_mut(&mut self) -> Option<&mut InstrumentEntry> {
        self.instrument_index.and_then(|i| self.instruments.get_mut(i))
    }

    pub fn current_support(&self) -> Option<&SupportEntry> {
        self.current_instrument()
            .and_then(InstrumentEntry::current_support)
    }

    pub fn view(&self) -> SessionView {
        SessionView::from(self)
    }

    // ── Selection ─────────────────────────────────────────────────────────

    pub fn select_instrument(&mut self, index: usize) -> Result<(), SessionError> {
        let len = self.instruments.len();
        if index >= len {
            return Err(SessionError::IndexOutOfRange { index, len });
        }
        self.instrument_index = Some(index);
        Ok(())
    }

    pub fn select_support(&mut self, index: usize) -> Result<(), SessionError> {
        let entry = self
            .current_instrument_mut()
            .ok_or(SessionError::Unavailable {
                command: "select_support",
            })?;
        let len = entry.supports.len();
        if index >= len {
            return Err(SessionError::IndexOutOfRange { index, len });
        }
        entry.support_index = Some(index);
        Ok(())
    }

    // ── Instruments ───────────────────────────────────────────────────────

    /// True when `objects` is non-empty, free of repeats and holds no
    /// registered instrument.
    pub fn can_add_instrument(&self, objects: &[SolidHandle]) -> bool {
        let mut seen = HashSet::new();
        !objects.is_empty()
            && objects.iter().all(|o| {
                seen.insert(*o) && !self.instruments.iter().any(|i| i.instrument == *o)
            })
    }

    /// Register instruments, select the last one and recompute the case.
    pub fn add_instrument(
        &mut self,
        engine: &mut dyn GeometryEngine,
        objects: &[SolidHandle],
    ) -> Result<(), SessionError> {
        ensure(self.can_add_instrument(objects), "add_instrument")?;
        let names = objects
            .iter()
            .map(|&o| engine.name(o))
            .collect::<Result<Vec<_>, _>>()?;
        for (&object, name) in objects.iter().zip(names) {
            info!(%object, %name, "instrument added");
            self.instruments.push(InstrumentEntry::new(object, name));
        }
        self.instrument_index = Some(self.instruments.len() - 1);
        self.recompute_case(engine)
    }

    pub fn can_remove_instrument(&self) -> bool {
        self.current_instrument().is_some()
    }

    /// Delete every support solid of the current instrument, unregister it
    /// and recompute the case. The instrument solid itself is kept.
    pub fn remove_instrument(
        &mut self,
        engine: &mut dyn GeometryEngine,
    ) -> Result<(), SessionError> {
        ensure(self.can_remove_instrument(), "remove_instrument")?;
        let index = self.instrument_index.unwrap_or(0);
        // a failed delete leaves the entry listed with its remaining solids
        for support in &mut self.instruments[index].supports {
            if let Some(solids) = support.solids {
                delete_solids(engine, &solids)?;
                support.solids = None;
            }
        }
        let entry = self.instruments.remove(index);
        self.instrument_index = reselect(index, self.instruments.len());
        info!(name = %entry.name, supports = entry.supports.len(), "instrument removed");
        self.recompute_case(engine)
    }

    /// Recompute the case from every registered instrument.
    pub fn recompute_case(&mut self, engine: &mut dyn GeometryEngine) -> Result<(), SessionError> {
        let handles: Vec<SolidHandle> = self.instruments.iter().map(|i| i.instrument).collect();
        self.case = recompute_case(engine, &handles, self.settings.clearance)?;
        Ok(())
    }

    // ── Supports ──────────────────────────────────────────────────────────

    pub fn can_add_support(&self) -> bool {
        self.current_instrument().is_some()
    }

    /// New support on the current instrument from the support defaults.
    /// Its position starts at the default position.
    pub fn add_support(&mut self) -> Result<Uuid, SessionError> {
        ensure(self.can_add_support(), "add_support")?;
        let spec = SupportSpec {
            position: SupportSpec::default().position,
            ..self.settings.support_defaults
        };
        let entry = self
            .current_instrument_mut()
            .ok_or(SessionError::Unavailable {
                command: "add_support",
            })?;
        let id = entry.push_support(spec);
        info!(instrument = %entry.name, support = %id, "support added");
        Ok(id)
    }

    pub fn can_copy_support(&self) -> bool {
        self.current_support().is_some()
    }

    /// New support with the current support's parameters, position included.
    pub fn copy_support(&mut self) -> Result<Uuid, SessionError> {
        let spec = self
            .current_support()
            .map(|s| s.spec)
            .ok_or(SessionError::Unavailable {
                command: "copy_support",
            })?;
        let entry = self
            .current_instrument_mut()
            .ok_or(SessionError::Unavailable {
                command: "copy_support",
            })?;
        let id = entry.push_support(spec);
        info!(instrument = %entry.name, support = %id, "support copied");
        Ok(id)
    }

    pub fn can_remove_support(&self) -> bool {
        self.current_support().is_some()
    }

    /// Remove the current support, deleting its solids if generated.
    pub fn remove_support(&mut self, engine: &mut dyn GeometryEngine) -> Result<(), SessionError> {
        ensure(self.can_remove_support(), "remove_support")?;
        let removed = self
            .current_instrument_mut()
            .and_then(InstrumentEntry::remove_current_support)
            .ok_or(SessionError::Unavailable {
                command: "remove_support",
            })?;
        if let Some(solids) = &removed.solids {
            delete_solids(engine, solids)?;
        }
        info!(name = %removed.name, "support removed");
        Ok(())
    }

    pub fn can_remove_support_geometry(&self) -> bool {
        self.current_support().is_some_and(|s| s.solids.is_some())
    }

    /// Delete the current support's solids and keep the entry.
    pub fn remove_support_geometry(
        &mut self,
        engine: &mut dyn GeometryEngine,
    ) -> Result<(), SessionError> {
        let solids = self
            .current_instrument_mut()
            .and_then(InstrumentEntry::current_support_mut)
            .and_then(|s| s.solids.take())
            .ok_or(SessionError::Unavailable {
                command: "remove_support_geometry",
            })?;
        delete_solids(engine, &solids)
    }

    // ── Generation ────────────────────────────────────────────────────────

    pub fn can_generate(&self) -> bool {
        self.current_support().is_some_and(|s| s.solids.is_none())
    }

    pub fn generate_base(
        &mut self,
        engine: &mut dyn GeometryEngine,
    ) -> Result<SupportSolids, SessionError> {
        self.generate(engine, Orientation::Base)
    }

    pub fn generate_lid(
        &mut self,
        engine: &mut dyn GeometryEngine,
    ) -> Result<SupportSolids, SessionError> {
        self.generate(engine, Orientation::Lid)
    }

    /// Apply the instrument's scale and rotation, then build the current
    /// support's solids and store them on the entry.
    #[instrument(skip(self, engine))]
    pub fn generate(
        &mut self,
        engine: &mut dyn GeometryEngine,
        orientation: Orientation,
    ) -> Result<SupportSolids, SessionError> {
        ensure(self.can_generate(), "generate")?;
        let (instrument, spec, name) = match (self.current_instrument(), self.current_support()) {
            (Some(i), Some(s)) => (i.instrument, s.spec, s.name.clone()),
            _ => {
                return Err(SessionError::Unavailable {
                    command: "generate",
                })
            }
        };

        if !engine.transform(instrument)?.is_normalized() {
            engine.normalize_transform(instrument, true, true)?;
            // applied scale changes the instrument's extent
            self.recompute_case(engine)?;
        }
        let solids = build_support(
            engine,
            instrument,
            &self.case,
            &spec,
            &self.settings.materials,
            orientation,
            &name,
        )?;
        if let Some(entry) = self
            .current_instrument_mut()
            .and_then(InstrumentEntry::current_support_mut)
        {
            entry.solids = Some(solids);
        }
        Ok(solids)
    }

    // ── Settings ──────────────────────────────────────────────────────────

    /// Set the clearance and recompute the case.
    pub fn set_clearance(
        &mut self,
        engine: &mut dyn GeometryEngine,
        clearance: f64,
    ) -> Result<(), SessionError> {
        check_clearance(clearance)?;
        self.settings.clearance = clearance;
        self.recompute_case(engine)
    }

    /// Store scene fittings and copy them into the support defaults.
    /// Existing supports keep their own values.
    pub fn set_fittings(&mut self, fittings: FittingsSpec) -> Result<(), SessionError> {
        fittings.validate()?;
        self.settings.fittings = fittings;
        self.settings.support_defaults.apply_fittings(&fittings);
        Ok(())
    }

    pub fn set_support_defaults(&mut self, spec: SupportSpec) -> Result<(), SessionError> {
        spec.validate()?;
        self.settings.support_defaults = spec;
        Ok(())
    }

    pub fn set_materials(&mut self, materials: MaterialSpec) -> Result<(), SessionError> {
        materials.validate()?;
        self.settings.materials = materials;
        Ok(())
    }

    /// Edit the current support's parameters. Its solids must be removed first.
    pub fn set_support_spec(&mut self, spec: SupportSpec) -> Result<(), SessionError> {
        ensure(self.can_generate(), "set_support_spec")?;
        spec.validate()?;
        if let Some(entry) = self
            .current_instrument_mut()
            .and_then(InstrumentEntry::current_support_mut)
        {
            entry.spec = spec;
        }
        Ok(())
    }
}
