use case_types::SupportSpec;
use geom_engine::SolidHandle;
use uuid::Uuid;

use crate::types::{InstrumentEntry, SupportEntry};

/// Selection after removing entry `removed` from a list now `len` long.
pub(crate) fn reselect(removed: usize, len: usize) -> Option<usize> {
    if len == 0 {
        None
    } else {
        Some(removed.saturating_sub(1).min(len - 1))
    }
}

impl InstrumentEntry {
    pub fn new(instrument: SolidHandle, name: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            instrument,
            name: name.into(),
            supports: Vec::new(),
            support_index: None,
            support_count: 0,
        }
    }

    /// Append a support with the next sequence name and select it.
    pub fn push_support(&mut self, spec: SupportSpec) -> Uuid {
        let id = Uuid::new_v4();
        self.supports.push(SupportEntry {
            id,
            name: format!("{}_S{}", self.name, self.support_count),
            spec,
            solids: None,
        });
        self.support_count += 1;
        self.support_index = Some(self.supports.len() - 1);
        id
    }

    /// Remove the selected support and select its predecessor.
    pub fn remove_current_support(&mut self) -> Option<SupportEntry> {
        let index = self.support_index?;
        if index >= self.supports.len() {
            return None;
        }
        let removed = self.supports.remove(index);
        self.support_index = reselect(index, self.supports.len());
        Some(removed)
    }

    pub fn current_support(&self) -> Option<&SupportEntry> {
        self.support_index.and_then(|i| self.supports.get(i))
    }

    pub fn current_support_mut(&mut self) -> Option<&mut SupportEntry> {
        self.support_index.and_then(|i| self.supports.get_mut(i))
    }

    /// Find a support by ID.
    pub fn find_support(&self, id: Uuid) -> Option<&SupportEntry> {
        self.supports.iter().find(|s| s.id == id)
    }
}
