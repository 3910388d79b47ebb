//! Shared lookup tables referenced from compact records.
//!
//! Gradients and patterns are appended once and referenced by id from any
//! number of style blocks. Names and metadata are sparse per-handle maps,
//! created on first write and released when the owning handle is deleted.

use std::collections::{BTreeMap, HashMap};
use std::mem::size_of;

use vexel_types::{Gradient, GradientId, Handle, PatternId};

use crate::error::{StoreError, StoreResult};

#[derive(Debug, Default)]
pub(crate) struct ExtensionTables {
    pub gradients: Vec<Gradient>,
    pub patterns: Vec<String>,
    pub names: HashMap<Handle, String>,
    pub metadata: HashMap<Handle, BTreeMap<String, String>>,
    /// Running total of heap bytes held by name and metadata strings.
    string_bytes: usize,
    metadata_entries: usize,
}

impl ExtensionTables {
    pub fn add_gradient(&mut self, gradient: Gradient) -> StoreResult<GradientId> {
        let id = GradientId::from_index(self.gradients.len())
            .ok_or_else(|| StoreError::CapacityExceeded("gradient table is full".into()))?;
        self.gradients.push(gradient);
        Ok(id)
    }

    pub fn add_pattern(&mut self, name: String) -> StoreResult<PatternId> {
        let id = PatternId::from_index(self.patterns.len())
            .ok_or_else(|| StoreError::CapacityExceeded("pattern table is full".into()))?;
        self.patterns.push(name);
        Ok(id)
    }

    pub fn check_gradient(&self, id: Option<GradientId>) -> StoreResult<()> {
        match id {
            Some(g) if g.index() >= self.gradients.len() => {
                Err(StoreError::InvalidReference(format!("unknown {g}")))
            }
            _ => Ok(()),
        }
    }

    pub fn check_pattern(&self, id: Option<PatternId>) -> StoreResult<()> {
        match id {
            Some(p) if p.index() >= self.patterns.len() => {
                Err(StoreError::InvalidReference(format!("unknown {p}")))
            }
            _ => Ok(()),
        }
    }

    pub fn set_name(&mut self, handle: Handle, name: &str) {
        self.string_bytes += name.len();
        if let Some(old) = self.names.insert(handle, name.to_string()) {
            self.string_bytes -= old.len();
        }
    }

    pub fn set_metadata(&mut self, handle: Handle, key: &str, value: &str) {
        let map = self.metadata.entry(handle).or_default();
        self.string_bytes += key.len() + value.len();
        match map.insert(key.to_string(), value.to_string()) {
            Some(old) => self.string_bytes -= key.len() + old.len(),
            None => self.metadata_entries += 1,
        }
    }

    /// Drop every sparse entry owned by `handle`.
    pub fn release(&mut self, handle: Handle) {
        if let Some(name) = self.names.remove(&handle) {
            self.string_bytes -= name.len();
        }
        if let Some(map) = self.metadata.remove(&handle) {
            self.metadata_entries -= map.len();
            for (k, v) in map {
                self.string_bytes -= k.len() + v.len();
            }
        }
    }

    pub fn bytes(&self) -> usize {
        let gradients: usize = self
            .gradients
            .iter()
            .map(|g| size_of::<Gradient>() + g.stops.len() * size_of::<vexel_types::GradientStop>())
            .sum();
        let patterns: usize = self
            .patterns
            .iter()
            .map(|p| size_of::<String>() + p.len())
            .sum();
        let names = self.names.len() * (size_of::<Handle>() + size_of::<String>());
        let metadata = self.metadata.len()
            * (size_of::<Handle>() + size_of::<BTreeMap<String, String>>())
            + self.metadata_entries * 2 * size_of::<String>();
        gradients + patterns + names + metadata + self.string_bytes
    }
}
