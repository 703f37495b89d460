//! Element reference registry
//!
//! Handles for mounted elements arrive one at a time, in any order, while the
//! UI renders progressively. The registry accumulates them under logical
//! roles; consumers gate on [`ReferenceRegistry::is_complete`] rather than on
//! the registry being non-empty.

use rustc_hash::FxHashMap;
use slotmap::new_key_type;
use smallvec::SmallVec;

use crate::error::{CoreError, Result};

new_key_type! {
    /// Opaque, non-owning reference to an element owned by the rendering layer
    pub struct ElementHandle;
}

/// Well-known element roles of the clap button
pub mod roles {
    pub const TRIGGER: &str = "trigger";
    pub const COUNT: &str = "count";
    pub const TOTAL: &str = "total";

    /// Roles the animation sequencer needs before it can be built
    pub const REQUIRED: [&str; 3] = [TRIGGER, COUNT, TOTAL];
}

/// Role -> handle map, built additively
#[derive(Clone, Debug)]
pub struct ReferenceRegistry {
    handles: FxHashMap<String, ElementHandle>,
    required: SmallVec<[&'static str; 4]>,
    /// Bumped on every registration
    revision: u64,
}

impl ReferenceRegistry {
    /// Registry gated on the clap button's three roles
    pub fn new() -> Self {
        Self::with_required(&roles::REQUIRED)
    }

    pub fn with_required(required: &[&'static str]) -> Self {
        Self {
            handles: FxHashMap::default(),
            required: required.iter().copied().collect(),
            revision: 0,
        }
    }

    /// Register `handle` under `role`, replacing any previous handle
    ///
    /// Returns the replaced handle, if any.
    pub fn register(&mut self, role: &str, handle: ElementHandle) -> Result<Option<ElementHandle>> {
        if role.is_empty() {
            return Err(CoreError::EmptyRole);
        }

        let replaced = self.handles.insert(role.to_string(), handle);
        self.revision += 1;

        tracing::debug!(
            role,
            replaced = replaced.is_some(),
            complete = self.is_complete(),
            "element registered"
        );
        Ok(replaced)
    }

    pub fn get(&self, role: &str) -> Option<ElementHandle> {
        self.handles.get(role).copied()
    }

    /// All required roles have a handle
    pub fn is_complete(&self) -> bool {
        self.required.iter().all(|role| self.handles.contains_key(*role))
    }

    /// Required roles that still lack a handle
    pub fn missing(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.required
            .iter()
            .copied()
            .filter(|role| !self.handles.contains_key(*role))
    }

    pub fn snapshot(&self) -> FxHashMap<String, ElementHandle> {
        self.handles.clone()
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn len(&self) -> usize {
        self.handles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }
}

impl Default for ReferenceRegistry {
    fn default() -> Self {
        Self::new()
    }
}
