//! Bidirectional name <-> identifier table for actions

use ahash::AHashMap;

use crate::core::types::{ActionId, Color};

/// Returned by [`StringInterner::resolve`] for identifiers it never issued
pub const UNKNOWN_NAME: &str = "UNKNOWN";

/// Maps action names to stable sequential identifiers and back
///
/// Identifiers are assigned in first-intern order starting at 0 and are never
/// reused. A display colour can be attached to any identifier; unmapped
/// identifiers report [`Color::GRAY`].
#[derive(Debug, Clone, Default)]
pub struct StringInterner {
    ids: AHashMap<String, ActionId>,
    names: Vec<String>,
    colors: AHashMap<ActionId, Color>,
}

impl StringInterner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the identifier for `name`, allocating the next one if unseen
    pub fn intern(&mut self, name: &str) -> ActionId {
        if let Some(&id) = self.ids.get(name) {
            return id;
        }
        let id = ActionId(self.names.len() as u32);
        self.names.push(name.to_owned());
        self.ids.insert(name.to_owned(), id);
        id
    }

    /// Identifier for `name` without allocating one
    pub fn lookup(&self, name: &str) -> Option<ActionId> {
        self.ids.get(name).copied()
    }

    pub fn resolve(&self, id: ActionId) -> &str {
        self.names
            .get(id.0 as usize)
            .map(String::as_str)
            .unwrap_or(UNKNOWN_NAME)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn set_color(&mut self, id: ActionId, color: Color) {
        self.colors.insert(id, color);
    }

    pub fn color(&self, id: ActionId) -> Color {
        self.colors.get(&id).copied().unwrap_or_default()
    }
}
