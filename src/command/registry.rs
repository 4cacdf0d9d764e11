//! Command registry - maps interned action identifiers to behaviours

use ahash::AHashMap;

use crate::command::behavior::Command;
use crate::core::interner::StringInterner;
use crate::core::types::{ActionId, Color};

/// Table from action identifier to executable behaviour
///
/// Built once during setup, then shared (behind an `Arc`) with the simulator
/// and any consumer that needs to turn identifiers back into names.
/// Registration is first-wins: registering a name that already has a
/// behaviour leaves the original in place.
#[derive(Debug, Clone, Default)]
pub struct CommandRegistry {
    interner: StringInterner,
    commands: AHashMap<ActionId, Command>,
}

impl CommandRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry holding every standard behaviour under its canonical name
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        for command in Command::ALL {
            registry.register_with_color(command.name(), command, command.default_color());
        }
        registry
    }

    /// Intern `name` and bind it to `command` unless it is already bound
    pub fn register_command(&mut self, name: &str, command: Command) -> ActionId {
        let id = self.interner.intern(name);
        self.commands.entry(id).or_insert(command);
        id
    }

    /// Register and attach a display colour. The colour is only set on first
    /// registration, like the behaviour itself.
    pub fn register_with_color(&mut self, name: &str, command: Command, color: Color) -> ActionId {
        let is_new = self
            .interner
            .lookup(name)
            .map_or(true, |id| !self.commands.contains_key(&id));
        let id = self.register_command(name, command);
        if is_new {
            self.interner.set_color(id, color);
        }
        id
    }

    pub fn get_command(&self, id: ActionId) -> Option<Command> {
        self.commands.get(&id).copied()
    }

    /// All registered identifiers, sorted so seeded runs draw genomes
    /// identically across processes
    pub fn registered_ids(&self) -> Vec<ActionId> {
        let mut ids: Vec<_> = self.commands.keys().copied().collect();
        ids.sort_unstable();
        ids
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    /// Identifier for a registered name
    pub fn id_of(&self, name: &str) -> Option<ActionId> {
        self.interner
            .lookup(name)
            .filter(|id| self.commands.contains_key(id))
    }

    pub fn resolve(&self, id: ActionId) -> &str {
        self.interner.resolve(id)
    }

    pub fn color(&self, id: ActionId) -> Color {
        self.interner.color(id)
    }

    pub fn interner(&self) -> &StringInterner {
        &self.interner
    }
}
