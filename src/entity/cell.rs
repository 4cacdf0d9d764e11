//! Pooled cell record

use crate::core::types::{ActionId, Direction};

/// One slot of the simulator's cell pool
///
/// A slot is either free (available to the next spawn) or holds a living
/// organism. The record is reused in place, so the genome allocation survives
/// across lifetimes of the slot.
#[derive(Debug, Clone)]
pub struct Cell {
    pub x: i32,
    pub y: i32,
    pub facing: Direction,
    energy: f32,
    genome: Vec<ActionId>,
    cursor: usize,
    /// Action decided most recently (drives the snapshot colour)
    pub last_action: ActionId,
    /// Ticks survived since spawn
    pub age: u32,
    free: bool,
}

impl Default for Cell {
    fn default() -> Self {
        Self {
            x: 0,
            y: 0,
            facing: Direction::None,
            energy: 0.0,
            genome: Vec::new(),
            cursor: 0,
            last_action: ActionId::NONE,
            age: 0,
            free: true,
        }
    }
}

impl Cell {
    /// Claim this slot for a new organism. `energy` is clamped to [0, max_energy].
    pub fn activate(
        &mut self,
        x: i32,
        y: i32,
        facing: Direction,
        genome: &[ActionId],
        energy: f32,
        max_energy: f32,
    ) {
        self.x = x;
        self.y = y;
        self.facing = facing;
        self.energy = energy.clamp(0.0, max_energy);
        self.genome.clear();
        self.genome.extend_from_slice(genome);
        self.cursor = 0;
        self.last_action = ActionId::NONE;
        self.age = 0;
        self.free = false;
    }

    /// Return the slot to the pool
    pub fn release(&mut self) {
        self.energy = 0.0;
        self.cursor = 0;
        self.last_action = ActionId::NONE;
        self.free = true;
    }

    pub fn is_free(&self) -> bool {
        self.free
    }

    pub fn is_alive(&self) -> bool {
        !self.free && self.energy > 0.0
    }

    pub fn energy(&self) -> f32 {
        self.energy
    }

    pub fn genome(&self) -> &[ActionId] {
        &self.genome
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// Read the gene under the cursor and advance, wrapping at the end
    ///
    /// The result is also stored in `last_action`. An empty genome yields
    /// [`ActionId::NONE`] and leaves the cursor at 0.
    pub fn decide_next_command(&mut self) -> ActionId {
        if self.genome.is_empty() {
            self.cursor = 0;
            self.last_action = ActionId::NONE;
            return ActionId::NONE;
        }
        if self.cursor >= self.genome.len() {
            self.cursor = 0;
        }
        let action = self.genome[self.cursor];
        self.cursor = (self.cursor + 1) % self.genome.len();
        self.last_action = action;
        action
    }

    /// Add energy, saturating at `max_energy`. Returns the amount actually added.
    pub fn add_energy(&mut self, amount: f32, max_energy: f32) -> f32 {
        let before = self.energy;
        self.energy = (self.energy + amount.max(0.0)).min(max_energy);
        self.energy - before
    }

    /// Remove energy, flooring at 0. Returns the amount actually removed.
    pub fn consume_energy(&mut self, amount: f32) -> f32 {
        let before = self.energy;
        self.energy = (self.energy - amount.max(0.0)).max(0.0);
        before - self.energy
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn genome(ids: &[u32]) -> Vec<ActionId> {
        ids.iter().map(|&i| ActionId(i)).collect()
    }

    #[test]
    fn test_default_is_free() {
        let cell = Cell::default();
        assert!(cell.is_free());
        assert!(!cell.is_alive());
    }

    #[test]
    fn test_cursor_wraps() {
        let mut cell = Cell::default();
        cell.activate(0, 0, Direction::North, &genome(&[3, 4, 5]), 10.0, 100.0);

        let decided: Vec<_> = (0..7).map(|_| cell.decide_next_command()).collect();
        assert_eq!(decided, genome(&[3, 4, 5, 3, 4, 5, 3]));
        assert_eq!(cell.cursor(), 1);
        assert_eq!(cell.last_action, ActionId(3));
    }

    #[test]
    fn test_empty_genome_returns_sentinel() {
        let mut cell = Cell::default();
        cell.activate(0, 0, Direction::North, &[], 10.0, 100.0);
        assert_eq!(cell.decide_next_command(), ActionId::NONE);
        assert_eq!(cell.cursor(), 0);
    }

    #[test]
    fn test_activate_clamps_energy() {
        let mut cell = Cell::default();
        cell.activate(1, 2, Direction::East, &genome(&[0]), 250.0, 100.0);
        assert_eq!(cell.energy(), 100.0);
        cell.activate(1, 2, Direction::East, &genome(&[0]), -5.0, 100.0);
        assert_eq!(cell.energy(), 0.0);
        assert!(!cell.is_alive());
    }

    #[test]
    fn test_energy_bounds() {
        let mut cell = Cell::default();
        cell.activate(0, 0, Direction::North, &genome(&[0]), 95.0, 100.0);
        assert_eq!(cell.add_energy(10.0, 100.0), 5.0);
        assert_eq!(cell.energy(), 100.0);
        assert_eq!(cell.consume_energy(150.0), 100.0);
        assert_eq!(cell.energy(), 0.0);
    }

    #[test]
    fn test_reactivation_resets_state() {
        let mut cell = Cell::default();
        cell.activate(0, 0, Direction::North, &genome(&[1, 2]), 10.0, 100.0);
        cell.decide_next_command();
        cell.age = 12;
        cell.release();
        assert!(cell.is_free());

        cell.activate(3, 3, Direction::West, &genome(&[7]), 20.0, 100.0);
        assert_eq!(cell.cursor(), 0);
        assert_eq!(cell.age, 0);
        assert_eq!(cell.genome(), &genome(&[7])[..]);
        assert_eq!((cell.x, cell.y), (3, 3));
    }
}
