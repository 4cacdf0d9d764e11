//! Simulator - owns the grid, the cell pool and the RNG
//!
//! Cells live in a pool allocated once at construction (one slot per tile),
//! so a [`CellId`] stays valid for the whole run. Tiles refer to cells by
//! slot index; the active list holds live slots in spawn order.

use std::sync::Arc;

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use crate::command::registry::CommandRegistry;
use crate::core::config::SimulationConfig;
use crate::core::error::{Result, SimError};
use crate::core::types::{ActionId, CellId, Direction, Tick};
use crate::entity::cell::Cell;
use crate::spatial::grid::{Grid, Tile};

/// The cellular world
pub struct Simulator {
    pub(crate) grid: Grid<Tile>,
    /// Pool of cell slots. Never resized after construction.
    pub(crate) cells: Vec<Cell>,
    /// Live slots, in spawn order
    pub(crate) active: Vec<CellId>,
    /// Free slots; popped from the back so low indices are reused first
    pub(crate) free: Vec<CellId>,
    /// Slots of cells that died since the last compaction. Still listed in
    /// `active`, but their tiles are already empty.
    pub(crate) dead_slots: Vec<CellId>,
    /// Dead slots handed to a new cell before compaction reached them
    pub(crate) reclaimed: usize,
    pub(crate) registry: Arc<CommandRegistry>,
    /// Registered identifiers, cached for genome generation and mutation
    pub(crate) actions: Vec<ActionId>,
    pub(crate) config: SimulationConfig,
    pub(crate) rng: ChaCha8Rng,
    pub(crate) current_tick: Tick,
    /// Per-tick scratch: decisions of the cells alive at tick start
    pub(crate) decisions: Vec<(CellId, ActionId)>,
    /// Per-tick scratch: pool mask of cells alive at tick start
    pub(crate) alive_mask: Vec<bool>,
}

impl Simulator {
    /// Create an empty `width` x `height` world
    ///
    /// Fails only for non-positive dimensions, an invalid config, or when the
    /// cell pool cannot be allocated.
    pub fn new(
        width: i32,
        height: i32,
        registry: Arc<CommandRegistry>,
        config: SimulationConfig,
    ) -> Result<Self> {
        config.validate()?;

        if width <= 0 || height <= 0 {
            return Err(SimError::InvalidDimensions { width, height });
        }
        let area = (width as usize)
            .checked_mul(height as usize)
            .ok_or(SimError::InvalidDimensions { width, height })?;

        let mut cells = Vec::new();
        cells
            .try_reserve_exact(area)
            .map_err(|_| SimError::PoolAllocation(area))?;
        cells.resize_with(area, Cell::default);

        let rng = match config.seed {
            Some(seed) => ChaCha8Rng::seed_from_u64(seed),
            None => ChaCha8Rng::from_entropy(),
        };

        tracing::info!(
            "Created {}x{} simulator ({} pool slots, {} registered actions)",
            width,
            height,
            area,
            registry.len()
        );

        Ok(Self {
            grid: Grid::new(width as usize, height as usize),
            cells,
            active: Vec::with_capacity(area),
            free: (0..area).rev().map(CellId).collect(),
            dead_slots: Vec::new(),
            reclaimed: 0,
            actions: registry.registered_ids(),
            registry,
            config,
            rng,
            current_tick: 0,
            decisions: Vec::with_capacity(area),
            alive_mask: vec![false; area],
        })
    }

    pub fn width(&self) -> i32 {
        self.grid.width as i32
    }

    pub fn height(&self) -> i32 {
        self.grid.height as i32
    }

    pub fn current_tick(&self) -> Tick {
        self.current_tick
    }

    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    pub fn registry(&self) -> &Arc<CommandRegistry> {
        &self.registry
    }

    /// The simulator's RNG. Lives for the whole run and is never reseeded.
    pub fn rng(&mut self) -> &mut ChaCha8Rng {
        &mut self.rng
    }

    /// Uniformly random registered action, `None` if nothing is registered
    pub fn random_action(&mut self) -> Option<ActionId> {
        if self.actions.is_empty() {
            return None;
        }
        let i = self.rng.gen_range(0..self.actions.len());
        Some(self.actions[i])
    }

    pub fn get_tile(&self, x: i32, y: i32) -> Option<&Tile> {
        self.grid.get(x, y)
    }

    pub fn is_tile_valid_and_empty(&self, x: i32, y: i32) -> bool {
        self.grid.get(x, y).is_some_and(|tile| !tile.has_cell())
    }

    pub fn occupant_at(&self, x: i32, y: i32) -> Option<CellId> {
        self.grid.get(x, y).and_then(|tile| tile.occupant)
    }

    pub fn cell_at(&self, x: i32, y: i32) -> Option<&Cell> {
        self.occupant_at(x, y).and_then(|id| self.cell(id))
    }

    /// Occupied pool slot by id. Free slots resolve to `None`.
    pub fn cell(&self, id: CellId) -> Option<&Cell> {
        self.cells.get(id.0).filter(|cell| !cell.is_free())
    }

    fn cell_mut(&mut self, id: CellId) -> Option<&mut Cell> {
        self.cells.get_mut(id.0).filter(|cell| !cell.is_free())
    }

    pub fn active_cell_count(&self) -> usize {
        self.active.len()
    }

    /// Live cell by position in the active list; valid for
    /// `0..active_cell_count()`
    pub fn active_cell(&self, index: usize) -> Option<&Cell> {
        self.active.get(index).map(|id| &self.cells[id.0])
    }

    pub fn active_ids(&self) -> &[CellId] {
        &self.active
    }

    pub fn active_cells(&self) -> impl Iterator<Item = (CellId, &Cell)> + '_ {
        self.active.iter().map(move |&id| (id, &self.cells[id.0]))
    }

    /// Claim a free slot for a new cell at (x, y)
    ///
    /// Returns `None` if the tile is out of bounds or occupied, or the pool
    /// is exhausted.
    pub fn spawn_cell(
        &mut self,
        x: i32,
        y: i32,
        facing: Direction,
        genome: &[ActionId],
        energy: f32,
    ) -> Option<CellId> {
        if !self.is_tile_valid_and_empty(x, y) {
            return None;
        }
        let id = match self.free.pop() {
            Some(id) => id,
            None => self.reclaim_dead_slot()?,
        };

        // a recycled slot must not run or pay for the decision of its previous owner
        self.alive_mask[id.0] = false;
        let max_energy = self.config.max_energy;
        self.cells[id.0].activate(x, y, facing, genome, energy, max_energy);
        self.grid.set(x, y, Tile { occupant: Some(id) });
        self.active.push(id);
        Some(id)
    }

    /// Take over the slot of a cell that died this tick
    ///
    /// Every empty tile is backed by either a free slot or a dead one, so a
    /// full pool never blocks a spawn into an empty tile.
    fn reclaim_dead_slot(&mut self) -> Option<CellId> {
        while let Some(id) = self.dead_slots.pop() {
            let cell = &self.cells[id.0];
            if cell.is_free() || cell.is_alive() {
                continue;
            }
            if let Some(pos) = self.active.iter().position(|&a| a == id) {
                self.active.remove(pos);
            }
            self.cells[id.0].release();
            self.reclaimed += 1;
            return Some(id);
        }
        None
    }

    /// Move a cell to (x, y) if that tile is valid and empty
    ///
    /// The old tile, new tile and stored coordinates change together.
    pub fn move_cell(&mut self, id: CellId, x: i32, y: i32) -> bool {
        if !self.is_tile_valid_and_empty(x, y) {
            return false;
        }
        let Some(cell) = self.cells.get_mut(id.0).filter(|c| !c.is_free()) else {
            return false;
        };

        let (old_x, old_y) = (cell.x, cell.y);
        cell.x = x;
        cell.y = y;

        if let Some(old) = self.grid.get_mut(old_x, old_y) {
            if old.occupant == Some(id) {
                old.occupant = None;
            }
        }
        self.grid.set(x, y, Tile { occupant: Some(id) });
        true
    }

    pub fn set_facing(&mut self, id: CellId, facing: Direction) {
        if let Some(cell) = self.cell_mut(id) {
            cell.facing = facing;
        }
    }

    /// Add energy (clamped to `max_energy`). Returns the amount added.
    pub fn add_energy(&mut self, id: CellId, amount: f32) -> f32 {
        let max_energy = self.config.max_energy;
        self.cell_mut(id)
            .map_or(0.0, |cell| cell.add_energy(amount, max_energy))
    }

    /// Take up to `amount` energy. Returns the amount taken.
    ///
    /// A cell drained to zero is dead: it stops occupying its tile right
    /// away and its slot is reclaimed at the end of the tick.
    pub fn drain_energy(&mut self, id: CellId, amount: f32) -> f32 {
        let Some(cell) = self.cell_mut(id) else {
            return 0.0;
        };
        let taken = cell.consume_energy(amount);
        let (alive, x, y) = (cell.is_alive(), cell.x, cell.y);

        if !alive {
            if let Some(tile) = self.grid.get_mut(x, y) {
                if tile.occupant == Some(id) {
                    tile.occupant = None;
                }
            }
            if !self.dead_slots.contains(&id) {
                self.dead_slots.push(id);
            }
        }
        taken
    }

    /// Remove every cell and clear every tile
    pub fn clear(&mut self) {
        for id in self.active.drain(..) {
            self.cells[id.0].release();
        }
        self.grid.fill_default();
        self.dead_slots.clear();
        self.reclaimed = 0;
        self.free.clear();
        self.free.extend((0..self.cells.len()).rev().map(CellId));
        self.current_tick = 0;
    }

    /// Clear the world, then fill each tile with probability `density`
    ///
    /// New cells face North, start with `spawn_energy`, and carry a uniformly
    /// random genome drawn from the registered actions. With nothing
    /// registered the world is left empty.
    pub fn randomize(&mut self, density: f32) {
        self.clear();
        if self.actions.is_empty() {
            tracing::warn!("Randomize called with no registered actions; world left empty");
            return;
        }

        let density = if density.is_finite() {
            f64::from(density.clamp(0.0, 1.0))
        } else {
            tracing::warn!("Randomize density {} is not finite; using 0", density);
            0.0
        };
        let energy = self.config.spawn_energy;
        let mut genome = Vec::with_capacity(self.config.genome_length);

        for y in 0..self.height() {
            for x in 0..self.width() {
                if self.rng.gen::<f64>() >= density {
                    continue;
                }
                genome.clear();
                for _ in 0..self.config.genome_length {
                    let i = self.rng.gen_range(0..self.actions.len());
                    genome.push(self.actions[i]);
                }
                self.spawn_cell(x, y, Direction::North, &genome, energy);
            }
        }

        tracing::info!(
            "Randomized {}x{} world at density {:.2}: {} cells",
            self.width(),
            self.height(),
            density,
            self.active.len()
        );
    }
}
