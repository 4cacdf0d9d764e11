//! Snapshot structures for handing simulation state to a consumer thread.
//!
//! The simulation thread fills its own [`SimulationState`], then swaps it into
//! the shared [`StateBuffer`]. Consumers copy the shared state out into their
//! own working copy. Neither side holds the lock for longer than a swap or a
//! copy, so rendering never stalls a tick.

use std::sync::{Mutex, MutexGuard, PoisonError};

use serde::Serialize;

use crate::core::types::{Color, Direction, Tick};
use crate::simulation::simulator::Simulator;

/// One occupied tile
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TileRenderData {
    pub x: i32,
    pub y: i32,
    /// Display colour of the action the occupant decided last
    pub color: Color,
}

/// Details for the tile the user asked to inspect
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct InspectorData {
    /// Tile being inspected, if any request has been made
    pub selected: Option<(i32, i32)>,
    pub selected_has_agent: bool,
    /// Genome of the occupant as action names, in gene order
    pub genome: Vec<String>,
    pub energy: f32,
    pub facing: Direction,
    pub cursor: usize,
}

impl InspectorData {
    fn clear(&mut self) {
        self.selected_has_agent = false;
        self.genome.clear();
        self.energy = 0.0;
        self.facing = Direction::None;
        self.cursor = 0;
    }

    fn copy_from(&mut self, other: &InspectorData) {
        self.selected = other.selected;
        self.selected_has_agent = other.selected_has_agent;
        self.genome.clone_from(&other.genome);
        self.energy = other.energy;
        self.facing = other.facing;
        self.cursor = other.cursor;
    }
}

/// Complete published view of the world
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SimulationState {
    pub tick: Tick,
    pub width: i32,
    pub height: i32,
    pub population: usize,
    pub paused: bool,
    pub updates_per_second: u32,
    pub tiles: Vec<TileRenderData>,
    pub inspector: InspectorData,
}

impl SimulationState {
    /// Fill this state from the simulator, reusing existing allocations
    pub fn capture(&mut self, sim: &Simulator, selected: Option<(i32, i32)>) {
        let registry = sim.registry();

        self.tick = sim.current_tick();
        self.width = sim.width();
        self.height = sim.height();
        self.population = sim.active_cell_count();

        self.tiles.clear();
        self.tiles.extend(
            sim.active_cells()
                .filter(|(_, cell)| cell.is_alive())
                .map(|(_, cell)| TileRenderData {
                    x: cell.x,
                    y: cell.y,
                    color: registry.color(cell.last_action),
                }),
        );

        self.inspector.clear();
        self.inspector.selected = selected;
        let Some(cell) = selected.and_then(|(x, y)| sim.cell_at(x, y)) else {
            return;
        };
        if !cell.is_alive() {
            return;
        }
        self.inspector.selected_has_agent = true;
        self.inspector.energy = cell.energy();
        self.inspector.facing = cell.facing;
        self.inspector.cursor = cell.cursor();
        self.inspector
            .genome
            .extend(cell.genome().iter().map(|&id| registry.resolve(id).to_owned()));
    }

    /// Copy `other` into `self`, keeping this state's buffers
    pub fn copy_from(&mut self, other: &SimulationState) {
        self.tick = other.tick;
        self.width = other.width;
        self.height = other.height;
        self.population = other.population;
        self.paused = other.paused;
        self.updates_per_second = other.updates_per_second;
        self.tiles.clone_from(&other.tiles);
        self.inspector.copy_from(&other.inspector);
    }
}

/// Shared slot holding the most recently published state
#[derive(Debug, Default)]
pub struct StateBuffer {
    shared: Mutex<SimulationState>,
}

impl StateBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, SimulationState> {
        self.shared.lock().unwrap_or_else(|poisoned| {
            tracing::warn!("State buffer lock was poisoned; recovering");
            PoisonError::into_inner(poisoned)
        })
    }

    /// Swap a freshly built state into the shared slot
    ///
    /// `back` receives the previously shared state so its buffers can be
    /// reused for the next capture.
    pub fn publish(&self, back: &mut SimulationState) {
        let mut shared = self.lock();
        std::mem::swap(&mut *shared, back);
    }

    /// Copy the shared state into the caller's working copy
    pub fn read_into(&self, front: &mut SimulationState) {
        let shared = self.lock();
        front.copy_from(&shared);
    }

    /// Owned copy of the shared state
    pub fn latest(&self) -> SimulationState {
        self.lock().clone()
    }
}
