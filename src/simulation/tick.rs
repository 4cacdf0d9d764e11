//! Tick system - advances every live cell by one step
//!
//! Each tick runs five phases in order:
//! tile resync -> decide -> dispatch -> metabolism -> compaction
//!
//! Decide and metabolism touch only the cell they are evaluating, so they run
//! on rayon once the population reaches `parallel_threshold`. Dispatch mutates
//! shared grid and pool state and always runs sequentially.

use std::sync::Arc;

use rayon::prelude::*;

use crate::core::types::{ActionId, Tick};
use crate::simulation::simulator::Simulator;
use crate::spatial::grid::Tile;

/// Counts produced by one call to [`Simulator::update`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TickReport {
    /// Tick number after the update
    pub tick: Tick,
    /// Cells that were alive when the tick started
    pub evaluated: usize,
    /// Decisions that resolved to a registered command
    pub executed: usize,
    pub births: usize,
    pub deaths: usize,
    pub population: usize,
}

impl Simulator {
    /// Advance the whole population by exactly one tick
    pub fn update(&mut self) -> TickReport {
        self.resync_tiles();

        let start_population = self.active.len();
        self.reclaimed = 0;
        let parallel = start_population >= self.config.parallel_threshold;

        self.decide_actions(parallel);
        let evaluated = self.decisions.len();
        let executed = self.dispatch_actions();
        // a reclaimed slot is one death and one birth that left the active count unchanged
        let births = self.active.len() + self.reclaimed - start_population;
        self.apply_metabolism(parallel);
        let deaths = self.remove_dead() + self.reclaimed;

        self.current_tick += 1;

        let report = TickReport {
            tick: self.current_tick,
            evaluated,
            executed,
            births,
            deaths,
            population: self.active.len(),
        };
        tracing::trace!(
            tick = report.tick,
            births = report.births,
            deaths = report.deaths,
            population = report.population,
            "tick complete"
        );
        report
    }

    /// Rebuild every tile reference from the live cells
    fn resync_tiles(&mut self) {
        self.grid.fill_default();
        for &id in &self.active {
            let cell = &self.cells[id.0];
            if cell.is_alive() {
                self.grid.set(cell.x, cell.y, Tile { occupant: Some(id) });
            }
        }
    }

    /// Advance each live cell's genome cursor and record its decision
    ///
    /// Also marks the cells alive at tick start in `alive_mask`.
    fn decide_actions(&mut self, parallel: bool) {
        self.alive_mask.fill(false);

        if parallel {
            // PARALLEL: each slot owns its cursor; free and dead slots are skipped
            self.cells
                .par_iter_mut()
                .zip(self.alive_mask.par_iter_mut())
                .for_each(|(cell, alive)| {
                    if cell.is_alive() {
                        cell.decide_next_command();
                        *alive = true;
                    }
                });
        } else {
            for &id in &self.active {
                let cell = &mut self.cells[id.0];
                if cell.is_alive() {
                    cell.decide_next_command();
                    self.alive_mask[id.0] = true;
                }
            }
        }

        // Collect in active order so dispatch order matches either path
        let cells = &self.cells;
        let alive_mask = &self.alive_mask;
        self.decisions.clear();
        self.decisions.extend(
            self.active
                .iter()
                .filter(|id| alive_mask[id.0])
                .map(|&id| (id, cells[id.0].last_action)),
        );
    }

    /// Execute each decision against the world, in order
    ///
    /// Cells killed earlier in the same pass are skipped, as are slots that a
    /// newborn took over after their owner died. Decisions with no
    /// registered command are no-ops. Returns how many commands ran.
    fn dispatch_actions(&mut self) -> usize {
        let registry = Arc::clone(&self.registry);
        let decisions = std::mem::take(&mut self.decisions);
        let mut executed = 0;

        for &(id, action) in &decisions {
            if action == ActionId::NONE
                || !self.alive_mask[id.0]
                || !self.cells[id.0].is_alive()
            {
                continue;
            }
            if let Some(command) = registry.get_command(action) {
                command.execute(self, id);
                executed += 1;
            }
        }

        self.decisions = decisions;
        executed
    }

    /// Charge the metabolic cost to every cell alive at tick start
    fn apply_metabolism(&mut self, parallel: bool) {
        let cost = self.config.metabolic_cost;

        if parallel {
            self.cells
                .par_iter_mut()
                .zip(self.alive_mask.par_iter())
                .filter(|(_, alive)| **alive)
                .for_each(|(cell, _)| {
                    cell.consume_energy(cost);
                    cell.age = cell.age.saturating_add(1);
                });
        } else {
            for &(id, _) in &self.decisions {
                if !self.alive_mask[id.0] {
                    continue;
                }
                let cell = &mut self.cells[id.0];
                cell.consume_energy(cost);
                cell.age = cell.age.saturating_add(1);
            }
        }
    }

    /// Return dead cells to the pool, keeping survivors in order
    fn remove_dead(&mut self) -> usize {
        let cells = &mut self.cells;
        let grid = &mut self.grid;
        let free = &mut self.free;
        let mut deaths = 0;

        self.active.retain(|&id| {
            let cell = &mut cells[id.0];
            if cell.is_alive() {
                return true;
            }
            if let Some(tile) = grid.get_mut(cell.x, cell.y) {
                if tile.occupant == Some(id) {
                    tile.occupant = None;
                }
            }
            cell.release();
            free.push(id);
            deaths += 1;
            false
        });
        self.dead_slots.clear();

        deaths
    }
}
