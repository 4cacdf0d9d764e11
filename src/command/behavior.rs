//! Standard cell behaviours
//!
//! Behaviours only touch the world through the simulator's public operations,
//! so the tile <-> cell bookkeeping stays in one place.

use rand::Rng;

use crate::core::types::{ActionId, CellId, Color};
use crate::simulation::simulator::Simulator;

/// Closed set of actions a gene can name
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Command {
    Idle,
    Photosynthesis,
    MoveForward,
    TurnLeft,
    TurnRight,
    EatForward,
    Divide,
}

impl Command {
    pub const ALL: [Command; 7] = [
        Command::Idle,
        Command::Photosynthesis,
        Command::MoveForward,
        Command::TurnLeft,
        Command::TurnRight,
        Command::EatForward,
        Command::Divide,
    ];

    /// Canonical registration name
    pub fn name(&self) -> &'static str {
        match self {
            Command::Idle => "Idle",
            Command::Photosynthesis => "Photosynthesis",
            Command::MoveForward => "MoveForward",
            Command::TurnLeft => "TurnLeft",
            Command::TurnRight => "TurnRight",
            Command::EatForward => "EatForward",
            Command::Divide => "Divide",
        }
    }

    pub fn default_color(&self) -> Color {
        match self {
            Command::Idle => Color::GRAY,
            Command::Photosynthesis => Color::GREEN,
            Command::MoveForward => Color::BLUE,
            Command::TurnLeft => Color::PURPLE,
            Command::TurnRight => Color::ORANGE,
            Command::EatForward => Color::RED,
            Command::Divide => Color::YELLOW,
        }
    }

    /// Apply this behaviour to `cell`. Unavailable targets make it a no-op.
    pub fn execute(&self, sim: &mut Simulator, cell: CellId) {
        match self {
            Command::Idle => {}
            Command::Photosynthesis => {
                let amount = sim.config().photosynthesis_energy;
                sim.add_energy(cell, amount);
            }
            Command::MoveForward => move_forward(sim, cell),
            Command::TurnLeft => {
                if let Some(facing) = sim.cell(cell).map(|c| c.facing) {
                    sim.set_facing(cell, facing.turn_left());
                }
            }
            Command::TurnRight => {
                if let Some(facing) = sim.cell(cell).map(|c| c.facing) {
                    sim.set_facing(cell, facing.turn_right());
                }
            }
            Command::EatForward => eat_forward(sim, cell),
            Command::Divide => divide(sim, cell),
        }
    }
}

fn forward_tile(sim: &Simulator, cell: CellId) -> Option<(i32, i32)> {
    sim.cell(cell).map(|c| c.facing.forward_of(c.x, c.y))
}

fn move_forward(sim: &mut Simulator, cell: CellId) {
    let Some((x, y)) = forward_tile(sim, cell) else {
        return;
    };
    sim.move_cell(cell, x, y);
}

fn eat_forward(sim: &mut Simulator, cell: CellId) {
    let Some((x, y)) = forward_tile(sim, cell) else {
        return;
    };
    let Some(victim) = sim.occupant_at(x, y) else {
        return;
    };
    if victim == cell || !sim.cell(victim).is_some_and(|v| v.is_alive()) {
        return;
    }

    let cap = sim.config().eat_steal_cap;
    let stolen = sim.drain_energy(victim, cap);
    sim.add_energy(cell, stolen);
}

fn divide(sim: &mut Simulator, cell: CellId) {
    let Some(parent) = sim.cell(cell) else {
        return;
    };
    let facing = parent.facing;
    let (x, y) = facing.forward_of(parent.x, parent.y);
    if !sim.is_tile_valid_and_empty(x, y) {
        return;
    }

    let child_energy = parent.energy() * sim.config().divide_energy_fraction;
    let mut genome = parent.genome().to_vec();
    mutate_genome(sim, &mut genome);

    if sim.spawn_cell(x, y, facing, &genome, child_energy).is_some() {
        sim.drain_energy(cell, child_energy);
    }
}

/// With probability `mutation_rate`, replace one random gene with a random
/// registered action
fn mutate_genome(sim: &mut Simulator, genome: &mut [ActionId]) {
    if genome.is_empty() {
        return;
    }
    let rate = sim.config().mutation_rate;
    if !sim.rng().gen_bool(rate) {
        return;
    }
    let Some(action) = sim.random_action() else {
        return;
    };
    let gene = sim.rng().gen_range(0..genome.len());
    genome[gene] = action;
}
