//! Population statistics for logging and headless runs

use ahash::AHashMap;
use serde::Serialize;

use crate::core::types::{ActionId, Tick};
use crate::simulation::simulator::Simulator;

#[derive(Debug, Clone, Default, Serialize)]
pub struct PopulationStats {
    pub tick: Tick,
    pub population: usize,
    pub total_energy: f32,
    pub mean_energy: f32,
    pub max_age: u32,
    /// Gene counts across all live genomes, keyed by action name
    pub gene_counts: Vec<(String, usize)>,
}

impl PopulationStats {
    pub fn collect(sim: &Simulator) -> Self {
        let mut counts: AHashMap<ActionId, usize> = AHashMap::new();
        let mut total_energy = 0.0;
        let mut max_age = 0;
        let mut population = 0;

        for (_, cell) in sim.active_cells().filter(|(_, c)| c.is_alive()) {
            population += 1;
            total_energy += cell.energy();
            max_age = max_age.max(cell.age);
            for &gene in cell.genome() {
                *counts.entry(gene).or_default() += 1;
            }
        }

        let registry = sim.registry();
        let mut gene_counts: Vec<(String, usize)> = counts
            .into_iter()
            .map(|(id, n)| (registry.resolve(id).to_owned(), n))
            .collect();
        gene_counts.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));

        Self {
            tick: sim.current_tick(),
            population,
            total_energy,
            mean_energy: if population > 0 {
                total_energy / population as f32
            } else {
                0.0
            },
            max_age,
            gene_counts,
        }
    }

    /// Most common gene, if any cell is alive
    pub fn dominant_gene(&self) -> Option<&str> {
        self.gene_counts.first().map(|(name, _)| name.as_str())
    }
}

impl Simulator {
    pub fn stats(&self) -> PopulationStats {
        PopulationStats::collect(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use crate::command::behavior::Command;
    use crate::command::registry::CommandRegistry;
    use crate::core::config::SimulationConfig;
    use crate::core::types::Direction;

    #[test]
    fn test_empty_world() {
        let sim = Simulator::new(
            2,
            2,
            Arc::new(CommandRegistry::with_defaults()),
            SimulationConfig::seeded(1),
        )
        .unwrap();
        let stats = PopulationStats::collect(&sim);
        assert_eq!(stats.population, 0);
        assert_eq!(stats.mean_energy, 0.0);
        assert!(stats.dominant_gene().is_none());
    }

    #[test]
    fn test_counts_and_means() {
        let mut sim = Simulator::new(
            2,
            1,
            Arc::new(CommandRegistry::with_defaults()),
            SimulationConfig::seeded(1),
        )
        .unwrap();
        let idle = sim.registry().id_of(Command::Idle.name()).unwrap();
        let eat = sim.registry().id_of(Command::EatForward.name()).unwrap();
        sim.spawn_cell(0, 0, Direction::North, &[idle, idle, eat], 10.0);
        sim.spawn_cell(1, 0, Direction::North, &[idle], 30.0);

        let stats = PopulationStats::collect(&sim);

        assert_eq!(stats.population, 2);
        assert_eq!(stats.total_energy, 40.0);
        assert_eq!(stats.mean_energy, 20.0);
        assert_eq!(stats.dominant_gene(), Some("Idle"));
        assert_eq!(
            stats.gene_counts,
            vec![("Idle".to_string(), 3), ("EatForward".to_string(), 1)]
        );
    }
}
