//! Simulation configuration with documented constants
//!
//! Energy amounts have drifted between tunings of this simulation, so every
//! one of them lives here instead of inside the behaviours that use it.
//! Configs can be loaded from a TOML file with `[simulation]` and `[runner]`
//! tables; missing keys fall back to the defaults below.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::core::error::{Result, SimError};

/// Configuration for the simulation engine
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    // === GENOME ===
    /// Number of genes in every randomly generated genome
    pub genome_length: usize,

    /// Probability that a child's genome receives one random point mutation
    ///
    /// At 0.05, roughly one division in twenty introduces a new gene.
    pub mutation_rate: f64,

    // === ENERGY ===
    /// Upper bound for a cell's energy. Energy is clamped to [0, max_energy].
    pub max_energy: f32,

    /// Energy given to each cell spawned by `randomize`
    pub spawn_energy: f32,

    /// Energy every cell alive at the start of a tick pays at its end
    ///
    /// With the default of 1.0, an idle cell spawned at 50 energy starves
    /// after 50 ticks.
    pub metabolic_cost: f32,

    /// Energy gained per Photosynthesis action
    pub photosynthesis_energy: f32,

    /// Most energy a single EatForward can take from its victim
    pub eat_steal_cap: f32,

    /// Share of the parent's energy handed to the child on Divide
    pub divide_energy_fraction: f32,

    // === PARALLELIZATION ===
    /// Minimum live population before the decide and metabolism passes use rayon
    ///
    /// Below this threshold, thread overhead exceeds benefits.
    pub parallel_threshold: usize,

    // === RANDOMNESS ===
    /// Seed for the simulator's RNG. `None` seeds from OS entropy.
    pub seed: Option<u64>,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            genome_length: 16,
            mutation_rate: 0.05,

            max_energy: 100.0,
            spawn_energy: 50.0,
            metabolic_cost: 1.0,
            photosynthesis_energy: 10.0,
            eat_steal_cap: 20.0,
            divide_energy_fraction: 0.5,

            parallel_threshold: 1024,

            seed: None,
        }
    }
}

impl SimulationConfig {
    /// Create a new config with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Default config with a fixed RNG seed
    pub fn seeded(seed: u64) -> Self {
        Self {
            seed: Some(seed),
            ..Self::default()
        }
    }

    /// Validate configuration for internal consistency
    pub fn validate(&self) -> Result<()> {
        if self.genome_length == 0 {
            return Err(SimError::InvalidConfig("genome_length must be > 0".into()));
        }

        if !(self.max_energy.is_finite() && self.max_energy > 0.0) {
            return Err(SimError::InvalidConfig(format!(
                "max_energy ({}) must be a positive number",
                self.max_energy
            )));
        }

        let amounts = [
            ("spawn_energy", self.spawn_energy),
            ("metabolic_cost", self.metabolic_cost),
            ("photosynthesis_energy", self.photosynthesis_energy),
            ("eat_steal_cap", self.eat_steal_cap),
        ];
        for (name, value) in amounts {
            if !value.is_finite() || value < 0.0 {
                return Err(SimError::InvalidConfig(format!(
                    "{} ({}) must be finite and >= 0",
                    name, value
                )));
            }
        }

        if !(0.0..=1.0).contains(&self.mutation_rate) {
            return Err(SimError::InvalidConfig(format!(
                "mutation_rate ({}) must be within [0, 1]",
                self.mutation_rate
            )));
        }

        if !(self.divide_energy_fraction > 0.0 && self.divide_energy_fraction < 1.0) {
            return Err(SimError::InvalidConfig(format!(
                "divide_energy_fraction ({}) must be within (0, 1)",
                self.divide_energy_fraction
            )));
        }

        Ok(())
    }
}

/// Configuration for the background simulation thread
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RunnerConfig {
    /// Target tick rate while running
    pub updates_per_second: u32,

    /// Cap on ticks executed per frame
    ///
    /// After a stall the accumulator may owe hundreds of ticks. Anything
    /// beyond this cap is dropped instead of being caught up.
    pub max_ticks_per_frame: u32,

    /// Wall-clock length of one frame of the simulation loop (ms)
    pub frame_interval_ms: u64,

    /// Start the thread paused
    pub start_paused: bool,

    /// Log population statistics every N ticks (0 disables)
    pub stats_log_interval: u64,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            updates_per_second: 30,
            max_ticks_per_frame: 8,
            frame_interval_ms: 16,
            start_paused: false,
            stats_log_interval: 500,
        }
    }
}

impl RunnerConfig {
    pub fn validate(&self) -> Result<()> {
        if self.max_ticks_per_frame == 0 {
            return Err(SimError::InvalidConfig(
                "max_ticks_per_frame must be >= 1".into(),
            ));
        }
        Ok(())
    }
}

/// Top-level config file layout
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub simulation: SimulationConfig,
    pub runner: RunnerConfig,
}

impl Config {
    /// Parse and validate a config from TOML text
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: Config = toml::from_str(content)?;
        config.simulation.validate()?;
        config.runner.validate()?;
        Ok(config)
    }

    /// Load a config from a TOML file
    pub fn load_from_toml(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }
}
