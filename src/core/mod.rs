pub mod config;
pub mod error;
pub mod interner;
pub mod types;

pub use config::{Config, RunnerConfig, SimulationConfig};
pub use error::{Result, SimError};
pub use interner::StringInterner;
pub use types::{ActionId, CellId, Color, Direction, Tick};
