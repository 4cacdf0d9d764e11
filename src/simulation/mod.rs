pub mod runner;
pub mod simulator;
pub mod snapshot;
pub mod stats;
pub mod tick;

pub use runner::{RateLimiter, SimulationHandle, MAX_UPDATES_PER_SECOND};
pub use simulator::Simulator;
pub use snapshot::{InspectorData, SimulationState, StateBuffer, TileRenderData};
pub use stats::PopulationStats;
pub use tick::TickReport;
