//! Command dispatch
//!
//! Genes are interned action identifiers. The registry resolves an identifier
//! to a behaviour once per cell per tick:
//! ActionId -> CommandRegistry -> Command -> Command::execute(sim, cell)

pub mod behavior;
pub mod registry;

pub use behavior::Command;
pub use registry::CommandRegistry;
