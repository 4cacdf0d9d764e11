//! Cellular Simulator - genome-driven cells competing on a 2D grid

pub mod command;
pub mod core;
pub mod entity;
pub mod simulation;
pub mod spatial;
