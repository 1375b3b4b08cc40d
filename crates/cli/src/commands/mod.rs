//! Subcommand implementations

pub mod data;
pub mod predict;
pub mod settings;
pub mod train;
