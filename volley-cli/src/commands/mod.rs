//! CLI subcommand implementations

pub mod bot;
pub mod req;
pub mod stats;
