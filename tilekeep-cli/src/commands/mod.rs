//! CLI subcommands.

pub mod batch;
pub mod common;
pub mod config;
pub mod describe;
pub mod server;
pub mod tileset;
