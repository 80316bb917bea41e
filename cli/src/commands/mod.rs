//! CLI subcommands.

pub mod capture;
pub mod config;
pub mod ports;
pub mod protocols;
