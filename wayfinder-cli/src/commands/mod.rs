//! CLI subcommands.

pub mod common;
pub mod config;
pub mod route;
pub mod search;
