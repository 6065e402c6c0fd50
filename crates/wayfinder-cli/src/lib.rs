//! Wayfinder command-line library.
//!
//! Subcommand handlers and output formatting live here so they can be tested
//! without spawning the binary.

pub mod commands;
pub mod data;
pub mod output;
