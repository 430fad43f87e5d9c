//! Command handlers for the `txkit` binary

pub mod commands;

pub use commands::*;
