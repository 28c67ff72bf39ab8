//! nvision CLI library.
//!
//! This crate provides the backend orchestrator and the command
//! implementations behind the `nvision` binary.

pub mod backends;
pub mod commands;
pub mod logging;
