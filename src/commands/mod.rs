//! Command implementations for the embedctl CLI
//!
//! Each command module provides a `run` function that executes the command logic.

pub mod completions;
pub mod deploy;
pub mod doctor;
pub mod down;
pub mod logs;
pub mod smoke;
pub mod status;
