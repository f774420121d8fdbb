//! harvest-admin command-line tool
//!
//! Library half of the binary, so commands and factories can be tested
//! without spawning a process.

pub mod cli;
pub mod commands;
pub mod factories;
pub mod logging;
