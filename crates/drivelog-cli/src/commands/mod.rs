//! CLI subcommands.

pub mod process;
pub mod reference;
