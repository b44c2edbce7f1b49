//! CLI subcommand implementations for the geothumb binary.

pub mod boundary_cmd;
pub mod generate_cmd;
pub mod lookup_cmd;
pub mod output;
