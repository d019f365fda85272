//! CLI subcommand implementations for the splitcap binary.

pub mod batch_cmd;
pub mod capture_cmd;
pub mod manifest_cmd;
