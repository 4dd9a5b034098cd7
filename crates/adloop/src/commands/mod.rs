//! Subcommand handlers.

pub mod assign;
pub mod branches;
pub mod config_cmd;
pub mod device;
pub mod run;
pub mod status;
