//! Command-line interface definitions and helpers.
//!
//! This module contains all CLI argument parsing, enums, and subcommand handlers.

mod args;
mod commands;
mod enums;

pub use args::{Args, Command, ConfigAction, RenderFlags};
pub use commands::{
    config_path, handle_config_action, open_store, run_capture, run_delete, run_get, run_kiosk,
    run_list, run_reassign, run_render, run_update,
};
pub use enums::{BackendChoice, CharacterSet, ColorChoice};
