//! External command execution and host platform facts.

pub mod command;
pub mod platform;

pub use command::{
    build_command, display_command, execute, CommandOptions, CommandResult,
};
pub use platform::{HostInfo, OsFamily};
