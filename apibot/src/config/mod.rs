//! Configuration: [`BaseConfig`] from env plus the command bindings document.

mod base;
mod commands;


pub use base::BaseConfig;
pub use commands::{is_command_name, load_config, parse_config, CommandsConfig};
