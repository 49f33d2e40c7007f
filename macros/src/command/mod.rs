pub mod command_handler;
pub mod derive_command;
