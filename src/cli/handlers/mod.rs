// src/cli/handlers/mod.rs

// One module per CLI command. Each handler parses its own arguments.

pub mod backup;
pub mod commons;
pub mod info;
pub mod list;
pub mod register;
pub mod restore;
pub mod unregister;
pub mod validate;
