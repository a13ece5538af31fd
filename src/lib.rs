//! womm: registers scripts and executables as file-manager context menu entries.

include!(concat!(env!("OUT_DIR"), "/translations.rs"));

pub mod cli;
pub mod constants;
pub mod core;
pub mod models;
pub mod system;
