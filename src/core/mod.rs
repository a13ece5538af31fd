// src/core/mod.rs

pub mod backup_store;
pub mod context_parameters;
pub mod errors;
pub mod icon_manager;
pub mod manager;
pub mod paths;
pub mod registry_utils;
pub mod script_detector;
pub mod settings;
pub mod validation;
