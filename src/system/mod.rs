//! # System Interaction Layer
//!
//! Boundary between the context-menu core and the operating system.
//!
//! ## Modules
//!
//! - **`registry`**: The `RegistryBackend` trait every registry access goes
//!   through, with a `winreg`-backed implementation for the current user's hive
//!   and an in-memory implementation for tests and previews.
//! - **`executor`**: Runs short probe commands (`python --version`, `ver`) and
//!   captures their output.
//! - **`platform`**: Host detection and `PATH` lookups.

pub mod executor;
pub mod platform;
pub mod registry;
