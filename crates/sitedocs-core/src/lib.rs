//! Configuration, secret resolution and startup wiring for sitedocs.

pub mod bootstrap;
pub mod config;
pub mod projects;
pub mod vault;

pub use bootstrap::App;
pub use config::Config;
pub use projects::{ProjectFolder, list_project_folders};
