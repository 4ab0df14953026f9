// Library surface for headless/integration tests and reuse.
// Keep this lean to avoid coupling to bin-only types in main.rs.
pub mod app_dirs;
pub mod config;
pub mod difficulty;
pub mod game;
pub mod input;
pub mod runtime;
pub mod score;
pub mod sequence;
pub mod timer;
pub mod ui;
