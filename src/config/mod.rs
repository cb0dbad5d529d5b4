/// Main configuration module.
///
/// Compile-time defaults live in the per-concern submodules; `settings`
/// groups them into the runtime `EngineConfig` that can be overridden from JSON.
pub mod grid;
pub mod mirror;
pub mod movement;
pub mod pool;
pub mod server;
pub mod settings;

pub use settings::*;
