pub mod animation;
pub mod error;
pub mod ownership;
pub mod presentation;
pub mod rpc;
pub mod state;
pub mod types;

pub mod entities;
pub mod grid;
pub mod systems;

#[cfg(test)]
mod tests;

pub use state::Battlefield;
