//! Deterministic game state engine for the expedition economy.
//!
//! The engine is a pure state machine: every user command is a synchronous
//! transition on one [`contracts::GameState`] document, returning an
//! explicit [`contracts::CommandResult`]. Time enters only through
//! [`world::GameWorld::advance`], so the whole lifecycle is replayable
//! under test without a wall clock.

pub mod catalog;
pub mod economy;
pub mod rng;
pub mod world;

pub use catalog::{Catalog, StarterCatalog};
pub use world::{GameWorld, StepMetrics};
