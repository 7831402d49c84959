//! Game tool
//!
//! The platformer itself: physics bodies resolved against the tilemap,
//! the player state machine, enemy AI, projectiles, cosmetic effects,
//! and the per-tick session orchestration.

pub mod clouds;
pub mod enemy;
pub mod particles;
pub mod physics;
pub mod player;
pub mod projectile;
pub mod state;

pub use state::GameState;
