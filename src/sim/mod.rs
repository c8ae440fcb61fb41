//! Deterministic simulation module
//!
//! All gameplay logic lives here. This module must be pure and deterministic:
//! - Fixed timestep only
//! - Seeded RNG only
//! - No rendering or platform dependencies
//!
//! The host drives it with one `step` call per display refresh and consumes
//! the returned event list for UI updates.

pub mod effects;
pub mod geometry;
pub mod physics;
pub mod state;
pub mod tick;

pub use geometry::{Rect, circle_rect_overlap};
pub use state::{
    ActiveEffects, Ball, Block, BlockKind, GameEvent, GamePhase, Paddle, Particle, ParticleColor,
    PowerUp, PowerUpKind, SimState, Variant,
};
pub use tick::step;
