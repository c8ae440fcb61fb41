//! Brickwave - a family of four breakout variants on one simulation core
//!
//! Core modules:
//! - `sim`: Deterministic simulation (geometry, collisions, game state)
//! - `config`: Fixed arena/grid configuration consumed at initialization
//!
//! The four variants (classic, power-ups, rigid-body physics, special
//! blocks) share one `SimState` and one `step` function, parameterized by
//! a [`sim::Variant`] capability flag. Rendering and DOM wiring live in
//! the host driver (`main.rs`), which only reads simulation state and
//! feeds back edge-triggered input.

pub mod config;
pub mod sim;

pub use config::ArenaConfig;
pub use sim::{GameEvent, GamePhase, SimState, Variant};

/// Game tuning constants
///
/// The simulation runs at a fixed 60 Hz timestep; velocities are px/s and
/// timed effects count ticks at that rate.
pub mod consts {
    /// Fixed simulation timestep (60 Hz, matching the display-driven original)
    pub const SIM_DT: f32 = 1.0 / 60.0;
    /// Maximum substeps per frame to prevent spiral of death
    pub const MAX_SUBSTEPS: u32 = 8;

    /// Paddle defaults
    pub const PADDLE_SPEED: f32 = 300.0;
    /// Horizontal velocity imparted per unit of paddle hit offset
    pub const PADDLE_DEFLECT: f32 = 360.0;

    /// Ball defaults
    pub const BALL_SPEED: f32 = 180.0;
    /// Trail ring buffer length (special variant)
    pub const TRAIL_LENGTH: usize = 5;

    /// Power-up defaults
    pub const POWERUP_SIZE: f32 = 20.0;
    pub const POWERUP_FALL_SPEED: f32 = 120.0;
    pub const POWERUP_DROP_CHANCE: f32 = 0.3;
    /// Timed buff duration (10 seconds)
    pub const EFFECT_DURATION_TICKS: u32 = 600;
    pub const BIG_PADDLE_SCALE: f32 = 1.5;
    pub const FAST_BALL_SCALE: f32 = 1.5;

    /// Rigid-body physics (physics variant)
    pub const GRAVITY: f32 = 720.0;
    /// Fraction of full gravity felt by the ball (playability asymmetry)
    pub const BALL_GRAVITY_SCALE: f32 = 0.1;
    pub const RESTITUTION: f32 = 0.8;
    /// Per-step horizontal damping on free blocks
    pub const FRICTION: f32 = 0.95;
    pub const PADDLE_MASS: f32 = 10.0;
    pub const BODY_MASS: f32 = 1.0;
    /// Horizontal nudge per unit of paddle hit offset (physics variant)
    pub const PADDLE_NUDGE: f32 = 120.0;
    /// Free blocks this far past the bottom edge are tombstoned
    pub const OFFSCREEN_MARGIN: f32 = 100.0;

    /// Special block tuning
    pub const SPECIAL_BLOCK_CHANCE: f32 = 0.05;
    pub const EXPLOSION_RADIUS: f32 = 80.0;
    pub const SPEED_BLOCK_SCALE: f32 = 1.2;
    /// Spin block rotation rate, radians/s (visual only)
    pub const SPIN_RATE: f32 = 6.0;
    /// Ball cap for star-block splits
    pub const STAR_SPLIT_CAP: usize = 10;
    /// Ball cap for the random split on normal blocks
    pub const RANDOM_SPLIT_CAP: usize = 5;
    pub const RANDOM_SPLIT_CHANCE: f32 = 0.1;

    /// Scoring
    pub const SCORE_BLOCK: u64 = 10;
    pub const SCORE_STAR: u64 = 20;
    pub const SCORE_SPEED: u64 = 15;

    /// Particle defaults
    pub const PARTICLE_LIFE_TICKS: u32 = 30;
    pub const PARTICLE_GRAVITY: f32 = 360.0;
    pub const MAX_PARTICLES: usize = 256;
}
