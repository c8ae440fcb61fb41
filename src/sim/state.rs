//! Game state and core simulation types
//!
//! One `SimState` serves all four variants; variant-specific fields sit
//! unused (at their defaults) when the capability is off.

use glam::Vec2;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::geometry::Rect;
use crate::config::ArenaConfig;
use crate::consts::*;

/// Capability flag selecting which mechanics are layered on the shared core
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Variant {
    /// Baseline reflection physics, single ball
    #[default]
    Classic,
    /// Classic plus falling collectibles and timed buffs
    PowerUps,
    /// Impulse-based rigid bodies; struck blocks fall free
    Physics,
    /// Special block types, particles, and ball splitting
    Special,
}

impl Variant {
    pub fn power_ups(self) -> bool {
        self == Variant::PowerUps
    }

    pub fn impulse_physics(self) -> bool {
        self == Variant::Physics
    }

    pub fn special_blocks(self) -> bool {
        self == Variant::Special
    }

    /// True circle-rect overlap vs. the ball-center point test.
    ///
    /// The classic and power-up variants deliberately keep the cruder
    /// center-in-rect test (a fast ball can tunnel through a corner);
    /// unifying them would change gameplay.
    pub fn circle_overlap(self) -> bool {
        matches!(self, Variant::Physics | Variant::Special)
    }

    /// Ball speed multiplier applied on level advance
    pub fn level_speed_scale(self) -> f32 {
        match self {
            Variant::Classic => 1.2,
            _ => 1.1,
        }
    }
}

/// Current phase of gameplay
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GamePhase {
    /// Paddle and ball visible but static; entered on ball loss or level load
    Waiting,
    /// Active gameplay
    Playing,
    /// Simulation frozen, re-entrant to Playing
    Paused,
    /// Lives exhausted; reset on the next start
    GameOver,
}

/// The player's paddle
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Paddle {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    /// Width without the big-paddle buff
    pub base_width: f32,
    pub height: f32,
    /// Horizontal velocity set by the host (px/s)
    pub dx: f32,
}

impl Paddle {
    pub fn new(cfg: &ArenaConfig) -> Self {
        Self {
            x: cfg.width / 2.0 - cfg.paddle_width / 2.0,
            y: cfg.paddle_y(),
            width: cfg.paddle_width,
            base_width: cfg.paddle_width,
            height: cfg.paddle_height,
            dx: 0.0,
        }
    }

    pub fn rect(&self) -> Rect {
        Rect::new(self.x, self.y, self.width, self.height)
    }

    /// Set horizontal velocity from key input; magnitude clamped
    pub fn set_velocity(&mut self, dx: f32) {
        self.dx = dx.clamp(-PADDLE_SPEED, PADDLE_SPEED);
    }

    /// Absolute positioning from pointer input
    pub fn move_to(&mut self, center_x: f32, arena_width: f32) {
        self.x = center_x - self.width / 2.0;
        self.clamp(arena_width);
    }

    /// Integrate velocity and commit through the single clamp
    pub fn advance(&mut self, dt: f32, arena_width: f32) {
        self.x += self.dx * dt;
        self.clamp(arena_width);
    }

    pub fn clamp(&mut self, arena_width: f32) {
        self.x = self.x.clamp(0.0, arena_width - self.width);
    }

    /// Normalized hit offset in [0, 1] for a contact at `x`
    pub fn hit_offset(&self, x: f32) -> f32 {
        (x - self.x) / self.width
    }
}

/// A ball entity
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Ball {
    pub pos: Vec2,
    pub vel: Vec2,
    pub radius: f32,
    /// Base speed scalar used when spawning split children
    pub speed: f32,
    /// Mass for impulse resolution (physics variant)
    pub mass: f32,
    /// Last positions, oldest first (special variant, bounded)
    #[serde(skip)]
    pub trail: Vec<Vec2>,
}

impl Ball {
    pub fn new(pos: Vec2, vel: Vec2, radius: f32) -> Self {
        Self {
            pos,
            vel,
            radius,
            speed: BALL_SPEED,
            mass: BODY_MASS,
            trail: Vec::with_capacity(TRAIL_LENGTH),
        }
    }

    /// Record the current position to the trail ring buffer
    pub fn record_trail(&mut self) {
        self.trail.push(self.pos);
        if self.trail.len() > TRAIL_LENGTH {
            self.trail.remove(0);
        }
    }
}

/// Block types (special variant; all other variants use Normal only)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum BlockKind {
    #[default]
    Normal,
    /// Destroys every visible block within the explosion radius
    Bomb,
    /// Splits the striking ball
    Star,
    /// Rotates visually, otherwise Normal
    Spin,
    /// Speeds up every active ball
    Speed,
    /// Takes two hits
    Hard,
}

/// A grid block. Never removed from the grid; `visible` is a tombstone.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Block {
    pub row: u32,
    pub col: u32,
    pub rect: Rect,
    pub visible: bool,
    /// Base hue in degrees (host maps to a concrete color)
    pub hue: f32,
    /// Drops a power-up on destruction (power-up variant)
    pub has_power_up: bool,
    pub kind: BlockKind,
    /// Hits remaining before destruction (2 for Hard, 1 otherwise)
    pub hits: u32,
    /// Visual rotation in radians (Spin blocks)
    pub rotation: f32,
    /// Velocity once freed (physics variant)
    pub vel: Vec2,
    pub mass: f32,
    /// Anchored until first struck (physics variant)
    pub fixed: bool,
}

impl Block {
    pub fn center(&self) -> Vec2 {
        self.rect.center()
    }

    /// Free (unanchored, still visible) physics body
    pub fn is_free(&self) -> bool {
        self.visible && !self.fixed
    }
}

/// Power-up types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PowerUpKind {
    BigPaddle,
    MultiBall,
    FastBall,
    ScoreBoost,
    ExtraLife,
}

/// A falling collectible (power-up variant)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PowerUp {
    pub pos: Vec2,
    pub size: f32,
    pub kind: PowerUpKind,
}

/// Particle color, resolved to a concrete color by the host
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum ParticleColor {
    /// Debris in the source block's hue
    Block(f32),
    /// White spark (hard-block intermediate hit)
    Spark,
    /// Red blast core (bomb)
    Blast,
}

/// A visual-effect particle (special variant)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Particle {
    pub pos: Vec2,
    pub vel: Vec2,
    pub color: ParticleColor,
    /// Remaining life in ticks
    pub life: u32,
    pub max_life: u32,
    pub size: f32,
}

/// Timed buffs (power-up variant), decremented once per step
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ActiveEffects {
    pub big_paddle_ticks: u32,
    pub score_boost_ticks: u32,
}

impl ActiveEffects {
    pub fn score_multiplier(&self) -> u64 {
        if self.score_boost_ticks > 0 { 2 } else { 1 }
    }
}

/// Events emitted by one simulation step, consumed by the host
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum GameEvent {
    BlockDestroyed {
        row: u32,
        col: u32,
        kind: BlockKind,
    },
    /// A fixed block became a free body (physics variant)
    BlockLoosened {
        row: u32,
        col: u32,
    },
    LifeLost {
        lives_remaining: u32,
    },
    LevelComplete {
        new_level: u32,
    },
    GameOver {
        final_score: u64,
    },
    PowerUpCollected {
        kind: PowerUpKind,
    },
    BallSplit {
        count: usize,
    },
}

/// Complete game state (deterministic, serializable)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimState {
    pub variant: Variant,
    pub config: ArenaConfig,
    /// Run seed for reproducibility
    pub seed: u64,
    pub(crate) rng: Pcg32,
    pub phase: GamePhase,
    pub score: u64,
    pub lives: u32,
    pub level: u32,
    pub paddle: Paddle,
    pub balls: Vec<Ball>,
    /// Row-major grid of rows x cols blocks, tombstoned in place
    pub blocks: Vec<Block>,
    pub power_ups: Vec<PowerUp>,
    /// Visual particles (not gameplay-affecting)
    #[serde(skip)]
    pub particles: Vec<Particle>,
    pub effects: ActiveEffects,
}

impl SimState {
    pub fn new(variant: Variant, seed: u64) -> Self {
        Self::new_with_config(variant, seed, ArenaConfig::default())
    }

    pub fn new_with_config(variant: Variant, seed: u64, config: ArenaConfig) -> Self {
        let mut state = Self {
            variant,
            config,
            seed,
            rng: Pcg32::seed_from_u64(seed),
            phase: GamePhase::Waiting,
            score: 0,
            lives: 3,
            level: 1,
            paddle: Paddle::new(&config),
            balls: Vec::new(),
            blocks: Vec::with_capacity(config.cell_count()),
            power_ups: Vec::new(),
            particles: Vec::new(),
            effects: ActiveEffects::default(),
        };
        state.build_grid();
        state.spawn_ball();
        state
    }

    /// Rebuild the full block grid with fresh random type and power-up
    /// assignment. Called at init and on every level transition.
    pub fn build_grid(&mut self) {
        self.blocks.clear();
        for row in 0..self.config.rows {
            for col in 0..self.config.cols {
                let (x, y) = self.config.cell_origin(row, col);
                let rect = Rect::new(x, y, self.config.block_width, self.config.block_height);

                let kind = if self.variant.special_blocks() {
                    roll_block_kind(&mut self.rng)
                } else {
                    BlockKind::Normal
                };
                let hue = if self.variant.special_blocks() {
                    self.rng.random::<f32>() * 60.0
                } else {
                    row as f32 * 30.0
                };
                let has_power_up = self.variant.power_ups()
                    && self.rng.random::<f32>() < POWERUP_DROP_CHANCE;

                self.blocks.push(Block {
                    row,
                    col,
                    rect,
                    visible: true,
                    hue,
                    has_power_up,
                    kind,
                    hits: if kind == BlockKind::Hard { 2 } else { 1 },
                    rotation: 0.0,
                    vel: Vec2::ZERO,
                    mass: BODY_MASS,
                    fixed: true,
                });
            }
        }
    }

    /// Spawn a single ball at the canvas center with a random horizontal sign
    pub fn spawn_ball(&mut self) {
        let center = Vec2::new(self.config.width / 2.0, self.config.height / 2.0);
        let sign = if self.rng.random_bool(0.5) { 1.0 } else { -1.0 };
        let vel = Vec2::new(BALL_SPEED * sign, -BALL_SPEED);
        self.balls
            .push(Ball::new(center, vel, self.config.ball_radius));
    }

    /// Replace all balls with one fresh center ball
    pub fn reset_balls(&mut self) {
        self.balls.clear();
        self.spawn_ball();
    }

    /// Host command: begin play. A no-op unless waiting or game over
    /// (game over resets the session first).
    pub fn start(&mut self) {
        match self.phase {
            GamePhase::Waiting => self.phase = GamePhase::Playing,
            GamePhase::GameOver => {
                self.reset();
                self.phase = GamePhase::Playing;
            }
            _ => {}
        }
    }

    /// Host command: toggle pause. Only defined between Playing and Paused.
    pub fn toggle_pause(&mut self) {
        match self.phase {
            GamePhase::Playing => self.phase = GamePhase::Paused,
            GamePhase::Paused => self.phase = GamePhase::Playing,
            _ => {}
        }
    }

    /// Full session reset: baseline score/lives/level, fresh grid and ball,
    /// paddle re-centered.
    pub fn reset(&mut self) {
        log::info!("session reset (final score {})", self.score);
        self.score = 0;
        self.lives = 3;
        self.level = 1;
        self.effects = ActiveEffects::default();
        self.power_ups.clear();
        self.particles.clear();
        self.paddle = Paddle::new(&self.config);
        self.build_grid();
        self.reset_balls();
        self.phase = GamePhase::Waiting;
    }

    /// Host input: key-driven paddle velocity (clamped)
    pub fn set_paddle_velocity(&mut self, dx: f32) {
        self.paddle.set_velocity(dx);
    }

    /// Host input: pointer-driven absolute paddle position. Applies in any
    /// phase, like the pointer handler it mirrors.
    pub fn set_paddle_target(&mut self, center_x: f32) {
        let width = self.config.width;
        self.paddle.move_to(center_x, width);
    }

    /// True iff every grid cell is tombstoned
    pub fn level_complete(&self) -> bool {
        self.blocks.iter().all(|b| !b.visible)
    }

    pub fn visible_blocks(&self) -> usize {
        self.blocks.iter().filter(|b| b.visible).count()
    }
}

/// Special-variant type assignment: 5% each for the five special kinds
fn roll_block_kind(rng: &mut Pcg32) -> BlockKind {
    let roll: f32 = rng.random();
    if roll < SPECIAL_BLOCK_CHANCE {
        BlockKind::Bomb
    } else if roll < SPECIAL_BLOCK_CHANCE * 2.0 {
        BlockKind::Star
    } else if roll < SPECIAL_BLOCK_CHANCE * 3.0 {
        BlockKind::Spin
    } else if roll < SPECIAL_BLOCK_CHANCE * 4.0 {
        BlockKind::Speed
    } else if roll < SPECIAL_BLOCK_CHANCE * 5.0 {
        BlockKind::Hard
    } else {
        BlockKind::Normal
    }
}
