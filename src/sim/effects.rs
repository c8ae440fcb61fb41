//! Particle bursts, bomb explosions, and ball splitting (special variant)

use glam::Vec2;
use rand::Rng;
use rand_pcg::Pcg32;

use super::state::{Ball, Block, BlockKind, Particle, ParticleColor};
use crate::consts::{MAX_PARTICLES, PARTICLE_LIFE_TICKS};

/// Particle spread velocity, px/s per axis (uniform in +-half)
const PARTICLE_SPREAD: f32 = 240.0;

/// Spawn a burst of `count` particles at `pos`. The pool is bounded;
/// spawning stops at the cap and resumes as old particles expire.
pub fn spawn_burst(
    particles: &mut Vec<Particle>,
    rng: &mut Pcg32,
    pos: Vec2,
    color: ParticleColor,
    count: usize,
) {
    for _ in 0..count {
        if particles.len() >= MAX_PARTICLES {
            return;
        }
        let vel = Vec2::new(
            (rng.random::<f32>() - 0.5) * PARTICLE_SPREAD,
            (rng.random::<f32>() - 0.5) * PARTICLE_SPREAD,
        );
        particles.push(Particle {
            pos,
            vel,
            color,
            life: PARTICLE_LIFE_TICKS,
            max_life: PARTICLE_LIFE_TICKS,
            size: rng.random::<f32>() * 3.0 + 2.0,
        });
    }
}

/// A block destroyed by an explosion
#[derive(Debug, Clone, Copy)]
pub struct BlastVictim {
    pub row: u32,
    pub col: u32,
    pub kind: BlockKind,
    pub center: Vec2,
    pub hue: f32,
}

/// Tombstone every visible block within `radius` of `center` and report
/// the victims. The querying bomb block is still visible when this runs,
/// so it destroys (and scores) itself along with its neighbors.
pub fn explode_at(blocks: &mut [Block], center: Vec2, radius: f32) -> Vec<BlastVictim> {
    let mut victims = Vec::new();
    for block in blocks.iter_mut().filter(|b| b.visible) {
        let block_center = block.center();
        if block_center.distance(center) < radius {
            block.visible = false;
            victims.push(BlastVictim {
                row: block.row,
                col: block.col,
                kind: block.kind,
                center: block_center,
                hue: block.hue,
            });
        }
    }
    victims
}

/// Split the ball at `source` into up to two children fanned off it.
/// Children inherit the base speed scalar (not the current velocity, so
/// a sped-up parent spawns normal-speed children) and shrink by 20%.
/// The active ball count never exceeds `cap`: at `cap - 1` only one
/// child spawns, and at `cap` the split is refused outright.
pub fn split_ball(balls: &mut Vec<Ball>, parent: &Ball, rng: &mut Pcg32, cap: usize) -> bool {
    if balls.len() >= cap {
        return false;
    }
    for i in 0..2 {
        if balls.len() >= cap {
            break;
        }
        let angle = std::f32::consts::PI * i as f32 + rng.random::<f32>() * 0.5;
        let mut child = Ball::new(
            parent.pos,
            Vec2::new(angle.cos(), angle.sin()) * parent.speed,
            parent.radius * 0.8,
        );
        child.speed = parent.speed;
        balls.push(child);
    }
    true
}
