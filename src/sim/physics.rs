//! Impulse-based rigid-body resolution for the physics variant
//!
//! Bodies are circles (balls) and axis-aligned rects (blocks, paddle).
//! Collision normals come from the clamped closest point; impulses use
//! equal-and-opposite exchange scaled by restitution, with positional
//! correction by penetration depth so bodies never sink into each other.

use glam::Vec2;

use super::geometry::Rect;
use super::state::{Ball, Block, GameEvent};
use crate::consts::{FRICTION, GRAVITY, RESTITUTION};

/// A circle-rect contact: unit normal pointing away from the rect, and
/// how deep the circle has penetrated along it.
#[derive(Debug, Clone, Copy)]
pub struct Contact {
    pub normal: Vec2,
    pub penetration: f32,
}

/// Contact between a circle and a rect, or `None` if they are apart.
///
/// A circle center exactly on the rect surface (or inside it) has a
/// degenerate zero-length normal; we resolve that straight up, which is
/// the only direction a sunk ball can sensibly escape a block from.
pub fn circle_rect_contact(center: Vec2, radius: f32, rect: &Rect) -> Option<Contact> {
    let closest = rect.closest_point(center);
    let delta = center - closest;
    let dist_sq = delta.length_squared();
    if dist_sq >= radius * radius {
        return None;
    }
    let dist = dist_sq.sqrt();
    let normal = if dist > f32::EPSILON {
        delta / dist
    } else {
        Vec2::NEG_Y
    };
    Some(Contact {
        normal,
        penetration: radius - dist,
    })
}

/// Resolve a ball against a rect body.
///
/// Separating contacts (relative speed along the normal >= 0) are left
/// alone. Fixed bodies absorb their share of the impulse; only the ball
/// is corrected positionally since rects stay axis-aligned.
pub fn resolve_ball_body(
    ball: &mut Ball,
    body: &Rect,
    body_vel: &mut Vec2,
    body_mass: f32,
    body_fixed: bool,
) -> bool {
    let Some(contact) = circle_rect_contact(ball.pos, ball.radius, body) else {
        return false;
    };

    let rel = ball.vel - *body_vel;
    let rel_speed = rel.dot(contact.normal);
    if rel_speed < 0.0 {
        let impulse = 2.0 * rel_speed / (ball.mass + body_mass);
        ball.vel -= impulse * body_mass * RESTITUTION * contact.normal;
        if !body_fixed {
            *body_vel += impulse * ball.mass * RESTITUTION * contact.normal;
        }
        ball.pos += contact.normal * contact.penetration;
    }
    true
}

/// Integrate free blocks: gravity, position, horizontal friction. Blocks
/// that fall past the bottom margin are tombstoned and reported as
/// destroyed, which is what lets a physics level complete.
pub fn update_free_blocks(
    blocks: &mut [Block],
    arena_height: f32,
    margin: f32,
    dt: f32,
    events: &mut Vec<GameEvent>,
) {
    for block in blocks.iter_mut().filter(|b| b.is_free()) {
        block.vel.y += GRAVITY * dt;
        block.rect.x += block.vel.x * dt;
        block.rect.y += block.vel.y * dt;
        block.vel.x *= FRICTION;

        if block.rect.y > arena_height + margin {
            block.visible = false;
            events.push(GameEvent::BlockDestroyed {
                row: block.row,
                col: block.col,
                kind: block.kind,
            });
        }
    }
}

/// Pairwise impulse resolution between free blocks.
///
/// Normals come from rect centers (blocks are all the same size, so this
/// is close enough and far cheaper than face clipping). Each unordered
/// pair is resolved at most once per step.
pub fn resolve_block_pairs(blocks: &mut [Block]) {
    for i in 0..blocks.len() {
        for j in (i + 1)..blocks.len() {
            let (head, tail) = blocks.split_at_mut(j);
            let a = &mut head[i];
            let b = &mut tail[0];
            if !a.is_free() || !b.is_free() || !a.rect.overlaps(&b.rect) {
                continue;
            }

            let delta = a.center() - b.center();
            let dist = delta.length();
            if dist <= f32::EPSILON {
                continue;
            }
            let normal = delta / dist;

            let rel = a.vel - b.vel;
            let rel_speed = rel.dot(normal);
            if rel_speed < 0.0 {
                let impulse = 2.0 * rel_speed / (a.mass + b.mass);
                a.vel -= impulse * b.mass * RESTITUTION * normal;
                b.vel += impulse * a.mass * RESTITUTION * normal;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consts::{BODY_MASS, SIM_DT};
    use crate::sim::state::BlockKind;

    fn ball_at(pos: Vec2, vel: Vec2) -> Ball {
        Ball::new(pos, vel, 8.0)
    }

    fn free_block(x: f32, y: f32, vel: Vec2) -> Block {
        Block {
            row: 0,
            col: 0,
            rect: Rect::new(x, y, 70.0, 20.0),
            visible: true,
            hue: 0.0,
            has_power_up: false,
            kind: BlockKind::Normal,
            hits: 1,
            rotation: 0.0,
            vel,
            mass: BODY_MASS,
            fixed: false,
        }
    }

    #[test]
    fn test_contact_normal_points_away_from_rect() {
        let rect = Rect::new(0.0, 0.0, 70.0, 20.0);
        // Ball above the rect, overlapping its top edge
        let contact = circle_rect_contact(Vec2::new(35.0, -5.0), 8.0, &rect).unwrap();
        assert_eq!(contact.normal, Vec2::NEG_Y);
        assert!((contact.penetration - 3.0).abs() < 1e-5);
    }

    #[test]
    fn test_degenerate_contact_resolves_upward() {
        let rect = Rect::new(0.0, 0.0, 70.0, 20.0);
        let contact = circle_rect_contact(Vec2::new(35.0, 10.0), 8.0, &rect).unwrap();
        assert_eq!(contact.normal, Vec2::NEG_Y);
        assert!(contact.normal.is_finite());
    }

    #[test]
    fn test_separating_contact_is_skipped() {
        let rect = Rect::new(0.0, 0.0, 70.0, 20.0);
        // Overlapping but already moving apart
        let mut ball = ball_at(Vec2::new(35.0, -5.0), Vec2::new(0.0, -100.0));
        let mut vel = Vec2::ZERO;
        let hit = resolve_ball_body(&mut ball, &rect, &mut vel, 10.0, true);
        assert!(hit);
        assert_eq!(ball.vel, Vec2::new(0.0, -100.0));
        assert_eq!(ball.pos, Vec2::new(35.0, -5.0));
    }

    #[test]
    fn test_ball_bounces_off_fixed_body() {
        let rect = Rect::new(0.0, 0.0, 70.0, 20.0);
        let mut ball = ball_at(Vec2::new(35.0, -5.0), Vec2::new(0.0, 100.0));
        let mut vel = Vec2::ZERO;
        resolve_ball_body(&mut ball, &rect, &mut vel, 10.0, true);
        // Downward motion reversed
        assert!(ball.vel.y < 0.0);
        // Fixed body receives nothing
        assert_eq!(vel, Vec2::ZERO);
        // Pushed out along the normal
        assert!(ball.pos.y < -5.0);
    }

    #[test]
    fn test_free_body_receives_opposite_impulse() {
        let rect = Rect::new(0.0, 0.0, 70.0, 20.0);
        let mut ball = ball_at(Vec2::new(35.0, -5.0), Vec2::new(0.0, 100.0));
        let mut vel = Vec2::ZERO;
        resolve_ball_body(&mut ball, &rect, &mut vel, BODY_MASS, false);
        assert!(ball.vel.y < 100.0);
        assert!(vel.y > 0.0);
    }

    #[test]
    fn test_free_block_falls_and_tombstones() {
        let mut blocks = vec![free_block(100.0, 490.0, Vec2::new(0.0, 200.0))];
        let mut events = Vec::new();
        update_free_blocks(&mut blocks, 400.0, 100.0, SIM_DT, &mut events);
        assert!(!blocks[0].visible);
        assert_eq!(events.len(), 1);
        assert!(matches!(
            events[0],
            GameEvent::BlockDestroyed { row: 0, col: 0, .. }
        ));
    }

    #[test]
    fn test_fixed_blocks_do_not_move() {
        let mut block = free_block(100.0, 100.0, Vec2::ZERO);
        block.fixed = true;
        let before = block.rect;
        let mut blocks = vec![block];
        let mut events = Vec::new();
        update_free_blocks(&mut blocks, 400.0, 100.0, SIM_DT, &mut events);
        assert_eq!(blocks[0].rect, before);
        assert_eq!(blocks[0].vel, Vec2::ZERO);
        assert!(events.is_empty());
    }

    #[test]
    fn test_gravity_and_friction_applied() {
        let mut blocks = vec![free_block(100.0, 100.0, Vec2::new(60.0, 0.0))];
        let mut events = Vec::new();
        update_free_blocks(&mut blocks, 400.0, 100.0, SIM_DT, &mut events);
        assert!(blocks[0].vel.y > 0.0);
        assert!(blocks[0].vel.x < 60.0);
        assert!(blocks[0].rect.x > 100.0);
    }

    #[test]
    fn test_block_pair_impulse_pushes_apart() {
        let mut blocks = vec![
            free_block(100.0, 100.0, Vec2::new(60.0, 0.0)),
            free_block(160.0, 100.0, Vec2::new(-60.0, 0.0)),
        ];
        resolve_block_pairs(&mut blocks);
        // Approach reversed into separation
        assert!(blocks[0].vel.x < 0.0);
        assert!(blocks[1].vel.x > 0.0);
    }

    #[test]
    fn test_block_pair_separating_untouched() {
        let mut blocks = vec![
            free_block(100.0, 100.0, Vec2::new(-60.0, 0.0)),
            free_block(160.0, 100.0, Vec2::new(60.0, 0.0)),
        ];
        resolve_block_pairs(&mut blocks);
        assert_eq!(blocks[0].vel, Vec2::new(-60.0, 0.0));
        assert_eq!(blocks[1].vel, Vec2::new(60.0, 0.0));
    }
}
