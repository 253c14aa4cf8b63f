//! Single-source spreads: Sprinkler, Firework, Rubberhose

use glam::Vec2;
use rand::Rng;
use rand::seq::IndexedRandom;

use crate::sim::projectile::{Projectile, Target};
use crate::sim::wave::{BuildCtx, SpawnCtx, WaveCore};
use crate::{heading_angle, heading_vector};

/// Sprinkler: fan of bullets from a fixed point, one per tick, layer by
/// layer. Each new layer re-rolls its angular offset.
#[derive(Debug, Clone)]
pub struct FixedSpread {
    pub source: Vec2,
    /// Full fan width (degrees)
    pub spread_angle: f32,
    pub speed: f32,
    pub bullets_per_layer: u32,
    /// Offset of the current layer (degrees)
    pub angle_offset: f32,
}

impl FixedSpread {
    pub const SPREAD_ANGLE: f32 = 137.0;
    pub const SPEED: f32 = 200.0;
    /// Per-layer offset range (± degrees)
    pub const LAYER_JITTER: f32 = 15.0;

    pub fn new(core: &mut WaveCore, ctx: &mut BuildCtx) -> Self {
        let n_layers: f32 = ctx.rng.random_range(3.0..7.0);
        let bullets_per_layer = ((core.wave_size as f32 / n_layers) as u32).max(1);

        Self {
            source: Vec2::new(ctx.field.x / 2.0, ctx.field.y / 8.0),
            spread_angle: Self::SPREAD_ANGLE,
            speed: Self::SPEED,
            bullets_per_layer,
            angle_offset: 0.0,
        }
    }

    /// Launch velocity of bullet `index` within the current layer
    pub fn bullet_velocity(&self, index: u32) -> Vec2 {
        let n = self.bullets_per_layer as f32;
        let degrees = self.spread_angle * (index as f32 / n) - self.spread_angle / 2.0 + self.angle_offset;
        heading_vector(degrees.to_radians()) * self.speed
    }

    pub fn update(&mut self, core: &mut WaveCore, ctx: &mut SpawnCtx) {
        if !core.can_spawn() {
            return;
        }

        let layer = core.spawned() / self.bullets_per_layer;
        let index = core.spawned() % self.bullets_per_layer;
        let vel = self.bullet_velocity(index);
        core.spawn(
            ctx.arena,
            Projectile::constant(core.number, core.color, self.source, vel, Vec2::ZERO),
        );

        if core.spawned() / self.bullets_per_layer != layer {
            self.angle_offset = ctx.rng.random_range(-Self::LAYER_JITTER..Self::LAYER_JITTER);
        }
    }
}

/// Firework: homing bullets sprayed from one point, one per tick
#[derive(Debug, Clone)]
pub struct HomingBurst {
    pub source: Vec2,
    pub homing_magnitude: f32,
}

impl HomingBurst {
    pub const HOMING_MAGNITUDE: f32 = 100.0;

    pub fn new(ctx: &mut BuildCtx) -> Self {
        Self {
            source: Vec2::new(ctx.field.x / 2.0, ctx.field.y / 8.0),
            homing_magnitude: Self::HOMING_MAGNITUDE,
        }
    }

    pub fn update(&mut self, core: &mut WaveCore, ctx: &mut SpawnCtx) {
        if !core.can_spawn() {
            return;
        }
        let vel = Vec2::new(
            ctx.rng.random_range(-200.0..200.0),
            ctx.rng.random_range(-50.0..200.0),
        );
        core.spawn(
            ctx.arena,
            Projectile::homing(
                core.number,
                core.color,
                self.source,
                vel,
                Target::Player,
                self.homing_magnitude,
            ),
        );
    }
}

/// Rubberhose: a stream aimed at the player from a far corner.
///
/// Bullets-per-tick and homing-vs-straight are rolled once per wave.
#[derive(Debug, Clone)]
pub struct TargetedSpread {
    pub start: Vec2,
    pub speed: f32,
    pub bullets_per_tick: u32,
    pub homing: bool,
}

impl TargetedSpread {
    pub const SPEED: f32 = 300.0;
    pub const HOMING_MAGNITUDE: f32 = 400.0;
    /// Aim jitter (± degrees)
    pub const AIM_JITTER: f32 = 30.0;
    const CORNER_INSET: f32 = 10.0;

    pub fn new(ctx: &mut BuildCtx) -> Self {
        let bullets_per_tick = ctx.rng.random_range(1..=3);
        let homing = ctx.rng.random_bool(0.5);
        let start = Self::pick_corner(ctx.field, ctx.player_pos, Self::SPEED, ctx);

        Self {
            start,
            speed: Self::SPEED,
            bullets_per_tick,
            homing,
        }
    }

    /// Random corner at least `min_dist` away from the player; the farthest
    /// corner if none qualifies
    fn pick_corner(field: Vec2, player: Vec2, min_dist: f32, ctx: &mut BuildCtx) -> Vec2 {
        let inset = Self::CORNER_INSET;
        let corners = [
            Vec2::new(inset, inset),
            Vec2::new(inset, field.y - inset),
            Vec2::new(field.x - inset, inset),
            Vec2::new(field.x - inset, field.y - inset),
        ];

        let valid: Vec<Vec2> = corners
            .iter()
            .copied()
            .filter(|c| c.distance(player) > min_dist)
            .collect();

        match valid.choose(ctx.rng) {
            Some(&corner) => corner,
            None => corners
                .iter()
                .copied()
                .max_by(|a, b| {
                    a.distance(player)
                        .partial_cmp(&b.distance(player))
                        .unwrap_or(std::cmp::Ordering::Equal)
                })
                .unwrap_or(corners[0]),
        }
    }

    pub fn update(&mut self, core: &mut WaveCore, ctx: &mut SpawnCtx) {
        for _ in 0..self.bullets_per_tick {
            if !core.can_spawn() {
                return;
            }

            let jitter = ctx.rng.random_range(-Self::AIM_JITTER..Self::AIM_JITTER).to_radians();
            let angle = heading_angle(ctx.player_pos - self.start) + jitter;
            let vel = heading_vector(angle) * self.speed;

            let projectile = if self.homing {
                Projectile::homing(
                    core.number,
                    core.color,
                    self.start,
                    vel,
                    Target::Player,
                    Self::HOMING_MAGNITUDE,
                )
            } else {
                Projectile::constant(core.number, core.color, self.start, vel, Vec2::ZERO)
            };
            core.spawn(ctx.arena, projectile);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::arena::Arena;
    use crate::sim::color::Color;
    use crate::sim::wave::WaveKind;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    const FIELD: Vec2 = Vec2::new(800.0, 800.0);

    fn tick<F: FnMut(&mut WaveCore, &mut SpawnCtx)>(
        core: &mut WaveCore,
        arena: &mut Arena,
        rng: &mut Pcg32,
        player: Vec2,
        mut f: F,
    ) {
        let mut ctx = SpawnCtx {
            arena,
            rng,
            player_pos: player,
            field: FIELD,
            dt: 0.025,
            score: 0,
            detonations: Vec::new(),
        };
        f(core, &mut ctx);
    }

    #[test]
    fn test_sprinkler_first_bullet_velocity() {
        let spread = FixedSpread {
            source: Vec2::new(400.0, 100.0),
            spread_angle: 137.0,
            speed: 200.0,
            bullets_per_layer: 10,
            angle_offset: 0.0,
        };
        let vel = spread.bullet_velocity(0);
        let expected = Vec2::new(
            (-68.5f32).to_radians().sin() * 200.0,
            (-68.5f32).to_radians().cos() * 200.0,
        );
        assert!((vel - expected).length() < 1e-3);
        assert!((vel.x + 186.0).abs() < 0.5);
        assert!((vel.y - 73.1).abs() < 0.5);
    }

    #[test]
    fn test_sprinkler_offset_rerolls_on_layer_change() {
        let mut rng = Pcg32::seed_from_u64(1);
        let mut arena = Arena::new();
        let mut core = WaveCore::new(1, WaveKind::Sprinkler, Color::WHITE, 12, None);
        let mut spread = FixedSpread {
            source: Vec2::new(400.0, 100.0),
            spread_angle: 137.0,
            speed: 200.0,
            bullets_per_layer: 4,
            angle_offset: 0.0,
        };

        for _ in 0..3 {
            tick(&mut core, &mut arena, &mut rng, Vec2::ZERO, |c, ctx| spread.update(c, ctx));
        }
        assert_eq!(spread.angle_offset, 0.0);

        // Fourth bullet completes the layer
        tick(&mut core, &mut arena, &mut rng, Vec2::ZERO, |c, ctx| spread.update(c, ctx));
        assert_ne!(spread.angle_offset, 0.0);
        assert!(spread.angle_offset.abs() <= 15.0);
        assert_eq!(arena.projectiles.len(), 4);
    }

    #[test]
    fn test_sprinkler_layers_never_zero() {
        let mut rng = Pcg32::seed_from_u64(9);
        let mut core = WaveCore::new(1, WaveKind::Sprinkler, Color::WHITE, 1, None);
        let mut build = BuildCtx {
            rng: &mut rng,
            player_pos: Vec2::ZERO,
            field: FIELD,
        };
        let spread = FixedSpread::new(&mut core, &mut build);
        assert_eq!(spread.bullets_per_layer, 1);
    }

    #[test]
    fn test_rubberhose_corner_far_from_player() {
        for seed in 0..32 {
            let mut rng = Pcg32::seed_from_u64(seed);
            let player = Vec2::new(100.0, 100.0);
            let mut build = BuildCtx {
                rng: &mut rng,
                player_pos: player,
                field: FIELD,
            };
            let wave = TargetedSpread::new(&mut build);
            assert!(wave.start.distance(player) > TargetedSpread::SPEED);
            assert!((1..=3).contains(&wave.bullets_per_tick));
        }
    }

    #[test]
    fn test_rubberhose_homing_is_per_wave() {
        let mut rng = Pcg32::seed_from_u64(4);
        let mut arena = Arena::new();
        let mut core = WaveCore::new(1, WaveKind::Rubberhose, Color::WHITE, 40, None);
        let mut build = BuildCtx {
            rng: &mut rng,
            player_pos: Vec2::new(400.0, 400.0),
            field: FIELD,
        };
        let mut wave = TargetedSpread::new(&mut build);
        for _ in 0..50 {
            tick(&mut core, &mut arena, &mut rng, Vec2::new(400.0, 400.0), |c, ctx| {
                wave.update(c, ctx)
            });
        }
        assert_eq!(core.spawned(), 40);
        let homing = arena.projectiles.iter().filter(|p| p.is_homing()).count();
        assert!(homing == 0 || homing == 40);
        assert_eq!(homing == 40, wave.homing);
    }

    #[test]
    fn test_rubberhose_aims_near_player() {
        let mut rng = Pcg32::seed_from_u64(5);
        let mut arena = Arena::new();
        let mut core = WaveCore::new(1, WaveKind::Rubberhose, Color::WHITE, 20, None);
        let player = Vec2::new(400.0, 400.0);
        let mut wave = TargetedSpread {
            start: Vec2::new(10.0, 10.0),
            speed: 300.0,
            bullets_per_tick: 2,
            homing: false,
        };
        tick(&mut core, &mut arena, &mut rng, player, |c, ctx| wave.update(c, ctx));
        let to_player = (player - wave.start).normalize();
        for p in &arena.projectiles {
            let dir = p.body.vel.normalize();
            // Within the ±30° jitter cone
            assert!(dir.dot(to_player) >= 30f32.to_radians().cos() - 1e-4);
            assert!((p.body.speed() - 300.0).abs() < 1e-2);
        }
    }
}
