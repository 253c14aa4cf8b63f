//! Patterned spreads: Pulsar, Resonance, Supercollider
//!
//! Fixed spawn points, each paired with a target point. Once per layer every
//! spawn point fires a fan centred on its target.

use glam::Vec2;
use rand::Rng;

use crate::sim::projectile::Projectile;
use crate::sim::wave::{BuildCtx, SpawnCtx, WaveCore};
use crate::{heading_angle, heading_vector};

#[derive(Debug, Clone)]
pub struct PatternedSpread {
    /// `(spawn point, target point)` pairs
    pub lanes: Vec<(Vec2, Vec2)>,
    /// Full fan width (degrees)
    pub spread_angle: f32,
    pub speed: f32,
    pub layer_time: f32,
    pub n_layers: u32,
    pub bullets_per_point: u32,
    t: f32,
    last_layer: i64,
}

impl PatternedSpread {
    pub const SPEED: f32 = 200.0;
    pub const LAYER_TIME: f32 = 1.0;
    /// Per-fan aim jitter (± degrees)
    pub const AIM_JITTER: f32 = 3.0;

    fn build(core: &WaveCore, lanes: Vec<(Vec2, Vec2)>, spread_angle: f32, n_layers: u32) -> Self {
        let n_layers = n_layers.max(1);
        let bullets_per_layer = core.wave_size / n_layers;
        let bullets_per_point = (bullets_per_layer / lanes.len().max(1) as u32).max(1);

        Self {
            lanes,
            spread_angle,
            speed: Self::SPEED,
            layer_time: Self::LAYER_TIME,
            n_layers,
            bullets_per_point,
            t: 0.0,
            last_layer: -1,
        }
    }

    /// Three corners of a triangle converging on the centre
    pub fn pulsar(core: &mut WaveCore, ctx: &mut BuildCtx) -> Self {
        let (w, h) = (ctx.field.x, ctx.field.y);
        let centre = ctx.field / 2.0;
        let lanes = vec![
            (Vec2::new(w / 2.0, 5.0), centre),
            (Vec2::new(5.0, h - 5.0), centre),
            (Vec2::new(w - 5.0, h - 5.0), centre),
        ];
        let n_layers = ctx.rng.random_range(3.0f32..7.0) as u32;
        Self::build(core, lanes, 120.0, n_layers)
    }

    /// Left and right edges firing at each other
    pub fn resonance(core: &mut WaveCore, ctx: &mut BuildCtx) -> Self {
        let (w, h) = (ctx.field.x, ctx.field.y);
        let left = Vec2::new(10.0, h / 2.0);
        let right = Vec2::new(w - 10.0, h / 2.0);
        let n_layers = ctx.rng.random_range(2.0f32..4.0) as u32;
        Self::build(core, vec![(left, right), (right, left)], 180.0, n_layers)
    }

    /// Top and bottom edges firing at each other
    pub fn supercollider(core: &mut WaveCore, ctx: &mut BuildCtx) -> Self {
        let (w, h) = (ctx.field.x, ctx.field.y);
        let top = Vec2::new(w / 2.0, 10.0);
        let bottom = Vec2::new(w / 2.0, h - 10.0);
        let n_layers = ctx.rng.random_range(2.0f32..4.0) as u32;
        Self::build(core, vec![(top, bottom), (bottom, top)], 180.0, n_layers)
    }

    /// Velocity of bullet `index` in a fan from `start` toward `target`
    pub fn fan_velocity(&self, start: Vec2, target: Vec2, index: u32, jitter_deg: f32) -> Vec2 {
        let n = self.bullets_per_point as f32;
        let degrees = self.spread_angle * (index as f32 / n) - self.spread_angle / 2.0 + jitter_deg;
        let angle = heading_angle(target - start) + degrees.to_radians();
        heading_vector(angle) * self.speed
    }

    pub fn update(&mut self, core: &mut WaveCore, ctx: &mut SpawnCtx) {
        self.t += ctx.dt;
        if !core.can_spawn() {
            return;
        }

        let layer = (self.t / self.layer_time.max(f32::EPSILON)).floor() as i64;
        if layer <= self.last_layer {
            return;
        }
        self.last_layer = layer;

        for &(start, target) in &self.lanes {
            let jitter = ctx.rng.random_range(-Self::AIM_JITTER..Self::AIM_JITTER);
            for i in 0..self.bullets_per_point {
                let vel = self.fan_velocity(start, target, i, jitter);
                if core
                    .spawn(ctx.arena, Projectile::constant(core.number, core.color, start, vel, Vec2::ZERO))
                    .is_none()
                {
                    return;
                }
            }
        }
    }
}
