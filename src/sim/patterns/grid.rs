//! Gridlock: lattice of bullets sweeping in from the top and left edges

use glam::Vec2;
use rand::Rng;

use crate::sim::projectile::Projectile;
use crate::sim::wave::{BuildCtx, SpawnCtx, WaveCore};

/// Number of grid lines along an edge of length `extent`
pub fn grid_n_side(extent: f32, spacing: f32) -> u32 {
    if spacing <= 0.0 || extent <= 1.0 {
        return 1;
    }
    (((extent - 1.0) / spacing).floor() as u32).max(1)
}

#[derive(Debug, Clone)]
pub struct Gridlock {
    pub spacing: f32,
    pub speed: f32,
    pub n_side: u32,
    pub n_per_line: u32,
    /// Seconds between firing cycles
    pub period: f32,
    t: f32,
    last_fire_cycle: i64,
}

impl Gridlock {
    pub const SPACING: f32 = 30.0;
    pub const SPEED: f32 = 200.0;
    /// Lines start one unit inside the field
    const EDGE_INSET: f32 = 1.0;

    pub fn new(core: &mut WaveCore, ctx: &mut BuildCtx) -> Self {
        let n_side = grid_n_side(ctx.field.x.min(ctx.field.y), Self::SPACING);
        let n_per_line = core.wave_size.div_ceil(2 * n_side).max(1);
        core.wave_size = 2 * n_side * n_per_line;

        Self {
            spacing: Self::SPACING,
            speed: Self::SPEED,
            n_side,
            n_per_line,
            period: ctx.field.x / Self::SPEED / n_per_line as f32 / 2.0,
            t: 0.0,
            last_fire_cycle: -1,
        }
    }

    pub fn update(&mut self, core: &mut WaveCore, ctx: &mut SpawnCtx) {
        self.t += ctx.dt;
        let cycle = if self.period > 0.0 {
            (self.t / self.period).floor() as i64
        } else {
            self.last_fire_cycle + 1
        };
        if cycle <= self.last_fire_cycle {
            return;
        }
        self.last_fire_cycle = cycle;

        let jitter_x = ctx.rng.random_range(-self.spacing..self.spacing);
        let jitter_y = ctx.rng.random_range(-self.spacing..self.spacing);
        let inset = Self::EDGE_INSET;

        for i in 0..self.n_side {
            let offset = inset + i as f32 * self.spacing;

            if ctx.rng.random_bool(0.5) {
                let pos = Vec2::new(offset + jitter_x, inset);
                if pos.x >= 0.0 && pos.x <= ctx.field.x {
                    core.spawn(
                        ctx.arena,
                        Projectile::constant(core.number, core.color, pos, Vec2::new(0.0, self.speed), Vec2::ZERO),
                    );
                }
            }

            if ctx.rng.random_bool(0.5) {
                let pos = Vec2::new(inset, offset + jitter_y);
                if pos.y >= 0.0 && pos.y <= ctx.field.y {
                    core.spawn(
                        ctx.arena,
                        Projectile::constant(core.number, core.color, pos, Vec2::new(self.speed, 0.0), Vec2::ZERO),
                    );
                }
            }
        }
    }
}
