//! Leader-and-burst patterns: MIRV and Will-o'-wisp
//!
//! A leader is a visible tracer; when it reaches its trigger (target point or
//! fuse) it is removed and a ring of children takes its place. Leaders count
//! toward the wave size, so each cluster reserves `1 + ring` spawns.

use std::f32::consts::TAU;

use glam::Vec2;
use rand::Rng;

use crate::heading_vector;
use crate::sim::color::Color;
use crate::sim::projectile::{Projectile, ProjectileId, Target};
use crate::sim::wave::{BuildCtx, SpawnCtx, WaveCore, random_inset};

/// Tracer flicker period for leaders (seconds)
const LEADER_BLINK: f32 = 0.08;

/// `count` unit directions evenly spaced over the full circle
pub fn ring_directions(count: u32) -> impl Iterator<Item = Vec2> {
    let count = count.max(1);
    (0..count).map(move |i| heading_vector(TAU * i as f32 / count as f32))
}

#[derive(Debug, Clone, Copy)]
struct Leader {
    id: ProjectileId,
    target: Vec2,
}

/// MIRV: leaders race from the bottom edge to random targets and split into
/// rings, each ring homing or ballistic on a coin flip.
#[derive(Debug, Clone)]
pub struct Mirv {
    pub bullets_per_cluster: u32,
    pub targets: Vec<Vec2>,
    leaders: Vec<Option<Leader>>,
    launched: bool,
}

impl Mirv {
    pub const BULLETS_PER_CLUSTER: u32 = 6;
    pub const LEADER_SPEED: f32 = 350.0;
    pub const CLUSTER_SPEED: f32 = 250.0;
    pub const HOMING_CLUSTER_SPEED: f32 = 50.0;
    pub const HOMING_MAGNITUDE: f32 = 400.0;
    pub const DETONATE_DISTANCE: f32 = 5.0;
    /// Targets keep this far from the field edges
    const TARGET_INSET: f32 = 50.0;

    pub fn new(core: &mut WaveCore, ctx: &mut BuildCtx) -> Self {
        let per = Self::BULLETS_PER_CLUSTER;
        let n_clusters = core.wave_size.div_ceil(per).max(1);
        core.wave_size = n_clusters * (per + 1);

        let targets = (0..n_clusters)
            .map(|_| {
                Vec2::new(
                    random_inset(ctx.rng, ctx.field.x, Self::TARGET_INSET),
                    random_inset(ctx.rng, ctx.field.y, Self::TARGET_INSET),
                )
            })
            .collect();

        Self {
            bullets_per_cluster: per,
            targets,
            leaders: Vec::new(),
            launched: false,
        }
    }

    /// Leaders burst once within range of their target, or once they have
    /// flown past it between two checks. At `LEADER_SPEED` a leader covers
    /// about 8.75 units per spawn tick and can step clean over the
    /// `DETONATE_DISTANCE` window; without the overshoot test it would fly
    /// on until it leaves the field and its cluster is forfeited.
    pub fn should_detonate(pos: Vec2, vel: Vec2, target: Vec2) -> bool {
        let to_target = target - pos;
        to_target.length() <= Self::DETONATE_DISTANCE || to_target.dot(vel) < 0.0
    }

    pub fn update(&mut self, core: &mut WaveCore, ctx: &mut SpawnCtx) {
        if !self.launched {
            self.launched = true;
            self.launch(core, ctx);
            return;
        }

        for slot in &mut self.leaders {
            let Some(leader) = *slot else { continue };

            let Some(projectile) = ctx.arena.get(leader.id) else {
                // Leader left the field before bursting
                core.forfeit(self.bullets_per_cluster);
                *slot = None;
                continue;
            };

            if !Self::should_detonate(projectile.pos(), projectile.body.vel, leader.target) {
                continue;
            }

            let origin = projectile.pos();
            ctx.arena.kill(leader.id);
            *slot = None;
            ctx.detonations.push(origin);

            let homing = ctx.rng.random_bool(0.5);
            log::debug!("MIRV leader burst at {:?} (homing: {})", origin, homing);
            for dir in ring_directions(self.bullets_per_cluster) {
                let child = if homing {
                    Projectile::homing(
                        core.number,
                        core.color,
                        origin,
                        dir * Self::HOMING_CLUSTER_SPEED,
                        Target::Player,
                        Self::HOMING_MAGNITUDE,
                    )
                } else {
                    Projectile::constant(core.number, core.color, origin, dir * Self::CLUSTER_SPEED, Vec2::ZERO)
                };
                core.spawn(ctx.arena, child);
            }
        }
    }

    fn launch(&mut self, core: &mut WaveCore, ctx: &mut SpawnCtx) {
        for &target in &self.targets {
            let start = Vec2::new(random_inset(ctx.rng, ctx.field.x, 20.0), ctx.field.y - 5.0);
            let vel = (target - start).normalize_or_zero() * Self::LEADER_SPEED;
            let leader = Projectile::tracer(core.number, core.color, Color::WHITE, start, vel, LEADER_BLINK);

            if let Some(id) = core.spawn(ctx.arena, leader) {
                // Each leader launched is worth a point
                ctx.score += 1;
                self.leaders.push(Some(Leader { id, target }));
            }
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct Wisp {
    id: ProjectileId,
    fuse: f32,
}

/// Will-o'-wisp: homing tracers drift in from the top and burst into a ring
/// of straight bullets when their fuse runs out.
#[derive(Debug, Clone)]
pub struct HomingTracer {
    pub ring: u32,
    pub n_wisps: u32,
    launched: u32,
    next_launch: f32,
    wisps: Vec<Wisp>,
}

impl HomingTracer {
    pub const RING: u32 = 8;
    pub const LAUNCH_INTERVAL: f32 = 0.6;
    pub const FUSE: f32 = 2.5;
    pub const LAUNCH_SPEED: f32 = 150.0;
    pub const HOMING_MAGNITUDE: f32 = 250.0;
    pub const RING_SPEED: f32 = 160.0;

    pub fn new(core: &mut WaveCore, _ctx: &mut BuildCtx) -> Self {
        let n_wisps = core.wave_size.div_ceil(Self::RING + 1).max(1);
        core.wave_size = n_wisps * (Self::RING + 1);
        Self {
            ring: Self::RING,
            n_wisps,
            launched: 0,
            next_launch: 0.0,
            wisps: Vec::new(),
        }
    }

    pub fn update(&mut self, core: &mut WaveCore, ctx: &mut SpawnCtx) {
        self.next_launch -= ctx.dt;
        if self.launched < self.n_wisps && self.next_launch <= 0.0 {
            self.next_launch = Self::LAUNCH_INTERVAL;
            self.launched += 1;

            let start = Vec2::new(random_inset(ctx.rng, ctx.field.x, 40.0), 5.0);
            let wisp = Projectile::homing(
                core.number,
                core.color,
                start,
                Vec2::new(0.0, Self::LAUNCH_SPEED),
                Target::Player,
                Self::HOMING_MAGNITUDE,
            )
            .with_blink(Color::WHITE, LEADER_BLINK);

            if let Some(id) = core.spawn(ctx.arena, wisp) {
                self.wisps.push(Wisp { id, fuse: Self::FUSE });
            }
        }

        let mut remaining = Vec::with_capacity(self.wisps.len());
        for mut wisp in self.wisps.drain(..) {
            wisp.fuse -= ctx.dt;

            let Some(projectile) = ctx.arena.get(wisp.id) else {
                core.forfeit(self.ring);
                continue;
            };
            if wisp.fuse > 0.0 {
                remaining.push(wisp);
                continue;
            }

            let origin = projectile.pos();
            ctx.arena.kill(wisp.id);
            ctx.detonations.push(origin);
            for dir in ring_directions(self.ring) {
                core.spawn(
                    ctx.arena,
                    Projectile::constant(core.number, core.color, origin, dir * Self::RING_SPEED, Vec2::ZERO),
                );
            }
        }
        self.wisps = remaining;
    }
}
