//! Marker-driven patterns: Searchlight and Lockdown
//!
//! Both park [`Marker`](crate::sim::beam::Marker)s on the field edges and
//! draw beams while they aim. Fixtures belong to the wave and are removed by
//! `WaveCore::end`, which these patterns call themselves once spent.

use glam::Vec2;
use rand::Rng;

use crate::sim::beam::{Anchor, Beam};
use crate::sim::color::Color;
use crate::sim::projectile::Projectile;
use crate::sim::wave::{BuildCtx, SpawnCtx, WaveCore, random_inset};
use crate::{heading_angle, heading_vector};

/// Distance from the field edge at which markers sit
const EDGE_INSET: f32 = 5.0;

fn beam_mut<'a>(ctx: &'a mut SpawnCtx, id: Option<u32>) -> Option<&'a mut Beam> {
    ctx.arena.beam_mut(id?)
}

/// Screen-space facing for a marker looking along `dir`
fn facing(dir: Vec2) -> f32 {
    dir.y.atan2(dir.x)
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum SearchPhase {
    Tracking { timer: f32 },
    Latched { aim: Vec2, timer: f32 },
}

/// Searchlight: one marker on the top edge follows the player with a beam,
/// latches, then fires a layered fan at the latched point and relocates.
#[derive(Debug, Clone)]
pub struct TrackingSpread {
    pub marker: Option<u32>,
    pub beam: Option<u32>,
    pub bullets_per_layer: u32,
    phase: SearchPhase,
}

impl TrackingSpread {
    pub const TRACK_TIME: f32 = 1.2;
    pub const LATCH_TIME: f32 = 0.3;
    pub const LAYER_SPEEDS: [f32; 3] = [180.0, 220.0, 260.0];
    /// Full fan width (degrees)
    pub const SPREAD_ANGLE: f32 = 60.0;
    pub const BULLETS_PER_LAYER: u32 = 5;

    pub fn new(core: &mut WaveCore, _ctx: &mut BuildCtx) -> Self {
        // Small waves still get one full volley
        let layers = Self::LAYER_SPEEDS.len() as u32;
        let bullets_per_layer = Self::BULLETS_PER_LAYER.min(core.wave_size.div_ceil(layers)).max(1);
        Self {
            marker: None,
            beam: None,
            bullets_per_layer,
            phase: SearchPhase::Tracking { timer: 0.0 },
        }
    }

    fn random_top_position(ctx: &mut SpawnCtx) -> Vec2 {
        Vec2::new(random_inset(ctx.rng, ctx.field.x, 40.0), EDGE_INSET)
    }

    pub fn update(&mut self, core: &mut WaveCore, ctx: &mut SpawnCtx) {
        if !core.can_spawn() {
            core.end(ctx.arena);
            return;
        }

        let marker_id = match self.marker {
            Some(id) => id,
            None => {
                let pos = Self::random_top_position(ctx);
                let id = ctx.arena.add_marker(core.number, pos, core.color);
                self.marker = Some(id);
                self.beam = Some(ctx.arena.add_beam(core.number, Anchor::Marker(id), Anchor::Player, core.color, false));
                id
            }
        };
        let Some(source) = ctx.arena.marker_mut(marker_id).map(|m| m.pos) else {
            return;
        };

        match &mut self.phase {
            SearchPhase::Tracking { timer } => {
                *timer += ctx.dt;
                if let Some(marker) = ctx.arena.marker_mut(marker_id) {
                    marker.rot = facing(ctx.player_pos - source);
                }
                if *timer >= Self::TRACK_TIME {
                    let aim = ctx.player_pos;
                    if let Some(beam) = beam_mut(ctx, self.beam) {
                        beam.target = Anchor::Point(aim);
                        beam.ray = true;
                        beam.color = Color::RED;
                    }
                    self.phase = SearchPhase::Latched { aim, timer: 0.0 };
                }
            }
            SearchPhase::Latched { aim, timer } => {
                *timer += ctx.dt;
                if *timer < Self::LATCH_TIME {
                    return;
                }
                let aim = *aim;
                self.fire(core, ctx, source, aim);

                let next = Self::random_top_position(ctx);
                if let Some(marker) = ctx.arena.marker_mut(marker_id) {
                    marker.pos = next;
                }
                if let Some(beam) = beam_mut(ctx, self.beam) {
                    beam.target = Anchor::Player;
                    beam.ray = false;
                    beam.color = core.color;
                }
                self.phase = SearchPhase::Tracking { timer: 0.0 };
            }
        }
    }

    fn fire(&self, core: &mut WaveCore, ctx: &mut SpawnCtx, source: Vec2, aim: Vec2) {
        let base = heading_angle(aim - source);
        let n = self.bullets_per_layer.max(1);
        for speed in Self::LAYER_SPEEDS {
            for i in 0..n {
                let t = if n == 1 { 0.5 } else { i as f32 / (n - 1) as f32 };
                let offset = (Self::SPREAD_ANGLE * t - Self::SPREAD_ANGLE / 2.0).to_radians();
                let vel = heading_vector(base + offset) * speed;
                if core
                    .spawn(ctx.arena, Projectile::constant(core.number, core.color, source, vel, Vec2::ZERO))
                    .is_none()
                {
                    return;
                }
            }
        }
        log::debug!("Searchlight volley from {:?} at {:?}", source, aim);
    }
}

/// Cone half-angle (radians) at tracking progress `t` in `[0, 1]`
pub fn cone_half_angle(t: f32) -> f32 {
    let t = t.clamp(0.0, 1.0);
    let degrees = Turret::OPEN_HALF_ANGLE + (Turret::LOCK_HALF_ANGLE - Turret::OPEN_HALF_ANGLE) * t;
    degrees.to_radians()
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum TurretPhase {
    Waiting(f32),
    Tracking(f32),
    Locked(f32),
    Reset(f32),
    Done,
}

#[derive(Debug, Clone)]
struct TurretUnit {
    marker: u32,
    /// Lock beam plus the two cone edges
    beams: Option<[u32; 3]>,
    phase: TurretPhase,
    bursts_fired: u32,
    aim: f32,
}

/// Lockdown: edge turrets narrow a cone onto the player, fire a burst into
/// it, cool down and repeat a fixed number of times.
#[derive(Debug, Clone)]
pub struct Turret {
    pub n_turrets: u32,
    pub bullets_per_burst: u32,
    pub bursts: u32,
    positions: Vec<Vec2>,
    units: Vec<TurretUnit>,
}

impl Turret {
    pub const OPEN_HALF_ANGLE: f32 = 45.0;
    pub const LOCK_HALF_ANGLE: f32 = 6.0;
    pub const LOCK_TIME: f32 = 1.5;
    pub const LOCKED_TIME: f32 = 0.2;
    pub const RESET_TIME: f32 = 0.5;
    pub const BURSTS: u32 = 3;
    pub const SPEED: f32 = 260.0;
    pub const SPEED_JITTER: f32 = 0.15;
    /// Delay between consecutive turrets starting
    pub const STAGGER: f32 = 0.4;
    const RAY_REACH: f32 = 100.0;

    pub fn new(core: &mut WaveCore, ctx: &mut BuildCtx) -> Self {
        let n_turrets: u32 = ctx.rng.random_range(2..=4);
        let bullets_per_burst = core.wave_size.div_ceil(n_turrets * Self::BURSTS).max(1);
        core.wave_size = n_turrets * Self::BURSTS * bullets_per_burst;

        let (w, h) = (ctx.field.x, ctx.field.y);
        let positions = (0..n_turrets)
            .map(|_| {
                let along_x = random_inset(ctx.rng, w, 40.0);
                let along_y = random_inset(ctx.rng, h, 40.0);
                match ctx.rng.random_range(0..4) {
                    0 => Vec2::new(along_x, EDGE_INSET),
                    1 => Vec2::new(along_x, h - EDGE_INSET),
                    2 => Vec2::new(EDGE_INSET, along_y),
                    _ => Vec2::new(w - EDGE_INSET, along_y),
                }
            })
            .collect();

        Self {
            n_turrets,
            bullets_per_burst,
            bursts: Self::BURSTS,
            positions,
            units: Vec::new(),
        }
    }

    pub fn is_done(&self) -> bool {
        !self.units.is_empty() && self.units.iter().all(|u| u.phase == TurretPhase::Done)
    }

    pub fn update(&mut self, core: &mut WaveCore, ctx: &mut SpawnCtx) {
        if self.units.is_empty() {
            for (i, &pos) in self.positions.iter().enumerate() {
                let marker = ctx.arena.add_marker(core.number, pos, core.color);
                self.units.push(TurretUnit {
                    marker,
                    beams: None,
                    phase: TurretPhase::Waiting(i as f32 * Self::STAGGER),
                    bursts_fired: 0,
                    aim: 0.0,
                });
            }
        }

        for unit in &mut self.units {
            Self::step(unit, self.bullets_per_burst, self.bursts, core, ctx);
        }

        if self.is_done() {
            log::debug!("Lockdown wave {} spent", core.number);
            core.end(ctx.arena);
        }
    }

    fn step(unit: &mut TurretUnit, per_burst: u32, bursts: u32, core: &mut WaveCore, ctx: &mut SpawnCtx) {
        let Some(source) = ctx.arena.marker_mut(unit.marker).map(|m| m.pos) else {
            unit.phase = TurretPhase::Done;
            return;
        };

        unit.phase = match unit.phase {
            TurretPhase::Waiting(delay) => {
                let delay = delay - ctx.dt;
                if delay <= 0.0 {
                    Self::show_beams(unit, core, ctx);
                    TurretPhase::Tracking(0.0)
                } else {
                    TurretPhase::Waiting(delay)
                }
            }
            TurretPhase::Tracking(t) => {
                let t = t + ctx.dt;
                unit.aim = heading_angle(ctx.player_pos - source);
                let half = cone_half_angle(t / Self::LOCK_TIME);
                Self::aim_beams(unit, source, half, ctx);

                if t >= Self::LOCK_TIME {
                    Self::fire(unit, source, per_burst, core, ctx);
                    unit.bursts_fired += 1;
                    if let Some(beam) = beam_mut(ctx, unit.beams.map(|[lock, _, _]| lock)) {
                        beam.color = Color::RED;
                    }
                    TurretPhase::Locked(0.0)
                } else {
                    TurretPhase::Tracking(t)
                }
            }
            TurretPhase::Locked(t) => {
                let t = t + ctx.dt;
                if t >= Self::LOCKED_TIME {
                    Self::hide_beams(unit, ctx);
                    if unit.bursts_fired >= bursts {
                        TurretPhase::Done
                    } else {
                        TurretPhase::Reset(0.0)
                    }
                } else {
                    TurretPhase::Locked(t)
                }
            }
            TurretPhase::Reset(t) => {
                let t = t + ctx.dt;
                if t >= Self::RESET_TIME {
                    Self::show_beams(unit, core, ctx);
                    TurretPhase::Tracking(0.0)
                } else {
                    TurretPhase::Reset(t)
                }
            }
            TurretPhase::Done => TurretPhase::Done,
        };
    }

    fn show_beams(unit: &mut TurretUnit, core: &WaveCore, ctx: &mut SpawnCtx) {
        let source = Anchor::Marker(unit.marker);
        let lock = ctx.arena.add_beam(core.number, source, Anchor::Player, core.color, false);
        let left = ctx.arena.add_beam(core.number, source, Anchor::Player, core.color, true);
        let right = ctx.arena.add_beam(core.number, source, Anchor::Player, core.color, true);
        unit.beams = Some([lock, left, right]);
    }

    fn hide_beams(unit: &mut TurretUnit, ctx: &mut SpawnCtx) {
        if let Some(ids) = unit.beams.take() {
            for id in ids {
                ctx.arena.remove_beam(id);
            }
        }
    }

    fn aim_beams(unit: &TurretUnit, source: Vec2, half: f32, ctx: &mut SpawnCtx) {
        if let Some(marker) = ctx.arena.marker_mut(unit.marker) {
            marker.rot = facing(heading_vector(unit.aim));
        }
        let Some([_, left, right]) = unit.beams else {
            return;
        };
        for (id, angle) in [(left, unit.aim - half), (right, unit.aim + half)] {
            if let Some(beam) = ctx.arena.beam_mut(id) {
                beam.target = Anchor::Point(source + heading_vector(angle) * Self::RAY_REACH);
            }
        }
    }

    fn fire(unit: &TurretUnit, source: Vec2, per_burst: u32, core: &mut WaveCore, ctx: &mut SpawnCtx) {
        let half = cone_half_angle(1.0);
        for _ in 0..per_burst {
            let angle = unit.aim + ctx.rng.random_range(-half..=half);
            let speed = Self::SPEED * ctx.rng.random_range(1.0 - Self::SPEED_JITTER..=1.0 + Self::SPEED_JITTER);
            let vel = heading_vector(angle) * speed;
            core.spawn(ctx.arena, Projectile::constant(core.number, core.color, source, vel, Vec2::ZERO));
        }
    }
}
