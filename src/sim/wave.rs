//! Waves: one scripted spawn sequence per bullet pattern
//!
//! A wave is a [`WaveCore`] (counters, color, budget) plus the state of one
//! closed-set [`Pattern`]. Every bullet goes through [`WaveCore::spawn`],
//! which refuses once the wave has spawned its full size. That gate is what
//! keeps the completion predicate monotone: once the counter reaches the
//! target and the live set drains, nothing can refill it.

use glam::Vec2;
use rand::Rng;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::arena::Arena;
use super::color::Color;
use super::patterns::{
    FixedSpread, Gridlock, HomingBurst, HomingTracer, Mirv, PatternedSpread, SegmentedStream,
    TargetedSpread, TrackingSpread, Turret,
};
use super::projectile::{Projectile, ProjectileId};

/// Every pattern in the catalog
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WaveKind {
    Sprinkler,
    Firework,
    Rubberhose,
    Mirv,
    Gridlock,
    Pulsar,
    Resonance,
    Supercollider,
    Searchlight,
    WillOWisp,
    Lockdown,
    Stutter,
    Switchback,
}

impl WaveKind {
    pub const ALL: [WaveKind; 13] = [
        WaveKind::Sprinkler,
        WaveKind::Firework,
        WaveKind::Rubberhose,
        WaveKind::Mirv,
        WaveKind::Gridlock,
        WaveKind::Pulsar,
        WaveKind::Resonance,
        WaveKind::Supercollider,
        WaveKind::Searchlight,
        WaveKind::WillOWisp,
        WaveKind::Lockdown,
        WaveKind::Stutter,
        WaveKind::Switchback,
    ];

    /// Display name for the HUD
    pub fn name(&self) -> &'static str {
        match self {
            WaveKind::Sprinkler => "Sprinkler",
            WaveKind::Firework => "Firework",
            WaveKind::Rubberhose => "Rubberhose",
            WaveKind::Mirv => "MIRV",
            WaveKind::Gridlock => "Gridlock",
            WaveKind::Pulsar => "Pulsar",
            WaveKind::Resonance => "Resonance",
            WaveKind::Supercollider => "Supercollider",
            WaveKind::Searchlight => "Searchlight",
            WaveKind::WillOWisp => "Will-o'-wisp",
            WaveKind::Lockdown => "Lockdown",
            WaveKind::Stutter => "Stutter",
            WaveKind::Switchback => "Switchback",
        }
    }
}

/// Uniform sample in `[lo, hi)`; a degenerate range yields `lo`
pub fn random_between(rng: &mut Pcg32, lo: f32, hi: f32) -> f32 {
    if hi > lo { rng.random_range(lo..hi) } else { lo }
}

/// Uniform coordinate along `extent` keeping `inset` clear of both ends.
/// The inset shrinks on small fields so the range never empties.
pub fn random_inset(rng: &mut Pcg32, extent: f32, inset: f32) -> f32 {
    let inset = inset.min(extent / 4.0).max(0.0);
    random_between(rng, inset, extent - inset)
}

/// Everything a wave may touch during one spawn tick
pub struct SpawnCtx<'a> {
    pub arena: &'a mut Arena,
    pub rng: &'a mut Pcg32,
    pub player_pos: Vec2,
    pub field: Vec2,
    /// Spawn tick length (seconds)
    pub dt: f32,
    /// Points awarded by the wave during this tick
    pub score: i64,
    /// Positions where leaders burst this tick (explosion effects)
    pub detonations: Vec<Vec2>,
}

/// What wave constructors may look at
pub struct BuildCtx<'a> {
    pub rng: &'a mut Pcg32,
    pub player_pos: Vec2,
    pub field: Vec2,
}

/// Counters and bookkeeping shared by every pattern
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WaveCore {
    /// Wave number; also the owner tag of every projectile it spawns
    pub number: u32,
    pub kind: WaveKind,
    pub color: Color,
    /// Total bullets this wave will spawn
    pub wave_size: u32,
    spawned: u32,
    /// Seconds the wave may run before it is forced complete
    pub time_budget: Option<f32>,
    elapsed: f32,
    ended: bool,
}

impl WaveCore {
    pub fn new(number: u32, kind: WaveKind, color: Color, wave_size: u32, time_budget: Option<f32>) -> Self {
        Self {
            number,
            kind,
            color,
            wave_size: wave_size.max(1),
            spawned: 0,
            time_budget,
            elapsed: 0.0,
            ended: false,
        }
    }

    pub fn spawned(&self) -> u32 {
        self.spawned
    }

    pub fn elapsed(&self) -> f32 {
        self.elapsed
    }

    pub fn can_spawn(&self) -> bool {
        self.spawned < self.wave_size
    }

    /// Bullets still to be spawned
    pub fn remaining(&self) -> u32 {
        self.wave_size.saturating_sub(self.spawned)
    }

    /// Spawn a projectile owned by this wave, unless the wave is spent
    pub fn spawn(&mut self, arena: &mut Arena, mut projectile: Projectile) -> Option<ProjectileId> {
        if !self.can_spawn() {
            return None;
        }
        projectile.wave = self.number;
        self.spawned += 1;
        Some(arena.spawn(projectile))
    }

    /// Give up on `count` bullets that can no longer be spawned (a leader was
    /// lost before it could burst). Never drops below what was already spawned.
    pub fn forfeit(&mut self, count: u32) {
        self.wave_size = self.wave_size.saturating_sub(count).max(self.spawned);
    }

    pub fn budget_expired(&self) -> bool {
        self.time_budget.is_some_and(|budget| self.elapsed >= budget)
    }

    pub fn is_ended(&self) -> bool {
        self.ended
    }

    /// Remove the wave's markers and beams. Runs at most once.
    pub fn end(&mut self, arena: &mut Arena) {
        if self.ended {
            return;
        }
        self.ended = true;
        arena.clear_fixtures(self.number);
    }
}

/// Pattern-specific state, one variant per catalog entry family
#[derive(Debug, Clone)]
pub enum Pattern {
    FixedSpread(FixedSpread),
    HomingBurst(HomingBurst),
    TargetedSpread(TargetedSpread),
    Mirv(Mirv),
    Gridlock(Gridlock),
    Patterned(PatternedSpread),
    TrackingSpread(TrackingSpread),
    HomingTracer(HomingTracer),
    Turret(Turret),
    Segmented(SegmentedStream),
}

/// A live wave
#[derive(Debug, Clone)]
pub struct Wave {
    pub core: WaveCore,
    pub pattern: Pattern,
}

impl Wave {
    /// Build a wave of `kind` with a requested size. Patterns clamp their
    /// derived geometry and may round `wave_size` to what they can realise.
    pub fn new(number: u32, kind: WaveKind, size: u32, time_budget: Option<f32>, ctx: &mut BuildCtx) -> Self {
        let color = Color::random_wave(ctx.rng);
        let mut core = WaveCore::new(number, kind, color, size, time_budget);

        let pattern = match kind {
            WaveKind::Sprinkler => Pattern::FixedSpread(FixedSpread::new(&mut core, ctx)),
            WaveKind::Firework => Pattern::HomingBurst(HomingBurst::new(ctx)),
            WaveKind::Rubberhose => Pattern::TargetedSpread(TargetedSpread::new(ctx)),
            WaveKind::Mirv => Pattern::Mirv(Mirv::new(&mut core, ctx)),
            WaveKind::Gridlock => Pattern::Gridlock(Gridlock::new(&mut core, ctx)),
            WaveKind::Pulsar => Pattern::Patterned(PatternedSpread::pulsar(&mut core, ctx)),
            WaveKind::Resonance => Pattern::Patterned(PatternedSpread::resonance(&mut core, ctx)),
            WaveKind::Supercollider => {
                Pattern::Patterned(PatternedSpread::supercollider(&mut core, ctx))
            }
            WaveKind::Searchlight => Pattern::TrackingSpread(TrackingSpread::new(&mut core, ctx)),
            WaveKind::WillOWisp => Pattern::HomingTracer(HomingTracer::new(&mut core, ctx)),
            WaveKind::Lockdown => Pattern::Turret(Turret::new(&mut core, ctx)),
            WaveKind::Stutter => Pattern::Segmented(SegmentedStream::stutter(ctx)),
            WaveKind::Switchback => Pattern::Segmented(SegmentedStream::switchback(ctx)),
        };

        Self { core, pattern }
    }

    pub fn number(&self) -> u32 {
        self.core.number
    }

    pub fn kind(&self) -> WaveKind {
        self.core.kind
    }

    pub fn name(&self) -> &'static str {
        self.core.kind.name()
    }

    /// One spawn tick
    pub fn update(&mut self, ctx: &mut SpawnCtx) {
        self.core.elapsed += ctx.dt;
        if self.core.is_ended() {
            return;
        }

        let core = &mut self.core;
        match &mut self.pattern {
            Pattern::FixedSpread(p) => p.update(core, ctx),
            Pattern::HomingBurst(p) => p.update(core, ctx),
            Pattern::TargetedSpread(p) => p.update(core, ctx),
            Pattern::Mirv(p) => p.update(core, ctx),
            Pattern::Gridlock(p) => p.update(core, ctx),
            Pattern::Patterned(p) => p.update(core, ctx),
            Pattern::TrackingSpread(p) => p.update(core, ctx),
            Pattern::HomingTracer(p) => p.update(core, ctx),
            Pattern::Turret(p) => p.update(core, ctx),
            Pattern::Segmented(p) => p.update(core, ctx),
        }
    }

    /// Number of this wave's projectiles still in play
    pub fn live_count(&self, arena: &Arena) -> usize {
        arena.live_count(self.core.number)
    }

    /// Complete once everything was spawned and has drained, or the time
    /// budget ran out
    pub fn is_complete(&self, arena: &Arena) -> bool {
        if self.core.budget_expired() {
            return true;
        }
        !self.core.can_spawn() && self.live_count(arena) == 0
    }

    /// Clean up markers and beams; safe to call more than once
    pub fn end(&mut self, arena: &mut Arena) {
        self.core.end(arena);
    }
}
