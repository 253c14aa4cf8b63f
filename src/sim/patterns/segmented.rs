//! Segmented streams: Stutter and Switchback

use glam::Vec2;
use rand::Rng;

use crate::sim::body::{Body, Kinematics};
use crate::sim::projectile::{Projectile, SegmentPath, Steering, Target};
use crate::sim::wave::{BuildCtx, SpawnCtx, WaveCore, random_between, random_inset};

/// Switchback steering: flip the horizontal heading at every stop
pub fn zigzag(body: &mut Body, before: Kinematics) {
    body.vel = Vec2::new(-before.velocity.x, before.velocity.y);
    body.acc = Vec2::new(-before.acceleration.x, before.acceleration.y);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamStyle {
    /// From the top edge, re-aiming at the player on every stop
    Stutter,
    /// From alternating side edges, zig-zagging down the field
    Switchback,
}

#[derive(Debug, Clone)]
pub struct SegmentedStream {
    pub style: StreamStyle,
    pub interval: f32,
    pub segment_len: f32,
    pub pause_time: f32,
    pub speed: f32,
    next_shot: f32,
    from_left: bool,
}

impl SegmentedStream {
    pub const STUTTER_INTERVAL: f32 = 0.1;
    pub const STUTTER_SEGMENT: f32 = 120.0;
    pub const STUTTER_PAUSE: f32 = 0.35;
    pub const STUTTER_SPEED: f32 = 220.0;

    pub const SWITCHBACK_INTERVAL: f32 = 0.1;
    pub const SWITCHBACK_SEGMENT: f32 = 90.0;
    pub const SWITCHBACK_PAUSE: f32 = 0.15;
    pub const SWITCHBACK_VEL: Vec2 = Vec2::new(180.0, 120.0);

    pub fn stutter(_ctx: &mut BuildCtx) -> Self {
        Self {
            style: StreamStyle::Stutter,
            interval: Self::STUTTER_INTERVAL,
            segment_len: Self::STUTTER_SEGMENT,
            pause_time: Self::STUTTER_PAUSE,
            speed: Self::STUTTER_SPEED,
            next_shot: 0.0,
            from_left: true,
        }
    }

    pub fn switchback(ctx: &mut BuildCtx) -> Self {
        Self {
            style: StreamStyle::Switchback,
            interval: Self::SWITCHBACK_INTERVAL,
            segment_len: Self::SWITCHBACK_SEGMENT,
            pause_time: Self::SWITCHBACK_PAUSE,
            speed: Self::SWITCHBACK_VEL.length(),
            next_shot: 0.0,
            from_left: ctx.rng.random_bool(0.5),
        }
    }

    pub fn update(&mut self, core: &mut WaveCore, ctx: &mut SpawnCtx) {
        self.next_shot -= ctx.dt;
        if self.next_shot > 0.0 || !core.can_spawn() {
            return;
        }
        self.next_shot += self.interval;

        let (w, h) = (ctx.field.x, ctx.field.y);
        let projectile = match self.style {
            StreamStyle::Stutter => {
                let pos = Vec2::new(random_inset(ctx.rng, w, 20.0), 5.0);
                let vel = (ctx.player_pos - pos).try_normalize().unwrap_or(Vec2::Y) * self.speed;
                let path = SegmentPath::new(self.segment_len, self.pause_time, Steering::AimAt(Target::Player));
                Projectile::segmented(core.number, core.color, pos, vel, path)
            }
            StreamStyle::Switchback => {
                let y = random_between(ctx.rng, 20.0f32.min(h / 4.0), h / 3.0);
                let (pos, vel) = if self.from_left {
                    (Vec2::new(5.0, y), Self::SWITCHBACK_VEL)
                } else {
                    (Vec2::new(w - 5.0, y), Vec2::new(-Self::SWITCHBACK_VEL.x, Self::SWITCHBACK_VEL.y))
                };
                self.from_left = !self.from_left;
                let path = SegmentPath::new(self.segment_len, self.pause_time, Steering::Custom(zigzag));
                Projectile::segmented(core.number, core.color, pos, vel, path)
            }
        };
        core.spawn(ctx.arena, projectile);
    }
}
