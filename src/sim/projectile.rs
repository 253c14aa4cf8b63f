//! Projectile motion policies
//!
//! Every bullet is a [`Body`] plus a closed set of motion policies. The policy
//! runs first each tick (re-aiming, pausing, steering) and then the shared
//! integrator advances the body.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::body::{AxisMask, Body, Kinematics};
use super::color::Color;

pub type ProjectileId = u32;

/// Drag applied to homing bullets whose target is gone (acc = -k * vel)
pub const HOMING_DRAG: f32 = 0.1;

/// Remaining segment length treated as "arrived"
pub const SEGMENT_EPSILON: f32 = 1e-4;

/// Something a projectile can chase
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Target {
    Player,
    Point(Vec2),
}

/// What projectiles may see of their targets during one tick
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TargetView {
    pub player_pos: Vec2,
    /// Player is dead or respawning; homing suspends
    pub player_excluded: bool,
}

impl TargetView {
    /// Current position of `target`, or `None` when it may not be chased
    pub fn resolve(&self, target: Target) -> Option<Vec2> {
        match target {
            Target::Player if self.player_excluded => None,
            Target::Player => Some(self.player_pos),
            Target::Point(p) => Some(p),
        }
    }
}

/// Custom steering hook: gets the body at the segment boundary and the
/// kinematics it had before the tick that finished the segment
pub type SteerFn = fn(&mut Body, Kinematics);

/// Path change applied at each segment boundary
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub enum Steering {
    /// Carry on along the same line
    Keep,
    /// Rotate the velocity by a fixed angle (radians, screen space)
    TurnBy(f32),
    /// Re-aim at a target, keeping the current speed
    AimAt(Target),
    #[serde(skip)]
    Custom(SteerFn),
}

impl Steering {
    fn apply(&self, body: &mut Body, before: Kinematics, targets: &TargetView) {
        match *self {
            Steering::Keep => {}
            Steering::TurnBy(angle) => {
                body.vel = Vec2::from_angle(angle).rotate(body.vel);
                body.acc = Vec2::from_angle(angle).rotate(body.acc);
            }
            Steering::AimAt(target) => {
                if let Some(goal) = targets.resolve(target) {
                    let speed = before.velocity.length();
                    let dir = (goal - body.pos).normalize_or_zero();
                    if dir != Vec2::ZERO {
                        body.vel = dir * speed;
                    }
                }
            }
            Steering::Custom(steer) => steer(body, before),
        }
    }
}

/// Travel/pause cycle for segmented bullets
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SegmentPath {
    /// Arc length of each travel segment
    pub segment_len: f32,
    /// Seconds spent frozen between segments
    pub pause_time: f32,
    pub steering: Steering,
    remaining: f32,
    pause_left: f32,
    resume_vel: Vec2,
    resume_acc: Vec2,
}

impl SegmentPath {
    pub fn new(segment_len: f32, pause_time: f32, steering: Steering) -> Self {
        Self {
            segment_len: segment_len.max(SEGMENT_EPSILON * 10.0),
            pause_time: pause_time.max(0.0),
            steering,
            remaining: segment_len,
            pause_left: 0.0,
            resume_vel: Vec2::ZERO,
            resume_acc: Vec2::ZERO,
        }
    }

    pub fn is_paused(&self) -> bool {
        self.pause_left > 0.0
    }

    /// Arc length left in the current segment
    pub fn remaining(&self) -> f32 {
        self.remaining
    }

    fn update(&mut self, body: &mut Body, dt: f32, targets: &TargetView) {
        if self.is_paused() {
            self.pause_left -= dt;
            if self.pause_left <= 0.0 {
                self.resume(body);
            }
            return;
        }

        let before = body.snapshot();
        body.integrate(dt);
        // Distance actually covered, so accelerating bullets stay honest
        self.remaining -= body.pos.distance(before.position);

        if self.remaining <= SEGMENT_EPSILON {
            self.steering.apply(body, before, targets);
            self.resume_vel = body.vel;
            self.resume_acc = body.acc;

            if self.pause_time > 0.0 {
                body.vel = Vec2::ZERO;
                body.acc = Vec2::ZERO;
                self.pause_left = self.pause_time;
            } else {
                self.resume(body);
            }
        }
    }

    fn resume(&mut self, body: &mut Body) {
        self.pause_left = 0.0;
        body.vel = self.resume_vel;
        body.acc = self.resume_acc;
        self.remaining = self.segment_len;
    }
}

/// Motion policy of a projectile
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Motion {
    /// Fixed velocity/acceleration
    ConstantPath,
    /// Acceleration re-aimed at the target every tick
    Homing { target: Target, magnitude: f32 },
    /// Travel a segment, pause, maybe change course, repeat
    Segmented(SegmentPath),
}

/// Two-color flicker on a fixed period (tracer rounds); purely visual
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Blink {
    pub alt_color: Color,
    pub period: f32,
    timer: f32,
    showing_alt: bool,
}

impl Blink {
    pub fn new(alt_color: Color, period: f32) -> Self {
        Self {
            alt_color,
            period,
            timer: 0.0,
            showing_alt: false,
        }
    }

    pub fn showing_alt(&self) -> bool {
        self.showing_alt
    }

    fn update(&mut self, dt: f32) {
        if self.period <= 0.0 {
            return;
        }
        self.timer += dt;
        while self.timer >= self.period {
            self.timer -= self.period;
            self.showing_alt = !self.showing_alt;
        }
    }
}

/// A bullet owned by exactly one wave
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Projectile {
    /// Assigned by the arena on spawn
    pub id: ProjectileId,
    /// Number of the wave that spawned this bullet
    pub wave: u32,
    pub body: Body,
    pub color: Color,
    pub motion: Motion,
    pub blink: Option<Blink>,
}

impl Projectile {
    /// Straight-line bullet
    pub fn constant(wave: u32, color: Color, pos: Vec2, vel: Vec2, acc: Vec2) -> Self {
        Self {
            id: 0,
            wave,
            body: Body::launched(pos, vel, acc),
            color,
            motion: Motion::ConstantPath,
            blink: None,
        }
    }

    /// Bullet that keeps accelerating toward `target`
    pub fn homing(
        wave: u32,
        color: Color,
        pos: Vec2,
        vel: Vec2,
        target: Target,
        magnitude: f32,
    ) -> Self {
        Self {
            motion: Motion::Homing { target, magnitude },
            ..Self::constant(wave, color, pos, vel, Vec2::ZERO)
        }
    }

    /// Bullet that moves in segments separated by pauses
    pub fn segmented(wave: u32, color: Color, pos: Vec2, vel: Vec2, path: SegmentPath) -> Self {
        Self {
            motion: Motion::Segmented(path),
            ..Self::constant(wave, color, pos, vel, Vec2::ZERO)
        }
    }

    /// Straight tracer that flickers between `color` and `alt_color`
    pub fn tracer(
        wave: u32,
        color: Color,
        alt_color: Color,
        pos: Vec2,
        vel: Vec2,
        period: f32,
    ) -> Self {
        Self::constant(wave, color, pos, vel, Vec2::ZERO).with_blink(alt_color, period)
    }

    pub fn with_blink(mut self, alt_color: Color, period: f32) -> Self {
        self.blink = Some(Blink::new(alt_color, period));
        self
    }

    pub fn is_homing(&self) -> bool {
        matches!(self.motion, Motion::Homing { .. })
    }

    pub fn is_tracer(&self) -> bool {
        self.blink.is_some()
    }

    pub fn pos(&self) -> Vec2 {
        self.body.pos
    }

    /// Color the renderer should use this frame
    pub fn display_color(&self) -> Color {
        match self.blink {
            Some(blink) if blink.showing_alt() => blink.alt_color,
            _ => self.color,
        }
    }

    /// Apply the motion policy, then integrate
    pub fn update(&mut self, dt: f32, targets: &TargetView) {
        if let Some(blink) = self.blink.as_mut() {
            blink.update(dt);
        }

        match &mut self.motion {
            Motion::ConstantPath => self.body.integrate(dt),
            Motion::Homing { target, magnitude } => {
                match targets.resolve(*target) {
                    Some(goal) => self.body.accelerate_toward(goal, *magnitude, AxisMask::Both),
                    None => self.body.acc = self.body.vel * -HOMING_DRAG,
                }
                self.body.integrate(dt);
            }
            Motion::Segmented(path) => path.update(&mut self.body, dt, targets),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn view(player: Vec2) -> TargetView {
        TargetView {
            player_pos: player,
            player_excluded: false,
        }
    }

    #[test]
    fn test_constant_path_moves() {
        let mut p = Projectile::constant(1, Color::WHITE, Vec2::ZERO, Vec2::new(100.0, 0.0), Vec2::ZERO);
        p.update(0.5, &view(Vec2::ZERO));
        assert_eq!(p.pos(), Vec2::new(50.0, 0.0));
    }

    #[test]
    fn test_homing_aims_at_player() {
        let mut p = Projectile::homing(1, Color::WHITE, Vec2::new(100.0, 100.0), Vec2::ZERO, Target::Player, 400.0);
        p.update(0.01, &view(Vec2::new(100.0, 300.0)));
        assert!((p.body.acc - Vec2::new(0.0, 400.0)).length() < 1e-3);
    }

    #[test]
    fn test_homing_drifts_when_player_excluded() {
        let mut p = Projectile::homing(
            1,
            Color::WHITE,
            Vec2::new(100.0, 100.0),
            Vec2::new(50.0, -20.0),
            Target::Player,
            400.0,
        );
        let targets = TargetView {
            player_pos: Vec2::new(400.0, 400.0),
            player_excluded: true,
        };
        p.update(0.0, &targets);
        assert!((p.body.acc - Vec2::new(-5.0, 2.0)).length() < 1e-5);

        // Coasts to a stop rather than turning around
        let start_speed = p.body.speed();
        for _ in 0..100 {
            p.update(0.1, &targets);
        }
        assert!(p.body.speed() < start_speed);
        assert!(p.body.vel.x > 0.0);
    }

    #[test]
    fn test_homing_point_target_ignores_exclusion() {
        let mut p = Projectile::homing(1, Color::WHITE, Vec2::ZERO, Vec2::ZERO, Target::Point(Vec2::new(0.0, 10.0)), 5.0);
        let targets = TargetView {
            player_pos: Vec2::ZERO,
            player_excluded: true,
        };
        p.update(0.0, &targets);
        assert!((p.body.acc - Vec2::new(0.0, 5.0)).length() < 1e-6);
    }

    #[test]
    fn test_segmented_pauses_after_distance() {
        let path = SegmentPath::new(50.0, 0.25, Steering::Keep);
        let mut p = Projectile::segmented(1, Color::WHITE, Vec2::new(100.0, 100.0), Vec2::new(100.0, 0.0), path);
        let targets = view(Vec2::ZERO);

        // 0.375s: still travelling
        for _ in 0..3 {
            p.update(0.125, &targets);
        }
        let Motion::Segmented(path) = &p.motion else { unreachable!() };
        assert!(!path.is_paused());

        // 0.5s: exactly 50 units covered
        p.update(0.125, &targets);
        let Motion::Segmented(path) = &p.motion else { unreachable!() };
        assert!(path.is_paused());
        assert_eq!(p.pos(), Vec2::new(150.0, 100.0));
        assert_eq!(p.body.vel, Vec2::ZERO);

        // Frozen for the pause, then moving again with the old velocity
        p.update(0.125, &targets);
        assert_eq!(p.pos(), Vec2::new(150.0, 100.0));
        p.update(0.125, &targets);
        let Motion::Segmented(path) = &p.motion else { unreachable!() };
        assert!(!path.is_paused());
        assert_eq!(path.remaining(), 50.0);
        assert_eq!(p.body.vel, Vec2::new(100.0, 0.0));

        p.update(0.125, &targets);
        assert_eq!(p.pos(), Vec2::new(162.5, 100.0));
    }

    #[test]
    fn test_segmented_counts_actual_distance() {
        // Accelerating bullet covers more ground per tick than speed * dt
        let path = SegmentPath::new(30.0, 1.0, Steering::Keep);
        let mut p = Projectile::segmented(1, Color::WHITE, Vec2::ZERO, Vec2::new(10.0, 0.0), path);
        p.body.acc = Vec2::new(100.0, 0.0);
        let targets = view(Vec2::ZERO);
        let mut ticks = 0;
        while !matches!(&p.motion, Motion::Segmented(s) if s.is_paused()) {
            p.update(0.1, &targets);
            ticks += 1;
            assert!(ticks < 100);
        }
        assert!(p.pos().x >= 30.0 - SEGMENT_EPSILON);
        assert!(p.pos().x < 30.0 + 10.0);
    }

    #[test]
    fn test_segmented_aim_at_redirects() {
        let path = SegmentPath::new(10.0, 0.1, Steering::AimAt(Target::Player));
        let mut p = Projectile::segmented(1, Color::WHITE, Vec2::ZERO, Vec2::new(100.0, 0.0), path);
        let targets = view(Vec2::new(10.0, 100.0));
        p.update(0.1, &targets);
        p.update(0.1, &targets);
        // Resumed toward the player straight below, same speed
        assert!((p.body.vel - Vec2::new(0.0, 100.0)).length() < 1e-3);
    }

    #[test]
    fn test_segmented_custom_steering_gets_snapshot() {
        fn mirror(body: &mut Body, before: Kinematics) {
            body.vel = Vec2::new(-before.velocity.x, before.velocity.y);
        }
        let path = SegmentPath::new(10.0, 0.0, Steering::Custom(mirror));
        let mut p = Projectile::segmented(1, Color::WHITE, Vec2::ZERO, Vec2::new(100.0, 20.0), path);
        p.update(0.1, &view(Vec2::ZERO));
        assert_eq!(p.body.vel, Vec2::new(-100.0, 20.0));
    }

    #[test]
    fn test_tracer_flips_on_period() {
        let mut p = Projectile::tracer(1, Color::RED, Color::WHITE, Vec2::ZERO, Vec2::ZERO, 0.1);
        let targets = view(Vec2::ZERO);
        assert_eq!(p.display_color(), Color::RED);
        p.update(0.125, &targets);
        assert_eq!(p.display_color(), Color::WHITE);
        p.update(0.125, &targets);
        assert_eq!(p.display_color(), Color::RED);
    }
}
