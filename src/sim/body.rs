//! Kinematic body shared by the player, projectiles and markers
//!
//! Semi-implicit Euler: velocity is advanced before position so a body under
//! constant acceleration stays stable at any frame rate we care about.

use glam::Vec2;
use serde::{Deserialize, Serialize};

/// Which acceleration components `accelerate_toward` keeps
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum AxisMask {
    #[default]
    Both,
    /// Keep only the horizontal component
    XOnly,
    /// Keep only the vertical component
    YOnly,
}

/// Immutable kinematic snapshot handed to steering strategies
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Kinematics {
    pub position: Vec2,
    pub velocity: Vec2,
    pub acceleration: Vec2,
}

/// Position/velocity/acceleration integrator
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Body {
    pub pos: Vec2,
    /// Rotation in radians
    pub rot: f32,
    pub vel: Vec2,
    pub acc: Vec2,
    /// Angular velocity (rad/s)
    pub rvel: f32,
    /// Angular acceleration (rad/s²)
    pub racc: f32,
}

impl Body {
    pub fn new(pos: Vec2, rot: f32) -> Self {
        Self {
            pos,
            rot,
            ..Default::default()
        }
    }

    /// Body launched with a fixed velocity and acceleration
    pub fn launched(pos: Vec2, vel: Vec2, acc: Vec2) -> Self {
        Self {
            pos,
            vel,
            acc,
            ..Default::default()
        }
    }

    /// Advance one step of semi-implicit Euler
    pub fn integrate(&mut self, dt: f32) {
        self.vel += self.acc * dt;
        self.pos += self.vel * dt;

        self.rvel += self.racc * dt;
        self.rot += self.rvel * dt;
    }

    /// Point the acceleration at `target` with the given magnitude.
    ///
    /// A body sitting exactly on its target has no direction to go; the
    /// acceleration is zeroed instead of producing NaNs.
    pub fn accelerate_toward(&mut self, target: Vec2, magnitude: f32, axis: AxisMask) {
        let disp = target - self.pos;
        let dist = disp.length();
        if !(dist.is_finite() && dist > 0.0) {
            self.acc = Vec2::ZERO;
            return;
        }

        let mut acc = disp / dist * magnitude;
        match axis {
            AxisMask::Both => {}
            AxisMask::XOnly => acc.y = 0.0,
            AxisMask::YOnly => acc.x = 0.0,
        }
        self.acc = acc;
    }

    /// Heading of the velocity in screen space (radians, 0 = +x), for sprites
    /// that rotate to face where they are going
    pub fn heading(&self) -> f32 {
        self.vel.y.atan2(self.vel.x)
    }

    pub fn speed(&self) -> f32 {
        self.vel.length()
    }

    pub fn snapshot(&self) -> Kinematics {
        Kinematics {
            position: self.pos,
            velocity: self.vel,
            acceleration: self.acc,
        }
    }

    /// True if the body is inside the `[0, size]` rectangle (edges inclusive)
    pub fn in_bounds(&self, size: Vec2) -> bool {
        self.pos.x >= 0.0 && self.pos.x <= size.x && self.pos.y >= 0.0 && self.pos.y <= size.y
    }
}
