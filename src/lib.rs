//! CurtainFire - bullet-hell wave engine
//!
//! Core modules:
//! - `sim`: Deterministic simulation (entity motion, projectiles, waves, run state, frame driver)
//! - `settings`: Tuning knobs and difficulty presets
//! - `highscores`: Top-10 score table consumed at game over

pub mod highscores;
pub mod settings;
pub mod sim;

pub use highscores::HighScores;
pub use settings::{DifficultyPreset, Settings};

use glam::Vec2;

/// Game configuration constants
pub mod consts {
    /// Logical play-field size
    pub const FIELD_WIDTH: f32 = 800.0;
    pub const FIELD_HEIGHT: f32 = 800.0;

    /// Fixed spawn tick driving wave logic (25 ms)
    pub const SPAWN_TICK: f32 = 0.025;
    /// Target render cadence (60 Hz)
    pub const RENDER_DT: f32 = 1.0 / 60.0;
    /// Longest frame we integrate in one go (avoids tunnelling after a stall)
    pub const MAX_FRAME_DT: f32 = 0.1;
    /// Maximum spawn ticks per frame to prevent spiral of death
    pub const MAX_SPAWN_TICKS: u32 = 8;

    /// Seconds of countdown before gameplay starts
    pub const COUNTDOWN_SECONDS: f32 = 3.0;
}

/// Unit vector for a screen-space heading.
///
/// Headings are measured from the +y axis (straight down the screen) toward +x,
/// so `heading_vector(0.0)` is `(0, 1)`.
#[inline]
pub fn heading_vector(angle: f32) -> Vec2 {
    Vec2::new(angle.sin(), angle.cos())
}

/// Heading of a displacement, inverse of [`heading_vector`]
#[inline]
pub fn heading_angle(v: Vec2) -> f32 {
    v.x.atan2(v.y)
}
