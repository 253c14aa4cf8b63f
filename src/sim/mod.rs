//! Deterministic simulation module
//!
//! All gameplay logic lives here. This module must be pure and deterministic:
//! - Fixed spawn tick for wave logic
//! - Seeded RNG only
//! - Stable iteration order (by entity ID)
//! - No rendering or platform dependencies

pub mod arena;
pub mod beam;
pub mod body;
pub mod color;
pub mod dilation;
pub mod patterns;
pub mod projectile;
pub mod sequencer;
pub mod state;
pub mod tick;
pub mod wave;

pub use arena::Arena;
pub use beam::{Anchor, Beam, BeamSegment, Marker, clip_ray};
pub use body::{AxisMask, Body, Kinematics};
pub use color::Color;
pub use dilation::TimeDilation;
pub use projectile::{Motion, Projectile, ProjectileId, SegmentPath, Steering, Target, TargetView};
pub use sequencer::{Sequencer, SequencerPhase, WaveEvent};
pub use state::{GameEvent, Phase, Player, RunState, RunSummary, Simulation, Subscreen, derive_phase};
pub use tick::{FrameInput, frame};
pub use wave::{Wave, WaveCore, WaveKind};
