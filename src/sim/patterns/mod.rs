//! Per-pattern wave state
//!
//! Each pattern builds from a [`BuildCtx`](super::wave::BuildCtx) and runs
//! once per spawn tick against a [`SpawnCtx`](super::wave::SpawnCtx). All
//! bullets go through `WaveCore::spawn`.

pub mod cluster;
pub mod grid;
pub mod patterned;
pub mod segmented;
pub mod spread;
pub mod turret;

pub use cluster::{HomingTracer, Mirv};
pub use grid::Gridlock;
pub use patterned::PatternedSpread;
pub use segmented::SegmentedStream;
pub use spread::{FixedSpread, HomingBurst, TargetedSpread};
pub use turret::{TrackingSpread, Turret};
