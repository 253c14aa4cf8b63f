//! Visual-only sub-entities: turret markers and locking beams
//!
//! Neither takes part in culling or collision. Waves create them, steer them
//! every spawn tick and remove them in `end()`. The core only produces beam
//! geometry; drawing is the renderer's business.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::color::Color;

/// Static anchor showing where a turret or spawn point sits
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Marker {
    pub id: u32,
    pub wave: u32,
    pub pos: Vec2,
    /// Facing, radians (screen space, 0 = +x)
    pub rot: f32,
    pub color: Color,
}

/// Where a beam endpoint sits
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Anchor {
    Point(Vec2),
    Player,
    Marker(u32),
}

/// Line from `source` toward `target`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Beam {
    pub id: u32,
    pub wave: u32,
    pub source: Anchor,
    pub target: Anchor,
    pub color: Color,
    /// A ray keeps going past its target until it leaves the field
    pub ray: bool,
}

/// Resolved beam geometry for the renderer
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BeamSegment {
    pub start: Vec2,
    pub end: Vec2,
    pub color: Color,
}

/// Extend the ray `source → toward` to the edge of the `[0, field]` rectangle.
///
/// Solves along the dominant axis of the direction first; if that lands
/// beyond the other axis' extent the other boundary is hit first and is used
/// instead. A zero direction yields `source`.
pub fn clip_ray(source: Vec2, toward: Vec2, field: Vec2) -> Vec2 {
    let dir = toward - source;
    if dir.x == 0.0 && dir.y == 0.0 {
        return source;
    }

    let solve_x = |d: Vec2| {
        let bound = if d.x > 0.0 { field.x } else { 0.0 };
        source + d * ((bound - source.x) / d.x)
    };
    let solve_y = |d: Vec2| {
        let bound = if d.y > 0.0 { field.y } else { 0.0 };
        source + d * ((bound - source.y) / d.y)
    };

    if dir.x.abs() >= dir.y.abs() {
        let hit = solve_x(dir);
        if dir.y != 0.0 && (hit.y < 0.0 || hit.y > field.y) {
            solve_y(dir)
        } else {
            hit
        }
    } else {
        let hit = solve_y(dir);
        if dir.x != 0.0 && (hit.x < 0.0 || hit.x > field.x) {
            solve_x(dir)
        } else {
            hit
        }
    }
}

impl Beam {
    /// Resolve anchors into a drawable segment. Returns `None` when an anchor
    /// refers to a marker that no longer exists.
    pub fn segment(
        &self,
        player_pos: Vec2,
        markers: &[Marker],
        field: Vec2,
    ) -> Option<BeamSegment> {
        let resolve = |anchor: Anchor| match anchor {
            Anchor::Point(p) => Some(p),
            Anchor::Player => Some(player_pos),
            Anchor::Marker(id) => markers.iter().find(|m| m.id == id).map(|m| m.pos),
        };

        let start = resolve(self.source)?;
        let target = resolve(self.target)?;
        let end = if self.ray {
            clip_ray(start, target, field)
        } else {
            target
        };

        Some(BeamSegment {
            start,
            end,
            color: self.color,
        })
    }
}
