//! Global entity collections
//!
//! Projectiles live in one arena used for bounds and collision checks. Each
//! carries the number of the wave that spawned it, so a wave's live set is a
//! view over the arena: removing a projectile here removes it from its wave
//! as well.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::beam::{Anchor, Beam, BeamSegment, Marker};
use super::color::Color;
use super::projectile::{Projectile, ProjectileId, TargetView};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Arena {
    /// Live projectiles (sorted by id for determinism)
    pub projectiles: Vec<Projectile>,
    pub markers: Vec<Marker>,
    pub beams: Vec<Beam>,
    next_id: u32,
}

impl Arena {
    pub fn new() -> Self {
        Self {
            next_id: 1,
            ..Default::default()
        }
    }

    fn next_entity_id(&mut self) -> u32 {
        let id = self.next_id.max(1);
        self.next_id = id + 1;
        id
    }

    /// Add a projectile, assigning it a fresh id
    pub fn spawn(&mut self, mut projectile: Projectile) -> ProjectileId {
        let id = self.next_entity_id();
        projectile.id = id;
        self.projectiles.push(projectile);
        id
    }

    pub fn get(&self, id: ProjectileId) -> Option<&Projectile> {
        self.projectiles.iter().find(|p| p.id == id)
    }

    /// Remove a projectile; returns false if it was already gone
    pub fn kill(&mut self, id: ProjectileId) -> bool {
        let before = self.projectiles.len();
        self.projectiles.retain(|p| p.id != id);
        self.projectiles.len() != before
    }

    /// Number of live projectiles spawned by `wave`
    pub fn live_count(&self, wave: u32) -> usize {
        self.projectiles.iter().filter(|p| p.wave == wave).count()
    }

    /// Advance every projectile by `dt`
    pub fn update(&mut self, dt: f32, targets: &TargetView) {
        for projectile in &mut self.projectiles {
            projectile.update(dt, targets);
        }
    }

    /// Drop projectiles that left the `[0, field]` rectangle; returns how many
    pub fn cull_out_of_bounds(&mut self, field: Vec2) -> usize {
        let before = self.projectiles.len();
        self.projectiles.retain(|p| p.body.in_bounds(field));
        before - self.projectiles.len()
    }

    pub fn add_marker(&mut self, wave: u32, pos: Vec2, color: Color) -> u32 {
        let id = self.next_entity_id();
        self.markers.push(Marker {
            id,
            wave,
            pos,
            rot: 0.0,
            color,
        });
        id
    }

    pub fn marker_mut(&mut self, id: u32) -> Option<&mut Marker> {
        self.markers.iter_mut().find(|m| m.id == id)
    }

    pub fn add_beam(&mut self, wave: u32, source: Anchor, target: Anchor, color: Color, ray: bool) -> u32 {
        let id = self.next_entity_id();
        self.beams.push(Beam {
            id,
            wave,
            source,
            target,
            color,
            ray,
        });
        id
    }

    pub fn beam_mut(&mut self, id: u32) -> Option<&mut Beam> {
        self.beams.iter_mut().find(|b| b.id == id)
    }

    pub fn remove_beam(&mut self, id: u32) {
        self.beams.retain(|b| b.id != id);
    }

    /// Remove the markers and beams owned by `wave`
    pub fn clear_fixtures(&mut self, wave: u32) {
        self.markers.retain(|m| m.wave != wave);
        self.beams.retain(|b| b.wave != wave);
    }

    /// Drawable geometry for every beam
    pub fn beam_segments(&self, player_pos: Vec2, field: Vec2) -> Vec<BeamSegment> {
        self.beams
            .iter()
            .filter_map(|b| b.segment(player_pos, &self.markers, field))
            .collect()
    }

    /// Discard everything (new run)
    pub fn clear(&mut self) {
        self.projectiles.clear();
        self.markers.clear();
        self.beams.clear();
    }

    /// Ensure deterministic iteration order
    pub fn normalize_order(&mut self) {
        self.projectiles.sort_by_key(|p| p.id);
    }
}
