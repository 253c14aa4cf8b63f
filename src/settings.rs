//! Tuning knobs and difficulty presets
//!
//! Persisted as JSON next to the high-score table.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::consts::{FIELD_HEIGHT, FIELD_WIDTH};

/// Difficulty preset levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum DifficultyPreset {
    Easy,
    #[default]
    Normal,
    Hard,
}

impl DifficultyPreset {
    pub fn as_str(&self) -> &'static str {
        match self {
            DifficultyPreset::Easy => "Easy",
            DifficultyPreset::Normal => "Normal",
            DifficultyPreset::Hard => "Hard",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "easy" => Some(DifficultyPreset::Easy),
            "normal" | "norm" => Some(DifficultyPreset::Normal),
            "hard" => Some(DifficultyPreset::Hard),
            _ => None,
        }
    }

    /// Starting wave size
    pub fn base_wave_size(&self) -> f32 {
        match self {
            DifficultyPreset::Easy => 50.0,
            DifficultyPreset::Normal => 75.0,
            DifficultyPreset::Hard => 100.0,
        }
    }

    /// Wave size growth per wave
    pub fn wave_size_step(&self) -> f32 {
        match self {
            DifficultyPreset::Easy => 10.0,
            DifficultyPreset::Normal => 15.0,
            DifficultyPreset::Hard => 20.0,
        }
    }

    pub fn lives(&self) -> i32 {
        match self {
            DifficultyPreset::Easy => 5,
            DifficultyPreset::Normal => 3,
            DifficultyPreset::Hard => 2,
        }
    }
}

/// Simulation settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub difficulty: DifficultyPreset,

    // === Play field ===
    pub field_width: f32,
    pub field_height: f32,

    // === Player ===
    /// Distance the player keeps from the field edges
    pub player_margin: f32,
    pub player_speed: f32,
    /// Speed while the focus (slow) key is held
    pub focus_speed: f32,
    /// Player and bullet contact distance
    pub hit_radius: f32,
    pub lives: i32,
    /// Seconds between a hit and the player regaining control
    pub respawn_time: f32,
    /// Player reappears once the respawn timer drops below this
    pub respawn_reveal: f32,
    /// Respawn at a random interior point instead of the start position
    pub respawn_randomized: bool,

    // === Waves ===
    pub base_wave_size: f32,
    pub wave_size_step: f32,
    pub wave_size_sigma: f32,
    /// Seconds the first wave may run; `None` disables budgets
    pub base_time_budget: Option<f32>,
    pub time_budget_step: f32,
    pub time_budget_floor: f32,
    /// Seconds the completion predicate must hold before the next wave (at least 0.5)
    pub completion_debounce: f32,

    // === Time dilation ===
    pub dilation_capacity: f32,
    pub dilation_drain: f32,
    pub dilation_recover: f32,
    pub dilation_scale: f32,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            difficulty: DifficultyPreset::Normal,

            field_width: FIELD_WIDTH,
            field_height: FIELD_HEIGHT,

            player_margin: 10.0,
            player_speed: 300.0,
            focus_speed: 150.0,
            hit_radius: 6.0,
            lives: 3,
            respawn_time: 3.0,
            respawn_reveal: 2.5,
            respawn_randomized: false,

            base_wave_size: 75.0,
            wave_size_step: 15.0,
            wave_size_sigma: 7.5,
            base_time_budget: Some(30.0),
            time_budget_step: 1.0,
            time_budget_floor: 15.0,
            completion_debounce: 0.5,

            dilation_capacity: 2.0,
            dilation_drain: 1.0,
            dilation_recover: 0.5,
            dilation_scale: 0.5,
        }
    }
}

impl Settings {
    /// Create settings from a difficulty preset (applies preset defaults)
    pub fn from_preset(preset: DifficultyPreset) -> Self {
        let mut settings = Self::default();
        settings.apply_preset(preset);
        settings
    }

    /// Apply a difficulty preset (updates wave growth and lives)
    pub fn apply_preset(&mut self, preset: DifficultyPreset) {
        self.difficulty = preset;
        self.base_wave_size = preset.base_wave_size();
        self.wave_size_step = preset.wave_size_step();
        self.wave_size_sigma = preset.wave_size_step() / 2.0;
        self.lives = preset.lives();
    }

    pub fn field(&self) -> Vec2 {
        Vec2::new(self.field_width, self.field_height)
    }

    /// Load settings from a JSON file
    pub fn load_from(path: &Path) -> Result<Self> {
        let raw = fs::read(path).with_context(|| format!("failed reading settings {}", path.display()))?;
        let settings = serde_json::from_slice(&raw)
            .with_context(|| format!("invalid settings file {}", path.display()))?;
        log::info!("Loaded settings from {}", path.display());
        Ok(settings)
    }

    /// Load settings, falling back to defaults if the file is missing or bad
    pub fn load_or_default(path: &Path) -> Self {
        match Self::load_from(path) {
            Ok(settings) => settings,
            Err(err) => {
                log::warn!("Using default settings: {err:#}");
                Self::default()
            }
        }
    }

    /// Save settings as pretty-printed JSON
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).with_context(|| format!("failed creating {}", parent.display()))?;
        }
        let encoded = serde_json::to_vec_pretty(self)?;
        fs::write(path, encoded).with_context(|| format!("failed writing {}", path.display()))?;
        log::info!("Settings saved to {}", path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_preset_parsing() {
        assert_eq!(DifficultyPreset::from_str("HARD"), Some(DifficultyPreset::Hard));
        assert_eq!(DifficultyPreset::from_str("norm"), Some(DifficultyPreset::Normal));
        assert_eq!(DifficultyPreset::from_str("nightmare"), None);
        for preset in [DifficultyPreset::Easy, DifficultyPreset::Normal, DifficultyPreset::Hard] {
            assert_eq!(DifficultyPreset::from_str(preset.as_str()), Some(preset));
        }
    }

    #[test]
    fn test_normal_preset_matches_defaults() {
        assert_eq!(Settings::from_preset(DifficultyPreset::Normal), Settings::default());
        let hard = Settings::from_preset(DifficultyPreset::Hard);
        assert_eq!(hard.lives, 2);
        assert_eq!(hard.wave_size_sigma, 10.0);
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("settings.json");
        let mut settings = Settings::from_preset(DifficultyPreset::Easy);
        settings.respawn_randomized = true;
        settings.save_to(&path).unwrap();
        assert_eq!(Settings::load_from(&path).unwrap(), settings);
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        fs::write(&path, br#"{ "lives": 9 }"#).unwrap();
        let settings = Settings::load_from(&path).unwrap();
        assert_eq!(settings.lives, 9);
        assert_eq!(settings.player_speed, 300.0);
    }

    #[test]
    fn test_bad_file_falls_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        fs::write(&path, b"not json").unwrap();
        assert!(Settings::load_from(&path).is_err());
        assert_eq!(Settings::load_or_default(&path), Settings::default());
        assert_eq!(Settings::load_or_default(&dir.path().join("missing.json")), Settings::default());
    }
}
