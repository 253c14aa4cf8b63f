//! Run state and the simulation context
//!
//! The run phase is never stored: it is derived on demand from the
//! subscreen, running flag, elapsed time and respawn timer. Everything a
//! frame touches lives in one [`Simulation`].

use glam::Vec2;
use rand::SeedableRng;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::arena::Arena;
use super::beam::BeamSegment;
use super::body::Body;
use super::dilation::TimeDilation;
use super::projectile::TargetView;
use super::sequencer::{Sequencer, WaveEvent};
use super::wave::{SpawnCtx, WaveKind, random_inset};
use crate::consts::{COUNTDOWN_SECONDS, SPAWN_TICK};
use crate::highscores::{HighScores, now_unix_s};
use crate::settings::Settings;

/// Derived phase of the run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Phase {
    Title,
    StartCountdown,
    Gameplay,
    Respawn,
    Paused,
    HighScoreEntry,
}

/// Overlay that takes precedence over the run phase
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Subscreen {
    Paused,
    HighScoreEntry,
}

/// Phase for the given inputs; pure
pub fn derive_phase(subscreen: Option<Subscreen>, running: bool, elapsed: f32, respawn_timer: f32) -> Phase {
    match subscreen {
        Some(Subscreen::Paused) => Phase::Paused,
        Some(Subscreen::HighScoreEntry) => Phase::HighScoreEntry,
        None if !running => Phase::Title,
        None if elapsed < COUNTDOWN_SECONDS => Phase::StartCountdown,
        None if respawn_timer > 0.0 => Phase::Respawn,
        None => Phase::Gameplay,
    }
}

/// What the score table needs from a finished run
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RunSummary {
    pub score: u64,
    /// Seconds survived after the countdown
    pub time: f32,
    pub waves: u32,
}

/// Things the renderer and audio may react to
#[derive(Debug, Clone, PartialEq)]
pub enum GameEvent {
    RunStarted { seed: u64 },
    WaveStarted { number: u32, kind: WaveKind, size: u32 },
    WaveCompleted { number: u32, kind: WaveKind },
    PlayerHit { lives_left: i32 },
    PlayerRespawned { pos: Vec2 },
    Detonation { pos: Vec2 },
    GameOver { summary: RunSummary, rank: Option<usize> },
    HighScoreRecorded { rank: Option<usize> },
}

impl From<WaveEvent> for GameEvent {
    fn from(event: WaveEvent) -> Self {
        match event {
            WaveEvent::Started { number, kind, size } => GameEvent::WaveStarted { number, kind, size },
            WaveEvent::Completed { number, kind } => GameEvent::WaveCompleted { number, kind },
        }
    }
}

/// Lives, score and timers of the current run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunState {
    pub subscreen: Option<Subscreen>,
    pub running: bool,
    /// Seconds since the run started, countdown included
    pub elapsed: f32,
    pub respawn_timer: f32,
    pub lives: i32,
    pub score: i64,
    pub wave: u32,
    /// Elapsed time at game over
    pub end_time: Option<f32>,
    pub dilation: TimeDilation,
    start_lives: i32,
}

impl RunState {
    pub fn new(settings: &Settings) -> Self {
        Self {
            subscreen: None,
            running: false,
            elapsed: 0.0,
            respawn_timer: 0.0,
            lives: settings.lives,
            score: 0,
            wave: 0,
            end_time: None,
            dilation: TimeDilation::new(settings),
            start_lives: settings.lives,
        }
    }

    pub fn phase(&self) -> Phase {
        derive_phase(self.subscreen, self.running, self.elapsed, self.respawn_timer)
    }

    pub fn reset(&mut self) {
        self.subscreen = None;
        self.running = true;
        self.elapsed = 0.0;
        self.respawn_timer = 0.0;
        self.lives = self.start_lives;
        self.score = 0;
        self.wave = 0;
        self.end_time = None;
        self.dilation.reset();
    }

    pub fn game_over(&mut self) {
        self.running = false;
        self.end_time = Some(self.elapsed);
    }

    pub fn change_score(&mut self, delta: i64) {
        self.score += delta;
    }

    /// Take a hit; returns true when that was the last life
    pub fn register_hit(&mut self, respawn_time: f32) -> bool {
        self.lives -= 1;
        self.respawn_timer = respawn_time;
        self.lives < 0
    }

    pub fn summary(&self) -> RunSummary {
        let end = self.end_time.unwrap_or(self.elapsed);
        RunSummary {
            score: self.score.max(0) as u64,
            time: (end - COUNTDOWN_SECONDS).max(0.0),
            waves: self.wave,
        }
    }
}

/// Player-held direction and speed keys for one frame
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Steer {
    pub left: bool,
    pub right: bool,
    pub up: bool,
    pub down: bool,
    pub focus: bool,
}

/// The player ship
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Player {
    pub body: Body,
    pub start_pos: Vec2,
    pub start_rot: f32,
    pub alive: bool,
    pub speed: f32,
    pub focus_speed: f32,
    pub margin: f32,
}

impl Player {
    pub fn new(settings: &Settings) -> Self {
        let start_pos = settings.field() / 2.0;
        Self {
            body: Body::new(start_pos, 0.0),
            start_pos,
            start_rot: 0.0,
            alive: true,
            speed: settings.player_speed,
            focus_speed: settings.focus_speed,
            margin: settings.player_margin,
        }
    }

    pub fn pos(&self) -> Vec2 {
        self.body.pos
    }

    /// Back to the start position, at rest
    pub fn reset(&mut self) {
        self.respawn_at(self.start_pos);
        self.body.rot = self.start_rot;
    }

    pub fn respawn_at(&mut self, pos: Vec2) {
        self.body = Body::new(pos, self.start_rot);
        self.alive = true;
    }

    /// Set velocity from held keys; opposite keys cancel
    pub fn steer(&mut self, keys: Steer) {
        let speed = if keys.focus { self.focus_speed } else { self.speed };
        let axis = |neg: bool, pos: bool| match (neg, pos) {
            (true, false) => -speed,
            (false, true) => speed,
            _ => 0.0,
        };
        self.body.vel = Vec2::new(axis(keys.left, keys.right), axis(keys.up, keys.down));
        self.body.acc = Vec2::ZERO;
    }

    /// Integrate and clamp to the field interior
    pub fn update(&mut self, dt: f32, field: Vec2) {
        self.body.integrate(dt);
        let lo = Vec2::splat(self.margin.min(field.min_element() / 2.0));
        self.body.pos = self.body.pos.clamp(lo, field - lo);
    }
}

/// Complete simulation context
#[derive(Debug, Clone)]
pub struct Simulation {
    pub settings: Settings,
    /// Run seed for reproducibility
    pub seed: u64,
    pub(crate) rng: Pcg32,
    pub run: RunState,
    pub player: Player,
    pub arena: Arena,
    pub sequencer: Sequencer,
    pub(crate) spawn_accumulator: f32,
    pub high_scores: HighScores,
    pub events: Vec<GameEvent>,
    last_run: Option<RunSummary>,
}

impl Simulation {
    pub fn new(settings: Settings, seed: u64, high_scores: HighScores) -> Self {
        Self {
            rng: Pcg32::seed_from_u64(seed),
            run: RunState::new(&settings),
            player: Player::new(&settings),
            arena: Arena::new(),
            sequencer: Sequencer::new(&settings),
            spawn_accumulator: 0.0,
            high_scores,
            events: Vec::new(),
            last_run: None,
            settings,
            seed,
        }
    }

    pub fn phase(&self) -> Phase {
        self.run.phase()
    }

    pub fn field(&self) -> Vec2 {
        self.settings.field()
    }

    /// Summary of the most recent finished run
    pub fn last_run(&self) -> Option<RunSummary> {
        self.last_run
    }

    /// What homing bullets may chase this frame
    pub fn target_view(&self) -> TargetView {
        TargetView {
            player_pos: self.player.pos(),
            player_excluded: !self.player.alive || self.phase() == Phase::Respawn,
        }
    }

    /// Start a new run (title screen "start")
    pub fn start_run(&mut self) {
        self.player.reset();
        self.run.reset();
        self.spawn_accumulator = 0.0;

        self.arena.clear();
        let mut ctx = SpawnCtx {
            arena: &mut self.arena,
            rng: &mut self.rng,
            player_pos: self.player.start_pos,
            field: self.settings.field(),
            dt: SPAWN_TICK,
            score: 0,
            detonations: Vec::new(),
        };
        let first = self.sequencer.reset(&mut ctx);
        if let WaveEvent::Started { number, .. } = first {
            self.run.wave = number;
        }

        log::info!("Run started with seed {}", self.seed);
        self.events.push(GameEvent::RunStarted { seed: self.seed });
        self.events.push(first.into());
    }

    /// Toggle the pause overlay; only while a run is in progress
    pub fn toggle_pause(&mut self) {
        match self.run.subscreen {
            Some(Subscreen::Paused) => self.run.subscreen = None,
            None if self.run.running => self.run.subscreen = Some(Subscreen::Paused),
            _ => {}
        }
    }

    /// Where the player comes back after a hit
    pub(crate) fn respawn_point(&mut self) -> Vec2 {
        if !self.settings.respawn_randomized {
            return self.player.start_pos;
        }
        let field = self.settings.field();
        let inset = self.player.margin * 4.0;
        Vec2::new(
            random_inset(&mut self.rng, field.x, inset),
            random_inset(&mut self.rng, field.y, inset),
        )
    }

    /// End the run and open name entry if the score made the table
    pub fn end_run(&mut self) {
        if !self.run.running {
            return;
        }
        let mut ctx = SpawnCtx {
            arena: &mut self.arena,
            rng: &mut self.rng,
            player_pos: self.player.body.pos,
            field: self.settings.field(),
            dt: SPAWN_TICK,
            score: 0,
            detonations: Vec::new(),
        };
        self.sequencer.stop(&mut ctx);
        self.run.game_over();
        let summary = self.run.summary();
        self.last_run = Some(summary);

        let rank = self.high_scores.potential_rank(summary.score);
        if rank.is_some() {
            self.run.subscreen = Some(Subscreen::HighScoreEntry);
        }
        log::info!(
            "Game over: score {}, {:.3}s, {} waves, rank {:?}",
            summary.score,
            summary.time,
            summary.waves,
            rank
        );
        self.events.push(GameEvent::GameOver { summary, rank });
    }

    /// Name entered on the high-score screen; returns the rank achieved
    pub fn submit_high_score(&mut self, name: &str) -> Option<usize> {
        if self.run.subscreen != Some(Subscreen::HighScoreEntry) {
            return None;
        }
        self.run.subscreen = None;
        let rank = self
            .last_run
            .and_then(|summary| self.high_scores.add_score(name, &summary, now_unix_s()));
        self.events.push(GameEvent::HighScoreRecorded { rank });
        rank
    }

    /// Drawable beam geometry for this frame
    pub fn beam_segments(&self) -> Vec<BeamSegment> {
        self.arena.beam_segments(self.player.pos(), self.settings.field())
    }

    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_derive_phase_precedence() {
        assert_eq!(derive_phase(Some(Subscreen::Paused), true, 10.0, 1.0), Phase::Paused);
        assert_eq!(derive_phase(Some(Subscreen::HighScoreEntry), false, 0.0, 0.0), Phase::HighScoreEntry);
        assert_eq!(derive_phase(None, false, 10.0, 1.0), Phase::Title);
        assert_eq!(derive_phase(None, true, 2.9, 1.0), Phase::StartCountdown);
        assert_eq!(derive_phase(None, true, 3.0, 1.0), Phase::Respawn);
        assert_eq!(derive_phase(None, true, 3.0, 0.0), Phase::Gameplay);
    }

    #[test]
    fn test_run_reset_and_game_over() {
        let mut run = RunState::new(&Settings::default());
        assert_eq!(run.phase(), Phase::Title);
        run.reset();
        run.change_score(12);
        run.elapsed = 10.0;
        assert!(!run.register_hit(3.0));
        assert_eq!(run.lives, 2);
        assert_eq!(run.phase(), Phase::Respawn);

        run.game_over();
        assert_eq!(run.phase(), Phase::Title);
        assert_eq!(run.summary().time, 7.0);
        assert_eq!(run.summary().score, 12);

        run.reset();
        assert_eq!(run.score, 0);
        assert_eq!(run.lives, 3);
        assert_eq!(run.end_time, None);
        assert_eq!(run.phase(), Phase::StartCountdown);
    }

    #[test]
    fn test_last_life_ends_run() {
        let mut run = RunState::new(&Settings::default());
        run.reset();
        assert!(!run.register_hit(3.0));
        assert!(!run.register_hit(3.0));
        assert!(!run.register_hit(3.0));
        assert_eq!(run.lives, 0);
        assert!(run.register_hit(3.0));
    }

    #[test]
    fn test_player_steer_and_clamp() {
        let settings = Settings::default();
        let mut player = Player::new(&settings);
        player.steer(Steer {
            left: true,
            right: true,
            down: true,
            ..Default::default()
        });
        assert_eq!(player.body.vel, Vec2::new(0.0, 300.0));

        player.steer(Steer {
            up: true,
            focus: true,
            ..Default::default()
        });
        assert_eq!(player.body.vel, Vec2::new(0.0, -150.0));

        for _ in 0..100 {
            player.update(0.1, settings.field());
        }
        assert_eq!(player.pos().y, 10.0);
    }

    #[test]
    fn test_start_run_builds_first_wave() {
        let mut sim = Simulation::new(Settings::default(), 42, HighScores::new());
        sim.arena.spawn(crate::sim::projectile::Projectile::constant(
            0,
            crate::sim::color::Color::WHITE,
            Vec2::new(10.0, 10.0),
            Vec2::ZERO,
            Vec2::ZERO,
        ));
        sim.start_run();
        assert!(sim.arena.projectiles.is_empty());
        assert_eq!(sim.phase(), Phase::StartCountdown);
        assert_eq!(sim.run.wave, 1);
        assert!(sim.sequencer.current().is_some());
        let events = sim.drain_events();
        assert!(matches!(events[0], GameEvent::RunStarted { seed: 42 }));
        assert!(matches!(events[1], GameEvent::WaveStarted { number: 1, .. }));
    }

    #[test]
    fn test_high_score_entry_flow() {
        let mut sim = Simulation::new(Settings::default(), 1, HighScores::new());
        sim.start_run();
        sim.run.elapsed = 20.0;
        sim.run.change_score(50);
        sim.end_run();
        assert_eq!(sim.phase(), Phase::HighScoreEntry);
        let over = sim.drain_events().into_iter().find(|e| matches!(e, GameEvent::GameOver { .. }));
        assert!(matches!(over, Some(GameEvent::GameOver { rank: Some(1), .. })));

        assert_eq!(sim.submit_high_score("ACE"), Some(1));
        assert_eq!(sim.phase(), Phase::Title);
        assert_eq!(sim.high_scores.entries[0].score, 50);
        assert_eq!(sim.high_scores.entries[0].waves, 1);
        assert_eq!(sim.submit_high_score("AGAIN"), None);
    }

    #[test]
    fn test_zero_score_skips_entry() {
        let mut sim = Simulation::new(Settings::default(), 1, HighScores::new());
        sim.start_run();
        sim.end_run();
        assert_eq!(sim.phase(), Phase::Title);
        let over = sim.drain_events().into_iter().find(|e| matches!(e, GameEvent::GameOver { .. }));
        assert!(matches!(over, Some(GameEvent::GameOver { rank: None, .. })));
    }

    #[test]
    fn test_game_over_reports_table_position() {
        let mut scores = HighScores::new();
        for score in [300, 100] {
            let summary = RunSummary { score, time: 10.0, waves: 2 };
            scores.add_score("OLD", &summary, 0);
        }
        let mut sim = Simulation::new(Settings::default(), 1, scores);
        sim.start_run();
        sim.run.elapsed = 5.0;
        sim.run.change_score(200);
        sim.end_run();

        let over = sim.drain_events().into_iter().find(|e| matches!(e, GameEvent::GameOver { .. }));
        assert!(matches!(over, Some(GameEvent::GameOver { rank: Some(2), .. })));
        assert_eq!(sim.submit_high_score("MID"), Some(2));
        assert_eq!(sim.high_scores.top_score(), Some(300));
    }
}
