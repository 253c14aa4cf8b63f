//! Per-frame driver
//!
//! Frames arrive at a variable rate; waves step on a fixed 25 ms spawn tick
//! fed from an accumulator so pattern timing stays deterministic.

use glam::Vec2;

use super::state::{GameEvent, Phase, Simulation, Steer};
use super::wave::SpawnCtx;
use crate::consts::{MAX_FRAME_DT, MAX_SPAWN_TICKS, SPAWN_TICK};

/// Threat radius the autopilot reacts to
const AUTOPILOT_RADIUS: f32 = 90.0;
/// Seconds of bullet travel the autopilot looks ahead
const AUTOPILOT_LOOKAHEAD: f32 = 0.15;
/// Below this push the autopilot leaves an axis alone
const AUTOPILOT_DEAD_ZONE: f32 = 0.05;
/// Distance from a wall where the autopilot starts backing off
const AUTOPILOT_WALL: f32 = 60.0;

/// Input commands for a single frame
#[derive(Debug, Clone, Default)]
pub struct FrameInput {
    pub left: bool,
    pub right: bool,
    pub up: bool,
    pub down: bool,
    /// Slow, precise movement
    pub focus: bool,
    /// Hold to slow time while charge lasts
    pub dilate: bool,
    /// Start a run from the title screen
    pub start: bool,
    /// Pause toggle
    pub pause: bool,
    /// Demo mode - the autopilot dodges for the player
    pub autopilot: bool,
}

impl FrameInput {
    fn steer(&self) -> Steer {
        Steer {
            left: self.left,
            right: self.right,
            up: self.up,
            down: self.down,
            focus: self.focus,
        }
    }
}

/// Advance the simulation by one frame of `dt` real seconds
pub fn frame(sim: &mut Simulation, input: &FrameInput, dt: f32) {
    let dt = if dt.is_finite() { dt.clamp(0.0, MAX_FRAME_DT) } else { 0.0 };

    let mut input = input.clone();
    if input.autopilot {
        autopilot(sim, &mut input);
    }
    let input = &input;

    if input.pause {
        sim.toggle_pause();
    }
    if input.start && sim.phase() == Phase::Title {
        sim.start_run();
    }

    let phase = sim.phase();
    if matches!(phase, Phase::Title | Phase::Paused | Phase::HighScoreEntry) {
        return;
    }

    // Dilation slows bullets and waves; the player and run clocks stay real
    let scale = sim.run.dilation.update(input.dilate, phase == Phase::Gameplay, dt);
    let sim_dt = dt * scale;

    sim.run.elapsed += dt;
    if phase == Phase::Respawn {
        sim.run.respawn_timer = (sim.run.respawn_timer - dt).max(0.0);
    }

    if !sim.player.alive && sim.run.respawn_timer < sim.settings.respawn_reveal {
        let pos = sim.respawn_point();
        sim.player.respawn_at(pos);
        log::debug!("Player respawned at ({:.0}, {:.0})", pos.x, pos.y);
        sim.events.push(GameEvent::PlayerRespawned { pos });
    }

    if sim.player.alive {
        sim.player.steer(input.steer());
        sim.player.update(dt, sim.settings.field());
    }

    let targets = sim.target_view();
    sim.arena.update(sim_dt, &targets);
    let culled = sim.arena.cull_out_of_bounds(sim.settings.field());
    // Re-derive: the countdown may have just run out
    let phase = sim.phase();
    if phase == Phase::Gameplay {
        sim.run.change_score(culled as i64);
    }

    if phase == Phase::Gameplay && check_player_hit(sim) {
        return;
    }

    // A hit this frame starts the respawn and holds the waves
    if sim.phase() == Phase::Gameplay {
        run_spawn_ticks(sim, sim_dt);
    }

    sim.arena.normalize_order();
}

/// Kill the player if a bullet touches them; returns true if the run ended
fn check_player_hit(sim: &mut Simulation) -> bool {
    if !sim.player.alive {
        return false;
    }
    let pos = sim.player.pos();
    let radius = sim.settings.hit_radius;
    let Some(hit) = sim
        .arena
        .projectiles
        .iter()
        .find(|p| p.pos().distance_squared(pos) <= radius * radius)
        .map(|p| p.id)
    else {
        return false;
    };

    sim.arena.kill(hit);
    sim.player.alive = false;
    let out_of_lives = sim.run.register_hit(sim.settings.respawn_time);
    log::info!("Player hit, {} lives left", sim.run.lives.max(0));
    sim.events.push(GameEvent::PlayerHit {
        lives_left: sim.run.lives.max(0),
    });

    if out_of_lives {
        sim.end_run();
    }
    out_of_lives
}

/// Step the sequencer on the fixed spawn tick
fn run_spawn_ticks(sim: &mut Simulation, sim_dt: f32) {
    sim.spawn_accumulator += sim_dt;
    let mut ticks = 0;
    while sim.spawn_accumulator >= SPAWN_TICK && ticks < MAX_SPAWN_TICKS {
        let mut ctx = SpawnCtx {
            arena: &mut sim.arena,
            rng: &mut sim.rng,
            player_pos: sim.player.body.pos,
            field: sim.settings.field(),
            dt: SPAWN_TICK,
            score: 0,
            detonations: Vec::new(),
        };
        let wave_events = sim.sequencer.update(&mut ctx);
        let score = ctx.score;
        let detonations = ctx.detonations;

        sim.run.change_score(score);
        sim.events
            .extend(detonations.into_iter().map(|pos| GameEvent::Detonation { pos }));
        for event in wave_events {
            let event = GameEvent::from(event);
            if let GameEvent::WaveStarted { number, .. } = event {
                sim.run.wave = number;
            }
            sim.events.push(event);
        }

        sim.spawn_accumulator -= SPAWN_TICK;
        ticks += 1;
    }
    // Drop backlog we refused to simulate
    sim.spawn_accumulator = sim.spawn_accumulator.min(SPAWN_TICK);
}

/// Demo-mode player: starts runs and dodges nearby bullets
fn autopilot(sim: &Simulation, input: &mut FrameInput) {
    match sim.phase() {
        Phase::Title => {
            input.start = true;
            return;
        }
        Phase::StartCountdown | Phase::Gameplay | Phase::Respawn => {}
        Phase::Paused | Phase::HighScoreEntry => return,
    }

    let pos = sim.player.pos();
    let field = sim.field();
    let mut push = Vec2::ZERO;
    let mut nearest = f32::INFINITY;

    for projectile in &sim.arena.projectiles {
        nearest = nearest.min(projectile.pos().distance(pos));
        // Dodge where the bullet is about to be, not where it is
        let ahead = projectile.pos() + projectile.body.vel * AUTOPILOT_LOOKAHEAD;
        let away = pos - ahead;
        let dist = away.length();
        if dist > 0.0 && dist < AUTOPILOT_RADIUS {
            push += away / dist * (1.0 - dist / AUTOPILOT_RADIUS);
        }
    }

    // Back off from walls so we don't get pinned
    let wall = |low: f32, high: f32| {
        (AUTOPILOT_WALL - low).max(0.0) / AUTOPILOT_WALL - (AUTOPILOT_WALL - high).max(0.0) / AUTOPILOT_WALL
    };
    push += Vec2::new(wall(pos.x, field.x - pos.x), wall(pos.y, field.y - pos.y));

    // Drift home toward the lower middle when nothing is close
    let home = Vec2::new(field.x * 0.5, field.y * 0.75);
    push += (home - pos) / field.max_element();

    input.left = push.x < -AUTOPILOT_DEAD_ZONE;
    input.right = push.x > AUTOPILOT_DEAD_ZONE;
    input.up = push.y < -AUTOPILOT_DEAD_ZONE;
    input.down = push.y > AUTOPILOT_DEAD_ZONE;
    input.focus = nearest < AUTOPILOT_RADIUS / 2.0;
    input.dilate = nearest < AUTOPILOT_RADIUS / 3.0;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consts::{COUNTDOWN_SECONDS, RENDER_DT};
    use crate::highscores::HighScores;
    use crate::settings::Settings;
    use crate::sim::color::Color;
    use crate::sim::projectile::{Projectile, ProjectileId};
    use crate::sim::wave::{Pattern, WaveKind};
    use std::collections::HashSet;

    fn sim() -> Simulation {
        Simulation::new(Settings::default(), 12345, HighScores::new())
    }

    /// Started run with the countdown already over
    fn in_gameplay() -> Simulation {
        let mut sim = sim();
        sim.start_run();
        sim.run.elapsed = COUNTDOWN_SECONDS;
        sim.drain_events();
        sim
    }

    fn still_bullet(pos: Vec2) -> Projectile {
        Projectile::constant(99, Color::WHITE, pos, Vec2::ZERO, Vec2::ZERO)
    }

    #[test]
    fn test_title_waits_for_start() {
        let mut sim = sim();
        frame(&mut sim, &FrameInput::default(), RENDER_DT);
        assert_eq!(sim.phase(), Phase::Title);
        assert_eq!(sim.run.elapsed, 0.0);

        let start = FrameInput {
            start: true,
            ..Default::default()
        };
        frame(&mut sim, &start, RENDER_DT);
        assert_eq!(sim.phase(), Phase::StartCountdown);
        assert!(sim.run.elapsed > 0.0);
    }

    #[test]
    fn test_countdown_holds_waves() {
        let mut sim = sim();
        sim.start_run();
        for _ in 0..170 {
            frame(&mut sim, &FrameInput::default(), RENDER_DT);
        }
        assert_eq!(sim.phase(), Phase::StartCountdown);
        assert!(sim.arena.projectiles.is_empty());
        assert_eq!(sim.sequencer.current().map(|w| w.core.elapsed()), Some(0.0));

        for _ in 0..30 {
            frame(&mut sim, &FrameInput::default(), RENDER_DT);
        }
        assert_eq!(sim.phase(), Phase::Gameplay);
        assert!(sim.sequencer.current().map(|w| w.core.elapsed()).unwrap_or(0.0) > 0.0);
    }

    #[test]
    fn test_pause_freezes_everything() {
        let mut sim = in_gameplay();
        sim.arena.spawn(Projectile::constant(
            99,
            Color::WHITE,
            Vec2::new(100.0, 100.0),
            Vec2::new(60.0, 0.0),
            Vec2::ZERO,
        ));
        let pause = FrameInput {
            pause: true,
            ..Default::default()
        };
        frame(&mut sim, &pause, RENDER_DT);
        assert_eq!(sim.phase(), Phase::Paused);
        let elapsed = sim.run.elapsed;
        let bullets: Vec<Vec2> = sim.arena.projectiles.iter().map(|p| p.pos()).collect();

        for _ in 0..30 {
            frame(&mut sim, &FrameInput::default(), RENDER_DT);
        }
        assert_eq!(sim.run.elapsed, elapsed);
        let after: Vec<Vec2> = sim.arena.projectiles.iter().map(|p| p.pos()).collect();
        assert_eq!(after, bullets);

        frame(&mut sim, &pause, RENDER_DT);
        assert_eq!(sim.phase(), Phase::Gameplay);
    }

    #[test]
    fn test_hit_costs_a_life_and_respawns() {
        let mut sim = in_gameplay();
        let pos = sim.player.pos();
        sim.arena.spawn(still_bullet(pos + Vec2::new(3.0, 0.0)));

        frame(&mut sim, &FrameInput::default(), RENDER_DT);
        assert!(!sim.player.alive);
        assert_eq!(sim.run.lives, 2);
        assert_eq!(sim.phase(), Phase::Respawn);
        let events = sim.drain_events();
        assert!(events.contains(&GameEvent::PlayerHit { lives_left: 2 }));

        // Hidden for the first half second, back at the start after that
        for _ in 0..25 {
            frame(&mut sim, &FrameInput::default(), RENDER_DT);
        }
        assert!(!sim.player.alive);
        for _ in 0..10 {
            frame(&mut sim, &FrameInput::default(), RENDER_DT);
        }
        assert!(sim.player.alive);
        assert_eq!(sim.player.pos(), sim.player.start_pos);
        assert_eq!(sim.phase(), Phase::Respawn);
    }

    #[test]
    fn test_no_hits_while_respawning() {
        let mut sim = in_gameplay();
        sim.run.respawn_timer = 2.0;
        let pos = sim.player.pos();
        sim.arena.spawn(still_bullet(pos));
        frame(&mut sim, &FrameInput::default(), RENDER_DT);
        assert!(sim.player.alive);
        assert_eq!(sim.run.lives, 3);
    }

    #[test]
    fn test_last_life_ends_run() {
        let mut sim = in_gameplay();
        sim.run.lives = 0;
        sim.run.change_score(40);
        let pos = sim.player.pos();
        sim.arena.spawn(still_bullet(pos));

        frame(&mut sim, &FrameInput::default(), RENDER_DT);
        assert_eq!(sim.phase(), Phase::HighScoreEntry);
        let over = sim
            .drain_events()
            .into_iter()
            .find(|e| matches!(e, GameEvent::GameOver { .. }));
        assert!(matches!(over, Some(GameEvent::GameOver { rank: Some(_), .. })));
        assert_eq!(sim.last_run().map(|r| r.score), Some(40));
    }

    #[test]
    fn test_culled_bullets_score_in_gameplay() {
        let mut game = in_gameplay();
        game.arena.spawn(still_bullet(Vec2::new(-5.0, 100.0)));
        game.arena.spawn(still_bullet(Vec2::new(100.0, 900.0)));
        let before = game.run.score;
        frame(&mut game, &FrameInput::default(), RENDER_DT);
        assert!(game.run.score >= before + 2);

        let mut countdown = sim();
        countdown.start_run();
        countdown.arena.spawn(still_bullet(Vec2::new(-5.0, 100.0)));
        frame(&mut countdown, &FrameInput::default(), RENDER_DT);
        assert!(countdown.arena.projectiles.is_empty());
        assert_eq!(countdown.run.score, 0);
    }

    #[test]
    fn test_new_bullets_wait_a_frame_before_moving() {
        // An opening Firework fires every bullet from one fixed point
        let mut sim = (0..500u64)
            .map(|seed| {
                let mut sim = Simulation::new(Settings::default(), seed, HighScores::new());
                sim.start_run();
                sim
            })
            .find(|sim| sim.sequencer.current().map(|w| w.kind()) == Some(WaveKind::Firework))
            .unwrap();
        sim.run.elapsed = COUNTDOWN_SECONDS;
        let source = match sim.sequencer.current().map(|w| &w.pattern) {
            Some(Pattern::HomingBurst(burst)) => burst.source,
            _ => panic!("opening wave is not a Firework"),
        };

        let mut fresh: Vec<ProjectileId> = Vec::new();
        for _ in 0..10 {
            let before: HashSet<ProjectileId> = sim.arena.projectiles.iter().map(|p| p.id).collect();
            frame(&mut sim, &FrameInput::default(), RENDER_DT);
            fresh = sim
                .arena
                .projectiles
                .iter()
                .filter(|p| !before.contains(&p.id))
                .map(|p| p.id)
                .collect();
            if !fresh.is_empty() {
                break;
            }
        }
        assert!(!fresh.is_empty());
        for id in &fresh {
            assert_eq!(sim.arena.get(*id).map(|p| p.pos()), Some(source));
        }

        frame(&mut sim, &FrameInput::default(), RENDER_DT);
        for id in &fresh {
            let pos = sim.arena.get(*id).map(|p| p.pos()).unwrap();
            assert_ne!(pos, source);
        }
    }

    #[test]
    fn test_dilation_slows_bullets_not_player() {
        let mut sim = in_gameplay();
        let id = sim.arena.spawn(Projectile::constant(
            99,
            Color::WHITE,
            Vec2::new(100.0, 100.0),
            Vec2::new(100.0, 0.0),
            Vec2::ZERO,
        ));
        let start = sim.player.pos();
        let input = FrameInput {
            dilate: true,
            right: true,
            ..Default::default()
        };
        frame(&mut sim, &input, 0.1);

        let bullet = sim.arena.get(id).map(|p| p.pos().x).unwrap();
        assert!((bullet - 105.0).abs() < 1e-3);
        assert!((sim.player.pos().x - (start.x + 30.0)).abs() < 1e-3);
        assert!(sim.run.dilation.charge() < sim.run.dilation.capacity);
    }

    #[test]
    fn test_long_frames_are_clamped() {
        let mut sim = in_gameplay();
        let elapsed = sim.run.elapsed;
        frame(&mut sim, &FrameInput::default(), 5.0);
        assert!((sim.run.elapsed - elapsed - MAX_FRAME_DT).abs() < 1e-5);
        assert!(sim.spawn_accumulator <= SPAWN_TICK);

        frame(&mut sim, &FrameInput::default(), f32::NAN);
        assert!(sim.run.elapsed.is_finite());
    }

    #[test]
    fn test_autopilot_starts_and_dodges() {
        let mut sim = sim();
        let auto = FrameInput {
            autopilot: true,
            ..Default::default()
        };
        frame(&mut sim, &auto, RENDER_DT);
        assert_eq!(sim.phase(), Phase::StartCountdown);

        // A bullet just left of the player pushes it right
        let pos = sim.player.pos();
        sim.arena.spawn(still_bullet(pos - Vec2::new(20.0, 0.0)));
        let mut steer = auto.clone();
        autopilot(&sim, &mut steer);
        assert!(steer.right);
        assert!(!steer.left);
        assert!(steer.focus);
    }

    #[test]
    fn test_same_seed_same_run() {
        let run = || {
            let mut sim = sim();
            let auto = FrameInput {
                autopilot: true,
                ..Default::default()
            };
            for _ in 0..600 {
                frame(&mut sim, &auto, RENDER_DT);
            }
            (sim.run.score, sim.player.pos(), sim.arena.projectiles.len())
        };
        assert_eq!(run(), run());
    }
}
