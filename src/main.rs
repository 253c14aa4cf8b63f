//! CurtainFire headless runner
//!
//! Drives the simulation at a fixed 60 Hz with the autopilot at the controls
//! and logs wave progress. Stands in for a windowed frame loop.

use std::path::PathBuf;

use anyhow::{Result, anyhow};
use clap::Parser;

use curtain_fire::consts::RENDER_DT;
use curtain_fire::highscores::now_unix_s;
use curtain_fire::sim::{FrameInput, GameEvent, Phase, Simulation, frame};
use curtain_fire::{DifficultyPreset, HighScores, Settings};

#[derive(Parser, Debug)]
#[command(name = "curtain-fire")]
#[command(about = "Run CurtainFire headless with the autopilot dodging")]
struct Args {
    /// Run seed; defaults to the current time
    #[arg(long)]
    seed: Option<u64>,
    /// Simulated seconds before giving up on the run
    #[arg(long, default_value_t = 120.0)]
    seconds: f32,
    /// Settings file (JSON); defaults are used when missing
    #[arg(long)]
    settings: Option<PathBuf>,
    /// Difficulty preset applied on top of the settings (easy, normal, hard)
    #[arg(long)]
    difficulty: Option<String>,
    /// High-score table (JSON)
    #[arg(long, default_value = "highscores.json")]
    scores: PathBuf,
    /// Name recorded if the run makes the table
    #[arg(long, default_value = "AUTO")]
    name: String,
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    let mut settings = match &args.settings {
        Some(path) => Settings::load_or_default(path),
        None => Settings::default(),
    };
    if let Some(raw) = &args.difficulty {
        let preset = DifficultyPreset::from_str(raw).ok_or_else(|| anyhow!("unknown difficulty '{raw}'"))?;
        settings.apply_preset(preset);
    }
    let high_scores = HighScores::load_from(&args.scores)?;
    let seed = args.seed.unwrap_or_else(now_unix_s);
    if high_scores.is_empty() {
        log::info!("No high scores recorded yet");
    } else if let Some(best) = high_scores.top_score() {
        log::info!("Score to beat: {best}");
    }

    log::info!("CurtainFire (headless) starting, difficulty {}", settings.difficulty.as_str());
    let mut sim = Simulation::new(settings, seed, high_scores);
    let input = FrameInput {
        autopilot: true,
        ..Default::default()
    };

    let max_frames = (args.seconds.max(0.0) / RENDER_DT).ceil() as u64;
    let mut game_over = false;
    for _ in 0..max_frames {
        frame(&mut sim, &input, RENDER_DT);
        for event in sim.drain_events() {
            match event {
                GameEvent::WaveStarted { number, kind, size } => {
                    log::info!("Wave {number}: {} ({size} bullets)", kind.name());
                }
                GameEvent::PlayerHit { lives_left } => log::info!("Hit! {lives_left} lives left"),
                GameEvent::Detonation { pos } => log::debug!("Detonation at ({:.0}, {:.0})", pos.x, pos.y),
                GameEvent::GameOver { rank, .. } => {
                    if let Some(rank) = rank {
                        log::info!("Run would place #{rank} on the table");
                    }
                    game_over = true;
                }
                _ => {}
            }
        }
        if game_over {
            break;
        }
    }

    if !game_over {
        log::info!("Time limit reached, ending run");
        sim.end_run();
    }

    if sim.phase() == Phase::HighScoreEntry {
        if let Some(rank) = sim.submit_high_score(&args.name) {
            println!("New high score! Rank #{rank}");
        }
        sim.high_scores.save_to(&args.scores)?;
    }

    let summary = sim.last_run().ok_or_else(|| anyhow!("run never started"))?;
    println!(
        "seed {seed}: score {}, survived {:.1}s, reached wave {}",
        summary.score, summary.time, summary.waves
    );
    Ok(())
}
