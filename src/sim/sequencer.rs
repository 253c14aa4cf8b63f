//! Wave sequencer
//!
//! Runs one wave at a time. Kinds come from a shuffle queue so every pattern
//! shows up once per cycle; sizes grow with gaussian jitter and time budgets
//! shrink toward a floor. A wave only hands over once its completion
//! predicate has held for the debounce window.

use rand::Rng;
use rand::seq::SliceRandom;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::wave::{BuildCtx, SpawnCtx, Wave, WaveKind};
use crate::settings::Settings;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum SequencerPhase {
    /// No run in progress
    Idle,
    Active,
    /// Completion predicate true since the given sequencer clock time
    Completing { since: f32 },
}

/// Wave transitions reported to the frame driver
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum WaveEvent {
    Started { number: u32, kind: WaveKind, size: u32 },
    Completed { number: u32, kind: WaveKind },
}

/// Sample N(mean, sigma) with the Box-Muller transform
pub fn gaussian(rng: &mut Pcg32, mean: f32, sigma: f32) -> f32 {
    let u1: f32 = 1.0 - rng.random::<f32>();
    let u2: f32 = rng.random();
    let z = (-2.0 * u1.ln()).sqrt() * (std::f32::consts::TAU * u2).cos();
    mean + sigma * z
}

#[derive(Debug, Clone)]
pub struct Sequencer {
    pub phase: SequencerPhase,
    /// Upcoming kinds; the next one is at the back
    queue: Vec<WaveKind>,
    wave_number: u32,
    base_size: f32,
    size_step: f32,
    size_sigma: f32,
    time_budget: Option<f32>,
    base_time_budget: Option<f32>,
    budget_step: f32,
    budget_floor: f32,
    debounce: f32,
    /// Seconds of spawn ticks since the run started
    clock: f32,
    initial_size: f32,
    current: Option<Wave>,
}

/// Shortest window the completion predicate must hold for
const MIN_COMPLETION_DEBOUNCE: f32 = 0.5;

impl Sequencer {
    pub fn new(settings: &Settings) -> Self {
        Self {
            phase: SequencerPhase::Idle,
            queue: Vec::new(),
            wave_number: 0,
            base_size: settings.base_wave_size,
            size_step: settings.wave_size_step,
            size_sigma: settings.wave_size_sigma.max(0.0),
            time_budget: settings.base_time_budget,
            base_time_budget: settings.base_time_budget,
            budget_step: settings.time_budget_step,
            budget_floor: settings.time_budget_floor,
            debounce: settings.completion_debounce.max(MIN_COMPLETION_DEBOUNCE),
            clock: 0.0,
            initial_size: settings.base_wave_size,
            current: None,
        }
    }

    pub fn wave_number(&self) -> u32 {
        self.wave_number
    }

    pub fn base_size(&self) -> f32 {
        self.base_size
    }

    pub fn time_budget(&self) -> Option<f32> {
        self.time_budget
    }

    pub fn current(&self) -> Option<&Wave> {
        self.current.as_ref()
    }

    /// Kind of the wave after the current one
    pub fn upcoming(&self) -> Option<WaveKind> {
        self.queue.last().copied()
    }

    /// Pop the next kind, refilling the queue with a fresh permutation
    fn next_kind(&mut self, rng: &mut Pcg32) -> WaveKind {
        if self.queue.is_empty() {
            self.refill(rng);
        }
        let kind = self.queue.pop().unwrap_or(WaveKind::Sprinkler);
        if self.queue.is_empty() {
            self.refill(rng);
        }
        kind
    }

    fn refill(&mut self, rng: &mut Pcg32) {
        let mut kinds = WaveKind::ALL.to_vec();
        kinds.shuffle(rng);
        self.queue = kinds;
    }

    fn roll_size(&self, rng: &mut Pcg32) -> u32 {
        let size = gaussian(rng, self.base_size, self.size_sigma);
        if size.is_finite() { size.max(1.0) as u32 } else { 1 }
    }

    fn start_wave(&mut self, ctx: &mut SpawnCtx) -> WaveEvent {
        let kind = self.next_kind(ctx.rng);
        let size = self.roll_size(ctx.rng);
        let mut build = BuildCtx {
            rng: &mut *ctx.rng,
            player_pos: ctx.player_pos,
            field: ctx.field,
        };
        let wave = Wave::new(self.wave_number, kind, size, self.time_budget, &mut build);
        let size = wave.core.wave_size;

        log::info!(
            "Starting wave {} ({}), size {}, budget {:?}",
            self.wave_number,
            kind.name(),
            size,
            self.time_budget
        );

        self.current = Some(wave);
        self.phase = SequencerPhase::Active;
        WaveEvent::Started {
            number: self.wave_number,
            kind,
            size,
        }
    }

    /// End any current wave without starting another
    pub fn stop(&mut self, ctx: &mut SpawnCtx) {
        if let Some(wave) = self.current.as_mut() {
            wave.end(ctx.arena);
        }
        self.current = None;
        self.phase = SequencerPhase::Idle;
    }

    /// Start a new run from wave 1
    pub fn reset(&mut self, ctx: &mut SpawnCtx) -> WaveEvent {
        self.stop(ctx);
        self.queue.clear();
        self.wave_number = 1;
        self.base_size = self.initial_size;
        self.time_budget = self.base_time_budget;
        self.clock = 0.0;
        log::info!("Starting waves");
        self.start_wave(ctx)
    }

    /// One spawn tick: drive the current wave and hand over when it is done
    pub fn update(&mut self, ctx: &mut SpawnCtx) -> Vec<WaveEvent> {
        let mut events = Vec::new();
        if self.phase == SequencerPhase::Idle {
            return events;
        }
        self.clock += ctx.dt;

        let Some(wave) = self.current.as_mut() else {
            self.phase = SequencerPhase::Idle;
            return events;
        };
        wave.update(ctx);
        let complete = wave.is_complete(ctx.arena);

        match self.phase {
            SequencerPhase::Idle => {}
            SequencerPhase::Active => {
                if complete {
                    self.phase = SequencerPhase::Completing { since: self.clock };
                }
            }
            SequencerPhase::Completing { since } => {
                if !complete {
                    self.phase = SequencerPhase::Active;
                } else if self.clock - since >= self.debounce {
                    events.push(self.advance(ctx));
                    events.push(self.start_wave(ctx));
                }
            }
        }
        events
    }

    /// Close the current wave and step difficulty
    fn advance(&mut self, ctx: &mut SpawnCtx) -> WaveEvent {
        let (number, kind) = match self.current.as_mut() {
            Some(wave) => {
                wave.end(ctx.arena);
                (wave.number(), wave.kind())
            }
            None => (self.wave_number, WaveKind::Sprinkler),
        };
        log::info!("Wave {} ({}) complete", number, kind.name());

        self.wave_number += 1;
        self.base_size += self.size_step;
        self.time_budget = self
            .time_budget
            .map(|budget| (budget - self.budget_step).max(self.budget_floor));
        WaveEvent::Completed { number, kind }
    }
}
