use log::{debug, info};
use rand::Rng;
use std::{
    fmt::Display,
    time::{Duration, Instant},
};

use crate::{
    config::{Block, BlockKind, TaskConfig},
    input::Pointer,
    trial::{Frame, Phase, Trial, TrialResult},
    util::TargetRing,
};

/// The participant (or the window) asked to stop. Nothing after the last
/// recorded trial is kept.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Aborted;

impl Display for Aborted {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result { write!(f, "Session aborted by quit request.") }
}

pub trait Clock {
    /// Time since the clock was created.
    fn now(&self) -> Duration;
    fn wait(&mut self, duration: Duration);
}

pub struct SystemClock {
    origin: Instant,
}

impl SystemClock {
    pub fn new() -> Self { Self { origin: Instant::now() } }
}

impl Clock for SystemClock {
    fn now(&self) -> Duration { self.origin.elapsed() }

    fn wait(&mut self, duration: Duration) { std::thread::sleep(duration) }
}

/// Where the session sends its output and learns about quit requests.
pub trait Surface {
    fn quit_requested(&mut self) -> bool;
    fn present(&mut self, frame: &Frame);
    fn block_started(&mut self, _index: usize, _block: &Block) {}
    fn trial_recorded(&mut self, _result: &TrialResult) {}
}

/// Every trial of a completed session, in the order they ran.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Report {
    pub trials: Vec<TrialResult>,
}

impl Report {
    /// Errors grouped by block kind, kinds in first-appearance order. Each
    /// point is `(trial number, error)`; timed-out trials have no error.
    pub fn series(&self) -> Vec<(BlockKind, Vec<(usize, Option<f32>)>)> {
        let mut series: Vec<(BlockKind, Vec<(usize, Option<f32>)>)> = Vec::new();
        for trial in &self.trials {
            let point = (trial.number, trial.error);
            match series.iter_mut().find(|(kind, _)| *kind == trial.block) {
                Some((_, points)) => points.push(point),
                None => series.push((trial.block, vec![point])),
            }
        }
        series
    }

    pub fn missed(&self) -> usize { self.trials.iter().filter(|t| t.error.is_none()).count() }
}

pub struct Session<'a, R: Rng> {
    config: &'a TaskConfig,
    ring: TargetRing,
    rng: R,
    log: Vec<TrialResult>,
}

impl<'a, R: Rng> Session<'a, R> {
    pub fn new(config: &'a TaskConfig, rng: R) -> Self { Self { config, ring: config.ring(), rng, log: Vec::new() } }

    /// Runs every block in order. Returns early with [`Aborted`] as soon as a
    /// quit request is seen.
    #[profiling::function]
    pub fn run<S: Surface, C: Clock>(
        mut self,
        surface: &mut S,
        pointer: &mut Pointer,
        clock: &mut C,
    ) -> Result<Report, Aborted> {
        let config = self.config;
        for (index, block) in config.blocks.iter().enumerate() {
            info!("Block {} ({}, tag {}): {} trials", index + 1, block.kind, block.kind.tag(), block.trials);
            surface.block_started(index, block);

            for number in 1..=block.trials {
                let (result, frame) = self.run_trial(block, number, surface, pointer, clock)?;
                match result.error {
                    Some(error) => info!("{} trial {}: target {}, error {:.1}°", block.kind, number, result.target, error),
                    None => info!("{} trial {}: target {}, no movement", block.kind, number, result.target),
                }
                surface.trial_recorded(&result);
                self.log.push(result);
                self.hold(&frame, config.timing.inter_trial_delay(), surface, clock)?;
            }
        }
        info!("Session complete: {} trials", self.log.len());
        Ok(Report { trials: self.log })
    }

    #[profiling::function]
    fn run_trial<S: Surface, C: Clock>(
        &mut self,
        block: &Block,
        number: usize,
        surface: &mut S,
        pointer: &mut Pointer,
        clock: &mut C,
    ) -> Result<(TrialResult, Frame), Aborted> {
        let config = self.config;
        let target = self.rng.random_range(0..self.ring.len());
        let mut trial = Trial::new(block, number, target, &self.ring, clock.now());
        debug!("{} trial {}: target {}", block.kind, number, target);

        surface.present(&trial.frame());
        let result = loop {
            if surface.quit_requested() {
                return Err(Aborted);
            }
            let sample = pointer.sample();
            let before = trial.phase();
            let phase = trial.step(sample, clock.now(), &config.timing);
            if let (Phase::AwaitingMovement, Phase::Moving { since }) = (before, phase) {
                debug!("movement onset at {:.3}s", since.as_secs_f32());
            }
            surface.present(&trial.frame());
            if let Some(result) = trial.record(&self.ring, config.wrap_error) {
                break result;
            }
            clock.wait(config.timing.poll_interval());
        };
        Ok((result, trial.frame()))
    }

    /// Keeps `frame` on screen for `duration`, still polling for quit.
    fn hold<S: Surface, C: Clock>(
        &self,
        frame: &Frame,
        duration: Duration,
        surface: &mut S,
        clock: &mut C,
    ) -> Result<(), Aborted> {
        let until = clock.now() + duration;
        loop {
            if surface.quit_requested() {
                return Err(Aborted);
            }
            let now = clock.now();
            if now >= until {
                return Ok(());
            }
            surface.present(frame);
            clock.wait((until - now).min(self.config.timing.poll_interval()));
        }
    }
}
