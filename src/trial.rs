use nalgebra::Point2;
use std::time::Duration;

use crate::{
    config::{Block, BlockKind, TimingConfig},
    input,
    util::{self, TargetRing},
};

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Phase {
    /// Cursor is (roughly) still, waiting for movement onset.
    AwaitingMovement,
    /// Movement started at `since`, the freeze window is running.
    Moving { since: Duration },
    /// Reversal point captured. `moved` is false when the trial timed out.
    Frozen { moved: bool },
    /// Result handed to the session log.
    Recorded,
}

/// What the presentation side needs to draw one tick of a trial.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Frame {
    pub block: BlockKind,
    pub trial: usize,
    pub target: usize,
    pub neighbours: [usize; 2],
    pub cursor: Point2<f32>,
    pub reversal: Option<Point2<f32>>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrialResult {
    pub block: BlockKind,
    /// 1-based, counted within the block.
    pub number: usize,
    pub target: usize,
    pub reversal: Point2<f32>,
    /// Degrees. `None` if the pointer never moved before the timeout.
    pub error: Option<f32>,
}

pub struct Trial {
    block: BlockKind,
    rotation: Option<f32>,
    number: usize,
    target: usize,
    neighbours: [usize; 2],
    center: Point2<f32>,
    started: Duration,
    previous: Point2<f32>,
    cursor: Point2<f32>,
    phase: Phase,
}

impl Trial {
    pub fn new(block: &Block, number: usize, target: usize, ring: &TargetRing, started: Duration) -> Self {
        let rotation = match block.kind {
            BlockKind::Rotated => block.rotation_degrees,
            _ => None,
        };
        Self {
            block: block.kind,
            rotation,
            number,
            target,
            neighbours: ring.neighbours(target),
            center: ring.center,
            started,
            previous: ring.center,
            cursor: ring.center,
            phase: Phase::AwaitingMovement,
        }
    }

    pub fn phase(&self) -> Phase { self.phase }

    /// Feeds one pointer sample taken at `now` and advances the phase.
    pub fn step(&mut self, sample: Point2<f32>, now: Duration, timing: &TimingConfig) -> Phase {
        match self.phase {
            Phase::AwaitingMovement => {
                self.cursor = self.feedback(sample);
                let speed = input::speed(self.previous, self.cursor);
                self.previous = self.cursor;
                if speed > timing.speed_threshold {
                    self.phase = Phase::Moving { since: now };
                } else if timing.movement_timeout().is_some_and(|limit| now.saturating_sub(self.started) > limit) {
                    self.phase = Phase::Frozen { moved: false };
                }
            }
            Phase::Moving { since } => {
                self.cursor = self.feedback(sample);
                if now.saturating_sub(since) > timing.freeze_window() {
                    self.phase = Phase::Frozen { moved: true };
                }
            }
            Phase::Frozen { .. } | Phase::Recorded => {}
        }
        self.phase
    }

    /// Finalizes a frozen trial. Returns `None` if the trial isn't frozen yet
    /// or was already recorded.
    pub fn record(&mut self, ring: &TargetRing, wrap_error: bool) -> Option<TrialResult> {
        let Phase::Frozen { moved } = self.phase else {
            return None;
        };
        self.phase = Phase::Recorded;
        Some(TrialResult {
            block: self.block,
            number: self.number,
            target: self.target,
            reversal: self.cursor,
            error: moved.then(|| ring.error(self.target, self.cursor, wrap_error)),
        })
    }

    pub fn frame(&self) -> Frame {
        let reversal = match self.phase {
            Phase::Frozen { .. } | Phase::Recorded => Some(self.cursor),
            _ => None,
        };
        Frame {
            block: self.block,
            trial: self.number,
            target: self.target,
            neighbours: self.neighbours,
            cursor: self.cursor,
            reversal,
        }
    }

    fn feedback(&self, sample: Point2<f32>) -> Point2<f32> {
        match self.rotation {
            Some(angle) => util::apply_rotation(sample, angle, self.center),
            None => sample,
        }
    }
}
