use std::fmt::Display;

use crate::{
    config::Block,
    session::Report,
    trial::{Frame, TrialResult},
    util::TargetRing,
};

pub enum UI2Task {
    /// Stops the session wherever it is. Nothing further is recorded.
    Shutdown,
    /// Begins the first block.
    Start,
}

pub struct TaskInformation {
    /// Name of the pointing device in use, or the no-device fallback.
    pub device: String,
    pub ring: TargetRing,
    pub blocks: Vec<Block>,
}

pub enum TaskFailure {
    /// The backend panicked.
    Panicked(String),
    /// The backend went away without a report.
    Disconnected,
}

impl Display for TaskFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TaskFailure::Panicked(msg) => write!(f, "The task backend crashed: {}", msg),
            TaskFailure::Disconnected => write!(f, "The task backend stopped before the session finished."),
        }
    }
}

pub enum Task2UI {
    /// Backend is ready, waiting for Start.
    Running(TaskInformation),
    /// Backend has failed. No report will follow.
    Failure(TaskFailure),
    BlockStarted { index: usize, block: Block },
    /// Latest state of the current trial, sent every poll.
    Frame(Frame),
    TrialRecorded(TrialResult),
    /// Every block ran to completion.
    Finished(Report),
}
