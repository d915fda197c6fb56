use crate::{
    config::{Block, TaskConfig},
    input::{self, Pointer},
    pipe::{Task2UI, TaskFailure, TaskInformation, UI2Task},
    session::{Session, Surface, SystemClock},
    trial::{Frame, TrialResult},
};
use log::{error, info};
use rand::{SeedableRng, rngs::StdRng};
use std::{
    io,
    panic::AssertUnwindSafe,
    sync::mpsc::{Receiver, Sender, TryRecvError},
    thread::JoinHandle,
};

pub struct Task {}

/// Bridges the session to the frontend. A `Shutdown` message or a dropped
/// frontend both count as quitting.
struct ChannelSurface {
    tx: Sender<Task2UI>,
    rx: Receiver<UI2Task>,
    quit: bool,
}

impl Surface for ChannelSurface {
    fn quit_requested(&mut self) -> bool {
        while !self.quit {
            match self.rx.try_recv() {
                Ok(UI2Task::Shutdown) | Err(TryRecvError::Disconnected) => self.quit = true,
                Ok(UI2Task::Start) => {}
                Err(TryRecvError::Empty) => break,
            }
        }
        self.quit
    }

    // sends can fail while the frontend is closing; the next quit poll catches that
    fn present(&mut self, frame: &Frame) { let _ = self.tx.send(Task2UI::Frame(*frame)); }

    fn block_started(&mut self, index: usize, block: &Block) {
        let _ = self.tx.send(Task2UI::BlockStarted { index, block: block.clone() });
    }

    fn trial_recorded(&mut self, result: &TrialResult) { let _ = self.tx.send(Task2UI::TrialRecorded(*result)); }
}

fn panic_message(panic: &(dyn std::any::Any + Send)) -> String {
    if let Some(msg) = panic.downcast_ref::<&str>() {
        msg.to_string()
    } else if let Some(msg) = panic.downcast_ref::<String>() {
        msg.clone()
    } else {
        "unknown panic".to_owned()
    }
}

impl Task {
    pub fn run(
        config: TaskConfig,
        seed: Option<u64>,
        tx: Sender<Task2UI>,
        rx: Receiver<UI2Task>,
    ) -> io::Result<JoinHandle<()>> {
        std::thread::Builder::new().name("task".to_owned()).spawn(move || {
            let failure_tx = tx.clone();
            if let Err(panic) = std::panic::catch_unwind(AssertUnwindSafe(|| Task::run1(config, seed, tx, rx))) {
                let msg = panic_message(panic.as_ref());
                error!("Task backend panicked: {}", msg);
                let _ = failure_tx.send(Task2UI::Failure(TaskFailure::Panicked(msg)));
            }
        })
    }

    fn run1(config: TaskConfig, seed: Option<u64>, tx: Sender<Task2UI>, rx: Receiver<UI2Task>) {
        let mut pointer = Pointer::new(input::open_default(), config.display.center(), config.targets.distance);

        let _ = tx.send(Task2UI::Running(TaskInformation {
            device: pointer.name().to_owned(),
            ring: config.ring(),
            blocks: config.blocks.clone(),
        }));

        loop {
            match rx.recv() {
                Ok(UI2Task::Start) => break,
                Ok(UI2Task::Shutdown) | Err(_) => {
                    info!("Shut down before the session started");
                    return;
                }
            }
        }

        let rng = match seed {
            Some(seed) => {
                info!("Target order seeded with {}", seed);
                StdRng::seed_from_u64(seed)
            }
            None => StdRng::from_os_rng(),
        };

        info!("Starting session: {} blocks, {} trials", config.blocks.len(), config.total_trials());
        let mut surface = ChannelSurface { tx, rx, quit: false };
        let mut clock = SystemClock::new();
        match Session::new(&config, rng).run(&mut surface, &mut pointer, &mut clock) {
            Ok(report) => {
                info!("{} of {} trials had no movement", report.missed(), report.trials.len());
                let _ = surface.tx.send(Task2UI::Finished(report));
            }
            Err(aborted) => info!("{}", aborted),
        }

        info!("Task backend exiting cleanly");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::mpsc::channel;

    fn surface() -> (ChannelSurface, Sender<UI2Task>, Receiver<Task2UI>) {
        let (ui_tx, task_rx) = channel();
        let (task_tx, ui_rx) = channel();
        (ChannelSurface { tx: task_tx, rx: task_rx, quit: false }, ui_tx, ui_rx)
    }

    #[test]
    fn start_is_not_a_quit() {
        let (mut surface, ui_tx, _ui_rx) = surface();
        ui_tx.send(UI2Task::Start).unwrap();
        assert!(!surface.quit_requested());
        assert!(!surface.quit_requested());
    }

    #[test]
    fn shutdown_sticks() {
        let (mut surface, ui_tx, _ui_rx) = surface();
        ui_tx.send(UI2Task::Shutdown).unwrap();
        assert!(surface.quit_requested());
        assert!(surface.quit_requested());
    }

    #[test]
    fn dropped_frontend_quits() {
        let (mut surface, ui_tx, _ui_rx) = surface();
        drop(ui_tx);
        assert!(surface.quit_requested());
    }

    #[test]
    fn shutdown_before_start_ends_the_backend() {
        let (ui_tx, task_rx) = channel();
        let (task_tx, ui_rx) = channel();
        ui_tx.send(UI2Task::Shutdown).unwrap();
        let handle = Task::run(TaskConfig::single_block(), Some(1), task_tx, task_rx).unwrap();
        handle.join().unwrap();
        assert!(matches!(ui_rx.recv(), Ok(Task2UI::Running(_))));
        assert!(ui_rx.recv().is_err());
    }

    #[test]
    fn panic_messages_are_recovered() {
        let boxed: Box<dyn std::any::Any + Send> = Box::new("boom");
        assert_eq!(panic_message(boxed.as_ref()), "boom");
        let boxed: Box<dyn std::any::Any + Send> = Box::new(String::from("bang"));
        assert_eq!(panic_message(boxed.as_ref()), "bang");
        let boxed: Box<dyn std::any::Any + Send> = Box::new(3);
        assert_eq!(panic_message(boxed.as_ref()), "unknown panic");
    }
}
