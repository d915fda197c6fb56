use clap::Parser;
use log::info;

use crate::{
    cli::Cli,
    error::AppError,
    pipe::{Task2UI, UI2Task},
    task::Task,
    ui::UI,
};

mod cli;
pub mod config;
mod error;
pub mod input;
pub mod pipe;
pub mod session;
mod task;
pub mod trial;
mod ui;
pub mod util;

#[profiling::function]
pub fn main() -> Result<(), AppError> {
    let cli = Cli::parse();
    util::logger::init(cli.verbose);

    let config = cli.task_config()?;
    if cli.dump_config {
        println!("{}", config.to_toml()?);
        return Ok(());
    }
    if let Some(path) = &cli.save_config {
        config.save(path)?;
        info!("Config written to {}", path.display());
        return Ok(());
    }

    let (ui_tx, task_rx) = std::sync::mpsc::channel::<UI2Task>();
    let (task_tx, ui_rx) = std::sync::mpsc::channel::<Task2UI>();

    let display = config.display;
    let backend = Task::run(config, cli.seed, task_tx, task_rx).map_err(AppError::Spawn)?;
    let rtn = UI::run(ui_tx, ui_rx, display);

    // the frontend has dropped its sender by now, so the backend is already unwinding
    if backend.join().is_err() {
        log::error!("Task backend did not exit cleanly");
    }
    info!("Exiting");
    Ok(rtn?)
}
