use std::fmt::Display;

use crate::config::ConfigError;

/// Anything that stops the application before or around the session.
#[derive(Debug)]
pub enum AppError {
    Config(ConfigError),
    /// Couldn't start the task backend thread.
    Spawn(std::io::Error),
    /// The window failed to open or crashed.
    Frontend(eframe::Error),
}

impl Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AppError::Config(err) => write!(f, "{}", err),
            AppError::Spawn(err) => write!(f, "Couldn't start the task backend: {}", err),
            AppError::Frontend(err) => write!(f, "Frontend failure: {}", err),
        }
    }
}

impl std::error::Error for AppError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            AppError::Config(err) => Some(err),
            AppError::Spawn(err) => Some(err),
            AppError::Frontend(err) => Some(err),
        }
    }
}

impl From<ConfigError> for AppError {
    fn from(err: ConfigError) -> Self { AppError::Config(err) }
}

impl From<eframe::Error> for AppError {
    fn from(err: eframe::Error) -> Self { AppError::Frontend(err) }
}
