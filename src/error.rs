//! Top-level error type and process exit codes.

use std::io;
use std::process::ExitCode;

use thiserror::Error;

use crate::config::ConfigError;
use crate::sink::SinkError;

/// Clean shutdown.
pub const EXIT_OK: u8 = 0;
/// Anything not covered below.
pub const EXIT_FAILURE: u8 = 1;
/// Invalid or missing configuration.
pub const EXIT_CONFIG: u8 = 2;
/// The frame sink went away.
pub const EXIT_SINK: u8 = 3;

/// Errors that end the process.
#[derive(Debug, Error)]
pub enum PanelError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("frame sink lost: {0}")]
    Sink(#[from] SinkError),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, PanelError>;

impl PanelError {
    pub fn exit_code(&self) -> u8 {
        match self {
            PanelError::Config(_) => EXIT_CONFIG,
            PanelError::Sink(_) => EXIT_SINK,
            PanelError::Io(_) => EXIT_FAILURE,
            PanelError::Other(e) => exit_code(e),
        }
    }
}

/// Exit status for an error that reached `main`.
///
/// Walks the whole chain so context added with `anyhow` does not hide the
/// typed cause.
pub fn exit_code(error: &anyhow::Error) -> u8 {
    for cause in error.chain() {
        if let Some(panel) = cause.downcast_ref::<PanelError>() {
            if !matches!(panel, PanelError::Other(_)) {
                return panel.exit_code();
            }
        }
        if cause.downcast_ref::<ConfigError>().is_some() {
            return EXIT_CONFIG;
        }
        if cause.downcast_ref::<SinkError>().is_some() {
            return EXIT_SINK;
        }
    }
    EXIT_FAILURE
}

/// Convert a run outcome into the process exit status.
pub fn to_exit_code(result: anyhow::Result<()>) -> ExitCode {
    match result {
        Ok(()) => ExitCode::from(EXIT_OK),
        Err(e) => ExitCode::from(exit_code(&e)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Context;

    #[test]
    fn test_exit_codes() {
        let config = PanelError::from(ConfigError::Capacity(5));
        assert_eq!(config.exit_code(), EXIT_CONFIG);

        let sink = PanelError::from(SinkError::Uninitialized);
        assert_eq!(sink.exit_code(), EXIT_SINK);

        let io = PanelError::from(io::Error::other("boom"));
        assert_eq!(io.exit_code(), EXIT_FAILURE);
    }

    #[test]
    fn test_exit_code_sees_through_context() {
        let err = Err::<(), _>(PanelError::from(SinkError::Uninitialized))
            .context("while drawing")
            .unwrap_err();
        assert_eq!(exit_code(&err), EXIT_SINK);

        let err = Err::<(), _>(ConfigError::Zero("refresh"))
            .context("loading config")
            .unwrap_err();
        assert_eq!(exit_code(&err), EXIT_CONFIG);

        assert_eq!(exit_code(&anyhow::anyhow!("other")), EXIT_FAILURE);
    }

    #[test]
    fn test_nested_sink_error_inside_other() {
        let inner = anyhow::Error::from(SinkError::Uninitialized);
        assert_eq!(PanelError::Other(inner).exit_code(), EXIT_SINK);
    }
}
