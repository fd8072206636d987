//! `enrollname` — apply a device naming convention to an Autopilot-style
//! provisioning directory.
//!
//! The binary in `main.rs` only parses arguments and maps errors to exit
//! codes; the pipelines live here so integration tests can drive them
//! against a mock directory.

pub mod apply;
pub mod config_cmd;
pub mod directory;
pub mod executor;
pub mod exit_codes;
pub mod export;
pub mod logging;
mod util;

use enrollname_directory::DirectoryError;
use enrollname_recon::ReconError;

use exit_codes::{EXIT_ERROR, EXIT_IO, EXIT_USAGE};

#[derive(Debug)]
pub struct CliError {
    pub code: u8,
    pub message: String,
    pub hint: Option<String>,
}

impl CliError {
    pub fn new(code: u8, msg: impl Into<String>) -> Self {
        Self { code, message: msg.into(), hint: None }
    }

    pub fn args(msg: impl Into<String>) -> Self {
        Self::new(EXIT_USAGE, msg)
    }

    pub fn io(msg: impl Into<String>) -> Self {
        Self::new(EXIT_IO, msg)
    }

    pub fn general(msg: impl Into<String>) -> Self {
        Self::new(EXIT_ERROR, msg)
    }

    /// Add a hint to an existing error.
    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }
}

impl From<ReconError> for CliError {
    fn from(err: ReconError) -> Self {
        let code = exit_codes::recon_exit_code(&err);
        let hint = match &err {
            ReconError::MissingColumn { .. } => {
                Some("expected a SerialNumber column and a DesiredName (or DisplayName) column".to_string())
            }
            ReconError::NoDirectives { .. } => {
                Some("every row needs both a serial number and a desired name".to_string())
            }
            _ => None,
        };
        Self { code, message: err.to_string(), hint }
    }
}

impl From<DirectoryError> for CliError {
    fn from(err: DirectoryError) -> Self {
        let code = exit_codes::directory_exit_code(&err);
        let hint = match &err {
            DirectoryError::NotConfigured(_) => Some(
                "set directory.tenantId and directory.clientId (`enrollname config path`), \
                 then `enrollname config set-secret` or ENROLLNAME_CLIENT_SECRET"
                    .to_string(),
            ),
            DirectoryError::Auth(_) => Some(
                "the app registration needs the DeviceManagementServiceConfig.ReadWrite.All application permission"
                    .to_string(),
            ),
            DirectoryError::RateLimited { .. } => Some("wait a few minutes and re-run".to_string()),
            _ => None,
        };
        Self { code, message: err.to_string(), hint }
    }
}
