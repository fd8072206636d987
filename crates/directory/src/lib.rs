//! Device directory client.
//!
//! Single source of truth for the directory wire contract: token exchange,
//! paged listing of Autopilot device identities, display name updates.
//!
//! No terminal output. Retries and pagination are logged through `tracing`.

mod auth;
mod client;
mod error;

pub use auth::Credentials;
pub use client::{
    DirectoryClient, DirectoryConfig, DEFAULT_GRAPH_ENDPOINT, DEFAULT_LOGIN_ENDPOINT, MAX_RETRIES,
};
pub use error::DirectoryError;
