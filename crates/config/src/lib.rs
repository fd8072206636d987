// Configuration loading

pub mod secrets;
pub mod settings;

pub use secrets::{get_client_secret, SecretLookup, SecretSource};
pub use settings::Settings;
