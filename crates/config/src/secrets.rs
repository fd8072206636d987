// Directory client secret management
//
// The client secret is looked up in:
// 1. System keychain (preferred)
// 2. ENROLLNAME_CLIENT_SECRET (fallback for CI/headless)
//
// Secrets are NEVER stored in settings.json

use std::env;

/// Service name for keychain storage
const KEYCHAIN_SERVICE: &str = "enrollname";

pub const ENV_CLIENT_SECRET: &str = "ENROLLNAME_CLIENT_SECRET";

/// Where a secret came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SecretSource {
    Keychain,
    Environment,
    None,
}

impl SecretSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            SecretSource::Keychain => "keychain",
            SecretSource::Environment => "environment",
            SecretSource::None => "none",
        }
    }
}

/// Result of a secret lookup
#[derive(Clone)]
pub struct SecretLookup {
    pub secret: Option<String>,
    pub source: SecretSource,
}

// Manual Debug so the secret never lands in logs.
impl std::fmt::Debug for SecretLookup {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SecretLookup")
            .field("secret", &self.secret.as_ref().map(|_| "<redacted>"))
            .field("source", &self.source)
            .finish()
    }
}

/// Keychain account for an app registration
fn keychain_account(client_id: &str) -> String {
    format!("directory/{}", client_id.trim().to_lowercase())
}

/// Get the client secret for the given app registration.
pub fn get_client_secret(client_id: &str) -> SecretLookup {
    lookup_client_secret(client_id, |name| env::var(name).ok())
}

fn lookup_client_secret(client_id: &str, env_lookup: impl Fn(&str) -> Option<String>) -> SecretLookup {
    #[cfg(feature = "keychain")]
    {
        if let Ok(entry) = keyring::Entry::new(KEYCHAIN_SERVICE, &keychain_account(client_id)) {
            if let Ok(secret) = entry.get_password() {
                if !secret.is_empty() {
                    return SecretLookup {
                        secret: Some(secret),
                        source: SecretSource::Keychain,
                    };
                }
            }
        }
    }
    #[cfg(not(feature = "keychain"))]
    let _ = keychain_account(client_id);

    if let Some(secret) = env_lookup(ENV_CLIENT_SECRET) {
        if !secret.is_empty() {
            return SecretLookup {
                secret: Some(secret),
                source: SecretSource::Environment,
            };
        }
    }

    SecretLookup {
        secret: None,
        source: SecretSource::None,
    }
}

/// Store the client secret in the system keychain
#[cfg(feature = "keychain")]
pub fn set_client_secret(client_id: &str, secret: &str) -> Result<(), String> {
    let entry = keyring::Entry::new(KEYCHAIN_SERVICE, &keychain_account(client_id))
        .map_err(|e| format!("Failed to create keychain entry: {}", e))?;

    entry
        .set_password(secret)
        .map_err(|e| format!("Failed to store secret in keychain: {}", e))
}

#[cfg(not(feature = "keychain"))]
pub fn set_client_secret(_client_id: &str, _secret: &str) -> Result<(), String> {
    Err(format!(
        "Keychain support not enabled. Set {} instead.",
        ENV_CLIENT_SECRET
    ))
}

/// Delete the client secret from the system keychain
#[cfg(feature = "keychain")]
pub fn delete_client_secret(client_id: &str) -> Result<(), String> {
    let entry = keyring::Entry::new(KEYCHAIN_SERVICE, &keychain_account(client_id))
        .map_err(|e| format!("Failed to access keychain entry: {}", e))?;

    entry
        .delete_credential()
        .map_err(|e| format!("Failed to delete secret from keychain: {}", e))
}

#[cfg(not(feature = "keychain"))]
pub fn delete_client_secret(_client_id: &str) -> Result<(), String> {
    Err("Keychain support not enabled.".to_string())
}

/// Check if keychain support is available
pub fn keychain_available() -> bool {
    #[cfg(feature = "keychain")]
    {
        keyring::Entry::new(KEYCHAIN_SERVICE, "availability").is_ok()
    }
    #[cfg(not(feature = "keychain"))]
    {
        false
    }
}
