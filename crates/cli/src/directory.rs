//! Build a directory client from settings, secrets and flags.

use enrollname_config::{SecretLookup, Settings};
use enrollname_directory::{Credentials, DirectoryClient, DirectoryConfig, DirectoryError};
use tracing::debug;

use crate::CliError;

/// Pick credentials: a pre-issued token wins, otherwise the app registration.
///
/// `secret_for` is only consulted when no token was given.
pub fn resolve_credentials(
    settings: &Settings,
    access_token: Option<&str>,
    secret_for: impl FnOnce(&str) -> SecretLookup,
) -> Result<Credentials, DirectoryError> {
    if let Some(token) = access_token.map(str::trim).filter(|t| !t.is_empty()) {
        debug!("using pre-issued access token");
        return Ok(Credentials::Bearer(token.to_string()));
    }

    let mut missing = Vec::new();
    let tenant_id = settings.tenant_id();
    let client_id = settings.client_id();
    if tenant_id.is_none() {
        missing.push("tenant id");
    }
    if client_id.is_none() {
        missing.push("client id");
    }

    let (Some(tenant_id), Some(client_id)) = (tenant_id, client_id) else {
        return Err(DirectoryError::NotConfigured(format!("missing {}", missing.join(" and "))));
    };

    let lookup = secret_for(client_id);
    let Some(client_secret) = lookup.secret else {
        return Err(DirectoryError::NotConfigured("missing client secret".into()));
    };
    debug!("client secret from {}", lookup.source.as_str());

    Ok(Credentials::ClientSecret {
        tenant_id: tenant_id.to_string(),
        client_id: client_id.to_string(),
        client_secret,
    })
}

/// Directory connection settings from the settings file.
pub fn directory_config(settings: &Settings, credentials: Credentials) -> DirectoryConfig {
    DirectoryConfig {
        graph_endpoint: settings.graph_endpoint.clone(),
        login_endpoint: settings.login_endpoint.clone(),
        api_version: settings.api_version.clone(),
        page_size: settings.effective_page_size(),
        credentials,
    }
}

/// Connect using the real keychain/environment secret lookup.
pub fn connect(settings: &Settings, access_token: Option<&str>) -> Result<DirectoryClient, CliError> {
    let credentials = resolve_credentials(settings, access_token, enrollname_config::get_client_secret)?;
    Ok(DirectoryClient::new(directory_config(settings, credentials))?)
}
