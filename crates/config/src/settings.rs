// Application settings
// Loaded from ~/.config/enrollname/settings.json

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

pub const DEFAULT_GRAPH_ENDPOINT: &str = "https://graph.microsoft.com";
pub const DEFAULT_LOGIN_ENDPOINT: &str = "https://login.microsoftonline.com";
pub const DEFAULT_API_VERSION: &str = "beta";
pub const DEFAULT_PAGE_SIZE: u32 = 100;

/// Graph page size is capped server-side; larger values are clamped.
const MAX_PAGE_SIZE: u32 = 999;

const ENV_TENANT_ID: &str = "ENROLLNAME_TENANT_ID";
const ENV_CLIENT_ID: &str = "ENROLLNAME_CLIENT_ID";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    // Directory (app registration)
    #[serde(rename = "directory.tenantId")]
    pub tenant_id: Option<String>,

    #[serde(rename = "directory.clientId")]
    pub client_id: Option<String>,

    #[serde(rename = "directory.graphEndpoint")]
    pub graph_endpoint: String,

    #[serde(rename = "directory.loginEndpoint")]
    pub login_endpoint: String,

    #[serde(rename = "directory.apiVersion")]
    pub api_version: String,

    #[serde(rename = "directory.pageSize")]
    pub page_size: u32,

    // Output
    #[serde(rename = "output.directory")]
    pub output_directory: Option<String>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            tenant_id: None,
            client_id: None,
            graph_endpoint: DEFAULT_GRAPH_ENDPOINT.to_string(),
            login_endpoint: DEFAULT_LOGIN_ENDPOINT.to_string(),
            api_version: DEFAULT_API_VERSION.to_string(),
            page_size: DEFAULT_PAGE_SIZE,
            output_directory: None,
        }
    }
}

/// Strip `//` comment lines so the commented default file parses as JSON.
fn strip_comments(contents: &str) -> String {
    contents
        .lines()
        .filter(|line| !line.trim().starts_with("//"))
        .collect::<Vec<_>>()
        .join("\n")
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

impl Settings {
    /// Get the settings file path
    pub fn config_path() -> PathBuf {
        let config_dir = dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("enrollname");
        config_dir.join("settings.json")
    }

    /// Load settings from the default location, creating the commented
    /// default file on first use. Environment overrides are applied.
    pub fn load() -> Self {
        let path = Self::config_path();

        if !path.exists() {
            create_default_file(&path);
            return Self::default().with_env_overrides(|k| std::env::var(k).ok());
        }

        Self::load_from(&path).with_env_overrides(|k| std::env::var(k).ok())
    }

    /// Load settings from `path`, falling back to defaults on any error.
    pub fn load_from(path: &Path) -> Self {
        match fs::read_to_string(path) {
            Ok(contents) => match Self::parse(&contents) {
                Ok(settings) => settings,
                Err(e) => {
                    eprintln!("Error parsing {}: {}", path.display(), e);
                    eprintln!("Using default settings");
                    Self::default()
                }
            },
            Err(e) => {
                eprintln!("Error reading {}: {}", path.display(), e);
                Self::default()
            }
        }
    }

    /// Parse settings JSON (with `//` comment lines).
    pub fn parse(contents: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(&strip_comments(contents))
    }

    /// Overlay `ENROLLNAME_TENANT_ID` / `ENROLLNAME_CLIENT_ID` on the file values.
    pub fn with_env_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(tenant) = non_empty(lookup(ENV_TENANT_ID)) {
            self.tenant_id = Some(tenant);
        }
        if let Some(client) = non_empty(lookup(ENV_CLIENT_ID)) {
            self.client_id = Some(client);
        }
        self
    }

    pub fn tenant_id(&self) -> Option<&str> {
        self.tenant_id.as_deref().filter(|s| !s.trim().is_empty())
    }

    pub fn client_id(&self) -> Option<&str> {
        self.client_id.as_deref().filter(|s| !s.trim().is_empty())
    }

    /// Page size clamped to 1..=999.
    pub fn effective_page_size(&self) -> u32 {
        self.page_size.clamp(1, MAX_PAGE_SIZE)
    }

    /// Where reports and exports go when `--output` is not given.
    pub fn effective_output_dir(&self) -> PathBuf {
        match self.output_directory.as_deref().map(str::trim) {
            Some(dir) if !dir.is_empty() => PathBuf::from(dir),
            _ => default_output_dir(),
        }
    }

    /// Get the config file path for display
    pub fn config_path_display() -> String {
        Self::config_path().to_string_lossy().to_string()
    }
}

/// `<data_local_dir>/enrollname/reports`
pub fn default_output_dir() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("enrollname")
        .join("reports")
}

/// Create default settings file with comments
fn create_default_file(path: &Path) {
    if let Some(parent) = path.parent() {
        if let Err(e) = fs::create_dir_all(parent) {
            eprintln!("Error creating config directory: {}", e);
            return;
        }
    }

    let default_config = r#"{
    // Directory app registration (client-credentials flow)
    // ENROLLNAME_TENANT_ID / ENROLLNAME_CLIENT_ID override these.
    // The client secret lives in the system keychain (`enrollname config set-secret`)
    // or ENROLLNAME_CLIENT_SECRET, never in this file.
    "directory.tenantId": null,
    "directory.clientId": null,

    // Endpoints (change for national clouds)
    "directory.graphEndpoint": "https://graph.microsoft.com",
    "directory.loginEndpoint": "https://login.microsoftonline.com",
    "directory.apiVersion": "beta",
    "directory.pageSize": 100,

    // Reports and exports (null = platform data directory)
    "output.directory": null
}
"#;

    if let Err(e) = fs::write(path, default_config) {
        eprintln!("Error writing default settings.json: {}", e);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_file_parses_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("enrollname").join("settings.json");
        create_default_file(&path);
        assert!(path.exists());

        let settings = Settings::load_from(&path);
        assert_eq!(settings, Settings::default());
    }

    #[test]
    fn partial_file_keeps_defaults() {
        let settings = Settings::parse(
            r#"{
    // tenant only
    "directory.tenantId": "contoso.onmicrosoft.com",
    "directory.pageSize": 50
}"#,
        )
        .unwrap();
        assert_eq!(settings.tenant_id(), Some("contoso.onmicrosoft.com"));
        assert_eq!(settings.client_id(), None);
        assert_eq!(settings.page_size, 50);
        assert_eq!(settings.api_version, DEFAULT_API_VERSION);
    }

    #[test]
    fn invalid_file_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        fs::write(&path, "{ not json").unwrap();
        assert_eq!(Settings::load_from(&path), Settings::default());
    }

    #[test]
    fn env_overrides_win_over_file() {
        let settings = Settings {
            tenant_id: Some("file-tenant".into()),
            client_id: Some("file-client".into()),
            ..Settings::default()
        };
        let overridden = settings.clone().with_env_overrides(|k| match k {
            "ENROLLNAME_TENANT_ID" => Some("env-tenant".into()),
            "ENROLLNAME_CLIENT_ID" => Some("   ".into()),
            _ => None,
        });
        assert_eq!(overridden.tenant_id(), Some("env-tenant"));
        assert_eq!(overridden.client_id(), Some("file-client"));
    }

    #[test]
    fn blank_ids_are_unset() {
        let settings = Settings {
            tenant_id: Some("  ".into()),
            ..Settings::default()
        };
        assert_eq!(settings.tenant_id(), None);
    }

    #[test]
    fn page_size_is_clamped() {
        let mut settings = Settings::default();
        settings.page_size = 0;
        assert_eq!(settings.effective_page_size(), 1);
        settings.page_size = 5000;
        assert_eq!(settings.effective_page_size(), 999);
    }

    #[test]
    fn output_dir_prefers_configured_value() {
        let settings = Settings {
            output_directory: Some("/srv/reports".into()),
            ..Settings::default()
        };
        assert_eq!(settings.effective_output_dir(), PathBuf::from("/srv/reports"));
        assert!(Settings::default()
            .effective_output_dir()
            .ends_with("enrollname/reports"));
    }
}
