//! `enrollname config` — inspect settings and manage the client secret.

use std::io::BufRead;

use clap::Subcommand;

use enrollname_config::secrets::{self, SecretLookup};
use enrollname_config::Settings;

use crate::CliError;

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Print the settings file location
    Path,

    /// Show effective settings and where the client secret comes from
    #[command(after_help = "\
The secret itself is never printed, only its source (keychain, environment or none).

Examples:
  enrollname config show
  enrollname config show --json")]
    Show {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Store the client secret in the OS keychain (read from stdin)
    #[command(after_help = "\
Examples:
  enrollname config set-secret < secret.txt
  printf '%s' \"$SECRET\" | enrollname config set-secret --client-id 00000000-0000-0000-0000-000000000000")]
    SetSecret {
        /// App registration to store the secret for (default: directory.clientId)
        #[arg(long)]
        client_id: Option<String>,
    },

    /// Remove the stored client secret from the OS keychain
    DeleteSecret {
        /// App registration to remove the secret for (default: directory.clientId)
        #[arg(long)]
        client_id: Option<String>,
    },
}

pub fn cmd_config(cmd: ConfigCommands, settings: &Settings) -> Result<(), CliError> {
    match cmd {
        ConfigCommands::Path => {
            println!("{}", Settings::config_path_display());
            Ok(())
        }
        ConfigCommands::Show { json } => {
            let lookup = settings
                .client_id()
                .map(enrollname_config::get_client_secret);
            let report = ConfigReport::build(settings, lookup.as_ref(), secrets::keychain_available());
            report.print(json)
        }
        ConfigCommands::SetSecret { client_id } => {
            let client_id = target_client_id(client_id.as_deref(), settings)?;
            let secret = read_secret(std::io::stdin().lock())?;
            secrets::set_client_secret(&client_id, &secret)
                .map_err(|e| CliError::general(format!("could not store secret: {e}")))?;
            eprintln!("stored client secret for {client_id} in the keychain");
            Ok(())
        }
        ConfigCommands::DeleteSecret { client_id } => {
            let client_id = target_client_id(client_id.as_deref(), settings)?;
            secrets::delete_client_secret(&client_id)
                .map_err(|e| CliError::general(format!("could not delete secret: {e}")))?;
            eprintln!("removed client secret for {client_id} from the keychain");
            Ok(())
        }
    }
}

fn target_client_id(flag: Option<&str>, settings: &Settings) -> Result<String, CliError> {
    flag.map(str::trim)
        .filter(|id| !id.is_empty())
        .or_else(|| settings.client_id())
        .map(str::to_string)
        .ok_or_else(|| {
            CliError::args("no client id")
                .with_hint("pass --client-id or set directory.clientId in the settings file")
        })
}

/// First line of `input`, trimmed. Empty input is a usage error.
fn read_secret(mut input: impl BufRead) -> Result<String, CliError> {
    let mut line = String::new();
    input
        .read_line(&mut line)
        .map_err(|e| CliError::io(format!("reading secret from stdin: {e}")))?;
    let secret = line.trim();
    if secret.is_empty() {
        return Err(CliError::args("empty secret on stdin"));
    }
    Ok(secret.to_string())
}

struct ConfigReport {
    config_path: String,
    tenant_id: Option<String>,
    client_id: Option<String>,
    graph_endpoint: String,
    login_endpoint: String,
    api_version: String,
    page_size: u32,
    output_directory: String,
    secret_source: &'static str,
    keychain_available: bool,
}

impl ConfigReport {
    fn build(settings: &Settings, lookup: Option<&SecretLookup>, keychain_available: bool) -> Self {
        Self {
            config_path: Settings::config_path_display(),
            tenant_id: settings.tenant_id().map(str::to_string),
            client_id: settings.client_id().map(str::to_string),
            graph_endpoint: settings.graph_endpoint.clone(),
            login_endpoint: settings.login_endpoint.clone(),
            api_version: settings.api_version.clone(),
            page_size: settings.effective_page_size(),
            output_directory: settings.effective_output_dir().display().to_string(),
            secret_source: lookup.map_or("none", |l| l.source.as_str()),
            keychain_available,
        }
    }

    fn status(&self) -> &'static str {
        if self.tenant_id.is_some() && self.client_id.is_some() && self.secret_source != "none" {
            "ready"
        } else {
            "not_configured"
        }
    }

    fn print(&self, json: bool) -> Result<(), CliError> {
        if json {
            let out = serde_json::json!({
                "status": self.status(),
                "config_path": self.config_path,
                "tenant_id": self.tenant_id,
                "client_id": self.client_id,
                "graph_endpoint": self.graph_endpoint,
                "login_endpoint": self.login_endpoint,
                "api_version": self.api_version,
                "page_size": self.page_size,
                "output_directory": self.output_directory,
                "secret_source": self.secret_source,
                "keychain": if self.keychain_available { "ok" } else { "unavailable" },
            });
            let json_str = serde_json::to_string_pretty(&out)
                .map_err(|e| CliError::general(format!("JSON serialization error: {e}")))?;
            println!("{json_str}");
            return Ok(());
        }

        println!("status:          {}", self.status());
        println!("config_path:     {}", self.config_path);
        println!("tenant_id:       {}", self.tenant_id.as_deref().unwrap_or("(unset)"));
        println!("client_id:       {}", self.client_id.as_deref().unwrap_or("(unset)"));
        println!("graph_endpoint:  {}", self.graph_endpoint);
        println!("login_endpoint:  {}", self.login_endpoint);
        println!("api_version:     {}", self.api_version);
        println!("page_size:       {}", self.page_size);
        println!("output:          {}", self.output_directory);
        println!("secret_source:   {}", self.secret_source);
        println!("keychain:        {}", if self.keychain_available { "ok" } else { "unavailable" });
        if self.status() != "ready" {
            println!();
            println!("To configure:");
            println!("  set directory.tenantId and directory.clientId in {}", self.config_path);
            println!("  then `enrollname config set-secret` or export {}", secrets::ENV_CLIENT_SECRET);
            println!("  (or pass --access-token for a one-off run)");
        }
        Ok(())
    }
}
