//! `enrollname export` — dump the directory's device list to CSV.
//!
//! The export's SerialNumber and DisplayName columns are accepted back by
//! `apply`, so an edited export is a valid directive file.

use std::path::Path;

use enrollname_directory::DirectoryClient;
use enrollname_recon::report::{open_output, EXPORT_STEM};
use serde::Serialize;

use crate::CliError;

#[derive(Serialize)]
struct ExportSummary {
    path: String,
    devices: usize,
    unnamed: usize,
}

/// Fetch every device and write the export. Returns the written path.
pub fn run_export(
    output: Option<&Path>,
    default_output_dir: &Path,
    connect: impl FnOnce() -> Result<DirectoryClient, CliError>,
    json: bool,
) -> Result<std::path::PathBuf, CliError> {
    let now = chrono::Local::now().naive_local();
    let export = open_output(output, default_output_dir, EXPORT_STEM, now)?;

    let client = connect()?;
    eprintln!("fetching devices from directory...");
    let devices = client.fetch_all_devices()?;

    let path = export.write_device_export(&devices)?;

    let unnamed = devices
        .iter()
        .filter(|d| enrollname_recon::normalize::is_unnamed(&d.current_name))
        .count();

    if json {
        let summary = ExportSummary {
            path: path.display().to_string(),
            devices: devices.len(),
            unnamed,
        };
        let json_str = serde_json::to_string_pretty(&summary)
            .map_err(|e| CliError::general(format!("JSON serialization error: {e}")))?;
        println!("{json_str}");
    }

    eprintln!("wrote {} devices ({} unnamed) to {}", devices.len(), unnamed, path.display());
    Ok(path)
}
