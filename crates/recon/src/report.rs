//! Report builder: decisions → CSV, device snapshot → CSV, and output
//! location resolution.
//!
//! # Report columns (in order)
//!
//! `SerialNumber,DesiredName,Status,Reason,Error,DeviceId,CurrentName`
//!
//! - Header is always written, even with zero decisions.
//! - Rows are sorted by status (report order) then serial, so two runs over
//!   the same inputs produce byte-identical files.
//! - Optional columns are empty strings, never omitted.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use chrono::NaiveDateTime;
use serde::Serialize;

use crate::error::ReconError;
use crate::model::{Decision, RemoteDevice};

pub const REPORT_STEM: &str = "naming-report";
pub const EXPORT_STEM: &str = "device-export";

const REPORT_HEADER: [&str; 7] = [
    "SerialNumber",
    "DesiredName",
    "Status",
    "Reason",
    "Error",
    "DeviceId",
    "CurrentName",
];

const EXPORT_HEADER: [&str; 8] = [
    "SerialNumber",
    "DisplayName",
    "Id",
    "Manufacturer",
    "Model",
    "GroupTag",
    "EnrollmentState",
    "LastContacted",
];

#[derive(Serialize)]
#[serde(rename_all = "PascalCase")]
struct ReportRow<'a> {
    serial_number: &'a str,
    desired_name: &'a str,
    status: &'static str,
    reason: &'a str,
    error: &'a str,
    device_id: &'a str,
    current_name: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "PascalCase")]
struct ExportRow<'a> {
    serial_number: &'a str,
    display_name: &'a str,
    id: &'a str,
    manufacturer: &'a str,
    model: &'a str,
    group_tag: &'a str,
    enrollment_state: &'a str,
    last_contacted: &'a str,
}

fn csv_err(e: csv::Error) -> ReconError {
    ReconError::Io(format!("CSV write error: {e}"))
}

fn csv_writer<W: Write>(writer: W) -> csv::Writer<W> {
    csv::WriterBuilder::new()
        .has_headers(false)
        .terminator(csv::Terminator::Any(b'\n'))
        .from_writer(writer)
}

fn report_rows<W: Write>(decisions: &[Decision], writer: W) -> Result<(), csv::Error> {
    let mut sorted: Vec<&Decision> = decisions.iter().collect();
    sorted.sort_by(|a, b| {
        a.status
            .cmp(&b.status)
            .then_with(|| a.serial_number.cmp(&b.serial_number))
    });

    let mut out = csv_writer(writer);
    out.write_record(REPORT_HEADER)?;
    for d in sorted {
        out.serialize(ReportRow {
            serial_number: &d.serial_number,
            desired_name: &d.desired_name,
            status: d.status.as_str(),
            reason: &d.reason,
            error: d.error.as_deref().unwrap_or(""),
            device_id: d.device_id.as_deref().unwrap_or(""),
            current_name: d.current_name.as_deref().unwrap_or(""),
        })?;
    }
    out.flush()?;
    Ok(())
}

fn export_rows<W: Write>(devices: &[RemoteDevice], writer: W) -> Result<(), csv::Error> {
    let mut sorted: Vec<&RemoteDevice> = devices.iter().collect();
    sorted.sort_by(|a, b| {
        a.serial_number
            .cmp(&b.serial_number)
            .then_with(|| a.id.cmp(&b.id))
    });

    let mut out = csv_writer(writer);
    out.write_record(EXPORT_HEADER)?;
    for d in sorted {
        out.serialize(ExportRow {
            serial_number: &d.serial_number,
            display_name: &d.current_name,
            id: &d.id,
            manufacturer: &d.manufacturer,
            model: &d.model,
            group_tag: &d.group_tag,
            enrollment_state: &d.enrollment_state,
            last_contacted: &d.last_contacted,
        })?;
    }
    out.flush()?;
    Ok(())
}

/// Write the decision report as CSV to any writer.
pub fn write_report<W: Write>(decisions: &[Decision], writer: W) -> Result<(), ReconError> {
    report_rows(decisions, writer).map_err(csv_err)
}

/// Write the device snapshot as CSV, sorted by serial then id.
pub fn write_device_export<W: Write>(devices: &[RemoteDevice], writer: W) -> Result<(), ReconError> {
    export_rows(devices, writer).map_err(csv_err)
}

fn write_err(path: &Path, e: impl std::fmt::Display) -> ReconError {
    ReconError::Write {
        path: path.display().to_string(),
        message: e.to_string(),
    }
}

/// A report or export file, created before the directory is contacted.
///
/// Creating the file up front means an unwritable location fails the run
/// before any rename is sent. A file this created and then dropped without
/// writing is removed again; a pre-existing path is left in place.
#[derive(Debug)]
pub struct OutputFile {
    path: PathBuf,
    file: Option<File>,
    created: bool,
}

impl OutputFile {
    /// Create (truncate) `path`. Its directory must already exist.
    pub fn create(path: PathBuf) -> Result<Self, ReconError> {
        let created = !path.exists();
        let file = File::create(&path).map_err(|e| write_err(&path, e))?;
        Ok(Self { path, file: Some(file), created })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Write the decision report and close the file.
    pub fn write_report(mut self, decisions: &[Decision]) -> Result<PathBuf, ReconError> {
        let file = self.take_file()?;
        report_rows(decisions, BufWriter::new(file)).map_err(|e| write_err(&self.path, e))?;
        Ok(std::mem::take(&mut self.path))
    }

    /// Write the device export and close the file.
    pub fn write_device_export(mut self, devices: &[RemoteDevice]) -> Result<PathBuf, ReconError> {
        let file = self.take_file()?;
        export_rows(devices, BufWriter::new(file)).map_err(|e| write_err(&self.path, e))?;
        Ok(std::mem::take(&mut self.path))
    }

    fn take_file(&mut self) -> Result<File, ReconError> {
        self.file
            .take()
            .ok_or_else(|| write_err(&self.path, "file already closed"))
    }
}

impl Drop for OutputFile {
    fn drop(&mut self) {
        // Still holding the handle: nothing was written
        if self.file.take().is_some() && self.created {
            let _ = std::fs::remove_file(&self.path);
        }
    }
}

// ---------------------------------------------------------------------------
// Output location
// ---------------------------------------------------------------------------

/// Timestamped default file name, e.g. `naming-report-20261018-141503.csv`.
pub fn default_file_name(stem: &str, at: NaiveDateTime) -> String {
    format!("{stem}-{}.csv", at.format("%Y%m%d-%H%M%S"))
}

/// Resolve where a report or export goes, and make sure its directory exists.
///
/// - `requested` names an existing directory, or ends with a path separator:
///   the default file name is placed inside it.
/// - `requested` names anything else: used as the file path.
/// - `requested` is `None`: the default file name inside `default_dir`.
///
/// Called before any remote call, so a bad location aborts the run early.
pub fn resolve_output_path(
    requested: Option<&Path>,
    default_dir: &Path,
    stem: &str,
    at: NaiveDateTime,
) -> Result<PathBuf, ReconError> {
    let file_name = default_file_name(stem, at);

    let target = match requested {
        None => default_dir.join(&file_name),
        Some(p) => {
            let raw = p.as_os_str().to_string_lossy();
            if raw.trim().is_empty() {
                return Err(ReconError::InvalidOutput("empty output path".into()));
            }
            if p.is_dir() || raw.ends_with('/') || raw.ends_with(std::path::MAIN_SEPARATOR) {
                p.join(&file_name)
            } else if p.file_name().is_none() {
                return Err(ReconError::InvalidOutput(format!(
                    "{} does not name a file",
                    p.display()
                )));
            } else {
                p.to_path_buf()
            }
        }
    };

    if let Some(parent) = target.parent().filter(|p| !p.as_os_str().is_empty()) {
        if parent.exists() && !parent.is_dir() {
            return Err(ReconError::InvalidOutput(format!(
                "{} is not a directory",
                parent.display()
            )));
        }
        std::fs::create_dir_all(parent).map_err(|e| write_err(parent, e))?;
    }

    Ok(target)
}

/// Resolve the output location and create the file there.
pub fn open_output(
    requested: Option<&Path>,
    default_dir: &Path,
    stem: &str,
    at: NaiveDateTime,
) -> Result<OutputFile, ReconError> {
    OutputFile::create(resolve_output_path(requested, default_dir, stem, at)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::DecisionStatus;

    fn at() -> NaiveDateTime {
        chrono::NaiveDate::from_ymd_opt(2026, 10, 18)
            .unwrap()
            .and_hms_opt(14, 15, 3)
            .unwrap()
    }

    fn decision(serial: &str, status: DecisionStatus, error: Option<&str>) -> Decision {
        Decision {
            serial_number: serial.into(),
            desired_name: format!("PC-{serial}"),
            status,
            reason: "r".into(),
            error: error.map(String::from),
            device_id: None,
            current_name: None,
        }
    }

    #[test]
    fn report_sorted_with_header() {
        let decisions = vec![
            decision("B", DecisionStatus::Updated, None),
            decision("C", DecisionStatus::Failed, Some("HTTP 500: boom")),
            decision("A", DecisionStatus::Updated, None),
            decision("D", DecisionStatus::DuplicateName, None),
        ];
        let mut buf = Vec::new();
        write_report(&decisions, &mut buf).unwrap();
        let out = String::from_utf8(buf).unwrap();
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(
            lines[0],
            "SerialNumber,DesiredName,Status,Reason,Error,DeviceId,CurrentName"
        );
        assert_eq!(lines[1], "D,PC-D,DuplicateName,r,,,");
        assert_eq!(lines[2], "A,PC-A,Updated,r,,,");
        assert_eq!(lines[3], "B,PC-B,Updated,r,,,");
        assert_eq!(lines[4], "C,PC-C,Failed,r,HTTP 500: boom,,");
    }

    #[test]
    fn empty_report_has_header_only() {
        let mut buf = Vec::new();
        write_report(&[], &mut buf).unwrap();
        assert_eq!(
            String::from_utf8(buf).unwrap(),
            "SerialNumber,DesiredName,Status,Reason,Error,DeviceId,CurrentName\n"
        );
    }

    #[test]
    fn reasons_with_commas_are_quoted() {
        let mut d = decision("A", DecisionStatus::AlreadyNamed, None);
        d.reason = "device already named 'X'; force update required, sorry".into();
        let mut buf = Vec::new();
        write_report(&[d], &mut buf).unwrap();
        let out = String::from_utf8(buf).unwrap();
        assert!(out.contains("\"device already named 'X'; force update required, sorry\""));
    }

    #[test]
    fn export_layout_round_trips_into_loader() {
        let mut dev = RemoteDevice::new("guid-2", "SN-2", "PC-2");
        dev.model = "Surface Laptop".into();
        let devices = vec![dev, RemoteDevice::new("guid-1", "SN-1", "")];

        let mut buf = Vec::new();
        write_device_export(&devices, &mut buf).unwrap();
        let out = String::from_utf8(buf).unwrap();
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(
            lines[0],
            "SerialNumber,DisplayName,Id,Manufacturer,Model,GroupTag,EnrollmentState,LastContacted"
        );
        assert_eq!(lines[1], "SN-1,,guid-1,,,,,");
        assert_eq!(lines[2], "SN-2,PC-2,guid-2,,Surface Laptop,,,");

        let loaded = crate::load::load_directives("export.csv", &out).unwrap();
        assert_eq!(loaded.name_column, crate::load::NameColumn::DisplayName);
        assert_eq!(loaded.directives.len(), 1);
    }

    #[test]
    fn default_name_is_timestamped() {
        assert_eq!(
            default_file_name(REPORT_STEM, at()),
            "naming-report-20261018-141503.csv"
        );
    }

    #[test]
    fn resolve_default_dir() {
        let dir = tempfile::tempdir().unwrap();
        let reports = dir.path().join("reports");
        let path = resolve_output_path(None, &reports, REPORT_STEM, at()).unwrap();
        assert_eq!(path, reports.join("naming-report-20261018-141503.csv"));
        assert!(reports.is_dir());
    }

    #[test]
    fn resolve_existing_directory() {
        let dir = tempfile::tempdir().unwrap();
        let path =
            resolve_output_path(Some(dir.path()), Path::new("unused"), EXPORT_STEM, at()).unwrap();
        assert_eq!(path, dir.path().join("device-export-20261018-141503.csv"));
    }

    #[test]
    fn resolve_trailing_separator_creates_directory() {
        let dir = tempfile::tempdir().unwrap();
        let requested = format!("{}/out/", dir.path().display());
        let path = resolve_output_path(
            Some(Path::new(&requested)),
            Path::new("unused"),
            REPORT_STEM,
            at(),
        )
        .unwrap();
        assert!(path.ends_with("naming-report-20261018-141503.csv"));
        assert!(dir.path().join("out").is_dir());
    }

    #[test]
    fn resolve_explicit_file() {
        let dir = tempfile::tempdir().unwrap();
        let requested = dir.path().join("nested").join("result.csv");
        let path =
            resolve_output_path(Some(&requested), Path::new("unused"), REPORT_STEM, at()).unwrap();
        assert_eq!(path, requested);
        assert!(dir.path().join("nested").is_dir());
    }

    #[test]
    fn resolve_rejects_bad_locations() {
        let err = resolve_output_path(Some(Path::new("")), Path::new("."), REPORT_STEM, at())
            .unwrap_err();
        assert!(matches!(err, ReconError::InvalidOutput(_)));

        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("plain.txt");
        std::fs::write(&file, "x").unwrap();
        let under_file = file.join("report.csv");
        let err = resolve_output_path(Some(&under_file), Path::new("."), REPORT_STEM, at())
            .unwrap_err();
        assert!(matches!(err, ReconError::InvalidOutput(_)));
    }

    #[test]
    fn output_file_writes_report() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("r.csv");
        let out = OutputFile::create(path.clone()).unwrap();
        assert!(path.is_file());
        let written = out
            .write_report(&[decision("A", DecisionStatus::NoChange, None)])
            .unwrap();
        assert_eq!(written, path);
        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.contains("A,PC-A,NoChange"));
    }

    #[test]
    fn output_file_fails_at_create() {
        let dir = tempfile::tempdir().unwrap();
        let bad = dir.path().join("missing-dir").join("r.csv");
        let err = OutputFile::create(bad).unwrap_err();
        assert!(matches!(err, ReconError::Write { .. }));
    }

    #[test]
    fn unwritten_output_file_is_removed() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("r.csv");
        drop(OutputFile::create(path.clone()).unwrap());
        assert!(!path.exists());

        // A file that was already there stays
        std::fs::write(&path, "old").unwrap();
        drop(OutputFile::create(path.clone()).unwrap());
        assert!(path.exists());
    }

    #[test]
    fn open_output_creates_in_directory() {
        let dir = tempfile::tempdir().unwrap();
        let out = open_output(Some(dir.path()), Path::new("unused"), EXPORT_STEM, at()).unwrap();
        assert_eq!(out.path(), dir.path().join("device-export-20261018-141503.csv"));
        assert!(out.path().is_file());
        out.write_device_export(&[]).unwrap();
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn write_failure_names_the_path_once() {
        // Opens fine, every write fails with ENOSPC
        let out = OutputFile::create(PathBuf::from("/dev/full")).unwrap();
        let err = out
            .write_report(&[decision("A", DecisionStatus::NoChange, None)])
            .unwrap_err();
        let msg = err.to_string();
        assert!(matches!(err, ReconError::Write { .. }));
        assert!(msg.starts_with("cannot write /dev/full: "), "{msg}");
        assert!(!msg.contains("IO error"), "{msg}");
    }
}
