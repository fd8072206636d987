//! `enrollname apply` and `enrollname validate`.
//!
//! Apply pipeline, in order:
//!
//! 1. create the report file (fails before anything else)
//! 2. load and validate directives (fails before any remote call)
//! 3. warn about duplicate desired names
//! 4. fetch the full device snapshot (fails the run)
//! 5. classify and execute; per-device failures become `Failed` rows
//! 6. print the summary, write the report

use std::path::{Path, PathBuf};

use enrollname_directory::DirectoryClient;
use enrollname_recon::classify::Plan;
use enrollname_recon::duplicates::find_duplicate_names;
use enrollname_recon::load::{load_directives_file, LoadedDirectives};
use enrollname_recon::model::{DuplicateGroup, ShadowedDevice};
use enrollname_recon::report::{open_output, REPORT_STEM};
use enrollname_recon::{plan, DecisionStatus, ReconPolicy, ReconResult};
use tracing::info;

use crate::executor::{Confirmer, DirectoryExecutor, ExecMode, NameUpdater};
use crate::exit_codes::{EXIT_INPUT_DUPLICATES, EXIT_PARTIAL_APPLY};
use crate::util::{pad_left, pad_right};
use crate::CliError;

/// Everything `apply` needs from the command line.
#[derive(Debug, Clone)]
pub struct ApplyOptions {
    pub input: PathBuf,
    pub force: bool,
    pub mode: ExecMode,
    pub output: Option<PathBuf>,
    pub json: bool,
    pub strict: bool,
}

/// What a completed run produced.
#[derive(Debug)]
pub struct ApplyOutcome {
    pub result: ReconResult,
    pub report_path: PathBuf,
}

/// Run the apply pipeline.
///
/// `connect` is called only after the report file has been created and the
/// directive file validated.
pub fn run_apply(
    opts: &ApplyOptions,
    default_output_dir: &Path,
    connect: impl FnOnce() -> Result<DirectoryClient, CliError>,
    confirmer: Option<Box<dyn Confirmer + '_>>,
) -> Result<ApplyOutcome, CliError> {
    let now = chrono::Local::now().naive_local();
    let report = open_output(opts.output.as_deref(), default_output_dir, REPORT_STEM, now)?;

    let loaded = load_directives_file(&opts.input)?;
    print_load_stats(&opts.input, &loaded);

    let duplicates = find_duplicate_names(
        loaded
            .directives
            .iter()
            .map(|d| (d.serial_number.as_str(), d.desired_name.as_str())),
    );
    if !duplicates.is_empty() {
        print_duplicate_warning(duplicates.groups());
    }

    let client = connect()?;
    eprintln!("fetching devices from directory...");
    let devices = client.fetch_all_devices()?;
    eprintln!("fetched {} devices", devices.len());

    let result = execute(&client, &devices, &loaded, opts, confirmer);

    if !result.shadowed.is_empty() {
        print_shadowed_warning(&result.shadowed);
    }
    print_summary(&result, opts.mode);

    let report_path = report.write_report(&result.decisions)?;
    info!("report written to {}", report_path.display());

    if opts.json {
        let json_str = serde_json::to_string_pretty(&result)
            .map_err(|e| CliError::general(format!("JSON serialization error: {e}")))?;
        println!("{json_str}");
    }

    eprintln!("wrote {}", report_path.display());

    if opts.strict && result.summary.failed > 0 {
        return Err(CliError::new(
            EXIT_PARTIAL_APPLY,
            format!("{} of {} updates failed", result.summary.failed, result.summary.total),
        )
        .with_hint(format!("see the Error column in {}", report_path.display())));
    }

    Ok(ApplyOutcome { result, report_path })
}

fn execute<'a>(
    updater: &'a dyn NameUpdater,
    devices: &'a [enrollname_recon::RemoteDevice],
    loaded: &LoadedDirectives,
    opts: &ApplyOptions,
    confirmer: Option<Box<dyn Confirmer + 'a>>,
) -> ReconResult {
    let policy = ReconPolicy { force_update: opts.force };
    let mut executor = DirectoryExecutor::new(updater, opts.mode).with_devices(devices);
    if let Some(confirmer) = confirmer {
        executor = executor.with_confirmer(confirmer);
    }
    let result = enrollname_recon::run(devices, &loaded.directives, &policy, &mut executor);

    if opts.mode == ExecMode::Simulate {
        for (device_id, desired_name) in executor.would_apply() {
            eprintln!("  would rename {device_id} to {desired_name}");
        }
    }
    result
}

/// `enrollname validate`: load and classify against an empty snapshot, no
/// remote calls. Only duplicate names can settle a row here.
pub fn run_validate(input: &Path, json: bool) -> Result<(), CliError> {
    let loaded = load_directives_file(input)?;
    let planned = plan(&[], &loaded.directives, &ReconPolicy::default());
    let duplicate_rows = planned
        .entries
        .iter()
        .filter(|e| matches!(e, Plan::Settled(d) if d.status == DecisionStatus::DuplicateName))
        .count();
    let groups = planned.duplicates.groups();

    if json {
        let out = serde_json::json!({
            "input": input.display().to_string(),
            "name_column": loaded.name_column.as_str(),
            "directives": loaded.directives.len(),
            "rows_read": loaded.stats.rows_read,
            "dropped_blank": loaded.stats.dropped_blank,
            "replaced": loaded.stats.replaced,
            "duplicate_rows": duplicate_rows,
            "duplicates": groups,
        });
        let json_str = serde_json::to_string_pretty(&out)
            .map_err(|e| CliError::general(format!("JSON serialization error: {e}")))?;
        println!("{json_str}");
    }

    print_load_stats(input, &loaded);

    if groups.is_empty() {
        eprintln!("ok: {} directives, no duplicate names", loaded.directives.len());
        return Ok(());
    }

    print_duplicate_warning(groups);
    Err(CliError::new(
        EXIT_INPUT_DUPLICATES,
        format!("{} duplicate desired names across {} rows", groups.len(), duplicate_rows),
    )
    .with_hint("every desired name must be unique (case-insensitive); duplicated rows are never applied"))
}

// ---------------------------------------------------------------------------
// Console output (stderr)
// ---------------------------------------------------------------------------

fn print_load_stats(input: &Path, loaded: &LoadedDirectives) {
    eprintln!(
        "loaded {} directives from {} ({} column)",
        loaded.directives.len(),
        input.display(),
        loaded.name_column.as_str(),
    );
    if loaded.stats.dropped_blank > 0 {
        eprintln!(
            "note: skipped {} rows with a blank serial or name",
            loaded.stats.dropped_blank
        );
    }
    if loaded.stats.replaced > 0 {
        eprintln!(
            "note: {} repeated serials; the last row for each serial wins",
            loaded.stats.replaced
        );
    }
}

fn print_duplicate_warning(groups: &[DuplicateGroup]) {
    eprintln!(
        "warning: {} desired names appear more than once; those rows will not be applied",
        groups.len()
    );
    for g in groups {
        eprintln!(
            "  {} ({} rows, e.g. serial {})",
            g.name_key, g.count, g.first_serial
        );
    }
}

fn print_shadowed_warning(shadowed: &[ShadowedDevice]) {
    eprintln!(
        "warning: {} directory records share a serial with an earlier record and were ignored",
        shadowed.len()
    );
    for s in shadowed {
        eprintln!("  {}: using {}, ignoring {}", s.serial_number, s.kept_id, s.shadowed_id);
    }
}

/// Per-status count table.
fn summary_lines(result: &ReconResult) -> Vec<String> {
    DecisionStatus::ALL
        .iter()
        .map(|status| {
            let count = result.summary.count(*status).to_string();
            format!("  {} {}", pad_right(status.as_str(), 14), pad_left(&count, 6))
        })
        .collect()
}

fn print_summary(result: &ReconResult, mode: ExecMode) {
    let label = match mode {
        ExecMode::Apply => "apply",
        ExecMode::Simulate => "simulate",
        ExecMode::Confirm => "confirm",
    };
    eprintln!(
        "{} run: {} directives against {} devices{}",
        label,
        result.summary.total,
        result.meta.device_count,
        if result.meta.force_update { " (force)" } else { "" },
    );
    for line in summary_lines(result) {
        eprintln!("{line}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use enrollname_recon::{run, DirectiveSet, RemoteDevice, SimulateOnly};

    #[test]
    fn summary_table_lists_every_status() {
        let devices = vec![RemoteDevice::new("d1", "A", "")];
        let dirs: DirectiveSet = [("A", "PC-1"), ("B", "PC-2")].into_iter().collect();
        let mut sim = SimulateOnly::default();
        let result = run(&devices, &dirs, &ReconPolicy::default(), &mut sim);

        let lines = summary_lines(&result);
        assert_eq!(lines.len(), DecisionStatus::ALL.len());
        assert_eq!(lines[1], "  NoDeviceFound       1");
        assert_eq!(lines[5], "  Simulated           1");
    }
}
