// enrollname - apply a device naming convention to an Autopilot-style directory

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{ArgAction, Parser, Subcommand};

use enrollname_cli::apply::{run_apply, run_validate, ApplyOptions};
use enrollname_cli::config_cmd::{cmd_config, ConfigCommands};
use enrollname_cli::executor::{Confirmer, ExecMode, PromptConfirmer};
use enrollname_cli::exit_codes::EXIT_SUCCESS;
use enrollname_cli::export::run_export;
use enrollname_cli::{directory, logging, CliError};
use enrollname_config::Settings;

#[derive(Parser)]
#[command(name = "enrollname")]
#[command(about = "Apply a device naming convention to an Autopilot provisioning directory")]
#[command(long_version = long_version())]
#[command(version)]
struct Cli {
    /// More log output (-v info, -vv debug). RUST_LOG overrides.
    #[arg(short, long, global = true, action = ArgAction::Count)]
    verbose: u8,

    /// Pre-issued bearer token; skips the client-credentials flow
    #[arg(long, global = true, env = "ENROLLNAME_ACCESS_TOKEN", hide_env_values = true)]
    access_token: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Export every directory device to CSV
    #[command(after_help = "\
The export's SerialNumber and DisplayName columns can be edited and fed
straight back to `enrollname apply`.

Examples:
  enrollname export
  enrollname export --output devices.csv
  enrollname export --output reports/")]
    Export {
        /// Output file or directory (default: settings output.directory)
        #[arg(long, short = 'o')]
        output: Option<PathBuf>,

        /// Print a JSON summary to stdout
        #[arg(long)]
        json: bool,
    },

    /// Rename directory devices from a serial-to-name CSV
    #[command(after_help = "\
Input: CSV with a SerialNumber column and a DesiredName (or DisplayName)
column. Devices that already carry a different name are left alone unless
--force is given.

Every run writes a report CSV with one row per directive.

Exit codes:
  0   run completed (see report for per-device status)
  2   usage error or unusable --output
  60  directive file invalid
  62  --strict and at least one update failed
  70+ directory not configured / auth / validation / throttled / upstream

Examples:
  enrollname apply names.csv --simulate
  enrollname apply names.csv --confirm
  enrollname apply names.csv --force --output reports/ --strict")]
    Apply {
        /// Directive CSV
        input: PathBuf,

        /// Overwrite names that are already set to something else
        #[arg(long)]
        force: bool,

        /// Classify and report, send nothing
        #[arg(long, conflicts_with = "confirm")]
        simulate: bool,

        /// Ask before each update (interactive terminal only)
        #[arg(long)]
        confirm: bool,

        /// Report file or directory (default: settings output.directory)
        #[arg(long, short = 'o')]
        output: Option<PathBuf>,

        /// Print the full result as JSON to stdout
        #[arg(long)]
        json: bool,

        /// Exit 62 if any update failed
        #[arg(long)]
        strict: bool,
    },

    /// Check a directive CSV without contacting the directory
    #[command(after_help = "\
Exits 61 if two rows ask for the same name (case-insensitive).

Examples:
  enrollname validate names.csv")]
    Validate {
        /// Directive CSV
        input: PathBuf,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Settings and client secret
    #[command(subcommand)]
    Config(ConfigCommands),
}

fn long_version() -> &'static str {
    concat!(
        env!("CARGO_PKG_VERSION"),
        " (", env!("GIT_COMMIT_HASH"), ")",
        "\ntarget:  ", env!("TARGET"),
    )
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    logging::init(cli.verbose);

    let settings = Settings::load();
    let access_token = cli.access_token.as_deref();
    let output_dir = settings.effective_output_dir();

    let result = match cli.command {
        Commands::Export { output, json } => run_export(
            output.as_deref(),
            &output_dir,
            || directory::connect(&settings, access_token),
            json,
        )
        .map(|_| ()),
        Commands::Apply { input, force, simulate, confirm, output, json, strict } => {
            cmd_apply(ApplyOptions {
                input,
                force,
                mode: exec_mode(simulate, confirm),
                output,
                json,
                strict,
            }, &settings, access_token)
        }
        Commands::Validate { input, json } => run_validate(&input, json),
        Commands::Config(cmd) => cmd_config(cmd, &settings),
    };

    match result {
        Ok(()) => ExitCode::from(EXIT_SUCCESS),
        Err(CliError { code, message, hint }) => {
            if !message.is_empty() {
                eprintln!("error: {}", message);
            }
            if let Some(hint) = hint {
                eprintln!("hint:  {}", hint);
            }
            ExitCode::from(code)
        }
    }
}

fn exec_mode(simulate: bool, confirm: bool) -> ExecMode {
    if simulate {
        ExecMode::Simulate
    } else if confirm {
        ExecMode::Confirm
    } else {
        ExecMode::Apply
    }
}

fn cmd_apply(opts: ApplyOptions, settings: &Settings, access_token: Option<&str>) -> Result<(), CliError> {
    let stdin = std::io::stdin();
    let confirmer: Option<Box<dyn Confirmer>> = if opts.mode == ExecMode::Confirm {
        if !atty::is(atty::Stream::Stdin) {
            return Err(CliError::args("--confirm needs an interactive terminal")
                .with_hint("use --simulate to preview, or drop --confirm to apply without prompts"));
        }
        Some(Box::new(PromptConfirmer::new(stdin.lock())))
    } else {
        None
    };

    run_apply(
        &opts,
        &settings.effective_output_dir(),
        || directory::connect(settings, access_token),
        confirmer,
    )
    .map(|_| ())
}
