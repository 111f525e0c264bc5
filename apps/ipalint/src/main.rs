//! ipalint CLI binary entry point.
//! Delegates to the library for lint/info/snapshot/diff and prints results.

use clap::Parser;
use ipalint::cancel::CancelToken;
use ipalint::cli::{Cli, Commands};
use ipalint::error::Result;
use ipalint::lint::Collaborators;
use ipalint::package::{Package, Workspace, ZipExtractor};
use ipalint::snapshot::Snapshot;
use ipalint::{config, diff, info, lint, output};
use log::debug;
use owo_colors::OwoColorize;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);
    let code = match run(cli.cmd) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("{} {e}", error_prefix());
            1
        }
    };
    std::process::exit(code);
}

fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default)).init();
}

fn error_prefix() -> String {
    if std::env::var_os("NO_COLOR").is_none() {
        "error:".red().bold().to_string()
    } else {
        "error:".to_string()
    }
}

fn run(cmd: Commands) -> Result<i32> {
    let cancel = CancelToken::new();
    let stdout = io::stdout();
    let mut out = stdout.lock();
    match cmd {
        Commands::Lint {
            ipa,
            config,
            output,
        } => {
            let cwd = std::env::current_dir()?;
            let cfg = config::resolve(config.as_deref(), &cwd)?;
            debug!("using configuration {}", cfg.path.display());
            let report = lint::run(&cfg, &ipa, &Collaborators::default(), &cancel)?;
            output::print_lint(&mut out, &report, output)?;
            Ok(if report.has_errors() { 1 } else { 0 })
        }
        Commands::Info { ipa, output } => {
            let package = Package::open(&ipa)?;
            let workspace = Workspace::extract(&package, &ZipExtractor, &cancel)?;
            let info = info::collect(&package, &workspace.content()?)?;
            output::print_info(&mut out, &info, output)?;
            Ok(0)
        }
        Commands::Snapshot { ipa, out: target } => {
            let snapshot = snapshot_of(&ipa, &cancel)?;
            match target {
                Some(path) => {
                    let mut file = BufWriter::new(File::create(&path)?);
                    snapshot.write_to(&mut file)?;
                    file.flush()?;
                }
                None => snapshot.write_to(&mut out)?,
            }
            Ok(0)
        }
        Commands::Diff {
            first,
            second,
            output,
        } => {
            let a = snapshot_of(&first, &cancel)?;
            let b = snapshot_of(&second, &cancel)?;
            let d = diff::diff(&a, &b)?;
            output::print_diff(&mut out, &a, &b, &d, output)?;
            Ok(0)
        }
    }
}

/// Load a persisted snapshot, or snapshot an archive on the fly.
fn snapshot_of(path: &Path, cancel: &CancelToken) -> Result<Snapshot> {
    if path.extension().is_some_and(|e| e == "json") {
        return Ok(Snapshot::load(path)?);
    }
    let package = Package::open(path)?;
    let workspace = Workspace::extract(&package, &ZipExtractor, cancel)?;
    Ok(Snapshot::generate(&package, workspace.tree(), cancel)?)
}
