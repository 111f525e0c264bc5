//! CLI argument parsing via `clap`.

use crate::output::OutputMode;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "ipalint",
    version,
    about = "Lint, inspect, snapshot, and diff iOS application packages",
    long_about = "ipalint checks .ipa archives against size, framework, file-extension, and entitlement rules, and records content manifests for comparing builds.\n\nConfiguration: --config, otherwise the closest .ipalint.yml|.ipalint.yaml|.ipalint.toml.",
    after_help = "Examples:\n  ipalint lint App.ipa\n  ipalint info App.ipa --output json\n  ipalint snapshot App.ipa --out app.snapshot.json\n  ipalint diff old.snapshot.json App.ipa",
    arg_required_else_help = true
)]
/// Top-level CLI options and subcommands.
pub struct Cli {
    #[arg(long, short, global = true, help = "Enable debug logging on stderr")]
    pub verbose: bool,
    #[command(subcommand)]
    pub cmd: Commands,
}

#[derive(Subcommand)]
/// Supported subcommands.
pub enum Commands {
    /// Lint a package against the configured rules
    #[command(
        about = "Run lint rules",
        long_about = "Evaluate the rules listed under all.rules in the configuration. Exits non-zero when any error-severity violation is reported.",
        after_help = "Examples:\n  ipalint lint App.ipa\n  ipalint lint App.ipa --config ci/.ipalint.yml --output json"
    )]
    Lint {
        #[arg(help = "Path to the .ipa archive")]
        ipa: PathBuf,
        #[arg(long, help = "Configuration file (default: closest .ipalint.yml)")]
        config: Option<PathBuf>,
        #[arg(long, value_enum, default_value_t = OutputMode::Human, help = "Output mode")]
        output: OutputMode,
    },
    /// Show a package overview
    #[command(
        about = "Describe a package",
        long_about = "Print archive and bundle sizes, selected Info.plist keys, and embedded frameworks."
    )]
    Info {
        #[arg(help = "Path to the .ipa archive")]
        ipa: PathBuf,
        #[arg(long, value_enum, default_value_t = OutputMode::Human, help = "Output mode")]
        output: OutputMode,
    },
    /// Record a content manifest
    #[command(
        about = "Write a snapshot",
        long_about = "Hash every file of the extracted package and write the manifest as JSON.",
        after_help = "Examples:\n  ipalint snapshot App.ipa\n  ipalint snapshot App.ipa --out build-42.json"
    )]
    Snapshot {
        #[arg(help = "Path to the .ipa archive")]
        ipa: PathBuf,
        #[arg(long, help = "Write to this file instead of stdout")]
        out: Option<PathBuf>,
    },
    /// Compare two packages or snapshots
    #[command(
        about = "Diff two snapshots",
        long_about = "Each side is a snapshot .json file or an .ipa archive snapshotted on the fly. Lists removed, added, and changed files with size deltas.",
        after_help = "Examples:\n  ipalint diff old.json new.json\n  ipalint diff old.json App.ipa --output json"
    )]
    Diff {
        #[arg(help = "First snapshot (.json) or archive (.ipa)")]
        first: PathBuf,
        #[arg(help = "Second snapshot (.json) or archive (.ipa)")]
        second: PathBuf,
        #[arg(long, value_enum, default_value_t = OutputMode::Human, help = "Output mode")]
        output: OutputMode,
    },
}
