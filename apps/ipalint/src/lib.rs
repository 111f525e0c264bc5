//! ipalint core library.
//!
//! This crate exposes programmatic APIs for linting iOS application packages
//! against YAML/TOML rule configurations, recording content snapshots, and
//! comparing them.
//!
//! High-level modules:
//! - `cli`: CLI argument parsing (binary uses this).
//! - `config`: Discovery and loading of `.ipalint.*` files.
//! - `lint`: Rule selection, configuration and evaluation.
//! - `rules`: Rule traits, registry, and the built-in rules.
//! - `models`: Severity, violations, and lint report structs.
//! - `package`: Archives, extraction workspaces, and extracted content.
//! - `entitlements`: Code-signing entitlement reader.
//! - `snapshot` / `diff`: Content manifests and their comparison.
//! - `info`: Package overview.
//! - `output`: Human/JSON printers.
//! - `size`, `digest`, `fsutil`, `cancel`: Supporting value types and helpers.
//! - `error`: Error taxonomy.
pub mod cancel;
pub mod cli;
pub mod config;
pub mod diff;
pub mod digest;
pub mod entitlements;
pub mod error;
pub mod fsutil;
pub mod info;
pub mod lint;
pub mod models;
pub mod output;
pub mod package;
pub mod rules;
pub mod size;
pub mod snapshot;
