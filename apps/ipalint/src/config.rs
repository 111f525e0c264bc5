//! Configuration discovery and rule-settings resolution.
//!
//! ipalint reads `.ipalint.yml|yaml|toml` from the working directory (or the
//! closest ancestor), unless `--config` names a file explicitly. The file is
//! parsed once into an untyped YAML tree; TOML input is converted into the
//! same tree. Rules later decode their own sub-trees.
//!
//! Layout:
//! ```yaml
//! all:
//!   rules:
//!     ipa_file_size:
//!       warning: { max_size: 80 MB }
//!       error: { max_size: 100 MB }
//!     frameworks:
//!       enabled: false
//! ```

use crate::error::ConfigError;
use log::{debug, warn};
use serde_yaml::Value as Yaml;
use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Candidate file names, in lookup order.
pub const CONFIG_FILES: [&str; 3] = [".ipalint.yml", ".ipalint.yaml", ".ipalint.toml"];

#[derive(Debug, Clone)]
pub struct Config {
    pub path: PathBuf,
    pub tree: Yaml,
}

/// Walk upward from `start` looking for a config file.
pub fn discover(start: &Path) -> Option<PathBuf> {
    let mut cur = Some(start);
    while let Some(dir) = cur {
        for name in CONFIG_FILES {
            let candidate = dir.join(name);
            if candidate.is_file() {
                return Some(candidate);
            }
        }
        cur = dir.parent();
    }
    None
}

/// Pick the configuration: explicit path first, then discovery from `start`.
pub fn resolve(explicit: Option<&Path>, start: &Path) -> Result<Config, ConfigError> {
    let path = match explicit {
        Some(p) => p.to_path_buf(),
        None => discover(start).ok_or_else(|| ConfigError::FileNotFound {
            path: start.join(CONFIG_FILES[0]),
        })?,
    };
    Config::load(&path)
}

impl Config {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path).map_err(|e| match e.kind() {
            io::ErrorKind::NotFound => ConfigError::FileNotFound {
                path: path.to_path_buf(),
            },
            _ => ConfigError::ParseFailed {
                path: path.to_path_buf(),
                reason: e.to_string(),
            },
        })?;
        let is_toml = path.extension().is_some_and(|e| e == "toml");
        let parsed = if is_toml {
            parse_toml(&text)
        } else {
            serde_yaml::from_str::<Yaml>(&text).map_err(|e| e.to_string())
        };
        let tree = parsed.map_err(|reason| ConfigError::ParseFailed {
            path: path.to_path_buf(),
            reason,
        })?;
        debug!("loaded configuration from {}", path.display());
        Ok(Self {
            path: path.to_path_buf(),
            tree,
        })
    }

    /// The `all.rules` mapping keyed by rule identifier, sorted.
    pub fn rule_settings(&self) -> Result<BTreeMap<String, Yaml>, ConfigError> {
        let parse_failed = |reason: &str| ConfigError::ParseFailed {
            path: self.path.clone(),
            reason: reason.to_string(),
        };
        let Some(rules) = self.tree.get("all").and_then(|all| all.get("rules")) else {
            warn!("{} has no all.rules section; nothing to lint", self.path.display());
            return Ok(BTreeMap::new());
        };
        if rules.is_null() {
            return Ok(BTreeMap::new());
        }
        let mapping = rules
            .as_mapping()
            .ok_or_else(|| parse_failed("all.rules must be a mapping"))?;
        let mut out = BTreeMap::new();
        for (key, value) in mapping {
            let id = key
                .as_str()
                .ok_or_else(|| parse_failed("rule identifiers must be strings"))?;
            out.insert(id.to_string(), value.clone());
        }
        Ok(out)
    }
}

fn parse_toml(text: &str) -> Result<Yaml, String> {
    let value: toml::Value = toml::from_str(text).map_err(|e| e.to_string())?;
    serde_yaml::to_value(value).map_err(|e| e.to_string())
}
