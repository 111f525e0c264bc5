//! File-extension allow/deny rule over the extracted tree.
//!
//! Matching is case-sensitive. Files without an extension never violate.
//! A leading `.` in configured extensions is ignored.

use super::{list, ContentRule, ContentSubject, Rule, RuleConfiguration};
use crate::error::{ConfigError, EvalError};
use crate::models::{LintRuleResult, RuleDescriptor, Violation};
use serde::Deserialize;
use serde_yaml::Value as Yaml;
use std::collections::BTreeSet;
use std::path::Path;

pub const IDENTIFIER: &str = "file_extensions";

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FileExtensionsSettings {
    pub expect_only: Option<BTreeSet<String>>,
    pub forbidden: Option<BTreeSet<String>>,
}

fn normalize(set: &BTreeSet<String>) -> BTreeSet<String> {
    set.iter()
        .map(|e| e.strip_prefix('.').unwrap_or(e).to_string())
        .collect()
}

pub fn check_extensions(
    config: &RuleConfiguration<FileExtensionsSettings>,
    files: &[String],
) -> Vec<Violation> {
    let mut out = Vec::new();
    for (sev, s) in config.tiers() {
        let allowed = s.expect_only.as_ref().map(normalize);
        let forbidden = s.forbidden.as_ref().map(normalize);
        for file in files {
            let Some(ext) = Path::new(file).extension().map(|e| e.to_string_lossy()) else {
                continue;
            };
            if let Some(allowed) = &allowed {
                if !allowed.contains(&*ext) {
                    out.push(Violation::new(
                        sev,
                        format!(
                            "file extension is not allowed, expect_only={}, extension={ext}, file={file}",
                            list(allowed)
                        ),
                    ));
                }
            }
            if let Some(forbidden) = &forbidden {
                if forbidden.contains(&*ext) {
                    out.push(Violation::new(
                        sev,
                        format!(
                            "file extension is forbidden, forbidden={}, extension={ext}, file={file}",
                            list(forbidden)
                        ),
                    ));
                }
            }
        }
    }
    out
}

#[derive(Debug, Default)]
pub struct FileExtensionsRule {
    config: RuleConfiguration<FileExtensionsSettings>,
}

impl Rule for FileExtensionsRule {
    fn descriptor(&self) -> RuleDescriptor {
        RuleDescriptor {
            identifier: IDENTIFIER,
            name: "File extensions",
            description: "Restricts which file extensions may appear in the package.",
        }
    }

    fn configure(&mut self, raw: &Yaml) -> Result<(), ConfigError> {
        self.config = RuleConfiguration::parse(IDENTIFIER, raw)?;
        Ok(())
    }

    fn is_enabled(&self) -> bool {
        self.config.enabled
    }
}

impl ContentRule for FileExtensionsRule {
    fn evaluate(&self, subject: &ContentSubject<'_>) -> Result<LintRuleResult, EvalError> {
        Ok(LintRuleResult {
            rule: self.descriptor(),
            violations: check_extensions(&self.config, &subject.content.files),
        })
    }
}
