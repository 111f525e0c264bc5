//! Dynamic framework set rule.
//!
//! Observed set: names of `<app>/Frameworks/*.framework` directories with
//! the extension dropped.
//!
//! `include` fires when any required framework is missing from the observed
//! set. `exclude` fires when the observed set and the forbidden set overlap.

use super::{list, ContentRule, ContentSubject, Rule, RuleConfiguration};
use crate::error::{ConfigError, EvalError};
use crate::models::{LintRuleResult, RuleDescriptor, Violation};
use crate::package::Content;
use serde::Deserialize;
use serde_yaml::Value as Yaml;
use std::collections::BTreeSet;
use std::fs;
use std::io;

pub const IDENTIFIER: &str = "frameworks";

const FRAMEWORK_EXT: &str = ".framework";

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FrameworksSettings {
    pub max_count: Option<usize>,
    pub min_count: Option<usize>,
    pub exact_count: Option<usize>,
    pub list: Option<BTreeSet<String>>,
    pub include: Option<BTreeSet<String>>,
    pub exclude: Option<BTreeSet<String>>,
}

/// Names of the frameworks embedded in the app bundle, sorted.
pub fn embedded_frameworks(content: &Content) -> io::Result<BTreeSet<String>> {
    let dir = content.frameworks_dir();
    if !dir.is_dir() {
        return Ok(BTreeSet::new());
    }
    let mut names = BTreeSet::new();
    for entry in fs::read_dir(&dir)? {
        let entry = entry?;
        if !entry.file_type()?.is_dir() {
            continue;
        }
        let name = entry.file_name().to_string_lossy().into_owned();
        if let Some(stem) = name.strip_suffix(FRAMEWORK_EXT) {
            names.insert(stem.to_string());
        }
    }
    Ok(names)
}

pub fn check_frameworks(
    config: &RuleConfiguration<FrameworksSettings>,
    observed: &BTreeSet<String>,
) -> Vec<Violation> {
    let count = observed.len();
    let mut out = Vec::new();
    for (sev, s) in config.tiers() {
        if let Some(max) = s.max_count {
            if count > max {
                out.push(Violation::new(
                    sev,
                    format!("too many frameworks, max_count={max}, count={count}"),
                ));
            }
        }
        if let Some(min) = s.min_count {
            if count < min {
                out.push(Violation::new(
                    sev,
                    format!("too few frameworks, min_count={min}, count={count}"),
                ));
            }
        }
        if let Some(exact) = s.exact_count {
            if count != exact {
                out.push(Violation::new(
                    sev,
                    format!("unexpected number of frameworks, exact_count={exact}, count={count}"),
                ));
            }
        }
        if let Some(expected) = &s.list {
            if expected != observed {
                let missing = expected.difference(observed);
                let unexpected = observed.difference(expected);
                out.push(Violation::new(
                    sev,
                    format!(
                        "frameworks do not match list, missing={}, unexpected={}",
                        list(missing),
                        list(unexpected)
                    ),
                ));
            }
        }
        if let Some(required) = &s.include {
            if !required.is_subset(observed) {
                out.push(Violation::new(
                    sev,
                    format!(
                        "required frameworks are missing, missing={}",
                        list(required.difference(observed))
                    ),
                ));
            }
        }
        if let Some(forbidden) = &s.exclude {
            let present: Vec<&String> = forbidden.intersection(observed).collect();
            if !present.is_empty() {
                out.push(Violation::new(
                    sev,
                    format!("forbidden frameworks are present, forbidden={}", list(present)),
                ));
            }
        }
    }
    out
}

#[derive(Debug, Default)]
pub struct FrameworksRule {
    config: RuleConfiguration<FrameworksSettings>,
}

impl Rule for FrameworksRule {
    fn descriptor(&self) -> RuleDescriptor {
        RuleDescriptor {
            identifier: IDENTIFIER,
            name: "Frameworks",
            description: "Checks the dynamic frameworks embedded in the app bundle.",
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

impl ContentRule for FrameworksRule {
    fn evaluate(&self, subject: &ContentSubject<'_>) -> Result<LintRuleResult, EvalError> {
        let observed = embedded_frameworks(subject.content)?;
        Ok(LintRuleResult {
            rule: self.descriptor(),
            violations: check_frameworks(&self.config, &observed),
        })
    }
}
