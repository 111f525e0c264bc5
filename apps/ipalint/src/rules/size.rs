//! Size-bound rules for the archive and the app bundle.
//!
//! Bounds are inclusive: a measurement equal to `min_size` or `max_size`
//! passes. Each tier checks min then max, so one evaluation can yield up to
//! four violations.

use super::{ContentRule, ContentSubject, PackageRule, Rule, RuleConfiguration};
use crate::error::{ConfigError, EvalError};
use crate::fsutil;
use crate::models::{LintRuleResult, RuleDescriptor, Violation};
use crate::package::Package;
use crate::size::FileSize;
use serde::Deserialize;
use serde_yaml::Value as Yaml;

pub const IPA_FILE_SIZE: &str = "ipa_file_size";
pub const APPLICATION_SIZE: &str = "application_size";

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SizeSettings {
    pub min_size: Option<FileSize>,
    pub max_size: Option<FileSize>,
}

/// Shared bound check. `subject` names the measured thing in messages and
/// `key` labels the measured value (`ipa_size=...`).
pub fn check_size(
    config: &RuleConfiguration<SizeSettings>,
    measured: FileSize,
    subject: &str,
    key: &str,
) -> Vec<Violation> {
    let mut violations = Vec::new();
    for (severity, settings) in config.tiers() {
        if let Some(min) = settings.min_size {
            if measured < min {
                violations.push(Violation::new(
                    severity,
                    format!("{subject} is smaller than min_size, min_size={min}, {key}={measured}"),
                ));
            }
        }
        if let Some(max) = settings.max_size {
            if measured > max {
                violations.push(Violation::new(
                    severity,
                    format!("{subject} is bigger than max_size, max_size={max}, {key}={measured}"),
                ));
            }
        }
    }
    violations
}

#[derive(Debug, Default)]
pub struct IpaFileSizeRule {
    config: RuleConfiguration<SizeSettings>,
}

impl Rule for IpaFileSizeRule {
    fn descriptor(&self) -> RuleDescriptor {
        RuleDescriptor {
            identifier: IPA_FILE_SIZE,
            name: "IPA file size",
            description: "Checks the size of the .ipa archive against min/max bounds.",
        }
    }

    fn configure(&mut self, raw: &Yaml) -> Result<(), ConfigError> {
        self.config = RuleConfiguration::parse(IPA_FILE_SIZE, raw)?;
        Ok(())
    }

    fn is_enabled(&self) -> bool {
        self.config.enabled
    }
}

impl PackageRule for IpaFileSizeRule {
    fn evaluate(&self, package: &Package) -> Result<LintRuleResult, EvalError> {
        Ok(LintRuleResult {
            rule: self.descriptor(),
            violations: check_size(&self.config, package.size, "IPA file", "ipa_size"),
        })
    }
}

#[derive(Debug, Default)]
pub struct ApplicationSizeRule {
    config: RuleConfiguration<SizeSettings>,
}

impl Rule for ApplicationSizeRule {
    fn descriptor(&self) -> RuleDescriptor {
        RuleDescriptor {
            identifier: APPLICATION_SIZE,
            name: "Application size",
            description: "Checks the unpacked size of the .app bundle against min/max bounds.",
        }
    }

    fn configure(&mut self, raw: &Yaml) -> Result<(), ConfigError> {
        self.config = RuleConfiguration::parse(APPLICATION_SIZE, raw)?;
        Ok(())
    }

    fn is_enabled(&self) -> bool {
        self.config.enabled
    }
}

impl ContentRule for ApplicationSizeRule {
    fn evaluate(&self, subject: &ContentSubject<'_>) -> Result<LintRuleResult, EvalError> {
        let measured = fsutil::directory_size(&subject.content.app)?;
        Ok(LintRuleResult {
            rule: self.descriptor(),
            violations: check_size(&self.config, measured, "Application", "app_size"),
        })
    }
}
