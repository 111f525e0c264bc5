//! Entitlement value rule.
//!
//! Each tier maps entitlement keys to an expected string or string array.
//! Arrays compare as sets. An observed value that is neither a string nor a
//! string array is an evaluation error, not a violation.

use super::{list, ContentRule, ContentSubject, Rule, RuleConfiguration};
use crate::entitlements::{PropertyMap, PropertyValue};
use crate::error::{ConfigError, EvalError};
use crate::models::{LintRuleResult, RuleDescriptor, Violation};
use serde::Deserialize;
use serde_yaml::Value as Yaml;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

pub const IDENTIFIER: &str = "entitlements";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum ExpectedValue {
    String(String),
    StringArray(Vec<String>),
}

impl fmt::Display for ExpectedValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExpectedValue::String(s) => f.write_str(s),
            ExpectedValue::StringArray(items) => f.write_str(&list(items)),
        }
    }
}

pub type EntitlementsSettings = BTreeMap<String, ExpectedValue>;

fn matches(expected: &ExpectedValue, observed: &PropertyValue) -> bool {
    match (expected, observed) {
        (ExpectedValue::String(e), PropertyValue::String(o)) => e == o,
        (ExpectedValue::StringArray(e), PropertyValue::StringArray(o)) => {
            e.iter().collect::<BTreeSet<_>>() == o.iter().collect::<BTreeSet<_>>()
        }
        _ => false,
    }
}

fn render(observed: &PropertyValue) -> String {
    match observed {
        PropertyValue::String(s) => s.clone(),
        PropertyValue::StringArray(items) => list(items),
        other => other.kind().to_string(),
    }
}

pub fn check_entitlements(
    config: &RuleConfiguration<EntitlementsSettings>,
    observed: &PropertyMap,
) -> Result<Vec<Violation>, EvalError> {
    let mut out = Vec::new();
    for (sev, expected) in config.tiers() {
        for (key, want) in expected {
            match observed.get(key) {
                None => out.push(Violation::new(
                    sev,
                    format!("entitlement is missing, key={key}, expected={want}"),
                )),
                Some(got @ (PropertyValue::String(_) | PropertyValue::StringArray(_))) => {
                    if !matches(want, got) {
                        out.push(Violation::new(
                            sev,
                            format!(
                                "entitlement value mismatch, key={key}, expected={want}, actual={}",
                                render(got)
                            ),
                        ));
                    }
                }
                Some(other) => {
                    return Err(EvalError::UnsupportedValue {
                        key: key.clone(),
                        kind: other.kind().to_string(),
                    })
                }
            }
        }
    }
    Ok(out)
}

#[derive(Debug, Default)]
pub struct EntitlementsRule {
    config: RuleConfiguration<EntitlementsSettings>,
}

impl Rule for EntitlementsRule {
    fn descriptor(&self) -> RuleDescriptor {
        RuleDescriptor {
            identifier: IDENTIFIER,
            name: "Entitlements",
            description: "Compares code-signing entitlements with expected values.",
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

impl ContentRule for EntitlementsRule {
    fn evaluate(&self, subject: &ContentSubject<'_>) -> Result<LintRuleResult, EvalError> {
        let violations = if self.config.tiers().next().is_none() {
            Vec::new()
        } else {
            let observed = subject.entitlements.entitlements(&subject.content.app)?;
            check_entitlements(&self.config, &observed)?
        };
        Ok(LintRuleResult {
            rule: self.descriptor(),
            violations,
        })
    }
}
