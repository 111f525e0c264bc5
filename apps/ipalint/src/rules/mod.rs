//! Rule abstraction, per-rule configuration and the built-in registry.
//!
//! Rules come in two shapes. Package rules look at the archive itself;
//! content rules look at the extracted tree. [`LintRule`] is the sum of the
//! two so the engine branches once per rule to pick the right subject.
//!
//! Every rule is configurable. Its raw YAML sub-tree deserializes into a
//! [`RuleConfiguration`] carrying an `enabled` flag and optional `warning`
//! and `error` blocks of the same settings shape. Each block is checked on
//! its own, so both can fire for the same condition.

pub mod entitlements;
pub mod file_extensions;
pub mod frameworks;
pub mod size;

use crate::entitlements::EntitlementsReader;
use crate::error::{ConfigError, EvalError};
use crate::models::{LintRuleResult, RuleDescriptor, Severity};
use crate::package::{Content, Package};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_yaml::Value as Yaml;
use std::collections::BTreeMap;

/// Behaviour common to both rule shapes.
pub trait Rule: Send + Sync {
    fn descriptor(&self) -> RuleDescriptor;

    /// Replace the rule's configuration with `raw`, parsed into its typed
    /// settings. Fails with [`ConfigError::Malformed`] on a shape mismatch.
    fn configure(&mut self, raw: &Yaml) -> Result<(), ConfigError>;

    fn is_enabled(&self) -> bool;
}

/// A rule evaluated against the archive file.
pub trait PackageRule: Rule {
    fn evaluate(&self, package: &Package) -> Result<LintRuleResult, EvalError>;
}

/// What content rules see: the extracted tree plus the collaborators that
/// read metadata out of it.
pub struct ContentSubject<'a> {
    pub content: &'a Content,
    pub entitlements: &'a dyn EntitlementsReader,
}

/// A rule evaluated against the extracted tree.
pub trait ContentRule: Rule {
    fn evaluate(&self, subject: &ContentSubject<'_>) -> Result<LintRuleResult, EvalError>;
}

pub enum LintRule {
    Package(Box<dyn PackageRule>),
    Content(Box<dyn ContentRule>),
}

impl LintRule {
    pub fn descriptor(&self) -> RuleDescriptor {
        match self {
            LintRule::Package(r) => r.descriptor(),
            LintRule::Content(r) => r.descriptor(),
        }
    }

    pub fn configure(&mut self, raw: &Yaml) -> Result<(), ConfigError> {
        match self {
            LintRule::Package(r) => r.configure(raw),
            LintRule::Content(r) => r.configure(raw),
        }
    }

    pub fn is_enabled(&self) -> bool {
        match self {
            LintRule::Package(r) => r.is_enabled(),
            LintRule::Content(r) => r.is_enabled(),
        }
    }
}

fn default_enabled() -> bool {
    true
}

/// Typed configuration of one rule.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields, bound(deserialize = "S: Deserialize<'de>"))]
pub struct RuleConfiguration<S> {
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    #[serde(default)]
    pub warning: Option<S>,
    #[serde(default)]
    pub error: Option<S>,
}

impl<S> Default for RuleConfiguration<S> {
    fn default() -> Self {
        Self {
            enabled: true,
            warning: None,
            error: None,
        }
    }
}

impl<S: DeserializeOwned> RuleConfiguration<S> {
    /// Decode a rule's raw sub-tree. `null` (a bare `rule:` key) means
    /// enabled with nothing configured.
    pub fn parse(rule: &str, raw: &Yaml) -> Result<Self, ConfigError> {
        if raw.is_null() {
            return Ok(Self::default());
        }
        serde_yaml::from_value(raw.clone()).map_err(|e| ConfigError::Malformed {
            rule: rule.to_string(),
            reason: e.to_string(),
        })
    }
}

impl<S> RuleConfiguration<S> {
    /// Configured tiers, warning first.
    pub fn tiers(&self) -> impl Iterator<Item = (Severity, &S)> {
        self.warning
            .iter()
            .map(|s| (Severity::Warning, s))
            .chain(self.error.iter().map(|s| (Severity::Error, s)))
    }
}

/// Render a sorted set as `[a, b]` for violation messages.
pub(crate) fn list<'a>(items: impl IntoIterator<Item = &'a String>) -> String {
    format!(
        "[{}]",
        items
            .into_iter()
            .map(String::as_str)
            .collect::<Vec<_>>()
            .join(", ")
    )
}

type RuleFactory = fn() -> LintRule;

/// Identifier → constructor for every built-in rule. Each lookup builds a
/// fresh instance, so configuration never leaks between runs.
pub struct Registry {
    factories: BTreeMap<&'static str, RuleFactory>,
}

impl Registry {
    pub fn builtin() -> Self {
        let mut factories: BTreeMap<&'static str, RuleFactory> = BTreeMap::new();
        factories.insert(size::IPA_FILE_SIZE, || {
            LintRule::Package(Box::new(size::IpaFileSizeRule::default()))
        });
        factories.insert(size::APPLICATION_SIZE, || {
            LintRule::Content(Box::new(size::ApplicationSizeRule::default()))
        });
        factories.insert(frameworks::IDENTIFIER, || {
            LintRule::Content(Box::new(frameworks::FrameworksRule::default()))
        });
        factories.insert(file_extensions::IDENTIFIER, || {
            LintRule::Content(Box::new(file_extensions::FileExtensionsRule::default()))
        });
        factories.insert(entitlements::IDENTIFIER, || {
            LintRule::Content(Box::new(entitlements::EntitlementsRule::default()))
        });
        Self { factories }
    }

    pub fn create(&self, identifier: &str) -> Option<LintRule> {
        self.factories.get(identifier).map(|make| make())
    }

    pub fn identifiers(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.factories.keys().copied()
    }
}
