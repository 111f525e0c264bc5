//! Report data models shared by the lint engine and printers.

use serde::Serialize;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
/// Severity tier of a violation.
pub enum Severity {
    Warning,
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Severity::Warning => "warning",
            Severity::Error => "error",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
/// Stable identity of a rule.
pub struct RuleDescriptor {
    pub identifier: &'static str,
    pub name: &'static str,
    pub description: &'static str,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
/// A single finding with severity and message.
pub struct Violation {
    pub severity: Severity,
    pub message: String,
}

impl Violation {
    pub fn new(severity: Severity, message: impl Into<String>) -> Self {
        Self {
            severity,
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
/// Outcome of one rule; no violations means the rule passed.
pub struct LintRuleResult {
    pub rule: RuleDescriptor,
    pub violations: Vec<Violation>,
}

impl LintRuleResult {
    pub fn passed(&self) -> bool {
        self.violations.is_empty()
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
/// Aggregated counts used by printers and the exit status.
pub struct Summary {
    pub rules: usize,
    pub warnings: usize,
    pub errors: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
/// Lint results in ascending rule-identifier order.
pub struct LintReport {
    pub results: Vec<LintRuleResult>,
}

impl LintReport {
    pub fn summary(&self) -> Summary {
        let mut summary = Summary {
            rules: self.results.len(),
            ..Summary::default()
        };
        for v in self.results.iter().flat_map(|r| &r.violations) {
            match v.severity {
                Severity::Warning => summary.warnings += 1,
                Severity::Error => summary.errors += 1,
            }
        }
        summary
    }

    pub fn has_errors(&self) -> bool {
        self.summary().errors > 0
    }
}
