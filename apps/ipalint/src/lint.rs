//! Lint engine: rule selection, configuration and evaluation.
//!
//! Only rules named in the configuration run. They are resolved in
//! ascending identifier order; an unknown identifier or a malformed rule
//! configuration fails the whole run before anything is evaluated. Disabled
//! rules are dropped from the report entirely. Any error during evaluation
//! also fails the run, so a report is either complete or absent.

use crate::cancel::CancelToken;
use crate::config::Config;
use crate::entitlements::{CodesignEntitlements, EntitlementsReader};
use crate::error::{ConfigError, CoreError, Result};
use crate::models::LintReport;
use crate::package::{Content, Extractor, Package, Workspace, ZipExtractor};
use crate::rules::{ContentSubject, LintRule, Registry};
use log::{debug, info};
use serde_yaml::Value as Yaml;
use std::collections::BTreeMap;
use std::path::Path;

/// External collaborators used by a lint run.
pub struct Collaborators {
    pub extractor: Box<dyn Extractor>,
    pub entitlements: Box<dyn EntitlementsReader>,
}

impl Default for Collaborators {
    fn default() -> Self {
        Self {
            extractor: Box::new(ZipExtractor),
            entitlements: Box::new(CodesignEntitlements),
        }
    }
}

/// Instantiate and configure every rule named in `settings`, in identifier
/// order, keeping only enabled ones.
pub fn prepare(
    registry: &Registry,
    settings: &BTreeMap<String, Yaml>,
) -> std::result::Result<Vec<LintRule>, ConfigError> {
    let mut rules = Vec::with_capacity(settings.len());
    for (id, raw) in settings {
        let mut rule = registry
            .create(id)
            .ok_or_else(|| ConfigError::UnknownRule(id.clone()))?;
        rule.configure(raw)?;
        if rule.is_enabled() {
            rules.push(rule);
        } else {
            debug!("rule {id} is disabled");
        }
    }
    Ok(rules)
}

/// Evaluate prepared rules against a package and its extracted content.
pub fn evaluate(
    rules: &[LintRule],
    package: &Package,
    subject: &ContentSubject<'_>,
    cancel: &CancelToken,
) -> Result<LintReport> {
    let mut report = LintReport::default();
    for rule in rules {
        if cancel.is_cancelled() {
            return Err(CoreError::Cancelled);
        }
        let result = match rule {
            LintRule::Package(r) => r.evaluate(package)?,
            LintRule::Content(r) => r.evaluate(subject)?,
        };
        debug!(
            "rule {} produced {} violation(s)",
            result.rule.identifier,
            result.violations.len()
        );
        report.results.push(result);
    }
    Ok(report)
}

/// Full lint pipeline for the archive at `package_path`.
///
/// The package is extracted only when a content rule is configured; the
/// extraction directory is removed before this returns, on success or error.
pub fn run(
    config: &Config,
    package_path: &Path,
    collaborators: &Collaborators,
    cancel: &CancelToken,
) -> Result<LintReport> {
    let settings = config.rule_settings()?;
    let rules = prepare(&Registry::builtin(), &settings)?;
    let package = Package::open(package_path)?;
    info!(
        "linting {} ({}) with {} rule(s)",
        package.path.display(),
        package.size,
        rules.len()
    );

    let needs_content = rules.iter().any(|r| matches!(r, LintRule::Content(_)));
    let workspace = if needs_content {
        Some(Workspace::extract(&package, collaborators.extractor.as_ref(), cancel)?)
    } else {
        None
    };
    let content = match &workspace {
        Some(ws) => ws.content()?,
        None => Content::default(),
    };
    let subject = ContentSubject {
        content: &content,
        entitlements: collaborators.entitlements.as_ref(),
    };
    evaluate(&rules, &package, &subject, cancel)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entitlements::PropertyMap;
    use crate::error::ExtractionError;
    use crate::size::FileSize;
    use std::path::PathBuf;

    struct NoEntitlements;

    impl EntitlementsReader for NoEntitlements {
        fn entitlements(&self, _: &Path) -> std::result::Result<PropertyMap, ExtractionError> {
            Ok(PropertyMap::new())
        }
    }

    fn settings(doc: &str) -> BTreeMap<String, Yaml> {
        serde_yaml::from_str(doc).unwrap()
    }

    fn package(bytes: u64) -> Package {
        Package {
            path: PathBuf::from("App.ipa"),
            size: FileSize::from_bytes(bytes),
        }
    }

    fn content() -> Content {
        Content {
            root: PathBuf::new(),
            payload: PathBuf::new(),
            app: PathBuf::new(),
            files: vec!["Payload/App.app/notes.txt".into()],
        }
    }

    fn lint(doc: &str, pkg: &Package) -> Result<LintReport> {
        let rules = prepare(&Registry::builtin(), &settings(doc))?;
        let content = content();
        let subject = ContentSubject {
            content: &content,
            entitlements: &NoEntitlements,
        };
        evaluate(&rules, pkg, &subject, &CancelToken::new())
    }

    #[test]
    fn report_is_ordered_by_identifier() {
        let report = lint(
            "ipa_file_size: {error: {max_size: 1 B}}\nfile_extensions: {warning: {forbidden: [txt]}}",
            &package(10),
        )
        .unwrap();
        let ids: Vec<&str> = report.results.iter().map(|r| r.rule.identifier).collect();
        assert_eq!(ids, vec!["file_extensions", "ipa_file_size"]);
    }

    #[test]
    fn disabled_rules_are_omitted() {
        let report = lint(
            "ipa_file_size: {enabled: false, error: {max_size: 1 B}}\nfile_extensions:",
            &package(10),
        )
        .unwrap();
        assert_eq!(report.results.len(), 1);
        assert_eq!(report.results[0].rule.identifier, "file_extensions");
        assert!(report.results[0].passed());
    }

    #[test]
    fn unknown_rule_aborts_the_run() {
        let err = lint("ipa_file_size:\nmystery_rule:", &package(10)).unwrap_err();
        assert!(matches!(
            err,
            CoreError::Config(ConfigError::UnknownRule(ref id)) if id == "mystery_rule"
        ));
    }

    #[test]
    fn malformed_rule_configuration_aborts_the_run() {
        let err = lint(
            "file_extensions:\nipa_file_size: {error: {max_size: huge}}",
            &package(10),
        )
        .unwrap_err();
        assert!(matches!(err, CoreError::Config(ConfigError::Malformed { .. })));
    }

    #[test]
    fn oversized_package_yields_single_error() {
        let report = lint(
            "ipa_file_size: {error: {max_size: 100 MB}}",
            &package(150 << 20),
        )
        .unwrap();
        let summary = report.summary();
        assert_eq!((summary.errors, summary.warnings), (1, 0));
        assert!(report.results[0].violations[0]
            .message
            .contains("max_size=100.00 MB, ipa_size=150.00 MB"));
    }

    #[test]
    fn cancelled_run_returns_no_report() {
        let rules = prepare(&Registry::builtin(), &settings("ipa_file_size:")).unwrap();
        let content = content();
        let subject = ContentSubject {
            content: &content,
            entitlements: &NoEntitlements,
        };
        let token = CancelToken::new();
        token.cancel();
        assert!(matches!(
            evaluate(&rules, &package(1), &subject, &token),
            Err(CoreError::Cancelled)
        ));
    }
}
