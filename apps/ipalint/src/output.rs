//! Output rendering for lint, info, and diff commands.
//!
//! Supports `human` (default) and `json` outputs. Every printer writes into
//! a caller-provided sink so tests can capture it. The JSON forms carry the
//! same data as the human forms plus a top-level summary.

use crate::diff::{FileDiff, SnapshotDiff};
use crate::info::PackageInfo;
use crate::models::{LintReport, Severity};
use crate::snapshot::Snapshot;
use clap::ValueEnum;
use owo_colors::OwoColorize;
use serde_json::json;
use serde_json::Value as JsonVal;
use std::io::{self, Write};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
/// Output mode selected with `--output`.
pub enum OutputMode {
    #[default]
    Human,
    Json,
}

fn use_colors() -> bool {
    std::env::var_os("NO_COLOR").is_none()
}

fn paint(text: &str, color: bool, style: fn(&str) -> String) -> String {
    if color {
        style(text)
    } else {
        text.to_string()
    }
}

fn write_json(out: &mut dyn Write, value: &JsonVal) -> io::Result<()> {
    serde_json::to_writer_pretty(&mut *out, value)?;
    writeln!(out)
}

/// Print a lint report in the requested format.
pub fn print_lint(out: &mut dyn Write, report: &LintReport, mode: OutputMode) -> io::Result<()> {
    match mode {
        OutputMode::Json => write_json(out, &compose_lint_json(report)),
        OutputMode::Human => write_lint_human(out, report, use_colors()),
    }
}

fn write_lint_human(out: &mut dyn Write, report: &LintReport, color: bool) -> io::Result<()> {
    for result in &report.results {
        let id = result.rule.identifier;
        if result.passed() {
            let mark = paint("✔", color, |s| s.green().to_string());
            writeln!(out, "{mark} ❲{id}❳ passed")?;
            continue;
        }
        for v in &result.violations {
            let (icon, sev) = match v.severity {
                Severity::Error => (
                    paint("✖", color, |s| s.red().to_string()),
                    paint("⟦error⟧", color, |s| s.red().bold().to_string()),
                ),
                Severity::Warning => (
                    paint("▲", color, |s| s.yellow().to_string()),
                    paint("⟦warn⟧", color, |s| s.yellow().bold().to_string()),
                ),
            };
            writeln!(out, "{icon} {sev} ❲{id}❳ {}", v.message)?;
        }
    }
    let s = report.summary();
    let summary = format!(
        "Summary: rules={} errors={} warnings={}",
        s.rules, s.errors, s.warnings
    );
    writeln!(out, "{}", paint(&summary, color, |s| s.bold().to_string()))
}

/// Compose lint JSON object (pure) for testing purposes.
pub fn compose_lint_json(report: &LintReport) -> JsonVal {
    let results: Vec<_> = report
        .results
        .iter()
        .map(|r| {
            json!({
                "rule": r.rule.identifier,
                "name": r.rule.name,
                "passed": r.passed(),
                "violations": r.violations,
            })
        })
        .collect();
    json!({"results": results, "summary": report.summary()})
}

/// Print the package overview produced by `info`.
pub fn print_info(out: &mut dyn Write, info: &PackageInfo, mode: OutputMode) -> io::Result<()> {
    match mode {
        OutputMode::Json => write_json(out, &compose_info_json(info)),
        OutputMode::Human => write_info_human(out, info, use_colors()),
    }
}

fn write_info_human(out: &mut dyn Write, info: &PackageInfo, color: bool) -> io::Result<()> {
    let label = |s: &str| paint(s, color, |s| s.bold().to_string());
    writeln!(out, "{} {}", label("Package:"), info.filename)?;
    writeln!(out, "{} {}", label("Package size:"), info.ipa_size)?;
    writeln!(out, "{} {}", label("Application:"), info.app_name)?;
    writeln!(out, "{} {}", label("Application size:"), info.app_size)?;
    for (key, value) in &info.properties {
        writeln!(out, "{} {value}", label(&format!("{key}:")))?;
    }
    writeln!(out, "{} {}", label("Frameworks:"), info.frameworks.len())?;
    for name in &info.frameworks {
        writeln!(out, "  - {name}")?;
    }
    Ok(())
}

pub fn compose_info_json(info: &PackageInfo) -> JsonVal {
    let properties: serde_json::Map<String, JsonVal> = info
        .properties
        .iter()
        .map(|(k, v)| (k.clone(), JsonVal::String(v.clone())))
        .collect();
    json!({
        "filename": info.filename,
        "ipa_size": info.ipa_size,
        "app_name": info.app_name,
        "app_size": info.app_size,
        "properties": properties,
        "frameworks": info.frameworks,
    })
}

/// Print a snapshot diff grouped as removed, added, then changed, followed by
/// the total size change.
pub fn print_diff(
    out: &mut dyn Write,
    first: &Snapshot,
    second: &Snapshot,
    diff: &SnapshotDiff,
    mode: OutputMode,
) -> io::Result<()> {
    match mode {
        OutputMode::Json => write_json(out, &compose_diff_json(first, second, diff)),
        OutputMode::Human => write_diff_human(out, first, second, diff, use_colors()),
    }
}

fn write_diff_human(
    out: &mut dyn Write,
    first: &Snapshot,
    second: &Snapshot,
    diff: &SnapshotDiff,
    color: bool,
) -> io::Result<()> {
    let header = |s: &str| paint(s, color, |s| s.bold().to_string());

    let removed: Vec<_> = diff.only_in_first().collect();
    if !removed.is_empty() {
        writeln!(out, "{}", header(&format!("Removed ({})", removed.len())))?;
        for e in removed {
            let mark = paint("-", color, |s| s.red().to_string());
            writeln!(out, "  {mark} {} ({})", e.path, e.size)?;
        }
    }
    let added: Vec<_> = diff.only_in_second().collect();
    if !added.is_empty() {
        writeln!(out, "{}", header(&format!("Added ({})", added.len())))?;
        for e in added {
            let mark = paint("+", color, |s| s.green().to_string());
            writeln!(out, "  {mark} {} ({})", e.path, e.size)?;
        }
    }
    let changed: Vec<_> = diff.changed().collect();
    if !changed.is_empty() {
        writeln!(out, "{}", header(&format!("Changed ({})", changed.len())))?;
        for d in changed {
            let mark = paint("~", color, |s| s.yellow().to_string());
            writeln!(out, "  {mark} {} ({})", d.path(), d.size_delta())?;
        }
    }
    if diff.is_empty() {
        writeln!(out, "No differences")?;
    }
    let (a, b) = (first.total_size(), second.total_size());
    let summary = format!("Total size: {a} -> {b} ({})", b.delta(&a));
    writeln!(out, "{}", header(&summary))
}

pub fn compose_diff_json(first: &Snapshot, second: &Snapshot, diff: &SnapshotDiff) -> JsonVal {
    let entries: Vec<_> = diff
        .entries
        .iter()
        .map(|d| {
            let mut v = serde_json::to_value(d).unwrap_or(JsonVal::Null);
            if let (FileDiff::Changed { .. }, Some(obj)) = (d, v.as_object_mut()) {
                obj.insert("delta".into(), JsonVal::String(d.size_delta().to_string()));
            }
            v
        })
        .collect();
    let (a, b) = (first.total_size(), second.total_size());
    json!({
        "entries": entries,
        "summary": {
            "removed": diff.only_in_first().count(),
            "added": diff.only_in_second().count(),
            "changed": diff.changed().count(),
            "first_size": a,
            "second_size": b,
            "delta": b.delta(&a).to_string(),
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::digest::Sha256Digest;
    use crate::models::{LintRuleResult, RuleDescriptor, Violation};
    use crate::size::FileSize;
    use crate::snapshot::{Descriptor, ManifestEntry, SNAPSHOT_VERSION};

    fn report() -> LintReport {
        LintReport {
            results: vec![
                LintRuleResult {
                    rule: RuleDescriptor {
                        identifier: "frameworks",
                        name: "Frameworks",
                        description: "",
                    },
                    violations: vec![],
                },
                LintRuleResult {
                    rule: RuleDescriptor {
                        identifier: "ipa_file_size",
                        name: "IPA file size",
                        description: "",
                    },
                    violations: vec![Violation::new(Severity::Error, "too big")],
                },
            ],
        }
    }

    fn snapshot(files: &[(&str, &[u8])]) -> Snapshot {
        Snapshot {
            version: SNAPSHOT_VERSION.into(),
            descriptor: Descriptor {
                filename: "A.ipa".into(),
                created_at: 0,
                sha256: Sha256Digest::of_bytes(b""),
            },
            files: files
                .iter()
                .map(|(p, data)| ManifestEntry {
                    path: p.to_string(),
                    sha256: Sha256Digest::of_bytes(data),
                    size: FileSize::from_bytes(data.len() as u64),
                })
                .collect(),
        }
    }

    #[test]
    fn test_compose_lint_json_shape() {
        let out = compose_lint_json(&report());
        assert_eq!(out["summary"]["errors"], 1);
        assert_eq!(out["summary"]["rules"], 2);
        assert_eq!(out["results"][0]["passed"], true);
        assert_eq!(out["results"][1]["violations"][0]["severity"], "error");
        assert_eq!(out["results"][1]["violations"][0]["message"], "too big");
    }

    #[test]
    fn test_human_lint_output_is_plain_without_colors() {
        let mut buf = Vec::new();
        write_lint_human(&mut buf, &report(), false).unwrap();
        let text = String::from_utf8(buf).unwrap();
        assert!(text.contains("✔ ❲frameworks❳ passed"));
        assert!(text.contains("✖ ⟦error⟧ ❲ipa_file_size❳ too big"));
        assert!(text.ends_with("Summary: rules=2 errors=1 warnings=0\n"));
    }

    #[test]
    fn test_compose_diff_json_counts_and_totals() {
        let a = snapshot(&[("a", b"1"), ("b", b"22"), ("c", b"x")]);
        let b = snapshot(&[("b", b"2222"), ("c", b"x"), ("d", b"d")]);
        let d = crate::diff::diff(&a, &b).unwrap();
        let out = compose_diff_json(&a, &b, &d);
        assert_eq!(out["summary"]["removed"], 1);
        assert_eq!(out["summary"]["added"], 1);
        assert_eq!(out["summary"]["changed"], 1);
        assert_eq!(out["summary"]["first_size"], 4);
        assert_eq!(out["summary"]["second_size"], 6);
        assert_eq!(out["summary"]["delta"], "+2 B");
        assert_eq!(out["entries"][2]["kind"], "changed");
        assert_eq!(out["entries"][2]["delta"], "+2 B");
    }

    #[test]
    fn test_human_diff_groups_sections() {
        let a = snapshot(&[("a", b"1")]);
        let b = snapshot(&[("b", b"1")]);
        let d = crate::diff::diff(&a, &b).unwrap();
        let mut buf = Vec::new();
        write_diff_human(&mut buf, &a, &b, &d, false).unwrap();
        let text = String::from_utf8(buf).unwrap();
        let removed = text.find("Removed (1)").unwrap();
        let added = text.find("Added (1)").unwrap();
        assert!(removed < added);
        assert!(text.contains("Total size: 1 B -> 1 B (±0 B)"));
    }
}
