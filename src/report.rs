use std::fmt::Write as _;
use std::str::FromStr;

use anyhow::{Context, Result};
use indexmap::IndexMap;
use serde::Serialize;

use crate::checks::{Finding, Severity};
use crate::validate::SchemaViolation;

/// The combined outcome of one audit run.
#[derive(Debug, Serialize)]
pub struct Report {
    pub violations: Vec<SchemaViolation>,
    pub findings: Vec<Finding>,
    /// False when no schema was supplied and validation was skipped.
    pub schema_checked: bool,
}

/// Rendering style for the final report.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportFormat {
    Text,
    Json,
}

impl FromStr for ReportFormat {
    type Err = String;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.to_ascii_lowercase().as_str() {
            "text" => Ok(ReportFormat::Text),
            "json" => Ok(ReportFormat::Json),
            other => Err(format!("unsupported report format '{other}'; use text or json")),
        }
    }
}

impl Report {
    pub fn new(
        violations: Vec<SchemaViolation>,
        findings: Vec<Finding>,
        schema_checked: bool,
    ) -> Self {
        Self {
            violations,
            findings,
            schema_checked,
        }
    }

    /// True when the audit surfaced nothing.
    pub fn clean(&self) -> bool {
        self.violations.is_empty() && self.findings.is_empty()
    }

    pub fn render(&self, format: ReportFormat, pretty: bool) -> Result<String> {
        match format {
            ReportFormat::Text => Ok(self.render_text()),
            ReportFormat::Json => {
                if pretty {
                    serde_json::to_string_pretty(self).context("failed to serialize report")
                } else {
                    serde_json::to_string(self).context("failed to serialize report")
                }
            }
        }
    }

    fn render_text(&self) -> String {
        let mut out = String::new();

        if !self.violations.is_empty() {
            let _ = writeln!(out, "schema violations:");
            for violation in &self.violations {
                let _ = writeln!(out, "  {violation}");
            }
        }

        if !self.findings.is_empty() {
            let _ = writeln!(out, "insecure defaults:");
            for (pointer, group) in self.grouped_findings() {
                let _ = writeln!(out, "  {pointer}");
                for finding in group {
                    let _ = writeln!(
                        out,
                        "    [{}] {}: {}",
                        finding.severity, finding.rule, finding.message
                    );
                }
            }
        }

        let _ = write!(out, "{}", self.summary_line());
        out
    }

    /// Findings grouped by pointer in first-seen order.
    fn grouped_findings(&self) -> IndexMap<&str, Vec<&Finding>> {
        let mut grouped: IndexMap<&str, Vec<&Finding>> = IndexMap::new();
        for finding in &self.findings {
            grouped.entry(finding.pointer.as_str()).or_default().push(finding);
        }
        grouped
    }

    fn summary_line(&self) -> String {
        if self.clean() {
            return if self.schema_checked {
                "ok: configuration passed schema validation with no insecure defaults".to_string()
            } else {
                "ok: no insecure defaults (schema validation skipped)".to_string()
            };
        }

        let mut parts = Vec::new();
        if self.schema_checked || !self.violations.is_empty() {
            parts.push(format!("{} schema violation(s)", self.violations.len()));
        }
        if !self.findings.is_empty() {
            parts.push(format!(
                "{} finding(s){}",
                self.findings.len(),
                self.severity_breakdown()
            ));
        } else if !self.schema_checked {
            parts.push("0 finding(s)".to_string());
        }
        format!("summary: {}", parts.join(", "))
    }

    fn severity_breakdown(&self) -> String {
        let mut counts: IndexMap<Severity, usize> = IndexMap::new();
        for severity in [
            Severity::Critical,
            Severity::High,
            Severity::Medium,
            Severity::Low,
        ] {
            let count = self
                .findings
                .iter()
                .filter(|f| f.severity == severity)
                .count();
            if count > 0 {
                counts.insert(severity, count);
            }
        }
        if counts.is_empty() {
            return String::new();
        }
        let body = counts
            .iter()
            .map(|(severity, count)| format!("{count} {severity}"))
            .collect::<Vec<_>>()
            .join(", ");
        format!(" ({body})")
    }
}
