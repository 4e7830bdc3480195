mod access;
mod credentials;
mod network;

use std::fmt;

use regex::Regex;
use serde::Serialize;
use serde_json::Value;
use tracing::debug;

pub(crate) use access::PermissiveAccess;
pub(crate) use credentials::DefaultCredentials;
pub(crate) use network::NetworkExposure;

/// How bad a finding is, from nuisance to drop-everything.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Low,
    Medium,
    High,
    Critical,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Low => write!(f, "low"),
            Severity::Medium => write!(f, "medium"),
            Severity::High => write!(f, "high"),
            Severity::Critical => write!(f, "critical"),
        }
    }
}

/// An insecure default flagged by the built-in ruleset.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct Finding {
    pub rule: &'static str,
    pub severity: Severity,
    pub pointer: String,
    pub message: String,
}

/// One key/value pair encountered while walking the document.
pub(crate) struct Entry<'a> {
    pub key: &'a str,
    pub pointer: String,
    pub value: &'a Value,
}

pub(crate) trait Check {
    fn name(&self) -> &'static str;
    fn inspect(&self, entry: &Entry<'_>) -> Vec<Finding>;
}

fn builtin_checks() -> Vec<Box<dyn Check>> {
    vec![
        Box::new(DefaultCredentials::new()),
        Box::new(NetworkExposure::new()),
        Box::new(PermissiveAccess::new()),
    ]
}

/// Walk the document once and apply every built-in rule to each entry.
/// Non-object roots produce no findings.
pub fn run_checks(document: &Value) -> Vec<Finding> {
    let checks = builtin_checks();
    let names: Vec<&str> = checks.iter().map(|check| check.name()).collect();
    debug!(rules = ?names, "running built-in checks");
    let mut findings = Vec::new();
    walk(document, "", &checks, &mut findings);
    findings
}

fn walk(value: &Value, pointer: &str, checks: &[Box<dyn Check>], findings: &mut Vec<Finding>) {
    match value {
        Value::Object(map) => {
            for (key, child) in map {
                let child_pointer = format!("{pointer}/{}", escape_pointer_token(key));
                let entry = Entry {
                    key,
                    pointer: child_pointer.clone(),
                    value: child,
                };
                for check in checks {
                    findings.extend(check.inspect(&entry));
                }
                walk(child, &child_pointer, checks, findings);
            }
        }
        Value::Array(items) => {
            for (idx, child) in items.iter().enumerate() {
                let child_pointer = format!("{pointer}/{idx}");
                walk(child, &child_pointer, checks, findings);
            }
        }
        _ => {}
    }
}

fn escape_pointer_token(token: &str) -> String {
    token.replace('~', "~0").replace('/', "~1")
}

// Rule patterns are compile-time constants, so a failure is a programming error.
pub(crate) fn rule_pattern(raw: &'static str) -> Regex {
    Regex::new(raw).expect("built-in rule pattern must compile")
}
