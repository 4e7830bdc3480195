use regex::Regex;
use serde_json::Value;

use super::{Check, Entry, Finding, Severity, rule_pattern};

const RULE: &str = "default-credentials";

/// Credential values every wordlist tries first.
const KNOWN_DEFAULTS: &[&str] = &[
    "password", "passw0rd", "admin", "changeme", "changeit", "123456", "12345678", "letmein",
    "root", "toor", "guest", "default", "qwerty", "secret",
];

const MIN_SECRET_LEN: usize = 8;

/// Flags credential-bearing keys whose value is a well-known default,
/// empty, or too short to resist guessing.
pub(crate) struct DefaultCredentials {
    key_pattern: Regex,
    indirection_pattern: Regex,
}

impl DefaultCredentials {
    pub(crate) fn new() -> Self {
        Self {
            key_pattern: rule_pattern(r"(?i)(pass(word|wd|phrase)?|secret|token|api[_-]?key|credential)"),
            // Keys that reference a credential rather than hold one.
            indirection_pattern: rule_pattern(r"(?i)(file|path|env|var|url|id|name)$"),
        }
    }

    fn finding(&self, entry: &Entry<'_>, severity: Severity, message: String) -> Finding {
        Finding {
            rule: RULE,
            severity,
            pointer: entry.pointer.clone(),
            message,
        }
    }
}

impl Check for DefaultCredentials {
    fn name(&self) -> &'static str {
        RULE
    }

    fn inspect(&self, entry: &Entry<'_>) -> Vec<Finding> {
        if !self.key_pattern.is_match(entry.key) || self.indirection_pattern.is_match(entry.key) {
            return Vec::new();
        }
        let Value::String(secret) = entry.value else {
            return Vec::new();
        };
        // Templated values are resolved elsewhere; nothing to judge here.
        if secret.starts_with("${") || secret.starts_with("$(") {
            return Vec::new();
        }

        if secret.is_empty() {
            return vec![self.finding(
                entry,
                Severity::High,
                format!("'{}' is set to an empty value", entry.key),
            )];
        }
        let lowered = secret.to_lowercase();
        if KNOWN_DEFAULTS.contains(&lowered.as_str()) {
            return vec![self.finding(
                entry,
                Severity::Critical,
                format!("'{}' is set to the well-known default '{secret}'", entry.key),
            )];
        }
        if secret.chars().count() < MIN_SECRET_LEN {
            return vec![self.finding(
                entry,
                Severity::Medium,
                format!(
                    "'{}' is shorter than {MIN_SECRET_LEN} characters",
                    entry.key
                ),
            )];
        }
        Vec::new()
    }
}
