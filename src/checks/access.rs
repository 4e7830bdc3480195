use regex::Regex;
use serde_json::Value;

use super::{Check, Entry, Finding, Severity, rule_pattern};

/// Flags world-writable permission modes, zeroed umasks, debug mode,
/// wildcard CORS origins, and anonymous access toggles.
pub(crate) struct PermissiveAccess {
    mode_pattern: Regex,
    umask_pattern: Regex,
    debug_pattern: Regex,
    cors_pattern: Regex,
    anon_pattern: Regex,
}

impl PermissiveAccess {
    pub(crate) fn new() -> Self {
        Self {
            mode_pattern: rule_pattern(r"(?i)(mode|perm(ission)?s?|chmod)"),
            umask_pattern: rule_pattern(r"(?i)umask"),
            debug_pattern: rule_pattern(r"(?i)debug"),
            cors_pattern: rule_pattern(r"(?i)(cors|origins?)"),
            anon_pattern: rule_pattern(r"(?i)(anonymous|guest|unauthenticated|no[_-]?auth)"),
        }
    }
}

impl Check for PermissiveAccess {
    fn name(&self) -> &'static str {
        "permissive-access"
    }

    fn inspect(&self, entry: &Entry<'_>) -> Vec<Finding> {
        let mut findings = Vec::new();

        if self.umask_pattern.is_match(entry.key) {
            if let Some(digits) = octal_digits(entry.value)
                && digits.chars().all(|c| c == '0')
            {
                findings.push(Finding {
                    rule: "zero-umask",
                    severity: Severity::High,
                    pointer: entry.pointer.clone(),
                    message: format!("'{}' sets a umask of {digits}, masking nothing", entry.key),
                });
            }
        } else if self.mode_pattern.is_match(entry.key)
            && let Some(digits) = octal_digits(entry.value)
            && world_writable(&digits)
        {
            findings.push(Finding {
                rule: "world-writable",
                severity: Severity::High,
                pointer: entry.pointer.clone(),
                message: format!("'{}' grants world-writable permissions ({digits})", entry.key),
            });
        }

        if self.debug_pattern.is_match(entry.key) && entry.value == &Value::Bool(true) {
            findings.push(Finding {
                rule: "debug-enabled",
                severity: Severity::Low,
                pointer: entry.pointer.clone(),
                message: format!("'{}' enables debug mode", entry.key),
            });
        }

        if self.cors_pattern.is_match(entry.key) && contains_wildcard(entry.value) {
            findings.push(Finding {
                rule: "wildcard-origin",
                severity: Severity::Medium,
                pointer: entry.pointer.clone(),
                message: format!("'{}' allows requests from any origin", entry.key),
            });
        }

        if self.anon_pattern.is_match(entry.key) && entry.value == &Value::Bool(true) {
            findings.push(Finding {
                rule: "anonymous-access",
                severity: Severity::High,
                pointer: entry.pointer.clone(),
                message: format!("'{}' enables unauthenticated access", entry.key),
            });
        }

        findings
    }
}

/// Extract a plausible octal permission string from `"777"`, `"0o644"`, or `644`.
fn octal_digits(value: &Value) -> Option<String> {
    let raw = match value {
        Value::String(raw) => raw.trim().to_string(),
        Value::Number(num) => num.as_u64()?.to_string(),
        _ => return None,
    };
    let digits = raw.strip_prefix("0o").unwrap_or(&raw);
    if digits.is_empty()
        || digits.len() > 4
        || !digits.chars().all(|c| ('0'..='7').contains(&c))
    {
        return None;
    }
    Some(digits.to_string())
}

fn world_writable(digits: &str) -> bool {
    digits
        .chars()
        .last()
        .and_then(|c| c.to_digit(8))
        .is_some_and(|bits| bits & 0o2 != 0)
}

fn contains_wildcard(value: &Value) -> bool {
    match value {
        Value::String(origin) => origin == "*",
        Value::Array(origins) => origins.iter().any(|origin| origin == "*"),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use crate::checks::{Severity, run_checks};
    use serde_json::json;

    #[test]
    fn flags_world_writable_modes() {
        let doc = json!({"file_mode": "777", "socket": {"permissions": 666}});
        let findings = run_checks(&doc);
        assert_eq!(findings.len(), 2);
        assert!(findings.iter().all(|f| f.rule == "world-writable"));
        assert!(findings.iter().all(|f| f.severity == Severity::High));
    }

    #[test]
    fn restrictive_modes_are_fine() {
        let doc = json!({"file_mode": "640", "dir_mode": "0o750"});
        assert!(run_checks(&doc).is_empty());
    }

    #[test]
    fn flags_zeroed_umask() {
        let doc = json!({"umask": "000"});
        let findings = run_checks(&doc);
        assert_eq!(findings[0].rule, "zero-umask");
    }

    #[test]
    fn normal_umask_is_fine() {
        let doc = json!({"umask": "022"});
        assert!(run_checks(&doc).is_empty());
    }

    #[test]
    fn flags_debug_mode_as_low() {
        let doc = json!({"debug": true});
        let findings = run_checks(&doc);
        assert_eq!(findings[0].rule, "debug-enabled");
        assert_eq!(findings[0].severity, Severity::Low);
    }

    #[test]
    fn flags_wildcard_cors_in_strings_and_arrays() {
        let doc = json!({
            "cors_origin": "*",
            "api": {"allowed_origins": ["https://app.example.com", "*"]}
        });
        let findings = run_checks(&doc);
        assert_eq!(findings.len(), 2);
        assert!(findings.iter().all(|f| f.rule == "wildcard-origin"));
    }

    #[test]
    fn flags_anonymous_access() {
        let doc = json!({"mqtt": {"allow_anonymous": true}});
        let findings = run_checks(&doc);
        assert_eq!(findings[0].rule, "anonymous-access");
        assert_eq!(findings[0].pointer, "/mqtt/allow_anonymous");
    }

    #[test]
    fn disabled_toggles_are_fine() {
        let doc = json!({"debug": false, "allow_anonymous": false});
        assert!(run_checks(&doc).is_empty());
    }
}
