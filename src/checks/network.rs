use regex::Regex;
use serde_json::Value;

use super::{Check, Entry, Finding, Severity, rule_pattern};

/// Host values that expose a listener on every interface.
const ALL_INTERFACES: &[&str] = &["0.0.0.0", "::", "[::]", "0:0:0:0:0:0:0:0"];

/// Ports of legacy plaintext services nothing should still listen on.
const LEGACY_PORTS: &[(u64, &str)] = &[
    (21, "ftp"),
    (23, "telnet"),
    (69, "tftp"),
    (512, "rexec"),
    (513, "rlogin"),
    (514, "rsh"),
];

/// Flags listeners bound to all interfaces, legacy plaintext service ports,
/// and disabled transport encryption or certificate verification.
pub(crate) struct NetworkExposure {
    bind_pattern: Regex,
    port_pattern: Regex,
    tls_pattern: Regex,
    verify_pattern: Regex,
    insecure_pattern: Regex,
}

impl NetworkExposure {
    pub(crate) fn new() -> Self {
        Self {
            bind_pattern: rule_pattern(r"(?i)(host|addr(ess)?|bind|listen|interface)"),
            port_pattern: rule_pattern(r"(?i)port"),
            tls_pattern: rule_pattern(r"(?i)(tls|ssl|https)"),
            verify_pattern: rule_pattern(r"(?i)(verify|validation)"),
            insecure_pattern: rule_pattern(r"(?i)(insecure|skip[_-]?(tls[_-])?verify|allow[_-]?invalid)"),
        }
    }

    fn verification_finding(&self, entry: &Entry<'_>) -> Finding {
        Finding {
            rule: "cert-verification-disabled",
            severity: Severity::High,
            pointer: entry.pointer.clone(),
            message: format!("'{}' disables certificate verification", entry.key),
        }
    }
}

impl Check for NetworkExposure {
    fn name(&self) -> &'static str {
        "network-exposure"
    }

    fn inspect(&self, entry: &Entry<'_>) -> Vec<Finding> {
        let mut findings = Vec::new();

        if self.bind_pattern.is_match(entry.key)
            && let Value::String(host) = entry.value
            && binds_all_interfaces(host)
        {
            findings.push(Finding {
                rule: "open-bind",
                severity: Severity::High,
                pointer: entry.pointer.clone(),
                message: format!("'{}' binds to all interfaces ({host})", entry.key),
            });
        }

        if self.port_pattern.is_match(entry.key)
            && let Some(port) = port_value(entry.value)
            && let Some((_, service)) = LEGACY_PORTS.iter().find(|(p, _)| *p == port)
        {
            findings.push(Finding {
                rule: "legacy-port",
                severity: Severity::Medium,
                pointer: entry.pointer.clone(),
                message: format!("'{}' uses port {port}, the legacy plaintext {service} service", entry.key),
            });
        }

        if self.insecure_pattern.is_match(entry.key) {
            if entry.value == &Value::Bool(true) {
                findings.push(self.verification_finding(entry));
            }
        } else if self.verify_pattern.is_match(entry.key) {
            if entry.value == &Value::Bool(false) {
                findings.push(self.verification_finding(entry));
            }
        } else if self.tls_pattern.is_match(entry.key) && entry.value == &Value::Bool(false) {
            findings.push(Finding {
                rule: "tls-disabled",
                severity: Severity::High,
                pointer: entry.pointer.clone(),
                message: format!("'{}' disables transport encryption", entry.key),
            });
        }

        findings
    }
}

fn binds_all_interfaces(host: &str) -> bool {
    if ALL_INTERFACES.contains(&host) {
        return true;
    }
    // host:port forms
    host.strip_prefix("0.0.0.0:").is_some_and(|rest| rest.parse::<u16>().is_ok())
        || host.strip_prefix("[::]:").is_some_and(|rest| rest.parse::<u16>().is_ok())
}

fn port_value(value: &Value) -> Option<u64> {
    match value {
        Value::Number(num) => num.as_u64(),
        Value::String(raw) => raw.parse().ok(),
        _ => None,
    }
}
