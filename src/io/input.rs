use std::fs;
use std::io::{self, Read};
use std::path::Path;

use anyhow::{Context, Result, bail};
use serde_json::Value;
use tracing::debug;

use super::DocumentFormat;

/// Parse structured data in any supported format into a `serde_json::Value`.
pub fn parse_document_str(contents: &str, format: DocumentFormat) -> Result<Value> {
    match format {
        DocumentFormat::Json => {
            serde_json::from_str::<Value>(contents).with_context(|| "failed to parse JSON document")
        }
        #[cfg(feature = "yaml")]
        DocumentFormat::Yaml => {
            serde_yaml::from_str::<Value>(contents).with_context(|| "failed to parse YAML document")
        }
        #[cfg(feature = "toml")]
        DocumentFormat::Toml => contents
            .parse::<toml::Value>()
            .with_context(|| "failed to parse TOML document")
            .and_then(|value| {
                serde_json::to_value(value).context("failed to convert TOML to JSON")
            }),
    }
}

/// Load a configuration document from a file path or stdin (`"-"`).
///
/// Format resolution: an explicit override wins, then the file extension.
/// A file with no recognizable extension requires an override. Stdin with
/// no override is parsed by trying every available format in order.
pub fn load_document(spec: &str, format: Option<DocumentFormat>) -> Result<Value> {
    if spec == "-" {
        let contents = read_stdin()?;
        let value = match format {
            Some(format) => parse_document_str(&contents, format)
                .with_context(|| format!("failed to parse stdin as {format}"))?,
            None => parse_with_fallback(&contents)?,
        };
        debug!("configuration loaded from stdin");
        return Ok(value);
    }

    let path = Path::new(spec);
    let Some(format) = format.or_else(|| DocumentFormat::from_extension(path)) else {
        bail!(
            "cannot determine the format of {} from its extension; specify the type explicitly",
            path.display()
        );
    };

    let contents = fs::read_to_string(path)
        .with_context(|| format!("failed to read configuration file {}", path.display()))?;
    let value = parse_document_str(&contents, format)
        .with_context(|| format!("failed to parse {} as {format}", path.display()))?;
    debug!(path = %path.display(), %format, "configuration loaded");
    Ok(value)
}

fn read_stdin() -> Result<String> {
    let mut buffer = String::new();
    io::stdin()
        .read_to_string(&mut buffer)
        .context("failed to read from stdin")?;
    Ok(buffer)
}

fn parse_with_fallback(contents: &str) -> Result<Value> {
    let mut first_error = None;
    for candidate in DocumentFormat::available_formats() {
        match parse_document_str(contents, candidate) {
            Ok(value) => return Ok(value),
            Err(err) => {
                if first_error.is_none() {
                    first_error = Some(err);
                }
            }
        }
    }
    let formats = DocumentFormat::available_formats()
        .into_iter()
        .map(|fmt| fmt.to_string())
        .collect::<Vec<_>>()
        .join(", ");
    match first_error {
        Some(err) => Err(err.context(format!("failed to parse document (tried {formats})"))),
        None => bail!("no document formats available in this build"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::time::{SystemTime, UNIX_EPOCH};

    fn scratch_file(name: &str, ext: &str, contents: &str) -> std::path::PathBuf {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap()
            .as_nanos();
        let path = std::env::temp_dir().join(format!("confaudit-{name}-{nanos}.{ext}"));
        fs::write(&path, contents).unwrap();
        path
    }

    #[test]
    fn parse_json_documents() {
        let raw = "{\"enabled\":true}";
        let parsed = parse_document_str(raw, DocumentFormat::Json).unwrap();
        assert_eq!(parsed["enabled"], Value::Bool(true));
    }

    #[cfg(feature = "yaml")]
    #[test]
    fn parse_yaml_documents() {
        let raw = "enabled: true\nname: dev";
        let parsed = parse_document_str(raw, DocumentFormat::Yaml).unwrap();
        assert_eq!(parsed["enabled"], Value::Bool(true));
        assert_eq!(parsed["name"], json!("dev"));
    }

    #[cfg(feature = "toml")]
    #[test]
    fn parse_toml_documents() {
        let raw = "enabled = true\nname = \"dev\"";
        let parsed = parse_document_str(raw, DocumentFormat::Toml).unwrap();
        assert_eq!(parsed["enabled"], Value::Bool(true));
        assert_eq!(parsed["name"], json!("dev"));
    }

    #[test]
    fn loads_file_by_extension() {
        let path = scratch_file("load", "json", "{\"port\": 8080}");
        let value = load_document(path.to_str().unwrap(), None).unwrap();
        assert_eq!(value["port"], json!(8080));
        let _ = fs::remove_file(path);
    }

    #[test]
    fn override_beats_extension() {
        let path = scratch_file("override", "conf", "{\"a\": 1}");
        let value = load_document(path.to_str().unwrap(), Some(DocumentFormat::Json)).unwrap();
        assert_eq!(value["a"], json!(1));
        let _ = fs::remove_file(path);
    }

    #[test]
    fn unknown_extension_without_override_is_an_error() {
        let path = scratch_file("noext", "conf", "{}");
        let err = load_document(path.to_str().unwrap(), None).unwrap_err();
        assert!(err.to_string().contains("cannot determine the format"));
        let _ = fs::remove_file(path);
    }

    #[cfg(feature = "yaml")]
    #[test]
    fn fallback_recovers_yaml_that_json_rejects() {
        let raw = "server:\n  debug: true\n";
        let value = parse_with_fallback(raw).unwrap();
        assert_eq!(value["server"]["debug"], Value::Bool(true));
    }

    #[test]
    fn fallback_surfaces_the_first_error_when_all_formats_fail() {
        // Unterminated flow mapping: invalid in every supported format.
        let err = parse_with_fallback("{ not valid").unwrap_err();
        let rendered = format!("{err:#}");
        assert!(rendered.contains("tried"));
        assert!(rendered.contains("failed to parse JSON document"));
    }

    #[test]
    fn missing_file_names_the_path() {
        let err = load_document("/nonexistent/confaudit.json", None).unwrap_err();
        assert!(err.to_string().contains("/nonexistent/confaudit.json"));
    }
}
