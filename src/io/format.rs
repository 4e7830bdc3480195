use std::fmt;
use std::path::Path;
use std::str::FromStr;

/// Supported data formats for configuration documents.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentFormat {
    Json,
    #[cfg(feature = "yaml")]
    Yaml,
    #[cfg(feature = "toml")]
    Toml,
}

impl DocumentFormat {
    /// Formats compiled into this build, in parse-fallback order.
    pub fn available_formats() -> Vec<DocumentFormat> {
        vec![
            DocumentFormat::Json,
            #[cfg(feature = "yaml")]
            DocumentFormat::Yaml,
            #[cfg(feature = "toml")]
            DocumentFormat::Toml,
        ]
    }

    /// Infer a format from a file extension. `None` when the extension is
    /// missing, unrecognized, or belongs to a format this build lacks.
    pub fn from_extension(path: &Path) -> Option<DocumentFormat> {
        let ext = path.extension()?.to_string_lossy().to_ascii_lowercase();
        match ext.as_str() {
            "json" => Some(DocumentFormat::Json),
            #[cfg(feature = "yaml")]
            "yaml" | "yml" => Some(DocumentFormat::Yaml),
            #[cfg(feature = "toml")]
            "toml" => Some(DocumentFormat::Toml),
            _ => None,
        }
    }
}

impl fmt::Display for DocumentFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DocumentFormat::Json => write!(f, "json"),
            #[cfg(feature = "yaml")]
            DocumentFormat::Yaml => write!(f, "yaml"),
            #[cfg(feature = "toml")]
            DocumentFormat::Toml => write!(f, "toml"),
        }
    }
}

impl FromStr for DocumentFormat {
    type Err = String;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.to_ascii_lowercase().as_str() {
            "json" => Ok(DocumentFormat::Json),
            #[cfg(feature = "yaml")]
            "yaml" | "yml" => Ok(DocumentFormat::Yaml),
            #[cfg(feature = "toml")]
            "toml" => Ok(DocumentFormat::Toml),
            other => Err(format!(
                "unsupported format '{other}'; this build accepts: {}",
                format_list()
            )),
        }
    }
}

fn format_list() -> String {
    let items: Vec<String> = DocumentFormat::available_formats()
        .into_iter()
        .map(|fmt| fmt.to_string())
        .collect();
    items.join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    #[test]
    fn infers_format_from_extension() {
        assert_eq!(
            DocumentFormat::from_extension(Path::new("app.json")),
            Some(DocumentFormat::Json)
        );
        assert_eq!(DocumentFormat::from_extension(Path::new("app.conf")), None);
        assert_eq!(DocumentFormat::from_extension(Path::new("app")), None);
    }

    #[cfg(feature = "yaml")]
    #[test]
    fn accepts_both_yaml_extensions() {
        assert_eq!(
            DocumentFormat::from_extension(Path::new("a.yml")),
            Some(DocumentFormat::Yaml)
        );
        assert_eq!(
            DocumentFormat::from_extension(Path::new("a.YAML")),
            Some(DocumentFormat::Yaml)
        );
    }

    #[test]
    fn parses_format_names_case_insensitively() {
        assert_eq!("JSON".parse::<DocumentFormat>(), Ok(DocumentFormat::Json));
        assert!("ini".parse::<DocumentFormat>().is_err());
    }
}
