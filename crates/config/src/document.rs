//! Reading and writing configuration documents

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::str::FromStr;
use tracing::debug;
use types::{ComposerError, ConfigObject, ConfigValue, DocumentError, Result};

/// On-disk representation of a configuration object
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentFormat {
    #[default]
    Json,
    Yaml,
}

impl DocumentFormat {
    /// Infer the format from a file extension; anything but `.json` is YAML
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("json") => DocumentFormat::Json,
            _ => DocumentFormat::Yaml,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            DocumentFormat::Json => "json",
            DocumentFormat::Yaml => "yaml",
        }
    }
}

impl fmt::Display for DocumentFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DocumentFormat {
    type Err = ComposerError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "json" => Ok(DocumentFormat::Json),
            "yaml" | "yml" => Ok(DocumentFormat::Yaml),
            other => Err(ComposerError::Config(format!("Unknown document format: {}", other))),
        }
    }
}

/// Load a configuration object from a JSON or YAML file
pub fn load_document<P: AsRef<Path>>(path: P) -> Result<ConfigObject> {
    let path = path.as_ref();
    let origin = path.display().to_string();

    if !path.exists() {
        return Err(DocumentError::NotFound { path: origin }.into());
    }

    let content = std::fs::read_to_string(path).map_err(|e| DocumentError::Unreadable {
        path: origin.clone(),
        message: e.to_string(),
    })?;

    let format = DocumentFormat::from_path(path);
    debug!(path = %origin, %format, bytes = content.len(), "Loading configuration document");
    parse_document(&content, format, &origin)
}

/// Parse a configuration object; `origin` names the source in errors
///
/// An empty document is an empty object. Any other non-mapping root is rejected.
pub fn parse_document(content: &str, format: DocumentFormat, origin: &str) -> Result<ConfigObject> {
    let parse_error = |line, column, message| DocumentError::Parse {
        path: origin.to_string(),
        line,
        column,
        message,
    };

    let value: ConfigValue = match format {
        DocumentFormat::Json => serde_json::from_str(content).map_err(|e| {
            // serde_json reports line 0 for errors not tied to a position
            let (line, column) = match e.line() {
                0 => (None, None),
                line => (Some(line), Some(e.column())),
            };
            parse_error(line, column, e.to_string())
        })?,
        DocumentFormat::Yaml => serde_yaml::from_str(content).map_err(|e| {
            let location = e.location();
            parse_error(
                location.as_ref().map(|l| l.line()),
                location.as_ref().map(|l| l.column()),
                e.to_string(),
            )
        })?,
    };

    match value {
        ConfigValue::Mapping(object) => Ok(object),
        ConfigValue::Null => Ok(ConfigObject::new()),
        other => Err(DocumentError::NotAMapping {
            path: origin.to_string(),
            found: other.kind().to_string(),
        }
        .into()),
    }
}

/// Render a configuration object as text
pub fn render_document(object: &ConfigObject, format: DocumentFormat) -> Result<String> {
    match format {
        DocumentFormat::Json => serde_json::to_string_pretty(object)
            .map(|mut s| {
                s.push('\n');
                s
            })
            .map_err(|e| ComposerError::Render(e.to_string())),
        DocumentFormat::Yaml => {
            serde_yaml::to_string(object).map_err(|e| ComposerError::Render(e.to_string()))
        }
    }
}

/// Render a configuration object and write it to `path`
pub fn write_document<P: AsRef<Path>>(object: &ConfigObject, format: DocumentFormat, path: P) -> Result<()> {
    let rendered = render_document(object, format)?;
    std::fs::write(path.as_ref(), rendered)?;
    debug!(path = %path.as_ref().display(), %format, "Wrote configuration document");
    Ok(())
}
