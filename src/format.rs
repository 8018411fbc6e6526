/// Document format resolution and decode/encode dispatch by file extension.
use std::path::Path;

use serde_json::Value;

use crate::error::Error;

/// A supported document format. Every format decodes to and encodes from
/// the same in-memory tree, so documents of mixed formats compose freely.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    /// `.json`
    Json,
    /// `.yaml` / `.yml`
    Yaml,
}

impl Format {
    /// Map a file extension to its format.
    ///
    /// # Errors
    ///
    /// Returns `Error::UnsupportedFormat` for unknown extensions.
    pub fn from_path(path: &Path) -> Result<Self, Error> {
        let ext = path.extension().and_then(|e| return e.to_str()).unwrap_or("");

        match ext {
            "json" => Ok(Format::Json),
            "yaml" | "yml" => Ok(Format::Yaml),
            _ => Err(Error::UnsupportedFormat {
                path: path.to_path_buf(),
            }),
        }
    }

    /// Decode document text into a tree.
    ///
    /// YAML decodes through `serde_yaml` directly into the JSON tree type,
    /// so semantically identical JSON and YAML inputs produce identical
    /// trees. YAML mappings with non-string keys are rejected here.
    ///
    /// # Errors
    ///
    /// Returns `Error::Parse` naming `path` if decoding fails.
    pub fn decode(self, path: &Path, text: &str) -> Result<Value, Error> {
        match self {
            Format::Json => serde_json::from_str(text).map_err(|e| Error::Parse {
                path: path.to_path_buf(),
                reason: e.to_string(),
            }),
            Format::Yaml => serde_yaml::from_str(text).map_err(|e| Error::Parse {
                path: path.to_path_buf(),
                reason: e.to_string(),
            }),
        }
    }

    /// Encode a tree as document text.
    ///
    /// # Errors
    ///
    /// Returns `Error::Serialize` naming `path` if encoding fails.
    pub fn encode(self, path: &Path, doc: &Value) -> Result<String, Error> {
        match self {
            Format::Json => serde_json::to_string_pretty(doc).map_err(|e| Error::Serialize {
                path: path.to_path_buf(),
                reason: e.to_string(),
            }),
            Format::Yaml => serde_yaml::to_string(doc).map_err(|e| Error::Serialize {
                path: path.to_path_buf(),
                reason: e.to_string(),
            }),
        }
    }
}
