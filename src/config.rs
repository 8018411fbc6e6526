use std::path::{Path, PathBuf};

use crate::error::Error;
use crate::paths;
use crate::pointer;

/// Default location of the shared definitions mapping in the root document.
pub const DEFAULT_DEFINITIONS_POINTER: &str = "/definitions";
/// Default marker key triggering full inline substitution.
pub const DEFAULT_REPLACE_TOKEN: &str = "$x-r-ref";
/// Default marker key triggering register-and-link substitution.
pub const DEFAULT_DEFINE_REFERENCE_TOKEN: &str = "$x-d-ref";
/// Default key used in emitted link mappings.
pub const DEFAULT_REFERENCE_TOKEN: &str = "$ref";

/// Per-invocation option overrides, as collected from the command line.
/// `None` fields fall through to the config file and then to defaults.
#[derive(Debug, Clone, Default)]
pub struct Options {
    /// Override for the define-reference marker key.
    pub define_reference_token: Option<String>,
    /// Override for the definitions pointer.
    pub definitions_pointer: Option<String>,
    /// Override for the emitted link key.
    pub reference_token: Option<String>,
    /// Override for the replace marker key.
    pub replace_token: Option<String>,
    /// Override for the absolute-reference root path.
    pub root_path: Option<PathBuf>,
}

/// Raw TOML structure for `.schemalink.toml`.
#[derive(serde::Deserialize)]
struct SchemalinkTomlConfig {
    #[serde(default)]
    define_reference_token: Option<String>,
    #[serde(default)]
    definitions_pointer: Option<String>,
    #[serde(default)]
    reference_token: Option<String>,
    #[serde(default)]
    replace_token: Option<String>,
    #[serde(default)]
    root_path: Option<PathBuf>,
}

impl SchemalinkTomlConfig {
    /// Load `.schemalink.toml` from the given directory.
    /// Returns an all-`None` config if the file doesn't exist.
    /// Returns an error if the file exists but is malformed, never a silent
    /// fall back to defaults when the user wrote a config file.
    ///
    /// # Errors
    ///
    /// Returns `Error::Io` if reading fails (other than not-found),
    /// or `Error::TomlDe` if the TOML is malformed.
    fn load(dir: &Path) -> Result<Self, Error> {
        let path = dir.join(".schemalink.toml");
        let content = match std::fs::read_to_string(&path) {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Ok(Self {
                    define_reference_token: None,
                    definitions_pointer: None,
                    reference_token: None,
                    replace_token: None,
                    root_path: None,
                });
            },
            Err(e) => return Err(Error::Io(e)),
        };

        Ok(toml::from_str(&content)?)
    }
}

/// Effective configuration for one resolution run: defaults overlaid with
/// the config file next to the input document, overlaid with command-line
/// options, all paths absolute and the definitions pointer pre-parsed.
#[derive(Debug, Clone)]
pub struct Config {
    /// Marker key triggering register-and-link substitution.
    pub define_reference_token: String,
    /// Location of the shared definitions mapping, parsed to reference
    /// tokens.
    pub definitions_tokens: Vec<String>,
    /// Key used in emitted link mappings.
    pub reference_token: String,
    /// Marker key triggering full inline substitution.
    pub replace_token: String,
    /// Base for absolute-style reference paths.
    pub root_path: PathBuf,
}

impl Config {
    /// Build the effective configuration for a run on `input`, which must
    /// already be an absolute path.
    ///
    /// # Errors
    ///
    /// Returns `Error::Io`/`Error::TomlDe` from config file loading, or
    /// `Error::InvalidPointer` if the effective definitions pointer is
    /// malformed.
    pub fn resolve(input: &Path, overrides: &Options) -> Result<Self, Error> {
        let input_dir = input.parent().unwrap_or(Path::new("/")).to_path_buf();
        let file = SchemalinkTomlConfig::load(&input_dir)?;

        let definitions_pointer = overrides
            .definitions_pointer
            .clone()
            .or(file.definitions_pointer)
            .unwrap_or_else(|| DEFAULT_DEFINITIONS_POINTER.to_string());
        let definitions_tokens = pointer::parse(&definitions_pointer)?;

        // A file-config root path is relative to the input's directory; a
        // command-line one is relative to the working directory.
        let root_path = match (&overrides.root_path, file.root_path) {
            (Some(cli), _) => paths::absolutize(cli)?,
            (None, Some(from_file)) => {
                if from_file.is_absolute() {
                    from_file
                } else {
                    paths::absolutize(&input_dir.join(from_file))?
                }
            },
            (None, None) => input_dir,
        };

        Ok(Self {
            define_reference_token: overrides
                .define_reference_token
                .clone()
                .or(file.define_reference_token)
                .unwrap_or_else(|| DEFAULT_DEFINE_REFERENCE_TOKEN.to_string()),
            definitions_tokens,
            reference_token: overrides
                .reference_token
                .clone()
                .or(file.reference_token)
                .unwrap_or_else(|| DEFAULT_REFERENCE_TOKEN.to_string()),
            replace_token: overrides
                .replace_token
                .clone()
                .or(file.replace_token)
                .unwrap_or_else(|| DEFAULT_REPLACE_TOKEN.to_string()),
            root_path,
        })
    }
}
