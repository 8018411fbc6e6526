//! Top-level orchestration: precondition checks, configuration overlay,
//! root resolution, and the single output write.

use std::path::{Path, PathBuf};

use crate::config::{Config, Options};
use crate::error::Error;
use crate::format::Format;
use crate::paths;
use crate::store::{self, DocumentStore};

/// What a successful run touched. Consumed by the CLI summary and by watch
/// mode to decide which directories to monitor.
#[derive(Debug)]
pub struct BundleReport {
    /// Every source file that participated in the bundle, sorted.
    pub sources: Vec<PathBuf>,
}

/// Resolve the document tree rooted at `input` and write the bundled result
/// to `output`, replacing any existing file there. Nothing is written
/// unless the entire tree resolved; a failure leaves any existing output
/// untouched.
///
/// # Errors
///
/// Returns `Error::FileNotReadable` / `Error::OutputNotWritable` from the
/// preconditions, configuration errors from the overlay, any resolution
/// error from the store and walker, `Error::UnsupportedFormat` /
/// `Error::Serialize` for the output encoding, or `Error::Io` from the
/// final write.
pub fn generate_to_file(
    input: &Path,
    output: &Path,
    overrides: &Options,
) -> Result<BundleReport, Error> {
    let input = paths::absolutize(input)?;
    check_input_readable(&input)?;
    check_output_writable(output)?;

    let config = Config::resolve(&input, overrides)?;
    let mut store = DocumentStore::new();
    let doc = store::load(&config, &mut store, &input, None)?;

    let format = Format::from_path(output)?;
    let text = format.encode(output, &doc)?;
    std::fs::write(output, text)?;

    Ok(BundleReport {
        sources: store.sources(),
    })
}

/// Readability precondition on the input document.
///
/// # Errors
///
/// Returns `Error::FileNotReadable` if the input cannot be opened.
fn check_input_readable(path: &Path) -> Result<(), Error> {
    match std::fs::File::open(path) {
        Ok(_) => Ok(()),
        Err(_) => Err(Error::FileNotReadable {
            path: path.to_path_buf(),
        }),
    }
}

/// Writability precondition on the output path: a file that does not exist
/// yet is writable, an existing one must not be read-only.
///
/// # Errors
///
/// Returns `Error::OutputNotWritable` otherwise.
fn check_output_writable(path: &Path) -> Result<(), Error> {
    match std::fs::metadata(path) {
        Ok(meta) => {
            if meta.permissions().readonly() {
                Err(Error::OutputNotWritable {
                    path: path.to_path_buf(),
                })
            } else {
                Ok(())
            }
        },
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(_) => Err(Error::OutputNotWritable {
            path: path.to_path_buf(),
        }),
    }
}

#[cfg(test)]
#[allow(clippy::missing_panics_doc)]
mod tests {
    use serde_json::json;

    use super::*;

    fn write(dir: &Path, name: &str, content: &str) -> PathBuf {
        let path = dir.join(name);
        std::fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn bundles_yaml_input_to_json_output() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "pet.yaml", "name: dog\n");
        let input = write(dir.path(), "api.yaml", "pet:\n  $x-r-ref: ./pet.yaml\n");
        let output = dir.path().join("bundle.json");

        let report = generate_to_file(&input, &output, &Options::default()).unwrap();

        let written: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&output).unwrap()).unwrap();
        assert_eq!(written, json!({"pet": {"name": "dog"}}));
        assert_eq!(report.sources.len(), 2);
    }

    #[test]
    fn missing_input_fails_the_precondition() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("absent.yaml");
        let output = dir.path().join("out.json");

        let err = generate_to_file(&input, &output, &Options::default()).unwrap_err();
        assert!(matches!(err, Error::FileNotReadable { .. }));
    }

    #[test]
    fn failed_resolution_writes_no_output() {
        let dir = tempfile::tempdir().unwrap();
        let input = write(dir.path(), "api.yaml", "pet:\n  $x-r-ref: ./absent.yaml\n");
        let output = dir.path().join("out.json");

        let err = generate_to_file(&input, &output, &Options::default()).unwrap_err();
        assert!(matches!(err, Error::ReferenceTargetUnreadable { .. }));
        assert!(!output.exists());
    }

    #[test]
    fn unsupported_output_extension_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let input = write(dir.path(), "api.yaml", "x: 1\n");
        let output = dir.path().join("out.txt");

        let err = generate_to_file(&input, &output, &Options::default()).unwrap_err();
        assert!(matches!(err, Error::UnsupportedFormat { .. }));
        assert!(!output.exists());
    }

    #[test]
    fn existing_output_is_replaced() {
        let dir = tempfile::tempdir().unwrap();
        let input = write(dir.path(), "api.yaml", "x: 1\n");
        let output = write(dir.path(), "out.yaml", "stale: true\n");

        generate_to_file(&input, &output, &Options::default()).unwrap();

        let written = std::fs::read_to_string(&output).unwrap();
        assert!(written.contains("x: 1"));
        assert!(!written.contains("stale"));
    }
}
