//! Document store: loads documents and memoizes their resolution so each
//! distinct path is loaded and resolved at most once per run.
//!
//! The cache is an explicit state machine per absolute path. Resolution is
//! strictly sequential, so a request for a path that is still `InProgress`
//! can only mean the reference chain has looped back on itself; that is
//! reported as a cycle instead of recursing forever.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use serde_json::Value;

use crate::config::Config;
use crate::error::Error;
use crate::format::Format;
use crate::resolver;

/// Resolution state of one document path.
enum CacheState {
    /// The document is somewhere below us on the resolution stack.
    InProgress,
    /// The document is fully resolved.
    Resolved(Value),
}

/// Per-run load/resolution cache. Lives for exactly one top-level
/// resolution call; all state is discarded afterwards.
#[derive(Default)]
pub struct DocumentStore {
    cache: HashMap<PathBuf, CacheState>,
    in_flight: Vec<PathBuf>,
}

impl DocumentStore {
    /// Create an empty store for one run.
    pub fn new() -> Self {
        return Self::default();
    }

    /// Every path this store has loaded, in sorted order. Used for the
    /// run summary and to decide what watch mode should monitor.
    pub fn sources(&self) -> Vec<PathBuf> {
        let mut paths: Vec<PathBuf> = self.cache.keys().cloned().collect();
        paths.sort();
        return paths;
    }
}

/// Load the document at `path` and return it fully resolved: decoding is
/// immediately followed by reference resolution, so callers never observe
/// raw content. `root` carries the run's root document; `None` means the
/// document being loaded *is* the root.
///
/// # Errors
///
/// Returns `Error::UnsupportedFormat` for an unrecognized extension,
/// `Error::FileNotReadable` if the file cannot be read, `Error::Parse` if
/// decoding fails, `Error::CyclicReference` if `path` is already being
/// resolved further up the stack, or any error from resolving the
/// document's own references.
pub fn load(
    config: &Config,
    store: &mut DocumentStore,
    path: &Path,
    root: Option<&mut Value>,
) -> Result<Value, Error> {
    match store.cache.get(path) {
        Some(CacheState::Resolved(doc)) => return Ok(doc.clone()),
        Some(CacheState::InProgress) => {
            let mut chain = store.in_flight.clone();
            chain.push(path.to_path_buf());
            return Err(Error::CyclicReference { chain });
        },
        None => {},
    }

    let format = Format::from_path(path)?;
    let text = std::fs::read_to_string(path).map_err(|_err| {
        return Error::FileNotReadable {
            path: path.to_path_buf(),
        };
    })?;
    let mut doc = format.decode(path, &text)?;

    store.cache.insert(path.to_path_buf(), CacheState::InProgress);
    store.in_flight.push(path.to_path_buf());
    resolver::resolve_references(config, store, &mut doc, path, root)?;
    store.in_flight.pop();
    store.cache.insert(path.to_path_buf(), CacheState::Resolved(doc.clone()));

    return Ok(doc);
}

#[cfg(test)]
#[allow(clippy::missing_panics_doc)]
mod tests {
    use std::path::PathBuf;

    use serde_json::json;

    use super::*;
    use crate::config::Options;

    fn write(dir: &std::path::Path, name: &str, content: &str) -> PathBuf {
        let path = dir.join(name);
        std::fs::write(&path, content).unwrap();
        path
    }

    fn config_for(input: &std::path::Path) -> Config {
        Config::resolve(input, &Options::default()).unwrap()
    }

    #[test]
    fn document_without_markers_is_unchanged() {
        let dir = tempfile::tempdir().unwrap();
        let input = write(dir.path(), "single.yaml", "test: 1\ntestt: 2\n");

        let mut store = DocumentStore::new();
        let doc = load(&config_for(&input), &mut store, &input, None).unwrap();

        assert_eq!(doc, json!({"test": 1, "testt": 2}));
    }

    #[test]
    fn json_and_yaml_inputs_resolve_identically() {
        let dir = tempfile::tempdir().unwrap();
        let yaml = write(dir.path(), "single.yaml", "test: 1\ntestt: 2\n");
        let json_file = write(dir.path(), "single.json", r#"{"test": 1, "testt": 2}"#);

        let mut yaml_store = DocumentStore::new();
        let from_yaml = load(&config_for(&yaml), &mut yaml_store, &yaml, None).unwrap();
        let mut json_store = DocumentStore::new();
        let from_json = load(&config_for(&json_file), &mut json_store, &json_file, None).unwrap();

        assert_eq!(from_yaml, from_json);
    }

    #[test]
    fn references_resolve_across_formats_and_nesting() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "leaf.json", r#"{"json": true}"#);
        write(dir.path(), "mid.yaml", "nested:\n  $x-r-ref: ./leaf.json\n");
        let input = write(dir.path(), "root.yaml", "top:\n  $x-r-ref: ./mid.yaml\n");

        let mut store = DocumentStore::new();
        let doc = load(&config_for(&input), &mut store, &input, None).unwrap();

        assert_eq!(doc, json!({"top": {"nested": {"json": true}}}));
        assert_eq!(store.sources().len(), 3);
    }

    #[test]
    fn repeated_references_share_one_resolution() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "shared.yaml", "y: 2\n");
        let input = write(
            dir.path(),
            "root.yaml",
            "a:\n  $x-d-ref: ./shared.yaml\nb:\n  $x-d-ref: ./shared.yaml\n",
        );

        let mut store = DocumentStore::new();
        let doc = load(&config_for(&input), &mut store, &input, None).unwrap();

        // Both markers resolve to the same pointer; no `shared-1` appears.
        assert_eq!(
            doc,
            json!({
                "a": {"$ref": "#/definitions/shared"},
                "b": {"$ref": "#/definitions/shared"},
                "definitions": {"shared": {"y": 2}}
            })
        );
    }

    #[test]
    fn collisions_across_documents_get_suffixed_names() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("a")).unwrap();
        std::fs::create_dir(dir.path().join("b")).unwrap();
        write(dir.path(), "a/ref.yaml", "from: a\n");
        write(dir.path(), "b/ref.yaml", "from: b\n");
        write(dir.path(), "one.yaml", "part:\n  $x-d-ref: ./a/ref.yaml\n");
        write(dir.path(), "two.yaml", "part:\n  $x-d-ref: ./b/ref.yaml\n");
        let input = write(
            dir.path(),
            "root.yaml",
            "one:\n  $x-r-ref: ./one.yaml\ntwo:\n  $x-r-ref: ./two.yaml\n",
        );

        let mut store = DocumentStore::new();
        let doc = load(&config_for(&input), &mut store, &input, None).unwrap();

        // Two distinct files share the base name `ref`; both contents
        // survive under distinct registry entries.
        assert_eq!(
            doc,
            json!({
                "one": {"part": {"$ref": "#/definitions/ref"}},
                "two": {"part": {"$ref": "#/definitions/ref-1"}},
                "definitions": {"ref": {"from": "a"}, "ref-1": {"from": "b"}}
            })
        );
    }

    #[test]
    fn cyclic_references_fail_with_the_offending_chain() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "a.yaml", "b:\n  $x-r-ref: ./b.yaml\n");
        write(dir.path(), "b.yaml", "a:\n  $x-r-ref: ./a.yaml\n");
        let input = dir.path().join("a.yaml");

        let mut store = DocumentStore::new();
        let err = load(&config_for(&input), &mut store, &input, None).unwrap_err();

        let chain = match err {
            Error::CyclicReference { chain } => chain,
            other => panic!("expected CyclicReference, got {other:?}"),
        };
        assert_eq!(chain.first(), chain.last());
        assert_eq!(chain.len(), 3);
    }

    #[test]
    fn self_reference_is_a_cycle() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "a.yaml", "me:\n  $x-r-ref: ./a.yaml\n");
        let input = dir.path().join("a.yaml");

        let mut store = DocumentStore::new();
        let err = load(&config_for(&input), &mut store, &input, None).unwrap_err();
        assert!(matches!(err, Error::CyclicReference { .. }));
    }

    #[test]
    fn unsupported_extension_is_rejected_before_reading() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "notes.txt", "not a document");
        let input = write(dir.path(), "root.yaml", "x:\n  $x-r-ref: ./notes.txt\n");

        let mut store = DocumentStore::new();
        let err = load(&config_for(&input), &mut store, &input, None).unwrap_err();
        assert!(matches!(err, Error::UnsupportedFormat { .. }));
    }

    #[test]
    fn parse_failure_names_the_offending_file() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "broken.json", "{nope");
        let input = write(dir.path(), "root.yaml", "x:\n  $x-r-ref: ./broken.json\n");

        let mut store = DocumentStore::new();
        let err = load(&config_for(&input), &mut store, &input, None).unwrap_err();

        let path = match err {
            Error::Parse { path, .. } => path,
            other => panic!("expected Parse, got {other:?}"),
        };
        assert_eq!(path, dir.path().join("broken.json"));
    }
}
