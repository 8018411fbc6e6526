//! Reference walker: finds marker keys in a parsed document and rewrites
//! them with resolved content.
//!
//! Marker occurrences are collected up front in document order, then
//! processed strictly one at a time. Sequential processing is what makes
//! definition naming deterministic when several markers in one document
//! collide on the same base name, and it means every marker sees the tree
//! exactly as earlier rewrites left it.

use std::path::Path;

use serde_json::Value;

use crate::config::Config;
use crate::error::Error;
use crate::paths;
use crate::pointer;
use crate::registry;
use crate::store::{self, DocumentStore};

/// Which marker a leaf key matched.
#[derive(Debug, Clone, Copy)]
enum MarkerKind {
    /// Register the target in the definitions mapping and link to it.
    Define,
    /// Inline the target's content in place of the marker's parent.
    Replace,
}

/// One marker occurrence found during collection.
struct Marker {
    /// What the marker asks for.
    kind: MarkerKind,
    /// Leaf path of the marker key within the document.
    path: Vec<String>,
}

/// Resolve every marker in `doc`, mutating it in place.
///
/// `source` is the file `doc` was loaded from; relative references resolve
/// against its directory. `root` is the run's root document, owner of the
/// definitions mapping, or `None` when `doc` itself is the root.
///
/// # Errors
///
/// Returns the first error any marker resolution produces; the document is
/// left partially rewritten and must be discarded by the caller.
pub fn resolve_references(
    config: &Config,
    store: &mut DocumentStore,
    doc: &mut Value,
    source: &Path,
    mut root: Option<&mut Value>,
) -> Result<(), Error> {
    let markers = collect_markers(config, doc);
    for marker in markers {
        resolve_marker(config, store, doc, source, root.as_deref_mut(), &marker)?;
    }
    Ok(())
}

/// Enumerate leaf paths and keep those whose final segment is a marker key.
fn collect_markers(config: &Config, doc: &Value) -> Vec<Marker> {
    pointer::leaves(doc)
        .into_iter()
        .filter_map(|path| {
            let kind = match path.last() {
                Some(key) if *key == config.replace_token => MarkerKind::Replace,
                Some(key) if *key == config.define_reference_token => MarkerKind::Define,
                _ => return None,
            };
            Some(Marker { kind, path })
        })
        .collect()
}

/// Resolve a single marker occurrence: load the target through the store
/// (which resolves the target's own references first), then rewrite.
fn resolve_marker(
    config: &Config,
    store: &mut DocumentStore,
    doc: &mut Value,
    source: &Path,
    mut root: Option<&mut Value>,
    marker: &Marker,
) -> Result<(), Error> {
    // An earlier inline substitution may have removed this branch.
    let Some(value) = pointer::get(doc, &marker.path) else {
        return Ok(());
    };
    let Some(reference) = value.as_str() else {
        return Err(Error::InvalidReferencePath {
            reference: value.to_string(),
            document: source.to_path_buf(),
        });
    };
    let reference = reference.to_string();

    let target = paths::resolve_reference(source, &reference, &config.root_path)?;
    check_target_readable(&target, source)?;

    let content = {
        let root_for_load: &mut Value = match root.as_deref_mut() {
            Some(r) => r,
            None => &mut *doc,
        };
        store::load(config, store, &target, Some(root_for_load))?
    };

    match marker.kind {
        MarkerKind::Replace => {
            let parent = parent_path(&marker.path);
            pointer::set(doc, parent, content);
        },
        MarkerKind::Define => {
            let base = definition_base_name(&target);
            let link = {
                let root_doc: &mut Value = match root.as_deref_mut() {
                    Some(r) => r,
                    None => &mut *doc,
                };
                registry::register(root_doc, config, &base, &content)
            };
            pointer::remove(doc, &marker.path);
            let mut link_path = parent_path(&marker.path).to_vec();
            link_path.push(config.reference_token.clone());
            pointer::set(doc, &link_path, Value::String(link));
        },
    }

    Ok(())
}

/// The marker's parent path: everything but the final segment.
fn parent_path(path: &[String]) -> &[String] {
    path.split_last().map_or(path, |(_, parents)| parents)
}

/// Base name for a definition: the target file's name without extension.
fn definition_base_name(target: &Path) -> String {
    target
        .file_stem()
        .map_or_else(|| "definition".to_string(), |s| s.to_string_lossy().into_owned())
}

/// Readability precondition on a reference target, checked before the
/// store gets involved so the error names the referencing document.
///
/// # Errors
///
/// Returns `Error::ReferenceTargetUnreadable` if the target cannot be
/// opened for reading.
fn check_target_readable(target: &Path, source: &Path) -> Result<(), Error> {
    match std::fs::File::open(target) {
        Ok(_) => Ok(()),
        Err(_) => Err(Error::ReferenceTargetUnreadable {
            path: target.to_path_buf(),
            referenced_from: source.to_path_buf(),
        }),
    }
}
