//! Reference-string to absolute-path resolution.
//!
//! A reference is either absolute-style (leading separator), anchored at the
//! configured root path, or relative to the directory of the document that
//! contains it. Normalization is purely lexical: `.` and `..` collapse
//! without consulting the filesystem, so a reference may resolve to a path
//! that does not exist; readability is the caller's concern.

use std::path::{Component, Path, PathBuf};

use crate::error::Error;

/// Compute the absolute file path a reference points to.
///
/// `source` is the document containing the reference and must itself be
/// absolute; `root_path` anchors absolute-style references.
///
/// # Errors
///
/// Returns `Error::InvalidReferencePath` for an empty reference string.
pub fn resolve_reference(
    source: &Path,
    reference: &str,
    root_path: &Path,
) -> Result<PathBuf, Error> {
    if reference.is_empty() {
        return Err(Error::InvalidReferencePath {
            reference: reference.to_string(),
            document: source.to_path_buf(),
        });
    }

    let joined = if Path::new(reference).is_absolute() {
        // Absolute-style references are re-rooted, not taken literally:
        // `/pets.yaml` under root `/schemas` is `/schemas/pets.yaml`.
        root_path.join(reference.trim_start_matches(std::path::MAIN_SEPARATOR))
    } else {
        let source_dir = source.parent().unwrap_or(Path::new(""));
        source_dir.join(reference)
    };

    Ok(normalize_path(&joined))
}

/// Make a user-supplied path absolute against the current working directory,
/// then collapse `.` and `..` components.
///
/// # Errors
///
/// Returns `Error::Io` if the current directory cannot be determined.
pub fn absolutize(path: &Path) -> Result<PathBuf, Error> {
    if path.is_absolute() {
        return Ok(normalize_path(path));
    }
    let cwd = std::env::current_dir()?;
    Ok(normalize_path(&cwd.join(path)))
}

/// Collapse `.` and `..` components in a path without touching the
/// filesystem. Preserves leading `..` when there is nothing left to pop.
fn normalize_path(path: &Path) -> PathBuf {
    let mut components: Vec<Component<'_>> = Vec::new();
    for component in path.components() {
        push_normalized_component(&mut components, component);
    }
    components.iter().collect()
}

/// Handle a single path component during normalization.
/// Pops the last component for `..` when possible, preserves it otherwise.
fn push_normalized_component<'a>(
    components: &mut Vec<Component<'a>>,
    component: Component<'a>,
) {
    match component {
        Component::CurDir => {},
        Component::ParentDir => {
            let can_pop = matches!(
                components.last(),
                Some(c) if !matches!(c, Component::ParentDir | Component::RootDir)
            );
            if can_pop {
                components.pop();
            } else if !matches!(components.last(), Some(Component::RootDir)) {
                components.push(component);
            }
        },
        other => components.push(other),
    }
}
