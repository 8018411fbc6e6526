//! RFC 6901 JSON Pointer operations over parsed document trees.
//!
//! `serde_json::Value` ships a read-only `pointer()` accessor; resolution
//! needs to write, remove, and enumerate as well, so the full token-level
//! surface lives here. Tokens are kept as parsed vectors between operations
//! and only compiled back to pointer strings at the edges.

use serde_json::{Map, Value};

use crate::error::Error;

/// Parse a pointer string into unescaped reference tokens.
/// The empty string addresses the document root and parses to no tokens.
///
/// # Errors
///
/// Returns `Error::InvalidPointer` if a non-empty pointer does not start
/// with `/`.
pub fn parse(pointer: &str) -> Result<Vec<String>, Error> {
    if pointer.is_empty() {
        return Ok(Vec::new());
    }
    let Some(rest) = pointer.strip_prefix('/') else {
        return Err(Error::InvalidPointer {
            pointer: pointer.to_string(),
        });
    };
    Ok(rest.split('/').map(unescape).collect())
}

/// Compile reference tokens back into a pointer string.
pub fn compile(tokens: &[String]) -> String {
    let mut pointer = String::new();
    for token in tokens {
        pointer.push('/');
        pointer.push_str(&escape(token));
    }
    pointer
}

/// Escape a reference token: `~` becomes `~0`, `/` becomes `~1`.
pub fn escape(token: &str) -> String {
    token.replace('~', "~0").replace('/', "~1")
}

/// Unescape a reference token: `~1` becomes `/`, then `~0` becomes `~`.
fn unescape(token: &str) -> String {
    token.replace("~1", "/").replace("~0", "~")
}

/// Read the value addressed by `tokens`, if present.
pub fn get<'a>(doc: &'a Value, tokens: &[String]) -> Option<&'a Value> {
    let mut node = doc;
    for token in tokens {
        node = match node {
            Value::Object(map) => map.get(token)?,
            Value::Array(items) => {
                let index = parse_array_index(token, items.len())?;
                items.get(index)?
            },
            _ => return None,
        };
    }
    Some(node)
}

/// Write `value` at the location addressed by `tokens`, creating missing
/// intermediate mappings along the way. Scalars in the middle of the path
/// are replaced by mappings, mirroring how the tree would have been built
/// had the path existed. Writing past the end of an array appends only at
/// the next free index.
pub fn set(doc: &mut Value, tokens: &[String], value: Value) {
    let Some((last, parents)) = tokens.split_last() else {
        *doc = value;
        return;
    };

    let mut node = doc;
    for token in parents {
        node = child_or_create(node, token);
    }

    match node {
        Value::Array(items) => {
            let len = items.len();
            match parse_array_index(last, len) {
                Some(index) if index < len => {
                    if let Some(slot) = items.get_mut(index) {
                        *slot = value;
                    }
                },
                Some(index) if index == len => items.push(value),
                _ => {},
            }
        },
        Value::Object(map) => {
            map.insert(last.clone(), value);
        },
        other => {
            let mut map = Map::new();
            map.insert(last.clone(), value);
            *other = Value::Object(map);
        },
    }
}

/// Remove the entry addressed by `tokens`. Removing the root or a path that
/// does not exist is a no-op. Mapping removals preserve the order of the
/// remaining keys.
pub fn remove(doc: &mut Value, tokens: &[String]) {
    let Some((last, parents)) = tokens.split_last() else {
        return;
    };
    let Some(parent) = get_mut(doc, parents) else {
        return;
    };
    match parent {
        Value::Array(items) => {
            let len = items.len();
            if let Some(index) = parse_array_index(last, len)
                && index < len
            {
                items.remove(index);
            }
        },
        Value::Object(map) => {
            map.remove(last);
        },
        _ => {},
    }
}

/// Enumerate the paths of every leaf in the document, in document order.
/// A leaf is any scalar, or an empty mapping or sequence. The root itself
/// counts as a leaf when the document is a bare scalar.
pub fn leaves(doc: &Value) -> Vec<Vec<String>> {
    let mut paths = Vec::new();
    let mut prefix = Vec::new();
    collect_leaf_paths(doc, &mut prefix, &mut paths);
    paths
}

/// Mutable variant of `get`.
fn get_mut<'a>(doc: &'a mut Value, tokens: &[String]) -> Option<&'a mut Value> {
    let mut node = doc;
    for token in tokens {
        node = match node {
            Value::Object(map) => map.get_mut(token)?,
            Value::Array(items) => {
                let index = parse_array_index(token, items.len())?;
                items.get_mut(index)?
            },
            _ => return None,
        };
    }
    Some(node)
}

/// Descend one step, creating a mapping when the step cannot be taken.
/// Existing array elements are descended into by index; anything else that
/// cannot host the step is replaced by a fresh mapping.
fn child_or_create<'a>(node: &'a mut Value, token: &str) -> &'a mut Value {
    // Decide before borrowing for the caller: the slot test must not hold
    // a borrow across the mapping fallback below.
    let in_bounds = match &*node {
        Value::Array(items) => {
            parse_array_index(token, items.len()).filter(|i| *i < items.len())
        },
        _ => None,
    };

    match in_bounds {
        Some(index) => array_slot(node, index),
        None => {
            if !node.is_object() {
                *node = Value::Object(Map::new());
            }
            match node {
                Value::Object(map) => map.entry(token.to_string()).or_insert(Value::Null),
                _ => unreachable!("node coerced to mapping"),
            }
        },
    }
}

/// In-bounds array element access, split out so the borrow of the element
/// is unconditional on this path.
fn array_slot(node: &mut Value, index: usize) -> &mut Value {
    match node {
        Value::Array(items) => match items.get_mut(index) {
            Some(slot) => slot,
            None => unreachable!("array index verified in bounds"),
        },
        _ => unreachable!("array checked before indexing"),
    }
}

/// Depth-first leaf collection threading the current path prefix.
fn collect_leaf_paths(node: &Value, prefix: &mut Vec<String>, paths: &mut Vec<Vec<String>>) {
    match node {
        Value::Object(map) if !map.is_empty() => {
            for (key, child) in map {
                prefix.push(key.clone());
                collect_leaf_paths(child, prefix, paths);
                prefix.pop();
            }
        },
        Value::Array(items) if !items.is_empty() => {
            for (index, child) in items.iter().enumerate() {
                prefix.push(index.to_string());
                collect_leaf_paths(child, prefix, paths);
                prefix.pop();
            }
        },
        _ => paths.push(prefix.clone()),
    }
}

/// Interpret a token as an array index. `-` addresses one past the end.
fn parse_array_index(token: &str, len: usize) -> Option<usize> {
    if token == "-" {
        return Some(len);
    }
    token.parse().ok()
}
