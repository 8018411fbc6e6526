//! Definition registry: promotes resolved content into the root document's
//! shared definitions mapping under a collision-free name.
//!
//! Names derive from the referenced file's stem. A name maps to exactly one
//! content value: registering equal content under a taken name reuses the
//! existing entry, differing content gets a `-1`, `-2`, … suffix until a
//! free or matching slot is found.

use serde_json::Value;

use crate::config::Config;
use crate::pointer;

/// Register `content` in the root document's definitions mapping and return
/// the internal link to it, of the form `#<definitionsPointer>/<name>`.
///
/// Registration is idempotent: content equal to an existing entry resolves
/// to that entry's link without rewriting anything.
pub fn register(root: &mut Value, config: &Config, base_name: &str, content: &Value) -> String {
    let mut name = base_name.to_string();
    let mut suffix = 0_u32;
    while is_collision(root, config, &name, content) {
        suffix = suffix.saturating_add(1);
        name = format!("{base_name}-{suffix}");
    }

    let mut tokens = config.definitions_tokens.clone();
    tokens.push(name);
    pointer::set(root, &tokens, content.clone());

    return format!("#{}", pointer::compile(&tokens));
}

/// A name collides when it is already taken by content that differs from
/// the candidate.
fn is_collision(root: &Value, config: &Config, name: &str, content: &Value) -> bool {
    let mut tokens = config.definitions_tokens.clone();
    tokens.push(name.to_string());
    return match pointer::get(root, &tokens) {
        Some(existing) => existing != content,
        None => false,
    };
}
