//! Collection slug derivation.
//!
//! The underlying stores never see non-ASCII namespace identifiers. A
//! department name resolves to a slug in three steps: explicit alias table,
//! ASCII sanitization, and a hash fallback for names with no usable ASCII
//! content (e.g. purely Korean department names without an alias).

use std::collections::HashMap;

/// Length of the hex prefix in hash-derived slugs.
const HASH_SLUG_LEN: usize = 12;

/// Derive a stable ASCII slug for a department name.
pub fn collection_slug(name: &str, aliases: &HashMap<String, String>) -> String {
    if let Some(alias) = aliases.get(name.trim()) {
        return sanitize(alias);
    }

    let sanitized = sanitize(name);
    if !sanitized.is_empty() {
        return sanitized;
    }

    // No usable ASCII characters; derive a stable hash slug.
    let digest = blake3::hash(name.trim().as_bytes());
    let hex = digest.to_hex();
    format!("dept-{}", &hex.as_str()[..HASH_SLUG_LEN])
}

/// Lowercase, map runs of non-alphanumeric ASCII to single dashes, drop
/// everything else.
fn sanitize(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    let mut last_dash = true;
    for c in name.trim().chars() {
        if c.is_ascii_alphanumeric() {
            slug.push(c.to_ascii_lowercase());
            last_dash = false;
        } else if c.is_ascii() && !last_dash {
            slug.push('-');
            last_dash = true;
        }
        // Non-ASCII characters contribute nothing.
    }
    slug.trim_matches('-').to_string()
}
