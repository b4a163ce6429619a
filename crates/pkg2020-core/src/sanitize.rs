//! Identifier sanitization for entity keys.
//!
//! Free-text source values (organization names, degrees, project numbers)
//! become the local part of an entity IRI, so they are reduced to
//! `[A-Za-z0-9_]` and kept short.

/// Placeholder used when a value sanitizes to nothing.
pub const UNKNOWN_IDENTIFIER: &str = "Unknown";

/// Upper bound on a sanitized identifier, in characters.
pub const MAX_IDENTIFIER_LEN: usize = 100;

/// Convert arbitrary text into a stable identifier token.
///
/// Every character outside `[A-Za-z0-9_]` becomes `_`, runs of `_` collapse
/// to one, leading/trailing `_` are stripped and the result is truncated to
/// [`MAX_IDENTIFIER_LEN`]. An empty result becomes [`UNKNOWN_IDENTIFIER`].
///
/// The output is a fixed point: `sanitize(&sanitize(x)) == sanitize(x)`.
pub fn sanitize(text: &str) -> String {
    let mut out = String::with_capacity(text.len().min(MAX_IDENTIFIER_LEN));
    for c in text.chars() {
        let c = if c.is_ascii_alphanumeric() || c == '_' {
            c
        } else {
            '_'
        };
        if c == '_' && (out.is_empty() || out.ends_with('_')) {
            continue;
        }
        out.push(c);
        if out.len() == MAX_IDENTIFIER_LEN {
            break;
        }
    }
    // Truncation can leave a trailing separator behind
    while out.ends_with('_') {
        out.pop();
    }

    if out.is_empty() {
        UNKNOWN_IDENTIFIER.to_string()
    } else {
        out
    }
}

/// Build an entity key such as `Article_12345` from a class prefix and a raw
/// source value.
pub fn entity_key(prefix: &str, raw: &str) -> String {
    format!("{prefix}_{}", sanitize(raw))
}
