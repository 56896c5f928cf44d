//! # pgscratch Utilities
//!
//! Pure helpers for naming ephemeral databases and quoting identifiers.
//!
//! Nothing in this crate touches a database, so every property of the
//! naming scheme is testable in isolation.

use sha2::{Digest, Sha256};

/// Maximum identifier length PostgreSQL keeps (NAMEDATALEN - 1).
pub const MAX_IDENTIFIER_LEN: usize = 63;

/// Hex characters of the SHA-256 digest used as the name suffix (64 bits).
pub const SUFFIX_HEX_LEN: usize = 16;

/// Longest sanitised prefix kept from the source database name.
pub const MAX_PREFIX_LEN: usize = MAX_IDENTIFIER_LEN - 1 - SUFFIX_HEX_LEN;

/// Derive the ephemeral database name for one run.
///
/// The result is `<prefix>_<suffix>` where `prefix` is the source name
/// lowercased, with every character outside `[a-z0-9_]` replaced by `_`,
/// prefixed with `db_` when empty or starting with a digit, and truncated to
/// [`MAX_PREFIX_LEN`] bytes. `suffix` is the first [`SUFFIX_HEX_LEN`] hex
/// characters of `SHA-256(source || 0x00 || seed_le)`.
///
/// The same `(source, seed)` always yields the same name, so a logged seed
/// reproduces a run. Two runs of one source with independent random seeds
/// collide with probability about n² / 2⁶⁵ over n runs.
///
/// # Examples
///
/// ```
/// use utils::derive_test_db_name;
///
/// let name = derive_test_db_name("app", 7);
/// assert!(name.starts_with("app_"));
/// assert!(name.len() <= 63);
/// ```
#[must_use]
pub fn derive_test_db_name(source: &str, seed: u64) -> String {
    let mut hasher = Sha256::new();
    hasher.update(source.as_bytes());
    hasher.update([0u8]);
    hasher.update(seed.to_le_bytes());
    let digest = hex::encode(hasher.finalize());

    format!("{}_{}", sanitize_prefix(source), &digest[..SUFFIX_HEX_LEN])
}

fn sanitize_prefix(source: &str) -> String {
    let mut prefix: String = source
        .chars()
        .map(|c| {
            let c = c.to_ascii_lowercase();
            if c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect();

    if prefix.is_empty() || prefix.starts_with(|c: char| c.is_ascii_digit()) {
        prefix.insert_str(0, "db_");
    }

    // Only ASCII remains, so byte truncation cannot split a character.
    prefix.truncate(MAX_PREFIX_LEN);
    prefix
}

/// Whether `candidate` has the shape of a name [`derive_test_db_name`]
/// produces for `source`, for any seed.
#[must_use]
pub fn is_ephemeral_name_for(source: &str, candidate: &str) -> bool {
    let prefix = sanitize_prefix(source);
    let Some(rest) = candidate.strip_prefix(prefix.as_str()) else {
        return false;
    };
    let Some(suffix) = rest.strip_prefix('_') else {
        return false;
    };

    suffix.len() == SUFFIX_HEX_LEN
        && suffix
            .chars()
            .all(|c| c.is_ascii_digit() || ('a'..='f').contains(&c))
}

/// Whether `name` is usable as an unquoted PostgreSQL identifier.
#[must_use]
pub fn is_valid_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    let Some(first) = chars.next() else {
        return false;
    };

    name.len() <= MAX_IDENTIFIER_LEN
        && (first.is_ascii_lowercase() || first == '_')
        && chars.all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_')
}

/// Generate a fresh seed for [`derive_test_db_name`].
#[must_use]
pub fn random_seed() -> u64 {
    rand::random()
}

/// Double-quote a single identifier, doubling embedded quotes.
#[must_use]
pub fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

/// Split a possibly schema-qualified name (`schema.table`) into its parts.
///
/// Dots inside a double-quoted part belong to that part, and `""` inside
/// quotes stands for one `"`, so `"order.items"` is a single part.
#[must_use]
pub fn split_qualified_ident(name: &str) -> Vec<String> {
    let mut parts = Vec::new();
    let mut current = String::new();
    let mut quoted = false;
    let mut chars = name.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '"' if quoted && chars.peek() == Some(&'"') => {
                current.push('"');
                chars.next();
            }
            '"' => quoted = !quoted,
            '.' if !quoted => parts.push(std::mem::take(&mut current)),
            _ => current.push(c)
        }
    }
    parts.push(current);
    parts
}

/// Quote a possibly schema-qualified name part by part, each part exactly
/// once. Parts already in double quotes are unwrapped first.
#[must_use]
pub fn quote_qualified_ident(name: &str) -> String {
    split_qualified_ident(name)
        .iter()
        .map(|part| quote_ident(part))
        .collect::<Vec<_>>()
        .join(".")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_derive_is_deterministic_per_seed() {
        assert_eq!(derive_test_db_name("app", 1), derive_test_db_name("app", 1));
    }

    #[test]
    fn test_different_seeds_give_different_names() {
        let names: HashSet<String> = (0..1000).map(|seed| derive_test_db_name("app", seed)).collect();
        assert_eq!(names.len(), 1000);
    }

    #[test]
    fn test_different_sources_same_seed_differ_in_suffix() {
        let a = derive_test_db_name("app", 9);
        let b = derive_test_db_name("App", 9);
        assert_ne!(a, b, "sanitised prefixes match but the hash covers the raw name");
        assert!(a.starts_with("app_") && b.starts_with("app_"));
    }

    #[test]
    fn test_derived_names_are_valid_identifiers() {
        let sources = [
            "app",
            "App-Production",
            "",
            "9lives",
            "über_db",
            "with space",
            "a".repeat(63).as_str(),
            "x".repeat(200).as_str()
        ]
        .map(|s| s.to_string());

        for source in &sources {
            for seed in [0, 1, u64::MAX] {
                let name = derive_test_db_name(source, seed);
                assert!(
                    is_valid_identifier(&name),
                    "{:?} derived invalid name {:?}",
                    source,
                    name
                );
                assert!(name.len() <= MAX_IDENTIFIER_LEN);
                assert!(is_ephemeral_name_for(source, &name));
            }
        }
    }

    #[test]
    fn test_prefix_sanitisation() {
        assert!(derive_test_db_name("My-App", 0).starts_with("my_app_"));
        assert!(derive_test_db_name("9lives", 0).starts_with("db_9lives_"));
        assert!(derive_test_db_name("", 0).starts_with("db__"));
    }

    #[test]
    fn test_suffix_shape() {
        let name = derive_test_db_name("app", 123);
        let suffix = name.rsplit('_').next().unwrap();
        assert_eq!(suffix.len(), SUFFIX_HEX_LEN);
        assert!(suffix.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_is_ephemeral_name_for_rejects_foreign_names() {
        assert!(!is_ephemeral_name_for("app", "app"));
        assert!(!is_ephemeral_name_for("app", "app_prod"));
        assert!(!is_ephemeral_name_for("app", "application_0123456789abcdef"));
        assert!(!is_ephemeral_name_for("app", "app_0123456789ABCDEF"));
        assert!(is_ephemeral_name_for("app", "app_0123456789abcdef"));
    }

    #[test]
    fn test_random_seed_varies() {
        let seeds: HashSet<u64> = (0..16).map(|_| random_seed()).collect();
        assert!(seeds.len() > 1);
    }

    #[test]
    fn test_quote_ident() {
        assert_eq!(quote_ident("users"), "\"users\"");
        assert_eq!(quote_ident("we\"ird"), "\"we\"\"ird\"");
        assert_eq!(quote_qualified_ident("public.users"), "\"public\".\"users\"");
    }

    #[test]
    fn test_split_keeps_dots_inside_quotes() {
        assert_eq!(split_qualified_ident("users"), vec!["users"]);
        assert_eq!(split_qualified_ident("audit.events"), vec!["audit", "events"]);
        assert_eq!(split_qualified_ident("\"order.items\""), vec!["order.items"]);
        assert_eq!(
            split_qualified_ident("sales.\"order.items\""),
            vec!["sales", "order.items"]
        );
        assert_eq!(split_qualified_ident("\"we\"\"ird\""), vec!["we\"ird"]);
    }

    #[test]
    fn test_quoted_names_are_quoted_once() {
        assert_eq!(quote_qualified_ident("\"order.items\""), "\"order.items\"");
        assert_eq!(
            quote_qualified_ident("\"Sales\".\"order.items\""),
            "\"Sales\".\"order.items\""
        );
        assert_eq!(quote_qualified_ident("\"we\"\"ird\""), "\"we\"\"ird\"");
    }
}
