//! URL slug derivation for posts and categories

use regex::Regex;
use std::sync::OnceLock;

use super::id_generator::random_hex;

fn disallowed_chars() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[^a-zA-Z0-9\s-]").expect("valid slug regex"))
}

fn separators() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[\s_-]+").expect("valid separator regex"))
}

/// Derive a slug from free text.
///
/// Anything other than ASCII letters, digits, whitespace and `-` is dropped,
/// the rest is lowercased and runs of whitespace/`_`/`-` become one `-`.
/// Text with nothing usable left yields a random 8-character hex token.
pub fn slugify(text: &str) -> String {
    let stripped = disallowed_chars().replace_all(text, "");
    let lowered = stripped.trim().to_lowercase();
    let slug = separators().replace_all(&lowered, "-");

    if slug.is_empty() {
        random_hex(4)
    } else {
        slug.into_owned()
    }
}

/// `base` plus a short random disambiguating suffix, e.g. `hello-world-3fa9`
pub fn with_suffix(base: &str) -> String {
    format!("{}-{}", base, random_hex(2))
}
