//! Image Locator Helpers
//!
//! A locator is the opaque string identifying a source image, typically a
//! URL. Remote requests always target the canonical form (query string
//! stripped); cache keys keep the full locator unless filename keying is
//! selected.

// == Canonical Form ==
/// Returns the canonical form of a locator: everything before the first `?`.
pub fn canonical(locator: &str) -> &str {
    match locator.split_once('?') {
        Some((base, _)) => base,
        None => locator,
    }
}

// == File Name ==
/// Returns the final path segment of the canonical locator.
pub fn file_name(locator: &str) -> &str {
    let base = canonical(locator);
    match base.rsplit_once('/') {
        Some((_, name)) => name,
        None => base,
    }
}

// == Extension ==
/// Returns the lowercased extension of a locator: the text after the last
/// `.`, with any query string stripped. Locators without a `.` yield the
/// whole (query-stripped) string, which will not match any format list.
pub fn extension(locator: &str) -> String {
    let after_dot = match locator.rsplit_once('.') {
        Some((_, ext)) => ext,
        None => locator,
    };
    canonical(after_dot).to_lowercase()
}
