//! Filename hygiene for client-supplied names.
//!
//! Client names appear in scratch paths, download filenames, and archive
//! entry names, so they are reduced to a safe stem first: any directory
//! components are discarded and the remainder is restricted to a portable
//! character set. Scratch uniqueness never depends on the client name.

const MAX_STEM_LEN: usize = 64;
const FALLBACK_STEM: &str = "upload";

/// Reduce a client-supplied name to a safe filename stem.
///
/// Path separators split the name and only the final component is kept;
/// characters outside `[A-Za-z0-9._-]` are replaced with `_`; leading dots
/// are stripped so a name can never become a dotfile; the result is capped
/// at 64 characters and never empty.
#[must_use]
pub fn sanitize_stem(raw: &str) -> String {
    let last = raw
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or(raw)
        .trim_start_matches('.');

    let mut stem: String = last
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') {
                c
            } else {
                '_'
            }
        })
        .take(MAX_STEM_LEN)
        .collect();

    if stem.trim_matches('_').is_empty() {
        stem = FALLBACK_STEM.to_string();
    }
    stem
}

/// Split a client filename into a sanitized stem and its lowercase extension.
#[must_use]
pub fn split_file_name(filename: &str) -> (String, String) {
    let sanitized = sanitize_stem(filename);
    match sanitized.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() && !ext.is_empty() => {
            (stem.to_string(), ext.to_ascii_lowercase())
        }
        _ => (sanitized, String::new()),
    }
}
