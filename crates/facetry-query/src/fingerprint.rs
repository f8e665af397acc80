//! Stable fingerprints of the search term and filter, used to detect
//! whether cached totals and facets still apply.

/// Hex-encoded BLAKE3 digest of `text`.
pub fn fingerprint(text: &str) -> String {
    blake3::hash(text.as_bytes()).to_hex().to_string()
}

/// Fingerprint of optional text; `None` hashes like the empty string.
pub fn fingerprint_opt(text: Option<&str>) -> String {
    fingerprint(text.unwrap_or_default())
}
