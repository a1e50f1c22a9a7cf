//! core/multi_value.rs
//!
//! Packing ordered lists into text slots and getting them back out.
//!
//! Two storage styles exist across the formats:
//! - one physical slot per value (Vorbis entries, ID3v2.4 NUL-separated values)
//! - one physical slot for the whole list (ID3v1, ID3v2.3, RIFF INFO on write)
//!
//! Write path: pick a separator that none of the values contain, join.
//! Read path: one slot -> split on the first known separator present;
//! several slots -> each slot is one value, never split further.

/// Separators in priority order. Double-character forms come first so that
/// e.g. `//` is never mistaken for two `/` splits.
pub const SEPARATORS: [&str; 6] = ["//", "\\\\", ";", "\\", "/", ","];

/// Used when every candidate collides with some value. The result is
/// ambiguous on read; that's accepted rather than failing the write.
pub const FALLBACK_SEPARATOR: &str = ",";

/// Trim each value and drop empty / whitespace-only ones.
pub fn sanitize<S: AsRef<str>>(values: &[S]) -> Vec<String> {
    values
        .iter()
        .map(|v| v.as_ref().trim())
        .filter(|v| !v.is_empty())
        .map(str::to_owned)
        .collect()
}

/// First separator (by priority) that occurs in none of `values`.
pub fn choose_separator<S: AsRef<str>>(values: &[S]) -> &'static str {
    SEPARATORS
        .into_iter()
        .find(|sep| values.iter().all(|v| !v.as_ref().contains(sep)))
        .unwrap_or(FALLBACK_SEPARATOR)
}

/// Sanitize then join into a single slot. `None` when nothing survives.
pub fn join<S: AsRef<str>>(values: &[S]) -> Option<String> {
    let clean = sanitize(values);
    if clean.is_empty() {
        return None;
    }
    let sep = choose_separator(&clean);
    Some(clean.join(sep))
}

/// Split one slot on the first separator (by priority) it contains.
pub fn split(slot: &str) -> Vec<String> {
    match SEPARATORS.into_iter().find(|sep| slot.contains(sep)) {
        Some(sep) => sanitize(&slot.split(sep).collect::<Vec<_>>()),
        None => sanitize(&[slot]),
    }
}

/// Turn the physical slots a container yielded into the list value.
///
/// - 0 slots, or nothing left after sanitation -> `None`
/// - 1 slot -> smart split
/// - several slots -> one value each, no split
pub fn parse_slots<S: AsRef<str>>(slots: &[S]) -> Option<Vec<String>> {
    let values = match slots {
        [] => return None,
        [only] => split(only.as_ref()),
        many => sanitize(many),
    };
    if values.is_empty() { None } else { Some(values) }
}
