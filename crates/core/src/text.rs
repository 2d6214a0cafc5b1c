//! String splitting and joining for list-valued backend fields.
//!
//! The backend stores equipment and attendee lists as a single string.
//! Operators type them with either ASCII or full-width separators, so
//! splitting accepts all of them while joining always writes `,`.

use serde::Serializer;

/// Separators accepted when splitting a list field.
pub const LIST_DELIMITERS: &[char] = &['、', ',', '，'];

/// Separator used when sending a list back to the backend.
pub const JOIN_DELIMITER: &str = ",";

/// Split a delimited string into trimmed, non-empty items.
pub fn split_list(raw: &str) -> Vec<String> {
    raw.split(LIST_DELIMITERS)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// Join items into the backend's delimited representation.
pub fn join_list<S: AsRef<str>>(items: &[S]) -> String {
    items
        .iter()
        .map(|s| s.as_ref().trim())
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join(JOIN_DELIMITER)
}

/// `serialize_with` adapter writing a list field as a joined string.
pub fn serialize_joined<S>(items: &[String], serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.serialize_str(&join_list(items))
}

/// Case-insensitive substring match used by client-side list filters.
///
/// An empty or whitespace-only needle matches everything.
pub fn contains_ignore_case(haystack: &str, needle: &str) -> bool {
    let needle = needle.trim();
    needle.is_empty() || haystack.to_lowercase().contains(&needle.to_lowercase())
}
