//! Lenient field deserializers for backend DTOs.
//!
//! The backend is inconsistent about scalar encodings: ids arrive as numbers
//! or as strings (64-bit ids are stringified for browser clients), flags as
//! booleans or `0`/`1`, lists as arrays or delimited strings, and optional
//! text as `null`. These helpers accept every observed form.

use oa_core::text::split_list;
use oa_core::types::{parse_timestamp, DbId, Timestamp};
use oa_core::user::UserStatus;
use serde::de::Error as _;
use serde::{Deserialize, Deserializer};
use serde_json::Value;

fn value_to_i64(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Required id: number or numeric string.
pub fn id<'de, D: Deserializer<'de>>(d: D) -> Result<DbId, D::Error> {
    let value = Value::deserialize(d)?;
    value_to_i64(&value).ok_or_else(|| D::Error::custom(format!("invalid id: {value}")))
}

/// Optional id. `null`, blank and non-numeric values become `None`.
pub fn opt_id<'de, D: Deserializer<'de>>(d: D) -> Result<Option<DbId>, D::Error> {
    let value = Option::<Value>::deserialize(d)?;
    Ok(value.as_ref().and_then(value_to_i64))
}

/// Optional non-negative count: number or numeric string.
pub fn opt_u64<'de, D: Deserializer<'de>>(d: D) -> Result<Option<u64>, D::Error> {
    let value = Option::<Value>::deserialize(d)?;
    Ok(value.as_ref().and_then(|v| match v {
        Value::Number(n) => n.as_u64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }))
}

/// Count that defaults to zero.
pub fn u64_or_zero<'de, D: Deserializer<'de>>(d: D) -> Result<u64, D::Error> {
    Ok(opt_u64(d)?.unwrap_or(0))
}

/// Small count such as a room capacity. `null`, missing, negative and
/// non-numeric values become zero.
pub fn u32_or_zero<'de, D: Deserializer<'de>>(d: D) -> Result<u32, D::Error> {
    let value = Option::<Value>::deserialize(d)?;
    Ok(value
        .as_ref()
        .and_then(value_to_i64)
        .and_then(|n| u32::try_from(n).ok())
        .unwrap_or(0))
}

/// Signed ordering key such as a department's sort order. `null`, missing
/// and non-numeric values become zero.
pub fn i32_or_zero<'de, D: Deserializer<'de>>(d: D) -> Result<i32, D::Error> {
    let value = Option::<Value>::deserialize(d)?;
    Ok(value
        .as_ref()
        .and_then(value_to_i64)
        .and_then(|n| i32::try_from(n).ok())
        .unwrap_or(0))
}

/// Nested collection where the backend sends `null` for "none".
pub fn vec_or_empty<'de, D, T>(d: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(Option::<Vec<T>>::deserialize(d)?.unwrap_or_default())
}

/// Account status: `1`/`0`, booleans, or words such as `"active"` and
/// `"disabled"`. Missing and `null` mean active.
pub fn user_status<'de, D: Deserializer<'de>>(d: D) -> Result<UserStatus, D::Error> {
    let value = Option::<Value>::deserialize(d)?;
    match &value {
        None | Some(Value::Null) => Ok(UserStatus::Active),
        Some(Value::Bool(true)) => Ok(UserStatus::Active),
        Some(Value::Bool(false)) => Ok(UserStatus::Disabled),
        Some(Value::Number(n)) => n
            .as_i64()
            .map(UserStatus::from_flag)
            .ok_or_else(|| D::Error::custom(format!("invalid user status: {n}"))),
        Some(Value::String(s)) => UserStatus::from_backend(s)
            .ok_or_else(|| D::Error::custom(format!("invalid user status: {s:?}"))),
        Some(other) => Err(D::Error::custom(format!("invalid user status: {other}"))),
    }
}

/// Text field: `null` becomes the empty string, scalars are stringified.
pub fn string<'de, D: Deserializer<'de>>(d: D) -> Result<String, D::Error> {
    let value = Option::<Value>::deserialize(d)?;
    Ok(match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s,
        Some(other) => other.to_string(),
    })
}

/// Optional text field: `null` and blank strings become `None`.
pub fn opt_string<'de, D: Deserializer<'de>>(d: D) -> Result<Option<String>, D::Error> {
    let s = string(d)?;
    Ok((!s.trim().is_empty()).then_some(s))
}

/// Boolean flag: `true`/`false`, `1`/`0`, or their string forms.
pub fn flag<'de, D: Deserializer<'de>>(d: D) -> Result<bool, D::Error> {
    Ok(opt_flag(d)?.unwrap_or(false))
}

/// Optional flag, `None` when missing or `null`.
pub fn opt_flag<'de, D: Deserializer<'de>>(d: D) -> Result<Option<bool>, D::Error> {
    let value = Option::<Value>::deserialize(d)?;
    match &value {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Bool(b)) => Ok(Some(*b)),
        Some(Value::Number(n)) => Ok(Some(n.as_i64().unwrap_or(0) != 0)),
        Some(Value::String(s)) => match s.trim().to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" => Ok(Some(true)),
            "0" | "false" | "no" | "" => Ok(Some(false)),
            _ => Err(D::Error::custom(format!("invalid flag: {s:?}"))),
        },
        Some(other) => Err(D::Error::custom(format!("invalid flag: {other}"))),
    }
}

/// First non-blank candidate, or the empty string.
///
/// Used where the backend may send several spellings of one field in the
/// same object; serde aliases reject that as a duplicate field.
pub fn first_text<const N: usize>(candidates: [String; N]) -> String {
    candidates
        .into_iter()
        .find(|s| !s.trim().is_empty())
        .unwrap_or_default()
}

/// List field: JSON array of strings or a delimited string.
pub fn list<'de, D: Deserializer<'de>>(d: D) -> Result<Vec<String>, D::Error> {
    let value = Option::<Value>::deserialize(d)?;
    Ok(match value {
        None | Some(Value::Null) => Vec::new(),
        Some(Value::String(s)) => split_list(&s),
        Some(Value::Array(items)) => items
            .into_iter()
            .filter_map(|item| match item {
                Value::String(s) => Some(s.trim().to_string()),
                Value::Null => None,
                other => Some(other.to_string()),
            })
            .filter(|s| !s.is_empty())
            .collect(),
        Some(other) => return Err(D::Error::custom(format!("invalid list: {other}"))),
    })
}

/// Timestamp: RFC 3339 / `yyyy-MM-dd HH:mm:ss` string or epoch millis.
pub fn timestamp<'de, D: Deserializer<'de>>(d: D) -> Result<Option<Timestamp>, D::Error> {
    let value = Option::<Value>::deserialize(d)?;
    Ok(match value {
        Some(Value::String(s)) => parse_timestamp(&s),
        Some(Value::Number(n)) => n
            .as_i64()
            .and_then(chrono::DateTime::<chrono::Utc>::from_timestamp_millis),
        _ => None,
    })
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[derive(Debug, Deserialize)]
    struct Sample {
        #[serde(deserialize_with = "id")]
        id: DbId,
        #[serde(default, deserialize_with = "opt_id")]
        parent: Option<DbId>,
        #[serde(default, deserialize_with = "string")]
        name: String,
        #[serde(default, deserialize_with = "flag")]
        enabled: bool,
        #[serde(default, deserialize_with = "list")]
        tags: Vec<String>,
        #[serde(default, deserialize_with = "timestamp")]
        at: Option<Timestamp>,
        #[serde(default, deserialize_with = "u32_or_zero")]
        capacity: u32,
        #[serde(default, deserialize_with = "i32_or_zero")]
        sort: i32,
        #[serde(default, deserialize_with = "vec_or_empty")]
        children: Vec<DbId>,
        #[serde(default = "active", deserialize_with = "user_status")]
        status: UserStatus,
    }

    fn active() -> UserStatus {
        UserStatus::Active
    }

    fn sample(value: Value) -> Sample {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn ids_accept_numbers_and_strings() {
        assert_eq!(sample(json!({ "id": 5 })).id, 5);
        assert_eq!(sample(json!({ "id": "1790000000000000001" })).id, 1790000000000000001);
        assert!(serde_json::from_value::<Sample>(json!({ "id": "abc" })).is_err());
    }

    #[test]
    fn optional_id_tolerates_junk() {
        assert_eq!(sample(json!({ "id": 1, "parent": null })).parent, None);
        assert_eq!(sample(json!({ "id": 1, "parent": "" })).parent, None);
        assert_eq!(sample(json!({ "id": 1, "parent": "9" })).parent, Some(9));
    }

    #[test]
    fn null_and_missing_text_is_empty() {
        assert_eq!(sample(json!({ "id": 1, "name": null })).name, "");
        assert_eq!(sample(json!({ "id": 1 })).name, "");
        assert_eq!(sample(json!({ "id": 1, "name": 12 })).name, "12");
    }

    #[test]
    fn flags_accept_bool_and_numbers() {
        assert!(sample(json!({ "id": 1, "enabled": true })).enabled);
        assert!(sample(json!({ "id": 1, "enabled": 1 })).enabled);
        assert!(sample(json!({ "id": 1, "enabled": "1" })).enabled);
        assert!(!sample(json!({ "id": 1, "enabled": 0 })).enabled);
        assert!(!sample(json!({ "id": 1 })).enabled);
    }

    #[test]
    fn lists_accept_arrays_and_delimited_strings() {
        assert_eq!(
            sample(json!({ "id": 1, "tags": "Projector、Whiteboard" })).tags,
            vec!["Projector", "Whiteboard"]
        );
        assert_eq!(
            sample(json!({ "id": 1, "tags": ["a", " b ", ""] })).tags,
            vec!["a", "b"]
        );
        assert!(sample(json!({ "id": 1, "tags": null })).tags.is_empty());
    }

    #[test]
    fn timestamps_accept_strings_and_millis() {
        let at = sample(json!({ "id": 1, "at": 1_700_000_000_000_i64 })).at.unwrap();
        assert_eq!(at.timestamp(), 1_700_000_000);
        assert!(sample(json!({ "id": 1, "at": "2024-01-02T03:04:05Z" })).at.is_some());
        assert!(sample(json!({ "id": 1, "at": "" })).at.is_none());
    }

    #[test]
    fn counts_tolerate_null_and_numeric_strings() {
        assert_eq!(sample(json!({ "id": 1, "capacity": null })).capacity, 0);
        assert_eq!(sample(json!({ "id": 1, "capacity": "20" })).capacity, 20);
        assert_eq!(sample(json!({ "id": 1, "capacity": 12 })).capacity, 12);
        assert_eq!(sample(json!({ "id": 1, "capacity": -3 })).capacity, 0);
        assert_eq!(sample(json!({ "id": 1, "sort": "-2" })).sort, -2);
        assert_eq!(sample(json!({ "id": 1, "sort": null })).sort, 0);
    }

    #[test]
    fn first_text_skips_blanks() {
        assert_eq!(first_text([String::new(), " ".into(), "Bob".into()]), "Bob");
        assert_eq!(first_text([String::new()]), "");
    }

    #[test]
    fn null_collection_is_empty() {
        assert!(sample(json!({ "id": 1, "children": null })).children.is_empty());
        assert_eq!(sample(json!({ "id": 1, "children": [2, 3] })).children, vec![2, 3]);
    }

    #[test]
    fn user_status_accepts_flags_bools_and_words() {
        let status = |v: Value| sample(json!({ "id": 1, "status": v })).status;
        assert_eq!(status(json!(1)), UserStatus::Active);
        assert_eq!(status(json!(0)), UserStatus::Disabled);
        assert_eq!(status(json!("1")), UserStatus::Active);
        assert_eq!(status(json!(true)), UserStatus::Active);
        assert_eq!(status(json!(false)), UserStatus::Disabled);
        assert_eq!(status(json!("active")), UserStatus::Active);
        assert_eq!(status(json!("ENABLED")), UserStatus::Active);
        assert_eq!(status(json!("disabled")), UserStatus::Disabled);
        assert_eq!(status(json!(null)), UserStatus::Active);
        assert_eq!(sample(json!({ "id": 1 })).status, UserStatus::Active);
        assert!(serde_json::from_value::<Sample>(json!({ "id": 1, "status": "archived" })).is_err());
    }
}
