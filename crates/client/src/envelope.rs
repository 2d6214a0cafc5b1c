//! Normalization of the backend's response envelopes.
//!
//! Two conventions coexist on the backend:
//!
//! * a wrapped `{ "code": 0, "msg": "...", "data": ... }` envelope, where
//!   both `0` and `1` mean success;
//! * raw payloads: bare arrays, bare objects, or paged objects of the form
//!   `{ "records": [...], "total": n, "current": p, "size": s }`.
//!
//! [`Envelope`] classifies a response body once at the boundary so the
//! entity modules only ever see the payload.

use oa_core::page::Page;
use serde::de::{DeserializeOwned, Error as _};
use serde::{Deserialize, Deserializer};
use serde_json::Value;

use crate::error::ApiError;

/// Envelope codes the backend uses for success.
pub const SUCCESS_CODES: &[i64] = &[0, 1];

/// A classified response body.
#[derive(Debug, Clone, PartialEq)]
pub enum Envelope {
    Wrapped {
        code: i64,
        message: Option<String>,
        data: Value,
    },
    Raw(Value),
}

impl Envelope {
    /// Classify a response body.
    ///
    /// An object counts as wrapped when it has an integer `code` together
    /// with at least one of `data`, `msg` or `message`. Anything else,
    /// including entities that merely have a string `code` field, is raw.
    pub fn from_value(value: Value) -> Self {
        let mut map = match value {
            Value::Object(map) => map,
            other => return Self::Raw(other),
        };
        let code = map.get("code").and_then(Value::as_i64);
        let has_envelope_field = ["data", "msg", "message"]
            .iter()
            .any(|k| map.contains_key(*k));

        match code {
            Some(code) if has_envelope_field => {
                let message = ["msg", "message"]
                    .iter()
                    .filter_map(|k| map.get(*k).and_then(Value::as_str))
                    .find(|m| !m.trim().is_empty())
                    .map(str::to_string);
                let data = map.remove("data").unwrap_or(Value::Null);
                Self::Wrapped {
                    code,
                    message,
                    data,
                }
            }
            _ => Self::Raw(Value::Object(map)),
        }
    }

    /// Unwrap the payload, rejecting non-success codes with the server
    /// message.
    pub fn into_data(self) -> Result<Value, ApiError> {
        match self {
            Self::Wrapped { code, data, .. } if SUCCESS_CODES.contains(&code) => Ok(data),
            Self::Wrapped { code, message, .. } => Err(ApiError::Application {
                code,
                message: message.unwrap_or_else(|| format!("Request failed (code {code})")),
            }),
            Self::Raw(value) => Ok(value),
        }
    }
}

/// Decode a response body into `T` after unwrapping the envelope.
pub fn decode<T: serde::de::DeserializeOwned>(body: Value) -> Result<T, ApiError> {
    let data = Envelope::from_value(body).into_data()?;
    Ok(serde_json::from_value(data)?)
}

/// A list payload that is either paged or a bare array.
///
/// The shape is chosen from the JSON type, so a bad record reports its own
/// decode error instead of a generic mismatch.
#[derive(Debug)]
pub enum PageDto<T> {
    Paged {
        records: Vec<T>,
        total: Option<u64>,
        current: Option<u64>,
        size: Option<u64>,
    },
    List(Vec<T>),
}

#[derive(Deserialize)]
struct PagedFields<T> {
    #[serde(alias = "list", alias = "rows", alias = "items")]
    records: Vec<T>,
    #[serde(default, deserialize_with = "crate::de::opt_u64")]
    total: Option<u64>,
    #[serde(
        default,
        alias = "pageNum",
        alias = "page",
        deserialize_with = "crate::de::opt_u64"
    )]
    current: Option<u64>,
    #[serde(default, alias = "pageSize", deserialize_with = "crate::de::opt_u64")]
    size: Option<u64>,
}

impl<'de, T: DeserializeOwned> Deserialize<'de> for PageDto<T> {
    fn deserialize<D: Deserializer<'de>>(d: D) -> Result<Self, D::Error> {
        match Value::deserialize(d)? {
            Value::Null => Ok(Self::List(Vec::new())),
            items @ Value::Array(_) => serde_json::from_value(items)
                .map(Self::List)
                .map_err(D::Error::custom),
            fields @ Value::Object(_) => {
                let fields: PagedFields<T> =
                    serde_json::from_value(fields).map_err(D::Error::custom)?;
                Ok(Self::Paged {
                    records: fields.records,
                    total: fields.total,
                    current: fields.current,
                    size: fields.size,
                })
            }
            other => Err(D::Error::custom(format!(
                "expected a list or a paged object, got {other}"
            ))),
        }
    }
}

impl<T> PageDto<T> {
    pub fn into_page(self) -> Page<T> {
        match self {
            Self::List(records) => Page::from_list(records),
            Self::Paged {
                records,
                total,
                current,
                size,
            } => {
                let len = records.len() as u64;
                Page {
                    total: total.unwrap_or(len),
                    current: current.unwrap_or(1).max(1),
                    size: size.unwrap_or(len),
                    records,
                }
            }
        }
    }

    /// The records without paging metadata.
    pub fn into_records(self) -> Vec<T> {
        match self {
            Self::List(records) | Self::Paged { records, .. } => records,
        }
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;
    use serde_json::json;

    use super::*;

    #[test]
    fn success_codes_return_data_unchanged() {
        for code in SUCCESS_CODES {
            let data = json!({ "id": 7, "nested": { "list": [1, 2] } });
            let body = json!({ "code": code, "msg": "ok", "data": data.clone() });
            assert_eq!(Envelope::from_value(body).into_data().unwrap(), data);
        }
    }

    #[test]
    fn other_codes_reject_with_server_message() {
        let body = json!({ "code": 500, "msg": "Room already booked", "data": null });
        let err = Envelope::from_value(body).into_data().unwrap_err();
        assert_matches!(err, ApiError::Application { code: 500, ref message } if message == "Room already booked");
    }

    #[test]
    fn message_field_is_accepted() {
        let body = json!({ "code": 2, "message": "Denied" });
        let err = Envelope::from_value(body).into_data().unwrap_err();
        assert_eq!(err.to_string(), "Denied");
    }

    #[test]
    fn missing_message_gets_generic_text() {
        let body = json!({ "code": 42, "data": null });
        let err = Envelope::from_value(body).into_data().unwrap_err();
        assert_eq!(err.to_string(), "Request failed (code 42)");
    }

    #[test]
    fn wrapped_without_data_yields_null() {
        let body = json!({ "code": 0, "msg": "deleted" });
        assert_eq!(Envelope::from_value(body).into_data().unwrap(), Value::Null);
    }

    #[test]
    fn raw_array_passes_through() {
        let body = json!([{ "id": 1 }]);
        assert_eq!(Envelope::from_value(body.clone()), Envelope::Raw(body));
    }

    #[test]
    fn entity_with_string_code_is_raw() {
        let body = json!({ "id": 1, "name": "Administrator", "code": "admin" });
        assert_matches!(Envelope::from_value(body), Envelope::Raw(_));
    }

    #[test]
    fn paged_object_decodes_with_aliases() {
        let body = json!({
            "code": 1,
            "data": { "list": [1, 2, 3], "total": "23", "pageNum": 2, "pageSize": 3 }
        });
        let page = decode::<PageDto<u32>>(body).unwrap().into_page();
        assert_eq!(page.records, vec![1, 2, 3]);
        assert_eq!(page.total, 23);
        assert_eq!(page.current, 2);
        assert_eq!(page.size, 3);
    }

    #[test]
    fn bare_array_becomes_single_page() {
        let page = decode::<PageDto<u32>>(json!([4, 5])).unwrap().into_page();
        assert_eq!(page.total, 2);
        assert_eq!(page.current, 1);
    }

    #[test]
    fn bad_record_reports_its_own_error() {
        let body = json!({ "code": 0, "data": { "records": [1, "two"], "total": 2 } });
        let err = decode::<PageDto<u32>>(body).unwrap_err();
        assert_matches!(err, ApiError::Decode(_));
        let message = err.to_string();
        assert!(message.contains("invalid type"), "{message}");
        assert!(!message.contains("did not match any variant"), "{message}");
    }

    #[test]
    fn paged_object_without_records_names_the_field() {
        let err = decode::<PageDto<u32>>(json!({ "total": 0 })).unwrap_err();
        assert!(err.to_string().contains("records"), "{err}");
    }

    #[test]
    fn null_payload_is_an_empty_list() {
        let page = decode::<PageDto<u32>>(json!({ "code": 0, "data": null }))
            .unwrap()
            .into_page();
        assert!(page.records.is_empty());
        assert_eq!(page.total, 0);
    }
}
