//! Draw records as returned by the gacha log endpoint.
//!
//! The vendor sends every field as a JSON string. Decoding goes through
//! [`DrawRecord::from_value`] so callers pick what happens when that
//! assumption breaks: [`FieldPolicy::Coerce`] stringifies the value,
//! [`FieldPolicy::Strict`] rejects the record.

use std::cmp::Ordering;
use std::collections::{BTreeMap, HashSet};

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum DecodeError {
    #[error("expected a JSON object, got {0}")]
    NotAnObject(&'static str),
    #[error("missing required field `{0}`")]
    MissingField(&'static str),
    #[error("field `{field}` is {kind}, expected a string")]
    NonString { field: String, kind: &'static str },
}

/// How to treat a record field whose JSON value is not a string.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum FieldPolicy {
    /// `null` becomes "", scalars their JSON text, arrays/objects compact JSON.
    #[default]
    Coerce,
    /// Any non-string field fails the whole record.
    Strict,
}

/// One draw event.
///
/// The five named fields are the ones the report needs. Everything else the
/// vendor sends (`uid`, `gacha_type`, `item_id`, `count`, `lang`, ...) is kept
/// in `extra` so persisted files stay complete.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DrawRecord {
    pub time: String,
    pub name: String,
    pub item_type: String,
    pub rank_type: String,
    pub id: String,
    #[serde(flatten)]
    pub extra: BTreeMap<String, String>,
}

/// A pool entry from the config endpoint's `gacha_type_list`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolDescriptor {
    pub key: String,
    pub name: String,
}

impl DrawRecord {
    /// Decode a single JSON object into a record.
    pub fn from_value(value: Value, policy: FieldPolicy) -> Result<Self, DecodeError> {
        let map = match value {
            Value::Object(map) => map,
            other => return Err(DecodeError::NotAnObject(json_kind(&other))),
        };

        let mut fields = BTreeMap::new();
        for (key, value) in map {
            let text = match value {
                Value::String(s) => s,
                other => match policy {
                    FieldPolicy::Strict => {
                        return Err(DecodeError::NonString {
                            field: key,
                            kind: json_kind(&other),
                        });
                    }
                    FieldPolicy::Coerce => {
                        tracing::trace!(field = %key, kind = json_kind(&other), "coercing field");
                        coerce(other)
                    }
                },
            };
            fields.insert(key, text);
        }

        let time = take(&mut fields, "time")?;
        let name = take(&mut fields, "name")?;
        let item_type = take(&mut fields, "item_type")?;
        let rank_type = take(&mut fields, "rank_type")?;
        let id = take(&mut fields, "id")?;

        Ok(Self {
            time,
            name,
            item_type,
            rank_type,
            id,
            extra: fields,
        })
    }

    /// Decode a JSON array of records, failing on the first bad element.
    pub fn from_values(values: Vec<Value>, policy: FieldPolicy) -> Result<Vec<Self>, DecodeError> {
        values
            .into_iter()
            .map(|v| Self::from_value(v, policy))
            .collect()
    }

    /// Look up any field by its vendor key.
    pub fn get(&self, key: &str) -> Option<&str> {
        match key {
            "time" => Some(&self.time),
            "name" => Some(&self.name),
            "item_type" => Some(&self.item_type),
            "rank_type" => Some(&self.rank_type),
            "id" => Some(&self.id),
            _ => self.extra.get(key).map(String::as_str),
        }
    }

    pub fn is_rank(&self, rank: &str) -> bool {
        self.rank_type == rank
    }
}

fn take(fields: &mut BTreeMap<String, String>, key: &'static str) -> Result<String, DecodeError> {
    fields.remove(key).ok_or(DecodeError::MissingField(key))
}

fn coerce(value: Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s,
        other => other.to_string(),
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// Order two draw ids numerically without parsing them.
///
/// Ids are decimal strings of varying length, so a shorter id is older.
pub fn compare_ids(a: &str, b: &str) -> Ordering {
    a.len().cmp(&b.len()).then_with(|| a.cmp(b))
}

/// Union a fresh fetch with previously persisted records.
///
/// Records are deduplicated by `id` (the fresh copy wins) and returned
/// newest-first, the order the endpoint uses.
pub fn merge_history(fresh: Vec<DrawRecord>, existing: Vec<DrawRecord>) -> Vec<DrawRecord> {
    let mut seen: HashSet<String> = fresh.iter().map(|r| r.id.clone()).collect();
    let mut merged = fresh;
    merged.extend(existing.into_iter().filter(|r| seen.insert(r.id.clone())));
    merged.sort_by(|a, b| compare_ids(&b.id, &a.id));
    merged
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(id: &str) -> DrawRecord {
        DrawRecord {
            time: "2021-03-01 12:00:00".into(),
            name: "Debate Club".into(),
            item_type: "武器".into(),
            rank_type: "3".into(),
            id: id.into(),
            extra: BTreeMap::new(),
        }
    }

    #[test]
    fn decodes_vendor_object() {
        let value = json!({
            "uid": "100000001",
            "gacha_type": "200",
            "item_id": "",
            "count": "1",
            "time": "2021-03-01 12:00:00",
            "name": "Debate Club",
            "lang": "zh-cn",
            "item_type": "武器",
            "rank_type": "3",
            "id": "1614571200000000001"
        });
        let rec = DrawRecord::from_value(value, FieldPolicy::Strict).unwrap();
        assert_eq!(rec.id, "1614571200000000001");
        assert_eq!(rec.name, "Debate Club");
        assert_eq!(rec.get("uid"), Some("100000001"));
        assert_eq!(rec.get("rank_type"), Some("3"));
        assert_eq!(rec.extra.len(), 5);
    }

    #[test]
    fn coerce_stringifies_non_strings() {
        let value = json!({
            "time": "t", "name": "n", "item_type": "i",
            "rank_type": 3, "id": "1", "count": 1, "item_id": null, "flag": true
        });
        let rec = DrawRecord::from_value(value, FieldPolicy::Coerce).unwrap();
        assert_eq!(rec.rank_type, "3");
        assert_eq!(rec.get("count"), Some("1"));
        assert_eq!(rec.get("item_id"), Some(""));
        assert_eq!(rec.get("flag"), Some("true"));
    }

    #[test]
    fn strict_rejects_non_strings() {
        let value = json!({
            "time": "t", "name": "n", "item_type": "i", "rank_type": 3, "id": "1"
        });
        let err = DrawRecord::from_value(value, FieldPolicy::Strict).unwrap_err();
        assert_eq!(
            err,
            DecodeError::NonString {
                field: "rank_type".into(),
                kind: "a number"
            }
        );
    }

    #[test]
    fn missing_field_is_reported() {
        let value = json!({ "time": "t", "name": "n", "item_type": "i", "rank_type": "3" });
        let err = DrawRecord::from_value(value, FieldPolicy::Coerce).unwrap_err();
        assert_eq!(err, DecodeError::MissingField("id"));
    }

    #[test]
    fn non_object_is_rejected() {
        let err = DrawRecord::from_value(json!(["a"]), FieldPolicy::Coerce).unwrap_err();
        assert_eq!(err, DecodeError::NotAnObject("an array"));
    }

    #[test]
    fn serializes_flat() {
        let mut rec = record("7");
        rec.extra.insert("uid".into(), "42".into());
        let value = serde_json::to_value(&rec).unwrap();
        assert_eq!(value["id"], "7");
        assert_eq!(value["uid"], "42");
        assert!(value.get("extra").is_none());
    }

    #[test]
    fn ids_compare_numerically() {
        assert_eq!(compare_ids("9", "10"), Ordering::Less);
        assert_eq!(compare_ids("123", "122"), Ordering::Greater);
        assert_eq!(compare_ids("5", "5"), Ordering::Equal);
    }

    #[test]
    fn merge_dedups_and_orders_newest_first() {
        let mut fresh_dup = record("30");
        fresh_dup.name = "fresh".into();
        let fresh = vec![record("40"), fresh_dup];
        let existing = vec![record("30"), record("20"), record("9")];

        let merged = merge_history(fresh, existing);
        let ids: Vec<&str> = merged.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, ["40", "30", "20", "9"]);
        assert_eq!(merged[1].name, "fresh");
    }

    #[test]
    fn merge_with_nothing_existing_keeps_fresh() {
        let merged = merge_history(vec![record("2"), record("1")], Vec::new());
        assert_eq!(merged.len(), 2);
        assert_eq!(merged[0].id, "2");
    }
}
