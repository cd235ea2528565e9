use crate::error::{AwxError, Result};
use serde::Serialize;
use serde_json::Value;

/// Encode a list options value into query pairs.
///
/// Field names map to query keys through serde (`#[serde(rename = "...")]`).
/// Zero values are omitted: `null`, `""`, `0`, `false` and empty sequences.
/// Sequences produce one pair per element. Options must serialize to a flat
/// object; `()` yields no pairs.
///
/// ```
/// use serde::Serialize;
///
/// #[derive(Serialize)]
/// struct ListJobs {
///     #[serde(rename = "launch_type")]
///     launch_type: String,
///     #[serde(rename = "schedule__id")]
///     schedule_id: u32,
/// }
///
/// let pairs = awx_client::query::encode(&ListJobs {
///     launch_type: "scheduled".into(),
///     schedule_id: 0,
/// })
/// .unwrap();
/// assert_eq!(pairs, vec![("launch_type".to_string(), "scheduled".to_string())]);
/// ```
pub fn encode<O>(options: &O) -> Result<Vec<(String, String)>>
where
    O: Serialize + ?Sized,
{
    let fields = match serde_json::to_value(options)? {
        Value::Null => return Ok(Vec::new()),
        Value::Object(fields) => fields,
        other => {
            return Err(AwxError::Other(format!(
                "list options must serialize to an object, got {}",
                kind(&other)
            )))
        }
    };

    let mut pairs = Vec::new();
    for (key, value) in fields {
        match value {
            Value::Array(items) => {
                for item in items {
                    if let Some(text) = scalar(&key, item)? {
                        pairs.push((key.clone(), text));
                    }
                }
            }
            value => {
                if let Some(text) = scalar(&key, value)? {
                    pairs.push((key, text));
                }
            }
        }
    }
    Ok(pairs)
}

fn scalar(key: &str, value: Value) -> Result<Option<String>> {
    match value {
        Value::Null => Ok(None),
        Value::Bool(false) => Ok(None),
        Value::Bool(true) => Ok(Some("true".to_string())),
        Value::Number(n) => {
            let zero = n.as_i64() == Some(0) || n.as_u64() == Some(0) || n.as_f64() == Some(0.0);
            Ok((!zero).then(|| n.to_string()))
        }
        Value::String(s) if s.is_empty() => Ok(None),
        Value::String(s) => Ok(Some(s)),
        other => Err(AwxError::Other(format!(
            "list option '{}' must be a scalar or a sequence of scalars, got {}",
            key,
            kind(&other)
        ))),
    }
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    #[derive(Serialize, Default)]
    struct ListJobsInput {
        id: String,
        launch_type: String,
        #[serde(rename = "schedule__id")]
        schedule_id: i32,
        query: String,
    }

    #[derive(Serialize, Default)]
    struct InventoryListInput {
        #[serde(skip)]
        #[allow(dead_code)]
        query: String,
        name: String,
    }

    #[test]
    fn test_encode_omits_empty_fields() {
        let pairs = encode(&ListJobsInput {
            id: "1".to_string(),
            ..Default::default()
        })
        .unwrap();
        assert_eq!(pairs, vec![("id".to_string(), "1".to_string())]);
    }

    #[test]
    fn test_encode_renamed_field() {
        let pairs = encode(&ListJobsInput {
            schedule_id: 12,
            launch_type: "scheduled".to_string(),
            ..Default::default()
        })
        .unwrap();
        assert!(pairs.contains(&("schedule__id".to_string(), "12".to_string())));
        assert!(pairs.contains(&("launch_type".to_string(), "scheduled".to_string())));
        assert_eq!(pairs.len(), 2);
    }

    #[test]
    fn test_encode_skipped_field() {
        let pairs = encode(&InventoryListInput {
            query: "ignored".to_string(),
            name: "prod".to_string(),
        })
        .unwrap();
        assert_eq!(pairs, vec![("name".to_string(), "prod".to_string())]);
    }

    #[test]
    fn test_encode_unit_and_none() {
        assert!(encode(&()).unwrap().is_empty());
        assert!(encode(&Option::<ListJobsInput>::None).unwrap().is_empty());
    }

    #[test]
    fn test_encode_sequence_repeats_key() {
        let mut options = BTreeMap::new();
        options.insert("status", vec!["failed", "", "error"]);
        let pairs = encode(&options).unwrap();
        assert_eq!(
            pairs,
            vec![
                ("status".to_string(), "failed".to_string()),
                ("status".to_string(), "error".to_string()),
            ]
        );
    }

    #[test]
    fn test_encode_rejects_nested_objects() {
        let options = serde_json::json!({"filter": {"name": "x"}});
        assert!(matches!(encode(&options), Err(AwxError::Other(_))));
    }

    #[test]
    fn test_encode_rejects_non_object() {
        assert!(encode(&"name=x").is_err());
    }

    #[test]
    fn test_encode_leaves_values_unescaped() {
        let options = serde_json::json!({"name": "a b&c", "page_size": 50});
        let pairs = encode(&options).unwrap();
        assert_eq!(
            pairs,
            vec![
                ("name".to_string(), "a b&c".to_string()),
                ("page_size".to_string(), "50".to_string()),
            ]
        );
    }
}
