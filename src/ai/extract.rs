//! Recover the JSON object embedded in free-form model output.
//!
//! Recovery is deliberately bounded: take the text between the first `{` and
//! the last `}` and parse it directly. Models often wrap the object in prose
//! or a ```json fence; both are tolerated. A reply that puts literal newlines
//! inside string values is invalid JSON and fails here. The prompt asks the
//! model to escape them, and no repair is attempted.

use std::collections::BTreeMap;

use serde_json::Value;
use thiserror::Error;

/// Field name to text, one entry per expected field.
pub type FieldMap = BTreeMap<String, String>;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExtractError {
    #[error("no JSON object found in response")]
    NoEnvelope,

    #[error("response is not valid JSON ({0})")]
    Malformed(String),

    #[error("response has none of the expected fields")]
    NoUsableFields,
}

/// Slice from the first `{` through the last `}`, if that is a valid span.
pub fn find_json_object(raw: &str) -> Option<&str> {
    let start = raw.find('{')?;
    let end = raw.rfind('}')?;
    if end < start {
        return None;
    }
    Some(&raw[start..=end])
}

/// Extract the expected fields from raw model output.
///
/// Missing fields come back as empty strings so a partial reply still yields
/// drafts. The call only fails when no expected field carries any text.
pub fn extract(raw: &str, expected_fields: &[&str]) -> Result<FieldMap, ExtractError> {
    extract_requiring(raw, expected_fields, expected_fields)
}

/// Like [`extract`], but only `content_fields` count as usable text.
///
/// Auxiliary fields such as `tags` are still returned, but a reply carrying
/// nothing else fails with [`ExtractError::NoUsableFields`].
pub fn extract_requiring(
    raw: &str,
    expected_fields: &[&str],
    content_fields: &[&str],
) -> Result<FieldMap, ExtractError> {
    let candidate = find_json_object(raw).ok_or(ExtractError::NoEnvelope)?;

    let value: Value =
        serde_json::from_str(candidate).map_err(|e| ExtractError::Malformed(e.to_string()))?;
    // A candidate spanning `{`..`}` that parses can only be an object
    let Value::Object(object) = value else {
        return Err(ExtractError::NoEnvelope);
    };

    let mut fields = FieldMap::new();
    let mut usable = 0usize;
    for &name in expected_fields {
        let text = object.get(name).map(value_to_text).unwrap_or_default();
        if content_fields.contains(&name) && !text.trim().is_empty() {
            usable += 1;
        }
        fields.insert(name.to_string(), text);
    }

    if usable == 0 {
        return Err(ExtractError::NoUsableFields);
    }

    Ok(fields)
}

fn value_to_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        // Models sometimes return tags as an array
        Value::Array(items) => items
            .iter()
            .map(value_to_text)
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>()
            .join(" "),
        other => other.to_string(),
    }
}
