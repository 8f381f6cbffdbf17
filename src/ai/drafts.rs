//! Turn extracted fields into Draft records.

use chrono::{DateTime, Utc};

use super::extract::FieldMap;
use super::prompts::TAGS_FIELD;
use crate::models::{Draft, DraftKind};

/// Build one draft per variant, in the given order.
///
/// When the reply carried a non-empty `tags` field, every draft gets the tag
/// line appended after a blank line. The returned list is meant to replace the
/// spark's drafts wholesale.
pub fn assemble(
    fields: &FieldMap,
    variant_order: &[DraftKind],
    generated_at: DateTime<Utc>,
) -> Vec<Draft> {
    let tags = fields
        .get(TAGS_FIELD)
        .map(|t| t.trim())
        .filter(|t| !t.is_empty());

    variant_order
        .iter()
        .map(|kind| {
            let body = fields.get(kind.field()).map(String::as_str).unwrap_or("");
            Draft::new(*kind, with_tags(body, tags), generated_at)
        })
        .collect()
}

fn with_tags(body: &str, tags: Option<&str>) -> String {
    match tags {
        Some(tags) => format!("{}\n\n{}", body, tags),
        None => body.to_string(),
    }
}
