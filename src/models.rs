//! Core records: Sparks, their Drafts, and the persona used to steer generation.
//!
//! Field names serialize in camelCase with millisecond timestamps so the
//! persisted layout matches what the browser extension writes.

use chrono::{DateTime, SubsecRound, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A captured piece of source text plus its provenance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Spark {
    /// Opaque unique identifier, immutable once created
    pub id: String,
    /// The captured text
    pub text: String,
    /// Source page URL
    pub url: String,
    /// Source page title
    pub page_title: String,
    /// URL host, derived once at capture time
    pub domain: String,
    /// When the snippet was captured
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub captured_at: DateTime<Utc>,
    /// Generated drafts, in generation order
    #[serde(default)]
    pub drafts: Vec<Draft>,
}

impl Spark {
    /// Create a spark with a fresh identifier and no drafts.
    pub fn new(
        text: impl Into<String>,
        url: impl Into<String>,
        page_title: impl Into<String>,
        domain: impl Into<String>,
        captured_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: new_id(),
            text: text.into(),
            url: url.into(),
            page_title: page_title.into(),
            domain: domain.into(),
            // Stored as epoch millis; match that precision in memory
            captured_at: captured_at.trunc_subsecs(3),
            drafts: Vec::new(),
        }
    }

    /// Sample spark for trying the flow without a browser.
    pub fn demo() -> Self {
        Self::new(
            "The best engineers I know don't just write code. They understand the business \
             context. They ask 'why' before 'how.' This shift in mindset is what separates good \
             from great.",
            "https://medium.com/engineering-leadership/what-makes-great-engineers",
            "What Makes Great Engineers Stand Out",
            "medium.com",
            Utc::now(),
        )
    }

    pub fn has_drafts(&self) -> bool {
        !self.drafts.is_empty()
    }

    pub fn draft(&self, draft_id: &str) -> Option<&Draft> {
        self.drafts.iter().find(|d| d.id == draft_id)
    }
}

/// The kind of social-post variant a draft represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DraftKind {
    /// The practical win
    Tldr,
    /// The insight behind the tech
    Perspective,
    /// A discussion question about a trade-off
    Question,
    /// A short mentorship scenario
    Story,
}

impl DraftKind {
    /// Canonical generation order.
    pub const ALL: [DraftKind; 4] = [
        DraftKind::Tldr,
        DraftKind::Perspective,
        DraftKind::Question,
        DraftKind::Story,
    ];

    /// JSON field name the model is asked to fill for this kind.
    pub fn field(&self) -> &'static str {
        match self {
            DraftKind::Tldr => "tldr",
            DraftKind::Perspective => "perspective",
            DraftKind::Question => "question",
            DraftKind::Story => "story",
        }
    }

    /// Human-facing label.
    pub fn label(&self) -> &'static str {
        match self {
            DraftKind::Tldr => "TL;DR",
            DraftKind::Perspective => "Perspective",
            DraftKind::Question => "Question",
            DraftKind::Story => "Story",
        }
    }
}

impl std::fmt::Display for DraftKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.field())
    }
}

impl std::str::FromStr for DraftKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "tldr" => Ok(DraftKind::Tldr),
            "perspective" => Ok(DraftKind::Perspective),
            "question" => Ok(DraftKind::Question),
            "story" => Ok(DraftKind::Story),
            other => Err(format!("Unknown draft kind: {}", other)),
        }
    }
}

/// One generated post variant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Draft {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: DraftKind,
    pub content: String,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub created_at: DateTime<Utc>,
    /// Set only by an explicit user edit
    #[serde(default)]
    pub is_edited: bool,
}

impl Draft {
    pub fn new(kind: DraftKind, content: impl Into<String>, created_at: DateTime<Utc>) -> Self {
        Self {
            id: new_id(),
            kind,
            content: content.into(),
            created_at: created_at.trunc_subsecs(3),
            is_edited: false,
        }
    }
}

/// User-configured voice used to steer generation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Persona {
    pub role: String,
    pub tone: String,
    pub industry: String,
}

impl Default for Persona {
    fn default() -> Self {
        Self {
            role: "Software Engineer".to_string(),
            tone: "Professional yet conversational".to_string(),
            industry: "Technology".to_string(),
        }
    }
}

/// Output language for generated drafts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    #[default]
    En,
    /// Egyptian Arabic (Ammiya)
    Ar,
}

impl std::fmt::Display for Language {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Language::En => write!(f, "en"),
            Language::Ar => write!(f, "ar"),
        }
    }
}

impl std::str::FromStr for Language {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "en" => Ok(Language::En),
            "ar" => Ok(Language::Ar),
            other => Err(format!("Unsupported language: {}", other)),
        }
    }
}

/// Raw capture from the browser: selection text plus page metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CaptureEvent {
    pub text: String,
    pub url: String,
    #[serde(default)]
    pub page_title: String,
}

impl CaptureEvent {
    pub fn new(
        text: impl Into<String>,
        url: impl Into<String>,
        page_title: impl Into<String>,
    ) -> Self {
        Self {
            text: text.into(),
            url: url.into(),
            page_title: page_title.into(),
        }
    }
}

fn new_id() -> String {
    Uuid::new_v4().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_spark_serializes_extension_layout() {
        let mut spark = Spark::new(
            "text",
            "https://example.com/a",
            "Title",
            "example.com",
            DateTime::from_timestamp_millis(1_700_000_000_000).unwrap(),
        );
        spark
            .drafts
            .push(Draft::new(DraftKind::Tldr, "body", spark.captured_at));

        let json = serde_json::to_value(&spark).unwrap();
        assert_eq!(json["pageTitle"], "Title");
        assert_eq!(json["capturedAt"], 1_700_000_000_000i64);
        assert_eq!(json["drafts"][0]["type"], "tldr");
        assert_eq!(json["drafts"][0]["isEdited"], false);
    }

    #[test]
    fn test_fresh_records_equal_their_stored_form() {
        let at = DateTime::from_timestamp_nanos(1_700_000_000_123_456_789);
        let mut spark = Spark::new("text", "https://example.com", "T", "example.com", at);
        spark.drafts.push(Draft::new(DraftKind::Story, "body", at));

        assert_eq!(spark.captured_at.timestamp_subsec_nanos(), 123_000_000);
        let stored: Spark = serde_json::from_str(&serde_json::to_string(&spark).unwrap()).unwrap();
        assert_eq!(stored, spark);
    }

    #[test]
    fn test_spark_without_drafts_field_defaults_empty() {
        let json = r#"{
            "id": "abc",
            "text": "hi",
            "url": "https://example.com",
            "pageTitle": "Example",
            "domain": "example.com",
            "capturedAt": 1700000000000
        }"#;

        let spark: Spark = serde_json::from_str(json).unwrap();
        assert!(spark.drafts.is_empty());
        assert_eq!(spark.domain, "example.com");
    }

    #[test]
    fn test_draft_kind_parse_and_field() {
        assert_eq!("Story".parse::<DraftKind>().unwrap(), DraftKind::Story);
        assert!("tags".parse::<DraftKind>().is_err());
        assert_eq!(DraftKind::Tldr.field(), "tldr");
        assert_eq!(DraftKind::Tldr.label(), "TL;DR");
    }

    #[test]
    fn test_new_drafts_are_not_edited_and_unique() {
        let now = Utc::now();
        let a = Draft::new(DraftKind::Question, "a", now);
        let b = Draft::new(DraftKind::Question, "a", now);
        assert!(!a.is_edited);
        assert_ne!(a.id, b.id);
    }

    #[test]
    fn test_persona_partial_json_fills_defaults() {
        let persona: Persona = serde_json::from_str(r#"{"role":"Designer"}"#).unwrap();
        assert_eq!(persona.role, "Designer");
        assert_eq!(persona.industry, "Technology");
    }

    #[test]
    fn test_language_roundtrip_str() {
        assert_eq!("AR".parse::<Language>().unwrap(), Language::Ar);
        assert_eq!(Language::En.to_string(), "en");
        assert!("fr".parse::<Language>().is_err());
    }
}
