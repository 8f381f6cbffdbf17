//! Draft generation pipeline.
//!
//! One generation is a single suspending sequence: build the instruction,
//! call the completion endpoint, extract the fields, assemble drafts and
//! replace the spark's draft list. Any failure leaves the stored drafts
//! untouched.

use std::sync::Arc;

use chrono::Utc;

use super::drafts::assemble;
use super::extract::extract_requiring;
use super::llm_client::CompletionClient;
use super::prompts::{build_envelope, variants_for};
use crate::error::{LuminaError, Result};
use crate::models::{Draft, Language, Persona, Spark};
use crate::storage::{SparkPatch, SparkStore};

pub struct DraftGenerator {
    sparks: SparkStore,
    client: Arc<dyn CompletionClient>,
}

impl DraftGenerator {
    pub fn new(sparks: SparkStore, client: Arc<dyn CompletionClient>) -> Self {
        Self { sparks, client }
    }

    /// Generate drafts for the stored spark `spark_id`.
    ///
    /// On success the spark's drafts are replaced and the new list returned.
    pub async fn generate(
        &self,
        spark_id: &str,
        persona: &Persona,
        language: Language,
    ) -> Result<Vec<Draft>> {
        let spark = self
            .sparks
            .get(spark_id)
            .await?
            .ok_or_else(|| LuminaError::NotFound(spark_id.to_string()))?;

        let drafts = self.drafts_for(&spark, persona, language).await?;

        // The spark may have been deleted while the request was in flight
        if !self
            .sparks
            .update(spark_id, SparkPatch::drafts(drafts.clone()))
            .await?
        {
            tracing::warn!(
                "[generator] Spark {} disappeared during generation, drafts dropped",
                spark_id
            );
        }

        Ok(drafts)
    }

    /// Run the pipeline for a spark without touching the store.
    pub async fn drafts_for(
        &self,
        spark: &Spark,
        persona: &Persona,
        language: Language,
    ) -> Result<Vec<Draft>> {
        if spark.text.trim().is_empty() {
            return Err(LuminaError::InvalidCapture(
                "spark has no text to generate from".to_string(),
            ));
        }

        let envelope = build_envelope(&spark.text, &spark.page_title, &spark.url, persona, language);

        tracing::info!(
            "[generator] Generating {} drafts for spark {} via {}",
            language,
            spark.id,
            self.client.description()
        );

        let raw = self.client.complete(&envelope.instruction).await.map_err(|e| {
            tracing::warn!("[generator] Completion failed for {}: {}", spark.id, e);
            e
        })?;

        let fields = extract_requiring(&raw, &envelope.expected_fields, &envelope.draft_fields)
            .map_err(|e| {
                tracing::warn!("[generator] Could not extract fields for {}: {}", spark.id, e);
                tracing::debug!("[generator] Raw completion: {}", raw);
                LuminaError::from(e)
            })?;

        let drafts = assemble(&fields, variants_for(language), Utc::now());
        tracing::info!("[generator] {} drafts ready for {}", drafts.len(), spark.id);
        Ok(drafts)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::testing::ScriptedClient;
    use crate::storage::LocalStore;

    fn spark() -> Spark {
        Spark::new(
            "Rust 1.80 stabilises LazyLock",
            "https://blog.rust-lang.org/x",
            "Announcing Rust",
            "blog.rust-lang.org",
            Utc::now(),
        )
    }

    #[tokio::test]
    async fn test_unknown_spark_is_not_found() {
        let client = ScriptedClient::replying("{}");
        let generator = DraftGenerator::new(SparkStore::new(LocalStore::memory()), client.clone());

        let err = generator
            .generate("missing", &Persona::default(), Language::En)
            .await
            .unwrap_err();

        assert!(matches!(err, LuminaError::NotFound(_)));
        assert_eq!(client.calls(), 0);
    }

    #[tokio::test]
    async fn test_instruction_carries_snippet_and_persona() {
        let client = ScriptedClient::replying(r#"{"tldr":"A"}"#);
        let sparks = SparkStore::new(LocalStore::memory());
        let spark = spark();
        sparks.create(spark.clone()).await.unwrap();
        let persona = Persona {
            role: "Staff Engineer".to_string(),
            ..Persona::default()
        };

        DraftGenerator::new(sparks, client.clone())
            .generate(&spark.id, &persona, Language::En)
            .await
            .unwrap();

        let instruction = client.last_instruction().unwrap();
        assert!(instruction.contains("Rust 1.80 stabilises LazyLock"));
        assert!(instruction.contains("Staff Engineer"));
    }

    #[tokio::test]
    async fn test_regeneration_replaces_drafts() {
        let sparks = SparkStore::new(LocalStore::memory());
        let spark = spark();
        sparks.create(spark.clone()).await.unwrap();

        let first = ScriptedClient::replying(r#"{"tldr":"one","perspective":"p","question":"q","story":"s"}"#);
        DraftGenerator::new(sparks.clone(), first)
            .generate(&spark.id, &Persona::default(), Language::En)
            .await
            .unwrap();

        let second = ScriptedClient::replying(r#"{"tldr":"two"}"#);
        DraftGenerator::new(sparks.clone(), second)
            .generate(&spark.id, &Persona::default(), Language::Ar)
            .await
            .unwrap();

        let stored = sparks.get(&spark.id).await.unwrap().unwrap();
        assert_eq!(stored.drafts.len(), 4);
        assert_eq!(stored.drafts[0].content, "two");
        assert_eq!(stored.drafts[1].content, "");
    }

    #[tokio::test]
    async fn test_client_error_leaves_drafts() {
        let sparks = SparkStore::new(LocalStore::memory());
        let spark = spark();
        sparks.create(spark.clone()).await.unwrap();

        let client = ScriptedClient::failing(LuminaError::QuotaExceeded("slow down".into()));
        let err = DraftGenerator::new(sparks.clone(), client)
            .generate(&spark.id, &Persona::default(), Language::En)
            .await
            .unwrap_err();

        assert!(err.is_quota());
        assert!(sparks.get(&spark.id).await.unwrap().unwrap().drafts.is_empty());
    }
}
