//! Application state for the side-panel surface.
//!
//! `AppController` owns one explicit `AppState` value and is the only thing
//! that changes it. The spark store stays the source of truth: every mutation
//! writes through and then refreshes the cached list.

use std::sync::Arc;

use serde::Serialize;

use crate::ai::{create_completion_client, CompletionClient, DraftGenerator};
use crate::capture::{CaptureMessage, CaptureService};
use crate::error::{LuminaError, Result};
use crate::models::{CaptureEvent, Draft, Language, Spark};
use crate::settings::{Settings, SettingsManager};
use crate::storage::{SparkPatch, SparkStore};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum View {
    #[default]
    Home,
    Capture,
    Drafts,
    History,
    Settings,
}

impl View {
    /// Views that show no particular spark.
    fn clears_selection(&self) -> bool {
        matches!(self, View::Home | View::History | View::Settings)
    }
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AppState {
    pub view: View,
    pub sparks: Vec<Spark>,
    pub active_spark_id: Option<String>,
    /// Set for the duration of a generation, for surfaces rendering progress
    /// from a state snapshot
    pub is_generating: bool,
    pub settings: Settings,
    /// Last short confirmation for the user ("Spark deleted", ...)
    pub notice: Option<String>,
}

impl AppState {
    pub fn active_spark(&self) -> Option<&Spark> {
        let id = self.active_spark_id.as_deref()?;
        self.sparks.iter().find(|s| s.id == id)
    }
}

pub struct AppController {
    sparks: SparkStore,
    settings: Arc<SettingsManager>,
    capture: CaptureService,
    /// Fixed client; when unset one is built from the current settings
    client: Option<Arc<dyn CompletionClient>>,
    state: AppState,
}

impl AppController {
    pub fn new(
        sparks: SparkStore,
        settings: Arc<SettingsManager>,
        capture: CaptureService,
    ) -> Self {
        Self {
            sparks,
            settings,
            capture,
            client: None,
            state: AppState::default(),
        }
    }

    pub fn with_client(mut self, client: Arc<dyn CompletionClient>) -> Self {
        self.client = Some(client);
        self
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    pub fn capture_service(&self) -> &CaptureService {
        &self.capture
    }

    /// Read sparks and settings from storage.
    pub async fn load(&mut self) -> Result<()> {
        self.state.settings = self.settings.get().await;
        self.refresh().await
    }

    async fn refresh(&mut self) -> Result<()> {
        self.state.sparks = self.sparks.list().await?;
        if self.state.active_spark().is_none() {
            self.state.active_spark_id = None;
        }
        Ok(())
    }

    pub fn navigate(&mut self, view: View) {
        if view.clears_selection() {
            self.state.active_spark_id = None;
        }
        self.state.view = view;
    }

    /// Open a spark's drafts.
    pub fn select(&mut self, spark_id: &str) -> Result<()> {
        if !self.state.sparks.iter().any(|s| s.id == spark_id) {
            return Err(LuminaError::NotFound(spark_id.to_string()));
        }
        self.state.active_spark_id = Some(spark_id.to_string());
        self.state.view = View::Drafts;
        Ok(())
    }

    /// React to a `NEW_SPARK` from another surface.
    ///
    /// The spark was stored before the message was sent, so a refresh is
    /// enough to make it selectable.
    pub async fn handle_capture_message(&mut self, message: CaptureMessage) -> Result<()> {
        let CaptureMessage::NewSpark { spark_id, .. } = message;
        self.refresh().await?;
        self.select(&spark_id)
    }

    /// Capture from this surface and open the new spark.
    pub async fn capture(&mut self, event: CaptureEvent) -> Result<Spark> {
        let spark = self
            .capture
            .capture(event, &self.state.settings.blacklisted_domains)
            .await?;
        self.refresh().await?;
        self.select(&spark.id)?;
        Ok(spark)
    }

    /// Generate drafts for a spark with the current persona and language.
    pub async fn generate(&mut self, spark_id: &str) -> Result<Vec<Draft>> {
        self.generate_in(spark_id, self.state.settings.language).await
    }

    /// Generate drafts in a specific language, leaving settings untouched.
    ///
    /// `&mut self` serializes calls on one controller, so `is_generating` is
    /// mainly a flag for observers of `AppState`. The check still refuses a
    /// call on a state that reports a generation in flight.
    pub async fn generate_in(&mut self, spark_id: &str, language: Language) -> Result<Vec<Draft>> {
        if self.state.is_generating {
            return Err(LuminaError::GenerationInProgress(spark_id.to_string()));
        }

        let client = match &self.client {
            Some(client) => client.clone(),
            None => create_completion_client(&self.state.settings.ai)?,
        };
        let generator = DraftGenerator::new(self.sparks.clone(), client);
        let persona = self.state.settings.persona.clone();

        self.state.is_generating = true;
        let result = generator.generate(spark_id, &persona, language).await;
        self.state.is_generating = false;

        let drafts = result?;
        self.refresh().await?;
        Ok(drafts)
    }

    /// Replace a draft's text and mark it edited.
    pub async fn edit_draft(&mut self, spark_id: &str, draft_id: &str, content: &str) -> Result<()> {
        let spark = self
            .sparks
            .get(spark_id)
            .await?
            .ok_or_else(|| LuminaError::NotFound(spark_id.to_string()))?;

        let mut drafts = spark.drafts;
        let draft = drafts
            .iter_mut()
            .find(|d| d.id == draft_id)
            .ok_or_else(|| LuminaError::NotFound(format!("{}/{}", spark_id, draft_id)))?;
        draft.content = content.to_string();
        draft.is_edited = true;

        self.sparks
            .update(spark_id, SparkPatch::drafts(drafts))
            .await?;
        self.refresh().await
    }

    pub async fn delete_spark(&mut self, spark_id: &str) -> Result<()> {
        self.sparks.remove(spark_id).await?;
        if self.state.active_spark_id.as_deref() == Some(spark_id) {
            self.navigate(View::Home);
        }
        self.refresh().await?;
        self.state.notice = Some("Spark deleted".to_string());
        Ok(())
    }

    pub async fn save_settings(&mut self, settings: Settings) -> Result<()> {
        self.settings.update(settings.clone()).await?;
        self.state.settings = settings;
        self.state.notice = Some("Settings saved!".to_string());
        Ok(())
    }

    /// Add the sample spark.
    pub async fn add_demo(&mut self) -> Result<Spark> {
        let spark = Spark::demo();
        self.sparks.create(spark.clone()).await?;
        self.refresh().await?;
        self.state.notice = Some("Demo Spark added!".to_string());
        Ok(spark)
    }

    /// Hand a draft to the composer: stored as `pendingPost` for the content
    /// script to insert.
    pub async fn queue_post(&mut self, text: &str) -> Result<()> {
        self.sparks.set_pending_post(text).await?;
        self.state.notice = Some("Post queued for the composer".to_string());
        Ok(())
    }
}
