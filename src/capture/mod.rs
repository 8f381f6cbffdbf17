//! Turning a page selection into a stored spark.

pub mod bus;

use chrono::Utc;
use url::Url;

use crate::error::{LuminaError, Result};
use crate::models::{CaptureEvent, Spark};
use crate::storage::SparkStore;

pub use bus::{CaptureBus, CaptureMessage};

/// Title used when the page reported none.
pub const UNTITLED_PAGE: &str = "Untitled Page";

/// Validates captures, stores them and announces them on the bus.
#[derive(Clone)]
pub struct CaptureService {
    sparks: SparkStore,
    bus: CaptureBus,
}

impl CaptureService {
    pub fn new(sparks: SparkStore, bus: CaptureBus) -> Self {
        Self { sparks, bus }
    }

    pub fn bus(&self) -> &CaptureBus {
        &self.bus
    }

    /// Store a capture and publish `NEW_SPARK`.
    ///
    /// The spark is persisted before the message goes out, so a lost message
    /// never loses a capture.
    pub async fn capture(&self, event: CaptureEvent, blocklist: &[String]) -> Result<Spark> {
        let spark = prepare(event, blocklist)?;

        self.sparks.create(spark.clone()).await?;
        tracing::info!(
            "[capture] Stored spark {} from {} ({} chars)",
            spark.id,
            spark.domain,
            spark.text.chars().count()
        );

        self.bus.publish(CaptureMessage::new_spark(&spark));
        Ok(spark)
    }
}

/// Validate and normalise a raw capture into a fresh spark.
pub fn prepare(event: CaptureEvent, blocklist: &[String]) -> Result<Spark> {
    let text = event.text.trim();
    if text.is_empty() {
        return Err(LuminaError::InvalidCapture("no text selected".to_string()));
    }

    let raw_url = event.url.trim();
    let url = Url::parse(raw_url)
        .map_err(|e| LuminaError::InvalidCapture(format!("bad URL '{}': {}", event.url, e)))?;
    let domain = url
        .host_str()
        .filter(|h| !h.is_empty())
        .ok_or_else(|| LuminaError::InvalidCapture(format!("URL '{}' has no host", event.url)))?
        .to_string();

    if is_blocked(&domain, blocklist) {
        tracing::info!("[capture] Refused capture from blocked domain {}", domain);
        return Err(LuminaError::BlockedDomain(domain));
    }

    let title = event.page_title.trim();
    let title = if title.is_empty() { UNTITLED_PAGE } else { title };

    Ok(Spark::new(text, raw_url, title, domain, Utc::now()))
}

/// Whether `domain` equals or is a subdomain of a blocklist entry.
pub fn is_blocked(domain: &str, blocklist: &[String]) -> bool {
    let domain = domain.to_ascii_lowercase();
    blocklist.iter().any(|entry| {
        let entry = entry.trim().trim_start_matches("*.").to_ascii_lowercase();
        !entry.is_empty()
            && (domain == entry
                || domain
                    .strip_suffix(entry.as_str())
                    .is_some_and(|prefix| prefix.ends_with('.')))
    })
}
