//! Cross-context notification that a spark was captured.
//!
//! Delivery is at-most-once: a surface that is not listening misses the
//! message, but the spark is already stored and shows up on its next load.

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

use crate::models::Spark;

const BUS_CAPACITY: usize = 64;

/// Message published after a capture is stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CaptureMessage {
    #[serde(rename_all = "camelCase")]
    NewSpark {
        spark_id: String,
        text: String,
        url: String,
        page_title: String,
    },
}

impl CaptureMessage {
    pub fn new_spark(spark: &Spark) -> Self {
        CaptureMessage::NewSpark {
            spark_id: spark.id.clone(),
            text: spark.text.clone(),
            url: spark.url.clone(),
            page_title: spark.page_title.clone(),
        }
    }
}

#[derive(Clone)]
pub struct CaptureBus {
    tx: broadcast::Sender<CaptureMessage>,
}

impl Default for CaptureBus {
    fn default() -> Self {
        Self::new()
    }
}

impl CaptureBus {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(BUS_CAPACITY);
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<CaptureMessage> {
        self.tx.subscribe()
    }

    /// Publish to current subscribers. Returns how many received it.
    pub fn publish(&self, message: CaptureMessage) -> usize {
        match self.tx.send(message) {
            Ok(receivers) => receivers,
            Err(_) => {
                tracing::debug!("[capture] No surface listening, message dropped");
                0
            }
        }
    }
}
