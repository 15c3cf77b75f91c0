use crate::normalize::NormalizedMessage;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A webhook delivery exactly as it arrived, before normalization. The raw
/// body is kept around so error compensation can salvage a sender address
/// even when later stages reject the payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InboundEvent {
    pub instance: String,
    pub data: serde_json::Value,
}

/// A unit of pipeline work: one normalized message plus its originating
/// event, stamped at enqueue time.
#[derive(Debug, Clone)]
pub struct Job {
    pub event: InboundEvent,
    pub message: NormalizedMessage,
    pub enqueued_at: DateTime<Utc>,
}

impl Job {
    pub fn new(event: InboundEvent, message: NormalizedMessage) -> Self {
        Self {
            event,
            message,
            enqueued_at: Utc::now(),
        }
    }
}
