//! Loop event system: lets observers follow runs without coupling to the loop.
//!
//! Events are published as a run moves through its states. Any number of
//! subscribers may listen; publishing with nobody listening is fine.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::broadcast;

use crate::agent::LoopStatus;

/// All events emitted by loop runs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum LoopEvent {
    /// A run started working on a goal
    RunStarted {
        run_id: String,
        goal: String,
        timestamp: DateTime<Utc>,
    },

    /// The run moved to a new state
    StatusChanged {
        run_id: String,
        iteration: u32,
        status: LoopStatus,
        timestamp: DateTime<Utc>,
    },

    /// The model answered a planning or reflection prompt
    CompletionReceived {
        run_id: String,
        model: String,
        tokens_used: Option<u32>,
        duration_ms: u64,
        timestamp: DateTime<Utc>,
    },

    /// A tool was invoked
    ToolExecuted {
        run_id: String,
        tool_name: String,
        success: bool,
        duration_ms: u64,
        timestamp: DateTime<Utc>,
    },

    /// The run reached a terminal state
    RunFinished {
        run_id: String,
        status: LoopStatus,
        iterations: u32,
        error: Option<String>,
        timestamp: DateTime<Utc>,
    },
}

/// A broadcast-based event bus for loop events.
///
/// Uses `tokio::sync::broadcast` for multi-consumer pub/sub.
pub struct EventBus {
    sender: broadcast::Sender<Arc<LoopEvent>>,
}

impl EventBus {
    /// Create a new event bus with the given capacity.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Publish an event to all subscribers.
    pub fn publish(&self, event: LoopEvent) {
        // No subscribers is not an error
        let _ = self.sender.send(Arc::new(event));
    }

    /// Subscribe to receive events.
    pub fn subscribe(&self) -> broadcast::Receiver<Arc<LoopEvent>> {
        self.sender.subscribe()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(256)
    }
}
