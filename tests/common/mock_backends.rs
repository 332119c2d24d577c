/*!
 * Scripted backend for testing
 *
 * Returns predetermined responses and records every conversation it was
 * asked about, so tests never reach a real model.
 */

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use codescribe::errors::ProviderError;
use codescribe::providers::ModelBackend;
use codescribe::translation::ChatConversation;

/// Shared record of calls made to a mock backend
#[derive(Debug, Default)]
pub struct CallTracker {
    /// Conversations received, in order
    pub conversations: Vec<ChatConversation>,
    /// Responses still to hand out; the last one repeats
    pub responses: VecDeque<String>,
    /// Fail the call with this index (0-based)
    pub fail_at: Option<usize>,
}

impl CallTracker {
    pub fn call_count(&self) -> usize {
        self.conversations.len()
    }

    /// Seed content of the n-th conversation
    pub fn seed_of(&self, call: usize) -> String {
        self.conversations[call].seed().content.clone()
    }
}

/// Mock backend driven by a `CallTracker`
#[derive(Debug, Clone)]
pub struct MockBackend {
    tracker: Arc<Mutex<CallTracker>>,
}

impl MockBackend {
    /// Always answer with `response`
    pub fn replying(response: &str) -> Self {
        Self::scripted(vec![response.to_string()])
    }

    /// Answer with each response in turn, repeating the last
    pub fn scripted(responses: Vec<String>) -> Self {
        let tracker = CallTracker {
            responses: responses.into(),
            ..CallTracker::default()
        };
        Self {
            tracker: Arc::new(Mutex::new(tracker)),
        }
    }

    /// Fail on the call with the given index
    pub fn failing_at(self, call: usize) -> Self {
        self.tracker.lock().unwrap().fail_at = Some(call);
        self
    }

    pub fn tracker(&self) -> Arc<Mutex<CallTracker>> {
        self.tracker.clone()
    }

    pub fn boxed(&self) -> Option<Box<dyn ModelBackend>> {
        Some(Box::new(self.clone()))
    }
}

#[async_trait]
impl ModelBackend for MockBackend {
    async fn chat(&self, conversation: &ChatConversation) -> Result<String, ProviderError> {
        let mut tracker = self.tracker.lock().unwrap();
        let index = tracker.call_count();
        tracker.conversations.push(conversation.clone());

        if tracker.fail_at == Some(index) {
            return Err(ProviderError::ConnectionError("mock backend unreachable".to_string()));
        }

        let response = if tracker.responses.len() > 1 {
            tracker.responses.pop_front()
        } else {
            tracker.responses.front().cloned()
        };
        Ok(response.unwrap_or_default())
    }

    fn describe(&self) -> String {
        "mock".to_string()
    }
}
