//! Testing utilities.
//!
//! [`MockModel`] stands in for a real text-generation backend: it returns
//! scripted replies in order, can be slowed down to exercise debounce and
//! single-flight behaviour, and records every call it receives.

use crate::model::NarrativeModel;
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

/// Reply used when no scripted reply is queued.
pub const EMPTY_RESPONSE: &str = r#"{"objects": []}"#;

/// A scripted reply.
#[derive(Debug, Clone)]
pub struct MockReply {
    pub result: Result<String, llm_client::Error>,
    /// Overrides the model's default delay for this reply.
    pub delay: Option<Duration>,
}

impl MockReply {
    /// Reply with the given raw text.
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            result: Ok(text.into()),
            delay: None,
        }
    }

    /// Fail with the given error.
    pub fn error(error: llm_client::Error) -> Self {
        Self {
            result: Err(error),
            delay: None,
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }
}

/// A call the mock received.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MockCall {
    Extract(String),
    Correct { name: String, full_text: String },
}

/// A [`NarrativeModel`] with scripted replies.
#[derive(Debug, Default)]
pub struct MockModel {
    extract_replies: Mutex<VecDeque<MockReply>>,
    correct_replies: Mutex<VecDeque<MockReply>>,
    calls: Mutex<Vec<MockCall>>,
    delay: Duration,
    running: AtomicUsize,
    max_running: AtomicUsize,
}

impl MockModel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Delay every reply by `delay` unless the reply sets its own.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Queue a reply for the next extraction call.
    pub fn with_extract_reply(self, reply: MockReply) -> Self {
        self.queue_extract(reply);
        self
    }

    /// Queue a reply for the next correction call.
    pub fn with_correct_reply(self, reply: MockReply) -> Self {
        self.queue_correct(reply);
        self
    }

    pub fn queue_extract(&self, reply: MockReply) {
        lock(&self.extract_replies).push_back(reply);
    }

    pub fn queue_correct(&self, reply: MockReply) {
        lock(&self.correct_replies).push_back(reply);
    }

    /// Every call received so far, in order.
    pub fn calls(&self) -> Vec<MockCall> {
        lock(&self.calls).clone()
    }

    /// The text of every extraction call.
    pub fn extract_calls(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                MockCall::Extract(text) => Some(text),
                MockCall::Correct { .. } => None,
            })
            .collect()
    }

    /// `(name, full_text)` for every correction call.
    pub fn correct_calls(&self) -> Vec<(String, String)> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                MockCall::Correct { name, full_text } => Some((name, full_text)),
                MockCall::Extract(_) => None,
            })
            .collect()
    }

    /// The most calls that were ever running at the same time.
    pub fn max_concurrent_calls(&self) -> usize {
        self.max_running.load(Ordering::SeqCst)
    }

    async fn respond(&self, call: MockCall, queue: &Mutex<VecDeque<MockReply>>) -> Result<String, llm_client::Error> {
        lock(&self.calls).push(call);
        let reply = lock(queue)
            .pop_front()
            .unwrap_or_else(|| MockReply::text(EMPTY_RESPONSE));

        let running = self.running.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_running.fetch_max(running, Ordering::SeqCst);

        let delay = reply.delay.unwrap_or(self.delay);
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }

        self.running.fetch_sub(1, Ordering::SeqCst);
        reply.result
    }
}

#[async_trait]
impl NarrativeModel for MockModel {
    async fn extract(&self, text: &str) -> Result<String, llm_client::Error> {
        self.respond(MockCall::Extract(text.to_string()), &self.extract_replies)
            .await
    }

    async fn correct(&self, name: &str, full_text: &str) -> Result<String, llm_client::Error> {
        let call = MockCall::Correct {
            name: name.to_string(),
            full_text: full_text.to_string(),
        };
        self.respond(call, &self.correct_replies).await
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
