//! Test producers — `Producer` doubles for asserting on published messages.

use std::sync::Mutex;

use async_trait::async_trait;
use conquiz_core::broker::Producer;
use conquiz_core::error::DomainError;

/// A producer that records every `(topic, message)` pair it is handed.
#[derive(Debug, Default)]
pub struct RecordingProducer {
    published: Mutex<Vec<(String, String)>>,
}

impl RecordingProducer {
    /// Create an empty recording producer.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a snapshot of everything published so far.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn published(&self) -> Vec<(String, String)> {
        self.published.lock().unwrap().clone()
    }
}

#[async_trait]
impl Producer for RecordingProducer {
    async fn publish(&self, topic: &str, message: String) -> Result<(), DomainError> {
        self.published
            .lock()
            .unwrap()
            .push((topic.to_owned(), message));
        Ok(())
    }
}

/// A producer whose broker is always unreachable.
#[derive(Debug)]
pub struct FailingProducer;

#[async_trait]
impl Producer for FailingProducer {
    async fn publish(&self, _topic: &str, _message: String) -> Result<(), DomainError> {
        Err(DomainError::Infrastructure("connection refused".into()))
    }
}
