//! Fans a batch of postings out to every configured channel.
//!
//! Individual channel failures don't block other channels: each delivery
//! error is captured in its own [`DispatchResult`] and logged at the call
//! site.

use std::panic::AssertUnwindSafe;

use futures::FutureExt;
use jobwatch_core::JobRecord;

use crate::traits::{DeliveryError, DispatchResult, Notifier};

/// Dispatches batches to a fixed set of channels.
#[derive(Default)]
pub struct Dispatcher {
    channels: Vec<Box<dyn Notifier>>,
}

impl Dispatcher {
    /// Create a dispatcher over the given channels.
    pub fn new(channels: Vec<Box<dyn Notifier>>) -> Self {
        Self { channels }
    }

    pub fn len(&self) -> usize {
        self.channels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.channels.is_empty()
    }

    pub fn channel_names(&self) -> Vec<&str> {
        self.channels.iter().map(|c| c.channel_name()).collect()
    }

    /// Deliver a batch to every channel in order.
    ///
    /// Returns one result per channel. Individual failures don't block
    /// other channels.
    pub async fn dispatch(&self, batch: &[JobRecord]) -> Vec<DispatchResult> {
        if self.channels.is_empty() {
            tracing::debug!("No notification channels configured");
            return Vec::new();
        }

        let mut results = Vec::with_capacity(self.channels.len());

        for channel in &self.channels {
            let start = std::time::Instant::now();
            let result = match AssertUnwindSafe(channel.deliver(batch)).catch_unwind().await {
                Ok(result) => result,
                Err(_) => Err(DeliveryError::Panicked),
            };
            let duration_ms = start.elapsed().as_millis() as u64;

            let (success, error) = match result {
                Ok(()) => {
                    tracing::info!(
                        channel = channel.channel_name(),
                        batch_size = batch.len(),
                        duration_ms,
                        "Notification delivered"
                    );
                    (true, None)
                }
                Err(e) => {
                    tracing::warn!(
                        channel = channel.channel_name(),
                        batch_size = batch.len(),
                        error = %e,
                        duration_ms,
                        "Notification delivery failed"
                    );
                    (false, Some(e.to_string()))
                }
            };

            results.push(DispatchResult {
                channel: channel.channel_name().to_string(),
                batch_size: batch.len(),
                success,
                error,
                duration_ms,
            });
        }

        results
    }

    /// Send a test notification through the channel at `channel_index`.
    pub async fn test_notify(&self, channel_index: usize) -> Result<(), DeliveryError> {
        let channel = self.channels.get(channel_index).ok_or_else(|| {
            DeliveryError::Config(format!("Channel index {channel_index} out of range"))
        })?;

        channel.test().await
    }
}
