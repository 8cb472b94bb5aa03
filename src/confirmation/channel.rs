// src/confirmation/channel.rs
//
// ConfirmationChannel - ask a consumer, wait for the correlated answer.
//
// CRITICAL RULES:
// - One pending slot per correlation id; resolution wakes exactly that waiter
// - The slot is removed on response, timeout, cancellation or a dropped wait
// - A response arriving after its slot is gone is dropped, never queued
// - No lock is held across an await

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use tokio::sync::oneshot;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use super::transport::ConfirmationTransport;
use super::types::{
    ConfirmationError, ConfirmationRequest, ConfirmationResponse,
    DEFAULT_CONFIRMATION_TIMEOUT_MS,
};

type PendingSlots = Mutex<HashMap<Uuid, oneshot::Sender<serde_json::Value>>>;

pub struct ConfirmationChannel {
    transport: Arc<dyn ConfirmationTransport>,
    pending: PendingSlots,
    default_timeout: Duration,
}

/// Removes the correlation slot when the wait ends, however it ends.
struct SlotGuard<'a> {
    pending: &'a PendingSlots,
    correlation_id: Uuid,
}

impl Drop for SlotGuard<'_> {
    fn drop(&mut self) {
        lock(self.pending).remove(&self.correlation_id);
    }
}

fn lock(pending: &PendingSlots) -> MutexGuard<'_, HashMap<Uuid, oneshot::Sender<serde_json::Value>>> {
    pending.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl ConfirmationChannel {
    pub fn new(transport: Arc<dyn ConfirmationTransport>) -> Self {
        Self::with_timeout(
            transport,
            Duration::from_millis(DEFAULT_CONFIRMATION_TIMEOUT_MS),
        )
    }

    pub fn with_timeout(transport: Arc<dyn ConfirmationTransport>, default_timeout: Duration) -> Self {
        Self {
            transport,
            pending: Mutex::new(HashMap::new()),
            default_timeout,
        }
    }

    pub fn default_timeout(&self) -> Duration {
        self.default_timeout
    }

    /// Number of requests currently waiting for an answer
    pub fn pending_count(&self) -> usize {
        lock(&self.pending).len()
    }

    /// Send `request` and wait for the correlated response payload.
    ///
    /// The timeout is wall-clock from the moment the request is registered.
    /// Fails with `Timeout` when it elapses and with `Aborted` when `cancel`
    /// fires first.
    pub async fn acknowledge(
        &self,
        request: ConfirmationRequest,
        timeout: Option<Duration>,
        cancel: &CancellationToken,
    ) -> Result<serde_json::Value, ConfirmationError> {
        let timeout = timeout.unwrap_or(self.default_timeout);
        let deadline = tokio::time::Instant::now() + timeout;
        let correlation_id = Uuid::new_v4();

        let (tx, rx) = oneshot::channel();
        lock(&self.pending).insert(correlation_id, tx);
        let _slot = SlotGuard {
            pending: &self.pending,
            correlation_id,
        };

        if cancel.is_cancelled() {
            return Err(ConfirmationError::Aborted);
        }

        log::debug!(
            "Requesting confirmation '{}' from client '{}' (correlation {})",
            request.event,
            request.client_id,
            correlation_id
        );

        let outgoing = request.into_outgoing(correlation_id);
        tokio::select! {
            sent = self.transport.send(outgoing) => sent?,
            _ = cancel.cancelled() => return Err(ConfirmationError::Aborted),
            _ = tokio::time::sleep_until(deadline) => {
                return Err(ConfirmationError::Timeout { timeout_ms: millis(timeout) });
            }
        }

        tokio::select! {
            biased;
            response = rx => response.map_err(|_| ConfirmationError::ChannelClosed),
            _ = cancel.cancelled() => {
                log::warn!("Confirmation {} aborted by caller", correlation_id);
                Err(ConfirmationError::Aborted)
            }
            _ = tokio::time::sleep_until(deadline) => {
                log::warn!(
                    "Confirmation {} timed out after {}ms",
                    correlation_id,
                    millis(timeout)
                );
                Err(ConfirmationError::Timeout { timeout_ms: millis(timeout) })
            }
        }
    }

    /// `acknowledge` for the `{confirmed: bool}` answer shape
    pub async fn confirm(
        &self,
        request: ConfirmationRequest,
        timeout: Option<Duration>,
        cancel: &CancellationToken,
    ) -> Result<bool, ConfirmationError> {
        let payload = self.acknowledge(request, timeout, cancel).await?;
        let response: ConfirmationResponse = serde_json::from_value(payload)
            .map_err(|e| ConfirmationError::InvalidResponse(e.to_string()))?;
        Ok(response.confirmed)
    }

    /// Deliver a consumer's answer to the waiter registered under
    /// `correlation_id`. Returns false when nobody is waiting any more.
    pub fn dispatch(&self, correlation_id: Uuid, payload: serde_json::Value) -> bool {
        let slot = lock(&self.pending).remove(&correlation_id);
        match slot {
            Some(tx) => tx.send(payload).is_ok(),
            None => {
                log::debug!(
                    "Dropping confirmation response for unknown or expired correlation {}",
                    correlation_id
                );
                false
            }
        }
    }

    /// Fail every outstanding wait with `ChannelClosed`.
    pub fn close(&self) {
        let drained: Vec<_> = lock(&self.pending).drain().collect();
        if !drained.is_empty() {
            log::info!("Closing {} pending confirmation(s)", drained.len());
        }
    }
}

fn millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}
