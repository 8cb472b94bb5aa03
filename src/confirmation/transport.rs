// src/confirmation/transport.rs
//
// Delivery of outgoing confirmation envelopes to consumers.
// Replies never come back through the transport; the consumer side calls
// `ConfirmationChannel::dispatch` with the correlation id it received.

use async_trait::async_trait;
use tokio::sync::mpsc;

use super::types::{ConfirmationError, OutgoingConfirmation};

#[async_trait]
pub trait ConfirmationTransport: Send + Sync {
    /// Deliver one envelope to the consumer named by `client_id`
    async fn send(&self, message: OutgoingConfirmation) -> Result<(), ConfirmationError>;
}

/// Transport for consumers living in the same process
pub struct InProcessTransport {
    sender: mpsc::Sender<OutgoingConfirmation>,
}

impl InProcessTransport {
    const CAPACITY: usize = 64;

    /// Returns the transport and the receiving end for the consumer
    pub fn new() -> (Self, mpsc::Receiver<OutgoingConfirmation>) {
        let (sender, receiver) = mpsc::channel(Self::CAPACITY);
        (Self { sender }, receiver)
    }
}

#[async_trait]
impl ConfirmationTransport for InProcessTransport {
    async fn send(&self, message: OutgoingConfirmation) -> Result<(), ConfirmationError> {
        self.sender
            .send(message)
            .await
            .map_err(|e| ConfirmationError::Transport(format!("consumer is gone: {}", e)))
    }
}
