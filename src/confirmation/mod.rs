// src/confirmation/mod.rs
//
// Confirmation - generic ask/acknowledge primitive.
//
// Any producer that needs a human decision registers a request here and
// awaits the answer; the transport layer feeds answers back through
// `ConfirmationChannel::dispatch`.

pub mod channel;
pub mod transport;
pub mod types;

pub use channel::ConfirmationChannel;
pub use transport::{ConfirmationTransport, InProcessTransport};
pub use types::{
    ConfirmationError, ConfirmationRequest, ConfirmationResponse, OutgoingConfirmation,
    DEFAULT_CONFIRMATION_TIMEOUT_MS, RECOGNIZE_MEDIA_FILE_CONFIRMATION_EVENT,
    RENAME_FILES_CONFIRMATION_EVENT,
};
