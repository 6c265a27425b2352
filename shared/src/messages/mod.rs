mod callback;
mod request;

pub use callback::Callback;
pub use request::{FederateRequest, RequestOutcome};

use crate::types::FederateHandle;

/// An application message routed through the executive. The payload is
/// opaque to the core; encoding and decoding belong to the ambassador layer.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RoutedMessage {
    pub sender: FederateHandle,
    pub payload: Vec<u8>,
}

impl RoutedMessage {
    pub fn new(sender: FederateHandle, payload: Vec<u8>) -> Self {
        Self { sender, payload }
    }
}
