use std::collections::HashMap;

use pergola_shared::{AttributeHandle, ClassHandle, FederateHandle};

/// At most one transfer negotiation may be open per attribute.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) enum PendingTransfer {
    None,
    /// The owner has offered the attribute up. A claimant appears when some
    /// federate asks to acquire it while the offer is open.
    Divesting { claimant: Option<FederateHandle> },
    /// A non-owner has asked the owner to release the attribute.
    Acquiring(FederateHandle),
}

/// Ownership state of a single attribute of a single object instance.
#[derive(Clone, Debug)]
pub(crate) struct AttributeOwnership {
    pub owner: Option<FederateHandle>,
    pub pending: PendingTransfer,
}

impl AttributeOwnership {
    pub fn owned_by(owner: Option<FederateHandle>) -> Self {
        Self {
            owner,
            pending: PendingTransfer::None,
        }
    }
}

/// One registered object instance and the ownership state of its attributes.
#[derive(Clone, Debug)]
pub(crate) struct ObjectRecord {
    pub class: ClassHandle,
    pub attributes: HashMap<AttributeHandle, AttributeOwnership>,
}
