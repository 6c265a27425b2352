use crate::messages::RoutedMessage;
use crate::time::LogicalTime;
use crate::types::{AttributeHandle, FederateHandle, ObjectHandle};

/// An asynchronous notification pushed by the executive to one federate.
///
/// Callbacks are delivered in the order the executive emitted them. For a
/// single federate, every `Delivery` with a timestamp at or below T is
/// emitted before the `TimeAdvanceGrant` for T.
#[derive(Clone, Debug, PartialEq)]
pub enum Callback {
    /// The federate's outstanding advance request has been granted.
    TimeAdvanceGrant { time: LogicalTime },

    /// An application message released to this federate. `timestamp` is
    /// `None` for receive-ordered delivery.
    Delivery {
        message: RoutedMessage,
        timestamp: Option<LogicalTime>,
    },

    /// Deferred completion of EnableRegulation.
    RegulationEnabled { time: LogicalTime },

    /// Deferred completion of EnableConstrained.
    ConstrainedEnabled { time: LogicalTime },

    /// Another federate wants attributes this federate owns.
    ReleaseRequested {
        object: ObjectHandle,
        attributes: Vec<AttributeHandle>,
        requester: FederateHandle,
    },

    /// The owner opened a negotiated divestiture; this federate is a
    /// candidate acquirer.
    AssumptionRequested {
        object: ObjectHandle,
        attributes: Vec<AttributeHandle>,
        tag: Vec<u8>,
    },

    /// Ownership of the attributes has passed to this federate.
    OwnershipAcquired {
        object: ObjectHandle,
        attributes: Vec<AttributeHandle>,
    },

    /// The negotiated divestiture this federate opened has completed.
    DivestitureConfirmed {
        object: ObjectHandle,
        attributes: Vec<AttributeHandle>,
    },

    /// The negotiated divestiture this federate opened was withdrawn.
    DivestitureCancelled {
        object: ObjectHandle,
        attributes: Vec<AttributeHandle>,
    },

    /// The acquisition this federate cancelled is confirmed gone.
    AcquisitionCancelled {
        object: ObjectHandle,
        attributes: Vec<AttributeHandle>,
    },

    /// Answer to QueryOwnership. `owner` is `None` for an unowned attribute.
    OwnershipInformation {
        object: ObjectHandle,
        attribute: AttributeHandle,
        owner: Option<FederateHandle>,
    },
}
