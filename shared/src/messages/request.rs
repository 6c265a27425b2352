use crate::time::{LogicalTime, Lookahead};
use crate::types::{AttributeHandle, ClassHandle, FederateHandle, ObjectHandle};

/// A request a joined federate can place with the executive.
///
/// Requests are validated and applied synchronously; anything the executive
/// cannot satisfy right away (a blocked time advance, a negotiated transfer)
/// is recorded as pending and resolved later through a [`Callback`].
///
/// [`Callback`]: crate::messages::Callback
#[derive(Clone, Debug, PartialEq)]
pub enum FederateRequest {
    // Time management
    EnableRegulation { lookahead: Lookahead },
    DisableRegulation,
    EnableConstrained,
    DisableConstrained,
    EnableAsyncDelivery,
    DisableAsyncDelivery,
    TimeAdvance { time: LogicalTime },
    NextEvent { time: LogicalTime },
    FlushQueue { time: LogicalTime },
    ModifyLookahead { lookahead: Lookahead },

    // Declarations and objects
    PublishObjectClass {
        class: ClassHandle,
        attributes: Vec<AttributeHandle>,
    },
    UnpublishObjectClass { class: ClassHandle },
    // `attributes` is the class's full attribute list from the caller's
    // metadata snapshot; the executive itself carries no object model.
    RegisterObject {
        class: ClassHandle,
        attributes: Vec<AttributeHandle>,
    },
    DeleteObject { object: ObjectHandle },

    // Message exchange. Destinations are resolved by the subscription layer
    // above the core; a timestamp makes the message timestamp-ordered.
    SendMessage {
        destinations: Vec<FederateHandle>,
        payload: Vec<u8>,
        timestamp: Option<LogicalTime>,
    },

    // Ownership
    DivestUnconditionally {
        object: ObjectHandle,
        attributes: Vec<AttributeHandle>,
    },
    DivestNegotiated {
        object: ObjectHandle,
        attributes: Vec<AttributeHandle>,
        tag: Vec<u8>,
    },
    ConfirmDivestiture {
        object: ObjectHandle,
        attributes: Vec<AttributeHandle>,
    },
    CancelDivestiture {
        object: ObjectHandle,
        attributes: Vec<AttributeHandle>,
    },
    Acquire {
        object: ObjectHandle,
        attributes: Vec<AttributeHandle>,
    },
    AcquireIfAvailable {
        object: ObjectHandle,
        attributes: Vec<AttributeHandle>,
    },
    CancelAcquisition {
        object: ObjectHandle,
        attributes: Vec<AttributeHandle>,
    },
    QueryOwnership {
        object: ObjectHandle,
        attribute: AttributeHandle,
    },

    Resign,
}

/// The synchronous result of a successfully processed request.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RequestOutcome {
    /// The request completed or was recorded pending; any further effect
    /// arrives as callbacks.
    Done,
    /// `RegisterObject` succeeded; this is the new instance's handle.
    ObjectRegistered(ObjectHandle),
}
