use thiserror::Error;

use crate::time::LogicalTime;
use crate::types::{AttributeHandle, ClassHandle, FederateHandle, ObjectHandle};

/// Every way a federation request can be rejected.
///
/// This is the single failure vocabulary of the executive. Ambassador layers
/// translate these kinds into the exception taxonomy of whichever interface
/// standard they serve; the executive itself never collapses two causes into
/// one kind, because callers branch on the specific variant.
///
/// All rejections are synchronous and atomic: a rejected request leaves the
/// federation state exactly as it found it.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FederationError {
    // Membership

    /// The request referenced a federate that never joined or has resigned.
    #[error("federate {federate} is not joined to the federation")]
    FederateNotJoined { federate: FederateHandle },

    // Time management

    /// EnableRegulation while regulation is already enabled or pending.
    #[error("time regulation is already enabled for federate {federate}")]
    RegulationAlreadyEnabled { federate: FederateHandle },

    /// DisableRegulation / ModifyLookahead without regulation enabled.
    #[error("time regulation is not enabled for federate {federate}")]
    RegulationNotEnabled { federate: FederateHandle },

    /// An advance was requested while an enable-regulation is still pending.
    #[error("an enable-regulation request is still pending for federate {federate}")]
    RegulationPending { federate: FederateHandle },

    /// EnableConstrained while constrained mode is already enabled or pending.
    #[error("time constrained mode is already enabled for federate {federate}")]
    ConstrainedAlreadyEnabled { federate: FederateHandle },

    /// DisableConstrained without constrained mode enabled.
    #[error("time constrained mode is not enabled for federate {federate}")]
    ConstrainedNotEnabled { federate: FederateHandle },

    /// An advance was requested while an enable-constrained is still pending.
    #[error("an enable-constrained request is still pending for federate {federate}")]
    ConstrainedPending { federate: FederateHandle },

    /// A second advance request, or a mode change, while an advance is
    /// outstanding.
    #[error("federate {federate} already has a time advance outstanding")]
    AdvanceInProgress { federate: FederateHandle },

    /// An advance was requested to a time below the federate's granted time.
    #[error("requested time {requested} is below granted time {granted}")]
    TimeAlreadyPassed {
        requested: LogicalTime,
        granted: LogicalTime,
    },

    /// Lookahead was negative, non-finite, or zero where zero is not
    /// permitted by configuration.
    #[error("invalid lookahead value {value}")]
    InvalidLookahead { value: f64 },

    /// A timestamp was NaN, or below the sender's outgoing time floor.
    #[error("invalid timestamp {value}")]
    InvalidTime { value: f64 },

    /// A timestamped message was sent by a federate that is not regulating.
    #[error("federate {federate} is not regulating and cannot send timestamped messages")]
    SenderNotRegulating { federate: FederateHandle },

    /// EnableAsyncDelivery while already enabled.
    #[error("asynchronous delivery is already enabled for federate {federate}")]
    AsyncDeliveryAlreadyEnabled { federate: FederateHandle },

    /// DisableAsyncDelivery while not enabled.
    #[error("asynchronous delivery is not enabled for federate {federate}")]
    AsyncDeliveryNotEnabled { federate: FederateHandle },

    /// Advancement is suspended while a checkpoint is in progress.
    #[error("a federation checkpoint is in progress")]
    CheckpointInProgress,

    /// EndCheckpoint without a checkpoint in progress.
    #[error("no federation checkpoint is in progress")]
    CheckpointNotInProgress,

    // Objects

    /// RegisterObject against a class the registrant does not publish.
    #[error("federate does not publish object class {class}")]
    ClassNotPublished { class: ClassHandle },

    /// The request referenced an object instance that is not registered.
    #[error("object {object} is not registered")]
    ObjectNotKnown { object: ObjectHandle },

    /// The request referenced an attribute the object does not carry.
    #[error("object {object} has no attribute {attribute}")]
    AttributeNotKnown {
        object: ObjectHandle,
        attribute: AttributeHandle,
    },

    // Ownership

    /// Acquiring an attribute whose class the requester does not publish.
    #[error("attribute {attribute} is not published by the requesting federate")]
    AttributeNotPublished { attribute: AttributeHandle },

    /// Divesting an attribute the caller does not own.
    #[error("attribute {attribute} is not owned by the calling federate")]
    AttributeNotOwned { attribute: AttributeHandle },

    /// Acquiring an attribute the caller already owns.
    #[error("attribute {attribute} is already owned by the calling federate")]
    AttributeAlreadyOwned { attribute: AttributeHandle },

    /// A negotiated divest was opened on an attribute already divesting.
    #[error("attribute {attribute} already has a divestiture in progress")]
    AttributeAlreadyDivesting { attribute: AttributeHandle },

    /// An acquisition was requested while another one is outstanding.
    #[error("attribute {attribute} already has an acquisition in progress")]
    AcquisitionAlreadyPending { attribute: AttributeHandle },

    /// Confirm/cancel divestiture without a divestiture opened by the caller.
    #[error("no divestiture is pending for attribute {attribute} by the calling federate")]
    DivestitureNotRequested { attribute: AttributeHandle },

    /// Cancel acquisition by a federate that is not the pending requester.
    #[error("no acquisition is pending for attribute {attribute} by the calling federate")]
    AcquisitionNotRequested { attribute: AttributeHandle },

    /// Acquire-if-available against an attribute that is not available.
    #[error("attribute {attribute} is not available for immediate acquisition")]
    AttributeUnavailable { attribute: AttributeHandle },

    // Internal

    /// An executive invariant did not hold. The offending request was
    /// aborted without touching federation state.
    #[error("internal invariant violation: {context}")]
    Internal { context: &'static str },
}
