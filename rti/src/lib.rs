//! # Pergola RTI
//! The federation executive: the serialized coordination core that computes
//! the federation-wide advance boundary, grants time advances, releases
//! timestamp-ordered deliveries in causal order and arbitrates attribute
//! ownership transfers.
//!
//! The executive speaks handles and opaque payloads only. Object models,
//! wire encodings and per-standard exception taxonomies live in the
//! ambassador layers built on top of it.

#![deny(
    trivial_casts,
    trivial_numeric_casts,
    unstable_features,
    unused_import_braces
)]

pub use pergola_shared::{
    AttributeHandle, Callback, ClassHandle, FederateHandle, FederateRequest, FederationError,
    Handle, LogicalTime, Lookahead, ObjectHandle, RequestOutcome, RoutedMessage, SequenceNumber,
};

mod federation;
mod ownership;
mod time;

pub use federation::{Events, Federation, FederationConfig, SelfLbtsPolicy};
