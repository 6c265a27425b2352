//! # Pergola Shared
//! Handle, logical-time and message contracts shared between the pergola
//! federation executive (`pergola-rti`) and the per-standard ambassador
//! adapters layered above it.

#![deny(
    trivial_casts,
    trivial_numeric_casts,
    unstable_features,
    unused_import_braces
)]

mod error;
mod key_generator;
mod messages;
mod time;
mod types;

pub use error::FederationError;
pub use key_generator::HandleGenerator;
pub use messages::{Callback, FederateRequest, RequestOutcome, RoutedMessage};
pub use time::{LogicalTime, Lookahead};
pub use types::{
    AttributeHandle, ClassHandle, FederateHandle, Handle, ObjectHandle, SequenceNumber,
};
