use std::fmt;

/// Monotonic receive-order sequence number, used to tie-break deliveries
/// that share a timestamp.
pub type SequenceNumber = u64;

/// A handle backed by a `u32`, issued by the executive and meaningless
/// outside the federation that issued it.
pub trait Handle: Copy + Eq + std::hash::Hash {
    fn from_u32(value: u32) -> Self;
    fn to_u32(self) -> u32;
}

macro_rules! handle_type {
    ($(#[$docs:meta])* $name:ident) => {
        $(#[$docs])*
        #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub struct $name(u32);

        impl $name {
            pub fn new(value: u32) -> Self {
                Self(value)
            }
        }

        impl Handle for $name {
            fn from_u32(value: u32) -> Self {
                Self(value)
            }

            fn to_u32(self) -> u32 {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

handle_type!(
    /// Identifies one joined federate within a federation.
    FederateHandle
);
handle_type!(
    /// Identifies a registered object instance.
    ObjectHandle
);
handle_type!(
    /// Identifies one attribute of an object class.
    AttributeHandle
);
handle_type!(
    /// Identifies an object class in the metadata snapshot.
    ClassHandle
);
