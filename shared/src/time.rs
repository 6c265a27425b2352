use std::fmt;
use std::ops::Add;

use crate::error::FederationError;

/// A point on the federation's logical time axis.
///
/// Backed by a finite-or-positive-infinite `f64`; NaN is rejected at
/// construction so the type carries a total order. `LogicalTime::MAX` is the
/// "unbounded" sentinel used for the GALT of a federation with no regulating
/// federates.
#[derive(Clone, Copy, Debug)]
pub struct LogicalTime(f64);

impl LogicalTime {
    /// Federation start time.
    pub const ZERO: LogicalTime = LogicalTime(0.0);

    /// Unbounded sentinel: later than every finite time.
    pub const MAX: LogicalTime = LogicalTime(f64::INFINITY);

    /// Wraps a raw time value, rejecting NaN and negative infinity.
    pub fn new(value: f64) -> Result<Self, FederationError> {
        if value.is_nan() || value == f64::NEG_INFINITY {
            return Err(FederationError::InvalidTime { value });
        }
        Ok(Self(value))
    }

    pub fn value(&self) -> f64 {
        self.0
    }

    pub fn is_unbounded(&self) -> bool {
        self.0 == f64::INFINITY
    }
}

impl PartialEq for LogicalTime {
    fn eq(&self, other: &Self) -> bool {
        self.0.total_cmp(&other.0) == std::cmp::Ordering::Equal
    }
}

impl Eq for LogicalTime {}

impl PartialOrd for LogicalTime {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for LogicalTime {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.0.total_cmp(&other.0)
    }
}

impl Add<Lookahead> for LogicalTime {
    type Output = LogicalTime;

    /// Saturates at `LogicalTime::MAX`.
    fn add(self, lookahead: Lookahead) -> LogicalTime {
        LogicalTime(self.0 + lookahead.0)
    }
}

impl fmt::Display for LogicalTime {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        if self.is_unbounded() {
            write!(f, "+inf")
        } else {
            write!(f, "{}", self.0)
        }
    }
}

/// The minimum logical distance ahead of its granted time at which a
/// regulating federate may timestamp outgoing messages.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Lookahead(f64);

impl Lookahead {
    pub const ZERO: Lookahead = Lookahead(0.0);

    /// Wraps a raw lookahead, rejecting negative and non-finite values.
    /// Whether a zero lookahead is acceptable is a federation-level policy
    /// checked by the executive, not here.
    pub fn new(value: f64) -> Result<Self, FederationError> {
        if !value.is_finite() || value < 0.0 {
            return Err(FederationError::InvalidLookahead { value });
        }
        Ok(Self(value))
    }

    pub fn value(&self) -> f64 {
        self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0 == 0.0
    }
}

impl fmt::Display for Lookahead {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
