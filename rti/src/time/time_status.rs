use pergola_shared::{LogicalTime, Lookahead};

/// Regulation / constrained switches move through `Pending` when the enable
/// request cannot take effect at the moment it is made.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum TriState {
    Off,
    Pending,
    On,
}

/// Which kind of advance request, if any, is outstanding for a federate.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum AdvanceMode {
    None,
    TimeAdvance,
    NextEvent,
    FlushQueue,
}

/// Per-federate time state: the executive's record of where one federate
/// sits on the logical time axis and what it has asked for.
///
/// The record does as it is told and performs no validation; every check
/// happens in the executive before a mutating method is called.
#[derive(Clone, Debug)]
pub(crate) struct TimeStatus {
    pub regulating: TriState,
    pub constrained: TriState,
    pub advancing: AdvanceMode,
    pub current_time: LogicalTime,
    pub requested_time: LogicalTime,
    pub lookahead: Lookahead,
    /// Deliver receive-ordered messages outside of a time advance.
    pub asynchronous: bool,
}

impl TimeStatus {
    pub fn new() -> Self {
        Self {
            regulating: TriState::Off,
            constrained: TriState::Off,
            advancing: AdvanceMode::None,
            current_time: LogicalTime::ZERO,
            requested_time: LogicalTime::ZERO,
            lookahead: Lookahead::ZERO,
            asynchronous: false,
        }
    }

    pub fn is_regulating(&self) -> bool {
        self.regulating == TriState::On
    }

    pub fn is_constrained(&self) -> bool {
        self.constrained == TriState::On
    }

    pub fn is_advancing(&self) -> bool {
        self.advancing != AdvanceMode::None
    }

    /// The earliest timestamp this federate could still attach to an
    /// outgoing message.
    ///
    /// While a `TimeAdvance` request is outstanding the federate has
    /// promised not to send anything below its requested time, so the
    /// requested time replaces the granted time in the bound. A pending
    /// `NextEvent` carries no such promise: it may be granted back at any
    /// queued timestamp, so only the granted time is safe to use.
    pub fn lbts(&self) -> LogicalTime {
        let effective = match self.advancing {
            AdvanceMode::TimeAdvance => self.requested_time,
            _ => self.current_time,
        };
        effective + self.lookahead
    }

    /// Records an outstanding advance request.
    pub fn request_advance(&mut self, mode: AdvanceMode, time: LogicalTime) {
        self.requested_time = time;
        self.advancing = mode;
    }

    /// Applies a grant: the federate now sits at `time` with no request
    /// outstanding.
    pub fn grant(&mut self, time: LogicalTime) {
        self.current_time = time;
        self.requested_time = time;
        self.advancing = AdvanceMode::None;
    }
}
