/// Whether a federate that is both regulating and constrained is held back
/// by its own lookahead window when its advance requests are checked.
///
/// Interface standards have historically been ambiguous here, so the choice
/// is an explicit federation policy rather than an implementation accident.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SelfLbtsPolicy {
    /// A federate's own lower bound is left out of its advance boundary.
    /// This is the default: a lone regulating-and-constrained federate can
    /// always make progress.
    Exclude,
    /// The federate's own lower bound counts. With this policy a lone
    /// regulating-and-constrained federate can only advance within its own
    /// lookahead window.
    Include,
}

/// Contains federation-level policies. Passed to the federation executive
/// on creation.
#[derive(Clone, Debug)]
pub struct FederationConfig {
    /// Accept a lookahead of exactly zero when enabling regulation or
    /// modifying lookahead. Off by default: zero lookahead permits
    /// zero-delay message cycles.
    pub allow_zero_lookahead: bool,
    /// See [`SelfLbtsPolicy`].
    pub self_lbts_policy: SelfLbtsPolicy,
}

impl Default for FederationConfig {
    fn default() -> Self {
        Self {
            allow_zero_lookahead: false,
            self_lbts_policy: SelfLbtsPolicy::Exclude,
        }
    }
}
