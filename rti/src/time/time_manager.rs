use std::collections::{HashMap, HashSet};

use log::debug;

use pergola_shared::{FederateHandle, LogicalTime, Lookahead};

use crate::federation::SelfLbtsPolicy;
use crate::time::{AdvanceMode, TimeStatus, TriState};

/// Tracks the time state of every joined federate and keeps the federation
/// lower bound up to date.
///
/// The greatest available logical time (GALT) is the minimum, over all
/// regulating federates, of each federate's earliest possible outgoing
/// timestamp. Constrained federates may not be granted past it. With no
/// regulating federates the bound is unbounded and every advance request is
/// grantable immediately.
pub(crate) struct TimeManager {
    records: HashMap<FederateHandle, TimeStatus>,
    regulating: HashSet<FederateHandle>,
    constrained: HashSet<FederateHandle>,
    galt: LogicalTime,
}

impl TimeManager {
    pub fn new() -> Self {
        Self {
            records: HashMap::new(),
            regulating: HashSet::new(),
            constrained: HashSet::new(),
            galt: LogicalTime::MAX,
        }
    }

    pub fn joined(&mut self, federate: FederateHandle) {
        self.records.insert(federate, TimeStatus::new());
    }

    pub fn resigned(&mut self, federate: FederateHandle) {
        self.records.remove(&federate);
        self.regulating.remove(&federate);
        self.constrained.remove(&federate);
        self.recalculate_galt();
    }

    pub fn status(&self, federate: FederateHandle) -> Option<&TimeStatus> {
        self.records.get(&federate)
    }

    pub fn status_mut(&mut self, federate: FederateHandle) -> Option<&mut TimeStatus> {
        self.records.get_mut(&federate)
    }

    pub fn handles(&self) -> Vec<FederateHandle> {
        self.records.keys().copied().collect()
    }

    pub fn galt(&self) -> LogicalTime {
        self.galt
    }

    /// Recomputes the federation lower bound from the regulating set.
    pub fn recalculate_galt(&mut self) -> LogicalTime {
        self.galt = self
            .regulating
            .iter()
            .filter_map(|handle| self.records.get(handle))
            .map(TimeStatus::lbts)
            .min()
            .unwrap_or(LogicalTime::MAX);
        debug!("(re)calculated federation lower bound: {}", self.galt);
        self.galt
    }

    /// The bound a constrained federate's advance requests are checked
    /// against. Under the default policy a federate that is itself
    /// regulating does not hold itself back with its own lookahead window.
    pub fn advance_boundary(
        &self,
        federate: FederateHandle,
        policy: SelfLbtsPolicy,
    ) -> LogicalTime {
        match policy {
            SelfLbtsPolicy::Include => self.galt,
            SelfLbtsPolicy::Exclude => self
                .regulating
                .iter()
                .filter(|handle| **handle != federate)
                .filter_map(|handle| self.records.get(handle))
                .map(TimeStatus::lbts)
                .min()
                .unwrap_or(LogicalTime::MAX),
        }
    }

    /// The highest granted time among constrained federates, used to seed a
    /// newly regulating federate so the federation bound never moves below
    /// a time some constrained federate has already reached.
    pub fn max_constrained_time(&self) -> LogicalTime {
        self.constrained
            .iter()
            .filter_map(|handle| self.records.get(handle))
            .map(|status| status.current_time)
            .max()
            .unwrap_or(LogicalTime::ZERO)
    }

    pub fn enable_regulating(
        &mut self,
        federate: FederateHandle,
        time: LogicalTime,
        lookahead: Lookahead,
    ) {
        if let Some(status) = self.records.get_mut(&federate) {
            status.regulating = TriState::On;
            status.current_time = time;
            status.requested_time = time;
            status.lookahead = lookahead;
            self.regulating.insert(federate);
            self.recalculate_galt();
        }
    }

    pub fn disable_regulating(&mut self, federate: FederateHandle) {
        if let Some(status) = self.records.get_mut(&federate) {
            status.regulating = TriState::Off;
            self.regulating.remove(&federate);
            self.recalculate_galt();
        }
    }

    pub fn enable_constrained(&mut self, federate: FederateHandle) {
        if let Some(status) = self.records.get_mut(&federate) {
            status.constrained = TriState::On;
            self.constrained.insert(federate);
        }
    }

    pub fn mark_constrained_pending(&mut self, federate: FederateHandle) {
        if let Some(status) = self.records.get_mut(&federate) {
            status.constrained = TriState::Pending;
        }
    }

    pub fn disable_constrained(&mut self, federate: FederateHandle) {
        if let Some(status) = self.records.get_mut(&federate) {
            status.constrained = TriState::Off;
            self.constrained.remove(&federate);
        }
    }

    pub fn set_lookahead(&mut self, federate: FederateHandle, lookahead: Lookahead) {
        if let Some(status) = self.records.get_mut(&federate) {
            status.lookahead = lookahead;
            if status.is_regulating() {
                self.recalculate_galt();
            }
        }
    }

    pub fn request_advance(
        &mut self,
        federate: FederateHandle,
        mode: AdvanceMode,
        time: LogicalTime,
    ) {
        if let Some(status) = self.records.get_mut(&federate) {
            status.request_advance(mode, time);
            if status.is_regulating() {
                self.recalculate_galt();
            }
        }
    }

    pub fn grant(&mut self, federate: FederateHandle, time: LogicalTime) {
        if let Some(status) = self.records.get_mut(&federate) {
            status.grant(time);
            if status.is_regulating() {
                self.recalculate_galt();
            }
        }
    }
}
