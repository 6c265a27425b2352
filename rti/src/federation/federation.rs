use std::collections::{HashMap, HashSet};
use std::mem;

use log::{debug, info, warn};

use pergola_shared::{
    AttributeHandle, Callback, ClassHandle, FederateHandle, FederateRequest, FederationError,
    HandleGenerator, LogicalTime, Lookahead, ObjectHandle, RequestOutcome, RoutedMessage,
};

use crate::federation::{Events, FederationConfig};
use crate::ownership::OwnershipManager;
use crate::time::{AdvanceMode, AdvanceQueue, TimeManager, TriState};

/// The federation executive.
///
/// One `Federation` owns the entire coordination state of one federation:
/// time records, delivery queues, ownership table, publications. Every
/// request is applied through `&mut self`, which is the serialization
/// boundary the grant algorithm depends on — deciding one federate's
/// advance requires a consistent view of every other federate.
///
/// Handling a request never blocks. Anything that cannot complete
/// immediately (a gated advance, a negotiated transfer) is recorded as
/// pending; its resolution surfaces later as a [`Callback`] in the events
/// outbox, which the caller drains with [`Federation::take_events`] and
/// forwards to each addressee.
pub struct Federation {
    config: FederationConfig,
    federate_handles: HandleGenerator<FederateHandle>,
    object_handles: HandleGenerator<ObjectHandle>,
    time: TimeManager,
    ownership: OwnershipManager,
    queues: HashMap<FederateHandle, AdvanceQueue>,
    publications: HashMap<FederateHandle, HashMap<ClassHandle, HashSet<AttributeHandle>>>,
    events: Events,
    checkpoint_in_progress: bool,
}

impl Federation {
    pub fn new(config: FederationConfig) -> Self {
        Self {
            config,
            federate_handles: HandleGenerator::new(),
            object_handles: HandleGenerator::new(),
            time: TimeManager::new(),
            ownership: OwnershipManager::new(),
            queues: HashMap::new(),
            publications: HashMap::new(),
            events: Events::new(),
            checkpoint_in_progress: false,
        }
    }

    /// Admits a new federate and returns its handle.
    pub fn join(&mut self) -> FederateHandle {
        let federate = self.federate_handles.generate();
        self.time.joined(federate);
        self.queues.insert(federate, AdvanceQueue::new());
        self.publications.insert(federate, HashMap::new());
        info!("federate {federate} joined the federation");
        federate
    }

    /// Applies one federate request. Rejections are synchronous and leave
    /// the federation untouched; side effects on other federates surface as
    /// callbacks in the events outbox.
    pub fn process(
        &mut self,
        federate: FederateHandle,
        request: FederateRequest,
    ) -> Result<RequestOutcome, FederationError> {
        use FederateRequest::*;
        let done = |()| RequestOutcome::Done;
        let outcome = match request {
            EnableRegulation { lookahead } => {
                self.enable_regulation(federate, lookahead).map(done)
            }
            DisableRegulation => self.disable_regulation(federate).map(done),
            EnableConstrained => self.enable_constrained(federate).map(done),
            DisableConstrained => self.disable_constrained(federate).map(done),
            EnableAsyncDelivery => self.enable_async_delivery(federate).map(done),
            DisableAsyncDelivery => self.disable_async_delivery(federate).map(done),
            TimeAdvance { time } => self.time_advance_request(federate, time).map(done),
            NextEvent { time } => self.next_event_request(federate, time).map(done),
            FlushQueue { time } => self.flush_queue_request(federate, time).map(done),
            ModifyLookahead { lookahead } => {
                self.modify_lookahead(federate, lookahead).map(done)
            }
            PublishObjectClass { class, attributes } => self
                .publish_object_class(federate, class, attributes)
                .map(done),
            UnpublishObjectClass { class } => {
                self.unpublish_object_class(federate, class).map(done)
            }
            RegisterObject { class, attributes } => self
                .register_object(federate, class, &attributes)
                .map(RequestOutcome::ObjectRegistered),
            DeleteObject { object } => self.delete_object(federate, object).map(done),
            SendMessage {
                destinations,
                payload,
                timestamp,
            } => self
                .send_message(federate, &destinations, payload, timestamp)
                .map(done),
            DivestUnconditionally { object, attributes } => self
                .divest_unconditionally(federate, object, &attributes)
                .map(done),
            DivestNegotiated {
                object,
                attributes,
                tag,
            } => self
                .divest_negotiated(federate, object, &attributes, tag)
                .map(done),
            ConfirmDivestiture { object, attributes } => self
                .confirm_divestiture(federate, object, &attributes)
                .map(done),
            CancelDivestiture { object, attributes } => self
                .cancel_divestiture(federate, object, &attributes)
                .map(done),
            Acquire { object, attributes } => {
                self.acquire(federate, object, &attributes).map(done)
            }
            AcquireIfAvailable { object, attributes } => self
                .acquire_if_available(federate, object, &attributes)
                .map(done),
            CancelAcquisition { object, attributes } => self
                .cancel_acquisition(federate, object, &attributes)
                .map(done),
            QueryOwnership { object, attribute } => {
                self.query_ownership(federate, object, attribute).map(done)
            }
            Resign => self.resign(federate).map(done),
        };
        if let Err(error) = &outcome {
            warn!("rejected request from federate {federate}: {error}");
        }
        outcome
    }

    /// Takes every pending callback out of the outbox.
    pub fn take_events(&mut self) -> Events {
        mem::replace(&mut self.events, Events::new())
    }

    /// The federation-wide safe advance boundary: the minimum, over all
    /// regulating federates, of each one's earliest possible outgoing
    /// timestamp. Unbounded when no federate is regulating.
    pub fn galt(&self) -> LogicalTime {
        self.time.galt()
    }

    /// The next-message floor for one federate: the earliest timestamp that
    /// could still reach it, counting both the federation boundary and its
    /// own queued deliveries.
    pub fn lits(&self, federate: FederateHandle) -> Result<LogicalTime, FederationError> {
        self.require_joined(federate)?;
        let earliest = self
            .queues
            .get(&federate)
            .and_then(AdvanceQueue::earliest)
            .unwrap_or(LogicalTime::MAX);
        Ok(self.time.galt().min(earliest))
    }

    pub fn granted_time(&self, federate: FederateHandle) -> Result<LogicalTime, FederationError> {
        Ok(self.status(federate)?.current_time)
    }

    // ------------------------------------------------------------------
    // Time management
    // ------------------------------------------------------------------

    pub fn enable_regulation(
        &mut self,
        federate: FederateHandle,
        lookahead: Lookahead,
    ) -> Result<(), FederationError> {
        let status = self.status(federate)?;
        if status.regulating != TriState::Off {
            return Err(FederationError::RegulationAlreadyEnabled { federate });
        }
        if status.is_advancing() {
            return Err(FederationError::AdvanceInProgress { federate });
        }
        self.check_lookahead(lookahead)?;

        // Seed the new regulator at the highest granted time among the
        // constrained federates, so the federation boundary never lands
        // below a time somebody has already reached.
        let seeded = status.current_time.max(self.time.max_constrained_time());
        self.time.enable_regulating(federate, seeded, lookahead);
        debug!("federate {federate} is now regulating at {seeded} with lookahead {lookahead}");
        self.events
            .push(federate, Callback::RegulationEnabled { time: seeded });
        self.evaluate_grants();
        Ok(())
    }

    pub fn disable_regulation(&mut self, federate: FederateHandle) -> Result<(), FederationError> {
        let status = self.status(federate)?;
        if status.regulating != TriState::On {
            return Err(FederationError::RegulationNotEnabled { federate });
        }
        self.time.disable_regulating(federate);
        debug!("federate {federate} is no longer regulating");
        self.evaluate_grants();
        Ok(())
    }

    pub fn enable_constrained(&mut self, federate: FederateHandle) -> Result<(), FederationError> {
        let status = self.status(federate)?;
        if status.constrained != TriState::Off {
            return Err(FederationError::ConstrainedAlreadyEnabled { federate });
        }
        if status.is_advancing() {
            return Err(FederationError::AdvanceInProgress { federate });
        }
        let time = status.current_time;
        if time <= self.time.galt() {
            self.time.enable_constrained(federate);
            self.events
                .push(federate, Callback::ConstrainedEnabled { time });
        } else {
            // The federate already sits past the federation boundary.
            // Becoming constrained now would strand it, so the switch waits
            // until the boundary catches up.
            self.time.mark_constrained_pending(federate);
            debug!("constrained switch for federate {federate} deferred until the boundary reaches {time}");
        }
        Ok(())
    }

    pub fn disable_constrained(
        &mut self,
        federate: FederateHandle,
    ) -> Result<(), FederationError> {
        let status = self.status(federate)?;
        if status.constrained != TriState::On {
            return Err(FederationError::ConstrainedNotEnabled { federate });
        }
        self.time.disable_constrained(federate);
        debug!("federate {federate} is no longer constrained");
        // Constrained-ness may have been the only thing blocking a pending
        // advance.
        self.evaluate_grants();
        Ok(())
    }

    pub fn enable_async_delivery(
        &mut self,
        federate: FederateHandle,
    ) -> Result<(), FederationError> {
        let status = self.status_mut(federate)?;
        if status.asynchronous {
            return Err(FederationError::AsyncDeliveryAlreadyEnabled { federate });
        }
        status.asynchronous = true;
        if let Some(queue) = self.queues.get_mut(&federate) {
            for message in queue.release_backlog() {
                self.events.push(
                    federate,
                    Callback::Delivery {
                        message,
                        timestamp: None,
                    },
                );
            }
        }
        Ok(())
    }

    pub fn disable_async_delivery(
        &mut self,
        federate: FederateHandle,
    ) -> Result<(), FederationError> {
        let status = self.status_mut(federate)?;
        if !status.asynchronous {
            return Err(FederationError::AsyncDeliveryNotEnabled { federate });
        }
        status.asynchronous = false;
        Ok(())
    }

    pub fn time_advance_request(
        &mut self,
        federate: FederateHandle,
        time: LogicalTime,
    ) -> Result<(), FederationError> {
        self.request_advance(federate, AdvanceMode::TimeAdvance, time)
    }

    pub fn next_event_request(
        &mut self,
        federate: FederateHandle,
        time: LogicalTime,
    ) -> Result<(), FederationError> {
        self.request_advance(federate, AdvanceMode::NextEvent, time)
    }

    pub fn flush_queue_request(
        &mut self,
        federate: FederateHandle,
        time: LogicalTime,
    ) -> Result<(), FederationError> {
        self.request_advance(federate, AdvanceMode::FlushQueue, time)
    }

    pub fn modify_lookahead(
        &mut self,
        federate: FederateHandle,
        lookahead: Lookahead,
    ) -> Result<(), FederationError> {
        let status = self.status(federate)?;
        if status.regulating != TriState::On {
            return Err(FederationError::RegulationNotEnabled { federate });
        }
        if status.is_advancing() {
            return Err(FederationError::AdvanceInProgress { federate });
        }
        self.check_lookahead(lookahead)?;
        self.time.set_lookahead(federate, lookahead);
        debug!("federate {federate} lookahead is now {lookahead}");
        self.evaluate_grants();
        Ok(())
    }

    // ------------------------------------------------------------------
    // Publication, objects, messages
    // ------------------------------------------------------------------

    pub fn publish_object_class(
        &mut self,
        federate: FederateHandle,
        class: ClassHandle,
        attributes: Vec<AttributeHandle>,
    ) -> Result<(), FederationError> {
        self.require_joined(federate)?;
        let published = self
            .publications
            .get_mut(&federate)
            .ok_or(FederationError::Internal {
                context: "joined federate has no publication record",
            })?;
        // Publishing with an empty attribute list means unpublishing.
        if attributes.is_empty() {
            published.remove(&class);
        } else {
            published.insert(class, attributes.into_iter().collect());
        }
        Ok(())
    }

    /// Unpublishing a class that was never published is a tolerated no-op.
    pub fn unpublish_object_class(
        &mut self,
        federate: FederateHandle,
        class: ClassHandle,
    ) -> Result<(), FederationError> {
        self.require_joined(federate)?;
        if let Some(published) = self.publications.get_mut(&federate) {
            published.remove(&class);
        }
        Ok(())
    }

    /// Registers a new object instance of `class`. `attributes` is the
    /// class's attribute list from the caller's metadata snapshot; the
    /// registrant starts out owning the ones it publishes.
    pub fn register_object(
        &mut self,
        federate: FederateHandle,
        class: ClassHandle,
        attributes: &[AttributeHandle],
    ) -> Result<ObjectHandle, FederationError> {
        self.require_joined(federate)?;
        let published = self
            .publications
            .get(&federate)
            .and_then(|classes| classes.get(&class))
            .ok_or(FederationError::ClassNotPublished { class })?;

        let object = self.object_handles.generate();
        let ownership = attributes
            .iter()
            .map(|attribute| (*attribute, published.contains(attribute)))
            .collect::<Vec<_>>();
        self.ownership
            .register_object(object, class, federate, ownership);
        debug!("federate {federate} registered object {object} of class {class}");
        Ok(object)
    }

    pub fn delete_object(
        &mut self,
        federate: FederateHandle,
        object: ObjectHandle,
    ) -> Result<(), FederationError> {
        self.require_joined(federate)?;
        if !self.ownership.contains_object(object) {
            return Err(FederationError::ObjectNotKnown { object });
        }
        self.ownership.delete_object(object);
        self.object_handles.recycle(object);
        debug!("federate {federate} deleted object {object}");
        Ok(())
    }

    /// Routes one message to each destination. A timestamp makes the
    /// message timestamp-ordered; it must not be below the sender's
    /// outgoing floor (granted time plus lookahead). Validation covers all
    /// destinations before anything is routed.
    pub fn send_message(
        &mut self,
        federate: FederateHandle,
        destinations: &[FederateHandle],
        payload: Vec<u8>,
        timestamp: Option<LogicalTime>,
    ) -> Result<(), FederationError> {
        let sender = self.status(federate)?;
        if let Some(timestamp) = timestamp {
            if sender.regulating != TriState::On {
                return Err(FederationError::SenderNotRegulating { federate });
            }
            if timestamp < sender.lbts() {
                return Err(FederationError::InvalidTime {
                    value: timestamp.value(),
                });
            }
        }
        for destination in destinations {
            self.require_joined(*destination)?;
        }

        let mut queued = false;
        for destination in destinations {
            let message = RoutedMessage::new(federate, payload.clone());
            queued |= self.route(*destination, message, timestamp);
        }
        if queued {
            // A newly queued message can satisfy a pending next-event
            // request at its timestamp.
            self.evaluate_grants();
        }
        Ok(())
    }

    /// Delivers or queues one message for one destination. Returns whether
    /// the message went into a timestamp-ordered queue.
    fn route(
        &mut self,
        destination: FederateHandle,
        message: RoutedMessage,
        timestamp: Option<LogicalTime>,
    ) -> bool {
        let Some(status) = self.time.status(destination) else {
            return false;
        };
        let constrained = status.is_constrained();
        let advancing = status.is_advancing();
        let asynchronous = status.asynchronous;

        if let Some(timestamp) = timestamp {
            if constrained {
                if let Some(queue) = self.queues.get_mut(&destination) {
                    queue.enqueue(timestamp, message);
                    return true;
                }
                return false;
            }
            // An unconstrained destination takes no part in timestamp
            // ordering: the timestamp is dropped and the message is
            // delivered receive-ordered, immediately.
        }

        if timestamp.is_none() && constrained && !asynchronous && !advancing {
            if let Some(queue) = self.queues.get_mut(&destination) {
                queue.hold(message);
            }
            return false;
        }

        self.events.push(
            destination,
            Callback::Delivery {
                message,
                timestamp: None,
            },
        );
        false
    }

    // ------------------------------------------------------------------
    // Ownership
    // ------------------------------------------------------------------

    pub fn divest_unconditionally(
        &mut self,
        federate: FederateHandle,
        object: ObjectHandle,
        attributes: &[AttributeHandle],
    ) -> Result<(), FederationError> {
        self.require_joined(federate)?;
        let transfers = self
            .ownership
            .divest_unconditionally(federate, object, attributes)?;
        for (successor, attributes) in transfers {
            self.events.push(
                successor,
                Callback::OwnershipAcquired { object, attributes },
            );
        }
        Ok(())
    }

    pub fn divest_negotiated(
        &mut self,
        federate: FederateHandle,
        object: ObjectHandle,
        attributes: &[AttributeHandle],
        tag: Vec<u8>,
    ) -> Result<(), FederationError> {
        self.require_joined(federate)?;
        let class = self
            .ownership
            .class_of(object)
            .ok_or(FederationError::ObjectNotKnown { object })?;
        let outcome = self
            .ownership
            .divest_negotiated(federate, object, attributes)?;

        if !outcome.transferred.is_empty() {
            let mut confirmed = Vec::new();
            for (successor, attributes) in outcome.transferred {
                confirmed.extend(attributes.iter().copied());
                self.events.push(
                    successor,
                    Callback::OwnershipAcquired { object, attributes },
                );
            }
            self.events.push(
                federate,
                Callback::DivestitureConfirmed {
                    object,
                    attributes: confirmed,
                },
            );
        }

        // Every other federate publishing one of the offered attributes is
        // a candidate acquirer.
        for (candidate, attributes) in
            self.divest_candidates(federate, class, &outcome.opened)
        {
            self.events.push(
                candidate,
                Callback::AssumptionRequested {
                    object,
                    attributes,
                    tag: tag.clone(),
                },
            );
        }
        Ok(())
    }

    pub fn confirm_divestiture(
        &mut self,
        federate: FederateHandle,
        object: ObjectHandle,
        attributes: &[AttributeHandle],
    ) -> Result<(), FederationError> {
        self.require_joined(federate)?;
        let outcome = self
            .ownership
            .confirm_divestiture(federate, object, attributes)?;
        let mut confirmed = outcome.released;
        for (successor, attributes) in outcome.transferred {
            confirmed.extend(attributes.iter().copied());
            self.events.push(
                successor,
                Callback::OwnershipAcquired { object, attributes },
            );
        }
        self.events.push(
            federate,
            Callback::DivestitureConfirmed {
                object,
                attributes: confirmed,
            },
        );
        Ok(())
    }

    pub fn cancel_divestiture(
        &mut self,
        federate: FederateHandle,
        object: ObjectHandle,
        attributes: &[AttributeHandle],
    ) -> Result<(), FederationError> {
        self.require_joined(federate)?;
        let resurrected = self
            .ownership
            .cancel_divestiture(federate, object, attributes)?;
        self.events.push(
            federate,
            Callback::DivestitureCancelled {
                object,
                attributes: attributes.to_vec(),
            },
        );
        // Claims made while the offer was open fall back to ordinary
        // acquisition requests; the owner hears about them now.
        for (requester, attributes) in resurrected {
            self.events.push(
                federate,
                Callback::ReleaseRequested {
                    object,
                    attributes,
                    requester,
                },
            );
        }
        Ok(())
    }

    pub fn acquire(
        &mut self,
        federate: FederateHandle,
        object: ObjectHandle,
        attributes: &[AttributeHandle],
    ) -> Result<(), FederationError> {
        self.require_publishes(federate, object, attributes)?;
        let outcome = self.ownership.acquire(federate, object, attributes)?;
        if !outcome.acquired.is_empty() {
            self.events.push(
                federate,
                Callback::OwnershipAcquired {
                    object,
                    attributes: outcome.acquired,
                },
            );
        }
        for (owner, attributes) in outcome.release_requested {
            self.events.push(
                owner,
                Callback::ReleaseRequested {
                    object,
                    attributes,
                    requester: federate,
                },
            );
        }
        Ok(())
    }

    pub fn acquire_if_available(
        &mut self,
        federate: FederateHandle,
        object: ObjectHandle,
        attributes: &[AttributeHandle],
    ) -> Result<(), FederationError> {
        self.require_publishes(federate, object, attributes)?;
        let acquired = self
            .ownership
            .acquire_if_available(federate, object, attributes)?;
        self.events.push(
            federate,
            Callback::OwnershipAcquired {
                object,
                attributes: acquired,
            },
        );
        Ok(())
    }

    pub fn cancel_acquisition(
        &mut self,
        federate: FederateHandle,
        object: ObjectHandle,
        attributes: &[AttributeHandle],
    ) -> Result<(), FederationError> {
        self.require_joined(federate)?;
        self.ownership
            .cancel_acquisition(federate, object, attributes)?;
        self.events.push(
            federate,
            Callback::AcquisitionCancelled {
                object,
                attributes: attributes.to_vec(),
            },
        );
        Ok(())
    }

    pub fn query_ownership(
        &mut self,
        federate: FederateHandle,
        object: ObjectHandle,
        attribute: AttributeHandle,
    ) -> Result<(), FederationError> {
        self.require_joined(federate)?;
        let owner = self.ownership.owner_of(object, attribute)?;
        self.events.push(
            federate,
            Callback::OwnershipInformation {
                object,
                attribute,
                owner,
            },
        );
        Ok(())
    }

    // ------------------------------------------------------------------
    // Membership and checkpoints
    // ------------------------------------------------------------------

    /// Removes a federate from the federation. Its owned attributes are
    /// released (completing any transfers that were waiting on it), its
    /// pending state is discarded, and every other federate's pending
    /// advance is re-evaluated.
    pub fn resign(&mut self, federate: FederateHandle) -> Result<(), FederationError> {
        self.require_joined(federate)?;
        for (successor, object, attributes) in self.ownership.release_all_owned_by(federate) {
            self.events.push(
                successor,
                Callback::OwnershipAcquired { object, attributes },
            );
        }
        self.time.resigned(federate);
        self.queues.remove(&federate);
        self.publications.remove(&federate);
        self.events.discard_for(federate);
        self.federate_handles.recycle(federate);
        info!("federate {federate} resigned from the federation");
        self.evaluate_grants();
        Ok(())
    }

    /// Suspends grant evaluation while a federation-wide checkpoint is
    /// taken. Advance requests arriving meanwhile are rejected.
    pub fn begin_checkpoint(&mut self) -> Result<(), FederationError> {
        if self.checkpoint_in_progress {
            return Err(FederationError::CheckpointInProgress);
        }
        self.checkpoint_in_progress = true;
        info!("federation checkpoint started; advancement suspended");
        Ok(())
    }

    pub fn end_checkpoint(&mut self) -> Result<(), FederationError> {
        if !self.checkpoint_in_progress {
            return Err(FederationError::CheckpointNotInProgress);
        }
        self.checkpoint_in_progress = false;
        info!("federation checkpoint finished; advancement resumed");
        self.evaluate_grants();
        Ok(())
    }

    // ------------------------------------------------------------------
    // Grant evaluation
    // ------------------------------------------------------------------

    /// Re-examines every federate with pending state after a mutation.
    /// One grant can raise the federation boundary and unblock the next
    /// federate, so evaluation loops to a fixpoint. Termination: grants
    /// only ever move times forward and each pass without a change stops
    /// the loop.
    fn evaluate_grants(&mut self) {
        if self.checkpoint_in_progress {
            return;
        }
        loop {
            let mut changed = false;
            for federate in self.time.handles() {
                if self.complete_deferred_constrained(federate) {
                    changed = true;
                }
                if let Some(time) = self.grant_decision(federate) {
                    self.grant(federate, time);
                    changed = true;
                }
            }
            if !changed {
                break;
            }
        }
    }

    /// Finishes a deferred constrained switch once the federation boundary
    /// has caught up with the federate's granted time.
    fn complete_deferred_constrained(&mut self, federate: FederateHandle) -> bool {
        let galt = self.time.galt();
        let Some(status) = self.time.status(federate) else {
            return false;
        };
        if status.constrained != TriState::Pending || status.current_time > galt {
            return false;
        }
        let time = status.current_time;
        self.time.enable_constrained(federate);
        self.events
            .push(federate, Callback::ConstrainedEnabled { time });
        true
    }

    /// Decides whether a federate's outstanding request is grantable now,
    /// and at what time.
    fn grant_decision(&self, federate: FederateHandle) -> Option<LogicalTime> {
        let status = self.time.status(federate)?;
        let requested = status.requested_time;
        let boundary = if status.is_constrained() {
            self.time
                .advance_boundary(federate, self.config.self_lbts_policy)
        } else {
            LogicalTime::MAX
        };
        match status.advancing {
            AdvanceMode::None => None,
            // A flush drains without the causality wait.
            AdvanceMode::FlushQueue => Some(requested),
            AdvanceMode::TimeAdvance => (requested <= boundary).then_some(requested),
            AdvanceMode::NextEvent => {
                let earliest = self.queues.get(&federate).and_then(AdvanceQueue::earliest);
                match earliest {
                    // Land on the earliest queued event instead of
                    // overshooting to the requested time. A lookahead
                    // reduction can leave a queued timestamp below the
                    // granted time; the grant never moves the clock back.
                    Some(earliest) if earliest <= requested && earliest <= boundary => {
                        Some(earliest.max(status.current_time))
                    }
                    _ => (requested <= boundary).then_some(requested),
                }
            }
        }
    }

    /// Applies a grant: held receive-order messages, then every queued
    /// delivery at or below the granted time in (timestamp, arrival) order,
    /// then the grant notification itself. A federate never sees its grant
    /// before the deliveries it implies.
    fn grant(&mut self, federate: FederateHandle, time: LogicalTime) {
        if let Some(queue) = self.queues.get_mut(&federate) {
            for message in queue.release_backlog() {
                self.events.push(
                    federate,
                    Callback::Delivery {
                        message,
                        timestamp: None,
                    },
                );
            }
            for delivery in queue.drain_up_to(time) {
                self.events.push(
                    federate,
                    Callback::Delivery {
                        message: delivery.message,
                        timestamp: Some(delivery.timestamp),
                    },
                );
            }
        }
        self.time.grant(federate, time);
        debug!("federate {federate} granted advance to {time}");
        self.events
            .push(federate, Callback::TimeAdvanceGrant { time });
    }

    // ------------------------------------------------------------------
    // Helpers
    // ------------------------------------------------------------------

    fn request_advance(
        &mut self,
        federate: FederateHandle,
        mode: AdvanceMode,
        time: LogicalTime,
    ) -> Result<(), FederationError> {
        if self.checkpoint_in_progress {
            return Err(FederationError::CheckpointInProgress);
        }
        let status = self.status(federate)?;
        if status.is_advancing() {
            return Err(FederationError::AdvanceInProgress { federate });
        }
        // Regulation enables complete synchronously under the seeding rule,
        // so this state is not reachable today; the guard mirrors the
        // constrained switch, which does defer.
        if status.regulating == TriState::Pending {
            return Err(FederationError::RegulationPending { federate });
        }
        if status.constrained == TriState::Pending {
            return Err(FederationError::ConstrainedPending { federate });
        }
        if time < status.current_time {
            return Err(FederationError::TimeAlreadyPassed {
                requested: time,
                granted: status.current_time,
            });
        }
        self.time.request_advance(federate, mode, time);
        debug!("federate {federate} requested {mode:?} advance to {time}");
        self.evaluate_grants();
        Ok(())
    }

    fn status(&self, federate: FederateHandle) -> Result<&crate::time::TimeStatus, FederationError> {
        self.time
            .status(federate)
            .ok_or(FederationError::FederateNotJoined { federate })
    }

    fn status_mut(
        &mut self,
        federate: FederateHandle,
    ) -> Result<&mut crate::time::TimeStatus, FederationError> {
        self.time
            .status_mut(federate)
            .ok_or(FederationError::FederateNotJoined { federate })
    }

    fn require_joined(&self, federate: FederateHandle) -> Result<(), FederationError> {
        self.status(federate).map(|_| ())
    }

    fn check_lookahead(&self, lookahead: Lookahead) -> Result<(), FederationError> {
        if lookahead.is_zero() && !self.config.allow_zero_lookahead {
            return Err(FederationError::InvalidLookahead {
                value: lookahead.value(),
            });
        }
        Ok(())
    }

    /// Acquisition requests require the requester to publish each attribute
    /// for the object's class.
    fn require_publishes(
        &self,
        federate: FederateHandle,
        object: ObjectHandle,
        attributes: &[AttributeHandle],
    ) -> Result<(), FederationError> {
        self.require_joined(federate)?;
        let class = self
            .ownership
            .class_of(object)
            .ok_or(FederationError::ObjectNotKnown { object })?;
        let published = self
            .publications
            .get(&federate)
            .and_then(|classes| classes.get(&class));
        for attribute in attributes {
            let publishes = published
                .map(|set| set.contains(attribute))
                .unwrap_or(false);
            if !publishes {
                return Err(FederationError::AttributeNotPublished {
                    attribute: *attribute,
                });
            }
        }
        Ok(())
    }

    /// Federates other than the divesting owner that publish at least one
    /// of the offered attributes, with the subset each one publishes.
    fn divest_candidates(
        &self,
        owner: FederateHandle,
        class: ClassHandle,
        attributes: &[AttributeHandle],
    ) -> Vec<(FederateHandle, Vec<AttributeHandle>)> {
        let mut candidates: Vec<(FederateHandle, Vec<AttributeHandle>)> = Vec::new();
        let mut federates: Vec<FederateHandle> = self.publications.keys().copied().collect();
        federates.sort();
        for federate in federates {
            if federate == owner {
                continue;
            }
            let Some(published) = self
                .publications
                .get(&federate)
                .and_then(|classes| classes.get(&class))
            else {
                continue;
            };
            let overlap: Vec<AttributeHandle> = attributes
                .iter()
                .copied()
                .filter(|attribute| published.contains(attribute))
                .collect();
            if !overlap.is_empty() {
                candidates.push((federate, overlap));
            }
        }
        candidates
    }
}

impl Default for Federation {
    fn default() -> Self {
        Self::new(FederationConfig::default())
    }
}
