use std::collections::{BTreeMap, HashMap};

use log::debug;

use pergola_shared::{
    AttributeHandle, ClassHandle, FederateHandle, FederationError, ObjectHandle,
};

use crate::ownership::table::{AttributeOwnership, ObjectRecord, PendingTransfer};

/// Completed transfers, grouped by the federate that gained ownership.
pub(crate) type Transfers = Vec<(FederateHandle, Vec<AttributeHandle>)>;

/// Result of opening a negotiated divestiture. Attributes that already had
/// a waiting acquirer change hands on the spot; the rest stay with the owner
/// until the divestiture is confirmed.
pub(crate) struct NegotiatedDivestOutcome {
    pub transferred: Transfers,
    pub opened: Vec<AttributeHandle>,
}

/// Result of confirming a divestiture: attributes claimed while the offer
/// was open go to their claimants, the rest become unowned.
pub(crate) struct ConfirmOutcome {
    pub transferred: Transfers,
    pub released: Vec<AttributeHandle>,
}

/// Result of an acquisition request, split by what happened per attribute.
/// Attributes claimed inside an open divestiture are recorded in the table
/// only; they surface when the divestiture resolves.
#[derive(Debug)]
pub(crate) struct AcquireOutcome {
    /// Unowned attributes assigned to the requester immediately.
    pub acquired: Vec<AttributeHandle>,
    /// Owned attributes whose owner must now be asked to release them,
    /// grouped by owner.
    pub release_requested: Transfers,
}

/// Ownership state for every registered object instance.
///
/// Every mutating operation validates all named attributes before touching
/// any of them, so a rejected request leaves the table unchanged.
pub(crate) struct OwnershipManager {
    objects: HashMap<ObjectHandle, ObjectRecord>,
}

impl OwnershipManager {
    pub fn new() -> Self {
        Self {
            objects: HashMap::new(),
        }
    }

    /// Creates the ownership entries for a freshly registered instance.
    /// `attributes` carries the class's full attribute list along with
    /// whether the registrant publishes (and therefore initially owns) each.
    pub fn register_object(
        &mut self,
        object: ObjectHandle,
        class: ClassHandle,
        registrant: FederateHandle,
        attributes: impl IntoIterator<Item = (AttributeHandle, bool)>,
    ) {
        let attributes = attributes
            .into_iter()
            .map(|(attribute, owned)| {
                let owner = owned.then_some(registrant);
                (attribute, AttributeOwnership::owned_by(owner))
            })
            .collect();
        self.objects
            .insert(object, ObjectRecord { class, attributes });
    }

    pub fn delete_object(&mut self, object: ObjectHandle) {
        self.objects.remove(&object);
    }

    pub fn contains_object(&self, object: ObjectHandle) -> bool {
        self.objects.contains_key(&object)
    }

    pub fn class_of(&self, object: ObjectHandle) -> Option<ClassHandle> {
        self.objects.get(&object).map(|record| record.class)
    }

    pub fn owner_of(
        &self,
        object: ObjectHandle,
        attribute: AttributeHandle,
    ) -> Result<Option<FederateHandle>, FederationError> {
        let record = self.record(object)?;
        let entry = Self::entry(record, object, attribute)?;
        Ok(entry.owner)
    }

    /// Releases the named attributes without negotiation. Attributes with a
    /// waiting acquirer or claimant change hands; the rest become unowned.
    pub fn divest_unconditionally(
        &mut self,
        owner: FederateHandle,
        object: ObjectHandle,
        attributes: &[AttributeHandle],
    ) -> Result<Transfers, FederationError> {
        let attributes = dedup(attributes);
        let record = self.record(object)?;
        for attribute in &attributes {
            let entry = Self::entry(record, object, *attribute)?;
            if entry.owner != Some(owner) {
                return Err(FederationError::AttributeNotOwned {
                    attribute: *attribute,
                });
            }
        }

        let record = self.record_mut(object)?;
        let mut transfers: BTreeMap<FederateHandle, Vec<AttributeHandle>> = BTreeMap::new();
        for attribute in &attributes {
            let entry = Self::entry_mut(record, object, *attribute)?;
            let successor = match entry.pending {
                PendingTransfer::Acquiring(requester) => Some(requester),
                PendingTransfer::Divesting { claimant } => claimant,
                PendingTransfer::None => None,
            };
            entry.owner = successor;
            entry.pending = PendingTransfer::None;
            if let Some(successor) = successor {
                transfers.entry(successor).or_default().push(*attribute);
            }
        }
        debug!(
            "federate {owner} unconditionally divested {} attribute(s) of object {object}",
            attributes.len()
        );
        Ok(transfers.into_iter().collect())
    }

    /// Opens a negotiated divestiture on the named attributes.
    pub fn divest_negotiated(
        &mut self,
        owner: FederateHandle,
        object: ObjectHandle,
        attributes: &[AttributeHandle],
    ) -> Result<NegotiatedDivestOutcome, FederationError> {
        let attributes = dedup(attributes);
        let record = self.record(object)?;
        for attribute in &attributes {
            let entry = Self::entry(record, object, *attribute)?;
            if entry.owner != Some(owner) {
                return Err(FederationError::AttributeNotOwned {
                    attribute: *attribute,
                });
            }
            if matches!(entry.pending, PendingTransfer::Divesting { .. }) {
                return Err(FederationError::AttributeAlreadyDivesting {
                    attribute: *attribute,
                });
            }
        }

        let record = self.record_mut(object)?;
        let mut transfers: BTreeMap<FederateHandle, Vec<AttributeHandle>> = BTreeMap::new();
        let mut opened = Vec::new();
        for attribute in &attributes {
            let entry = Self::entry_mut(record, object, *attribute)?;
            match entry.pending {
                // An acquisition was already waiting: hand over directly.
                PendingTransfer::Acquiring(requester) => {
                    entry.owner = Some(requester);
                    entry.pending = PendingTransfer::None;
                    transfers.entry(requester).or_default().push(*attribute);
                }
                _ => {
                    entry.pending = PendingTransfer::Divesting { claimant: None };
                    opened.push(*attribute);
                }
            }
        }
        Ok(NegotiatedDivestOutcome {
            transferred: transfers.into_iter().collect(),
            opened,
        })
    }

    /// Completes a negotiated divestiture the caller opened earlier.
    pub fn confirm_divestiture(
        &mut self,
        owner: FederateHandle,
        object: ObjectHandle,
        attributes: &[AttributeHandle],
    ) -> Result<ConfirmOutcome, FederationError> {
        let attributes = dedup(attributes);
        let record = self.record(object)?;
        for attribute in &attributes {
            let entry = Self::entry(record, object, *attribute)?;
            let divesting = matches!(entry.pending, PendingTransfer::Divesting { .. });
            if entry.owner != Some(owner) || !divesting {
                return Err(FederationError::DivestitureNotRequested {
                    attribute: *attribute,
                });
            }
        }

        let record = self.record_mut(object)?;
        let mut transfers: BTreeMap<FederateHandle, Vec<AttributeHandle>> = BTreeMap::new();
        let mut released = Vec::new();
        for attribute in &attributes {
            let entry = Self::entry_mut(record, object, *attribute)?;
            let claimant = match entry.pending {
                PendingTransfer::Divesting { claimant } => claimant,
                _ => None,
            };
            entry.owner = claimant;
            entry.pending = PendingTransfer::None;
            match claimant {
                Some(claimant) => transfers.entry(claimant).or_default().push(*attribute),
                None => released.push(*attribute),
            }
        }
        Ok(ConfirmOutcome {
            transferred: transfers.into_iter().collect(),
            released,
        })
    }

    /// Withdraws a negotiated divestiture. A claim made while the offer was
    /// open survives as an ordinary acquisition request against the owner;
    /// those are returned grouped by requester so the owner can be told.
    pub fn cancel_divestiture(
        &mut self,
        owner: FederateHandle,
        object: ObjectHandle,
        attributes: &[AttributeHandle],
    ) -> Result<Transfers, FederationError> {
        let attributes = dedup(attributes);
        let record = self.record(object)?;
        for attribute in &attributes {
            let entry = Self::entry(record, object, *attribute)?;
            let divesting = matches!(entry.pending, PendingTransfer::Divesting { .. });
            if entry.owner != Some(owner) || !divesting {
                return Err(FederationError::DivestitureNotRequested {
                    attribute: *attribute,
                });
            }
        }

        let record = self.record_mut(object)?;
        let mut resurrected: BTreeMap<FederateHandle, Vec<AttributeHandle>> = BTreeMap::new();
        for attribute in &attributes {
            let entry = Self::entry_mut(record, object, *attribute)?;
            entry.pending = match entry.pending {
                PendingTransfer::Divesting {
                    claimant: Some(claimant),
                } => {
                    resurrected.entry(claimant).or_default().push(*attribute);
                    PendingTransfer::Acquiring(claimant)
                }
                _ => PendingTransfer::None,
            };
        }
        Ok(resurrected.into_iter().collect())
    }

    /// Requests ownership of the named attributes. Unowned attributes are
    /// assigned immediately; owned ones open a release negotiation; ones in
    /// an open divestiture are claimed.
    pub fn acquire(
        &mut self,
        requester: FederateHandle,
        object: ObjectHandle,
        attributes: &[AttributeHandle],
    ) -> Result<AcquireOutcome, FederationError> {
        let attributes = dedup(attributes);
        let record = self.record(object)?;
        for attribute in &attributes {
            let entry = Self::entry(record, object, *attribute)?;
            if entry.owner == Some(requester) {
                return Err(FederationError::AttributeAlreadyOwned {
                    attribute: *attribute,
                });
            }
            match entry.pending {
                PendingTransfer::None
                | PendingTransfer::Divesting { claimant: None } => {}
                _ => {
                    return Err(FederationError::AcquisitionAlreadyPending {
                        attribute: *attribute,
                    });
                }
            }
        }

        let record = self.record_mut(object)?;
        let mut acquired = Vec::new();
        let mut release_requested: BTreeMap<FederateHandle, Vec<AttributeHandle>> =
            BTreeMap::new();
        for attribute in &attributes {
            let entry = Self::entry_mut(record, object, *attribute)?;
            let open_divest =
                matches!(entry.pending, PendingTransfer::Divesting { claimant: None });
            match entry.owner {
                None => {
                    entry.owner = Some(requester);
                    acquired.push(*attribute);
                }
                Some(_) if open_divest => {
                    entry.pending = PendingTransfer::Divesting {
                        claimant: Some(requester),
                    };
                }
                Some(owner) => {
                    entry.pending = PendingTransfer::Acquiring(requester);
                    release_requested.entry(owner).or_default().push(*attribute);
                }
            }
        }
        Ok(AcquireOutcome {
            acquired,
            release_requested: release_requested.into_iter().collect(),
        })
    }

    /// Acquires the named attributes only if every one of them is unowned
    /// and free of negotiations. All-or-nothing.
    pub fn acquire_if_available(
        &mut self,
        requester: FederateHandle,
        object: ObjectHandle,
        attributes: &[AttributeHandle],
    ) -> Result<Vec<AttributeHandle>, FederationError> {
        let attributes = dedup(attributes);
        let record = self.record(object)?;
        for attribute in &attributes {
            let entry = Self::entry(record, object, *attribute)?;
            if entry.owner == Some(requester) {
                return Err(FederationError::AttributeAlreadyOwned {
                    attribute: *attribute,
                });
            }
            if entry.owner.is_some() || entry.pending != PendingTransfer::None {
                return Err(FederationError::AttributeUnavailable {
                    attribute: *attribute,
                });
            }
        }

        let record = self.record_mut(object)?;
        for attribute in &attributes {
            let entry = Self::entry_mut(record, object, *attribute)?;
            entry.owner = Some(requester);
        }
        Ok(attributes)
    }

    /// Withdraws the caller's pending acquisitions and claims.
    pub fn cancel_acquisition(
        &mut self,
        requester: FederateHandle,
        object: ObjectHandle,
        attributes: &[AttributeHandle],
    ) -> Result<(), FederationError> {
        let attributes = dedup(attributes);
        let record = self.record(object)?;
        for attribute in &attributes {
            let entry = Self::entry(record, object, *attribute)?;
            let pending_for_caller = matches!(
                entry.pending,
                PendingTransfer::Acquiring(r) if r == requester
            ) || matches!(
                entry.pending,
                PendingTransfer::Divesting { claimant: Some(c) } if c == requester
            );
            if !pending_for_caller {
                return Err(FederationError::AcquisitionNotRequested {
                    attribute: *attribute,
                });
            }
        }

        let record = self.record_mut(object)?;
        for attribute in &attributes {
            let entry = Self::entry_mut(record, object, *attribute)?;
            entry.pending = match entry.pending {
                PendingTransfer::Acquiring(_) => PendingTransfer::None,
                PendingTransfer::Divesting { .. } => {
                    PendingTransfer::Divesting { claimant: None }
                }
                PendingTransfer::None => PendingTransfer::None,
            };
        }
        Ok(())
    }

    /// Releases everything `federate` owns across all objects, completing
    /// waiting transfers, and erases the federate from every pending role.
    /// Used when a federate resigns.
    pub fn release_all_owned_by(
        &mut self,
        federate: FederateHandle,
    ) -> Vec<(FederateHandle, ObjectHandle, Vec<AttributeHandle>)> {
        let mut transfers: BTreeMap<(FederateHandle, ObjectHandle), Vec<AttributeHandle>> =
            BTreeMap::new();
        for (object, record) in self.objects.iter_mut() {
            for (attribute, entry) in record.attributes.iter_mut() {
                if entry.owner == Some(federate) {
                    let successor = match entry.pending {
                        PendingTransfer::Acquiring(requester) => Some(requester),
                        PendingTransfer::Divesting { claimant } => claimant,
                        PendingTransfer::None => None,
                    };
                    entry.owner = successor;
                    entry.pending = PendingTransfer::None;
                    if let Some(successor) = successor {
                        transfers
                            .entry((successor, *object))
                            .or_default()
                            .push(*attribute);
                    }
                    continue;
                }
                match entry.pending {
                    PendingTransfer::Acquiring(r) if r == federate => {
                        entry.pending = PendingTransfer::None;
                    }
                    PendingTransfer::Divesting { claimant: Some(c) } if c == federate => {
                        entry.pending = PendingTransfer::Divesting { claimant: None };
                    }
                    _ => {}
                }
            }
        }
        transfers
            .into_iter()
            .map(|((successor, object), attributes)| (successor, object, attributes))
            .collect()
    }

    fn record(&self, object: ObjectHandle) -> Result<&ObjectRecord, FederationError> {
        self.objects
            .get(&object)
            .ok_or(FederationError::ObjectNotKnown { object })
    }

    fn record_mut(
        &mut self,
        object: ObjectHandle,
    ) -> Result<&mut ObjectRecord, FederationError> {
        self.objects
            .get_mut(&object)
            .ok_or(FederationError::ObjectNotKnown { object })
    }

    fn entry(
        record: &ObjectRecord,
        object: ObjectHandle,
        attribute: AttributeHandle,
    ) -> Result<&AttributeOwnership, FederationError> {
        record
            .attributes
            .get(&attribute)
            .ok_or(FederationError::AttributeNotKnown { object, attribute })
    }

    fn entry_mut(
        record: &mut ObjectRecord,
        object: ObjectHandle,
        attribute: AttributeHandle,
    ) -> Result<&mut AttributeOwnership, FederationError> {
        record
            .attributes
            .get_mut(&attribute)
            .ok_or(FederationError::AttributeNotKnown { object, attribute })
    }
}

fn dedup(attributes: &[AttributeHandle]) -> Vec<AttributeHandle> {
    let mut unique = Vec::with_capacity(attributes.len());
    for attribute in attributes {
        if !unique.contains(attribute) {
            unique.push(*attribute);
        }
    }
    unique
}
