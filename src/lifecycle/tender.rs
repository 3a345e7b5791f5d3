use std::sync::{Arc, Mutex};

use serde::Deserialize;
use tracing::{debug, info};
use uuid::Uuid;

use crate::access::{AccessGate, Principal};
use crate::clock::Clock;
use crate::entity::{Tender, TenderStatus};
use crate::error::{BidstoreError, Result};
use crate::lifecycle::require;
use crate::store::{self, TenderStore};

/// Command payload for opening a new tender.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateTender {
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub organization_id: Uuid,
    pub service_type: String,
    pub creator_username: String,
}

/// Command payload for a content edit. Status and ownership are not touched.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EditTender {
    pub title: String,
    #[serde(default)]
    pub description: String,
}

/// Tender state machine: CREATED -> PUBLISHED -> CLOSED. Edits bump the
/// version and are recorded in the version history; rollback restores a
/// recorded version's content as a new version.
pub struct TenderLifecycle<S> {
    store: Arc<Mutex<S>>,
    gate: Arc<dyn AccessGate>,
    clock: Arc<dyn Clock>,
}

impl<S> Clone for TenderLifecycle<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            gate: Arc::clone(&self.gate),
            clock: Arc::clone(&self.clock),
        }
    }
}

impl<S: TenderStore> TenderLifecycle<S> {
    pub fn new(store: Arc<Mutex<S>>, gate: Arc<dyn AccessGate>, clock: Arc<dyn Clock>) -> Self {
        Self { store, gate, clock }
    }

    /// Create a tender on behalf of an organization. The creator must pass
    /// the access gate; nothing is written otherwise.
    pub fn create(&self, cmd: CreateTender) -> Result<Tender> {
        require("title", &cmd.title)?;
        require("serviceType", &cmd.service_type)?;
        require("creatorUsername", &cmd.creator_username)?;

        let principal = Principal::Username(cmd.creator_username.clone());
        let allowed = self
            .gate
            .is_member(cmd.organization_id, &principal)
            .map_err(|e| BidstoreError::Forbidden(format!("membership check failed: {}", e)))?;
        if !allowed {
            return Err(BidstoreError::Forbidden(format!(
                "{} is not responsible for organization {}",
                cmd.creator_username, cmd.organization_id
            )));
        }

        let tender = Tender::new(
            cmd.title,
            cmd.description,
            cmd.organization_id,
            cmd.service_type,
            cmd.creator_username,
            self.clock.now(),
        );
        store::lock(&self.store)?.put_tender(&tender)?;

        info!(tender = %tender.id, organization = %tender.organization_id, "tender created");
        Ok(tender)
    }

    /// Replace title/description, bumping the version. Rejected once the
    /// tender is CLOSED.
    pub fn edit(&self, id: Uuid, cmd: EditTender) -> Result<Tender> {
        require("title", &cmd.title)?;

        let now = self.clock.now();
        let tender = store::lock(&self.store)?.update_tender(id, &mut |t| {
            if t.status.is_terminal() {
                return Err(BidstoreError::NotEditable {
                    status: t.status.to_string(),
                });
            }
            t.title = cmd.title.clone();
            t.description = cmd.description.clone();
            t.version += 1;
            t.updated_at = now;
            Ok(())
        })?;

        debug!(tender = %id, version = tender.version, "tender edited");
        Ok(tender)
    }

    pub fn publish(&self, id: Uuid) -> Result<Tender> {
        let tender = self.transition(id, TenderStatus::Published)?;
        info!(tender = %id, "tender published");
        Ok(tender)
    }

    pub fn close(&self, id: Uuid) -> Result<Tender> {
        let tender = self.transition(id, TenderStatus::Closed)?;
        info!(tender = %id, "tender closed");
        Ok(tender)
    }

    /// Public listing: PUBLISHED tenders only, optionally by service type.
    pub fn tenders(&self, service_type: Option<&str>) -> Result<Vec<Tender>> {
        store::lock(&self.store)?.list_published_tenders(service_type)
    }

    /// Owner listing: every tender of every organization the employee is
    /// responsible for, regardless of status.
    pub fn my_tenders(&self, username: &str) -> Result<Vec<Tender>> {
        require("username", username)?;
        store::lock(&self.store)?.list_tenders_by_responsible(username)
    }

    /// Restore the content recorded at `version` as a new version. The
    /// version counter keeps increasing; status is left alone.
    pub fn rollback(&self, id: Uuid, version: u32) -> Result<Tender> {
        let mut store = store::lock(&self.store)?;
        let revision = store.get_tender_at_version(id, version)?;

        let now = self.clock.now();
        let tender = store.update_tender(id, &mut |t| {
            if t.status.is_terminal() {
                return Err(BidstoreError::NotEditable {
                    status: t.status.to_string(),
                });
            }
            t.title = revision.title.clone();
            t.description = revision.description.clone();
            t.service_type = revision.service_type.clone();
            t.version += 1;
            t.updated_at = now;
            Ok(())
        })?;

        info!(tender = %id, restored = version, version = tender.version, "tender rolled back");
        Ok(tender)
    }

    pub fn status(&self, id: Uuid) -> Result<TenderStatus> {
        Ok(store::lock(&self.store)?.get_tender(id)?.status)
    }

    fn transition(&self, id: Uuid, to: TenderStatus) -> Result<Tender> {
        let now = self.clock.now();
        store::lock(&self.store)?.update_tender(id, &mut |t| {
            if !t.status.can_transition(to) {
                return Err(BidstoreError::InvalidTransition {
                    from: t.status.to_string(),
                    to: to.to_string(),
                });
            }
            t.status = to;
            t.updated_at = now;
            Ok(())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::access::StaticGate;
    use crate::clock::FixedClock;
    use crate::entity::{Employee, Organization, OrgType, OrganizationResponsible};
    use crate::store::{DirectoryStore, MemoryStore};
    use chrono::{DateTime, Utc};

    fn now() -> DateTime<Utc> {
        "2024-09-01T12:00:00Z".parse().unwrap()
    }

    fn engine(allowed: bool) -> (TenderLifecycle<MemoryStore>, Arc<Mutex<MemoryStore>>) {
        let store = Arc::new(Mutex::new(MemoryStore::new()));
        let engine = TenderLifecycle::new(
            Arc::clone(&store),
            Arc::new(StaticGate(allowed)),
            Arc::new(FixedClock(now())),
        );
        (engine, store)
    }

    fn create_cmd(org: Uuid) -> CreateTender {
        CreateTender {
            title: "Office relocation".to_string(),
            description: "Move 40 desks".to_string(),
            organization_id: org,
            service_type: "Logistics".to_string(),
            creator_username: "alice".to_string(),
        }
    }

    #[test]
    fn test_create_starts_at_version_one() {
        let (engine, _) = engine(true);
        let tender = engine.create(create_cmd(Uuid::new_v4())).unwrap();

        assert_eq!(tender.version, 1);
        assert_eq!(tender.status, TenderStatus::Created);
        assert_eq!(tender.created_at, now());
        assert_eq!(engine.status(tender.id).unwrap(), TenderStatus::Created);
    }

    #[test]
    fn test_create_rejected_by_gate_writes_nothing() {
        let (engine, store) = engine(false);
        let err = engine.create(create_cmd(Uuid::new_v4())).unwrap_err();

        assert!(matches!(err, BidstoreError::Forbidden(_)));
        assert_eq!(store.lock().unwrap().tender_count(), 0);
    }

    #[test]
    fn test_create_requires_fields() {
        let (engine, _) = engine(true);
        let mut cmd = create_cmd(Uuid::new_v4());
        cmd.title = "  ".to_string();
        assert!(matches!(
            engine.create(cmd).unwrap_err(),
            BidstoreError::Validation(_)
        ));

        let mut cmd = create_cmd(Uuid::new_v4());
        cmd.service_type = String::new();
        assert!(matches!(
            engine.create(cmd).unwrap_err(),
            BidstoreError::Validation(_)
        ));
    }

    #[test]
    fn test_version_counts_edits() {
        let (engine, _) = engine(true);
        let tender = engine.create(create_cmd(Uuid::new_v4())).unwrap();

        for n in 0..3 {
            let edited = engine
                .edit(
                    tender.id,
                    EditTender {
                        title: format!("Office relocation r{}", n + 1),
                        description: String::new(),
                    },
                )
                .unwrap();
            assert_eq!(edited.version, 2 + n);
        }
    }

    #[test]
    fn test_publish_then_close() {
        let (engine, _) = engine(true);
        let tender = engine.create(create_cmd(Uuid::new_v4())).unwrap();

        let published = engine.publish(tender.id).unwrap();
        assert_eq!(published.status, TenderStatus::Published);
        assert_eq!(published.version, 1);
        assert_eq!(engine.status(tender.id).unwrap(), TenderStatus::Published);

        let closed = engine.close(tender.id).unwrap();
        assert_eq!(closed.status, TenderStatus::Closed);
    }

    #[test]
    fn test_illegal_transitions_rejected() {
        let (engine, _) = engine(true);
        let tender = engine.create(create_cmd(Uuid::new_v4())).unwrap();

        // Closing a draft skips PUBLISHED.
        assert!(matches!(
            engine.close(tender.id).unwrap_err(),
            BidstoreError::InvalidTransition { .. }
        ));

        engine.publish(tender.id).unwrap();
        assert!(matches!(
            engine.publish(tender.id).unwrap_err(),
            BidstoreError::InvalidTransition { .. }
        ));

        // A rejected transition leaves status and version alone.
        let current = engine.status(tender.id).unwrap();
        assert_eq!(current, TenderStatus::Published);
    }

    #[test]
    fn test_closed_tender_not_editable() {
        let (engine, _) = engine(true);
        let tender = engine.create(create_cmd(Uuid::new_v4())).unwrap();
        engine.publish(tender.id).unwrap();
        engine.close(tender.id).unwrap();

        let err = engine
            .edit(
                tender.id,
                EditTender {
                    title: "too late".to_string(),
                    description: String::new(),
                },
            )
            .unwrap_err();
        assert!(matches!(err, BidstoreError::NotEditable { .. }));

        assert!(matches!(
            engine.rollback(tender.id, 1).unwrap_err(),
            BidstoreError::NotEditable { .. }
        ));
    }

    #[test]
    fn test_public_listing_only_shows_published_of_service_type() {
        let (engine, _) = engine(true);

        let mut it = create_cmd(Uuid::new_v4());
        it.service_type = "IT".to_string();
        let it = engine.create(it).unwrap();
        engine.publish(it.id).unwrap();

        let mut draft = create_cmd(Uuid::new_v4());
        draft.service_type = "IT".to_string();
        engine.create(draft).unwrap();

        let logistics = engine.create(create_cmd(Uuid::new_v4())).unwrap();
        engine.publish(logistics.id).unwrap();

        let listed = engine.tenders(Some("IT")).unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].id, it.id);
        assert!(listed
            .iter()
            .all(|t| t.status == TenderStatus::Published && t.service_type == "IT"));

        assert_eq!(engine.tenders(None).unwrap().len(), 2);
    }

    #[test]
    fn test_my_tenders_ignores_status() {
        let (engine, store) = engine(true);

        let org = Organization::new("Acme".to_string(), String::new(), OrgType::Llc, now());
        let alice = Employee::new("alice".to_string(), String::new(), String::new(), now());
        {
            let mut store = store.lock().unwrap();
            store.put_organization(&org).unwrap();
            store.put_employee(&alice).unwrap();
            store
                .assign_responsible(&OrganizationResponsible::new(org.id, alice.id))
                .unwrap();
        }

        let mine = engine.create(create_cmd(org.id)).unwrap();
        engine.create(create_cmd(Uuid::new_v4())).unwrap();

        let listed = engine.my_tenders("alice").unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].id, mine.id);
        assert_eq!(listed[0].status, TenderStatus::Created);
    }

    #[test]
    fn test_rollback_restores_recorded_content() {
        let (engine, _) = engine(true);
        let tender = engine.create(create_cmd(Uuid::new_v4())).unwrap();
        engine
            .edit(
                tender.id,
                EditTender {
                    title: "Office relocation, phase 2".to_string(),
                    description: "Move 60 desks".to_string(),
                },
            )
            .unwrap();

        let rolled = engine.rollback(tender.id, 1).unwrap();
        assert_eq!(rolled.version, 3);
        assert_eq!(rolled.title, "Office relocation");
        assert_eq!(rolled.description, "Move 40 desks");

        // The rollback itself is recorded and can be rolled back to.
        let again = engine.rollback(tender.id, 2).unwrap();
        assert_eq!(again.version, 4);
        assert_eq!(again.title, "Office relocation, phase 2");
    }

    #[test]
    fn test_rollback_to_unrecorded_version_fails() {
        let (engine, _) = engine(true);
        let tender = engine.create(create_cmd(Uuid::new_v4())).unwrap();

        let err = engine.rollback(tender.id, 7).unwrap_err();
        assert!(matches!(err, BidstoreError::NotFound(_)));

        let current = engine.rollback(tender.id, 1).unwrap();
        assert_eq!(current.title, "Office relocation");
    }

    #[test]
    fn test_status_of_missing_tender() {
        let (engine, _) = engine(true);
        assert!(matches!(
            engine.status(Uuid::new_v4()).unwrap_err(),
            BidstoreError::NotFound(_)
        ));
    }
}
