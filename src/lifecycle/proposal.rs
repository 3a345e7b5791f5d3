use std::sync::{Arc, Mutex};

use serde::Deserialize;
use tracing::{debug, info};
use uuid::Uuid;

use crate::access::{AccessGate, Principal};
use crate::clock::Clock;
use crate::entity::{Proposal, ProposalStatus};
use crate::error::{BidstoreError, Result};
use crate::lifecycle::require;
use crate::store::{self, ProposalStore};

/// Command payload for submitting a bid against a tender.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateProposal {
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub tender_id: Uuid,
    pub organization_id: Uuid,
    pub author_id: Uuid,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EditProposal {
    pub title: String,
    #[serde(default)]
    pub description: String,
}

/// Proposal state machine: CREATED -> PUBLISHED, then PUBLISHED -> CANCELED /
/// AGREED / DECLINED. All three end states are terminal.
pub struct ProposalLifecycle<S> {
    store: Arc<Mutex<S>>,
    gate: Arc<dyn AccessGate>,
    clock: Arc<dyn Clock>,
}

impl<S> Clone for ProposalLifecycle<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            gate: Arc::clone(&self.gate),
            clock: Arc::clone(&self.clock),
        }
    }
}

impl<S: ProposalStore> ProposalLifecycle<S> {
    pub fn new(store: Arc<Mutex<S>>, gate: Arc<dyn AccessGate>, clock: Arc<dyn Clock>) -> Self {
        Self { store, gate, clock }
    }

    /// Submit a bid. The referenced tender must exist and the author must
    /// belong to the bidding organization; nothing is written otherwise.
    pub fn create(&self, cmd: CreateProposal) -> Result<Proposal> {
        require("title", &cmd.title)?;

        if !store::lock(&self.store)?.tender_exists(cmd.tender_id)? {
            return Err(BidstoreError::NotFound(format!("tender {}", cmd.tender_id)));
        }

        let principal = Principal::UserId(cmd.author_id);
        let allowed = self
            .gate
            .is_member(cmd.organization_id, &principal)
            .map_err(|e| BidstoreError::Forbidden(format!("membership check failed: {}", e)))?;
        if !allowed {
            return Err(BidstoreError::Forbidden(format!(
                "employee {} is not responsible for organization {}",
                cmd.author_id, cmd.organization_id
            )));
        }

        let proposal = Proposal::new(
            cmd.title,
            cmd.description,
            cmd.tender_id,
            cmd.organization_id,
            cmd.author_id,
            self.clock.now(),
        );
        store::lock(&self.store)?.put_proposal(&proposal)?;

        info!(proposal = %proposal.id, tender = %proposal.tender_id, "proposal created");
        Ok(proposal)
    }

    /// Replace title/description, bumping the version. Rejected once the
    /// proposal reached a terminal status.
    pub fn edit(&self, id: Uuid, cmd: EditProposal) -> Result<Proposal> {
        require("title", &cmd.title)?;

        let now = self.clock.now();
        let proposal = store::lock(&self.store)?.update_proposal(id, &mut |p| {
            if p.status.is_terminal() {
                return Err(BidstoreError::NotEditable {
                    status: p.status.to_string(),
                });
            }
            p.title = cmd.title.clone();
            p.description = cmd.description.clone();
            p.version += 1;
            p.updated_at = now;
            Ok(())
        })?;

        debug!(proposal = %id, version = proposal.version, "proposal edited");
        Ok(proposal)
    }

    pub fn publish(&self, id: Uuid) -> Result<Proposal> {
        let proposal = self.transition(id, ProposalStatus::Published)?;
        info!(proposal = %id, "proposal published");
        Ok(proposal)
    }

    pub fn cancel(&self, id: Uuid) -> Result<Proposal> {
        let proposal = self.transition(id, ProposalStatus::Canceled)?;
        info!(proposal = %id, "proposal canceled");
        Ok(proposal)
    }

    /// Accept the bid on behalf of the tender's organization. Terminal.
    pub fn agree(&self, id: Uuid) -> Result<Proposal> {
        let proposal = self.transition(id, ProposalStatus::Agreed)?;
        info!(proposal = %id, "proposal agreed");
        Ok(proposal)
    }

    /// Reject the bid. Terminal.
    pub fn decline(&self, id: Uuid) -> Result<Proposal> {
        let proposal = self.transition(id, ProposalStatus::Declined)?;
        info!(proposal = %id, "proposal declined");
        Ok(proposal)
    }

    /// PUBLISHED bids submitted against the given tender.
    pub fn by_tender(&self, tender_id: Uuid) -> Result<Vec<Proposal>> {
        store::lock(&self.store)?.list_published_proposals(tender_id)
    }

    /// Every bid the named employee authored, any status.
    pub fn by_username(&self, username: &str) -> Result<Vec<Proposal>> {
        require("username", username)?;
        store::lock(&self.store)?.list_proposals_by_author(username)
    }

    /// Restore the content recorded at `version` as a new version.
    pub fn rollback(&self, id: Uuid, version: u32) -> Result<Proposal> {
        let mut store = store::lock(&self.store)?;
        let revision = store.get_proposal_at_version(id, version)?;

        let now = self.clock.now();
        let proposal = store.update_proposal(id, &mut |p| {
            if p.status.is_terminal() {
                return Err(BidstoreError::NotEditable {
                    status: p.status.to_string(),
                });
            }
            p.title = revision.title.clone();
            p.description = revision.description.clone();
            p.version += 1;
            p.updated_at = now;
            Ok(())
        })?;

        info!(proposal = %id, restored = version, version = proposal.version, "proposal rolled back");
        Ok(proposal)
    }

    pub fn status(&self, id: Uuid) -> Result<ProposalStatus> {
        Ok(store::lock(&self.store)?.get_proposal(id)?.status)
    }

    fn transition(&self, id: Uuid, to: ProposalStatus) -> Result<Proposal> {
        let now = self.clock.now();
        store::lock(&self.store)?.update_proposal(id, &mut |p| {
            if !p.status.can_transition(to) {
                return Err(BidstoreError::InvalidTransition {
                    from: p.status.to_string(),
                    to: to.to_string(),
                });
            }
            p.status = to;
            p.updated_at = now;
            Ok(())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::access::StaticGate;
    use crate::clock::FixedClock;
    use crate::entity::{Employee, Tender};
    use crate::store::{DirectoryStore, MemoryStore, TenderStore};
    use chrono::{DateTime, Utc};

    fn now() -> DateTime<Utc> {
        "2024-09-01T12:00:00Z".parse().unwrap()
    }

    fn engine(allowed: bool) -> (ProposalLifecycle<MemoryStore>, Arc<Mutex<MemoryStore>>) {
        let store = Arc::new(Mutex::new(MemoryStore::new()));
        let engine = ProposalLifecycle::new(
            Arc::clone(&store),
            Arc::new(StaticGate(allowed)),
            Arc::new(FixedClock(now())),
        );
        (engine, store)
    }

    fn seed_tender(store: &Arc<Mutex<MemoryStore>>) -> Tender {
        let tender = Tender::new(
            "Office relocation".to_string(),
            String::new(),
            Uuid::new_v4(),
            "Logistics".to_string(),
            "alice".to_string(),
            now(),
        );
        store.lock().unwrap().put_tender(&tender).unwrap();
        tender
    }

    fn create_cmd(tender_id: Uuid) -> CreateProposal {
        CreateProposal {
            title: "Full-service bid".to_string(),
            description: "Two trucks, one weekend".to_string(),
            tender_id,
            organization_id: Uuid::new_v4(),
            author_id: Uuid::new_v4(),
        }
    }

    #[test]
    fn test_create_starts_at_version_one() {
        let (engine, store) = engine(true);
        let tender = seed_tender(&store);

        let proposal = engine.create(create_cmd(tender.id)).unwrap();
        assert_eq!(proposal.version, 1);
        assert_eq!(proposal.status, ProposalStatus::Created);
        assert_eq!(engine.status(proposal.id).unwrap(), ProposalStatus::Created);
    }

    #[test]
    fn test_create_requires_existing_tender() {
        let (engine, _) = engine(true);
        let err = engine.create(create_cmd(Uuid::new_v4())).unwrap_err();
        assert!(matches!(err, BidstoreError::NotFound(_)));
    }

    #[test]
    fn test_create_rejected_by_gate_writes_nothing() {
        let (engine, store) = engine(false);
        let tender = seed_tender(&store);

        let err = engine.create(create_cmd(tender.id)).unwrap_err();
        assert!(matches!(err, BidstoreError::Forbidden(_)));
        assert_eq!(store.lock().unwrap().proposal_count(), 0);
    }

    #[test]
    fn test_publish_cancel_visibility() {
        let (engine, store) = engine(true);
        let tender = seed_tender(&store);

        let proposal = engine.create(create_cmd(tender.id)).unwrap();
        assert!(engine.by_tender(tender.id).unwrap().is_empty());

        engine.publish(proposal.id).unwrap();
        let listed = engine.by_tender(tender.id).unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].id, proposal.id);

        engine.cancel(proposal.id).unwrap();
        assert!(engine.by_tender(tender.id).unwrap().is_empty());
        assert_eq!(
            engine.status(proposal.id).unwrap(),
            ProposalStatus::Canceled
        );
    }

    #[test]
    fn test_terminal_decisions() {
        let (engine, store) = engine(true);
        let tender = seed_tender(&store);

        let first = engine.create(create_cmd(tender.id)).unwrap();
        engine.publish(first.id).unwrap();
        let agreed = engine.agree(first.id).unwrap();
        assert_eq!(agreed.status, ProposalStatus::Agreed);

        let second = engine.create(create_cmd(tender.id)).unwrap();
        engine.publish(second.id).unwrap();
        let declined = engine.decline(second.id).unwrap();
        assert_eq!(declined.status, ProposalStatus::Declined);

        // Terminal statuses admit nothing further.
        assert!(matches!(
            engine.cancel(first.id).unwrap_err(),
            BidstoreError::InvalidTransition { .. }
        ));
        assert!(matches!(
            engine
                .edit(
                    first.id,
                    EditProposal {
                        title: "too late".to_string(),
                        description: String::new(),
                    }
                )
                .unwrap_err(),
            BidstoreError::NotEditable { .. }
        ));
    }

    #[test]
    fn test_agree_requires_published() {
        let (engine, store) = engine(true);
        let tender = seed_tender(&store);
        let proposal = engine.create(create_cmd(tender.id)).unwrap();

        assert!(matches!(
            engine.agree(proposal.id).unwrap_err(),
            BidstoreError::InvalidTransition { .. }
        ));
        assert_eq!(engine.status(proposal.id).unwrap(), ProposalStatus::Created);
    }

    #[test]
    fn test_edit_bumps_version() {
        let (engine, store) = engine(true);
        let tender = seed_tender(&store);
        let proposal = engine.create(create_cmd(tender.id)).unwrap();

        let edited = engine
            .edit(
                proposal.id,
                EditProposal {
                    title: "Sharper bid".to_string(),
                    description: "One truck".to_string(),
                },
            )
            .unwrap();
        assert_eq!(edited.version, 2);
        assert_eq!(edited.title, "Sharper bid");
    }

    #[test]
    fn test_by_username_lists_any_status() {
        let (engine, store) = engine(true);
        let tender = seed_tender(&store);

        let bob = Employee::new("bob".to_string(), String::new(), String::new(), now());
        store.lock().unwrap().put_employee(&bob).unwrap();

        let mut cmd = create_cmd(tender.id);
        cmd.author_id = bob.id;
        let draft = engine.create(cmd).unwrap();

        let mut cmd = create_cmd(tender.id);
        cmd.author_id = bob.id;
        let published = engine.create(cmd).unwrap();
        engine.publish(published.id).unwrap();

        let bobs = engine.by_username("bob").unwrap();
        assert_eq!(bobs.len(), 2);
        assert!(bobs.iter().any(|p| p.id == draft.id));

        assert!(engine.by_username("mallory").unwrap().is_empty());
    }

    #[test]
    fn test_rollback_restores_recorded_content() {
        let (engine, store) = engine(true);
        let tender = seed_tender(&store);
        let proposal = engine.create(create_cmd(tender.id)).unwrap();

        engine
            .edit(
                proposal.id,
                EditProposal {
                    title: "Sharper bid".to_string(),
                    description: String::new(),
                },
            )
            .unwrap();

        let rolled = engine.rollback(proposal.id, 1).unwrap();
        assert_eq!(rolled.version, 3);
        assert_eq!(rolled.title, "Full-service bid");

        assert!(matches!(
            engine.rollback(proposal.id, 9).unwrap_err(),
            BidstoreError::NotFound(_)
        ));
    }
}
