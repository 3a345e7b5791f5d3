use std::collections::HashMap;

use uuid::Uuid;

use crate::access::Principal;
use crate::entity::{Employee, Organization, OrganizationResponsible, Proposal, Tender};
use crate::error::{BidstoreError, Result};
use crate::store::{
    DirectoryStore, Mutator, ProposalRevision, ProposalStore, TenderRevision, TenderStore,
};

/// Map-backed store with the same contract as [`super::SqliteStore`]. Keeps
/// the lifecycle engines testable without a database on disk.
#[derive(Default)]
pub struct MemoryStore {
    tenders: HashMap<Uuid, Tender>,
    tender_history: Vec<TenderRevision>,
    proposals: HashMap<Uuid, Proposal>,
    proposal_history: Vec<ProposalRevision>,
    organizations: HashMap<Uuid, Organization>,
    employees: HashMap<Uuid, Employee>,
    responsible: Vec<OrganizationResponsible>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Row counts for asserting that rejected commands wrote nothing.
    pub fn tender_count(&self) -> usize {
        self.tenders.len()
    }

    pub fn proposal_count(&self) -> usize {
        self.proposals.len()
    }

    fn record_tender(&mut self, tender: &Tender) {
        self.tender_history.push(TenderRevision {
            tender_id: tender.id,
            version: tender.version,
            title: tender.title.clone(),
            description: tender.description.clone(),
            service_type: tender.service_type.clone(),
            recorded_at: tender.updated_at,
        });
    }

    fn record_proposal(&mut self, proposal: &Proposal) {
        self.proposal_history.push(ProposalRevision {
            proposal_id: proposal.id,
            version: proposal.version,
            title: proposal.title.clone(),
            description: proposal.description.clone(),
            recorded_at: proposal.updated_at,
        });
    }

    fn username_of(&self, user_id: Uuid) -> Option<&str> {
        self.employees.get(&user_id).map(|e| e.username.as_str())
    }

    fn org_ids_for(&self, username: &str) -> Vec<Uuid> {
        self.responsible
            .iter()
            .filter(|r| self.username_of(r.user_id) == Some(username))
            .map(|r| r.organization_id)
            .collect()
    }
}

impl TenderStore for MemoryStore {
    fn put_tender(&mut self, tender: &Tender) -> Result<()> {
        if self.tenders.contains_key(&tender.id) {
            return Err(BidstoreError::Conflict(format!(
                "tender {} already exists",
                tender.id
            )));
        }
        self.tenders.insert(tender.id, tender.clone());
        self.record_tender(tender);
        Ok(())
    }

    fn get_tender(&mut self, id: Uuid) -> Result<Tender> {
        self.tenders
            .get(&id)
            .cloned()
            .ok_or_else(|| BidstoreError::NotFound(format!("tender {}", id)))
    }

    fn update_tender(&mut self, id: Uuid, mutate: Mutator<'_, Tender>) -> Result<Tender> {
        // Mutate a copy so a rejected mutation leaves the stored row intact.
        let mut tender = self.get_tender(id)?;
        let version_before = tender.version;
        mutate(&mut tender)?;

        self.tenders.insert(id, tender.clone());
        if tender.version > version_before {
            self.record_tender(&tender);
        }
        Ok(tender)
    }

    fn list_published_tenders(&mut self, service_type: Option<&str>) -> Result<Vec<Tender>> {
        let mut tenders: Vec<Tender> = self
            .tenders
            .values()
            .filter(|t| t.status == crate::entity::TenderStatus::Published)
            .filter(|t| service_type.map_or(true, |s| t.service_type == s))
            .cloned()
            .collect();
        tenders.sort_by_key(|t| t.created_at);
        Ok(tenders)
    }

    fn list_tenders_by_responsible(&mut self, username: &str) -> Result<Vec<Tender>> {
        let orgs = self.org_ids_for(username);
        let mut tenders: Vec<Tender> = self
            .tenders
            .values()
            .filter(|t| orgs.contains(&t.organization_id))
            .cloned()
            .collect();
        tenders.sort_by_key(|t| t.created_at);
        Ok(tenders)
    }

    fn get_tender_at_version(&mut self, id: Uuid, version: u32) -> Result<TenderRevision> {
        self.tender_history
            .iter()
            .find(|r| r.tender_id == id && r.version == version)
            .cloned()
            .ok_or_else(|| BidstoreError::NotFound(format!("tender {} version {}", id, version)))
    }
}

impl ProposalStore for MemoryStore {
    fn put_proposal(&mut self, proposal: &Proposal) -> Result<()> {
        if self.proposals.contains_key(&proposal.id) {
            return Err(BidstoreError::Conflict(format!(
                "proposal {} already exists",
                proposal.id
            )));
        }
        self.proposals.insert(proposal.id, proposal.clone());
        self.record_proposal(proposal);
        Ok(())
    }

    fn get_proposal(&mut self, id: Uuid) -> Result<Proposal> {
        self.proposals
            .get(&id)
            .cloned()
            .ok_or_else(|| BidstoreError::NotFound(format!("proposal {}", id)))
    }

    fn update_proposal(&mut self, id: Uuid, mutate: Mutator<'_, Proposal>) -> Result<Proposal> {
        let mut proposal = self.get_proposal(id)?;
        let version_before = proposal.version;
        mutate(&mut proposal)?;

        self.proposals.insert(id, proposal.clone());
        if proposal.version > version_before {
            self.record_proposal(&proposal);
        }
        Ok(proposal)
    }

    fn list_published_proposals(&mut self, tender_id: Uuid) -> Result<Vec<Proposal>> {
        let mut proposals: Vec<Proposal> = self
            .proposals
            .values()
            .filter(|p| p.tender_id == tender_id)
            .filter(|p| p.status == crate::entity::ProposalStatus::Published)
            .cloned()
            .collect();
        proposals.sort_by_key(|p| p.created_at);
        Ok(proposals)
    }

    fn list_proposals_by_author(&mut self, username: &str) -> Result<Vec<Proposal>> {
        let mut proposals: Vec<Proposal> = self
            .proposals
            .values()
            .filter(|p| self.username_of(p.author_id) == Some(username))
            .cloned()
            .collect();
        proposals.sort_by_key(|p| p.created_at);
        Ok(proposals)
    }

    fn get_proposal_at_version(&mut self, id: Uuid, version: u32) -> Result<ProposalRevision> {
        self.proposal_history
            .iter()
            .find(|r| r.proposal_id == id && r.version == version)
            .cloned()
            .ok_or_else(|| BidstoreError::NotFound(format!("proposal {} version {}", id, version)))
    }

    fn tender_exists(&mut self, tender_id: Uuid) -> Result<bool> {
        Ok(self.tenders.contains_key(&tender_id))
    }
}

impl DirectoryStore for MemoryStore {
    fn put_organization(&mut self, organization: &Organization) -> Result<()> {
        if self.organizations.contains_key(&organization.id) {
            return Err(BidstoreError::Conflict(format!(
                "organization {} already exists",
                organization.id
            )));
        }
        self.organizations
            .insert(organization.id, organization.clone());
        Ok(())
    }

    fn get_organization(&mut self, id: Uuid) -> Result<Organization> {
        self.organizations
            .get(&id)
            .cloned()
            .ok_or_else(|| BidstoreError::NotFound(format!("organization {}", id)))
    }

    fn put_employee(&mut self, employee: &Employee) -> Result<()> {
        if self
            .employees
            .values()
            .any(|e| e.username == employee.username)
        {
            return Err(BidstoreError::Conflict(format!(
                "employee username {:?} already taken",
                employee.username
            )));
        }
        self.employees.insert(employee.id, employee.clone());
        Ok(())
    }

    fn get_employee_by_username(&mut self, username: &str) -> Result<Employee> {
        self.employees
            .values()
            .find(|e| e.username == username)
            .cloned()
            .ok_or_else(|| BidstoreError::NotFound(format!("employee {:?}", username)))
    }

    fn assign_responsible(&mut self, assignment: &OrganizationResponsible) -> Result<()> {
        if !self.organizations.contains_key(&assignment.organization_id) {
            return Err(BidstoreError::NotFound(format!(
                "organization {}",
                assignment.organization_id
            )));
        }
        if !self.employees.contains_key(&assignment.user_id) {
            return Err(BidstoreError::NotFound(format!(
                "employee {}",
                assignment.user_id
            )));
        }
        if self.responsible.iter().any(|r| {
            r.organization_id == assignment.organization_id && r.user_id == assignment.user_id
        }) {
            return Err(BidstoreError::Conflict(format!(
                "employee {} is already responsible for organization {}",
                assignment.user_id, assignment.organization_id
            )));
        }
        self.responsible.push(assignment.clone());
        Ok(())
    }

    fn is_responsible(&mut self, organization_id: Uuid, principal: &Principal) -> Result<bool> {
        let hit = self.responsible.iter().any(|r| {
            r.organization_id == organization_id
                && match principal {
                    Principal::Username(username) => {
                        self.username_of(r.user_id) == Some(username.as_str())
                    }
                    Principal::UserId(user_id) => r.user_id == *user_id,
                }
        });
        Ok(hit)
    }
}
