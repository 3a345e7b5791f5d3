mod memory;
mod sqlite;

pub use memory::MemoryStore;
pub use sqlite::SqliteStore;

use std::sync::{Mutex, MutexGuard};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::access::Principal;
use crate::entity::{Employee, Organization, OrganizationResponsible, Proposal, Tender};
use crate::error::{BidstoreError, Result};

/// Recorded snapshot of a tender's content at one version. Appended on create
/// and on every content edit; rollback reads these back.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TenderRevision {
    pub tender_id: Uuid,
    pub version: u32,
    pub title: String,
    pub description: String,
    pub service_type: String,
    pub recorded_at: DateTime<Utc>,
}

/// Recorded snapshot of a proposal's content at one version.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProposalRevision {
    pub proposal_id: Uuid,
    pub version: u32,
    pub title: String,
    pub description: String,
    pub recorded_at: DateTime<Utc>,
}

/// Mutation applied inside the store's read-modify-write. Returning an error
/// aborts the update with nothing written.
pub type Mutator<'a, T> = &'a mut dyn FnMut(&mut T) -> Result<()>;

/// Durable keyed storage for tenders.
pub trait TenderStore {
    /// Insert a new tender; Conflict if the id already exists.
    fn put_tender(&mut self, tender: &Tender) -> Result<()>;

    /// Current snapshot; NotFound if absent.
    fn get_tender(&mut self, id: Uuid) -> Result<Tender>;

    /// Atomic read-modify-write of the current snapshot. When the mutation
    /// increased `version`, the new content is also recorded in the version
    /// history.
    fn update_tender(&mut self, id: Uuid, mutate: Mutator<'_, Tender>) -> Result<Tender>;

    /// All PUBLISHED tenders, optionally restricted to one service type.
    fn list_published_tenders(&mut self, service_type: Option<&str>) -> Result<Vec<Tender>>;

    /// Every tender owned by an organization the named employee is
    /// responsible for, regardless of status.
    fn list_tenders_by_responsible(&mut self, username: &str) -> Result<Vec<Tender>>;

    /// Historical snapshot; NotFound if that version was never recorded.
    fn get_tender_at_version(&mut self, id: Uuid, version: u32) -> Result<TenderRevision>;
}

/// Durable keyed storage for proposals.
pub trait ProposalStore {
    fn put_proposal(&mut self, proposal: &Proposal) -> Result<()>;

    fn get_proposal(&mut self, id: Uuid) -> Result<Proposal>;

    fn update_proposal(&mut self, id: Uuid, mutate: Mutator<'_, Proposal>) -> Result<Proposal>;

    /// PUBLISHED proposals submitted against the given tender.
    fn list_published_proposals(&mut self, tender_id: Uuid) -> Result<Vec<Proposal>>;

    /// All proposals authored by the named employee, any status.
    fn list_proposals_by_author(&mut self, username: &str) -> Result<Vec<Proposal>>;

    fn get_proposal_at_version(&mut self, id: Uuid, version: u32) -> Result<ProposalRevision>;

    /// Referential check used when a proposal is created.
    fn tender_exists(&mut self, tender_id: Uuid) -> Result<bool>;
}

/// Organizations, employees and the responsibility relation between them.
pub trait DirectoryStore {
    fn put_organization(&mut self, organization: &Organization) -> Result<()>;

    fn get_organization(&mut self, id: Uuid) -> Result<Organization>;

    fn put_employee(&mut self, employee: &Employee) -> Result<()>;

    fn get_employee_by_username(&mut self, username: &str) -> Result<Employee>;

    fn assign_responsible(&mut self, assignment: &OrganizationResponsible) -> Result<()>;

    /// Membership answer behind the access gate.
    fn is_responsible(&mut self, organization_id: Uuid, principal: &Principal) -> Result<bool>;
}

/// Lock helper shared by everything that serializes on a store mutex.
pub(crate) fn lock<S>(store: &Mutex<S>) -> Result<MutexGuard<'_, S>> {
    store
        .lock()
        .map_err(|_| BidstoreError::Storage("store lock poisoned".to_string()))
}
