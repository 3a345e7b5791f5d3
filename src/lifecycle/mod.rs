mod directory;
mod proposal;
mod tender;

pub use directory::{Directory, RegisterEmployee, RegisterOrganization};
pub use proposal::{CreateProposal, EditProposal, ProposalLifecycle};
pub use tender::{CreateTender, EditTender, TenderLifecycle};

use std::sync::{Arc, Mutex};

use crate::access::{AccessGate, StoreGate};
use crate::clock::Clock;
use crate::error::{BidstoreError, Result};
use crate::store::{DirectoryStore, ProposalStore, TenderStore};

/// The three services wired to one shared store, with the access gate
/// answering from that same store's membership relation.
pub struct Services<S> {
    pub directory: Directory<S>,
    pub tenders: TenderLifecycle<S>,
    pub proposals: ProposalLifecycle<S>,
}

impl<S> Clone for Services<S> {
    fn clone(&self) -> Self {
        Self {
            directory: self.directory.clone(),
            tenders: self.tenders.clone(),
            proposals: self.proposals.clone(),
        }
    }
}

impl<S> Services<S>
where
    S: TenderStore + ProposalStore + DirectoryStore + Send + 'static,
{
    pub fn new(store: S, clock: Arc<dyn Clock>) -> Self {
        let store = Arc::new(Mutex::new(store));
        let gate: Arc<dyn AccessGate> = Arc::new(StoreGate::new(Arc::clone(&store)));
        Self {
            directory: Directory::new(Arc::clone(&store), Arc::clone(&clock)),
            tenders: TenderLifecycle::new(
                Arc::clone(&store),
                Arc::clone(&gate),
                Arc::clone(&clock),
            ),
            proposals: ProposalLifecycle::new(store, gate, clock),
        }
    }
}

/// Reject a blank required field before anything is written.
fn require(field: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(BidstoreError::Validation(format!(
            "{} must not be blank",
            field
        )));
    }
    Ok(())
}
