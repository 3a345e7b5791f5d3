mod directory;
mod proposal;
mod tender;

pub use directory::{Employee, OrgType, Organization, OrganizationResponsible};
pub use proposal::{Proposal, ProposalStatus};
pub use tender::{Tender, TenderStatus};
