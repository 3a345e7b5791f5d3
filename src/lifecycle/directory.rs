use std::sync::{Arc, Mutex};

use serde::Deserialize;
use tracing::info;
use uuid::Uuid;

use crate::clock::Clock;
use crate::entity::{Employee, OrgType, Organization, OrganizationResponsible};
use crate::error::Result;
use crate::lifecycle::require;
use crate::store::{self, DirectoryStore};

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterOrganization {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub org_type: OrgType,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterEmployee {
    pub username: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
}

/// Registry of organizations, employees and responsibility assignments,
/// the data the access gate answers from.
pub struct Directory<S> {
    store: Arc<Mutex<S>>,
    clock: Arc<dyn Clock>,
}

impl<S> Clone for Directory<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            clock: Arc::clone(&self.clock),
        }
    }
}

impl<S: DirectoryStore> Directory<S> {
    pub fn new(store: Arc<Mutex<S>>, clock: Arc<dyn Clock>) -> Self {
        Self { store, clock }
    }

    pub fn register_organization(&self, cmd: RegisterOrganization) -> Result<Organization> {
        require("name", &cmd.name)?;

        let organization =
            Organization::new(cmd.name, cmd.description, cmd.org_type, self.clock.now());
        store::lock(&self.store)?.put_organization(&organization)?;

        info!(organization = %organization.id, "organization registered");
        Ok(organization)
    }

    pub fn register_employee(&self, cmd: RegisterEmployee) -> Result<Employee> {
        require("username", &cmd.username)?;

        let employee = Employee::new(
            cmd.username,
            cmd.first_name,
            cmd.last_name,
            self.clock.now(),
        );
        store::lock(&self.store)?.put_employee(&employee)?;

        info!(employee = %employee.id, username = %employee.username, "employee registered");
        Ok(employee)
    }

    /// Make the employee responsible for the organization, unlocking tender
    /// and proposal creation on its behalf.
    pub fn assign_responsible(
        &self,
        organization_id: Uuid,
        user_id: Uuid,
    ) -> Result<OrganizationResponsible> {
        let assignment = OrganizationResponsible::new(organization_id, user_id);
        store::lock(&self.store)?.assign_responsible(&assignment)?;

        info!(organization = %organization_id, employee = %user_id, "responsibility assigned");
        Ok(assignment)
    }

    pub fn organization(&self, id: Uuid) -> Result<Organization> {
        store::lock(&self.store)?.get_organization(id)
    }

    pub fn employee(&self, username: &str) -> Result<Employee> {
        require("username", username)?;
        store::lock(&self.store)?.get_employee_by_username(username)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::FixedClock;
    use crate::error::BidstoreError;
    use crate::store::MemoryStore;

    fn directory() -> Directory<MemoryStore> {
        let store = Arc::new(Mutex::new(MemoryStore::new()));
        let clock = FixedClock("2024-09-01T12:00:00Z".parse().unwrap());
        Directory::new(store, Arc::new(clock))
    }

    #[test]
    fn test_register_and_lookup() {
        let directory = directory();

        let org = directory
            .register_organization(RegisterOrganization {
                name: "Acme Logistics".to_string(),
                description: String::new(),
                org_type: OrgType::Llc,
            })
            .unwrap();
        let alice = directory
            .register_employee(RegisterEmployee {
                username: "alice".to_string(),
                first_name: "Alice".to_string(),
                last_name: "Ivanova".to_string(),
            })
            .unwrap();

        directory.assign_responsible(org.id, alice.id).unwrap();

        assert_eq!(directory.organization(org.id).unwrap().name, "Acme Logistics");
        assert_eq!(directory.employee("alice").unwrap().id, alice.id);
    }

    #[test]
    fn test_blank_names_rejected() {
        let directory = directory();

        assert!(matches!(
            directory
                .register_organization(RegisterOrganization {
                    name: " ".to_string(),
                    description: String::new(),
                    org_type: OrgType::Llc,
                })
                .unwrap_err(),
            BidstoreError::Validation(_)
        ));
        assert!(matches!(
            directory
                .register_employee(RegisterEmployee {
                    username: String::new(),
                    first_name: String::new(),
                    last_name: String::new(),
                })
                .unwrap_err(),
            BidstoreError::Validation(_)
        ));
    }

    #[test]
    fn test_assignment_requires_known_rows() {
        let directory = directory();
        let err = directory
            .assign_responsible(Uuid::new_v4(), Uuid::new_v4())
            .unwrap_err();
        assert!(matches!(err, BidstoreError::NotFound(_)));
    }
}
