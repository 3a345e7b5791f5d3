use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};
use uuid::Uuid;

use crate::access::Principal;
use crate::entity::{Employee, Organization, OrganizationResponsible, Proposal, Tender};
use crate::error::{BidstoreError, Result};
use crate::store::{
    DirectoryStore, Mutator, ProposalRevision, ProposalStore, TenderRevision, TenderStore,
};

const STORE_DB: &str = "bidstore.db";

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS organization (
    id TEXT PRIMARY KEY,
    name TEXT NOT NULL,
    description TEXT NOT NULL,
    org_type TEXT NOT NULL,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS employee (
    id TEXT PRIMARY KEY,
    username TEXT NOT NULL UNIQUE,
    first_name TEXT NOT NULL,
    last_name TEXT NOT NULL,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS organization_responsible (
    id TEXT PRIMARY KEY,
    organization_id TEXT NOT NULL,
    user_id TEXT NOT NULL,
    UNIQUE (organization_id, user_id)
);

CREATE TABLE IF NOT EXISTS tender (
    id TEXT PRIMARY KEY,
    title TEXT NOT NULL,
    description TEXT NOT NULL,
    status TEXT NOT NULL,
    organization_id TEXT NOT NULL,
    version INTEGER NOT NULL,
    service_type TEXT NOT NULL,
    creator_username TEXT NOT NULL,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS tender_version (
    tender_id TEXT NOT NULL,
    version INTEGER NOT NULL,
    title TEXT NOT NULL,
    description TEXT NOT NULL,
    service_type TEXT NOT NULL,
    recorded_at TEXT NOT NULL,
    PRIMARY KEY (tender_id, version)
);

CREATE TABLE IF NOT EXISTS proposal (
    id TEXT PRIMARY KEY,
    title TEXT NOT NULL,
    description TEXT NOT NULL,
    tender_id TEXT NOT NULL,
    organization_id TEXT NOT NULL,
    author_id TEXT NOT NULL,
    status TEXT NOT NULL,
    version INTEGER NOT NULL,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS proposal_version (
    proposal_id TEXT NOT NULL,
    version INTEGER NOT NULL,
    title TEXT NOT NULL,
    description TEXT NOT NULL,
    recorded_at TEXT NOT NULL,
    PRIMARY KEY (proposal_id, version)
);

CREATE INDEX IF NOT EXISTS idx_tender_org ON tender(organization_id);
CREATE INDEX IF NOT EXISTS idx_tender_status ON tender(status, service_type);
CREATE INDEX IF NOT EXISTS idx_proposal_tender ON proposal(tender_id, status);
CREATE INDEX IF NOT EXISTS idx_proposal_author ON proposal(author_id);
CREATE INDEX IF NOT EXISTS idx_responsible_org ON organization_responsible(organization_id);
";

const TENDER_COLUMNS: &str =
    "id, title, description, status, organization_id, version, service_type, creator_username, \
     created_at, updated_at";

const PROPOSAL_COLUMNS: &str =
    "id, title, description, tender_id, organization_id, author_id, status, version, created_at, \
     updated_at";

/// Durable store over a single SQLite database. Row-level atomicity for
/// read-modify-write updates comes from SQLite transactions.
pub struct SqliteStore {
    conn: Connection,
    #[allow(dead_code)]
    path: PathBuf,
}

impl SqliteStore {
    /// Open or create the store database inside the data directory.
    pub fn open(data_dir: &Path) -> Result<Self> {
        let path = data_dir.join(STORE_DB);
        let conn = Connection::open(&path)?;

        let store = Self { conn, path };
        store.init_schema()?;
        Ok(store)
    }

    /// Private on-disk-free database, used by the serve tests.
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let store = Self {
            conn,
            path: PathBuf::new(),
        };
        store.init_schema()?;
        Ok(store)
    }

    fn init_schema(&self) -> Result<()> {
        self.conn.execute_batch(SCHEMA)?;
        Ok(())
    }

    fn query_tender(conn: &Connection, id: Uuid) -> Result<Tender> {
        let sql = format!("SELECT {} FROM tender WHERE id = ?1", TENDER_COLUMNS);
        conn.query_row(&sql, [id.to_string()], tender_from_row)
            .optional()?
            .ok_or_else(|| BidstoreError::NotFound(format!("tender {}", id)))
    }

    fn query_proposal(conn: &Connection, id: Uuid) -> Result<Proposal> {
        let sql = format!("SELECT {} FROM proposal WHERE id = ?1", PROPOSAL_COLUMNS);
        conn.query_row(&sql, [id.to_string()], proposal_from_row)
            .optional()?
            .ok_or_else(|| BidstoreError::NotFound(format!("proposal {}", id)))
    }

    fn row_exists(conn: &Connection, sql: &str, key: &str) -> Result<bool> {
        let exists: bool = conn.query_row(sql, [key], |row| row.get(0))?;
        Ok(exists)
    }

    fn record_tender_version(conn: &Connection, tender: &Tender) -> Result<()> {
        conn.execute(
            "INSERT INTO tender_version (tender_id, version, title, description, service_type, recorded_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                tender.id.to_string(),
                tender.version,
                tender.title,
                tender.description,
                tender.service_type,
                tender.updated_at.to_rfc3339(),
            ],
        )?;
        Ok(())
    }

    fn record_proposal_version(conn: &Connection, proposal: &Proposal) -> Result<()> {
        conn.execute(
            "INSERT INTO proposal_version (proposal_id, version, title, description, recorded_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                proposal.id.to_string(),
                proposal.version,
                proposal.title,
                proposal.description,
                proposal.updated_at.to_rfc3339(),
            ],
        )?;
        Ok(())
    }
}

impl TenderStore for SqliteStore {
    fn put_tender(&mut self, tender: &Tender) -> Result<()> {
        let tx = self.conn.transaction()?;

        if Self::row_exists(
            &tx,
            "SELECT EXISTS(SELECT 1 FROM tender WHERE id = ?1)",
            &tender.id.to_string(),
        )? {
            return Err(BidstoreError::Conflict(format!(
                "tender {} already exists",
                tender.id
            )));
        }

        tx.execute(
            &format!(
                "INSERT INTO tender ({}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
                TENDER_COLUMNS
            ),
            params![
                tender.id.to_string(),
                tender.title,
                tender.description,
                tender.status.to_string(),
                tender.organization_id.to_string(),
                tender.version,
                tender.service_type,
                tender.creator_username,
                tender.created_at.to_rfc3339(),
                tender.updated_at.to_rfc3339(),
            ],
        )?;
        Self::record_tender_version(&tx, tender)?;

        tx.commit()?;
        Ok(())
    }

    fn get_tender(&mut self, id: Uuid) -> Result<Tender> {
        Self::query_tender(&self.conn, id)
    }

    fn update_tender(&mut self, id: Uuid, mutate: Mutator<'_, Tender>) -> Result<Tender> {
        let tx = self.conn.transaction()?;

        let mut tender = Self::query_tender(&tx, id)?;
        let version_before = tender.version;
        mutate(&mut tender)?;

        tx.execute(
            "UPDATE tender
             SET title = ?2, description = ?3, status = ?4, version = ?5, service_type = ?6,
                 updated_at = ?7
             WHERE id = ?1",
            params![
                tender.id.to_string(),
                tender.title,
                tender.description,
                tender.status.to_string(),
                tender.version,
                tender.service_type,
                tender.updated_at.to_rfc3339(),
            ],
        )?;
        if tender.version > version_before {
            Self::record_tender_version(&tx, &tender)?;
        }

        tx.commit()?;
        Ok(tender)
    }

    fn list_published_tenders(&mut self, service_type: Option<&str>) -> Result<Vec<Tender>> {
        let tenders = match service_type {
            Some(service_type) => {
                let sql = format!(
                    "SELECT {} FROM tender WHERE status = 'PUBLISHED' AND service_type = ?1
                     ORDER BY created_at",
                    TENDER_COLUMNS
                );
                let mut stmt = self.conn.prepare(&sql)?;
                let rows = stmt.query_map([service_type], tender_from_row)?;
                rows.collect::<std::result::Result<Vec<_>, _>>()?
            }
            None => {
                let sql = format!(
                    "SELECT {} FROM tender WHERE status = 'PUBLISHED' ORDER BY created_at",
                    TENDER_COLUMNS
                );
                let mut stmt = self.conn.prepare(&sql)?;
                let rows = stmt.query_map([], tender_from_row)?;
                rows.collect::<std::result::Result<Vec<_>, _>>()?
            }
        };
        Ok(tenders)
    }

    fn list_tenders_by_responsible(&mut self, username: &str) -> Result<Vec<Tender>> {
        let sql = format!(
            "SELECT t.{} FROM tender t
             JOIN organization_responsible r ON t.organization_id = r.organization_id
             JOIN employee e ON r.user_id = e.id
             WHERE e.username = ?1
             ORDER BY t.created_at",
            TENDER_COLUMNS.replace(", ", ", t.")
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map([username], tender_from_row)?;
        Ok(rows.collect::<std::result::Result<Vec<_>, _>>()?)
    }

    fn get_tender_at_version(&mut self, id: Uuid, version: u32) -> Result<TenderRevision> {
        self.conn
            .query_row(
                "SELECT tender_id, version, title, description, service_type, recorded_at
                 FROM tender_version
                 WHERE tender_id = ?1 AND version = ?2",
                params![id.to_string(), version],
                tender_revision_from_row,
            )
            .optional()?
            .ok_or_else(|| BidstoreError::NotFound(format!("tender {} version {}", id, version)))
    }
}

impl ProposalStore for SqliteStore {
    fn put_proposal(&mut self, proposal: &Proposal) -> Result<()> {
        let tx = self.conn.transaction()?;

        if Self::row_exists(
            &tx,
            "SELECT EXISTS(SELECT 1 FROM proposal WHERE id = ?1)",
            &proposal.id.to_string(),
        )? {
            return Err(BidstoreError::Conflict(format!(
                "proposal {} already exists",
                proposal.id
            )));
        }

        tx.execute(
            &format!(
                "INSERT INTO proposal ({}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
                PROPOSAL_COLUMNS
            ),
            params![
                proposal.id.to_string(),
                proposal.title,
                proposal.description,
                proposal.tender_id.to_string(),
                proposal.organization_id.to_string(),
                proposal.author_id.to_string(),
                proposal.status.to_string(),
                proposal.version,
                proposal.created_at.to_rfc3339(),
                proposal.updated_at.to_rfc3339(),
            ],
        )?;
        Self::record_proposal_version(&tx, proposal)?;

        tx.commit()?;
        Ok(())
    }

    fn get_proposal(&mut self, id: Uuid) -> Result<Proposal> {
        Self::query_proposal(&self.conn, id)
    }

    fn update_proposal(&mut self, id: Uuid, mutate: Mutator<'_, Proposal>) -> Result<Proposal> {
        let tx = self.conn.transaction()?;

        let mut proposal = Self::query_proposal(&tx, id)?;
        let version_before = proposal.version;
        mutate(&mut proposal)?;

        tx.execute(
            "UPDATE proposal
             SET title = ?2, description = ?3, status = ?4, version = ?5, updated_at = ?6
             WHERE id = ?1",
            params![
                proposal.id.to_string(),
                proposal.title,
                proposal.description,
                proposal.status.to_string(),
                proposal.version,
                proposal.updated_at.to_rfc3339(),
            ],
        )?;
        if proposal.version > version_before {
            Self::record_proposal_version(&tx, &proposal)?;
        }

        tx.commit()?;
        Ok(proposal)
    }

    fn list_published_proposals(&mut self, tender_id: Uuid) -> Result<Vec<Proposal>> {
        let sql = format!(
            "SELECT {} FROM proposal WHERE tender_id = ?1 AND status = 'PUBLISHED'
             ORDER BY created_at",
            PROPOSAL_COLUMNS
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map([tender_id.to_string()], proposal_from_row)?;
        Ok(rows.collect::<std::result::Result<Vec<_>, _>>()?)
    }

    fn list_proposals_by_author(&mut self, username: &str) -> Result<Vec<Proposal>> {
        let sql = format!(
            "SELECT p.{} FROM proposal p
             JOIN employee e ON p.author_id = e.id
             WHERE e.username = ?1
             ORDER BY p.created_at",
            PROPOSAL_COLUMNS.replace(", ", ", p.")
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map([username], proposal_from_row)?;
        Ok(rows.collect::<std::result::Result<Vec<_>, _>>()?)
    }

    fn get_proposal_at_version(&mut self, id: Uuid, version: u32) -> Result<ProposalRevision> {
        self.conn
            .query_row(
                "SELECT proposal_id, version, title, description, recorded_at
                 FROM proposal_version
                 WHERE proposal_id = ?1 AND version = ?2",
                params![id.to_string(), version],
                proposal_revision_from_row,
            )
            .optional()?
            .ok_or_else(|| BidstoreError::NotFound(format!("proposal {} version {}", id, version)))
    }

    fn tender_exists(&mut self, tender_id: Uuid) -> Result<bool> {
        Self::row_exists(
            &self.conn,
            "SELECT EXISTS(SELECT 1 FROM tender WHERE id = ?1)",
            &tender_id.to_string(),
        )
    }
}

impl DirectoryStore for SqliteStore {
    fn put_organization(&mut self, organization: &Organization) -> Result<()> {
        if Self::row_exists(
            &self.conn,
            "SELECT EXISTS(SELECT 1 FROM organization WHERE id = ?1)",
            &organization.id.to_string(),
        )? {
            return Err(BidstoreError::Conflict(format!(
                "organization {} already exists",
                organization.id
            )));
        }

        self.conn.execute(
            "INSERT INTO organization (id, name, description, org_type, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                organization.id.to_string(),
                organization.name,
                organization.description,
                organization.org_type.to_string(),
                organization.created_at.to_rfc3339(),
                organization.updated_at.to_rfc3339(),
            ],
        )?;
        Ok(())
    }

    fn get_organization(&mut self, id: Uuid) -> Result<Organization> {
        self.conn
            .query_row(
                "SELECT id, name, description, org_type, created_at, updated_at
                 FROM organization WHERE id = ?1",
                [id.to_string()],
                organization_from_row,
            )
            .optional()?
            .ok_or_else(|| BidstoreError::NotFound(format!("organization {}", id)))
    }

    fn put_employee(&mut self, employee: &Employee) -> Result<()> {
        if Self::row_exists(
            &self.conn,
            "SELECT EXISTS(SELECT 1 FROM employee WHERE username = ?1)",
            &employee.username,
        )? {
            return Err(BidstoreError::Conflict(format!(
                "employee username {:?} already taken",
                employee.username
            )));
        }

        self.conn.execute(
            "INSERT INTO employee (id, username, first_name, last_name, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                employee.id.to_string(),
                employee.username,
                employee.first_name,
                employee.last_name,
                employee.created_at.to_rfc3339(),
                employee.updated_at.to_rfc3339(),
            ],
        )?;
        Ok(())
    }

    fn get_employee_by_username(&mut self, username: &str) -> Result<Employee> {
        self.conn
            .query_row(
                "SELECT id, username, first_name, last_name, created_at, updated_at
                 FROM employee WHERE username = ?1",
                [username],
                employee_from_row,
            )
            .optional()?
            .ok_or_else(|| BidstoreError::NotFound(format!("employee {:?}", username)))
    }

    fn assign_responsible(&mut self, assignment: &OrganizationResponsible) -> Result<()> {
        let tx = self.conn.transaction()?;

        if !Self::row_exists(
            &tx,
            "SELECT EXISTS(SELECT 1 FROM organization WHERE id = ?1)",
            &assignment.organization_id.to_string(),
        )? {
            return Err(BidstoreError::NotFound(format!(
                "organization {}",
                assignment.organization_id
            )));
        }
        if !Self::row_exists(
            &tx,
            "SELECT EXISTS(SELECT 1 FROM employee WHERE id = ?1)",
            &assignment.user_id.to_string(),
        )? {
            return Err(BidstoreError::NotFound(format!(
                "employee {}",
                assignment.user_id
            )));
        }

        let already: bool = tx.query_row(
            "SELECT EXISTS(SELECT 1 FROM organization_responsible
             WHERE organization_id = ?1 AND user_id = ?2)",
            params![
                assignment.organization_id.to_string(),
                assignment.user_id.to_string()
            ],
            |row| row.get(0),
        )?;
        if already {
            return Err(BidstoreError::Conflict(format!(
                "employee {} is already responsible for organization {}",
                assignment.user_id, assignment.organization_id
            )));
        }

        tx.execute(
            "INSERT INTO organization_responsible (id, organization_id, user_id)
             VALUES (?1, ?2, ?3)",
            params![
                assignment.id.to_string(),
                assignment.organization_id.to_string(),
                assignment.user_id.to_string(),
            ],
        )?;

        tx.commit()?;
        Ok(())
    }

    fn is_responsible(&mut self, organization_id: Uuid, principal: &Principal) -> Result<bool> {
        let exists: bool = match principal {
            Principal::Username(username) => self.conn.query_row(
                "SELECT EXISTS(
                     SELECT 1 FROM organization_responsible r
                     JOIN employee e ON r.user_id = e.id
                     WHERE r.organization_id = ?1 AND e.username = ?2)",
                params![organization_id.to_string(), username],
                |row| row.get(0),
            )?,
            Principal::UserId(user_id) => self.conn.query_row(
                "SELECT EXISTS(
                     SELECT 1 FROM organization_responsible
                     WHERE organization_id = ?1 AND user_id = ?2)",
                params![organization_id.to_string(), user_id.to_string()],
                |row| row.get(0),
            )?,
        };
        Ok(exists)
    }
}

fn conv_err(idx: usize, message: String) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(
        idx,
        rusqlite::types::Type::Text,
        Box::new(std::io::Error::new(std::io::ErrorKind::InvalidData, message)),
    )
}

fn get_uuid(row: &Row<'_>, idx: usize) -> rusqlite::Result<Uuid> {
    let raw: String = row.get(idx)?;
    Uuid::parse_str(&raw).map_err(|e| conv_err(idx, format!("invalid UUID {:?}: {}", raw, e)))
}

fn get_timestamp(row: &Row<'_>, idx: usize) -> rusqlite::Result<DateTime<Utc>> {
    let raw: String = row.get(idx)?;
    DateTime::parse_from_rfc3339(&raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| conv_err(idx, format!("invalid timestamp {:?}: {}", raw, e)))
}

fn get_parsed<T>(row: &Row<'_>, idx: usize) -> rusqlite::Result<T>
where
    T: std::str::FromStr<Err = String>,
{
    let raw: String = row.get(idx)?;
    raw.parse().map_err(|message| conv_err(idx, message))
}

fn tender_from_row(row: &Row<'_>) -> rusqlite::Result<Tender> {
    Ok(Tender {
        id: get_uuid(row, 0)?,
        title: row.get(1)?,
        description: row.get(2)?,
        status: get_parsed(row, 3)?,
        organization_id: get_uuid(row, 4)?,
        version: row.get(5)?,
        service_type: row.get(6)?,
        creator_username: row.get(7)?,
        created_at: get_timestamp(row, 8)?,
        updated_at: get_timestamp(row, 9)?,
    })
}

fn tender_revision_from_row(row: &Row<'_>) -> rusqlite::Result<TenderRevision> {
    Ok(TenderRevision {
        tender_id: get_uuid(row, 0)?,
        version: row.get(1)?,
        title: row.get(2)?,
        description: row.get(3)?,
        service_type: row.get(4)?,
        recorded_at: get_timestamp(row, 5)?,
    })
}

fn proposal_from_row(row: &Row<'_>) -> rusqlite::Result<Proposal> {
    Ok(Proposal {
        id: get_uuid(row, 0)?,
        title: row.get(1)?,
        description: row.get(2)?,
        tender_id: get_uuid(row, 3)?,
        organization_id: get_uuid(row, 4)?,
        author_id: get_uuid(row, 5)?,
        status: get_parsed(row, 6)?,
        version: row.get(7)?,
        created_at: get_timestamp(row, 8)?,
        updated_at: get_timestamp(row, 9)?,
    })
}

fn organization_from_row(row: &Row<'_>) -> rusqlite::Result<Organization> {
    Ok(Organization {
        id: get_uuid(row, 0)?,
        name: row.get(1)?,
        description: row.get(2)?,
        org_type: get_parsed(row, 3)?,
        created_at: get_timestamp(row, 4)?,
        updated_at: get_timestamp(row, 5)?,
    })
}

fn employee_from_row(row: &Row<'_>) -> rusqlite::Result<Employee> {
    Ok(Employee {
        id: get_uuid(row, 0)?,
        username: row.get(1)?,
        first_name: row.get(2)?,
        last_name: row.get(3)?,
        created_at: get_timestamp(row, 4)?,
        updated_at: get_timestamp(row, 5)?,
    })
}

fn proposal_revision_from_row(row: &Row<'_>) -> rusqlite::Result<ProposalRevision> {
    Ok(ProposalRevision {
        proposal_id: get_uuid(row, 0)?,
        version: row.get(1)?,
        title: row.get(2)?,
        description: row.get(3)?,
        recorded_at: get_timestamp(row, 4)?,
    })
}

impl From<rusqlite::Error> for BidstoreError {
    fn from(e: rusqlite::Error) -> Self {
        BidstoreError::Storage(format!("SQLite error: {}", e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::{OrgType, ProposalStatus, TenderStatus};
    use tempfile::TempDir;

    fn now() -> DateTime<Utc> {
        "2024-09-01T12:00:00Z".parse().unwrap()
    }

    fn sample_tender(org: Uuid) -> Tender {
        Tender::new(
            "Office relocation".to_string(),
            "Move 40 desks".to_string(),
            org,
            "Logistics".to_string(),
            "alice".to_string(),
            now(),
        )
    }

    #[test]
    fn test_open_creates_db() {
        let tmp = TempDir::new().unwrap();
        let _store = SqliteStore::open(tmp.path()).unwrap();
        assert!(tmp.path().join("bidstore.db").exists());
    }

    #[test]
    fn test_put_and_get_tender() {
        let mut store = SqliteStore::open_in_memory().unwrap();
        let tender = sample_tender(Uuid::new_v4());

        store.put_tender(&tender).unwrap();
        let loaded = store.get_tender(tender.id).unwrap();

        assert_eq!(loaded.title, "Office relocation");
        assert_eq!(loaded.status, TenderStatus::Created);
        assert_eq!(loaded.version, 1);
        assert_eq!(loaded.created_at, now());
    }

    #[test]
    fn test_put_duplicate_tender_conflicts() {
        let mut store = SqliteStore::open_in_memory().unwrap();
        let tender = sample_tender(Uuid::new_v4());

        store.put_tender(&tender).unwrap();
        let err = store.put_tender(&tender).unwrap_err();
        assert!(matches!(err, BidstoreError::Conflict(_)));
    }

    #[test]
    fn test_get_missing_tender_not_found() {
        let mut store = SqliteStore::open_in_memory().unwrap();
        let err = store.get_tender(Uuid::new_v4()).unwrap_err();
        assert!(matches!(err, BidstoreError::NotFound(_)));
    }

    #[test]
    fn test_update_records_version_history() {
        let mut store = SqliteStore::open_in_memory().unwrap();
        let tender = sample_tender(Uuid::new_v4());
        store.put_tender(&tender).unwrap();

        store
            .update_tender(tender.id, &mut |t| {
                t.title = "Office relocation, phase 2".to_string();
                t.version += 1;
                Ok(())
            })
            .unwrap();

        let v1 = store.get_tender_at_version(tender.id, 1).unwrap();
        assert_eq!(v1.title, "Office relocation");
        let v2 = store.get_tender_at_version(tender.id, 2).unwrap();
        assert_eq!(v2.title, "Office relocation, phase 2");

        let err = store.get_tender_at_version(tender.id, 3).unwrap_err();
        assert!(matches!(err, BidstoreError::NotFound(_)));
    }

    #[test]
    fn test_status_only_update_keeps_history_unchanged() {
        let mut store = SqliteStore::open_in_memory().unwrap();
        let tender = sample_tender(Uuid::new_v4());
        store.put_tender(&tender).unwrap();

        store
            .update_tender(tender.id, &mut |t| {
                t.status = TenderStatus::Published;
                Ok(())
            })
            .unwrap();

        assert!(store.get_tender_at_version(tender.id, 2).is_err());
        let loaded = store.get_tender(tender.id).unwrap();
        assert_eq!(loaded.status, TenderStatus::Published);
        assert_eq!(loaded.version, 1);
    }

    #[test]
    fn test_failed_mutation_writes_nothing() {
        let mut store = SqliteStore::open_in_memory().unwrap();
        let tender = sample_tender(Uuid::new_v4());
        store.put_tender(&tender).unwrap();

        let err = store
            .update_tender(tender.id, &mut |t| {
                t.title = "should not persist".to_string();
                t.version += 1;
                Err(BidstoreError::Validation("rejected".to_string()))
            })
            .unwrap_err();
        assert!(matches!(err, BidstoreError::Validation(_)));

        let loaded = store.get_tender(tender.id).unwrap();
        assert_eq!(loaded.title, "Office relocation");
        assert_eq!(loaded.version, 1);
    }

    #[test]
    fn test_list_published_tenders_filters_status_and_service_type() {
        let mut store = SqliteStore::open_in_memory().unwrap();
        let org = Uuid::new_v4();

        let mut it_tender = sample_tender(org);
        it_tender.service_type = "IT".to_string();
        it_tender.status = TenderStatus::Published;
        store.put_tender(&it_tender).unwrap();

        let mut draft = sample_tender(org);
        draft.service_type = "IT".to_string();
        store.put_tender(&draft).unwrap();

        let mut logistics = sample_tender(org);
        logistics.status = TenderStatus::Published;
        store.put_tender(&logistics).unwrap();

        let it_only = store.list_published_tenders(Some("IT")).unwrap();
        assert_eq!(it_only.len(), 1);
        assert_eq!(it_only[0].id, it_tender.id);

        let all = store.list_published_tenders(None).unwrap();
        assert_eq!(all.len(), 2);
    }

    #[test]
    fn test_list_tenders_by_responsible() {
        let mut store = SqliteStore::open_in_memory().unwrap();

        let org = Organization::new(
            "Acme Logistics".to_string(),
            String::new(),
            OrgType::Llc,
            now(),
        );
        store.put_organization(&org).unwrap();
        let alice = Employee::new("alice".to_string(), String::new(), String::new(), now());
        store.put_employee(&alice).unwrap();
        store
            .assign_responsible(&OrganizationResponsible::new(org.id, alice.id))
            .unwrap();

        let mine = sample_tender(org.id);
        store.put_tender(&mine).unwrap();
        let other = sample_tender(Uuid::new_v4());
        store.put_tender(&other).unwrap();

        let listed = store.list_tenders_by_responsible("alice").unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].id, mine.id);

        assert!(store
            .list_tenders_by_responsible("nobody")
            .unwrap()
            .is_empty());
    }

    #[test]
    fn test_membership_checks() {
        let mut store = SqliteStore::open_in_memory().unwrap();

        let org = Organization::new("Acme".to_string(), String::new(), OrgType::Llc, now());
        store.put_organization(&org).unwrap();
        let bob = Employee::new("bob".to_string(), String::new(), String::new(), now());
        store.put_employee(&bob).unwrap();
        store
            .assign_responsible(&OrganizationResponsible::new(org.id, bob.id))
            .unwrap();

        assert!(store
            .is_responsible(org.id, &Principal::Username("bob".to_string()))
            .unwrap());
        assert!(store
            .is_responsible(org.id, &Principal::UserId(bob.id))
            .unwrap());
        assert!(!store
            .is_responsible(org.id, &Principal::Username("mallory".to_string()))
            .unwrap());
        assert!(!store
            .is_responsible(Uuid::new_v4(), &Principal::UserId(bob.id))
            .unwrap());
    }

    #[test]
    fn test_assign_responsible_requires_both_rows() {
        let mut store = SqliteStore::open_in_memory().unwrap();
        let org = Organization::new("Acme".to_string(), String::new(), OrgType::Llc, now());
        store.put_organization(&org).unwrap();

        let err = store
            .assign_responsible(&OrganizationResponsible::new(org.id, Uuid::new_v4()))
            .unwrap_err();
        assert!(matches!(err, BidstoreError::NotFound(_)));
    }

    #[test]
    fn test_duplicate_username_conflicts() {
        let mut store = SqliteStore::open_in_memory().unwrap();
        let bob = Employee::new("bob".to_string(), String::new(), String::new(), now());
        store.put_employee(&bob).unwrap();

        let imposter = Employee::new("bob".to_string(), String::new(), String::new(), now());
        let err = store.put_employee(&imposter).unwrap_err();
        assert!(matches!(err, BidstoreError::Conflict(_)));
    }

    #[test]
    fn test_proposal_roundtrip_and_listings() {
        let mut store = SqliteStore::open_in_memory().unwrap();

        let org = Organization::new("Acme".to_string(), String::new(), OrgType::Llc, now());
        store.put_organization(&org).unwrap();
        let bob = Employee::new("bob".to_string(), String::new(), String::new(), now());
        store.put_employee(&bob).unwrap();

        let tender = sample_tender(org.id);
        store.put_tender(&tender).unwrap();
        assert!(store.tender_exists(tender.id).unwrap());
        assert!(!store.tender_exists(Uuid::new_v4()).unwrap());

        let mut proposal = Proposal::new(
            "Full-service bid".to_string(),
            "Two trucks, one weekend".to_string(),
            tender.id,
            org.id,
            bob.id,
            now(),
        );
        proposal.status = ProposalStatus::Published;
        store.put_proposal(&proposal).unwrap();

        let draft = Proposal::new(
            "Draft bid".to_string(),
            String::new(),
            tender.id,
            org.id,
            bob.id,
            now(),
        );
        store.put_proposal(&draft).unwrap();

        let published = store.list_published_proposals(tender.id).unwrap();
        assert_eq!(published.len(), 1);
        assert_eq!(published[0].id, proposal.id);

        let bobs = store.list_proposals_by_author("bob").unwrap();
        assert_eq!(bobs.len(), 2);
    }
}
