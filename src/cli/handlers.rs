use std::env;
use std::fs;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use uuid::Uuid;

use crate::clock::SystemClock;
use crate::entity::{Proposal, Tender};
use crate::error::{BidstoreError, Result};
use crate::http;
use crate::lifecycle::{
    CreateProposal, CreateTender, EditProposal, EditTender, RegisterEmployee, RegisterOrganization,
    Services,
};
use crate::store::SqliteStore;

const DATA_DIR: &str = ".bidstore";

/// Find the data root by looking for .bidstore/ or .git/
fn find_data_root() -> PathBuf {
    let cwd = env::current_dir().unwrap_or_else(|_| PathBuf::from("."));

    let mut current = cwd.as_path();
    loop {
        if current.join(DATA_DIR).exists() || current.join(".git").exists() {
            return current.to_path_buf();
        }
        match current.parent() {
            Some(parent) => current = parent,
            None => return cwd,
        }
    }
}

fn open_services() -> Result<Services<SqliteStore>> {
    let data_dir = find_data_root().join(DATA_DIR);
    if !data_dir.exists() {
        return Err(BidstoreError::NotInitialized);
    }

    let store = SqliteStore::open(&data_dir)?;
    Ok(Services::new(store, Arc::new(SystemClock)))
}

fn print_tender(tender: &Tender) {
    println!(
        "  {} v{} [{}] {} ({})",
        tender.id, tender.version, tender.status, tender.title, tender.service_type
    );
}

fn print_proposal(proposal: &Proposal) {
    println!(
        "  {} v{} [{}] {}",
        proposal.id, proposal.version, proposal.status, proposal.title
    );
}

pub fn handle_init() -> Result<()> {
    let root = env::current_dir()?;
    let data_dir = root.join(DATA_DIR);

    if data_dir.exists() {
        return Err(BidstoreError::AlreadyInitialized);
    }

    fs::create_dir_all(&data_dir)?;
    SqliteStore::open(&data_dir)?;

    println!("Initialized bidstore data directory in {}", root.display());
    Ok(())
}

pub fn handle_serve(addr: String) -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("bidstore=info")),
        )
        .init();

    let listen: SocketAddr = addr.parse().map_err(|e| {
        BidstoreError::Validation(format!("invalid listen address {:?}: {}", addr, e))
    })?;

    let services = open_services()?;
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;
    runtime.block_on(http::serve(listen, services))
}

pub fn handle_org_add(
    name: String,
    description: String,
    org_type: String,
    json: bool,
) -> Result<()> {
    let org_type = org_type
        .parse()
        .map_err(BidstoreError::Validation)?;

    let services = open_services()?;
    let organization = services.directory.register_organization(RegisterOrganization {
        name,
        description,
        org_type,
    })?;

    if json {
        println!("{}", serde_json::to_string_pretty(&organization)?);
    } else {
        println!(
            "Registered organization {} - {}",
            organization.id, organization.name
        );
    }
    Ok(())
}

pub fn handle_org_assign(organization_id: Uuid, user_id: Uuid) -> Result<()> {
    let services = open_services()?;
    services
        .directory
        .assign_responsible(organization_id, user_id)?;

    println!(
        "Assigned employee {} to organization {}",
        user_id, organization_id
    );
    Ok(())
}

pub fn handle_employee_add(
    username: String,
    first_name: String,
    last_name: String,
    json: bool,
) -> Result<()> {
    let services = open_services()?;
    let employee = services.directory.register_employee(RegisterEmployee {
        username,
        first_name,
        last_name,
    })?;

    if json {
        println!("{}", serde_json::to_string_pretty(&employee)?);
    } else {
        println!("Registered employee {} - {}", employee.id, employee.username);
    }
    Ok(())
}

pub fn handle_tender_add(
    title: String,
    description: String,
    organization: Uuid,
    service_type: String,
    creator: String,
    json: bool,
) -> Result<()> {
    let services = open_services()?;
    let tender = services.tenders.create(CreateTender {
        title,
        description,
        organization_id: organization,
        service_type,
        creator_username: creator,
    })?;

    if json {
        println!("{}", serde_json::to_string_pretty(&tender)?);
    } else {
        println!("Created tender {} - {}", tender.id, tender.title);
    }
    Ok(())
}

pub fn handle_tender_list(service_type: Option<String>, json: bool) -> Result<()> {
    let services = open_services()?;
    let tenders = services.tenders.tenders(service_type.as_deref())?;

    if json {
        println!("{}", serde_json::to_string_pretty(&tenders)?);
    } else if tenders.is_empty() {
        println!("No tenders found.");
    } else {
        println!("Tenders:\n");
        for tender in &tenders {
            print_tender(tender);
        }
    }
    Ok(())
}

pub fn handle_tender_my(username: String, json: bool) -> Result<()> {
    let services = open_services()?;
    let tenders = services.tenders.my_tenders(&username)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&tenders)?);
    } else if tenders.is_empty() {
        println!("No tenders found.");
    } else {
        println!("Tenders:\n");
        for tender in &tenders {
            print_tender(tender);
        }
    }
    Ok(())
}

pub fn handle_tender_status(id: Uuid) -> Result<()> {
    let services = open_services()?;
    println!("{}", services.tenders.status(id)?);
    Ok(())
}

pub fn handle_tender_edit(id: Uuid, title: String, description: String, json: bool) -> Result<()> {
    let services = open_services()?;
    let tender = services.tenders.edit(id, EditTender { title, description })?;

    if json {
        println!("{}", serde_json::to_string_pretty(&tender)?);
    } else {
        println!("Updated tender {} to v{}", tender.id, tender.version);
    }
    Ok(())
}

pub fn handle_tender_publish(id: Uuid, json: bool) -> Result<()> {
    let services = open_services()?;
    let tender = services.tenders.publish(id)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&tender)?);
    } else {
        println!("Tender {} is now {}", tender.id, tender.status);
    }
    Ok(())
}

pub fn handle_tender_close(id: Uuid, json: bool) -> Result<()> {
    let services = open_services()?;
    let tender = services.tenders.close(id)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&tender)?);
    } else {
        println!("Tender {} is now {}", tender.id, tender.status);
    }
    Ok(())
}

pub fn handle_tender_rollback(id: Uuid, version: u32, json: bool) -> Result<()> {
    let services = open_services()?;
    let tender = services.tenders.rollback(id, version)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&tender)?);
    } else {
        println!(
            "Rolled back tender {} to v{} (restored v{})",
            tender.id, tender.version, version
        );
    }
    Ok(())
}

pub fn handle_proposal_add(
    title: String,
    description: String,
    tender: Uuid,
    organization: Uuid,
    author: Uuid,
    json: bool,
) -> Result<()> {
    let services = open_services()?;
    let proposal = services.proposals.create(CreateProposal {
        title,
        description,
        tender_id: tender,
        organization_id: organization,
        author_id: author,
    })?;

    if json {
        println!("{}", serde_json::to_string_pretty(&proposal)?);
    } else {
        println!("Created proposal {} - {}", proposal.id, proposal.title);
    }
    Ok(())
}

pub fn handle_proposal_list(tender_id: Uuid, json: bool) -> Result<()> {
    let services = open_services()?;
    let proposals = services.proposals.by_tender(tender_id)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&proposals)?);
    } else if proposals.is_empty() {
        println!("No proposals found.");
    } else {
        println!("Proposals:\n");
        for proposal in &proposals {
            print_proposal(proposal);
        }
    }
    Ok(())
}

pub fn handle_proposal_my(username: String, json: bool) -> Result<()> {
    let services = open_services()?;
    let proposals = services.proposals.by_username(&username)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&proposals)?);
    } else if proposals.is_empty() {
        println!("No proposals found.");
    } else {
        println!("Proposals:\n");
        for proposal in &proposals {
            print_proposal(proposal);
        }
    }
    Ok(())
}

pub fn handle_proposal_status(id: Uuid) -> Result<()> {
    let services = open_services()?;
    println!("{}", services.proposals.status(id)?);
    Ok(())
}

pub fn handle_proposal_edit(
    id: Uuid,
    title: String,
    description: String,
    json: bool,
) -> Result<()> {
    let services = open_services()?;
    let proposal = services
        .proposals
        .edit(id, EditProposal { title, description })?;

    if json {
        println!("{}", serde_json::to_string_pretty(&proposal)?);
    } else {
        println!("Updated proposal {} to v{}", proposal.id, proposal.version);
    }
    Ok(())
}

pub fn handle_proposal_publish(id: Uuid, json: bool) -> Result<()> {
    let services = open_services()?;
    let proposal = services.proposals.publish(id)?;
    report_proposal_status(&proposal, json)
}

pub fn handle_proposal_cancel(id: Uuid, json: bool) -> Result<()> {
    let services = open_services()?;
    let proposal = services.proposals.cancel(id)?;
    report_proposal_status(&proposal, json)
}

pub fn handle_proposal_agree(id: Uuid, json: bool) -> Result<()> {
    let services = open_services()?;
    let proposal = services.proposals.agree(id)?;
    report_proposal_status(&proposal, json)
}

pub fn handle_proposal_decline(id: Uuid, json: bool) -> Result<()> {
    let services = open_services()?;
    let proposal = services.proposals.decline(id)?;
    report_proposal_status(&proposal, json)
}

pub fn handle_proposal_rollback(id: Uuid, version: u32, json: bool) -> Result<()> {
    let services = open_services()?;
    let proposal = services.proposals.rollback(id, version)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&proposal)?);
    } else {
        println!(
            "Rolled back proposal {} to v{} (restored v{})",
            proposal.id, proposal.version, version
        );
    }
    Ok(())
}

fn report_proposal_status(proposal: &Proposal, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(proposal)?);
    } else {
        println!("Proposal {} is now {}", proposal.id, proposal.status);
    }
    Ok(())
}
