use bidstore::cli::{
    handle_employee_add, handle_init, handle_org_add, handle_org_assign, handle_proposal_add,
    handle_proposal_agree, handle_proposal_cancel, handle_proposal_decline, handle_proposal_edit,
    handle_proposal_list, handle_proposal_my, handle_proposal_publish, handle_proposal_rollback,
    handle_proposal_status, handle_serve, handle_tender_add, handle_tender_close,
    handle_tender_edit, handle_tender_list, handle_tender_my, handle_tender_publish,
    handle_tender_rollback, handle_tender_status, Cli, Commands, EmployeeAction, OrgAction,
    ProposalAction, TenderAction,
};
use clap::Parser;

fn main() {
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Init => handle_init(),
        Commands::Serve { addr } => handle_serve(addr),
        Commands::Org(org) => match org.action {
            OrgAction::Add {
                name,
                description,
                org_type,
                json,
            } => handle_org_add(name, description, org_type, json),
            OrgAction::Assign {
                organization_id,
                user_id,
            } => handle_org_assign(organization_id, user_id),
        },
        Commands::Employee(employee) => match employee.action {
            EmployeeAction::Add {
                username,
                first_name,
                last_name,
                json,
            } => handle_employee_add(username, first_name, last_name, json),
        },
        Commands::Tender(tender) => match tender.action {
            TenderAction::Add {
                title,
                description,
                organization,
                service_type,
                creator,
                json,
            } => handle_tender_add(title, description, organization, service_type, creator, json),
            TenderAction::List { service_type, json } => handle_tender_list(service_type, json),
            TenderAction::My { username, json } => handle_tender_my(username, json),
            TenderAction::Status { id } => handle_tender_status(id),
            TenderAction::Edit {
                id,
                title,
                description,
                json,
            } => handle_tender_edit(id, title, description, json),
            TenderAction::Publish { id, json } => handle_tender_publish(id, json),
            TenderAction::Close { id, json } => handle_tender_close(id, json),
            TenderAction::Rollback { id, version, json } => {
                handle_tender_rollback(id, version, json)
            }
        },
        Commands::Proposal(proposal) => match proposal.action {
            ProposalAction::Add {
                title,
                description,
                tender,
                organization,
                author,
                json,
            } => handle_proposal_add(title, description, tender, organization, author, json),
            ProposalAction::List { tender_id, json } => handle_proposal_list(tender_id, json),
            ProposalAction::My { username, json } => handle_proposal_my(username, json),
            ProposalAction::Status { id } => handle_proposal_status(id),
            ProposalAction::Edit {
                id,
                title,
                description,
                json,
            } => handle_proposal_edit(id, title, description, json),
            ProposalAction::Publish { id, json } => handle_proposal_publish(id, json),
            ProposalAction::Cancel { id, json } => handle_proposal_cancel(id, json),
            ProposalAction::Agree { id, json } => handle_proposal_agree(id, json),
            ProposalAction::Decline { id, json } => handle_proposal_decline(id, json),
            ProposalAction::Rollback { id, version, json } => {
                handle_proposal_rollback(id, version, json)
            }
        },
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
