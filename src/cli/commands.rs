use clap::{Args, Parser, Subcommand};
use uuid::Uuid;

#[derive(Parser, Debug)]
#[command(name = "bidstore")]
#[command(version, about = "Tender and bid lifecycle service")]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Initialize a bidstore data directory in the current directory
    Init,

    /// Run the HTTP API server
    Serve {
        /// Listen address
        #[arg(long, default_value = "127.0.0.1:8080")]
        addr: String,
    },

    /// Manage organizations
    Org(OrgCommand),

    /// Manage employees
    Employee(EmployeeCommand),

    /// Manage tenders
    Tender(TenderCommand),

    /// Manage proposals
    Proposal(ProposalCommand),
}

#[derive(Args, Debug)]
pub struct OrgCommand {
    #[command(subcommand)]
    pub action: OrgAction,
}

#[derive(Subcommand, Debug)]
pub enum OrgAction {
    /// Register a new organization
    Add {
        /// Organization name
        name: String,

        #[arg(long, default_value = "")]
        description: String,

        /// Organization type (IE, LLC, JSC)
        #[arg(long, default_value = "LLC")]
        org_type: String,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Make an employee responsible for an organization
    Assign {
        /// Organization ID
        organization_id: Uuid,

        /// Employee ID
        user_id: Uuid,
    },
}

#[derive(Args, Debug)]
pub struct EmployeeCommand {
    #[command(subcommand)]
    pub action: EmployeeAction,
}

#[derive(Subcommand, Debug)]
pub enum EmployeeAction {
    /// Register a new employee
    Add {
        /// Unique username
        username: String,

        #[arg(long, default_value = "")]
        first_name: String,

        #[arg(long, default_value = "")]
        last_name: String,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Args, Debug)]
pub struct TenderCommand {
    #[command(subcommand)]
    pub action: TenderAction,
}

#[derive(Subcommand, Debug)]
pub enum TenderAction {
    /// Open a new tender (starts in CREATED)
    Add {
        /// Tender title
        title: String,

        #[arg(long, default_value = "")]
        description: String,

        /// Owning organization ID
        #[arg(long)]
        organization: Uuid,

        /// Service type category
        #[arg(long)]
        service_type: String,

        /// Username of the responsible employee creating the tender
        #[arg(long)]
        creator: String,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// List published tenders
    List {
        /// Restrict to one service type
        #[arg(long)]
        service_type: Option<String>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// List every tender of organizations the employee is responsible for
    My {
        /// Employee username
        username: String,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Print a tender's status
    Status {
        /// Tender ID
        id: Uuid,
    },

    /// Replace a tender's title/description (bumps the version)
    Edit {
        /// Tender ID
        id: Uuid,

        #[arg(long)]
        title: String,

        #[arg(long, default_value = "")]
        description: String,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Publish a tender (CREATED -> PUBLISHED)
    Publish {
        /// Tender ID
        id: Uuid,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Close a tender (PUBLISHED -> CLOSED)
    Close {
        /// Tender ID
        id: Uuid,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Restore the content of a recorded version as a new version
    #[command(disable_version_flag = true)]
    Rollback {
        /// Tender ID
        id: Uuid,

        /// Version to restore
        version: u32,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Args, Debug)]
pub struct ProposalCommand {
    #[command(subcommand)]
    pub action: ProposalAction,
}

#[derive(Subcommand, Debug)]
pub enum ProposalAction {
    /// Submit a bid against a tender (starts in CREATED)
    Add {
        /// Proposal title
        title: String,

        #[arg(long, default_value = "")]
        description: String,

        /// Tender being bid on
        #[arg(long)]
        tender: Uuid,

        /// Bidding organization ID
        #[arg(long)]
        organization: Uuid,

        /// Employee ID of the author
        #[arg(long)]
        author: Uuid,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// List published proposals for a tender
    List {
        /// Tender ID
        tender_id: Uuid,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// List every proposal authored by an employee
    My {
        /// Employee username
        username: String,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Print a proposal's status
    Status {
        /// Proposal ID
        id: Uuid,
    },

    /// Replace a proposal's title/description (bumps the version)
    Edit {
        /// Proposal ID
        id: Uuid,

        #[arg(long)]
        title: String,

        #[arg(long, default_value = "")]
        description: String,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Publish a proposal (CREATED -> PUBLISHED)
    Publish {
        /// Proposal ID
        id: Uuid,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Cancel a published proposal
    Cancel {
        /// Proposal ID
        id: Uuid,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Accept a published proposal
    Agree {
        /// Proposal ID
        id: Uuid,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Reject a published proposal
    Decline {
        /// Proposal ID
        id: Uuid,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Restore the content of a recorded version as a new version
    #[command(disable_version_flag = true)]
    Rollback {
        /// Proposal ID
        id: Uuid,

        /// Version to restore
        version: u32,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}
