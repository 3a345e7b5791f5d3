mod commands;
mod handlers;

pub use commands::{
    Cli, Commands, EmployeeAction, EmployeeCommand, OrgAction, OrgCommand, ProposalAction,
    ProposalCommand, TenderAction, TenderCommand,
};
pub use handlers::{
    handle_employee_add, handle_init, handle_org_add, handle_org_assign, handle_proposal_add,
    handle_proposal_agree, handle_proposal_cancel, handle_proposal_decline, handle_proposal_edit,
    handle_proposal_list, handle_proposal_my, handle_proposal_publish, handle_proposal_rollback,
    handle_proposal_status, handle_serve, handle_tender_add, handle_tender_close,
    handle_tender_edit, handle_tender_list, handle_tender_my, handle_tender_publish,
    handle_tender_rollback, handle_tender_status,
};
