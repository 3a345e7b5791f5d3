use axum::extract::{Path, State};
use axum::Json;
use serde::Deserialize;
use uuid::Uuid;

use crate::entity::{Employee, Organization, OrganizationResponsible};
use crate::error::BidstoreError;
use crate::http::AppState;
use crate::lifecycle::{RegisterEmployee, RegisterOrganization};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssignBody {
    user_id: Uuid,
}

pub async fn create_organization(
    State(state): State<AppState>,
    Json(cmd): Json<RegisterOrganization>,
) -> Result<Json<Organization>, BidstoreError> {
    state.directory.register_organization(cmd).map(Json)
}

pub async fn create_employee(
    State(state): State<AppState>,
    Json(cmd): Json<RegisterEmployee>,
) -> Result<Json<Employee>, BidstoreError> {
    state.directory.register_employee(cmd).map(Json)
}

pub async fn assign_responsible(
    State(state): State<AppState>,
    Path(organization_id): Path<Uuid>,
    Json(body): Json<AssignBody>,
) -> Result<Json<OrganizationResponsible>, BidstoreError> {
    state
        .directory
        .assign_responsible(organization_id, body.user_id)
        .map(Json)
}
