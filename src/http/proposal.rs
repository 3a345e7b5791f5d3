use axum::extract::{Path, Query, State};
use axum::Json;
use serde::Deserialize;
use uuid::Uuid;

use crate::entity::Proposal;
use crate::error::BidstoreError;
use crate::http::AppState;
use crate::lifecycle::{CreateProposal, EditProposal};

#[derive(Debug, Deserialize)]
pub struct MyQuery {
    username: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusQuery {
    proposal_id: Uuid,
}

pub async fn create(
    State(state): State<AppState>,
    Json(cmd): Json<CreateProposal>,
) -> Result<Json<Proposal>, BidstoreError> {
    state.proposals.create(cmd).map(Json)
}

pub async fn my(
    State(state): State<AppState>,
    Query(query): Query<MyQuery>,
) -> Result<Json<Vec<Proposal>>, BidstoreError> {
    state.proposals.by_username(&query.username).map(Json)
}

pub async fn status(
    State(state): State<AppState>,
    Query(query): Query<StatusQuery>,
) -> Result<String, BidstoreError> {
    state
        .proposals
        .status(query.proposal_id)
        .map(|status| status.to_string())
}

pub async fn by_tender(
    State(state): State<AppState>,
    Path(tender_id): Path<Uuid>,
) -> Result<Json<Vec<Proposal>>, BidstoreError> {
    state.proposals.by_tender(tender_id).map(Json)
}

pub async fn edit(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(cmd): Json<EditProposal>,
) -> Result<Json<Proposal>, BidstoreError> {
    state.proposals.edit(id, cmd).map(Json)
}

pub async fn publish(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Proposal>, BidstoreError> {
    state.proposals.publish(id).map(Json)
}

pub async fn cancel(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Proposal>, BidstoreError> {
    state.proposals.cancel(id).map(Json)
}

pub async fn agree(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Proposal>, BidstoreError> {
    state.proposals.agree(id).map(Json)
}

pub async fn decline(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Proposal>, BidstoreError> {
    state.proposals.decline(id).map(Json)
}

pub async fn rollback(
    State(state): State<AppState>,
    Path((id, version)): Path<(Uuid, u32)>,
) -> Result<Json<Proposal>, BidstoreError> {
    state.proposals.rollback(id, version).map(Json)
}
