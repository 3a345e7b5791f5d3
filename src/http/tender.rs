use axum::extract::{Path, Query, State};
use axum::Json;
use serde::Deserialize;
use uuid::Uuid;

use crate::entity::Tender;
use crate::error::BidstoreError;
use crate::http::AppState;
use crate::lifecycle::{CreateTender, EditTender};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListQuery {
    service_type: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct MyQuery {
    username: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusQuery {
    tender_id: Uuid,
}

pub async fn list(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Result<Json<Vec<Tender>>, BidstoreError> {
    state.tenders.tenders(query.service_type.as_deref()).map(Json)
}

pub async fn create(
    State(state): State<AppState>,
    Json(cmd): Json<CreateTender>,
) -> Result<Json<Tender>, BidstoreError> {
    state.tenders.create(cmd).map(Json)
}

pub async fn my(
    State(state): State<AppState>,
    Query(query): Query<MyQuery>,
) -> Result<Json<Vec<Tender>>, BidstoreError> {
    state.tenders.my_tenders(&query.username).map(Json)
}

pub async fn status(
    State(state): State<AppState>,
    Query(query): Query<StatusQuery>,
) -> Result<String, BidstoreError> {
    state
        .tenders
        .status(query.tender_id)
        .map(|status| status.to_string())
}

pub async fn edit(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(cmd): Json<EditTender>,
) -> Result<Json<Tender>, BidstoreError> {
    state.tenders.edit(id, cmd).map(Json)
}

pub async fn publish(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Tender>, BidstoreError> {
    state.tenders.publish(id).map(Json)
}

pub async fn close(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Tender>, BidstoreError> {
    state.tenders.close(id).map(Json)
}

pub async fn rollback(
    State(state): State<AppState>,
    Path((id, version)): Path<(Uuid, u32)>,
) -> Result<Json<Tender>, BidstoreError> {
    state.tenders.rollback(id, version).map(Json)
}
