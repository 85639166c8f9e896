use axum::{
    extract::{Path, State},
    routing::{get, put},
    Json, Router,
};
use std::sync::Arc;

use super::{BoardError, Refreshed};
use crate::hierarchy::HierarchyView;
use crate::models::{
    Department, KeyResultPatch, NewDepartment, NewOkr, NewTeam, Okr, OkrPatch, Organization, Team,
};
use crate::progress::{assess, ObjectiveProgress};
use crate::web::AppState;

pub async fn list_okrs(State(state): State<Arc<AppState>>) -> Result<Json<Vec<Okr>>, BoardError> {
    Ok(Json(state.board.list_okrs().await?))
}

pub async fn get_okr(
    State(state): State<Arc<AppState>>,
    Path(okr_id): Path<String>,
) -> Result<Json<Okr>, BoardError> {
    Ok(Json(state.board.get_okr(&okr_id).await?))
}

pub async fn get_okr_progress(
    State(state): State<Arc<AppState>>,
    Path(okr_id): Path<String>,
) -> Result<Json<ObjectiveProgress>, BoardError> {
    let okr = state.board.get_okr(&okr_id).await?;
    Ok(Json(assess(&okr)))
}

pub async fn create_okr(
    State(state): State<Arc<AppState>>,
    Json(req): Json<NewOkr>,
) -> Result<Json<Refreshed<Okr>>, BoardError> {
    Ok(Json(state.board.create_okr(req).await?))
}

pub async fn update_okr(
    State(state): State<Arc<AppState>>,
    Path(okr_id): Path<String>,
    Json(req): Json<OkrPatch>,
) -> Result<Json<Refreshed<Okr>>, BoardError> {
    Ok(Json(state.board.update_okr(&okr_id, req).await?))
}

pub async fn delete_okr(
    State(state): State<Arc<AppState>>,
    Path(okr_id): Path<String>,
) -> Result<Json<Refreshed<Okr>>, BoardError> {
    Ok(Json(state.board.delete_okr(&okr_id).await?))
}

pub async fn update_key_result(
    State(state): State<Arc<AppState>>,
    Path(key_result_id): Path<String>,
    Json(req): Json<KeyResultPatch>,
) -> Result<Json<Refreshed<Okr>>, BoardError> {
    Ok(Json(state.board.update_key_result(&key_result_id, req).await?))
}

pub async fn list_organizations(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<Organization>>, BoardError> {
    Ok(Json(state.board.list_organizations().await?))
}

pub async fn list_departments(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<Department>>, BoardError> {
    Ok(Json(state.board.list_departments().await?))
}

pub async fn create_department(
    State(state): State<Arc<AppState>>,
    Json(req): Json<NewDepartment>,
) -> Result<Json<Refreshed<Department>>, BoardError> {
    Ok(Json(state.board.create_department(req).await?))
}

pub async fn list_teams(State(state): State<Arc<AppState>>) -> Result<Json<Vec<Team>>, BoardError> {
    Ok(Json(state.board.list_teams().await?))
}

pub async fn create_team(
    State(state): State<Arc<AppState>>,
    Json(req): Json<NewTeam>,
) -> Result<Json<Refreshed<Team>>, BoardError> {
    Ok(Json(state.board.create_team(req).await?))
}

pub async fn get_hierarchy(
    State(state): State<Arc<AppState>>,
) -> Result<Json<HierarchyView>, BoardError> {
    Ok(Json(state.board.hierarchy().await?))
}

pub fn configure_board_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/okrs", get(list_okrs).post(create_okr))
        .route("/api/okrs/:id", get(get_okr).put(update_okr).delete(delete_okr))
        .route("/api/okrs/:id/progress", get(get_okr_progress))
        .route("/api/key-results/:id", put(update_key_result))
        .route("/api/organizations", get(list_organizations))
        .route("/api/departments", get(list_departments).post(create_department))
        .route("/api/teams", get(list_teams).post(create_team))
        .route("/api/hierarchy", get(get_hierarchy))
}
