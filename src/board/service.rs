use log::{error, info, warn};
use serde::Serialize;
use serde_json::{json, Value};
use std::sync::Arc;

use super::{BoardError, Notice};
use crate::forms::{
    validate_department, validate_key_result_patch, validate_new_okr, validate_okr_patch,
    validate_team,
};
use crate::hierarchy::HierarchyView;
use crate::models::{
    Department, KeyResultPatch, NewDepartment, NewOkr, NewTeam, Okr, OkrPatch, OkrRow,
    OkrStatus, Organization, Team,
};
use crate::store::{decode_rows, tables, StoreError, TableStore};

/// Result of a mutation: the id it touched and the affected collection read
/// back in full. The write has landed even when the read-back failed; that
/// failure shows up in `notices` with `records` left empty.
#[derive(Debug, Clone, Serialize)]
pub struct Refreshed<T> {
    pub id: String,
    pub records: Vec<T>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub notices: Vec<Notice>,
}

impl<T> Refreshed<T> {
    fn reloaded(id: String, records: Result<Vec<T>, BoardError>, failure: &str) -> Self {
        let (records, notice) = or_notice(records, failure);
        Self {
            id,
            records,
            notices: notice.into_iter().collect(),
        }
    }
}

/// Everything the board page shows. Each collection is fetched on its own;
/// a failed fetch leaves an empty list and a notice.
#[derive(Debug, Clone, Default)]
pub struct BoardSnapshot {
    pub organizations: Vec<Organization>,
    pub departments: Vec<Department>,
    pub teams: Vec<Team>,
    pub okrs: Vec<Okr>,
    pub notices: Vec<Notice>,
}

impl BoardSnapshot {
    pub fn hierarchy(&self) -> HierarchyView {
        HierarchyView::build(&self.organizations, &self.departments, &self.teams, &self.okrs)
    }
}

#[derive(Clone)]
pub struct BoardService {
    store: Arc<dyn TableStore>,
}

fn inserted_id(table: &str, rows: &[Value]) -> Result<String, StoreError> {
    rows.first()
        .and_then(|row| row.get("id"))
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or_else(|| StoreError::MissingRow(table.to_string()))
}

fn or_notice<T: Default>(result: Result<T, BoardError>, failure: &str) -> (T, Option<Notice>) {
    match result {
        Ok(records) => (records, None),
        Err(e) => {
            error!("{failure}: {e}");
            (T::default(), Some(Notice::error(failure)))
        }
    }
}

impl BoardService {
    pub fn new(store: Arc<dyn TableStore>) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &Arc<dyn TableStore> {
        &self.store
    }

    pub async fn list_organizations(&self) -> Result<Vec<Organization>, BoardError> {
        let rows = self.store.select(tables::ORGANIZATIONS, Some("name")).await?;
        Ok(decode_rows(tables::ORGANIZATIONS, rows)?)
    }

    pub async fn list_departments(&self) -> Result<Vec<Department>, BoardError> {
        let rows = self.store.select(tables::DEPARTMENTS, Some("name")).await?;
        Ok(decode_rows(tables::DEPARTMENTS, rows)?)
    }

    pub async fn list_teams(&self) -> Result<Vec<Team>, BoardError> {
        let rows = self.store.select(tables::TEAMS, Some("name")).await?;
        Ok(decode_rows(tables::TEAMS, rows)?)
    }

    pub async fn list_okrs(&self) -> Result<Vec<Okr>, BoardError> {
        let rows = self.store.select_okrs(None).await?;
        let rows: Vec<OkrRow> = decode_rows(tables::OKRS, rows)?;
        Ok(rows.into_iter().map(Okr::from).collect())
    }

    pub async fn get_okr(&self, id: &str) -> Result<Okr, BoardError> {
        let rows = self.store.select_okrs(Some(id)).await?;
        let rows: Vec<OkrRow> = decode_rows(tables::OKRS, rows)?;
        rows.into_iter()
            .map(Okr::from)
            .find(|okr| okr.id == id)
            .ok_or_else(|| BoardError::NotFound("OKR not found".to_string()))
    }

    /// Fetch all four collections concurrently.
    pub async fn snapshot(&self) -> BoardSnapshot {
        let (organizations, departments, teams, okrs) = tokio::join!(
            self.list_organizations(),
            self.list_departments(),
            self.list_teams(),
            self.list_okrs(),
        );

        let (organizations, n1) = or_notice(organizations, "Failed to load organizations");
        let (departments, n2) = or_notice(departments, "Failed to load departments");
        let (teams, n3) = or_notice(teams, "Failed to load teams");
        let (okrs, n4) = or_notice(okrs, "Failed to load OKRs");

        BoardSnapshot {
            organizations,
            departments,
            teams,
            okrs,
            notices: [n1, n2, n3, n4].into_iter().flatten().collect(),
        }
    }

    /// Like [`Self::snapshot`] but any failed fetch fails the whole view.
    pub async fn hierarchy(&self) -> Result<HierarchyView, BoardError> {
        let (organizations, departments, teams, okrs) = tokio::try_join!(
            self.list_organizations(),
            self.list_departments(),
            self.list_teams(),
            self.list_okrs(),
        )?;
        Ok(HierarchyView::build(&organizations, &departments, &teams, &okrs))
    }

    /// Insert the objective and then its key results. If the key results are
    /// rejected the objective row is removed again.
    pub async fn create_okr(&self, new_okr: NewOkr) -> Result<Refreshed<Okr>, BoardError> {
        validate_new_okr(&new_okr)?;

        let user_id = self.store.current_user_id().await?;

        let row = json!({
            "title": new_okr.title,
            "description": new_okr.description,
            "team_id": new_okr.team_id,
            "assigned_user_id": new_okr.assigned_user_id,
            "due_date": new_okr.due_date,
            "status": OkrStatus::Active,
            "created_by": user_id,
        });
        let inserted = self.store.insert(tables::OKRS, vec![row]).await?;
        let okr_id = inserted_id(tables::OKRS, &inserted)?;

        let key_results: Vec<Value> = new_okr
            .key_results
            .iter()
            .map(|kr| {
                json!({
                    "okr_id": okr_id,
                    "title": kr.title,
                    "target_value": kr.target_value,
                    "unit": kr.unit,
                    "current_value": 0,
                    "progress": 0,
                    "created_by": user_id,
                })
            })
            .collect();

        if let Err(e) = self.store.insert(tables::KEY_RESULTS, key_results).await {
            warn!("Key results for OKR {okr_id} rejected, removing objective: {e}");
            if let Err(cleanup) = self.store.delete(tables::OKRS, &okr_id).await {
                error!("Failed to remove partially created OKR {okr_id}: {cleanup}");
            }
            return Err(e.into());
        }

        info!("Created OKR: {} ({okr_id})", new_okr.title);
        Ok(Refreshed::reloaded(
            okr_id,
            self.list_okrs().await,
            "Failed to load OKRs",
        ))
    }

    pub async fn update_okr(&self, id: &str, patch: OkrPatch) -> Result<Refreshed<Okr>, BoardError> {
        validate_okr_patch(&patch)?;

        let patch = serde_json::to_value(&patch).map_err(|source| StoreError::Decode {
            table: tables::OKRS.to_string(),
            source,
        })?;
        self.store.update(tables::OKRS, id, patch).await?;

        info!("Updated OKR: {id}");
        Ok(Refreshed::reloaded(
            id.to_string(),
            self.list_okrs().await,
            "Failed to load OKRs",
        ))
    }

    pub async fn delete_okr(&self, id: &str) -> Result<Refreshed<Okr>, BoardError> {
        self.store.delete(tables::OKRS, id).await?;

        info!("Deleted OKR: {id}");
        Ok(Refreshed::reloaded(
            id.to_string(),
            self.list_okrs().await,
            "Failed to load OKRs",
        ))
    }

    pub async fn update_key_result(
        &self,
        id: &str,
        patch: KeyResultPatch,
    ) -> Result<Refreshed<Okr>, BoardError> {
        validate_key_result_patch(&patch)?;

        let patch = serde_json::to_value(&patch).map_err(|source| StoreError::Decode {
            table: tables::KEY_RESULTS.to_string(),
            source,
        })?;
        self.store.update(tables::KEY_RESULTS, id, patch).await?;

        info!("Updated key result: {id}");
        Ok(Refreshed::reloaded(
            id.to_string(),
            self.list_okrs().await,
            "Failed to load OKRs",
        ))
    }

    pub async fn create_department(
        &self,
        department: NewDepartment,
    ) -> Result<Refreshed<Department>, BoardError> {
        validate_department(&department)?;

        let user_id = self.store.current_user_id().await?;
        let row = json!({
            "name": department.name,
            "description": department.description,
            "organization_id": department.organization_id,
            "created_by": user_id,
        });
        let inserted = self.store.insert(tables::DEPARTMENTS, vec![row]).await?;
        let id = inserted_id(tables::DEPARTMENTS, &inserted)?;

        info!("Created department: {} ({id})", department.name);
        Ok(Refreshed::reloaded(
            id,
            self.list_departments().await,
            "Failed to load departments",
        ))
    }

    pub async fn create_team(&self, team: NewTeam) -> Result<Refreshed<Team>, BoardError> {
        validate_team(&team)?;

        let user_id = self.store.current_user_id().await?;
        let row = json!({
            "name": team.name,
            "description": team.description,
            "department_id": team.department_id,
            "created_by": user_id,
        });
        let inserted = self.store.insert(tables::TEAMS, vec![row]).await?;
        let id = inserted_id(tables::TEAMS, &inserted)?;

        info!("Created team: {} ({id})", team.name);
        Ok(Refreshed::reloaded(
            id,
            self.list_teams().await,
            "Failed to load teams",
        ))
    }
}
