//! Board records as they cross the store boundary.
//!
//! Rows arrive as loose JSON from the remote tables. The `*Row` types describe
//! what the store may send (nullable columns, optional embeds) and convert into
//! the normalized records the rest of the crate works with. Anything that does
//! not fit these shapes is rejected when decoded.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

pub const UNASSIGNED: &str = "Unassigned";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Organization {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Department {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub organization_id: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Team {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub department_id: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OkrStatus {
    #[default]
    Draft,
    Active,
    Completed,
    Cancelled,
}

impl OkrStatus {
    pub const ALL: [OkrStatus; 4] = [
        OkrStatus::Draft,
        OkrStatus::Active,
        OkrStatus::Completed,
        OkrStatus::Cancelled,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::Active => "active",
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Draft => "Draft",
            Self::Active => "Active",
            Self::Completed => "Completed",
            Self::Cancelled => "Cancelled",
        }
    }

    /// Badge colour for the status pill.
    pub fn css_class(&self) -> &'static str {
        match self {
            Self::Active => "status-green",
            Self::Completed => "status-blue",
            Self::Cancelled => "status-red",
            Self::Draft => "status-gray",
        }
    }
}

impl std::str::FromStr for OkrStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "draft" => Ok(Self::Draft),
            "active" => Ok(Self::Active),
            "completed" => Ok(Self::Completed),
            "cancelled" => Ok(Self::Cancelled),
            other => Err(format!("Unknown OKR status: {other}")),
        }
    }
}

impl std::fmt::Display for OkrStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeyResult {
    pub id: String,
    pub title: String,
    pub progress: f64,
    pub target_value: f64,
    pub current_value: f64,
    pub unit: Option<String>,
    pub created_by: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Okr {
    pub id: String,
    pub title: String,
    pub description: Option<String>,
    pub progress: f64,
    pub key_results: Vec<KeyResult>,
    pub assigned_user_id: Option<String>,
    /// Display name joined from the assignee's profile.
    pub assignee: String,
    pub due_date: Option<NaiveDate>,
    pub status: OkrStatus,
    pub team_id: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct KeyResultRow {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub progress: Option<f64>,
    #[serde(default)]
    pub target_value: Option<f64>,
    #[serde(default)]
    pub current_value: Option<f64>,
    #[serde(default)]
    pub unit: Option<String>,
    #[serde(default)]
    pub created_by: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ProfileRef {
    #[serde(default)]
    pub full_name: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OkrRow {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub progress: Option<f64>,
    #[serde(default)]
    pub status: Option<OkrStatus>,
    #[serde(default)]
    pub due_date: Option<NaiveDate>,
    pub team_id: String,
    #[serde(default)]
    pub assigned_user_id: Option<String>,
    #[serde(default)]
    pub key_results: Option<Vec<KeyResultRow>>,
    #[serde(default)]
    pub profiles: Option<ProfileRef>,
}

impl From<KeyResultRow> for KeyResult {
    fn from(row: KeyResultRow) -> Self {
        Self {
            id: row.id,
            title: row.title,
            progress: row.progress.unwrap_or(0.0),
            target_value: row.target_value.unwrap_or(0.0),
            current_value: row.current_value.unwrap_or(0.0),
            unit: row.unit,
            created_by: row.created_by,
        }
    }
}

impl From<OkrRow> for Okr {
    fn from(row: OkrRow) -> Self {
        let assignee = row
            .profiles
            .and_then(|p| p.full_name)
            .filter(|name| !name.is_empty())
            .unwrap_or_else(|| UNASSIGNED.to_string());

        Self {
            id: row.id,
            title: row.title,
            description: row.description,
            progress: row.progress.unwrap_or(0.0),
            key_results: row
                .key_results
                .unwrap_or_default()
                .into_iter()
                .map(KeyResult::from)
                .collect(),
            assigned_user_id: row.assigned_user_id,
            assignee,
            due_date: row.due_date,
            status: row.status.unwrap_or_default(),
            team_id: row.team_id,
        }
    }
}

/// Key result supplied when an OKR is created. Current value and progress
/// always start at zero.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewKeyResult {
    pub title: String,
    pub target_value: f64,
    #[serde(default)]
    pub unit: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewOkr {
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    pub team_id: String,
    #[serde(default)]
    pub assigned_user_id: Option<String>,
    #[serde(default)]
    pub due_date: Option<NaiveDate>,
    #[serde(default)]
    pub key_results: Vec<NewKeyResult>,
}

/// Partial update of an objective. Absent fields are left untouched by the
/// store.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OkrPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<OkrStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub progress: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub due_date: Option<NaiveDate>,
}

impl OkrPatch {
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.description.is_none()
            && self.status.is_none()
            && self.progress.is_none()
            && self.due_date.is_none()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct KeyResultPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_value: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub progress: Option<f64>,
}

impl KeyResultPatch {
    pub fn is_empty(&self) -> bool {
        self.current_value.is_none() && self.progress.is_none()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewDepartment {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub organization_id: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewTeam {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub department_id: String,
}
