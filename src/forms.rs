//! Form state behind the create/edit dialogs and the gates that keep invalid
//! submissions from ever reaching the store.

use chrono::NaiveDate;
use serde::Deserialize;

use crate::board::BoardError;
use crate::models::{
    KeyResultPatch, NewDepartment, NewKeyResult, NewOkr, NewTeam, Okr, OkrPatch, OkrStatus,
};

pub const UNITS: &[(&str, &str)] = &[
    ("percentage", "Percentage (%)"),
    ("number", "Number"),
    ("currency", "Currency ($)"),
    ("hours", "Hours"),
    ("days", "Days"),
    ("count", "Count"),
];

fn is_blank(s: &str) -> bool {
    s.trim().is_empty()
}

fn non_blank(s: &str) -> Option<String> {
    let trimmed = s.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

fn parse_due_date(raw: &str) -> Result<Option<NaiveDate>, BoardError> {
    let Some(raw) = non_blank(raw) else {
        return Ok(None);
    };
    NaiveDate::parse_from_str(&raw, "%Y-%m-%d")
        .map(Some)
        .map_err(|_| BoardError::Validation(format!("Invalid due date: {raw}")))
}

fn parse_target(raw: &str) -> Option<f64> {
    raw.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct KeyResultDraft {
    pub title: String,
    pub target: String,
    pub unit: String,
}

impl KeyResultDraft {
    /// Title present and target parses as a number.
    pub fn is_complete(&self) -> bool {
        !is_blank(&self.title) && parse_target(&self.target).is_some()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct OkrForm {
    pub title: String,
    pub description: String,
    pub team_id: String,
    pub due_date: String,
    pub key_results: Vec<KeyResultDraft>,
}

impl Default for OkrForm {
    fn default() -> Self {
        Self {
            title: String::new(),
            description: String::new(),
            team_id: String::new(),
            due_date: String::new(),
            key_results: vec![KeyResultDraft::default()],
        }
    }
}

impl OkrForm {
    /// Rebuild the form from url-encoded pairs. Every `kr_title` opens a new
    /// key result row; `kr_target` and `kr_unit` fill the latest one.
    pub fn from_pairs(pairs: Vec<(String, String)>) -> Self {
        let mut form = Self {
            key_results: Vec::new(),
            ..Self::default()
        };

        for (key, value) in pairs {
            match key.as_str() {
                "title" => form.title = value,
                "description" => form.description = value,
                "team_id" => form.team_id = value,
                "due_date" => form.due_date = value,
                "kr_title" => form.key_results.push(KeyResultDraft {
                    title: value,
                    ..Default::default()
                }),
                "kr_target" | "kr_unit" => {
                    if form.key_results.is_empty() {
                        form.key_results.push(KeyResultDraft::default());
                    }
                    if let Some(draft) = form.key_results.last_mut() {
                        if key == "kr_target" {
                            draft.target = value;
                        } else {
                            draft.unit = value;
                        }
                    }
                }
                _ => {}
            }
        }

        if form.key_results.is_empty() {
            form.key_results.push(KeyResultDraft::default());
        }
        form
    }

    /// Validated request with incomplete key result rows dropped.
    pub fn into_new_okr(self) -> Result<NewOkr, BoardError> {
        if is_blank(&self.title) {
            return Err(BoardError::Validation("Title is required".to_string()));
        }
        if is_blank(&self.team_id) {
            return Err(BoardError::Validation("Team is required".to_string()));
        }

        let key_results: Vec<NewKeyResult> = self
            .key_results
            .iter()
            .filter(|draft| draft.is_complete())
            .filter_map(|draft| {
                Some(NewKeyResult {
                    title: draft.title.trim().to_string(),
                    target_value: parse_target(&draft.target)?,
                    unit: non_blank(&draft.unit),
                })
            })
            .collect();

        if key_results.is_empty() {
            return Err(BoardError::Validation(
                "At least one key result needs a title and a numeric target".to_string(),
            ));
        }

        Ok(NewOkr {
            title: self.title.trim().to_string(),
            description: non_blank(&self.description),
            team_id: self.team_id.trim().to_string(),
            assigned_user_id: None,
            due_date: parse_due_date(&self.due_date)?,
            key_results,
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct EditOkrForm {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub due_date: String,
}

impl EditOkrForm {
    pub fn from_okr(okr: &Okr) -> Self {
        Self {
            title: okr.title.clone(),
            description: okr.description.clone().unwrap_or_default(),
            status: okr.status.as_str().to_string(),
            due_date: okr
                .due_date
                .map(|d| d.format("%Y-%m-%d").to_string())
                .unwrap_or_default(),
        }
    }

    pub fn is_valid(&self) -> bool {
        !is_blank(&self.title)
    }

    /// A blank due date leaves the stored one untouched.
    pub fn into_patch(self) -> Result<OkrPatch, BoardError> {
        if !self.is_valid() {
            return Err(BoardError::Validation("Title is required".to_string()));
        }

        let status = match non_blank(&self.status) {
            Some(raw) => Some(raw.parse::<OkrStatus>().map_err(BoardError::Validation)?),
            None => None,
        };

        Ok(OkrPatch {
            title: Some(self.title.trim().to_string()),
            description: Some(self.description.trim().to_string()),
            status,
            progress: None,
            due_date: parse_due_date(&self.due_date)?,
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct DepartmentForm {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub organization_id: String,
}

impl DepartmentForm {
    pub fn into_new_department(self) -> Result<NewDepartment, BoardError> {
        let department = NewDepartment {
            name: self.name.trim().to_string(),
            description: non_blank(&self.description),
            organization_id: self.organization_id.trim().to_string(),
        };
        validate_department(&department)?;
        Ok(department)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct TeamForm {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub department_id: String,
}

impl TeamForm {
    pub fn into_new_team(self) -> Result<NewTeam, BoardError> {
        let team = NewTeam {
            name: self.name.trim().to_string(),
            description: non_blank(&self.description),
            department_id: self.department_id.trim().to_string(),
        };
        validate_team(&team)?;
        Ok(team)
    }
}

pub fn validate_new_okr(okr: &NewOkr) -> Result<(), BoardError> {
    if is_blank(&okr.title) {
        return Err(BoardError::Validation("Title is required".to_string()));
    }
    if is_blank(&okr.team_id) {
        return Err(BoardError::Validation("Team is required".to_string()));
    }
    if okr.key_results.is_empty() {
        return Err(BoardError::Validation(
            "At least one key result needs a title and a numeric target".to_string(),
        ));
    }
    for kr in &okr.key_results {
        if is_blank(&kr.title) {
            return Err(BoardError::Validation("Key result title is required".to_string()));
        }
        if !kr.target_value.is_finite() {
            return Err(BoardError::Validation(format!(
                "Key result {} needs a numeric target",
                kr.title
            )));
        }
    }
    Ok(())
}

fn check_progress(progress: Option<f64>) -> Result<(), BoardError> {
    match progress {
        Some(p) if !(0.0..=100.0).contains(&p) => Err(BoardError::Validation(format!(
            "Progress must be between 0 and 100, got {p}"
        ))),
        _ => Ok(()),
    }
}

pub fn validate_okr_patch(patch: &OkrPatch) -> Result<(), BoardError> {
    if patch.is_empty() {
        return Err(BoardError::Validation("Nothing to update".to_string()));
    }
    if patch.title.as_deref().is_some_and(is_blank) {
        return Err(BoardError::Validation("Title is required".to_string()));
    }
    check_progress(patch.progress)
}

pub fn validate_key_result_patch(patch: &KeyResultPatch) -> Result<(), BoardError> {
    if patch.is_empty() {
        return Err(BoardError::Validation("Nothing to update".to_string()));
    }
    if patch.current_value.is_some_and(|v| !v.is_finite()) {
        return Err(BoardError::Validation("Current value must be a number".to_string()));
    }
    check_progress(patch.progress)
}

pub fn validate_department(department: &NewDepartment) -> Result<(), BoardError> {
    if is_blank(&department.name) {
        return Err(BoardError::Validation("Department name is required".to_string()));
    }
    if is_blank(&department.organization_id) {
        return Err(BoardError::Validation("Organization is required".to_string()));
    }
    Ok(())
}

pub fn validate_team(team: &NewTeam) -> Result<(), BoardError> {
    if is_blank(&team.name) {
        return Err(BoardError::Validation("Team name is required".to_string()));
    }
    if is_blank(&team.department_id) {
        return Err(BoardError::Validation("Department is required".to_string()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pairs(items: &[(&str, &str)]) -> Vec<(String, String)> {
        items
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_form_without_key_result_rows_keeps_one() {
        let form = OkrForm::from_pairs(pairs(&[("title", "Grow NPS"), ("team_id", "T1")]));
        assert_eq!(form.key_results, vec![KeyResultDraft::default()]);
        assert!(matches!(form.into_new_okr(), Err(BoardError::Validation(_))));
    }

    #[test]
    fn test_blank_title_is_rejected() {
        let form = OkrForm::from_pairs(pairs(&[
            ("title", "   "),
            ("team_id", "T1"),
            ("kr_title", "NPS ≥ 80"),
            ("kr_target", "80"),
        ]));
        assert!(form.key_results[0].is_complete());
        assert!(matches!(form.into_new_okr(), Err(BoardError::Validation(_))));
    }

    #[test]
    fn test_incomplete_rows_are_dropped() {
        let form = OkrForm::from_pairs(pairs(&[
            ("title", "Grow NPS"),
            ("team_id", "T1"),
            ("due_date", "2024-12-31"),
            ("kr_title", "NPS ≥ 80"),
            ("kr_target", "80"),
            ("kr_unit", "number"),
            ("kr_title", "No target"),
            ("kr_target", ""),
            ("kr_unit", ""),
            ("kr_title", ""),
            ("kr_target", "5"),
            ("kr_unit", "count"),
        ]));
        assert_eq!(form.key_results.len(), 3);

        let new_okr = form.into_new_okr().unwrap();
        assert_eq!(new_okr.key_results.len(), 1);
        assert_eq!(new_okr.key_results[0].target_value, 80.0);
        assert_eq!(new_okr.key_results[0].unit.as_deref(), Some("number"));
        assert_eq!(new_okr.due_date, NaiveDate::from_ymd_opt(2024, 12, 31));
        assert_eq!(new_okr.description, None);
    }

    #[test]
    fn test_non_numeric_target_is_incomplete() {
        let draft = KeyResultDraft {
            title: "Revenue".into(),
            target: "lots".into(),
            unit: String::new(),
        };
        assert!(!draft.is_complete());
    }

    #[test]
    fn test_bad_due_date() {
        let form = OkrForm::from_pairs(pairs(&[
            ("title", "Grow NPS"),
            ("team_id", "T1"),
            ("due_date", "next week"),
            ("kr_title", "NPS"),
            ("kr_target", "80"),
        ]));
        assert!(matches!(form.into_new_okr(), Err(BoardError::Validation(_))));
    }

    #[test]
    fn test_edit_form_patch() {
        let form = EditOkrForm {
            title: "Grow NPS".into(),
            description: String::new(),
            status: "completed".into(),
            due_date: String::new(),
        };
        let patch = form.into_patch().unwrap();
        assert_eq!(patch.status, Some(OkrStatus::Completed));
        assert_eq!(patch.due_date, None);

        let blank = EditOkrForm::default();
        assert!(!blank.is_valid());
        assert!(blank.into_patch().is_err());

        let unknown = EditOkrForm {
            title: "x".into(),
            status: "paused".into(),
            ..Default::default()
        };
        assert!(unknown.into_patch().is_err());
    }

    #[test]
    fn test_patch_gates() {
        assert!(validate_okr_patch(&OkrPatch::default()).is_err());
        assert!(validate_okr_patch(&OkrPatch {
            progress: Some(101.0),
            ..Default::default()
        })
        .is_err());
        assert!(validate_key_result_patch(&KeyResultPatch {
            current_value: Some(12.0),
            progress: Some(40.0),
        })
        .is_ok());
    }

    #[test]
    fn test_department_and_team_forms() {
        let department = DepartmentForm {
            name: " Sales ".into(),
            description: String::new(),
            organization_id: "o1".into(),
        }
        .into_new_department()
        .unwrap();
        assert_eq!(department.name, "Sales");

        assert!(DepartmentForm {
            name: "Sales".into(),
            ..Default::default()
        }
        .into_new_department()
        .is_err());

        assert!(TeamForm {
            name: String::new(),
            department_id: "d1".into(),
            ..Default::default()
        }
        .into_new_team()
        .is_err());
    }
}
