use axum::{
    extract::{Path, State},
    response::{Html, IntoResponse, Response},
    routing::{get, post},
    Form, Router,
};
use std::sync::Arc;

use super::{BoardSnapshot, Notice, NoticeKind};
use crate::forms::{DepartmentForm, EditOkrForm, OkrForm, TeamForm, UNITS};
use crate::hierarchy::{team_okr_count, HierarchyView};
use crate::models::{Department, KeyResult, Okr, OkrStatus, Organization, Team};
use crate::progress::{bar_width, classify};
use crate::web::AppState;

/// Client event fired only after a create went through. The create form
/// clears itself on it and keeps its input otherwise.
pub const OKR_CREATED_EVENT: &str = "okr-created";

fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#x27;")
}

fn format_number(value: f64) -> String {
    if value.fract() == 0.0 && value.is_finite() {
        format!("{value:.0}")
    } else {
        format!("{value}")
    }
}

fn plural(count: usize, singular: &str, plural: &str) -> String {
    if count == 1 {
        format!("{count} {singular}")
    } else {
        format!("{count} {plural}")
    }
}

fn render_progress_bar(progress: f64, extra_class: &str) -> String {
    let health = classify(progress);
    let width = bar_width(progress);
    let class = health.css_class();
    let label = health.as_str();
    format!(
        r##"<div class="progress-bar {extra_class}" data-health="{label}">
            <div class="progress-fill {class}" style="width: {width}%;"></div>
        </div>"##
    )
}

pub fn render_toast(notice: &Notice) -> String {
    let class = match notice.kind {
        NoticeKind::Success => "toast-success",
        NoticeKind::Error => "toast-error",
    };
    let title = html_escape(&notice.title);
    let message = html_escape(&notice.message);
    format!(
        r##"<div hx-swap-oob="afterbegin:#toasts"><div class="toast {class}" role="status">
            <strong>{title}</strong> <span>{message}</span>
            <button type="button" class="toast-dismiss" onclick="this.parentElement.remove()">×</button>
        </div></div>"##
    )
}

fn render_key_result(kr: &KeyResult) -> String {
    let title = html_escape(&kr.title);
    let current = format_number(kr.current_value);
    let target = format_number(kr.target_value);
    let unit = html_escape(kr.unit.as_deref().unwrap_or(""));
    let bar = render_progress_bar(kr.progress, "progress-thin");
    format!(
        r##"<div class="key-result" data-id="{id}">
            <div class="key-result-header">
                <span class="key-result-title">{title}</span>
                <span class="key-result-values">{current}/{target} {unit}</span>
            </div>
            {bar}
        </div>"##,
        id = html_escape(&kr.id),
    )
}

fn render_status_options(selected: OkrStatus) -> String {
    OkrStatus::ALL
        .iter()
        .map(|status| {
            let marker = if *status == selected { " selected" } else { "" };
            format!(
                r##"<option value="{}"{marker}>{}</option>"##,
                status.as_str(),
                status.label()
            )
        })
        .collect()
}

fn render_edit_form(okr: &Okr) -> String {
    let form = EditOkrForm::from_okr(okr);
    let id = html_escape(&okr.id);
    let title = html_escape(&form.title);
    let description = html_escape(&form.description);
    let due_date = html_escape(&form.due_date);
    let options = render_status_options(okr.status);
    format!(
        r##"<details class="okr-edit">
            <summary>Edit OKR</summary>
            <form hx-post="/ui/okrs/{id}/edit" hx-target="#okr-list" hx-swap="innerHTML">
                <label>Title * <input name="title" value="{title}" required></label>
                <label>Description <textarea name="description" rows="3">{description}</textarea></label>
                <label>Status <select name="status">{options}</select></label>
                <label>Due Date <input type="date" name="due_date" value="{due_date}"></label>
                <button type="submit">Update OKR</button>
            </form>
        </details>"##
    )
}

pub fn render_okr_card(okr: &Okr) -> String {
    let id = html_escape(&okr.id);
    let title = html_escape(&okr.title);
    let status_class = okr.status.css_class();
    let status_label = okr.status.label();
    let description = okr
        .description
        .as_deref()
        .filter(|d| !d.is_empty())
        .map(|d| format!(r##"<p class="okr-description">{}</p>"##, html_escape(d)))
        .unwrap_or_default();
    let assignee = html_escape(&okr.assignee);
    let due = okr
        .due_date
        .map(|d| format!(r##"<span class="okr-due">{}</span>"##, d.format("%b %-d, %Y")))
        .unwrap_or_default();
    let progress = format_number(okr.progress);
    let bar = render_progress_bar(okr.progress, "");
    let key_results = if okr.key_results.is_empty() {
        String::new()
    } else {
        let items: String = okr.key_results.iter().map(render_key_result).collect();
        format!(r##"<div class="key-results"><h4>Key Results</h4>{items}</div>"##)
    };
    let edit_form = render_edit_form(okr);

    format!(
        r##"<div class="okr-card" data-id="{id}">
            <div class="okr-header">
                <h3 class="okr-title">{title}</h3>
                <span class="okr-status {status_class}">{status_label}</span>
            </div>
            {description}
            <div class="okr-meta">
                <span class="okr-assignee">{assignee}</span>
                {due}
            </div>
            <div class="okr-progress">
                <div class="okr-progress-label"><span>Overall Progress</span><span>{progress}%</span></div>
                {bar}
            </div>
            {key_results}
            <div class="okr-actions">
                {edit_form}
                <button class="okr-delete" hx-post="/ui/okrs/{id}/delete" hx-target="#okr-list" hx-swap="innerHTML"
                    hx-confirm="Are you sure? This will permanently delete the OKR and all associated key results.">Delete OKR</button>
            </div>
        </div>"##
    )
}

pub fn render_okr_list(okrs: &[Okr]) -> String {
    if okrs.is_empty() {
        return r##"<div class="empty-state">
            <h3>No OKRs yet</h3>
            <p>Get started by creating your first objective and key results.</p>
        </div>"##
            .to_string();
    }
    okrs.iter().map(render_okr_card).collect()
}

pub fn render_key_result_row() -> String {
    let units: String = UNITS
        .iter()
        .map(|(value, label)| format!(r##"<option value="{value}">{label}</option>"##))
        .collect();
    format!(
        r##"<div class="kr-row">
            <input name="kr_title" placeholder="Key result">
            <input name="kr_target" type="number" step="any" placeholder="Target">
            <select name="kr_unit"><option value="">Select unit</option>{units}</select>
            <button type="button" onclick="if (document.querySelectorAll('#kr-rows .kr-row').length > 1) this.closest('.kr-row').remove()">Remove</button>
        </div>"##
    )
}

fn render_options<'a>(items: impl Iterator<Item = (&'a str, &'a str)>) -> String {
    items
        .map(|(id, name)| {
            format!(
                r##"<option value="{}">{}</option>"##,
                html_escape(id),
                html_escape(name)
            )
        })
        .collect()
}

pub fn render_create_okr_form(teams: &[Team]) -> String {
    let team_options = render_options(teams.iter().map(|t| (t.id.as_str(), t.name.as_str())));
    let first_row = render_key_result_row().replacen(
        r##"<input name="kr_title" placeholder="Key result">"##,
        r##"<input name="kr_title" placeholder="Key result" required>"##,
        1,
    );
    let event = OKR_CREATED_EVENT;
    format!(
        r##"<form id="create-okr" class="okr-form" hx-post="/ui/okrs" hx-target="#okr-list" hx-swap="innerHTML"
            hx-on:{event}="this.reset()">
            <h3>Create New OKR</h3>
            <label>Objective Title * <input name="title" required></label>
            <label>Description <textarea name="description" rows="3"></textarea></label>
            <label>Team * <select name="team_id" required><option value="">Select team</option>{team_options}</select></label>
            <label>Due Date <input type="date" name="due_date"></label>
            <div id="kr-rows">{first_row}</div>
            <button type="button" hx-get="/ui/okrs/key-result-row" hx-target="#kr-rows" hx-swap="beforeend">Add Key Result</button>
            <button type="submit">Create OKR</button>
        </form>"##
    )
}

fn render_department_form(organizations: &[Organization]) -> String {
    let options = render_options(organizations.iter().map(|o| (o.id.as_str(), o.name.as_str())));
    format!(
        r##"<form class="hierarchy-form" hx-post="/ui/departments" hx-target="#hierarchy" hx-swap="innerHTML">
            <h4>Create New Department</h4>
            <input name="name" placeholder="Department name" required>
            <textarea name="description" placeholder="Description"></textarea>
            <select name="organization_id" required><option value="">Select organization</option>{options}</select>
            <button type="submit">Create Department</button>
        </form>"##
    )
}

fn render_team_form(departments: &[Department]) -> String {
    let options = render_options(departments.iter().map(|d| (d.id.as_str(), d.name.as_str())));
    format!(
        r##"<form class="hierarchy-form" hx-post="/ui/teams" hx-target="#hierarchy" hx-swap="innerHTML">
            <h4>Create New Team</h4>
            <input name="name" placeholder="Team name" required>
            <textarea name="description" placeholder="Description"></textarea>
            <select name="department_id" required><option value="">Select department</option>{options}</select>
            <button type="submit">Create Team</button>
        </form>"##
    )
}

pub fn render_hierarchy(view: &HierarchyView, okrs: &[Okr]) -> String {
    let tree: String = view
        .organizations
        .iter()
        .map(|org_node| {
            let departments: String = org_node
                .departments
                .iter()
                .map(|dept_node| {
                    let teams: String = dept_node
                        .teams
                        .iter()
                        .map(|team| {
                            let okr_badge = plural(team_okr_count(&team.id, okrs), "OKR", "OKRs");
                            format!(
                                r##"<li class="tree-team" data-id="{}"><span>{}</span> <span class="badge">{okr_badge}</span></li>"##,
                                html_escape(&team.id),
                                html_escape(&team.name)
                            )
                        })
                        .collect();
                    let badge = plural(dept_node.team_count, "Team", "Teams");
                    format!(
                        r##"<li class="tree-department" data-id="{}">
                            <span>{}</span> <span class="badge badge-outline">{badge}</span>
                            <ul>{teams}</ul>
                        </li>"##,
                        html_escape(&dept_node.department.id),
                        html_escape(&dept_node.department.name)
                    )
                })
                .collect();
            let badge = plural(org_node.department_count, "Department", "Departments");
            format!(
                r##"<li class="tree-organization" data-id="{}">
                    <span>{}</span> <span class="badge badge-secondary">{badge}</span>
                    <ul>{departments}</ul>
                </li>"##,
                html_escape(&org_node.organization.id),
                html_escape(&org_node.organization.name)
            )
        })
        .collect();

    let stats = &view.stats;
    format!(
        r##"<div class="hierarchy">
            <h3>Organization</h3>
            <ul class="tree">{tree}</ul>
            <div class="quick-stats">
                <h4>Quick Stats</h4>
                <div><span>Total Teams:</span> <strong>{teams}</strong></div>
                <div><span>Active OKRs:</span> <strong>{active}</strong></div>
                <div><span>Total OKRs:</span> <strong>{total}</strong></div>
            </div>
        </div>"##,
        teams = stats.total_teams,
        active = stats.active_okrs,
        total = stats.total_okrs,
    )
}

fn render_hierarchy_panel(snapshot: &BoardSnapshot) -> String {
    let view = snapshot.hierarchy();
    format!(
        "{}{}{}",
        render_hierarchy(&view, &snapshot.okrs),
        render_department_form(&snapshot.organizations),
        render_team_form(&snapshot.departments)
    )
}

pub fn render_page(snapshot: &BoardSnapshot) -> String {
    let toasts: String = snapshot.notices.iter().map(render_toast).collect();
    let create_form = render_create_okr_form(&snapshot.teams);
    let okr_list = render_okr_list(&snapshot.okrs);
    let hierarchy = render_hierarchy_panel(snapshot);

    format!(
        r##"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="utf-8">
    <title>OKR Board</title>
    <script src="https://unpkg.com/htmx.org@1.9.12"></script>
    <style>
        .progress-bar {{ background: #e5e7eb; border-radius: 9999px; height: 8px; overflow: hidden; }}
        .progress-thin {{ height: 6px; }}
        .progress-fill {{ height: 100%; }}
        .progress-green {{ background: #22c55e; }}
        .progress-yellow {{ background: #eab308; }}
        .progress-red {{ background: #ef4444; }}
        .status-green {{ background: #dcfce7; color: #166534; }}
        .status-blue {{ background: #dbeafe; color: #1e40af; }}
        .status-red {{ background: #fee2e2; color: #991b1b; }}
        .status-gray {{ background: #f3f4f6; color: #1f2937; }}
        .toast-error {{ border-left: 4px solid #ef4444; }}
        .toast-success {{ border-left: 4px solid #22c55e; }}
    </style>
</head>
<body>
    <div id="toasts">{toasts}</div>
    <main class="board">
        <section class="okrs">
            <h2>Your OKRs</h2>
            <p>Track and manage your team's objectives and key results</p>
            {create_form}
            <div id="okr-list">{okr_list}</div>
        </section>
        <aside id="hierarchy">{hierarchy}</aside>
    </main>
</body>
</html>"##
    )
}

/// Fresh OKR list, falling back to an empty list when the read fails.
async fn okr_list_html(state: &AppState) -> (String, Option<Notice>) {
    match state.board.list_okrs().await {
        Ok(okrs) => (render_okr_list(&okrs), None),
        Err(e) => {
            log::error!("Error fetching OKRs: {e}");
            (render_okr_list(&[]), Some(Notice::error("Failed to load OKRs")))
        }
    }
}

fn with_toasts(body: String, notices: impl IntoIterator<Item = Notice>) -> Html<String> {
    let toasts: String = notices.into_iter().map(|n| render_toast(&n)).collect();
    Html(format!("{body}{toasts}"))
}

pub async fn index(State(state): State<Arc<AppState>>) -> Html<String> {
    let snapshot = state.board.snapshot().await;
    Html(render_page(&snapshot))
}

pub async fn okrs_fragment(State(state): State<Arc<AppState>>) -> Html<String> {
    let (list, notice) = okr_list_html(&state).await;
    with_toasts(list, notice)
}

pub async fn key_result_row() -> Html<String> {
    Html(render_key_result_row())
}

pub async fn hierarchy_fragment(State(state): State<Arc<AppState>>) -> Html<String> {
    let snapshot = state.board.snapshot().await;
    let notices = snapshot.notices.clone();
    with_toasts(render_hierarchy_panel(&snapshot), notices)
}

pub async fn create_okr(
    State(state): State<Arc<AppState>>,
    Form(pairs): Form<Vec<(String, String)>>,
) -> Response {
    let form = OkrForm::from_pairs(pairs);
    let result = match form.into_new_okr() {
        Ok(new_okr) => state.board.create_okr(new_okr).await,
        Err(e) => Err(e),
    };

    match result {
        Ok(created) => {
            let body = with_toasts(
                render_okr_list(&created.records),
                std::iter::once(Notice::success("OKR created successfully")).chain(created.notices),
            );
            ([("HX-Trigger", OKR_CREATED_EVENT)], body).into_response()
        }
        Err(e) => {
            log::error!("Error creating OKR: {e}");
            let (list, notice) = okr_list_html(&state).await;
            with_toasts(
                list,
                std::iter::once(Notice::failure("Failed to create OKR", &e)).chain(notice),
            )
            .into_response()
        }
    }
}

pub async fn edit_okr(
    State(state): State<Arc<AppState>>,
    Path(okr_id): Path<String>,
    Form(form): Form<EditOkrForm>,
) -> Html<String> {
    let result = match form.into_patch() {
        Ok(patch) => state.board.update_okr(&okr_id, patch).await,
        Err(e) => Err(e),
    };

    match result {
        Ok(updated) => with_toasts(
            render_okr_list(&updated.records),
            std::iter::once(Notice::success("OKR updated successfully")).chain(updated.notices),
        ),
        Err(e) => {
            log::error!("Error updating OKR {okr_id}: {e}");
            let (list, notice) = okr_list_html(&state).await;
            with_toasts(
                list,
                std::iter::once(Notice::failure("Failed to update OKR", &e)).chain(notice),
            )
        }
    }
}

pub async fn delete_okr(
    State(state): State<Arc<AppState>>,
    Path(okr_id): Path<String>,
) -> Html<String> {
    match state.board.delete_okr(&okr_id).await {
        Ok(remaining) => with_toasts(
            render_okr_list(&remaining.records),
            std::iter::once(Notice::success("OKR deleted successfully")).chain(remaining.notices),
        ),
        Err(e) => {
            log::error!("Error deleting OKR {okr_id}: {e}");
            let (list, notice) = okr_list_html(&state).await;
            with_toasts(
                list,
                std::iter::once(Notice::failure("Failed to delete OKR", &e)).chain(notice),
            )
        }
    }
}

pub async fn create_department(
    State(state): State<Arc<AppState>>,
    Form(form): Form<DepartmentForm>,
) -> Html<String> {
    let result = match form.into_new_department() {
        Ok(department) => state.board.create_department(department).await.map(|_| ()),
        Err(e) => Err(e),
    };
    let notice = match &result {
        Ok(()) => Notice::success("Department created successfully"),
        Err(e) => {
            log::error!("Error creating department: {e}");
            Notice::failure("Failed to create department", e)
        }
    };

    let snapshot = state.board.snapshot().await;
    let notices = std::iter::once(notice).chain(snapshot.notices.clone());
    with_toasts(render_hierarchy_panel(&snapshot), notices)
}

pub async fn create_team(
    State(state): State<Arc<AppState>>,
    Form(form): Form<TeamForm>,
) -> Html<String> {
    let result = match form.into_new_team() {
        Ok(team) => state.board.create_team(team).await.map(|_| ()),
        Err(e) => Err(e),
    };
    let notice = match &result {
        Ok(()) => Notice::success("Team created successfully"),
        Err(e) => {
            log::error!("Error creating team: {e}");
            Notice::failure("Failed to create team", e)
        }
    };

    let snapshot = state.board.snapshot().await;
    let notices = std::iter::once(notice).chain(snapshot.notices.clone());
    with_toasts(render_hierarchy_panel(&snapshot), notices)
}

pub fn configure_board_ui_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(index))
        .route("/ui/okrs", get(okrs_fragment).post(create_okr))
        .route("/ui/okrs/key-result-row", get(key_result_row))
        .route("/ui/okrs/:id/edit", post(edit_okr))
        .route("/ui/okrs/:id/delete", post(delete_okr))
        .route("/ui/hierarchy", get(hierarchy_fragment))
        .route("/ui/departments", post(create_department))
        .route("/ui/teams", post(create_team))
}
