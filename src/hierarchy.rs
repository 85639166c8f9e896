//! Organization → department → team tree built from flat store snapshots.

use serde::Serialize;

use crate::models::{Department, Okr, OkrStatus, Organization, Team};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DepartmentNode {
    pub department: Department,
    pub team_count: usize,
    pub teams: Vec<Team>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OrganizationNode {
    pub organization: Organization,
    pub department_count: usize,
    pub departments: Vec<DepartmentNode>,
}

/// Nest departments under organizations and teams under departments by
/// foreign key. Input order is kept, so callers pass name-sorted snapshots.
/// Rows whose parent is missing are left out rather than reported.
pub fn compose(
    organizations: &[Organization],
    departments: &[Department],
    teams: &[Team],
) -> Vec<OrganizationNode> {
    organizations
        .iter()
        .map(|organization| {
            let departments: Vec<DepartmentNode> = departments
                .iter()
                .filter(|d| d.organization_id == organization.id)
                .map(|department| {
                    let teams: Vec<Team> = teams
                        .iter()
                        .filter(|t| t.department_id == department.id)
                        .cloned()
                        .collect();
                    DepartmentNode {
                        department: department.clone(),
                        team_count: teams.len(),
                        teams,
                    }
                })
                .collect();

            OrganizationNode {
                organization: organization.clone(),
                department_count: departments.len(),
                departments,
            }
        })
        .collect()
}

pub fn team_okr_count(team_id: &str, okrs: &[Okr]) -> usize {
    okrs.iter().filter(|okr| okr.team_id == team_id).count()
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct HierarchyStats {
    pub total_organizations: usize,
    pub total_departments: usize,
    pub total_teams: usize,
    pub total_okrs: usize,
    pub active_okrs: usize,
}

impl HierarchyStats {
    pub fn collect(
        organizations: &[Organization],
        departments: &[Department],
        teams: &[Team],
        okrs: &[Okr],
    ) -> Self {
        Self {
            total_organizations: organizations.len(),
            total_departments: departments.len(),
            total_teams: teams.len(),
            total_okrs: okrs.len(),
            active_okrs: okrs
                .iter()
                .filter(|okr| okr.status == OkrStatus::Active)
                .count(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct HierarchyView {
    pub organizations: Vec<OrganizationNode>,
    pub stats: HierarchyStats,
}

impl HierarchyView {
    pub fn build(
        organizations: &[Organization],
        departments: &[Department],
        teams: &[Team],
        okrs: &[Okr],
    ) -> Self {
        Self {
            organizations: compose(organizations, departments, teams),
            stats: HierarchyStats::collect(organizations, departments, teams, okrs),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::UNASSIGNED;

    fn org(id: &str, name: &str) -> Organization {
        Organization {
            id: id.to_string(),
            name: name.to_string(),
            description: None,
        }
    }

    fn dept(id: &str, org_id: &str) -> Department {
        Department {
            id: id.to_string(),
            name: format!("Dept {id}"),
            description: None,
            organization_id: org_id.to_string(),
        }
    }

    fn team(id: &str, dept_id: &str) -> Team {
        Team {
            id: id.to_string(),
            name: format!("Team {id}"),
            description: None,
            department_id: dept_id.to_string(),
        }
    }

    fn okr(id: &str, team_id: &str, status: OkrStatus) -> Okr {
        Okr {
            id: id.to_string(),
            title: id.to_string(),
            description: None,
            progress: 0.0,
            key_results: vec![],
            assigned_user_id: None,
            assignee: UNASSIGNED.to_string(),
            due_date: None,
            status,
            team_id: team_id.to_string(),
        }
    }

    #[test]
    fn test_counts_match_foreign_keys() {
        let orgs = vec![org("o1", "Acme"), org("o2", "Globex")];
        let depts = vec![dept("d1", "o1"), dept("d2", "o2"), dept("d3", "o1")];
        let teams = vec![team("t1", "d1"), team("t2", "d1"), team("t3", "d3")];

        let tree = compose(&orgs, &depts, &teams);

        for node in &tree {
            let expected = depts
                .iter()
                .filter(|d| d.organization_id == node.organization.id)
                .count();
            assert_eq!(node.department_count, expected);
            assert_eq!(node.departments.len(), expected);

            for dept_node in &node.departments {
                let expected = teams
                    .iter()
                    .filter(|t| t.department_id == dept_node.department.id)
                    .count();
                assert_eq!(dept_node.team_count, expected);
                assert_eq!(dept_node.teams.len(), expected);
            }
        }
        assert_eq!(tree[0].department_count, 2);
        assert_eq!(tree[0].departments[0].team_count, 2);
    }

    #[test]
    fn test_input_order_preserved() {
        let orgs = vec![org("o1", "Acme")];
        let depts = vec![dept("d9", "o1"), dept("d1", "o1")];
        let tree = compose(&orgs, &depts, &[]);

        let ids: Vec<_> = tree[0].departments.iter().map(|d| d.department.id.as_str()).collect();
        assert_eq!(ids, vec!["d9", "d1"]);
    }

    #[test]
    fn test_empty_and_orphaned_branches() {
        let orgs = vec![org("o1", "Acme")];
        let depts = vec![dept("d1", "missing-org")];
        let teams = vec![team("t1", "missing-dept")];

        let tree = compose(&orgs, &depts, &teams);
        assert_eq!(tree.len(), 1);
        assert_eq!(tree[0].department_count, 0);
        assert!(tree[0].departments.is_empty());

        assert!(compose(&[], &depts, &teams).is_empty());
    }

    #[test]
    fn test_stats_and_team_badges() {
        let orgs = vec![org("o1", "Acme")];
        let depts = vec![dept("d1", "o1")];
        let teams = vec![team("t1", "d1"), team("t2", "d1")];
        let okrs = vec![
            okr("k1", "t1", OkrStatus::Active),
            okr("k2", "t1", OkrStatus::Completed),
            okr("k3", "t2", OkrStatus::Active),
        ];

        let view = HierarchyView::build(&orgs, &depts, &teams, &okrs);
        assert_eq!(
            view.stats,
            HierarchyStats {
                total_organizations: 1,
                total_departments: 1,
                total_teams: 2,
                total_okrs: 3,
                active_okrs: 2,
            }
        );
        assert_eq!(team_okr_count("t1", &okrs), 2);
        assert_eq!(team_okr_count("t9", &okrs), 0);
    }
}
