use serde::Serialize;

use crate::database::{
    models::{Employee, Leave},
    store::{EmployeeStore, LeaveFilter, LeaveStore},
};
use crate::error::AppError;
use crate::services::{calendar::DateRange, hierarchy::Hierarchy};

/// One colleague whose approved leave collides with a candidate.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Conflict {
    pub employee_id: String,
    pub employee_name: String,
    pub leaves: Vec<Leave>,
}

/// Finds approved leaves of the requester's peers that overlap a candidate range. Peers are the
/// requester's manager followed by everyone in the manager's subtree, in walk order.
pub struct ConflictDetector<'a, E, L> {
    employees: &'a E,
    leaves: &'a L,
    depth_limit: usize,
}

impl<'a, E: EmployeeStore, L: LeaveStore> ConflictDetector<'a, E, L> {
    pub fn new(employees: &'a E, leaves: &'a L, depth_limit: usize) -> Self {
        Self {
            employees,
            leaves,
            depth_limit,
        }
    }

    pub async fn conflicts_for_leave(&self, leave: &Leave) -> Result<Vec<Conflict>, AppError> {
        self.conflicts_for(&leave.owner_id, leave.range()).await
    }

    /// Works for leaves that do not exist yet, so a form can show conflicts before submit.
    pub async fn conflicts_for(
        &self,
        owner_id: &str,
        candidate: DateRange,
    ) -> Result<Vec<Conflict>, AppError> {
        let owner = self
            .employees
            .find_employee(owner_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Employee {}", owner_id)))?;

        let peers = self.peers_of(&owner).await?;
        let mut conflicts = Vec::new();

        for peer in peers {
            let filter = LeaveFilter::owned_by(&peer.id)
                .approved()
                .overlapping(candidate);
            let leaves = self.leaves.find_leaves(&filter).await?;

            if !leaves.is_empty() {
                conflicts.push(Conflict {
                    employee_id: peer.id,
                    employee_name: peer.name,
                    leaves,
                });
            }
        }

        Ok(conflicts)
    }

    async fn peers_of(&self, owner: &Employee) -> Result<Vec<Employee>, AppError> {
        let hierarchy = Hierarchy::new(self.employees, self.depth_limit);

        let Some(manager) = hierarchy.manager_of(owner).await? else {
            return Ok(Vec::new());
        };

        let subtree = hierarchy.subtree(&manager.id).await?;
        let peers = std::iter::once(manager)
            .chain(subtree)
            .filter(|e| e.id != owner.id)
            .collect();

        Ok(peers)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::memory::InMemoryStore;
    use crate::database::models::{LeaveRequestInput, LeaveType};
    use chrono::NaiveDate;
    use pretty_assertions::assert_eq;
    use uuid::Uuid;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn employee(id: &str, manager: Option<&str>) -> Employee {
        Employee {
            id: id.to_string(),
            name: format!("Name of {}", id),
            country: "GB".to_string(),
            annual_pto: 20,
            manager_id: manager.map(str::to_string),
            organization_id: Uuid::nil(),
            is_admin: false,
        }
    }

    fn leave(owner: &str, start: NaiveDate, end: NaiveDate, approved: bool) -> Leave {
        let mut leave = Leave::new(
            owner,
            LeaveRequestInput {
                leave_type: LeaveType::PaidTimeOff,
                start_date: start,
                end_date: end,
                description: None,
            },
        );
        if approved {
            leave.approve("head");
        }
        leave
    }

    // head
    // ├── lead
    // │   ├── ada
    // │   └── bob
    // │       └── cat
    // └── other
    async fn org() -> InMemoryStore {
        let store = InMemoryStore::new();
        for e in [
            employee("head", None),
            employee("lead", Some("head")),
            employee("ada", Some("lead")),
            employee("bob", Some("lead")),
            employee("cat", Some("bob")),
            employee("other", Some("head")),
        ] {
            store.add_employee(e).await;
        }
        store
    }

    fn ids(conflicts: &[Conflict]) -> Vec<&str> {
        conflicts.iter().map(|c| c.employee_id.as_str()).collect()
    }

    #[tokio::test]
    async fn test_head_has_no_conflicts() {
        let store = org().await;
        store
            .add_leave(leave("lead", date(2030, 3, 4), date(2030, 3, 8), true))
            .await;

        let detector = ConflictDetector::new(&store, &store, 32);
        let conflicts = detector
            .conflicts_for("head", DateRange::new(date(2030, 3, 4), date(2030, 3, 8)))
            .await
            .unwrap();

        assert!(conflicts.is_empty());
    }

    #[tokio::test]
    async fn test_manager_and_subtree_are_peers_in_walk_order() {
        let store = org().await;
        for owner in ["cat", "bob", "lead", "other"] {
            store
                .add_leave(leave(owner, date(2030, 3, 4), date(2030, 3, 8), true))
                .await;
        }

        let detector = ConflictDetector::new(&store, &store, 32);
        let conflicts = detector
            .conflicts_for("ada", DateRange::new(date(2030, 3, 5), date(2030, 3, 6)))
            .await
            .unwrap();

        // "other" reports to head, not to ada's manager
        assert_eq!(ids(&conflicts), vec!["lead", "bob", "cat"]);
        assert_eq!(conflicts[0].employee_name, "Name of lead");
    }

    #[tokio::test]
    async fn test_touching_ranges_do_not_conflict() {
        let store = org().await;
        store
            .add_leave(leave("bob", date(2030, 3, 6), date(2030, 3, 8), true))
            .await;

        let detector = ConflictDetector::new(&store, &store, 32);
        let touching = detector
            .conflicts_for("ada", DateRange::new(date(2030, 3, 4), date(2030, 3, 6)))
            .await
            .unwrap();
        assert!(touching.is_empty());

        let one_day = detector
            .conflicts_for("ada", DateRange::new(date(2030, 3, 4), date(2030, 3, 7)))
            .await
            .unwrap();
        assert_eq!(ids(&one_day), vec!["bob"]);
        assert_eq!(one_day[0].leaves.len(), 1);
    }

    #[tokio::test]
    async fn test_pending_and_rejected_leaves_are_ignored() {
        let store = org().await;
        store
            .add_leave(leave("bob", date(2030, 3, 4), date(2030, 3, 8), false))
            .await;
        let mut rejected = leave("bob", date(2030, 3, 4), date(2030, 3, 8), false);
        rejected.reject("lead");
        store.add_leave(rejected).await;

        let detector = ConflictDetector::new(&store, &store, 32);
        let conflicts = detector
            .conflicts_for("ada", DateRange::new(date(2030, 3, 4), date(2030, 3, 8)))
            .await
            .unwrap();

        assert!(conflicts.is_empty());
    }

    #[tokio::test]
    async fn test_own_leaves_are_not_conflicts() {
        let store = org().await;
        store
            .add_leave(leave("ada", date(2030, 3, 4), date(2030, 3, 8), true))
            .await;

        let detector = ConflictDetector::new(&store, &store, 32);
        let conflicts = detector
            .conflicts_for("ada", DateRange::new(date(2030, 3, 4), date(2030, 3, 8)))
            .await
            .unwrap();

        assert!(conflicts.is_empty());
    }

    #[tokio::test]
    async fn test_all_overlapping_leaves_of_a_peer_are_bundled() {
        let store = org().await;
        store
            .add_leave(leave("bob", date(2030, 3, 4), date(2030, 3, 5), true))
            .await;
        store
            .add_leave(leave("bob", date(2030, 3, 7), date(2030, 3, 8), true))
            .await;
        store
            .add_leave(leave("bob", date(2030, 4, 1), date(2030, 4, 2), true))
            .await;

        let detector = ConflictDetector::new(&store, &store, 32);
        let conflicts = detector
            .conflicts_for("ada", DateRange::new(date(2030, 3, 1), date(2030, 3, 20)))
            .await
            .unwrap();

        assert_eq!(conflicts.len(), 1);
        assert_eq!(conflicts[0].leaves.len(), 2);
    }
}
