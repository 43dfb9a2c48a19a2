//! Role visibility policy
//!
//! Precedence, first match wins:
//! - `ADMIN` sees every group
//! - `PM` and `MEMBER` see the groups whose audience lists them
//! - `NO_ACCESS` sees nothing
//!
//! Stateless; evaluate it on every render with the current role.

use crate::catalog::{group, GroupId, NotificationGroup, NOTIFICATION_GROUPS};
use crate::role::Role;

/// Whether `role` may see group `id`
#[must_use]
pub fn is_visible(role: Role, id: GroupId) -> bool {
    match role {
        Role::Admin => true,
        Role::Pm | Role::Member => group(id).audience.contains(&role),
        Role::NoAccess => false,
    }
}

/// Descriptors visible to `role`, in table order
pub fn visible_groups(role: Role) -> impl Iterator<Item = &'static NotificationGroup> {
    NOTIFICATION_GROUPS
        .iter()
        .filter(move |g| is_visible(role, g.id))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn admin_sees_everything() {
        for id in GroupId::ALL {
            assert!(is_visible(Role::Admin, id));
        }
    }

    #[test]
    fn no_access_sees_nothing() {
        assert_eq!(visible_groups(Role::NoAccess).count(), 0);
    }

    #[test]
    fn pm_groups() {
        let ids: Vec<GroupId> = visible_groups(Role::Pm).map(|g| g.id).collect();
        assert_eq!(
            ids,
            vec![
                GroupId::MeetingPrep,
                GroupId::WeeklyHoursReports,
                GroupId::PmReports,
                GroupId::BudgetAlerts,
                GroupId::AnomalyAlerts,
            ]
        );
    }

    #[test]
    fn member_groups() {
        assert!(is_visible(Role::Member, GroupId::TodoReminders));
        assert!(is_visible(Role::Member, GroupId::MeetingAnalysis));
        assert!(is_visible(Role::Member, GroupId::MeetingPrep));
        assert!(!is_visible(Role::Member, GroupId::PmReports));
        assert!(!is_visible(Role::Member, GroupId::BudgetAlerts));
    }

    #[test]
    fn unrecognized_role_string_sees_nothing() {
        let role = Role::parse_lenient("SUPERUSER");
        for id in GroupId::ALL {
            assert!(!is_visible(role, id));
        }
    }
}
