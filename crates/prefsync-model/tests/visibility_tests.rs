use prefsync_model::{is_visible, GroupId, PreferenceKey, PreferenceSet, Role};
use proptest::prelude::*;

#[test]
fn test_member_scenario() {
    let groups = [
        GroupId::TodoReminders,
        GroupId::MeetingAnalysis,
        GroupId::MeetingPrep,
        GroupId::PmReports,
    ];
    let visible: Vec<bool> = groups
        .iter()
        .map(|g| is_visible(Role::Member, *g))
        .collect();

    assert_eq!(visible, vec![true, true, true, false]);
}

#[test]
fn test_pm_scenario() {
    assert!(is_visible(Role::Pm, GroupId::WeeklyHoursReports));
    assert!(is_visible(Role::Pm, GroupId::PmReports));
    assert!(is_visible(Role::Pm, GroupId::BudgetAlerts));
    assert!(is_visible(Role::Pm, GroupId::AnomalyAlerts));
    assert!(is_visible(Role::Pm, GroupId::MeetingPrep));

    assert!(!is_visible(Role::Pm, GroupId::TodoReminders));
    assert!(!is_visible(Role::Pm, GroupId::MeetingAnalysis));
}

fn any_role() -> impl Strategy<Value = Role> {
    prop::sample::select(Role::ALL.to_vec())
}

fn any_group() -> impl Strategy<Value = GroupId> {
    prop::sample::select(GroupId::ALL.to_vec())
}

fn any_key() -> impl Strategy<Value = PreferenceKey> {
    prop::sample::select(PreferenceKey::ALL.to_vec())
}

proptest! {
    #[test]
    fn prop_visibility_is_total_and_admin_sees_all(role in any_role(), group in any_group()) {
        let visible = is_visible(role, group);
        match role {
            Role::Admin => prop_assert!(visible),
            Role::NoAccess => prop_assert!(!visible),
            Role::Pm | Role::Member => {
                prop_assert_eq!(visible, group.descriptor().audience.contains(&role));
            }
        }
    }

    #[test]
    fn prop_visibility_is_stable_across_calls(role in any_role(), group in any_group()) {
        prop_assert_eq!(is_visible(role, group), is_visible(role, group));
    }

    #[test]
    fn prop_merge_is_last_write_wins(
        edits in prop::collection::vec((any_key(), any::<bool>()), 0..32)
    ) {
        let mut merged = PreferenceSet::new();
        for (k, v) in &edits {
            merged.merge(&PreferenceSet::new().with(*k, *v));
        }
        for (k, _) in &edits {
            let last = edits.iter().rev().find(|(key, _)| key == k).map(|(_, v)| *v);
            prop_assert_eq!(merged.get(*k), last);
        }
    }
}
