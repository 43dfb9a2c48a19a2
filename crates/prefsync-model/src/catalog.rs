//! Static notification catalog
//!
//! Groups, channels and preference keys are a closed set fixed at build
//! time. The descriptor table is the single source of group metadata;
//! rendering code looks groups up here instead of rebuilding them.

use crate::role::Role;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Notification group identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum GroupId {
    /// Reminders about open todos
    TodoReminders,
    /// Post-meeting analysis
    MeetingAnalysis,
    /// Pre-meeting briefing
    MeetingPrep,
    /// Weekly hours reports
    WeeklyHoursReports,
    /// Project manager reports
    PmReports,
    /// Budget threshold alerts
    BudgetAlerts,
    /// Anomaly alerts
    AnomalyAlerts,
}

impl GroupId {
    /// Every group, in table order
    pub const ALL: [GroupId; 7] = [
        GroupId::TodoReminders,
        GroupId::MeetingAnalysis,
        GroupId::MeetingPrep,
        GroupId::WeeklyHoursReports,
        GroupId::PmReports,
        GroupId::BudgetAlerts,
        GroupId::AnomalyAlerts,
    ];

    /// Kebab-case tag
    #[inline]
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::TodoReminders => "todo-reminders",
            Self::MeetingAnalysis => "meeting-analysis",
            Self::MeetingPrep => "meeting-prep",
            Self::WeeklyHoursReports => "weekly-hours-reports",
            Self::PmReports => "pm-reports",
            Self::BudgetAlerts => "budget-alerts",
            Self::AnomalyAlerts => "anomaly-alerts",
        }
    }

    /// Descriptor for this group
    #[inline]
    #[must_use]
    pub fn descriptor(self) -> &'static NotificationGroup {
        group(self)
    }
}

impl fmt::Display for GroupId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Group tag outside the catalog
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown notification group: {0}")]
pub struct UnknownGroup(pub String);

impl FromStr for GroupId {
    type Err = UnknownGroup;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|g| g.as_str() == s)
            .ok_or_else(|| UnknownGroup(s.to_string()))
    }
}

/// Delivery sub-channel
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Channel {
    /// Slack direct message
    Slack,
    /// Email
    Email,
}

impl Channel {
    /// Lowercase name
    #[inline]
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Slack => "slack",
            Self::Email => "email",
        }
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Preference key
///
/// Serialized as the backend's snake_case field name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[allow(missing_docs)]
pub enum PreferenceKey {
    EnableTodoReminders,
    TodoRemindersSlack,
    TodoRemindersEmail,
    EnableMeetingAnalysis,
    MeetingAnalysisSlack,
    MeetingAnalysisEmail,
    EnableMeetingPrep,
    MeetingPrepSlack,
    EnableWeeklyHoursReports,
    WeeklyHoursReportsSlack,
    WeeklyHoursReportsEmail,
    EnablePmReports,
    PmReportsEmail,
    EnableBudgetAlerts,
    BudgetAlertsSlack,
    BudgetAlertsEmail,
    EnableAnomalyAlerts,
    AnomalyAlertsSlack,
}

/// What a key controls
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyCategory {
    /// Master switch of a group
    Enable(GroupId),
    /// Delivery channel of a group, operative only while the group is enabled
    Channel(GroupId, Channel),
}

impl KeyCategory {
    /// Group the key belongs to
    #[inline]
    #[must_use]
    pub fn group(self) -> GroupId {
        match self {
            Self::Enable(g) | Self::Channel(g, _) => g,
        }
    }
}

impl PreferenceKey {
    /// Every key
    pub const ALL: [PreferenceKey; 18] = [
        PreferenceKey::EnableTodoReminders,
        PreferenceKey::TodoRemindersSlack,
        PreferenceKey::TodoRemindersEmail,
        PreferenceKey::EnableMeetingAnalysis,
        PreferenceKey::MeetingAnalysisSlack,
        PreferenceKey::MeetingAnalysisEmail,
        PreferenceKey::EnableMeetingPrep,
        PreferenceKey::MeetingPrepSlack,
        PreferenceKey::EnableWeeklyHoursReports,
        PreferenceKey::WeeklyHoursReportsSlack,
        PreferenceKey::WeeklyHoursReportsEmail,
        PreferenceKey::EnablePmReports,
        PreferenceKey::PmReportsEmail,
        PreferenceKey::EnableBudgetAlerts,
        PreferenceKey::BudgetAlertsSlack,
        PreferenceKey::BudgetAlertsEmail,
        PreferenceKey::EnableAnomalyAlerts,
        PreferenceKey::AnomalyAlertsSlack,
    ];

    /// Backend field name
    #[must_use]
    pub fn as_str(self) -> &'static str {
        use PreferenceKey::*;
        match self {
            EnableTodoReminders => "enable_todo_reminders",
            TodoRemindersSlack => "todo_reminders_slack",
            TodoRemindersEmail => "todo_reminders_email",
            EnableMeetingAnalysis => "enable_meeting_analysis",
            MeetingAnalysisSlack => "meeting_analysis_slack",
            MeetingAnalysisEmail => "meeting_analysis_email",
            EnableMeetingPrep => "enable_meeting_prep",
            MeetingPrepSlack => "meeting_prep_slack",
            EnableWeeklyHoursReports => "enable_weekly_hours_reports",
            WeeklyHoursReportsSlack => "weekly_hours_reports_slack",
            WeeklyHoursReportsEmail => "weekly_hours_reports_email",
            EnablePmReports => "enable_pm_reports",
            PmReportsEmail => "pm_reports_email",
            EnableBudgetAlerts => "enable_budget_alerts",
            BudgetAlertsSlack => "budget_alerts_slack",
            BudgetAlertsEmail => "budget_alerts_email",
            EnableAnomalyAlerts => "enable_anomaly_alerts",
            AnomalyAlertsSlack => "anomaly_alerts_slack",
        }
    }

    /// Category of this key
    #[must_use]
    pub fn category(self) -> KeyCategory {
        use PreferenceKey::*;
        match self {
            EnableTodoReminders => KeyCategory::Enable(GroupId::TodoReminders),
            TodoRemindersSlack => KeyCategory::Channel(GroupId::TodoReminders, Channel::Slack),
            TodoRemindersEmail => KeyCategory::Channel(GroupId::TodoReminders, Channel::Email),
            EnableMeetingAnalysis => KeyCategory::Enable(GroupId::MeetingAnalysis),
            MeetingAnalysisSlack => KeyCategory::Channel(GroupId::MeetingAnalysis, Channel::Slack),
            MeetingAnalysisEmail => KeyCategory::Channel(GroupId::MeetingAnalysis, Channel::Email),
            EnableMeetingPrep => KeyCategory::Enable(GroupId::MeetingPrep),
            MeetingPrepSlack => KeyCategory::Channel(GroupId::MeetingPrep, Channel::Slack),
            EnableWeeklyHoursReports => KeyCategory::Enable(GroupId::WeeklyHoursReports),
            WeeklyHoursReportsSlack => {
                KeyCategory::Channel(GroupId::WeeklyHoursReports, Channel::Slack)
            }
            WeeklyHoursReportsEmail => {
                KeyCategory::Channel(GroupId::WeeklyHoursReports, Channel::Email)
            }
            EnablePmReports => KeyCategory::Enable(GroupId::PmReports),
            PmReportsEmail => KeyCategory::Channel(GroupId::PmReports, Channel::Email),
            EnableBudgetAlerts => KeyCategory::Enable(GroupId::BudgetAlerts),
            BudgetAlertsSlack => KeyCategory::Channel(GroupId::BudgetAlerts, Channel::Slack),
            BudgetAlertsEmail => KeyCategory::Channel(GroupId::BudgetAlerts, Channel::Email),
            EnableAnomalyAlerts => KeyCategory::Enable(GroupId::AnomalyAlerts),
            AnomalyAlertsSlack => KeyCategory::Channel(GroupId::AnomalyAlerts, Channel::Slack),
        }
    }

    /// Group the key belongs to
    #[inline]
    #[must_use]
    pub fn group(self) -> GroupId {
        self.category().group()
    }
}

impl fmt::Display for PreferenceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Key name outside the catalog
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown preference key: {0}")]
pub struct UnknownKey(pub String);

impl FromStr for PreferenceKey {
    type Err = UnknownKey;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|k| k.as_str() == s)
            .ok_or_else(|| UnknownKey(s.to_string()))
    }
}

/// Channel flag of a group
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChannelKey {
    /// Delivery channel
    pub channel: Channel,
    /// Stored flag
    pub key: PreferenceKey,
}

/// Static group descriptor
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NotificationGroup {
    /// Group identifier
    pub id: GroupId,
    /// Display title
    pub title: &'static str,
    /// Display description
    pub description: &'static str,
    /// Master switch
    pub enable_key: PreferenceKey,
    /// Channel flags, possibly none
    pub channels: &'static [ChannelKey],
    /// Non-admin roles that may see the group
    pub audience: &'static [Role],
}

impl NotificationGroup {
    /// All keys owned by the group, enable key first
    pub fn keys(&self) -> impl Iterator<Item = PreferenceKey> + '_ {
        std::iter::once(self.enable_key).chain(self.channels.iter().map(|c| c.key))
    }
}

/// Group descriptor table, indexed in [`GroupId::ALL`] order
pub static NOTIFICATION_GROUPS: [NotificationGroup; 7] = [
    NotificationGroup {
        id: GroupId::TodoReminders,
        title: "Todo reminders",
        description: "Reminders about todos assigned to you that are due or overdue.",
        enable_key: PreferenceKey::EnableTodoReminders,
        channels: &[
            ChannelKey { channel: Channel::Slack, key: PreferenceKey::TodoRemindersSlack },
            ChannelKey { channel: Channel::Email, key: PreferenceKey::TodoRemindersEmail },
        ],
        audience: &[Role::Member],
    },
    NotificationGroup {
        id: GroupId::MeetingAnalysis,
        title: "Meeting analysis",
        description: "Summary, decisions and action items after meetings you attended.",
        enable_key: PreferenceKey::EnableMeetingAnalysis,
        channels: &[
            ChannelKey { channel: Channel::Slack, key: PreferenceKey::MeetingAnalysisSlack },
            ChannelKey { channel: Channel::Email, key: PreferenceKey::MeetingAnalysisEmail },
        ],
        audience: &[Role::Member],
    },
    NotificationGroup {
        id: GroupId::MeetingPrep,
        title: "Meeting preparation",
        description: "A briefing with open topics shortly before each meeting.",
        enable_key: PreferenceKey::EnableMeetingPrep,
        channels: &[ChannelKey { channel: Channel::Slack, key: PreferenceKey::MeetingPrepSlack }],
        audience: &[Role::Pm, Role::Member],
    },
    NotificationGroup {
        id: GroupId::WeeklyHoursReports,
        title: "Weekly hours reports",
        description: "Logged hours per project and person for the past week.",
        enable_key: PreferenceKey::EnableWeeklyHoursReports,
        channels: &[
            ChannelKey { channel: Channel::Slack, key: PreferenceKey::WeeklyHoursReportsSlack },
            ChannelKey { channel: Channel::Email, key: PreferenceKey::WeeklyHoursReportsEmail },
        ],
        audience: &[Role::Pm],
    },
    NotificationGroup {
        id: GroupId::PmReports,
        title: "Project manager reports",
        description: "Status reports for the projects you manage.",
        enable_key: PreferenceKey::EnablePmReports,
        channels: &[ChannelKey { channel: Channel::Email, key: PreferenceKey::PmReportsEmail }],
        audience: &[Role::Pm],
    },
    NotificationGroup {
        id: GroupId::BudgetAlerts,
        title: "Budget alerts",
        description: "Alerts when a project crosses a budget threshold.",
        enable_key: PreferenceKey::EnableBudgetAlerts,
        channels: &[
            ChannelKey { channel: Channel::Slack, key: PreferenceKey::BudgetAlertsSlack },
            ChannelKey { channel: Channel::Email, key: PreferenceKey::BudgetAlertsEmail },
        ],
        audience: &[Role::Pm],
    },
    NotificationGroup {
        id: GroupId::AnomalyAlerts,
        title: "Anomaly alerts",
        description: "Unusual time entries or activity detected in your projects.",
        enable_key: PreferenceKey::EnableAnomalyAlerts,
        channels: &[ChannelKey { channel: Channel::Slack, key: PreferenceKey::AnomalyAlertsSlack }],
        audience: &[Role::Pm],
    },
];

/// Look up a group descriptor
#[inline]
#[must_use]
pub fn group(id: GroupId) -> &'static NotificationGroup {
    &NOTIFICATION_GROUPS[id as usize]
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn table_is_indexed_by_group_id() {
        for id in GroupId::ALL {
            assert_eq!(group(id).id, id);
        }
        assert_eq!(NOTIFICATION_GROUPS.len(), GroupId::ALL.len());
    }

    #[test]
    fn every_key_belongs_to_exactly_one_group() {
        let mut seen = HashSet::new();
        for g in &NOTIFICATION_GROUPS {
            for key in g.keys() {
                assert!(seen.insert(key), "{key} listed twice");
                assert_eq!(key.group(), g.id);
            }
        }
        assert_eq!(seen.len(), PreferenceKey::ALL.len());
    }

    #[test]
    fn key_categories_match_descriptors() {
        for g in &NOTIFICATION_GROUPS {
            assert_eq!(g.enable_key.category(), KeyCategory::Enable(g.id));
            for c in g.channels {
                assert_eq!(c.key.category(), KeyCategory::Channel(g.id, c.channel));
            }
        }
    }

    #[test]
    fn names_round_trip_through_from_str() {
        for key in PreferenceKey::ALL {
            assert_eq!(key.as_str().parse::<PreferenceKey>().unwrap(), key);
        }
        for id in GroupId::ALL {
            assert_eq!(id.as_str().parse::<GroupId>().unwrap(), id);
        }
        assert!("enable_everything".parse::<PreferenceKey>().is_err());
        assert!("todo_reminders".parse::<GroupId>().is_err());
    }

    #[test]
    fn serde_names_match_as_str() {
        for key in PreferenceKey::ALL {
            let json = serde_json::to_string(&key).unwrap();
            assert_eq!(json, format!("\"{}\"", key.as_str()));
        }
        for id in GroupId::ALL {
            let json = serde_json::to_string(&id).unwrap();
            assert_eq!(json, format!("\"{}\"", id.as_str()));
        }
    }
}
