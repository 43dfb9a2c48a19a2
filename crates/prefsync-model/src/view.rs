//! Render model for the preferences editor
//!
//! Built fresh from the current role and set on every render; a role
//! change shows up on the next call without any invalidation.

use crate::catalog::{Channel, GroupId, PreferenceKey};
use crate::role::Role;
use crate::set::PreferenceSet;
use crate::visibility::visible_groups;
use serde::Serialize;

/// One channel toggle
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChannelView {
    /// Delivery channel
    pub channel: Channel,
    /// Stored flag
    pub key: PreferenceKey,
    /// Stored value
    pub value: bool,
    /// False while the group is disabled; the control renders greyed out
    pub effective: bool,
}

/// One visible group
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GroupView {
    /// Group identifier
    pub id: GroupId,
    /// Display title
    pub title: &'static str,
    /// Display description
    pub description: &'static str,
    /// Master switch key
    pub enable_key: PreferenceKey,
    /// Master switch value
    pub enabled: bool,
    /// Channel toggles
    pub channels: Vec<ChannelView>,
}

/// Groups visible to `role` with their current values
///
/// Keys missing from `set` render as `false`.
#[must_use]
pub fn render_groups(role: Role, set: &PreferenceSet) -> Vec<GroupView> {
    visible_groups(role)
        .map(|g| GroupView {
            id: g.id,
            title: g.title,
            description: g.description,
            enable_key: g.enable_key,
            enabled: set.get(g.enable_key).unwrap_or(false),
            channels: g
                .channels
                .iter()
                .map(|c| ChannelView {
                    channel: c.channel,
                    key: c.key,
                    value: set.get(c.key).unwrap_or(false),
                    effective: set.is_effective(c.key),
                })
                .collect(),
        })
        .collect()
}
