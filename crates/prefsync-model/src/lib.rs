//! Prefsync Model - static notification catalog and preference data
//!
//! Pure data and pure functions, no I/O:
//! - Roles supplied by the authorization collaborator
//! - The compile-time table of notification groups and their keys
//! - The visibility policy mapping (role, group) to a boolean
//! - Preference sets and the pending mutation buffer
//! - The per-render view model for the preferences editor
//!
//! # Example
//!
//! ```rust
//! use prefsync_model::{is_visible, GroupId, Role};
//!
//! assert!(is_visible(Role::Member, GroupId::TodoReminders));
//! assert!(!is_visible(Role::Member, GroupId::PmReports));
//! ```

#![warn(unreachable_pub)]

pub mod catalog;
pub mod role;
pub mod set;
pub mod view;
pub mod visibility;

pub use catalog::{
    group, Channel, ChannelKey, GroupId, KeyCategory, NotificationGroup, PreferenceKey,
    UnknownGroup, UnknownKey, NOTIFICATION_GROUPS,
};
pub use role::{Role, UnknownRole};
pub use set::{PendingMutation, PreferenceSet};
pub use view::{render_groups, ChannelView, GroupView};
pub use visibility::{is_visible, visible_groups};

