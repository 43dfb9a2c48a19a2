//! Argument parsing and output formatting shared by subcommands

use prefsync_model::{GroupView, PreferenceKey, UnknownKey};
use std::fmt::Write as _;

/// Malformed `key=value` argument
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AssignmentError {
    /// No `=` in the argument
    #[error("expected key=value, got '{0}'")]
    Malformed(String),

    /// Key is not in the catalog
    #[error(transparent)]
    UnknownKey(#[from] UnknownKey),

    /// Value is not a recognised boolean
    #[error("'{0}' is not a boolean (use true/false, on/off, yes/no, 1/0)")]
    InvalidValue(String),
}

/// Parse `enable_todo_reminders=on` style arguments
///
/// # Errors
/// `AssignmentError` describing the first problem found.
pub fn parse_assignment(raw: &str) -> Result<(PreferenceKey, bool), AssignmentError> {
    let (key, value) = raw
        .split_once('=')
        .ok_or_else(|| AssignmentError::Malformed(raw.to_string()))?;
    let key: PreferenceKey = key.trim().parse()?;
    let value = match value.trim().to_ascii_lowercase().as_str() {
        "true" | "on" | "yes" | "1" => true,
        "false" | "off" | "no" | "0" => false,
        other => return Err(AssignmentError::InvalidValue(other.to_string())),
    };
    Ok((key, value))
}

/// Plain-text rendering of the editor view
#[must_use]
pub fn format_groups(groups: &[GroupView]) -> String {
    if groups.is_empty() {
        return "No notification settings available for this role.\n".to_string();
    }

    let mut out = String::new();
    for view in groups {
        let _ = writeln!(
            out,
            "[{}] {}  ({})",
            if view.enabled { "x" } else { " " },
            view.title,
            view.enable_key
        );
        let _ = writeln!(out, "    {}", view.description);
        for channel in &view.channels {
            let mark = match (channel.value, channel.effective) {
                (true, true) => "x",
                (true, false) => "-",
                (false, _) => " ",
            };
            let _ = writeln!(out, "    [{mark}] {}  ({})", channel.channel, channel.key);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use prefsync_model::{render_groups, PreferenceSet, Role};

    #[test]
    fn parses_common_boolean_spellings() {
        assert_eq!(
            parse_assignment("enable_pm_reports=on").unwrap(),
            (PreferenceKey::EnablePmReports, true)
        );
        assert_eq!(
            parse_assignment(" todo_reminders_slack = FALSE ").unwrap(),
            (PreferenceKey::TodoRemindersSlack, false)
        );
    }

    #[test]
    fn rejects_bad_assignments() {
        assert!(matches!(
            parse_assignment("enable_pm_reports"),
            Err(AssignmentError::Malformed(_))
        ));
        assert!(matches!(
            parse_assignment("enable_everything=true"),
            Err(AssignmentError::UnknownKey(_))
        ));
        assert!(matches!(
            parse_assignment("enable_pm_reports=maybe"),
            Err(AssignmentError::InvalidValue(_))
        ));
    }

    #[test]
    fn disabled_group_greys_out_channels() {
        let set = PreferenceSet::uniform(false).with(PreferenceKey::TodoRemindersSlack, true);
        let text = format_groups(&render_groups(Role::Member, &set));
        assert!(text.contains("[-] slack  (todo_reminders_slack)"));
    }

    #[test]
    fn no_access_gets_placeholder() {
        let text = format_groups(&render_groups(Role::NoAccess, &PreferenceSet::new()));
        assert_eq!(text, "No notification settings available for this role.\n");
    }
}
