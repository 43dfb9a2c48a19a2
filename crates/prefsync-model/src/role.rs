//! Caller roles
//!
//! The role is an input from the authorization layer. It is never cached
//! here; callers pass the current value on every render.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Role of the signed-in user
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    /// Organization administrator
    Admin,
    /// Project manager
    Pm,
    /// Regular team member
    Member,
    /// Authenticated but without access to the assistant
    NoAccess,
}

impl Role {
    /// Every role, in precedence order
    pub const ALL: [Role; 4] = [Role::Admin, Role::Pm, Role::Member, Role::NoAccess];

    /// Wire name (`ADMIN`, `PM`, `MEMBER`, `NO_ACCESS`)
    #[inline]
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Admin => "ADMIN",
            Self::Pm => "PM",
            Self::Member => "MEMBER",
            Self::NoAccess => "NO_ACCESS",
        }
    }

    /// Parse a role, mapping anything unrecognized to [`Role::NoAccess`]
    #[must_use]
    pub fn parse_lenient(raw: &str) -> Self {
        raw.parse().unwrap_or(Self::NoAccess)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Role string outside the closed set
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown role: {0}")]
pub struct UnknownRole(pub String);

impl FromStr for Role {
    type Err = UnknownRole;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().replace('-', "_").as_str() {
            "ADMIN" => Ok(Self::Admin),
            "PM" => Ok(Self::Pm),
            "MEMBER" => Ok(Self::Member),
            "NO_ACCESS" => Ok(Self::NoAccess),
            _ => Err(UnknownRole(s.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_parse_is_case_insensitive() {
        assert_eq!("admin".parse::<Role>().unwrap(), Role::Admin);
        assert_eq!("Pm".parse::<Role>().unwrap(), Role::Pm);
        assert_eq!("no-access".parse::<Role>().unwrap(), Role::NoAccess);
        assert_eq!(" MEMBER ".parse::<Role>().unwrap(), Role::Member);
    }

    #[test]
    fn role_parse_rejects_unknown() {
        let err = "OWNER".parse::<Role>().unwrap_err();
        assert_eq!(err, UnknownRole("OWNER".to_string()));
        assert_eq!(Role::parse_lenient("OWNER"), Role::NoAccess);
        assert_eq!(Role::parse_lenient(""), Role::NoAccess);
    }

    #[test]
    fn role_serde_uses_wire_names() {
        let json = serde_json::to_string(&Role::NoAccess).unwrap();
        assert_eq!(json, "\"NO_ACCESS\"");
        let back: Role = serde_json::from_str("\"PM\"").unwrap();
        assert_eq!(back, Role::Pm);
    }
}
