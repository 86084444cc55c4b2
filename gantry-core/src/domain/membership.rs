//! Membership domain types

use serde::{Deserialize, Serialize};
use std::str::FromStr;

use super::ParseEnumError;

/// Role-based grant of a principal on a path
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Membership {
    pub path: Option<String>,
    pub member_type: Option<MemberType>,
    /// Opaque principal identifier
    pub member_name: Option<String>,
    pub role: Option<Role>,
}

impl Membership {
    /// Group membership with every field set
    pub fn group(path: impl Into<String>, member_name: impl Into<String>, role: Role) -> Self {
        Self {
            path: Some(path.into()),
            member_type: Some(MemberType::Group),
            member_name: Some(member_name.into()),
            role: Some(role),
        }
    }
}

/// Kind of principal a membership applies to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MemberType {
    Group,
}

/// Membership role, ordered by privilege
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    Guest,
    Contributor,
    Manager,
}

impl Role {
    pub const ALL: [Role; 3] = [Role::Guest, Role::Contributor, Role::Manager];
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Role::Guest => write!(f, "GUEST"),
            Role::Contributor => write!(f, "CONTRIBUTOR"),
            Role::Manager => write!(f, "MANAGER"),
        }
    }
}

impl FromStr for Role {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "GUEST" => Ok(Role::Guest),
            "CONTRIBUTOR" => Ok(Role::Contributor),
            "MANAGER" => Ok(Role::Manager),
            _ => Err(ParseEnumError {
                kind: "role",
                value: s.to_string(),
            }),
        }
    }
}
