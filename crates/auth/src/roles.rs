use core::str::FromStr;

use serde::{Deserialize, Serialize};

/// Canonical role identity used for route guarding.
///
/// Identity providers and the backend speak several languages, so each
/// canonical role answers to a small set of aliases. Comparison is always
/// case-insensitive.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Student,
    Teacher,
    Admin,
}

impl Role {
    pub const ALL: [Role; 3] = [Role::Student, Role::Teacher, Role::Admin];

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Student => "student",
            Role::Teacher => "teacher",
            Role::Admin => "admin",
        }
    }

    /// All recognised spellings of this role (lowercase, canonical included).
    pub fn aliases(&self) -> &'static [&'static str] {
        match self {
            Role::Student => &["estudiante", "student"],
            Role::Teacher => &["docente", "teacher", "profesor"],
            Role::Admin => &["administrador", "admin", "administrator"],
        }
    }

    /// Resolve any alias (case-insensitive) to its canonical role.
    pub fn from_alias(name: &str) -> Option<Role> {
        let name = name.to_lowercase();
        Role::ALL
            .into_iter()
            .find(|role| role.aliases().contains(&name.as_str()))
    }

    /// Landing page for this role.
    pub fn dashboard_path(&self) -> &'static str {
        match self {
            Role::Student => "/dashboard/student",
            Role::Teacher => "/dashboard/teacher",
            Role::Admin => "/dashboard/admin",
        }
    }
}

impl core::fmt::Display for Role {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unrecognized role '{0}'")]
pub struct UnknownRole(pub String);

impl FromStr for Role {
    type Err = UnknownRole;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Role::from_alias(s).ok_or_else(|| UnknownRole(s.to_string()))
    }
}

/// Alias-aware, case-insensitive role comparison.
///
/// Two names match when they are equal ignoring case, or when both are
/// aliases of the same canonical role. Symmetric in its arguments.
pub fn match_role(actual: &str, required: &str) -> bool {
    let actual = actual.to_lowercase();
    let required = required.to_lowercase();

    if actual == required {
        return true;
    }

    match (Role::from_alias(&actual), Role::from_alias(&required)) {
        (Some(a), Some(b)) => a == b,
        _ => false,
    }
}
