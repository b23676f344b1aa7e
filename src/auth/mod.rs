use std::collections::BTreeSet;
use std::str::FromStr;

use crate::database::entities::users;

/// The three roles that govern access to a plan's agreement.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Ord, PartialOrd)]
pub enum Role {
    Administrator,
    RangeOfficer,
    AgreementHolder,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Administrator => "administrator",
            Role::RangeOfficer => "range_officer",
            Role::AgreementHolder => "agreement_holder",
        }
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "administrator" | "admin" => Ok(Role::Administrator),
            "range_officer" | "rangeofficer" => Ok(Role::RangeOfficer),
            "agreement_holder" | "agreementholder" => Ok(Role::AgreementHolder),
            _ => Err(format!("Invalid role: {}", s)),
        }
    }
}

/// The requesting user as seen by the lifecycle core.
///
/// Role strings are kept raw so an unrecognised role stays distinguishable from no role
/// at all: the former denies access, the latter is an internal error.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Actor {
    pub user_id: i32,
    pub client_id: Option<i32>,
    roles: BTreeSet<String>,
}

impl Actor {
    pub fn new(user_id: i32) -> Self {
        Self {
            user_id,
            client_id: None,
            roles: BTreeSet::new(),
        }
    }

    pub fn from_user(user: &users::Model) -> Self {
        let roles = user.role_names().into_iter().collect();
        Self {
            user_id: user.id,
            client_id: user.client_id,
            roles,
        }
    }

    pub fn with_role(mut self, role: impl Into<String>) -> Self {
        self.roles.insert(role.into());
        self
    }

    pub fn with_client(mut self, client_id: i32) -> Self {
        self.client_id = Some(client_id);
        self
    }

    pub fn has_any_role(&self) -> bool {
        !self.roles.is_empty()
    }

    pub fn roles(&self) -> BTreeSet<Role> {
        self.roles
            .iter()
            .filter_map(|role| Role::from_str(role).ok())
            .collect()
    }

    pub fn has_role(&self, role: Role) -> bool {
        self.roles().contains(&role)
    }

    /// Staff are administrators and range officers.
    pub fn is_staff(&self) -> bool {
        self.has_role(Role::Administrator) || self.has_role(Role::RangeOfficer)
    }
}
