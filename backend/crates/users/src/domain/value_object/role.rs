use kernel::validation::{CustomValue, FieldValue};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::domain::schema::ROLE_TYPE;

/// Stored as its code in `users.role`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    #[default]
    User,
    Admin,
}

impl Role {
    #[inline]
    pub const fn code(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Admin => "admin",
        }
    }

    #[inline]
    pub const fn is_admin(&self) -> bool {
        matches!(self, Role::Admin)
    }

    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "user" => Some(Role::User),
            "admin" => Some(Role::Admin),
            _ => None,
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl From<Role> for FieldValue {
    fn from(role: Role) -> Self {
        FieldValue::Custom(CustomValue::new(ROLE_TYPE, role.code()).with_display(role.to_string()))
    }
}
