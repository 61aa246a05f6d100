//! Identity models returned by the authentication endpoints.

use serde::{Deserialize, Serialize};

/// The currently authenticated employee, as returned by `/auth/me`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub struct User {
    pub id: i64,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub role: String,
    #[serde(default)]
    pub department: Option<String>,
    pub is_active: bool,
}

impl User {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }

    /// Name with role, e.g. "Ana Ruiz (supervisor, Logistics)"
    pub fn display_label(&self) -> String {
        match self.department.as_deref() {
            Some(dept) if !dept.is_empty() => {
                format!("{} ({}, {})", self.full_name(), self.role, dept)
            }
            _ => format!("{} ({})", self.full_name(), self.role),
        }
    }
}

/// Body of a successful `/auth/login` or `/auth/refresh`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub struct TokenResponse {
    pub access_token: String,
    #[serde(default = "default_token_type")]
    pub token_type: String,
}

fn default_token_type() -> String {
    "bearer".to_string()
}
