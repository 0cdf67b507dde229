use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::Role;

/// A registered marketplace account.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Account {
    pub id: usize,
    pub name: String,
    pub email: String,
    pub role: Role,
    pub phone: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Sign-up payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewAccount {
    pub name: String,
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub role: Role,
    #[serde(default)]
    pub phone: Option<String>,
}

/// Row-level data written to the store when creating an account.
#[derive(Debug, Clone)]
pub struct AccountRecord {
    pub name: String,
    pub email: String,
    pub role: Role,
    pub phone: Option<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountsByRole {
    pub user: usize,
    pub owner: usize,
    pub admin: usize,
}

impl AccountsByRole {
    pub fn add(&mut self, role: Role, count: usize) {
        match role {
            Role::User => self.user += count,
            Role::Owner => self.owner += count,
            Role::Admin => self.admin += count,
        }
    }

    pub fn total(&self) -> usize {
        self.user + self.owner + self.admin
    }
}
