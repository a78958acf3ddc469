use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    SuperAdmin,
    Admin,
    User,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::SuperAdmin => "SUPER_ADMIN",
            Role::Admin => "ADMIN",
            Role::User => "USER",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    pub email: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    pub role: Role,
    #[serde(default = "default_active")]
    pub is_active: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

fn default_active() -> bool {
    true
}

impl User {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name).trim().to_string()
    }

    /// Only admins carry a per-module permission list
    pub fn needs_permissions(&self) -> bool {
        self.role == Role::Admin
    }
}

/// One CRUD flag of a module permission record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CrudPermission {
    #[serde(rename = "canCreate")]
    Create,
    #[serde(rename = "canRead")]
    Read,
    #[serde(rename = "canUpdate")]
    Update,
    #[serde(rename = "canDelete")]
    Delete,
}

impl CrudPermission {
    pub fn as_str(&self) -> &'static str {
        match self {
            CrudPermission::Create => "canCreate",
            CrudPermission::Read => "canRead",
            CrudPermission::Update => "canUpdate",
            CrudPermission::Delete => "canDelete",
        }
    }
}

impl fmt::Display for CrudPermission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CrudPermission {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "create" | "cancreate" => Ok(CrudPermission::Create),
            "read" | "canread" => Ok(CrudPermission::Read),
            "update" | "canupdate" => Ok(CrudPermission::Update),
            "delete" | "candelete" => Ok(CrudPermission::Delete),
            other => Err(format!("unknown permission '{}'", other)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Permission {
    pub module: String,
    #[serde(default)]
    pub can_create: bool,
    #[serde(default)]
    pub can_read: bool,
    #[serde(default)]
    pub can_update: bool,
    #[serde(default)]
    pub can_delete: bool,
}

impl Permission {
    pub fn allows(&self, permission: CrudPermission) -> bool {
        match permission {
            CrudPermission::Create => self.can_create,
            CrudPermission::Read => self.can_read,
            CrudPermission::Update => self.can_update,
            CrudPermission::Delete => self.can_delete,
        }
    }
}
