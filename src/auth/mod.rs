//! Route and action gating for the admin console.
//!
//! [`authorize`] is the only place role and permission checks happen. It is
//! a pure function of the session snapshot and a declarative [`Requirement`],
//! so front ends ask it and render the returned [`Decision`].

use serde::Serialize;
use std::fmt;
use std::str::FromStr;

use crate::models::{CrudPermission, Role};
use crate::session::Session;

/// What a protected route or action demands of the signed-in user
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Requirement {
    pub allowed_roles: Option<Vec<Role>>,
    pub module: Option<String>,
    pub permission: Option<CrudPermission>,
}

impl Requirement {
    /// Any signed-in user
    pub fn authenticated() -> Self {
        Self::default()
    }

    pub fn roles(mut self, roles: &[Role]) -> Self {
        self.allowed_roles = Some(roles.to_vec());
        self
    }

    pub fn module(mut self, module: impl Into<String>, permission: CrudPermission) -> Self {
        self.module = Some(module.into());
        self.permission = Some(permission);
        self
    }

    pub fn with_permission(mut self, permission: CrudPermission) -> Self {
        self.permission = Some(permission);
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Decision {
    /// Session still being validated; show a loading state
    Pending,
    Allowed,
    RedirectToLogin,
    RedirectToUnauthorized,
}

impl Decision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, Decision::Allowed)
    }
}

impl fmt::Display for Decision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Decision::Pending => "pending",
            Decision::Allowed => "allowed",
            Decision::RedirectToLogin => "login required",
            Decision::RedirectToUnauthorized => "unauthorized",
        };
        f.write_str(text)
    }
}

/// First matching rule wins.
pub fn authorize(session: &Session, requirement: &Requirement) -> Decision {
    if session.loading {
        return Decision::Pending;
    }

    let Some(user) = &session.user else {
        return Decision::RedirectToLogin;
    };

    if let Some(roles) = &requirement.allowed_roles {
        if !roles.contains(&user.role) {
            return Decision::RedirectToUnauthorized;
        }
    }

    if user.role == Role::SuperAdmin {
        return Decision::Allowed;
    }

    if let (Some(module), Some(permission), Role::Admin) =
        (&requirement.module, requirement.permission, user.role)
    {
        let granted = session
            .permissions
            .iter()
            .flatten()
            .find(|record| &record.module == module)
            .is_some_and(|record| record.allows(permission));

        return if granted {
            Decision::Allowed
        } else {
            Decision::RedirectToUnauthorized
        };
    }

    Decision::Allowed
}

const STAFF: &[Role] = &[Role::SuperAdmin, Role::Admin];

/// Areas of the admin console
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum AdminSection {
    Dashboard,
    Products,
    Categories,
    Orders,
    Inventory,
    Shipments,
    Banners,
    HomeSections,
    Customers,
    AdminUsers,
}

impl AdminSection {
    pub const ALL: [AdminSection; 10] = [
        AdminSection::Dashboard,
        AdminSection::Products,
        AdminSection::Categories,
        AdminSection::Orders,
        AdminSection::Inventory,
        AdminSection::Shipments,
        AdminSection::Banners,
        AdminSection::HomeSections,
        AdminSection::Customers,
        AdminSection::AdminUsers,
    ];

    /// Permission module name used by the backend
    pub fn module(&self) -> &'static str {
        match self {
            AdminSection::Dashboard => "dashboard",
            AdminSection::Products => "products",
            AdminSection::Categories => "categories",
            AdminSection::Orders => "orders",
            AdminSection::Inventory => "inventory",
            AdminSection::Shipments => "shipments",
            AdminSection::Banners => "banners",
            AdminSection::HomeSections => "home-sections",
            AdminSection::Customers => "customers",
            AdminSection::AdminUsers => "admin-users",
        }
    }

    /// Requirement for opening the section. `permission` overrides the
    /// default read check, e.g. `Update` for order status changes.
    pub fn requirement(&self, permission: Option<CrudPermission>) -> Requirement {
        let permission = permission.unwrap_or(CrudPermission::Read);
        match self {
            AdminSection::Dashboard => Requirement::authenticated().roles(STAFF),
            AdminSection::AdminUsers => Requirement::authenticated().roles(&[Role::SuperAdmin]),
            section => Requirement::authenticated()
                .roles(STAFF)
                .module(section.module(), permission),
        }
    }
}

impl fmt::Display for AdminSection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.module())
    }
}

impl FromStr for AdminSection {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase().replace('_', "-");
        AdminSection::ALL
            .into_iter()
            .find(|section| section.module() == wanted)
            .ok_or_else(|| format!("unknown admin section '{}'", s))
    }
}
