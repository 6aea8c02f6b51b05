use core::str::FromStr;

use serde::{Deserialize, Serialize};

use stockroom_core::DomainError;

use crate::permissions::{self, Permission};

/// Role used for RBAC. Higher levels supersede lower ones.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Manager,
    Employee,
}

const ADMIN_PERMISSIONS: &[&str] = &[
    permissions::VIEW_ALL,
    permissions::EDIT_ALL,
    permissions::DELETE_ALL,
    permissions::MANAGE_USERS,
    permissions::MANAGE_WAREHOUSES,
    permissions::VIEW_REPORTS,
    permissions::EXPORT_DATA,
    permissions::MANAGE_API,
    permissions::SYSTEM_SETTINGS,
];

const MANAGER_PERMISSIONS: &[&str] = &[
    permissions::VIEW_ALL,
    permissions::EDIT_INVENTORY,
    permissions::ADD_INVENTORY,
    permissions::VIEW_REPORTS,
    permissions::EXPORT_DATA,
    permissions::MANAGE_WAREHOUSE_ASSIGNED,
];

const EMPLOYEE_PERMISSIONS: &[&str] = &[
    permissions::VIEW_INVENTORY,
    permissions::UPDATE_STOCK,
    permissions::VIEW_ALERTS,
];

impl Role {
    pub const ALL: [Role; 3] = [Role::Admin, Role::Manager, Role::Employee];

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Manager => "manager",
            Role::Employee => "employee",
        }
    }

    pub fn level(&self) -> u8 {
        match self {
            Role::Admin => 3,
            Role::Manager => 2,
            Role::Employee => 1,
        }
    }

    pub fn permissions(&self) -> Vec<Permission> {
        let names = match self {
            Role::Admin => ADMIN_PERMISSIONS,
            Role::Manager => MANAGER_PERMISSIONS,
            Role::Employee => EMPLOYEE_PERMISSIONS,
        };
        names.iter().copied().map(Permission::from_static).collect()
    }

    /// An actor may grant its own role or any lower one, never a higher one.
    pub fn can_assign(&self, target: Role) -> bool {
        self.level() >= target.level()
    }
}

impl core::fmt::Display for Role {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "admin" => Ok(Role::Admin),
            "manager" => Ok(Role::Manager),
            "employee" => Ok(Role::Employee),
            other => Err(DomainError::validation(format!(
                "invalid role '{other}': expected admin, manager or employee"
            ))),
        }
    }
}
