use std::borrow::Cow;

use serde::{Deserialize, Serialize};

/// Permission identifier.
///
/// Permissions are opaque strings (e.g. "edit_inventory"). The wildcard `"*"`
/// grants everything; the `*_all` permissions imply their narrower
/// counterparts (see [`Permission::implies`]).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Permission(Cow<'static, str>);

pub const VIEW_ALL: &str = "view_all";
pub const EDIT_ALL: &str = "edit_all";
pub const DELETE_ALL: &str = "delete_all";
pub const MANAGE_USERS: &str = "manage_users";
pub const MANAGE_WAREHOUSES: &str = "manage_warehouses";
pub const VIEW_REPORTS: &str = "view_reports";
pub const EXPORT_DATA: &str = "export_data";
pub const MANAGE_API: &str = "manage_api";
pub const SYSTEM_SETTINGS: &str = "system_settings";
pub const EDIT_INVENTORY: &str = "edit_inventory";
pub const ADD_INVENTORY: &str = "add_inventory";
pub const MANAGE_WAREHOUSE_ASSIGNED: &str = "manage_warehouse_assigned";
pub const VIEW_INVENTORY: &str = "view_inventory";
pub const UPDATE_STOCK: &str = "update_stock";
pub const VIEW_ALERTS: &str = "view_alerts";

impl Permission {
    pub const fn from_static(name: &'static str) -> Self {
        Self(Cow::Borrowed(name))
    }

    pub fn new(name: impl Into<Cow<'static, str>>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_wildcard(&self) -> bool {
        self.as_str() == "*"
    }

    /// Whether holding `self` satisfies a requirement for `required`.
    pub fn implies(&self, required: &Permission) -> bool {
        if self.is_wildcard() || self == required {
            return true;
        }
        match self.as_str() {
            VIEW_ALL => matches!(required.as_str(), VIEW_INVENTORY | VIEW_ALERTS),
            EDIT_ALL => matches!(
                required.as_str(),
                EDIT_INVENTORY | ADD_INVENTORY | UPDATE_STOCK | MANAGE_WAREHOUSES
            ),
            EDIT_INVENTORY => required.as_str() == UPDATE_STOCK,
            _ => false,
        }
    }
}

impl core::fmt::Display for Permission {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn broad_permissions_imply_narrow_ones() {
        let view_all = Permission::from_static(VIEW_ALL);
        assert!(view_all.implies(&Permission::from_static(VIEW_INVENTORY)));
        assert!(!view_all.implies(&Permission::from_static(EDIT_INVENTORY)));
        assert!(Permission::new("*").implies(&Permission::from_static(MANAGE_USERS)));
        assert!(
            Permission::from_static(EDIT_INVENTORY).implies(&Permission::from_static(UPDATE_STOCK))
        );
    }
}
