//! Roles and permissions
//!
//! Legacy clients send permission ids in several spellings
//! (`view-dashboard`, `VIEW_DASHBOARD`, `update-tank-levels`, ...).
//! They are translated once, at the boundary, into [`Permission`].

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

/// Canonical permission kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Permission {
    ViewDashboard,
    ViewAnalytics,
    ViewReports,
    ManageUsers,
    ManageTasks,
    AssignTasks,
    AcknowledgeAlerts,
    ManageSystem,
    UpdateLevels,
    AddTanks,
    AddGenerators,
    DeleteData,
    CompleteTask,
    ManageDevices,
    ViewAssignedTasks,
}

impl Permission {
    pub const ALL: [Permission; 15] = [
        Permission::ViewDashboard,
        Permission::ViewAnalytics,
        Permission::ViewReports,
        Permission::ManageUsers,
        Permission::ManageTasks,
        Permission::AssignTasks,
        Permission::AcknowledgeAlerts,
        Permission::ManageSystem,
        Permission::UpdateLevels,
        Permission::AddTanks,
        Permission::AddGenerators,
        Permission::DeleteData,
        Permission::CompleteTask,
        Permission::ManageDevices,
        Permission::ViewAssignedTasks,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Permission::ViewDashboard => "view_dashboard",
            Permission::ViewAnalytics => "view_analytics",
            Permission::ViewReports => "view_reports",
            Permission::ManageUsers => "manage_users",
            Permission::ManageTasks => "manage_tasks",
            Permission::AssignTasks => "assign_tasks",
            Permission::AcknowledgeAlerts => "acknowledge_alerts",
            Permission::ManageSystem => "manage_system",
            Permission::UpdateLevels => "update_levels",
            Permission::AddTanks => "add_tanks",
            Permission::AddGenerators => "add_generators",
            Permission::DeleteData => "delete_data",
            Permission::CompleteTask => "complete_task",
            Permission::ManageDevices => "manage_devices",
            Permission::ViewAssignedTasks => "view_assigned_tasks",
        }
    }

    /// Translate a legacy permission string into its canonical kind
    ///
    /// Trims, lowercases, resolves the known aliases, then maps hyphens to
    /// underscores. Returns `None` for unknown ids (and for the `*`
    /// wildcard, which is handled by [`Grants`]).
    pub fn normalize(raw: &str) -> Option<Self> {
        let p = raw.trim().to_lowercase();
        let canonical = match p.as_str() {
            "update-tank-levels" | "update-generator-levels" | "update" => "update_levels",
            other => return Self::lookup(&other.replace('-', "_")),
        };
        Self::lookup(canonical)
    }

    fn lookup(canonical: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|p| p.as_str() == canonical)
    }
}

impl fmt::Display for Permission {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Permission {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::normalize(s).ok_or_else(|| format!("unknown permission '{}'", s))
    }
}

/// User role
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Root,
    Manager,
    Supervisor,
    Operator,
}

impl Role {
    /// Permissions granted to a role when the user record has none of its own
    pub fn default_grants(&self) -> Grants {
        use Permission::*;
        match self {
            Role::Root => Grants::All,
            Role::Manager => Grants::from_iter([
                ViewDashboard,
                ViewAnalytics,
                ViewReports,
                ManageUsers,
                ManageTasks,
                ManageDevices,
                AcknowledgeAlerts,
                UpdateLevels,
                AddGenerators,
            ]),
            Role::Supervisor => Grants::from_iter([
                ViewDashboard,
                ViewAnalytics,
                ViewReports,
                ManageTasks,
                AcknowledgeAlerts,
                UpdateLevels,
            ]),
            Role::Operator => Grants::from_iter([
                ViewDashboard,
                ViewAssignedTasks,
                UpdateLevels,
                AcknowledgeAlerts,
            ]),
        }
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "root" => Ok(Role::Root),
            "manager" => Ok(Role::Manager),
            "supervisor" => Ok(Role::Supervisor),
            "operator" => Ok(Role::Operator),
            other => Err(format!("unknown role '{}'", other)),
        }
    }
}

/// Set of granted permissions
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Grants {
    /// Wildcard (`*`)
    All,
    Only(HashSet<Permission>),
}

impl Grants {
    /// Parse a user's stored permission strings; unknown entries are dropped
    pub fn from_legacy<'a>(raw: impl IntoIterator<Item = &'a str>) -> Self {
        let mut set = HashSet::new();
        for entry in raw {
            if entry.trim() == "*" {
                return Grants::All;
            }
            match Permission::normalize(entry) {
                Some(p) => {
                    set.insert(p);
                }
                None => tracing::debug!(permission = entry, "Dropping unknown permission"),
            }
        }
        Grants::Only(set)
    }

    pub fn allows(&self, permission: Permission) -> bool {
        match self {
            Grants::All => true,
            Grants::Only(set) => set.contains(&permission),
        }
    }
}

impl FromIterator<Permission> for Grants {
    fn from_iter<T: IntoIterator<Item = Permission>>(iter: T) -> Self {
        Grants::Only(iter.into_iter().collect())
    }
}

/// Effective access check: root always passes, otherwise the grant set decides
pub fn has_permission(role: Role, grants: &Grants, permission: Permission) -> bool {
    role == Role::Root || grants.allows(permission)
}

/// A user declared in the seed file
///
/// `permissions` keeps the stored legacy strings; when absent the role's
/// defaults apply.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SiteUser {
    pub name: String,
    pub role: Role,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub permissions: Option<Vec<String>>,
}

impl SiteUser {
    pub fn grants(&self) -> Grants {
        match &self.permissions {
            Some(raw) => Grants::from_legacy(raw.iter().map(String::as_str)),
            None => self.role.default_grants(),
        }
    }

    pub fn can(&self, permission: Permission) -> bool {
        has_permission(self.role, &self.grants(), permission)
    }
}
