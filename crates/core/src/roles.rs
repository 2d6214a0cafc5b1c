//! Well-known role names and the client-side permission check.
//!
//! Role names must match the `code` column the backend returns for roles.

pub const ROLE_ADMIN: &str = "admin";
pub const ROLE_MANAGER: &str = "manager";
pub const ROLE_EMPLOYEE: &str = "employee";

/// Manage user accounts: create, edit, delete, reset passwords.
pub const PERM_USER_MANAGE: &str = "user:manage";
/// Manage the department tree.
pub const PERM_DEPT_MANAGE: &str = "dept:manage";
/// Manage meeting rooms.
pub const PERM_ROOM_MANAGE: &str = "meeting-room:manage";
/// Approve or reject workflow tasks.
pub const PERM_WORKFLOW_APPROVE: &str = "workflow:approve";

/// How the console decides whether the current user may perform an action.
///
/// The backend remains the authority for every write; this only drives
/// which actions the console offers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PermissionPolicy {
    /// Admins get everything and so does every other role. This is the
    /// behavior operators currently rely on.
    #[default]
    AllowAll,
    /// Admins get everything; other roles need the permission code in
    /// their profile's permission list.
    RoleBased,
}

impl PermissionPolicy {
    /// Parse the `OA_ENFORCE_PERMISSIONS` flag value.
    pub fn from_enforce_flag(enforce: bool) -> Self {
        if enforce {
            Self::RoleBased
        } else {
            Self::AllowAll
        }
    }

    /// Decide whether a user with `role` and `granted` permissions holds
    /// `required`.
    pub fn allows(&self, role: &str, granted: &[String], required: &str) -> bool {
        if is_admin(role) {
            return true;
        }
        match self {
            Self::AllowAll => true,
            Self::RoleBased => granted.iter().any(|p| p == required || p == "*"),
        }
    }
}

/// Whether a role name denotes an administrator.
pub fn is_admin(role: &str) -> bool {
    role.eq_ignore_ascii_case(ROLE_ADMIN)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn admin_is_allowed_under_both_policies() {
        assert!(PermissionPolicy::AllowAll.allows(ROLE_ADMIN, &[], "user:delete"));
        assert!(PermissionPolicy::RoleBased.allows("ADMIN", &[], "user:delete"));
    }

    #[test]
    fn allow_all_grants_non_admins() {
        assert!(PermissionPolicy::AllowAll.allows(ROLE_EMPLOYEE, &[], "user:delete"));
    }

    #[test]
    fn role_based_requires_grant() {
        let granted = vec!["workflow:approve".to_string()];
        let policy = PermissionPolicy::RoleBased;
        assert!(policy.allows(ROLE_MANAGER, &granted, "workflow:approve"));
        assert!(!policy.allows(ROLE_MANAGER, &granted, "user:delete"));
    }

    #[test]
    fn wildcard_grant_allows_everything() {
        let granted = vec!["*".to_string()];
        assert!(PermissionPolicy::RoleBased.allows(ROLE_EMPLOYEE, &granted, "user:delete"));
    }

    #[test]
    fn enforce_flag_selects_policy() {
        assert_eq!(PermissionPolicy::from_enforce_flag(false), PermissionPolicy::AllowAll);
        assert_eq!(PermissionPolicy::from_enforce_flag(true), PermissionPolicy::RoleBased);
    }
}
