//! Users, the current-user profile, and directory payloads.

use serde::{Serialize, Serializer};

use crate::error::CoreError;
use crate::page::PageQuery;
use crate::roles::{self, PermissionPolicy};
use crate::text::contains_ignore_case;
use crate::types::{DbId, Timestamp};

/// Account status as shown in the user directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum UserStatus {
    Active,
    Disabled,
}

impl UserStatus {
    /// Map the backend's numeric status flag (`1` = enabled).
    pub fn from_flag(flag: i64) -> Self {
        if flag == 1 {
            Self::Active
        } else {
            Self::Disabled
        }
    }

    /// Map a textual status. Numeric strings go through [`Self::from_flag`];
    /// unknown words yield `None`.
    pub fn from_backend(raw: &str) -> Option<Self> {
        let raw = raw.trim();
        if let Ok(flag) = raw.parse::<i64>() {
            return Some(Self::from_flag(flag));
        }
        match raw.to_ascii_lowercase().as_str() {
            "active" | "enabled" | "enable" | "normal" | "true" => Some(Self::Active),
            "disabled" | "disable" | "locked" | "inactive" | "false" => Some(Self::Disabled),
            _ => None,
        }
    }

    pub fn as_flag(self) -> i64 {
        match self {
            Self::Active => 1,
            Self::Disabled => 0,
        }
    }
}

/// A row in the user directory.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct User {
    pub id: DbId,
    pub username: String,
    pub real_name: String,
    pub email: String,
    pub phone: String,
    pub department_id: Option<DbId>,
    pub department_name: String,
    pub role: String,
    pub status: UserStatus,
    pub created_at: Option<Timestamp>,
}

impl User {
    /// Keyword match used by the directory search box.
    pub fn matches_keyword(&self, keyword: &str) -> bool {
        contains_ignore_case(&self.username, keyword)
            || contains_ignore_case(&self.real_name, keyword)
            || contains_ignore_case(&self.email, keyword)
    }
}

/// Filter a directory page client-side by keyword.
pub fn filter_users<'a>(users: &'a [User], keyword: &str) -> Vec<&'a User> {
    users.iter().filter(|u| u.matches_keyword(keyword)).collect()
}

/// The signed-in user, cached by the session store.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UserProfile {
    pub id: DbId,
    pub username: String,
    pub real_name: String,
    pub role: String,
    pub permissions: Vec<String>,
    pub department_name: String,
    pub avatar: Option<String>,
}

impl UserProfile {
    pub fn is_admin(&self) -> bool {
        roles::is_admin(&self.role)
    }

    /// Whether this user may perform `permission` under `policy`.
    pub fn can(&self, policy: PermissionPolicy, permission: &str) -> bool {
        policy.allows(&self.role, &self.permissions, permission)
    }

    /// Name shown in the header: the real name when present.
    pub fn display_name(&self) -> &str {
        if self.real_name.trim().is_empty() {
            &self.username
        } else {
            &self.real_name
        }
    }
}

/// Login form.
#[derive(Debug, Clone, Serialize)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }

    pub fn validate(&self) -> Result<(), CoreError> {
        if self.username.trim().is_empty() {
            return Err(CoreError::Validation("Username is required".into()));
        }
        if self.password.is_empty() {
            return Err(CoreError::Validation("Password is required".into()));
        }
        Ok(())
    }
}

/// Query for the paged user directory.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserQuery {
    #[serde(flatten)]
    pub page: PageQuery,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub keyword: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dept_id: Option<DbId>,
}

/// Payload for `POST /api/users`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateUser {
    pub username: String,
    pub password: String,
    pub real_name: String,
    pub email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(rename = "deptId", skip_serializing_if = "Option::is_none")]
    pub department_id: Option<DbId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role_id: Option<DbId>,
}

impl CreateUser {
    pub fn validate(&self) -> Result<(), CoreError> {
        if self.username.trim().is_empty() {
            return Err(CoreError::Validation("Username is required".into()));
        }
        if self.password.len() < MIN_PASSWORD_LEN {
            return Err(CoreError::Validation(format!(
                "Password must be at least {MIN_PASSWORD_LEN} characters"
            )));
        }
        if self.real_name.trim().is_empty() {
            return Err(CoreError::Validation("Real name is required".into()));
        }
        validate_email(&self.email)
    }
}

/// Payload for `PUT /api/users/{id}`. Absent fields are left unchanged.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateUser {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub real_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(rename = "deptId", skip_serializing_if = "Option::is_none")]
    pub department_id: Option<DbId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role_id: Option<DbId>,
    /// Sent as the numeric flag, see [`UserStatus::as_flag`].
    #[serde(skip_serializing_if = "Option::is_none", serialize_with = "status_flag")]
    pub status: Option<UserStatus>,
}

fn status_flag<S: Serializer>(status: &Option<UserStatus>, s: S) -> Result<S::Ok, S::Error> {
    match status {
        Some(status) => s.serialize_i64(status.as_flag()),
        None => s.serialize_none(),
    }
}

impl UpdateUser {
    pub fn validate(&self) -> Result<(), CoreError> {
        if let Some(email) = &self.email {
            validate_email(email)?;
        }
        if matches!(&self.real_name, Some(name) if name.trim().is_empty()) {
            return Err(CoreError::Validation("Real name must not be blank".into()));
        }
        Ok(())
    }
}

/// Minimum password length accepted by the create-user form.
pub const MIN_PASSWORD_LEN: usize = 6;

/// Shallow email shape check: one `@` with a dotted domain.
pub fn validate_email(email: &str) -> Result<(), CoreError> {
    let email = email.trim();
    let valid = match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && !domain.contains('@')
                && domain.contains('.')
                && !domain.starts_with('.')
                && !domain.ends_with('.')
        }
        None => false,
    };
    if valid {
        Ok(())
    } else {
        Err(CoreError::Validation(format!("Invalid email '{email}'")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(username: &str, real_name: &str, email: &str) -> User {
        User {
            id: 1,
            username: username.into(),
            real_name: real_name.into(),
            email: email.into(),
            phone: String::new(),
            department_id: None,
            department_name: String::new(),
            role: roles::ROLE_EMPLOYEE.into(),
            status: UserStatus::Active,
            created_at: None,
        }
    }

    #[test]
    fn status_flag_mapping() {
        assert_eq!(UserStatus::from_flag(1), UserStatus::Active);
        assert_eq!(UserStatus::from_flag(0), UserStatus::Disabled);
        assert_eq!(UserStatus::from_flag(7), UserStatus::Disabled);
        assert_eq!(UserStatus::Active.as_flag(), 1);
    }

    #[test]
    fn status_words_and_numeric_strings() {
        assert_eq!(UserStatus::from_backend("1"), Some(UserStatus::Active));
        assert_eq!(UserStatus::from_backend(" 0 "), Some(UserStatus::Disabled));
        assert_eq!(UserStatus::from_backend("Active"), Some(UserStatus::Active));
        assert_eq!(UserStatus::from_backend("disabled"), Some(UserStatus::Disabled));
        assert_eq!(UserStatus::from_backend("archived"), None);
    }

    #[test]
    fn update_user_sends_status_as_flag() {
        let payload = UpdateUser {
            status: Some(UserStatus::Disabled),
            ..Default::default()
        };
        let json = serde_json::to_value(&payload).unwrap();
        assert_eq!(json["status"], 0);
        assert!(serde_json::to_value(UpdateUser::default()).unwrap().get("status").is_none());
    }

    #[test]
    fn filter_matches_any_name_field() {
        let users = vec![
            user("azhang", "Alice Zhang", "alice@corp.com"),
            user("bli", "Bob Li", "bob@corp.com"),
        ];
        assert_eq!(filter_users(&users, "ALICE").len(), 1);
        assert_eq!(filter_users(&users, "corp.com").len(), 2);
        assert_eq!(filter_users(&users, "bli")[0].real_name, "Bob Li");
        assert!(filter_users(&users, "carol").is_empty());
    }

    #[test]
    fn email_validation() {
        assert!(validate_email("a@b.com").is_ok());
        assert!(validate_email("a@b").is_err());
        assert!(validate_email("@b.com").is_err());
        assert!(validate_email("a@@b.com").is_err());
        assert!(validate_email("a@.com").is_err());
    }

    #[test]
    fn create_user_requires_fields() {
        let mut payload = CreateUser {
            username: "azhang".into(),
            password: "secret1".into(),
            real_name: "Alice".into(),
            email: "alice@corp.com".into(),
            phone: None,
            department_id: Some(3),
            role_id: None,
        };
        assert!(payload.validate().is_ok());

        payload.password = "123".into();
        let err = payload.validate().unwrap_err();
        assert!(err.to_string().contains("at least"));
    }

    #[test]
    fn create_user_serializes_dept_id() {
        let payload = CreateUser {
            username: "azhang".into(),
            password: "secret1".into(),
            real_name: "Alice".into(),
            email: "alice@corp.com".into(),
            phone: None,
            department_id: Some(3),
            role_id: None,
        };
        let json = serde_json::to_value(&payload).unwrap();
        assert_eq!(json["deptId"], 3);
        assert_eq!(json["realName"], "Alice");
        assert!(json.get("phone").is_none());
    }

    #[test]
    fn update_user_rejects_blank_name() {
        let payload = UpdateUser {
            real_name: Some("  ".into()),
            ..Default::default()
        };
        assert!(payload.validate().is_err());
        assert!(UpdateUser::default().validate().is_ok());
    }

    #[test]
    fn user_query_flattens_paging() {
        let query = UserQuery {
            keyword: Some("ali".into()),
            ..Default::default()
        };
        let json = serde_json::to_value(&query).unwrap();
        assert_eq!(json["current"], 1);
        assert_eq!(json["size"], 10);
        assert_eq!(json["keyword"], "ali");
        assert!(json.get("deptId").is_none());
    }

    #[test]
    fn display_name_falls_back_to_username() {
        let profile = UserProfile {
            id: 1,
            username: "admin".into(),
            real_name: String::new(),
            role: roles::ROLE_ADMIN.into(),
            permissions: vec![],
            department_name: String::new(),
            avatar: None,
        };
        assert_eq!(profile.display_name(), "admin");
        assert!(profile.is_admin());
        assert!(profile.can(PermissionPolicy::RoleBased, "anything"));
    }
}
