//! Purpose: Auth-space records (auth toggle state, roles, users).
//! Exports: `AuthState`, `Role`, `Permissions`, `KvPermissions`, `User`, `UserDetails`,
//! `CreateUserOptions`.
//! Role: Request bodies and response values for `/v2/auth`.
//! Invariants: `error_message` is only set on values synthesized from failure responses.
use super::node::ErrorMessage;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthState {
    pub enabled: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_message: Option<ErrorMessage>,
}

impl AuthState {
    pub fn enabled() -> Self {
        Self {
            enabled: true,
            error_message: None,
        }
    }

    pub fn disabled() -> Self {
        Self {
            enabled: false,
            error_message: None,
        }
    }

    pub fn with_error(mut self, error: ErrorMessage) -> Self {
        self.error_message = Some(error);
        self
    }
}

#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub struct KvPermissions {
    #[serde(default)]
    pub read: Vec<String>,
    #[serde(default)]
    pub write: Vec<String>,
}

#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub struct Permissions {
    #[serde(default)]
    pub kv: KvPermissions,
}

impl Permissions {
    pub fn kv(read: Vec<String>, write: Vec<String>) -> Self {
        Self {
            kv: KvPermissions { read, write },
        }
    }
}

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Role {
    pub role: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub permissions: Option<Permissions>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub grant: Option<Permissions>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub revoke: Option<Permissions>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_message: Option<ErrorMessage>,
}

impl Role {
    pub fn new(role: impl Into<String>) -> Self {
        Self {
            role: role.into(),
            permissions: None,
            grant: None,
            revoke: None,
            error_message: None,
        }
    }

    pub fn with_permissions(mut self, permissions: Permissions) -> Self {
        self.permissions = Some(permissions);
        self
    }

    pub fn with_grant(mut self, grant: Permissions) -> Self {
        self.grant = Some(grant);
        self
    }

    pub fn with_revoke(mut self, revoke: Permissions) -> Self {
        self.revoke = Some(revoke);
        self
    }

    pub fn failed(role: impl Into<String>, error: ErrorMessage) -> Self {
        let mut role = Self::new(role);
        role.error_message = Some(error);
        role
    }
}

/// Response to a user create/update.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub user: String,
    #[serde(default)]
    pub roles: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_message: Option<ErrorMessage>,
}

impl User {
    pub fn failed(user: impl Into<String>, error: ErrorMessage) -> Self {
        Self {
            user: user.into(),
            roles: Vec::new(),
            error_message: Some(error),
        }
    }
}

/// A user as returned by list/get, with roles expanded.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct UserDetails {
    pub user: String,
    #[serde(default)]
    pub roles: Vec<Role>,
}

#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub struct CreateUserOptions {
    pub user: String,
    pub password: String,
    #[serde(default)]
    pub roles: Vec<String>,
    #[serde(default)]
    pub grant: Vec<String>,
    #[serde(default)]
    pub revoke: Vec<String>,
}

impl CreateUserOptions {
    pub fn new(user: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            user: user.into(),
            password: password.into(),
            ..Self::default()
        }
    }

    pub fn with_roles(mut self, roles: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.roles = roles.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_grant(mut self, grant: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.grant = grant.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_revoke(mut self, revoke: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.revoke = revoke.into_iter().map(Into::into).collect();
        self
    }
}
