//! Purpose: Role management on `/v2/auth/roles`.
//! Exports: `RolesApi`.
//! Role: Create/update, list, fetch, and delete roles.
#![allow(clippy::result_large_err)]

use super::client::{EtcdClient, decode};
use crate::core::auth::Role;
use crate::core::classify::Family;
use crate::core::error::ApiResult;
use crate::core::request;
use serde::Deserialize;

#[derive(Deserialize)]
struct RoleList {
    #[serde(default)]
    roles: Option<Vec<Role>>,
}

#[derive(Clone, Copy, Debug)]
pub struct RolesApi<'a> {
    client: &'a EtcdClient,
}

impl<'a> RolesApi<'a> {
    pub(crate) fn new(client: &'a EtcdClient) -> Self {
        Self { client }
    }

    /// Create `role`, or apply its `grant`/`revoke` to an existing one.
    ///
    /// A name conflict comes back as a `Role` carrying only the name and error message.
    pub fn create(&self, role: &Role) -> ApiResult<Role> {
        let request = request::create_role(role)?;
        self.client
            .call_classified(&request, Family::RoleCreate, |response| decode(&response))
            .map_err(|err| err.with_key(role.role.as_str()))
    }

    pub fn list(&self) -> ApiResult<Vec<Role>> {
        let list: RoleList = self.client.call_json(&request::list_roles())?;
        Ok(list.roles.unwrap_or_default())
    }

    /// `None` when the role does not exist.
    pub fn get(&self, role: &str) -> ApiResult<Option<Role>> {
        self.client
            .call_classified(&request::get_role(role), Family::AbsentOnNotFound, |response| {
                decode(&response).map(Some)
            })
            .map_err(|err| err.with_key(role))
    }

    /// `false` when the role was already gone.
    pub fn delete(&self, role: &str) -> ApiResult<bool> {
        self.client
            .call_classified(&request::delete_role(role), Family::FalseOnNotFound, |_| Ok(true))
            .map_err(|err| err.with_key(role))
    }
}
