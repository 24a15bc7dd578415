//! Purpose: User management on `/v2/auth/users`.
//! Exports: `UsersApi`.
//! Role: Create/update, list, fetch, and delete users.
#![allow(clippy::result_large_err)]

use super::client::{EtcdClient, decode};
use crate::core::auth::{CreateUserOptions, User, UserDetails};
use crate::core::classify::Family;
use crate::core::error::ApiResult;
use crate::core::request;
use serde::Deserialize;

#[derive(Deserialize)]
struct UserList {
    #[serde(default)]
    users: Option<Vec<UserDetails>>,
}

#[derive(Clone, Copy, Debug)]
pub struct UsersApi<'a> {
    client: &'a EtcdClient,
}

impl<'a> UsersApi<'a> {
    pub(crate) fn new(client: &'a EtcdClient) -> Self {
        Self { client }
    }

    /// A name conflict comes back as a `User` carrying only the name and error message.
    pub fn create(&self, options: &CreateUserOptions) -> ApiResult<User> {
        let request = request::create_user(options)?;
        self.client
            .call_classified(&request, Family::UserCreate, |response| decode(&response))
            .map_err(|err| err.with_key(options.user.as_str()))
    }

    pub fn list(&self) -> ApiResult<Vec<UserDetails>> {
        let list: UserList = self.client.call_json(&request::list_users())?;
        Ok(list.users.unwrap_or_default())
    }

    pub fn get(&self, user: &str) -> ApiResult<Option<UserDetails>> {
        self.client
            .call_classified(&request::get_user(user), Family::AbsentOnNotFound, |response| {
                decode(&response).map(Some)
            })
            .map_err(|err| err.with_key(user))
    }

    pub fn delete(&self, user: &str) -> ApiResult<bool> {
        self.client
            .call_classified(&request::delete_user(user), Family::FalseOnNotFound, |_| Ok(true))
            .map_err(|err| err.with_key(user))
    }
}

#[cfg(test)]
mod tests {
    use crate::api::client::testing::scripted;
    use crate::core::auth::CreateUserOptions;
    use crate::core::request::Body;
    use serde_json::json;

    #[test]
    fn create_posts_options_as_json() {
        let (client, seen) = scripted([(201, r#"{"user":"alice","roles":["rkt"]}"#)]);
        let options = CreateUserOptions::new("alice", "secret").with_roles(["rkt"]);
        let user = client.users().create(&options).expect("user");
        assert_eq!(user.roles, vec!["rkt".to_string()]);
        let seen = seen.lock().expect("seen");
        assert_eq!(seen[0].describe(), "/v2/auth/users/alice");
        assert_eq!(
            seen[0].body(),
            &Body::Json(json!({
                "user": "alice",
                "password": "secret",
                "roles": ["rkt"],
                "grant": [],
                "revoke": []
            }))
        );
    }

    #[test]
    fn create_existing_user_returns_conflict_value() {
        let (client, _) = scripted([(409, r#"{"message":"User alice already exists."}"#)]);
        let user = client
            .users()
            .create(&CreateUserOptions::new("alice", "secret"))
            .expect("user");
        assert_eq!(user.user, "alice");
        assert!(user.error_message.is_some());
    }

    #[test]
    fn list_get_and_delete() {
        let (client, _) = scripted([
            (200, r#"{"users":[{"user":"root","roles":[{"role":"root"}]}]}"#),
            (200, r#"{"users":null}"#),
            (404, ""),
            (200, ""),
        ]);
        let users = client.users().list().expect("list");
        assert_eq!(users[0].roles[0].role, "root");
        assert!(client.users().list().expect("empty list").is_empty());
        assert_eq!(client.users().get("bob").expect("lookup"), None);
        assert!(client.users().delete("bob").expect("delete"));
    }
}
