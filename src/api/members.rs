//! Purpose: Cluster membership on `/v2/members`.
//! Exports: `MembersApi`.
//! Role: List, add, and remove cluster members.
//! Invariants: Rejected additions come back as a `Member` with only `error_message` set.
#![allow(clippy::result_large_err)]

use super::client::{EtcdClient, decode};
use crate::core::classify::Family;
use crate::core::error::ApiResult;
use crate::core::member::{CreateMember, Member};
use crate::core::request;
use serde::Deserialize;

#[derive(Deserialize)]
struct MemberList {
    #[serde(default)]
    members: Option<Vec<Member>>,
}

#[derive(Clone, Copy, Debug)]
pub struct MembersApi<'a> {
    client: &'a EtcdClient,
}

impl<'a> MembersApi<'a> {
    pub(crate) fn new(client: &'a EtcdClient) -> Self {
        Self { client }
    }

    pub fn list(&self) -> ApiResult<Vec<Member>> {
        let list: MemberList = self.client.call_json(&request::list_members())?;
        Ok(list.members.unwrap_or_default())
    }

    pub fn add(&self, member: &CreateMember) -> ApiResult<Member> {
        let request = request::add_member(member)?;
        self.client
            .call_classified(&request, Family::MemberMutation, |response| decode(&response))
    }

    /// `false` when no member has `id`.
    pub fn delete(&self, id: &str) -> ApiResult<bool> {
        self.client
            .call_classified(&request::delete_member(id), Family::FalseOnNotFound, |_| Ok(true))
            .map_err(|err| err.with_key(id))
    }
}
