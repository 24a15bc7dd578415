//! Purpose: Read-only cluster statistics on `/v2/stats`.
//! Exports: `StatsApi`.
#![allow(clippy::result_large_err)]

use super::client::EtcdClient;
use crate::core::error::ApiResult;
use crate::core::request;
use crate::core::stats::{LeaderStats, SelfStats, StoreStats};

#[derive(Clone, Copy, Debug)]
pub struct StatsApi<'a> {
    client: &'a EtcdClient,
}

impl<'a> StatsApi<'a> {
    pub(crate) fn new(client: &'a EtcdClient) -> Self {
        Self { client }
    }

    /// Only the leader answers; followers respond with an error.
    pub fn leader(&self) -> ApiResult<LeaderStats> {
        self.client.call_json(&request::leader_stats())
    }

    pub fn self_stats(&self) -> ApiResult<SelfStats> {
        self.client.call_json(&request::self_stats())
    }

    pub fn store(&self) -> ApiResult<StoreStats> {
        self.client.call_json(&request::store_stats())
    }
}
