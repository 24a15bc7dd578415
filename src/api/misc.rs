//! Purpose: Unversioned server endpoints: `/version` and `/health`.
//! Exports: `MiscApi`.
//! Invariants: An unhealthy member (503 with the unhealthy body) reports `false`, not an error.
#![allow(clippy::result_large_err)]

use super::client::{EtcdClient, decode};
use crate::core::classify::Family;
use crate::core::error::ApiResult;
use crate::core::request;
use crate::core::stats::Version;
use serde::Deserialize;
use serde_json::Value;

#[derive(Deserialize)]
struct HealthBody {
    health: Value,
}

impl HealthBody {
    // etcd sends the flag as a string ("true"); accept a JSON bool too.
    fn is_healthy(&self) -> bool {
        match &self.health {
            Value::Bool(flag) => *flag,
            Value::String(flag) => flag == "true",
            _ => false,
        }
    }
}

#[derive(Clone, Copy, Debug)]
pub struct MiscApi<'a> {
    client: &'a EtcdClient,
}

impl<'a> MiscApi<'a> {
    pub(crate) fn new(client: &'a EtcdClient) -> Self {
        Self { client }
    }

    pub fn version(&self) -> ApiResult<Version> {
        self.client.call_json(&request::version())
    }

    pub fn health(&self) -> ApiResult<bool> {
        self.client
            .call_classified(&request::health(), Family::Health, |response| {
                decode::<HealthBody>(&response).map(|body| body.is_healthy())
            })
    }
}
