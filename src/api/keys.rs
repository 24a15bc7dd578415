//! Purpose: Key-space operations (`/v2/keys`): values, in-order queues, watches, CAS/CAD, dirs.
//! Exports: `KeysApi`.
//! Role: Pairs each request builder with its fallback family.
//! Invariants: Expected misses ("Key not found", "Compare failed", ...) return a `Key` whose
//! `error_message` is set; they never surface as `Err`.
//! Invariants: Errors carry the key they were issued for.
//! Invariants: A 2xx body that decodes to an empty `Key` is an `Internal` error.
#![allow(clippy::result_large_err)]

use super::client::{EtcdClient, decode};
use super::transport::Response;
use crate::core::classify::Family;
use crate::core::error::{ApiResult, Error, ErrorKind};
use crate::core::node::Key;
use crate::core::request::{
    self, DeleteCondition, KeyOptions, Request, SwapCondition, WaitOptions,
};

#[derive(Clone, Copy, Debug)]
pub struct KeysApi<'a> {
    client: &'a EtcdClient,
}

impl<'a> KeysApi<'a> {
    pub(crate) fn new(client: &'a EtcdClient) -> Self {
        Self { client }
    }

    pub fn create_key(&self, key: &str, value: &str) -> ApiResult<Key> {
        self.create_key_with_options(key, value, &KeyOptions::new())
    }

    pub fn create_key_with_options(
        &self,
        key: &str,
        value: &str,
        options: &KeyOptions,
    ) -> ApiResult<Key> {
        self.plain(key, &request::create_key(key, value, options))
    }

    pub fn create_in_order_key(&self, key: &str, value: &str) -> ApiResult<Key> {
        self.create_in_order_key_with_options(key, value, &KeyOptions::new())
    }

    pub fn create_in_order_key_with_options(
        &self,
        key: &str,
        value: &str,
        options: &KeyOptions,
    ) -> ApiResult<Key> {
        self.plain(key, &request::create_in_order_key(key, value, options))
    }

    /// Children of an in-order key, sorted by creation index.
    pub fn list_in_order_key(&self, key: &str) -> ApiResult<Key> {
        self.lookup(key, &request::list_in_order_key(key))
    }

    pub fn get_key(&self, key: &str) -> ApiResult<Key> {
        self.lookup(key, &request::get_key(key))
    }

    pub fn delete_key(&self, key: &str) -> ApiResult<Key> {
        self.lookup(key, &request::delete_key(key))
    }

    /// Block until `key` next changes.
    pub fn wait_key(&self, key: &str) -> ApiResult<Key> {
        self.wait_key_with_options(key, &WaitOptions::new())
    }

    pub fn wait_key_with_options(&self, key: &str, options: &WaitOptions) -> ApiResult<Key> {
        self.lookup(key, &request::wait_key(key, options))
    }

    pub fn compare_and_delete_key(&self, key: &str, condition: &DeleteCondition) -> ApiResult<Key> {
        self.compare(key, &request::compare_and_delete_key(key, condition))
    }

    pub fn compare_and_delete_key_value(&self, key: &str, prev_value: &str) -> ApiResult<Key> {
        self.compare_and_delete_key(key, &DeleteCondition::PrevValue(prev_value.to_string()))
    }

    pub fn compare_and_delete_key_index(&self, key: &str, prev_index: u64) -> ApiResult<Key> {
        self.compare_and_delete_key(key, &DeleteCondition::PrevIndex(prev_index))
    }

    pub fn compare_and_swap_key(
        &self,
        key: &str,
        condition: &SwapCondition,
        value: &str,
    ) -> ApiResult<Key> {
        self.compare(key, &request::compare_and_swap_key(key, condition, value))
    }

    pub fn compare_and_swap_key_value(
        &self,
        key: &str,
        prev_value: &str,
        value: &str,
    ) -> ApiResult<Key> {
        let condition = SwapCondition::PrevValue(prev_value.to_string());
        self.compare_and_swap_key(key, &condition, value)
    }

    pub fn compare_and_swap_key_index(
        &self,
        key: &str,
        prev_index: u64,
        value: &str,
    ) -> ApiResult<Key> {
        self.compare_and_swap_key(key, &SwapCondition::PrevIndex(prev_index), value)
    }

    /// `prev_exist == false` creates only if absent; `true` updates only if present.
    pub fn compare_and_swap_key_exist(
        &self,
        key: &str,
        prev_exist: bool,
        value: &str,
    ) -> ApiResult<Key> {
        self.compare_and_swap_key(key, &SwapCondition::PrevExist(prev_exist), value)
    }

    pub fn create_dir(&self, dir: &str) -> ApiResult<Key> {
        self.create_dir_with_options(dir, &KeyOptions::new())
    }

    pub fn create_dir_with_options(&self, dir: &str, options: &KeyOptions) -> ApiResult<Key> {
        self.classified(dir, &request::create_dir(dir, options), Family::DirCreate)
    }

    pub fn list_dir(&self, dir: &str, recursive: bool) -> ApiResult<Key> {
        self.lookup(dir, &request::list_dir(dir, recursive))
    }

    pub fn delete_dir(&self, dir: &str) -> ApiResult<Key> {
        self.lookup(dir, &request::delete_dir(dir))
    }

    fn plain(&self, key: &str, request: &Request) -> ApiResult<Key> {
        self.client
            .exchange(request)
            .and_then(|response| {
                if !response.is_success() {
                    return Err(Error::from_status(response.status, response.body));
                }
                decode_key(&response)
            })
            .map_err(|err| err.with_key(key))
    }

    fn lookup(&self, key: &str, request: &Request) -> ApiResult<Key> {
        self.classified(key, request, Family::KeyLookup)
    }

    fn compare(&self, key: &str, request: &Request) -> ApiResult<Key> {
        self.classified(key, request, Family::KeyCompare)
    }

    fn classified(&self, key: &str, request: &Request, family: Family) -> ApiResult<Key> {
        self.client
            .call_classified(request, family, |response| decode_key(&response))
            .map_err(|err| err.with_key(key))
    }
}

fn decode_key(response: &Response) -> ApiResult<Key> {
    let key: Key = decode(response)?;
    if key.is_empty() {
        return Err(Error::new(ErrorKind::Internal)
            .with_message("etcd response carries no key result")
            .with_status(response.status)
            .with_body(response.body.clone()));
    }
    Ok(key)
}
