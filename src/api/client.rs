//! Purpose: Public etcd v2 client handle and the shared request/response pipeline.
//! Exports: `EtcdClient`.
//! Role: Owns the transport; feature APIs borrow it and add per-operation fallback families.
//! Invariants: 2xx bodies decode directly; non-2xx go through `classify` exactly once.
//! Invariants: Unclassified failures keep the HTTP status and raw body.
//! Invariants: The handle is immutable and cheap to clone across threads.
#![allow(clippy::result_large_err)]

use super::auth::AuthApi;
use super::config::ClientConfig;
use super::keys::KeysApi;
use super::members::MembersApi;
use super::misc::MiscApi;
use super::roles::RolesApi;
use super::stats::StatsApi;
use super::transport::{HttpTransport, Response, Transport};
use super::users::UsersApi;
use crate::core::classify::{Family, Recover, classify};
use crate::core::error::{ApiResult, Error, ErrorKind};
use crate::core::request::Request;
use serde::de::DeserializeOwned;
use std::fmt;
use std::sync::Arc;

#[derive(Clone)]
pub struct EtcdClient {
    inner: Arc<ClientInner>,
}

struct ClientInner {
    transport: Box<dyn Transport>,
}

impl EtcdClient {
    pub fn new(config: ClientConfig) -> ApiResult<Self> {
        Ok(Self::with_transport(HttpTransport::new(&config)?))
    }

    /// Client for the endpoint and credentials found in the environment.
    pub fn from_env() -> ApiResult<Self> {
        Self::new(ClientConfig::from_env())
    }

    pub fn with_transport(transport: impl Transport + 'static) -> Self {
        Self {
            inner: Arc::new(ClientInner {
                transport: Box::new(transport),
            }),
        }
    }

    pub fn keys(&self) -> KeysApi<'_> {
        KeysApi::new(self)
    }

    pub fn auth(&self) -> AuthApi<'_> {
        AuthApi::new(self)
    }

    pub fn roles(&self) -> RolesApi<'_> {
        RolesApi::new(self)
    }

    pub fn users(&self) -> UsersApi<'_> {
        UsersApi::new(self)
    }

    pub fn members(&self) -> MembersApi<'_> {
        MembersApi::new(self)
    }

    pub fn stats(&self) -> StatsApi<'_> {
        StatsApi::new(self)
    }

    pub fn misc(&self) -> MiscApi<'_> {
        MiscApi::new(self)
    }

    pub(crate) fn exchange(&self, request: &Request) -> ApiResult<Response> {
        request.check_segments()?;
        let response = self.inner.transport.execute(request)?;
        tracing::debug!(
            method = request.method().as_str(),
            target = %request.describe(),
            status = response.status,
            "etcd exchange"
        );
        Ok(response)
    }

    /// Decode a 2xx body as `T`; anything else is an error.
    pub(crate) fn call_json<T: DeserializeOwned>(&self, request: &Request) -> ApiResult<T> {
        let response = self.exchange(request)?;
        if !response.is_success() {
            return Err(Error::from_status(response.status, response.body));
        }
        decode(&response)
    }

    /// Run `request`; on failure, let `family` turn expected conditions into a value.
    pub(crate) fn call_classified<T: Recover>(
        &self,
        request: &Request,
        family: Family,
        on_success: impl FnOnce(Response) -> ApiResult<T>,
    ) -> ApiResult<T> {
        let response = self.exchange(request)?;
        if response.is_success() {
            return on_success(response);
        }
        match classify(family, response.status, &response.body).and_then(T::recover) {
            Some(value) => {
                tracing::debug!(
                    ?family,
                    status = response.status,
                    target = %request.describe(),
                    "classified etcd failure"
                );
                Ok(value)
            }
            None => Err(Error::from_status(response.status, response.body)),
        }
    }
}

impl fmt::Debug for EtcdClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EtcdClient").finish_non_exhaustive()
    }
}

pub(crate) fn decode<T: DeserializeOwned>(response: &Response) -> ApiResult<T> {
    serde_json::from_str(&response.body).map_err(|err| {
        Error::new(ErrorKind::Internal)
            .with_message("failed to decode etcd response")
            .with_status(response.status)
            .with_body(response.body.clone())
            .with_source(err)
    })
}

#[cfg(test)]
pub(crate) mod testing {
    use super::EtcdClient;
    use crate::api::transport::{Response, Transport};
    use crate::core::error::{ApiResult, Error, ErrorKind};
    use crate::core::request::Request;
    use std::collections::VecDeque;
    use std::sync::{Arc, Mutex};

    /// Replays canned responses in order and records every request.
    pub(crate) struct ScriptedTransport {
        responses: Mutex<VecDeque<Response>>,
        seen: Arc<Mutex<Vec<Request>>>,
    }

    impl Transport for ScriptedTransport {
        fn execute(&self, request: &Request) -> ApiResult<Response> {
            self.seen.lock().expect("seen lock").push(request.clone());
            self.responses
                .lock()
                .expect("responses lock")
                .pop_front()
                .ok_or_else(|| {
                    Error::new(ErrorKind::Io).with_message("no scripted response left")
                })
        }
    }

    pub(crate) fn scripted(
        responses: impl IntoIterator<Item = (u16, &'static str)>,
    ) -> (EtcdClient, Arc<Mutex<Vec<Request>>>) {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let transport = ScriptedTransport {
            responses: Mutex::new(
                responses
                    .into_iter()
                    .map(|(status, body)| Response::new(status, body))
                    .collect(),
            ),
            seen: Arc::clone(&seen),
        };
        (EtcdClient::with_transport(transport), seen)
    }
}
