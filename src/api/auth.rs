//! Purpose: Auth toggle operations on `/v2/auth/enable`.
//! Exports: `AuthApi`.
//! Role: Reports and flips the cluster-wide auth switch.
//! Invariants: The server is authoritative; success bodies of enable/disable are ignored.
#![allow(clippy::result_large_err)]

use super::client::EtcdClient;
use crate::core::auth::AuthState;
use crate::core::classify::Family;
use crate::core::error::ApiResult;
use crate::core::request;

#[derive(Clone, Copy, Debug)]
pub struct AuthApi<'a> {
    client: &'a EtcdClient,
}

impl<'a> AuthApi<'a> {
    pub(crate) fn new(client: &'a EtcdClient) -> Self {
        Self { client }
    }

    pub fn is_enabled(&self) -> ApiResult<AuthState> {
        self.client.call_json(&request::auth_status())
    }

    /// Requires a root user; without one the result is disabled with an error message.
    pub fn enable(&self) -> ApiResult<AuthState> {
        self.client
            .call_classified(&request::enable_auth(), Family::AuthToggle, |_| {
                Ok(AuthState::enabled())
            })
    }

    pub fn disable(&self) -> ApiResult<AuthState> {
        self.client
            .call_classified(&request::disable_auth(), Family::AuthToggle, |_| {
                Ok(AuthState::disabled())
            })
    }
}

#[cfg(test)]
mod tests {
    use crate::api::client::testing::scripted;
    use crate::core::auth::AuthState;
    use crate::core::error::ErrorKind;
    use crate::core::request::Method;

    #[test]
    fn status_decodes_enabled_flag() {
        let (client, seen) = scripted([(200, r#"{"enabled":true}"#)]);
        assert!(client.auth().is_enabled().expect("state").enabled);
        assert_eq!(seen.lock().expect("seen")[0].method(), Method::Get);
    }

    #[test]
    fn enable_ignores_success_body() {
        let (client, _) = scripted([(200, "")]);
        assert_eq!(client.auth().enable().expect("state"), AuthState::enabled());
    }

    #[test]
    fn enable_without_root_user_reports_error() {
        let body = r#"{"message":"auth: No root user available, please create one"}"#;
        let (client, _) = scripted([(409, body)]);
        let state = client.auth().enable().expect("state");
        assert!(!state.enabled);
        assert_eq!(
            state.error_message.map(|error| error.message).as_deref(),
            Some("auth: No root user available, please create one")
        );
    }

    #[test]
    fn disable_twice_is_not_an_error() {
        let (client, seen) = scripted([(200, ""), (409, r#"{"message":"auth: already disabled"}"#)]);
        assert_eq!(client.auth().disable().expect("first"), AuthState::disabled());
        assert_eq!(client.auth().disable().expect("second"), AuthState::disabled());
        assert_eq!(seen.lock().expect("seen")[1].method(), Method::Delete);
    }

    #[test]
    fn unauthorized_toggle_propagates() {
        let (client, _) = scripted([(401, r#"{"message":"Insufficient credentials"}"#)]);
        let err = client.auth().disable().expect_err("error");
        assert_eq!(err.kind(), ErrorKind::Permission);
    }
}
