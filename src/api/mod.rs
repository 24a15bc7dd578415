//! Purpose: Public Rust API for talking to an etcd v2 cluster.
//! Exports: `EtcdClient`, per-area API handles, config, transport seam, and domain types.
//! Role: Stable surface used by the CLI and integration tests.
//! Invariants: Internal pipeline helpers stay crate-private.

mod auth;
mod client;
mod config;
mod keys;
mod members;
mod misc;
mod roles;
mod stats;
mod transport;
mod users;

pub use crate::core::auth::{
    AuthState, CreateUserOptions, KvPermissions, Permissions, Role, User, UserDetails,
};
#[doc(hidden)]
pub use crate::core::error::to_exit_code;
pub use crate::core::error::{ApiResult, Error, ErrorKind};
pub use crate::core::member::{CreateMember, Member};
pub use crate::core::node::{ErrorMessage, Key, KeyAction, Node};
pub use crate::core::request::{DeleteCondition, KeyOptions, Request, SwapCondition, WaitOptions};
pub use crate::core::stats::{
    FollowerStats, LeaderInfo, LeaderStats, SelfStats, StoreStats, Version,
};
pub use auth::AuthApi;
pub use client::EtcdClient;
pub use config::{
    CREDENTIAL_VARS, ClientConfig, Credentials, DEFAULT_ENDPOINT, ENDPOINT_VARS, TlsMode,
    resolve_credentials, resolve_endpoint,
};
pub use keys::KeysApi;
pub use members::MembersApi;
pub use misc::MiscApi;
pub use roles::RolesApi;
pub use stats::StatsApi;
pub use transport::{HttpTransport, Response, Transport, probe_endpoint};
pub use users::UsersApi;
