//! Purpose: etcd v2 REST client library backing the `etcd-rest` CLI and tests.
//! Exports: `api` (client, config, transport), `core` (request formatting, classification, models).
//! Role: Blocking client; each call is one request/response exchange.
//! Invariants: `core` performs no I/O; all network access goes through `api::Transport`.
pub mod api;
pub mod core;
