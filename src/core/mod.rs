// Core modules: domain model, request formatting, error envelopes, and failure classification.
pub mod auth;
pub mod classify;
pub mod error;
pub mod error_body;
pub mod member;
pub mod node;
pub mod request;
pub mod stats;
