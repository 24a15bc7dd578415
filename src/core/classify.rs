//! Purpose: Turn expected non-2xx responses into typed results instead of errors.
//! Exports: `Family`, `Fallback`, `Recover`, `classify`.
//! Role: Single dispatch over a closed set of (predicate, synthesizer) pairs per operation family.
//! Invariants: Predicates only inspect status and raw body; no request state is consulted.
//! Invariants: A predicate whose envelope fails to parse declines, so the failure propagates.
//! Invariants: `None` from `classify` means the original failure must propagate unchanged.
use super::auth::{AuthState, Role, User};
use super::error_body::{parse_full, parse_reduced, role_conflict, user_conflict};
use super::member::Member;
use super::node::Key;

/// Exact body etcd sends with a 503 from `/health` when the member is unhealthy.
pub const UNHEALTHY_BODY: &str = r#"{"health": "false"}"#;

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Family {
    /// get, delete, wait, ordered list, dir list, dir delete.
    KeyLookup,
    DirCreate,
    /// compare-and-swap, compare-and-delete.
    KeyCompare,
    Health,
    MemberMutation,
    RoleCreate,
    UserCreate,
    /// auth enable/disable.
    AuthToggle,
    /// Single-entity reads where 404 means "no such entity".
    AbsentOnNotFound,
    /// Deletes that report `false` when the entity is already gone.
    FalseOnNotFound,
}

#[derive(Clone, Debug, PartialEq)]
pub enum Fallback {
    Key(Key),
    Member(Member),
    Role(Role),
    User(User),
    AuthState(AuthState),
    Flag(bool),
    Absent,
}

pub fn classify(family: Family, status: u16, body: &str) -> Option<Fallback> {
    match family {
        Family::KeyLookup => key_on(body, &["Key not found"]),
        Family::DirCreate => key_on(body, &["Not a file"]),
        Family::KeyCompare => key_on(body, &["Compare failed", "Key already exists"]),
        Family::Health => {
            (status == 503 && body.trim() == UNHEALTHY_BODY).then_some(Fallback::Flag(false))
        }
        Family::MemberMutation => {
            if !body.contains("message") {
                return None;
            }
            let error = parse_reduced(body).ok()?;
            Some(Fallback::Member(Member::failed(error)))
        }
        Family::RoleCreate => {
            if !body.contains("already exists") {
                return None;
            }
            let error = parse_reduced(body).ok()?;
            let name = role_conflict(&error.message)?;
            Some(Fallback::Role(Role::failed(name, error)))
        }
        Family::UserCreate => {
            if !body.contains("already exists") {
                return None;
            }
            let error = parse_reduced(body).ok()?;
            let name = user_conflict(&error.message)?;
            Some(Fallback::User(User::failed(name, error)))
        }
        Family::AuthToggle => auth_state_on(body),
        Family::AbsentOnNotFound => (status == 404).then_some(Fallback::Absent),
        Family::FalseOnNotFound => (status == 404).then_some(Fallback::Flag(false)),
    }
}

fn key_on(body: &str, needles: &[&str]) -> Option<Fallback> {
    if !needles.iter().any(|needle| body.contains(needle)) {
        return None;
    }
    let error = parse_full(body).ok()?;
    Some(Fallback::Key(Key::failed(error)))
}

fn auth_state_on(body: &str) -> Option<Fallback> {
    if body.contains("auth: No root user available") {
        let error = parse_reduced(body).ok()?;
        return Some(Fallback::AuthState(AuthState::disabled().with_error(error)));
    }
    if body.contains("auth: already disabled") {
        return Some(Fallback::AuthState(AuthState::disabled()));
    }
    if body.contains("auth: already enabled") {
        return Some(Fallback::AuthState(AuthState::enabled()));
    }
    None
}

/// Projection of a `Fallback` onto an operation's return type.
pub trait Recover: Sized {
    fn recover(fallback: Fallback) -> Option<Self>;
}

impl Recover for Key {
    fn recover(fallback: Fallback) -> Option<Self> {
        match fallback {
            Fallback::Key(key) => Some(key),
            _ => None,
        }
    }
}

impl Recover for Member {
    fn recover(fallback: Fallback) -> Option<Self> {
        match fallback {
            Fallback::Member(member) => Some(member),
            _ => None,
        }
    }
}

impl Recover for Role {
    fn recover(fallback: Fallback) -> Option<Self> {
        match fallback {
            Fallback::Role(role) => Some(role),
            _ => None,
        }
    }
}

impl Recover for User {
    fn recover(fallback: Fallback) -> Option<Self> {
        match fallback {
            Fallback::User(user) => Some(user),
            _ => None,
        }
    }
}

impl Recover for AuthState {
    fn recover(fallback: Fallback) -> Option<Self> {
        match fallback {
            Fallback::AuthState(state) => Some(state),
            _ => None,
        }
    }
}

impl Recover for bool {
    fn recover(fallback: Fallback) -> Option<Self> {
        match fallback {
            Fallback::Flag(flag) => Some(flag),
            _ => None,
        }
    }
}

impl<T> Recover for Option<T> {
    fn recover(fallback: Fallback) -> Option<Self> {
        match fallback {
            Fallback::Absent => Some(None),
            _ => None,
        }
    }
}
