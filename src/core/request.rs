//! Purpose: Build wire requests (method, path, query, body) for every etcd v2 operation.
//! Exports: `Request`, `Method`, `Body`, `KeyOptions`, `WaitOptions`, `SwapCondition`,
//! `DeleteCondition`, and one builder function per operation.
//! Role: Pure formatter; performs no I/O and holds no state.
//! Invariants: Each path segment is percent-encoded on its own; `/` in keys separates segments.
//! Invariants: Compare operations carry exactly one precondition, fixed by the condition enums.
//! Invariants: Directory listing/deletion paths end with a trailing slash.
//! Invariants: `.` and `..` segments are rejected as usage errors, never resolved.
use super::auth::{CreateUserOptions, Permissions, Role};
use super::error::{ApiResult, Error, ErrorKind};
use super::member::CreateMember;
use serde::Serialize;
use serde_json::Value;
use std::time::Duration;
use url::Url;

pub const API_VERSION: &str = "v2";

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Method {
    Get,
    Put,
    Post,
    Delete,
}

impl Method {
    pub fn as_str(self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Put => "PUT",
            Method::Post => "POST",
            Method::Delete => "DELETE",
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum Body {
    Empty,
    Form(Vec<(String, String)>),
    Json(Value),
}

#[derive(Clone, Debug, PartialEq)]
pub struct Request {
    method: Method,
    segments: Vec<String>,
    query: Vec<(String, String)>,
    body: Body,
}

impl Request {
    fn new(method: Method, segments: Vec<String>) -> Self {
        Self {
            method,
            segments,
            query: Vec::new(),
            body: Body::Empty,
        }
    }

    fn query(mut self, name: &str, value: impl ToString) -> Self {
        self.query.push((name.to_string(), value.to_string()));
        self
    }

    fn form(mut self, name: &str, value: impl ToString) -> Self {
        let pair = (name.to_string(), value.to_string());
        match &mut self.body {
            Body::Form(pairs) => pairs.push(pair),
            _ => self.body = Body::Form(vec![pair]),
        }
        self
    }

    fn json(mut self, payload: &impl Serialize) -> ApiResult<Self> {
        let value = serde_json::to_value(payload).map_err(|err| {
            Error::new(ErrorKind::Internal)
                .with_message("failed to encode request json")
                .with_source(err)
        })?;
        self.body = Body::Json(value);
        Ok(self)
    }

    fn ttl(self, ttl: Option<Duration>) -> Self {
        match ttl {
            Some(ttl) => self.form("ttl", ttl.as_secs()),
            None => self,
        }
    }

    pub fn method(&self) -> Method {
        self.method
    }

    /// Raw (unencoded) path segments; an empty last segment marks a trailing slash.
    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    pub fn query_pairs(&self) -> &[(String, String)] {
        &self.query
    }

    pub fn body(&self) -> &Body {
        &self.body
    }

    /// Human-readable target for logs, e.g. `/v2/keys/foo/`.
    pub fn describe(&self) -> String {
        format!("/{}", self.segments.join("/"))
    }

    /// `application/x-www-form-urlencoded` rendering of a form body.
    pub fn encoded_form(&self) -> Option<String> {
        match &self.body {
            Body::Form(pairs) => Some(
                url::form_urlencoded::Serializer::new(String::new())
                    .extend_pairs(pairs)
                    .finish(),
            ),
            _ => None,
        }
    }

    /// URL path pushing would resolve `.`/`..` and silently address another resource.
    pub fn check_segments(&self) -> ApiResult<()> {
        match self
            .segments
            .iter()
            .find(|segment| matches!(segment.as_str(), "." | ".."))
        {
            Some(segment) => Err(Error::new(ErrorKind::Usage)
                .with_message(format!("path segment `{segment}` is not allowed"))
                .with_hint("Drop `.` and `..` from the name.")),
            None => Ok(()),
        }
    }

    /// Resolve against a base URL whose path is `/`.
    pub fn url(&self, base_url: &Url) -> ApiResult<Url> {
        self.check_segments()?;
        let mut url = base_url.clone();
        {
            let mut path = url.path_segments_mut().map_err(|_| {
                Error::new(ErrorKind::Usage).with_message("etcd endpoint url cannot be a base")
            })?;
            path.clear();
            for segment in &self.segments {
                path.push(segment);
            }
        }
        url.set_query(None);
        if !self.query.is_empty() {
            url.query_pairs_mut().extend_pairs(&self.query);
        }
        Ok(url)
    }
}

#[derive(Clone, Debug, Default)]
pub struct KeyOptions {
    pub ttl: Option<Duration>,
}

impl KeyOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = Some(ttl);
        self
    }
}

#[derive(Clone, Debug, Default)]
pub struct WaitOptions {
    /// Wake on the first change at or after this index; `None` waits for the next change.
    pub wait_index: Option<u64>,
    pub recursive: bool,
}

impl WaitOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_wait_index(mut self, index: u64) -> Self {
        self.wait_index = Some(index);
        self
    }

    pub fn recursive(mut self) -> Self {
        self.recursive = true;
        self
    }
}

/// Precondition for a compare-and-swap.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum SwapCondition {
    PrevValue(String),
    PrevIndex(u64),
    PrevExist(bool),
}

impl SwapCondition {
    fn query_pair(&self) -> (&'static str, String) {
        match self {
            SwapCondition::PrevValue(value) => ("prevValue", value.clone()),
            SwapCondition::PrevIndex(index) => ("prevIndex", index.to_string()),
            SwapCondition::PrevExist(exists) => ("prevExist", exists.to_string()),
        }
    }
}

/// Precondition for a compare-and-delete.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum DeleteCondition {
    PrevValue(String),
    PrevIndex(u64),
}

impl DeleteCondition {
    fn query_pair(&self) -> (&'static str, String) {
        match self {
            DeleteCondition::PrevValue(value) => ("prevValue", value.clone()),
            DeleteCondition::PrevIndex(index) => ("prevIndex", index.to_string()),
        }
    }
}

fn segments(prefix: &[&str], name: &str) -> Vec<String> {
    prefix
        .iter()
        .map(|segment| segment.to_string())
        .chain(
            name.split('/')
                .filter(|segment| !segment.is_empty())
                .map(str::to_string),
        )
        .collect()
}

fn key_path(key: &str) -> Vec<String> {
    segments(&[API_VERSION, "keys"], key)
}

fn dir_path(dir: &str) -> Vec<String> {
    let mut path = key_path(dir);
    path.push(String::new());
    path
}

pub fn create_key(key: &str, value: &str, options: &KeyOptions) -> Request {
    Request::new(Method::Put, key_path(key))
        .form("value", value)
        .ttl(options.ttl)
}

/// The server appends a monotonically increasing child segment under `key`.
pub fn create_in_order_key(key: &str, value: &str, options: &KeyOptions) -> Request {
    Request::new(Method::Post, key_path(key))
        .form("value", value)
        .ttl(options.ttl)
}

pub fn get_key(key: &str) -> Request {
    Request::new(Method::Get, key_path(key))
}

pub fn list_in_order_key(key: &str) -> Request {
    Request::new(Method::Get, key_path(key))
        .query("recursive", true)
        .query("sorted", true)
}

pub fn delete_key(key: &str) -> Request {
    Request::new(Method::Delete, key_path(key))
}

pub fn wait_key(key: &str, options: &WaitOptions) -> Request {
    let mut request = Request::new(Method::Get, key_path(key)).query("wait", true);
    if let Some(index) = options.wait_index {
        request = request.query("waitIndex", index);
    }
    if options.recursive {
        request = request.query("recursive", true);
    }
    request
}

pub fn compare_and_delete_key(key: &str, condition: &DeleteCondition) -> Request {
    let (name, value) = condition.query_pair();
    Request::new(Method::Delete, key_path(key)).query(name, value)
}

pub fn compare_and_swap_key(key: &str, condition: &SwapCondition, value: &str) -> Request {
    let (name, expected) = condition.query_pair();
    Request::new(Method::Put, key_path(key))
        .query(name, expected)
        .form("value", value)
}

pub fn create_dir(dir: &str, options: &KeyOptions) -> Request {
    Request::new(Method::Put, key_path(dir))
        .form("dir", true)
        .ttl(options.ttl)
}

pub fn list_dir(dir: &str, recursive: bool) -> Request {
    Request::new(Method::Get, dir_path(dir)).query("recursive", recursive)
}

pub fn delete_dir(dir: &str) -> Request {
    Request::new(Method::Delete, dir_path(dir)).query("recursive", true)
}

fn auth_enable_path() -> Vec<String> {
    segments(&[API_VERSION, "auth", "enable"], "")
}

pub fn auth_status() -> Request {
    Request::new(Method::Get, auth_enable_path())
}

pub fn enable_auth() -> Request {
    Request::new(Method::Put, auth_enable_path())
}

pub fn disable_auth() -> Request {
    Request::new(Method::Delete, auth_enable_path())
}

#[derive(Serialize)]
struct RoleBody<'a> {
    role: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    permissions: Option<&'a Permissions>,
    #[serde(skip_serializing_if = "Option::is_none")]
    grant: Option<&'a Permissions>,
    #[serde(skip_serializing_if = "Option::is_none")]
    revoke: Option<&'a Permissions>,
}

fn role_path(role: &str) -> Vec<String> {
    let mut path = segments(&[API_VERSION, "auth", "roles"], "");
    path.push(role.to_string());
    path
}

/// Create a role, or update it when `grant`/`revoke` are set.
pub fn create_role(role: &Role) -> ApiResult<Request> {
    let body = RoleBody {
        role: &role.role,
        permissions: role.permissions.as_ref(),
        grant: role.grant.as_ref(),
        revoke: role.revoke.as_ref(),
    };
    Request::new(Method::Put, role_path(&role.role)).json(&body)
}

pub fn list_roles() -> Request {
    Request::new(Method::Get, segments(&[API_VERSION, "auth", "roles"], ""))
}

pub fn get_role(role: &str) -> Request {
    Request::new(Method::Get, role_path(role))
}

pub fn delete_role(role: &str) -> Request {
    Request::new(Method::Delete, role_path(role))
}

fn user_path(user: &str) -> Vec<String> {
    let mut path = segments(&[API_VERSION, "auth", "users"], "");
    path.push(user.to_string());
    path
}

pub fn create_user(options: &CreateUserOptions) -> ApiResult<Request> {
    Request::new(Method::Put, user_path(&options.user)).json(options)
}

pub fn list_users() -> Request {
    Request::new(Method::Get, segments(&[API_VERSION, "auth", "users"], ""))
}

pub fn get_user(user: &str) -> Request {
    Request::new(Method::Get, user_path(user))
}

pub fn delete_user(user: &str) -> Request {
    Request::new(Method::Delete, user_path(user))
}

pub fn list_members() -> Request {
    Request::new(Method::Get, segments(&[API_VERSION, "members"], ""))
}

pub fn add_member(member: &CreateMember) -> ApiResult<Request> {
    Request::new(Method::Post, segments(&[API_VERSION, "members"], "")).json(member)
}

pub fn delete_member(id: &str) -> Request {
    let mut path = segments(&[API_VERSION, "members"], "");
    path.push(id.to_string());
    Request::new(Method::Delete, path)
}

pub fn leader_stats() -> Request {
    Request::new(Method::Get, segments(&[API_VERSION, "stats", "leader"], ""))
}

pub fn self_stats() -> Request {
    Request::new(Method::Get, segments(&[API_VERSION, "stats", "self"], ""))
}

pub fn store_stats() -> Request {
    Request::new(Method::Get, segments(&[API_VERSION, "stats", "store"], ""))
}

pub fn version() -> Request {
    Request::new(Method::Get, segments(&["version"], ""))
}

pub fn health() -> Request {
    Request::new(Method::Get, segments(&["health"], ""))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::auth::Permissions;
    use serde_json::json;

    fn target(request: &Request) -> String {
        let base = Url::parse("http://127.0.0.1:2379/").expect("base");
        let url = request.url(&base).expect("url");
        match url.query() {
            Some(query) => format!("{}?{}", url.path(), query),
            None => url.path().to_string(),
        }
    }

    #[test]
    fn create_key_sends_value_form() {
        let request = create_key("hello", "world", &KeyOptions::new());
        assert_eq!(request.method(), Method::Put);
        assert_eq!(target(&request), "/v2/keys/hello");
        assert_eq!(request.encoded_form().as_deref(), Some("value=world"));
    }

    #[test]
    fn create_key_with_ttl_appends_seconds() {
        let options = KeyOptions::new().with_ttl(Duration::from_secs(5));
        let request = create_key("hello", "world", &options);
        assert_eq!(request.encoded_form().as_deref(), Some("value=world&ttl=5"));
    }

    #[test]
    fn in_order_create_posts_to_parent() {
        let request = create_in_order_key("queue", "job", &KeyOptions::new());
        assert_eq!(request.method(), Method::Post);
        assert_eq!(target(&request), "/v2/keys/queue");
        assert_eq!(request.encoded_form().as_deref(), Some("value=job"));
    }

    #[test]
    fn list_in_order_requests_sorted_recursive_listing() {
        let request = list_in_order_key("hello");
        assert_eq!(target(&request), "/v2/keys/hello?recursive=true&sorted=true");
        assert_eq!(request.body(), &Body::Empty);
    }

    #[test]
    fn wait_key_optionally_carries_index() {
        assert_eq!(
            target(&wait_key("hello", &WaitOptions::new())),
            "/v2/keys/hello?wait=true"
        );
        assert_eq!(
            target(&wait_key("hello", &WaitOptions::new().with_wait_index(2))),
            "/v2/keys/hello?wait=true&waitIndex=2"
        );
    }

    #[test]
    fn compare_operations_carry_one_precondition() {
        let swap = compare_and_swap_key("foo", &SwapCondition::PrevValue("hello".into()), "world");
        assert_eq!(swap.method(), Method::Put);
        assert_eq!(target(&swap), "/v2/keys/foo?prevValue=hello");
        assert_eq!(swap.encoded_form().as_deref(), Some("value=world"));

        let swap = compare_and_swap_key("foo", &SwapCondition::PrevIndex(7), "world");
        assert_eq!(target(&swap), "/v2/keys/foo?prevIndex=7");

        let swap = compare_and_swap_key("foo", &SwapCondition::PrevExist(false), "world");
        assert_eq!(target(&swap), "/v2/keys/foo?prevExist=false");

        let delete = compare_and_delete_key("foo", &DeleteCondition::PrevIndex(3));
        assert_eq!(delete.method(), Method::Delete);
        assert_eq!(target(&delete), "/v2/keys/foo?prevIndex=3");
        assert_eq!(delete.body(), &Body::Empty);
    }

    #[test]
    fn dir_operations_use_trailing_slash() {
        let create = create_dir("hello", &KeyOptions::new().with_ttl(Duration::from_secs(100)));
        assert_eq!(target(&create), "/v2/keys/hello");
        assert_eq!(create.encoded_form().as_deref(), Some("dir=true&ttl=100"));

        assert_eq!(
            target(&list_dir("hello", true)),
            "/v2/keys/hello/?recursive=true"
        );
        assert_eq!(
            target(&list_dir("hello", false)),
            "/v2/keys/hello/?recursive=false"
        );
        let delete = delete_dir("hello");
        assert_eq!(delete.method(), Method::Delete);
        assert_eq!(target(&delete), "/v2/keys/hello/?recursive=true");
    }

    #[test]
    fn hierarchical_keys_encode_each_segment() {
        assert_eq!(target(&get_key("/a/b c/d")), "/v2/keys/a/b%20c/d");
        assert_eq!(target(&get_key("a?b")), "/v2/keys/a%3Fb");
        assert_eq!(target(&list_dir("", false)), "/v2/keys/?recursive=false");
    }

    #[test]
    fn form_values_are_url_encoded() {
        let request = create_key("hello", "a b&c", &KeyOptions::new());
        assert_eq!(request.encoded_form().as_deref(), Some("value=a+b%26c"));
    }

    #[test]
    fn role_create_body_omits_error_message() {
        let role = Role::new("rkt")
            .with_permissions(Permissions::kv(vec!["*".to_string()], vec!["*".to_string()]));
        let request = create_role(&role).expect("request");
        assert_eq!(target(&request), "/v2/auth/roles/rkt");
        assert_eq!(
            request.body(),
            &Body::Json(json!({
                "role": "rkt",
                "permissions": {"kv": {"read": ["*"], "write": ["*"]}}
            }))
        );
    }

    #[test]
    fn auth_member_and_stats_paths() {
        assert_eq!(target(&auth_status()), "/v2/auth/enable");
        assert_eq!(enable_auth().method(), Method::Put);
        assert_eq!(disable_auth().method(), Method::Delete);
        assert_eq!(target(&get_user("alice")), "/v2/auth/users/alice");
        assert_eq!(target(&list_users()), "/v2/auth/users");
        assert_eq!(target(&delete_member("272e204152")), "/v2/members/272e204152");
        assert_eq!(target(&store_stats()), "/v2/stats/store");
        assert_eq!(target(&version()), "/version");
        assert_eq!(target(&health()), "/health");
        assert_eq!(list_dir("hello", true).describe(), "/v2/keys/hello/");
    }

    fn rejected(request: &Request) -> bool {
        let base = Url::parse("http://127.0.0.1:2379/").expect("base");
        match request.url(&base) {
            Err(err) => err.kind() == ErrorKind::Usage,
            Ok(_) => false,
        }
    }

    #[test]
    fn dot_segments_are_rejected_not_resolved() {
        assert!(rejected(&get_key("a/../b")));
        assert!(rejected(&delete_key("a/..")));
        assert!(rejected(&create_key("./a", "v", &KeyOptions::new())));
        assert!(rejected(&list_dir("a/.", true)));
        assert!(rejected(&get_role("..")));
        assert!(rejected(&delete_user(".")));
        assert!(rejected(&delete_member("..")));
        assert!(rejected(&create_user(&CreateUserOptions::new("..", "pw")).expect("request")));
    }

    #[test]
    fn dotted_names_that_are_not_dot_segments_pass() {
        assert_eq!(target(&get_key("a/.hidden/b..c")), "/v2/keys/a/.hidden/b..c");
        assert_eq!(target(&get_role("r.1")), "/v2/auth/roles/r.1");
        assert!(get_key("a/b").check_segments().is_ok());
    }
}
