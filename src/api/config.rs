//! Purpose: Client configuration and the endpoint/credential lookup chain.
//! Exports: `ClientConfig`, `Credentials`, `TlsMode`, `resolve_endpoint`, `resolve_credentials`,
//! `DEFAULT_ENDPOINT`, `ENDPOINT_VARS`, `CREDENTIAL_VARS`.
//! Role: Turns explicit values, environment variables, and defaults into a transport config.
//! Invariants: Explicit values win over the environment; the environment wins over defaults.
//! Invariants: Lookup and probing are injected so resolution is testable without real I/O.
use super::transport::probe_endpoint;
use base64::Engine;
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_ENDPOINT: &str = "http://127.0.0.1:2379";

/// Searched in order; the first reachable endpoint wins.
pub const ENDPOINT_VARS: [&str; 3] = [
    "ETCD_REST_ENDPOINT",
    "ETCD_LISTEN_CLIENT_URLS",
    "ETCD_ADVERTISE_CLIENT_URLS",
];

pub const CREDENTIAL_VARS: [&str; 1] = ["ETCD_REST_CREDENTIALS"];

const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);
const PROBE_TIMEOUT: Duration = Duration::from_secs(2);

#[derive(Clone, Eq, PartialEq)]
pub enum Credentials {
    Basic { user: String, password: String },
    /// Pre-encoded basic-auth token (base64 of `user:password`).
    Encoded(String),
}

impl Credentials {
    /// `user:password` becomes basic auth; anything else is taken as an encoded token.
    pub fn parse(raw: &str) -> Self {
        match raw.split_once(':') {
            Some((user, password)) => Credentials::Basic {
                user: user.to_string(),
                password: password.to_string(),
            },
            None => Credentials::Encoded(raw.to_string()),
        }
    }

    pub fn authorization_header(&self) -> String {
        let token = match self {
            Credentials::Basic { user, password } => {
                base64::engine::general_purpose::STANDARD.encode(format!("{user}:{password}"))
            }
            Credentials::Encoded(token) => token.clone(),
        };
        format!("Basic {token}")
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Credentials::Basic { user, .. } => f
                .debug_struct("Basic")
                .field("user", user)
                .field("password", &"<redacted>")
                .finish(),
            Credentials::Encoded(_) => f.write_str("Encoded(<redacted>)"),
        }
    }
}

#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub enum TlsMode {
    /// Built-in web PKI roots.
    #[default]
    WebPki,
    CaFile(PathBuf),
    SkipVerify,
}

#[derive(Clone, Debug)]
pub struct ClientConfig {
    pub endpoint: String,
    pub credentials: Option<Credentials>,
    pub connect_timeout: Option<Duration>,
    /// `None` lets long-poll waits block until the server answers.
    pub read_timeout: Option<Duration>,
    pub tls: TlsMode,
}

impl ClientConfig {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            credentials: None,
            connect_timeout: Some(DEFAULT_CONNECT_TIMEOUT),
            read_timeout: None,
            tls: TlsMode::WebPki,
        }
    }

    /// Resolve endpoint and credentials from the process environment.
    pub fn from_env() -> Self {
        Self::resolve_with(
            |name| std::env::var(name).ok(),
            |endpoint| probe_endpoint(endpoint, PROBE_TIMEOUT),
        )
    }

    pub fn resolve_with(
        lookup: impl Fn(&str) -> Option<String>,
        probe: impl Fn(&str) -> bool,
    ) -> Self {
        let mut config = Self::new(resolve_endpoint(&lookup, probe));
        config.credentials = resolve_credentials(&lookup);
        config
    }

    pub fn with_credentials(mut self, credentials: Credentials) -> Self {
        self.credentials = Some(credentials);
        self
    }

    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = Some(timeout);
        self
    }

    pub fn with_read_timeout(mut self, timeout: Duration) -> Self {
        self.read_timeout = Some(timeout);
        self
    }

    pub fn with_tls_ca_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.tls = TlsMode::CaFile(path.into());
        self
    }

    pub fn with_tls_skip_verify(mut self) -> Self {
        self.tls = TlsMode::SkipVerify;
        self
    }
}

fn lookup_value(lookup: &impl Fn(&str) -> Option<String>, name: &str) -> Option<String> {
    lookup(name)
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

/// First endpoint from `ENDPOINT_VARS` that answers a probe.
///
/// A lone candidate is returned without probing. When no candidate answers, the
/// last one found is used; with no candidates at all, `DEFAULT_ENDPOINT`.
pub fn resolve_endpoint(
    lookup: &impl Fn(&str) -> Option<String>,
    probe: impl Fn(&str) -> bool,
) -> String {
    let candidates: Vec<String> = ENDPOINT_VARS
        .iter()
        .filter_map(|name| lookup_value(lookup, name))
        .filter_map(|value| {
            // *_CLIENT_URLS variables hold comma-separated lists.
            value
                .split(',')
                .map(str::trim)
                .find(|url| !url.is_empty())
                .map(str::to_string)
        })
        .collect();

    match candidates.as_slice() {
        [] => DEFAULT_ENDPOINT.to_string(),
        [only] => only.clone(),
        [.., last] => {
            for candidate in &candidates {
                if probe(candidate) {
                    return candidate.clone();
                }
                tracing::warn!(endpoint = %candidate, "etcd endpoint did not answer, trying next");
            }
            last.clone()
        }
    }
}

pub fn resolve_credentials(lookup: &impl Fn(&str) -> Option<String>) -> Option<Credentials> {
    CREDENTIAL_VARS
        .iter()
        .find_map(|name| lookup_value(lookup, name))
        .map(|raw| Credentials::parse(&raw))
}

#[cfg(test)]
mod tests {
    use super::{
        ClientConfig, Credentials, DEFAULT_ENDPOINT, TlsMode, resolve_credentials,
        resolve_endpoint,
    };
    use std::cell::RefCell;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn default_endpoint_when_environment_is_empty() {
        let endpoint = resolve_endpoint(&env(&[]), |_| panic!("no probe expected"));
        assert_eq!(endpoint, DEFAULT_ENDPOINT);
    }

    #[test]
    fn single_candidate_is_not_probed() {
        let lookup = env(&[("ETCD_ADVERTISE_CLIENT_URLS", "http://10.0.0.1:2379")]);
        let endpoint = resolve_endpoint(&lookup, |_| panic!("no probe expected"));
        assert_eq!(endpoint, "http://10.0.0.1:2379");
    }

    #[test]
    fn first_reachable_candidate_wins() {
        let lookup = env(&[
            ("ETCD_REST_ENDPOINT", "http://down:2379"),
            ("ETCD_LISTEN_CLIENT_URLS", "http://up:2379,http://other:2379"),
            ("ETCD_ADVERTISE_CLIENT_URLS", "http://late:2379"),
        ]);
        let probed = RefCell::new(Vec::new());
        let endpoint = resolve_endpoint(&lookup, |candidate| {
            probed.borrow_mut().push(candidate.to_string());
            candidate.contains("up")
        });
        assert_eq!(endpoint, "http://up:2379");
        assert_eq!(
            probed.into_inner(),
            vec!["http://down:2379".to_string(), "http://up:2379".to_string()]
        );
    }

    #[test]
    fn unreachable_candidates_fall_back_to_last_found() {
        let lookup = env(&[
            ("ETCD_REST_ENDPOINT", "http://a:2379"),
            ("ETCD_ADVERTISE_CLIENT_URLS", " http://b:2379 "),
        ]);
        assert_eq!(resolve_endpoint(&lookup, |_| false), "http://b:2379");
    }

    #[test]
    fn credentials_parse_basic_or_encoded() {
        let basic = Credentials::parse("root:secret");
        assert_eq!(basic.authorization_header(), "Basic cm9vdDpzZWNyZXQ=");
        let encoded = Credentials::parse("cm9vdDpzZWNyZXQ=");
        assert_eq!(encoded.authorization_header(), "Basic cm9vdDpzZWNyZXQ=");
        assert!(!format!("{basic:?}").contains("secret"));
    }

    #[test]
    fn credentials_come_from_environment() {
        let lookup = env(&[("ETCD_REST_CREDENTIALS", "root:pw")]);
        assert_eq!(
            resolve_credentials(&lookup),
            Some(Credentials::Basic {
                user: "root".to_string(),
                password: "pw".to_string()
            })
        );
        assert_eq!(resolve_credentials(&env(&[("ETCD_REST_CREDENTIALS", "  ")])), None);
    }

    #[test]
    fn resolve_with_combines_endpoint_and_credentials() {
        let config = ClientConfig::resolve_with(
            env(&[
                ("ETCD_REST_ENDPOINT", "https://etcd.example:2379"),
                ("ETCD_REST_CREDENTIALS", "root:pw"),
            ]),
            |_| true,
        );
        assert_eq!(config.endpoint, "https://etcd.example:2379");
        assert!(config.credentials.is_some());
        assert_eq!(config.tls, TlsMode::WebPki);
        assert!(config.read_timeout.is_none());
    }
}
