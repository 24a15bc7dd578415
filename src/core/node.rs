//! Purpose: Key-space result model (nodes, key results, error envelopes).
//! Exports: `Node`, `Key`, `KeyAction`, `ErrorMessage`.
//! Role: Shared by 2xx decoding and by fallbacks that synthesize soft failures.
//! Invariants: A directory node never carries a value; a file node never carries children.
//! Invariants: A key result carries either node data or an error message, never neither.
//! Invariants: Unknown wire fields are ignored.
use super::error::ErrorKind;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;

#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Node {
    /// Absent only on the store root.
    #[serde(default)]
    pub key: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub dir: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nodes: Option<Vec<Node>>,
    #[serde(default)]
    pub created_index: u64,
    #[serde(default)]
    pub modified_index: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ttl: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expiration: Option<String>,
}

impl Node {
    pub fn file(key: impl Into<String>, value: impl Into<String>, index: u64) -> Self {
        Self {
            key: key.into(),
            value: Some(value.into()),
            dir: false,
            nodes: None,
            created_index: index,
            modified_index: index,
            ttl: None,
            expiration: None,
        }
    }

    pub fn dir(key: impl Into<String>, children: Vec<Node>, index: u64) -> Self {
        Self {
            key: key.into(),
            value: None,
            dir: true,
            nodes: Some(children),
            created_index: index,
            modified_index: index,
            ttl: None,
            expiration: None,
        }
    }

    pub fn with_ttl(mut self, ttl: i64, expiration: impl Into<String>) -> Self {
        self.ttl = Some(ttl);
        self.expiration = Some(expiration.into());
        self
    }

    /// Children of a directory node; empty for files and for unlisted directories.
    pub fn children(&self) -> &[Node] {
        self.nodes.as_deref().unwrap_or_default()
    }

    pub fn is_well_formed(&self) -> bool {
        let shape_ok = if self.dir {
            self.value.is_none()
        } else {
            self.nodes.is_none()
        };
        shape_ok && self.children().iter().all(Node::is_well_formed)
    }

    /// Parsed `expiration`, if the node has a TTL and the timestamp is RFC 3339.
    pub fn expires_at(&self) -> Option<OffsetDateTime> {
        let raw = self.expiration.as_deref()?;
        OffsetDateTime::parse(raw, &Rfc3339).ok()
    }
}

#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum KeyAction {
    Set,
    Get,
    Create,
    Update,
    Delete,
    Expire,
    CompareAndSwap,
    CompareAndDelete,
    #[serde(other)]
    Unknown,
}

#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Key {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action: Option<KeyAction>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub node: Option<Node>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prev_node: Option<Node>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_message: Option<ErrorMessage>,
}

impl Key {
    /// Soft-failure result: only the error message is set.
    pub fn failed(error: ErrorMessage) -> Self {
        Self {
            action: None,
            node: None,
            prev_node: None,
            error_message: Some(error),
        }
    }

    pub fn is_success(&self) -> bool {
        self.error_message.is_none()
    }

    /// True when none of action, node, prevNode or errorMessage is set.
    pub fn is_empty(&self) -> bool {
        self.action.is_none()
            && self.node.is_none()
            && self.prev_node.is_none()
            && self.error_message.is_none()
    }

    /// Value of the current node, falling back to the previous one (deletes, expiries).
    pub fn value(&self) -> Option<&str> {
        self.node
            .as_ref()
            .and_then(|node| node.value.as_deref())
            .or_else(|| self.prev_node.as_ref()?.value.as_deref())
    }
}

/// Normalized etcd error envelope.
///
/// The full key-space shape carries all four fields; the reduced shape used by
/// auth and membership endpoints only carries `message`.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorMessage {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_code: Option<i64>,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cause: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub index: Option<u64>,
}

impl ErrorMessage {
    pub fn new(
        error_code: i64,
        message: impl Into<String>,
        cause: impl Into<String>,
        index: u64,
    ) -> Self {
        Self {
            error_code: Some(error_code),
            message: message.into(),
            cause: Some(cause.into()),
            index: Some(index),
        }
    }

    pub fn message_only(message: impl Into<String>) -> Self {
        Self {
            error_code: None,
            message: message.into(),
            cause: None,
            index: None,
        }
    }

    /// Error kind implied by the etcd v2 error code, when one is present.
    pub fn kind(&self) -> Option<ErrorKind> {
        let kind = match self.error_code? {
            100 => ErrorKind::NotFound,
            101 => ErrorKind::PreconditionFailed,
            105 => ErrorKind::AlreadyExists,
            107 | 110 => ErrorKind::Permission,
            102..=109 | 200..=299 => ErrorKind::Usage,
            300..=399 => ErrorKind::Unavailable,
            _ => ErrorKind::Internal,
        };
        Some(kind)
    }
}

#[cfg(test)]
mod tests {
    use super::{ErrorMessage, Key, KeyAction, Node};
    use crate::core::error::ErrorKind;

    #[test]
    fn fixtures_respect_dir_shape() {
        let tree = Node::dir(
            "/queue",
            vec![
                Node::file("/queue/00000000000000000007", "World", 7),
                Node::dir("/queue/nested", Vec::new(), 8),
            ],
            6,
        );
        assert!(tree.is_well_formed());
        assert!(tree.value.is_none());
        for child in tree.children() {
            if child.dir {
                assert!(child.value.is_none());
            } else {
                assert!(child.nodes.is_none());
            }
        }

        let mut broken = Node::file("/hello", "world", 3);
        broken.nodes = Some(Vec::new());
        assert!(!broken.is_well_formed());
    }

    #[test]
    fn decodes_list_response_and_ignores_unknown_fields() {
        let body = r#"{
            "action": "get",
            "extra": {"ignored": true},
            "node": {
                "key": "/hello",
                "dir": true,
                "nodes": [
                    {"key": "/hello/00000000000000000004", "value": "World", "modifiedIndex": 4, "createdIndex": 4},
                    {"key": "/hello/00000000000000000005", "value": "NewWorld", "modifiedIndex": 5, "createdIndex": 5}
                ],
                "modifiedIndex": 4,
                "createdIndex": 4
            }
        }"#;
        let key: Key = serde_json::from_str(body).expect("key");
        assert_eq!(key.action, Some(KeyAction::Get));
        let node = key.node.expect("node");
        assert!(node.dir);
        assert_eq!(node.children().len(), 2);
        assert_eq!(node.children()[1].value.as_deref(), Some("NewWorld"));
        assert!(node.is_well_formed());
    }

    #[test]
    fn unknown_action_decodes_as_unknown() {
        let key: Key = serde_json::from_str(r#"{"action":"refresh"}"#).expect("key");
        assert_eq!(key.action, Some(KeyAction::Unknown));
    }

    #[test]
    fn expiration_parses_as_rfc3339() {
        let node =
            Node::file("/hello", "world", 9).with_ttl(5, "2013-12-04T12:01:21.874888581-08:00");
        let expires = node.expires_at().expect("expiration");
        assert_eq!(expires.year(), 2013);
        assert_eq!(node.ttl, Some(5));
    }

    #[test]
    fn key_value_falls_back_to_prev_node() {
        let key = Key {
            action: Some(KeyAction::Expire),
            node: Some(Node {
                key: "/hello".to_string(),
                ..Node::default()
            }),
            prev_node: Some(Node::file("/hello", "world", 2)),
            error_message: None,
        };
        assert_eq!(key.value(), Some("world"));
        assert!(key.is_success());
    }

    #[test]
    fn error_code_maps_to_kind() {
        assert_eq!(
            ErrorMessage::new(100, "Key not found", "/foo", 5).kind(),
            Some(ErrorKind::NotFound)
        );
        assert_eq!(
            ErrorMessage::new(101, "Compare failed", "[a != b]", 5).kind(),
            Some(ErrorKind::PreconditionFailed)
        );
        assert_eq!(
            ErrorMessage::new(102, "Not a file", "/foo", 5).kind(),
            Some(ErrorKind::Usage)
        );
        assert_eq!(ErrorMessage::message_only("boom").kind(), None);
    }
}
