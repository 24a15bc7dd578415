//! Purpose: Cluster membership records.
//! Exports: `Member`, `CreateMember`.
//! Role: Response values and request bodies for `/v2/members`.
//! Invariants: Members synthesized from failures carry only `error_message`.
use super::node::ErrorMessage;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub struct Member {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(rename = "peerURLs", default)]
    pub peer_urls: Vec<String>,
    #[serde(rename = "clientURLs", default)]
    pub client_urls: Vec<String>,
    #[serde(
        rename = "errorMessage",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub error_message: Option<ErrorMessage>,
}

impl Member {
    pub fn failed(error: ErrorMessage) -> Self {
        Self {
            error_message: Some(error),
            ..Self::default()
        }
    }
}

#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub struct CreateMember {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(rename = "peerURLs")]
    pub peer_urls: Vec<String>,
    #[serde(rename = "clientURLs", default)]
    pub client_urls: Vec<String>,
}

impl CreateMember {
    pub fn new(peer_urls: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            name: None,
            peer_urls: peer_urls.into_iter().map(Into::into).collect(),
            client_urls: Vec::new(),
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_client_urls(mut self, urls: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.client_urls = urls.into_iter().map(Into::into).collect();
        self
    }
}

#[cfg(test)]
mod tests {
    use super::{CreateMember, Member};
    use serde_json::json;

    #[test]
    fn member_decodes_url_lists() {
        let body = r#"{"id":"272e204152","name":"infra1","peerURLs":["http://10.0.0.10:2380"],"clientURLs":["http://10.0.0.10:2379"]}"#;
        let member: Member = serde_json::from_str(body).expect("member");
        assert_eq!(member.id.as_deref(), Some("272e204152"));
        assert_eq!(member.peer_urls, vec!["http://10.0.0.10:2380".to_string()]);
        assert!(member.error_message.is_none());
    }

    #[test]
    fn create_member_body_uses_wire_names() {
        let body = CreateMember::new(["http://10.0.0.10:2380"]);
        assert_eq!(
            serde_json::to_value(&body).expect("json"),
            json!({"peerURLs": ["http://10.0.0.10:2380"], "clientURLs": []})
        );
    }
}
