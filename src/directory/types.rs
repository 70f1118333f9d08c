//! Wire types for the Wio server REST API
//!
//! Every response carries an optional `error` field; success is signalled
//! by the presence of the operation's own fields (or `result: "ok"`). Both
//! a reported error and a missing success marker are surfaced as errors;
//! the server is never trusted to have succeeded implicitly.

use serde::Deserialize;

use super::DirectoryError;

pub const BOARD_WIO_LINK_1_0: &str = "Wio Link v1.0";
pub const BOARD_WIO_NODE_1_0: &str = "Wio Node v1.0";

/// Name a node is registered under before the operator's name is applied.
pub const TEMPORARY_NODE_NAME: &str = "node000";

/// An authenticated directory session. The token is threaded explicitly
/// through every authorized call; nothing mutates shared client state.
#[derive(Debug, Clone)]
pub struct Session {
    pub token: String,
    pub user_id: String,
}

/// Server-issued identity of a freshly registered node.
#[derive(Debug, Clone)]
pub struct NodeCredentials {
    pub node_sn: String,
    pub node_key: String,
}

/// One entry of `GET /v1/nodes/list`.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Node {
    pub name: String,
    pub node_key: String,
    pub node_sn: String,
    pub dataxserver: Option<String>,
    pub board: String,
    pub online: bool,
}

impl Default for Node {
    fn default() -> Self {
        Self {
            name: String::new(),
            node_key: String::new(),
            node_sn: String::new(),
            dataxserver: None,
            board: String::new(),
            online: false,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct LoginResponse {
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub token: Option<String>,
    #[serde(default)]
    pub user_id: Option<String>,
}

impl LoginResponse {
    pub fn into_session(self) -> Result<Session, DirectoryError> {
        if let Some(error) = self.error {
            return Err(DirectoryError::Rejected(error));
        }
        match (self.token, self.user_id) {
            (Some(token), Some(user_id)) if !token.is_empty() && !user_id.is_empty() => {
                Ok(Session { token, user_id })
            }
            _ => Err(DirectoryError::Malformed(
                "login response missing token or user_id".into(),
            )),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct CreateNodeResponse {
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub node_key: Option<String>,
    #[serde(default)]
    pub node_sn: Option<String>,
}

impl CreateNodeResponse {
    pub fn into_credentials(self) -> Result<NodeCredentials, DirectoryError> {
        if let Some(error) = self.error {
            return Err(DirectoryError::Rejected(error));
        }
        match (self.node_sn, self.node_key) {
            (Some(node_sn), Some(node_key)) if !node_sn.is_empty() && !node_key.is_empty() => {
                Ok(NodeCredentials { node_sn, node_key })
            }
            _ => Err(DirectoryError::Malformed(
                "create response missing node_sn or node_key".into(),
            )),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct NodeListResponse {
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub nodes: Option<Vec<Node>>,
}

impl NodeListResponse {
    pub fn into_nodes(self) -> Result<Vec<Node>, DirectoryError> {
        if let Some(error) = self.error {
            return Err(DirectoryError::Rejected(error));
        }
        self.nodes
            .ok_or_else(|| DirectoryError::Malformed("list response missing nodes".into()))
    }
}

/// Shape of `rename` and `delete` responses: `{"result": "ok"}`.
#[derive(Debug, Deserialize)]
pub struct ResultResponse {
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub result: Option<String>,
}

impl ResultResponse {
    pub fn into_ok(self) -> Result<(), DirectoryError> {
        if let Some(error) = self.error {
            return Err(DirectoryError::Rejected(error));
        }
        match self.result.as_deref() {
            Some("ok") => Ok(()),
            Some(other) => Err(DirectoryError::Rejected(other.to_string())),
            None => Err(DirectoryError::Malformed("response missing result".into())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_login_success() {
        let resp: LoginResponse =
            serde_json::from_str(r#"{"token":"T","user_id":"U"}"#).unwrap();
        let session = resp.into_session().unwrap();
        assert_eq!(session.token, "T");
        assert_eq!(session.user_id, "U");
    }

    #[test]
    fn test_login_reports_server_error() {
        let resp: LoginResponse =
            serde_json::from_str(r#"{"error":"invalid password"}"#).unwrap();
        match resp.into_session() {
            Err(DirectoryError::Rejected(msg)) => assert_eq!(msg, "invalid password"),
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[test]
    fn test_login_missing_token_is_malformed() {
        let resp: LoginResponse = serde_json::from_str(r#"{"user_id":"U"}"#).unwrap();
        assert!(matches!(
            resp.into_session(),
            Err(DirectoryError::Malformed(_))
        ));
    }

    #[test]
    fn test_create_node_success() {
        let resp: CreateNodeResponse =
            serde_json::from_str(r#"{"node_sn":"abc123","node_key":"K"}"#).unwrap();
        let creds = resp.into_credentials().unwrap();
        assert_eq!(creds.node_sn, "abc123");
        assert_eq!(creds.node_key, "K");
    }

    #[test]
    fn test_create_node_empty_fields_are_malformed() {
        let resp: CreateNodeResponse =
            serde_json::from_str(r#"{"node_sn":"","node_key":"K"}"#).unwrap();
        assert!(matches!(
            resp.into_credentials(),
            Err(DirectoryError::Malformed(_))
        ));
    }

    #[test]
    fn test_node_list_with_partial_entries() {
        let resp: NodeListResponse = serde_json::from_str(
            r#"{"nodes":[{"node_sn":"abc123","online":true},{"node_sn":"def456"}]}"#,
        )
        .unwrap();
        let nodes = resp.into_nodes().unwrap();
        assert_eq!(nodes.len(), 2);
        assert!(nodes[0].online);
        assert!(!nodes[1].online);
        assert_eq!(nodes[1].name, "");
    }

    #[test]
    fn test_node_list_missing_nodes_is_malformed() {
        let resp: NodeListResponse = serde_json::from_str(r#"{}"#).unwrap();
        assert!(matches!(resp.into_nodes(), Err(DirectoryError::Malformed(_))));
    }

    #[test]
    fn test_result_response() {
        let ok: ResultResponse = serde_json::from_str(r#"{"result":"ok"}"#).unwrap();
        assert!(ok.into_ok().is_ok());

        let not_ok: ResultResponse = serde_json::from_str(r#"{"result":"denied"}"#).unwrap();
        assert!(matches!(not_ok.into_ok(), Err(DirectoryError::Rejected(_))));

        let empty: ResultResponse = serde_json::from_str(r#"{}"#).unwrap();
        assert!(matches!(empty.into_ok(), Err(DirectoryError::Malformed(_))));
    }
}
