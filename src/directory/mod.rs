//! REST client for the Wio server account/node directory
//!
//! Implements the handful of calls provisioning needs:
//! login, node create, node list, node rename and node delete.
//! Bodies are form-encoded, responses are JSON. Authorized calls carry
//! `Authorization: token <...>` built from an explicit [`Session`] value
//! passed per call.

pub mod types;

use reqwest::header::AUTHORIZATION;
use reqwest::Client;
use serde::de::DeserializeOwned;
use tracing::debug;

pub use types::{Node, NodeCredentials, Session};

#[derive(Debug, thiserror::Error)]
pub enum DirectoryError {
    /// The server answered and reported a failure of its own.
    #[error("server rejected the request: {0}")]
    Rejected(String),

    /// The server answered with something that is not a valid response.
    #[error("malformed server response: {0}")]
    Malformed(String),

    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),
}

/// The subset of the directory API the provisioning workflow drives,
/// so the workflow can run against a scripted directory in tests.
pub trait Directory {
    async fn login(&self, email: &str, password: &str) -> Result<Session, DirectoryError>;
    async fn create_node(
        &self,
        session: &Session,
        name: &str,
        board: &str,
    ) -> Result<NodeCredentials, DirectoryError>;
    async fn list_nodes(&self, session: &Session) -> Result<Vec<Node>, DirectoryError>;
    async fn rename_node(
        &self,
        session: &Session,
        node_sn: &str,
        name: &str,
    ) -> Result<(), DirectoryError>;
}

pub struct DirectoryClient {
    base_url: String,
    http: Client,
}

impl DirectoryClient {
    /// Client for the server at `https://{host}`.
    pub fn new(host: &str) -> Self {
        Self {
            base_url: format!("https://{}", host),
            http: Client::new(),
        }
    }

    async fn post_form<T: DeserializeOwned>(
        &self,
        path: &str,
        form: &[(&str, &str)],
        session: Option<&Session>,
    ) -> Result<T, DirectoryError> {
        let mut request = self
            .http
            .post(format!("{}{}", self.base_url, path))
            .form(form);
        if let Some(session) = session {
            request = request.header(AUTHORIZATION, format!("token {}", session.token));
        }
        let response = request.send().await?;
        decode_body(path, response).await
    }

    async fn get<T: DeserializeOwned>(
        &self,
        path: &str,
        session: &Session,
    ) -> Result<T, DirectoryError> {
        let response = self
            .http
            .get(format!("{}{}", self.base_url, path))
            .header(AUTHORIZATION, format!("token {}", session.token))
            .send()
            .await?;
        decode_body(path, response).await
    }

    /// Remove a node registration. Not part of the provisioning workflow;
    /// exposed through the `delete` CLI verb.
    pub async fn delete_node(
        &self,
        session: &Session,
        node_sn: &str,
    ) -> Result<(), DirectoryError> {
        self.post_form::<types::ResultResponse>(
            "/v1/nodes/delete",
            &[("node_sn", node_sn)],
            Some(session),
        )
        .await?
        .into_ok()
    }
}

/// The server reports failures in the JSON body, not in the status line,
/// so decode the body regardless of status and only fall back to the
/// status text when the body is not parseable.
async fn decode_body<T: DeserializeOwned>(
    path: &str,
    response: reqwest::Response,
) -> Result<T, DirectoryError> {
    let status = response.status();
    let body = response.text().await?;
    debug!(path, %status, "directory response");
    serde_json::from_str(&body)
        .map_err(|_| DirectoryError::Malformed(format!("{} returned status {}", path, status)))
}

impl Directory for DirectoryClient {
    async fn login(&self, email: &str, password: &str) -> Result<Session, DirectoryError> {
        self.post_form::<types::LoginResponse>(
            "/v1/user/login",
            &[("email", email), ("password", password)],
            None,
        )
        .await?
        .into_session()
    }

    async fn create_node(
        &self,
        session: &Session,
        name: &str,
        board: &str,
    ) -> Result<NodeCredentials, DirectoryError> {
        self.post_form::<types::CreateNodeResponse>(
            "/v1/nodes/create",
            &[("name", name), ("board", board)],
            Some(session),
        )
        .await?
        .into_credentials()
    }

    async fn list_nodes(&self, session: &Session) -> Result<Vec<Node>, DirectoryError> {
        self.get::<types::NodeListResponse>("/v1/nodes/list", session)
            .await?
            .into_nodes()
    }

    async fn rename_node(
        &self,
        session: &Session,
        node_sn: &str,
        name: &str,
    ) -> Result<(), DirectoryError> {
        self.post_form::<types::ResultResponse>(
            "/v1/nodes/rename",
            &[("node_sn", node_sn), ("name", name)],
            Some(session),
        )
        .await?
        .into_ok()
    }
}
