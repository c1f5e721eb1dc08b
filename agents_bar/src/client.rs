//! HTTP client for the Agents Bar remote-agent API.
//!
//! A client only exists after a successful login and a positive existence
//! check for its agent; the bearer token and agent name never change after
//! that.

use crate::agent::{RemoteAgent, Transition};
use crate::error::AgentError;
use crate::settings::ApiConfig;
use async_trait::async_trait;
use reqwest::header::{ACCEPT, AUTHORIZATION};
use reqwest::{Client, RequestBuilder, Response, StatusCode, Url};
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::{debug, info, instrument};

const LOGIN_PATH: &str = "login/access-token";

/// Login material for [`AgentsBarClient::connect`].
#[derive(Clone)]
pub struct Credentials {
    pub username: String,
    pub password: String,
    pub agent_name: String,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("agent_name", &self.agent_name)
            .finish()
    }
}

/// OAuth2 password-grant form; unused fields are sent empty.
#[derive(Serialize)]
struct LoginForm<'a> {
    grant_type: &'a str,
    username: &'a str,
    password: &'a str,
    scope: &'a str,
    client_id: &'a str,
    client_secret: &'a str,
}

#[derive(Deserialize)]
struct TokenResponse {
    token_type: String,
    access_token: String,
}

#[derive(Deserialize)]
struct ActResponse {
    action: Vec<f64>,
}

/// Authenticated session bound to one remote agent.
pub struct AgentsBarClient {
    http: Client,
    base_url: Url,
    agent_name: String,
    /// `"<token_type> <access_token>"`, sent verbatim as `Authorization`.
    token: String,
}

impl AgentsBarClient {
    /// Logs in and verifies that the agent exists.
    #[instrument(skip(api, credentials), fields(user = %credentials.username, agent = %credentials.agent_name))]
    pub async fn connect(api: &ApiConfig, credentials: &Credentials) -> Result<Self, AgentError> {
        let configuration = |reason: String| AgentError::Configuration {
            agent: credentials.agent_name.clone(),
            reason,
        };

        let base_url = Url::parse(&api.base_url)
            .map_err(|e| configuration(format!("invalid base URL '{}': {e}", api.base_url)))?;
        if base_url.cannot_be_a_base() {
            return Err(configuration(format!("base URL '{}' cannot hold paths", api.base_url)));
        }

        let http = Client::builder()
            .timeout(api.timeout())
            .danger_accept_invalid_certs(!api.verify_tls)
            .build()
            .map_err(|e| configuration(format!("could not build HTTP client: {e}")))?;

        let token = Self::login(&http, &base_url, &credentials.username, &credentials.password).await?;

        let client = Self {
            http,
            base_url,
            agent_name: credentials.agent_name.clone(),
            token,
        };

        match client.agent_exists(&client.agent_name).await {
            Ok(true) => {
                info!("Connected to agent '{}'", client.agent_name);
                Ok(client)
            }
            Ok(false) => Err(configuration("agent does not exist".to_string())),
            Err(err) => Err(configuration(format!("could not verify that the agent exists: {err}"))),
        }
    }

    /// Exchanges credentials for a bearer token. Every call re-authenticates.
    async fn login(http: &Client, base_url: &Url, username: &str, password: &str) -> Result<String, AgentError> {
        let form = LoginForm {
            grant_type: "",
            username,
            password,
            scope: "",
            client_id: "",
            client_secret: "",
        };

        let response = http
            .post(endpoint_url(base_url, &["login", "access-token"]))
            .header(ACCEPT, "application/json")
            .form(&form)
            .send()
            .await
            .map_err(|e| AgentError::transport(LOGIN_PATH, e))?;

        let status = response.status();
        if status != StatusCode::OK {
            return Err(AgentError::Authentication {
                username: username.to_string(),
                status: status.as_u16(),
            });
        }

        let body: TokenResponse = response
            .json()
            .await
            .map_err(|e| AgentError::protocol(LOGIN_PATH, format!("malformed token response: {e}")))?;

        debug!(token_type = %body.token_type, "Login succeeded");
        Ok(format!("{} {}", body.token_type, body.access_token))
    }

    /// Whether `agent` exists for the logged-in user.
    #[instrument(skip(self))]
    pub async fn agent_exists(&self, agent: &str) -> Result<bool, AgentError> {
        let segments = ["agents", agent];
        let label = segments.join("/");
        let response = self.send(self.http.get(self.endpoint(&segments)), &label).await?;

        match response.status() {
            StatusCode::OK => Ok(true),
            StatusCode::NOT_FOUND => Ok(false),
            status => Err(unexpected_status(&label, status, response).await),
        }
    }

    pub fn agent_name(&self) -> &str {
        &self.agent_name
    }

    pub fn token(&self) -> &str {
        &self.token
    }

    fn endpoint(&self, segments: &[&str]) -> Url {
        endpoint_url(&self.base_url, segments)
    }

    async fn send(&self, request: RequestBuilder, label: &str) -> Result<Response, AgentError> {
        request
            .header(AUTHORIZATION, &self.token)
            .header(ACCEPT, "application/json")
            .send()
            .await
            .map_err(|e| AgentError::transport(label, e))
    }
}

#[async_trait]
impl RemoteAgent for AgentsBarClient {
    fn name(&self) -> &str {
        &self.agent_name
    }

    #[instrument(skip(self, observation))]
    async fn request_action(&self, observation: &[f64], noise: f64) -> Result<f64, AgentError> {
        let segments = ["agents", self.agent_name.as_str(), "act"];
        let label = segments.join("/");
        let request = self
            .http
            .post(self.endpoint(&segments))
            .query(&[("noise", noise)])
            .json(observation);
        let response = self.send(request, &label).await?;

        let status = response.status();
        if status != StatusCode::OK {
            return Err(unexpected_status(&label, status, response).await);
        }

        let body: ActResponse = response
            .json()
            .await
            .map_err(|e| AgentError::protocol(&label, format!("malformed action response: {e}")))?;

        match body.action.as_slice() {
            [action] => {
                debug!(action = *action, "Received action");
                Ok(*action)
            }
            other => Err(AgentError::protocol(
                &label,
                format!("expected exactly one action, got {:?}", other),
            )),
        }
    }

    #[instrument(skip(self, transition), fields(done = transition.done))]
    async fn report_step(&self, transition: &Transition) -> Result<(), AgentError> {
        let segments = ["agents", self.agent_name.as_str(), "step"];
        let label = segments.join("/");
        let request = self
            .http
            .post(self.endpoint(&segments))
            .json(&transition.to_wire());
        let response = self.send(request, &label).await?;

        match response.status() {
            StatusCode::ACCEPTED => Ok(()),
            status => Err(unexpected_status(&label, status, response).await),
        }
    }
}

/// `base` with `segments` appended as percent-encoded path segments.
fn endpoint_url(base: &Url, segments: &[&str]) -> Url {
    let mut url = base.clone();
    if let Ok(mut path) = url.path_segments_mut() {
        path.pop_if_empty().extend(segments);
    }
    url
}

async fn unexpected_status(label: &str, status: StatusCode, response: Response) -> AgentError {
    let body = response.text().await.unwrap_or_default();
    AgentError::communication(label, Some(status.as_u16()), &body)
}
