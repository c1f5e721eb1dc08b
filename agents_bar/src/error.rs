//! Error taxonomy for the remote agent client, the environments and the driver.

use thiserror::Error;

/// Longest response body excerpt kept inside an error.
const BODY_SNIPPET_LEN: usize = 256;

/// Failures raised by the Agents Bar client.
///
/// Every variant is fatal to the caller: the client never retries.
#[derive(Error, Debug)]
pub enum AgentError {
    /// Login was answered with something other than `200 OK`.
    #[error("could not authenticate user '{username}' (HTTP {status})")]
    Authentication { username: String, status: u16 },

    /// The client cannot be used against the requested agent.
    #[error("agent '{agent}' is not usable: {reason}")]
    Configuration { agent: String, reason: String },

    /// Unexpected status, or no response at all (`status` is `None`).
    #[error("{}", communication_message(.endpoint, .status, .body))]
    Communication {
        endpoint: String,
        status: Option<u16>,
        body: String,
    },

    /// The service answered successfully but broke the wire contract.
    #[error("protocol violation on {endpoint}: {detail}")]
    Protocol { endpoint: String, detail: String },
}

impl AgentError {
    pub(crate) fn communication(endpoint: &str, status: Option<u16>, body: &str) -> Self {
        Self::Communication {
            endpoint: endpoint.to_string(),
            status,
            body: snippet(body),
        }
    }

    pub(crate) fn transport(endpoint: &str, err: reqwest::Error) -> Self {
        Self::communication(endpoint, err.status().map(|s| s.as_u16()), &err.to_string())
    }

    pub(crate) fn protocol(endpoint: &str, detail: impl Into<String>) -> Self {
        Self::Protocol {
            endpoint: endpoint.to_string(),
            detail: detail.into(),
        }
    }

    /// HTTP status attached to the error, when the service answered.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Authentication { status, .. } => Some(*status),
            Self::Communication { status, .. } => *status,
            _ => None,
        }
    }
}

fn communication_message(endpoint: &str, status: &Option<u16>, body: &str) -> String {
    match status {
        Some(code) => format!("unexpected HTTP {code} from {endpoint}: {body}"),
        None => format!("request to {endpoint} failed: {body}"),
    }
}

/// Truncates a response body on a character boundary.
pub(crate) fn snippet(body: &str) -> String {
    match body.char_indices().nth(BODY_SNIPPET_LEN) {
        Some((idx, _)) => format!("{}...", &body[..idx]),
        None => body.to_string(),
    }
}

/// Failures raised by an [`Environment`](crate::env::Environment).
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EnvError {
    #[error("action {value} is outside the action space {space}")]
    InvalidAction { value: f64, space: String },

    #[error("action value is not a finite number: {0}")]
    NonFiniteAction(f64),

    #[error("step called on a finished episode; call reset first")]
    EpisodeFinished,

    #[error("step called before the first reset")]
    NotReset,
}

/// Anything that can abort a training run.
#[derive(Error, Debug)]
pub enum DriverError {
    #[error(transparent)]
    Agent(#[from] AgentError),

    #[error(transparent)]
    Environment(#[from] EnvError),
}
