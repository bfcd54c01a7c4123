//! Blocking Octane REST client for the metadata endpoints.
//!
//! Everything the tally needs goes through [`MetadataApi::get_json`], a single
//! "execute custom GET" operation. Tests swap in an in-memory implementation.
use crate::config::OctaneConfig;
use crate::plan::Service;
use crate::util::{truncate_string, MAX_LOGGED_BODY_BYTES};
use anyhow::{anyhow, Context, Result};
use serde_json::Value;
use std::collections::BTreeMap;
use std::time::{Duration, Instant};

/// Opt-in header required by the metadata commands endpoint.
pub const TECH_PREVIEW_HEADER: &str = "ALM-OCTANE-TECH-PREVIEW";

const SIGN_IN_PATH: &str = "/authentication/sign_in";
const COMMANDS_PATH: &str = "/admin/metadata/commands";

/// Failure of a single metadata request.
#[derive(Debug, thiserror::Error)]
pub enum RequestError {
    #[error("HTTP {status}")]
    Status { status: u16, body: String },
    #[error("transport failure: {0}")]
    Transport(String),
    #[error("invalid JSON response: {message}")]
    Decode { message: String, body: String },
}

impl RequestError {
    pub fn status(&self) -> Option<u16> {
        match self {
            RequestError::Status { status, .. } => Some(*status),
            RequestError::Transport(_) | RequestError::Decode { .. } => None,
        }
    }

    pub fn body(&self) -> Option<&str> {
        match self {
            RequestError::Status { body, .. } | RequestError::Decode { body, .. } => Some(body),
            RequestError::Transport(_) => None,
        }
    }
}

/// Authenticated GET access to server-relative metadata paths.
pub trait MetadataApi {
    fn get_json(&self, path: &str) -> Result<Value, RequestError>;
}

pub fn sharedspace_entities_path(shared_space: &str) -> String {
    format!("/api/shared_spaces/{shared_space}/metadata/entities?show_all=true")
}

pub fn workspace_entities_path(shared_space: &str, workspace: &str) -> String {
    format!(
        "/api/shared_spaces/{shared_space}/workspaces/{workspace}/metadata/entities?show_all=true"
    )
}

/// Commands query for one entity, with one `service=` parameter per filter entry.
pub fn commands_path(entity: &str, services: &[Service]) -> String {
    let mut path = format!("{COMMANDS_PATH}?entity={entity}&flavor=DEFAULT");
    for service in services {
        path.push_str("&service=");
        path.push_str(service.as_str());
    }
    path
}

/// Configured headers minus the tech-preview opt-in, which every metadata
/// request already carries.
fn forwarded_headers(configured: &BTreeMap<String, String>) -> BTreeMap<String, String> {
    configured
        .iter()
        .filter(|(name, _)| !name.eq_ignore_ascii_case(TECH_PREVIEW_HEADER))
        .map(|(name, value)| (name.clone(), value.clone()))
        .collect()
}

/// Session-holding client for one Octane server.
pub struct OctaneClient {
    agent: ureq::Agent,
    server: String,
    headers: BTreeMap<String, String>,
}

impl OctaneClient {
    /// Build the agent and sign in when credentials are configured.
    ///
    /// The session cookie returned by sign-in is kept in the agent's cookie
    /// store and replayed on every later request.
    pub fn connect(config: &OctaneConfig, timeout: Duration) -> Result<Self> {
        let agent_config = ureq::Agent::config_builder()
            .timeout_global(Some(timeout))
            .http_status_as_error(false)
            .build();
        let client = Self {
            agent: ureq::Agent::new_with_config(agent_config),
            server: config.server.trim_end_matches('/').to_string(),
            headers: forwarded_headers(&config.headers),
        };
        if let Some((user, password)) = config.credentials() {
            client.sign_in(user, password)?;
        }
        Ok(client)
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.server, path)
    }

    fn sign_in(&self, user: &str, password: &str) -> Result<()> {
        let url = self.url(SIGN_IN_PATH);
        let mut request = self.agent.post(url.as_str());
        for (name, value) in &self.headers {
            request = request.header(name.as_str(), value.as_str());
        }
        let mut response = request
            .send_json(serde_json::json!({ "user": user, "password": password }))
            .with_context(|| format!("sign in to {url}"))?;
        let status = response.status();
        if !status.is_success() {
            let body = response.body_mut().read_to_string().unwrap_or_default();
            return Err(anyhow!(
                "sign in to {url} failed: HTTP {}: {}",
                status.as_u16(),
                truncate_string(body.trim(), MAX_LOGGED_BODY_BYTES)
            ));
        }
        tracing::info!(user, server = %self.server, "signed in");
        Ok(())
    }
}

impl MetadataApi for OctaneClient {
    fn get_json(&self, path: &str) -> Result<Value, RequestError> {
        let url = self.url(path);
        let start = Instant::now();
        let mut request = self.agent.get(url.as_str()).header(TECH_PREVIEW_HEADER, "true");
        for (name, value) in &self.headers {
            request = request.header(name.as_str(), value.as_str());
        }
        let mut response = request
            .call()
            .map_err(|err| RequestError::Transport(err.to_string()))?;
        let status = response.status().as_u16();
        let body = response
            .body_mut()
            .read_to_string()
            .map_err(|err| RequestError::Transport(err.to_string()))?;

        tracing::debug!(
            path,
            status,
            elapsed_ms = start.elapsed().as_millis(),
            body_bytes = body.len(),
            "metadata request complete"
        );

        if !(200..300).contains(&status) {
            return Err(RequestError::Status { status, body });
        }
        serde_json::from_str(&body).map_err(|err| RequestError::Decode {
            message: err.to_string(),
            body,
        })
    }
}
