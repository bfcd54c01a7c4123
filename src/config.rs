//! Connection configuration loaded from `conf/config.json`.
//!
//! The file is consumed as-is: the tool does not validate server URLs or
//! credentials, it only needs enough structure to build the client.
use anyhow::{Context, Result};
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

/// Default location of the config file, relative to the working directory.
pub const DEFAULT_CONFIG_PATH: &str = "conf/config.json";

const REDACTED: &str = "<redacted>";

/// Top level of `conf/config.json`.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AppConfig {
    pub octane: OctaneConfig,
}

/// Server coordinates and credentials for the Octane REST API.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OctaneConfig {
    pub server: String,
    #[serde(deserialize_with = "deserialize_id")]
    pub shared_space: String,
    #[serde(deserialize_with = "deserialize_id")]
    pub workspace: String,
    #[serde(default)]
    pub user: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
    /// Extra headers sent with every request.
    #[serde(default)]
    pub headers: BTreeMap<String, String>,
}

impl OctaneConfig {
    /// Credentials for sign-in, when both halves are configured.
    pub fn credentials(&self) -> Option<(&str, &str)> {
        match (self.user.as_deref(), self.password.as_deref()) {
            (Some(user), Some(password)) => Some((user, password)),
            _ => None,
        }
    }

    /// Copy safe to log: the password is replaced.
    pub fn redacted(&self) -> OctaneConfig {
        let mut copy = self.clone();
        if copy.password.is_some() {
            copy.password = Some(REDACTED.to_string());
        }
        copy
    }
}

/// Space ids show up as numbers or strings depending on who wrote the file.
fn deserialize_id<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match serde_json::Value::deserialize(deserializer)? {
        serde_json::Value::String(text) => Ok(text),
        serde_json::Value::Number(number) => Ok(number.to_string()),
        other => Err(serde::de::Error::custom(format!(
            "expected a number or string id, got {other}"
        ))),
    }
}

/// Load the config file; any failure here aborts the run.
pub fn load_config(path: &Path) -> Result<AppConfig> {
    let bytes = fs::read(path).with_context(|| format!("read config {}", path.display()))?;
    let config: AppConfig = serde_json::from_slice(&bytes)
        .with_context(|| format!("parse config JSON {}", path.display()))?;
    tracing::debug!(
        config = %serde_json::to_string(&config.octane.redacted()).unwrap_or_default(),
        "loaded config"
    );
    Ok(config)
}
