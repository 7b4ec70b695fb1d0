//! Blocking HTTP client for a running daemon, used by the CLI.

use std::collections::BTreeMap;
use std::time::Duration;

use healer_core::{DeviceId, PublicStatus};
use serde::de::DeserializeOwned;
use serde::Deserialize;

use crate::error::DaemonError;

pub const DEFAULT_URL: &str = "http://127.0.0.1:9106";

#[derive(Debug, Deserialize)]
struct StopResponse {
    ok: bool,
}

/// Talks to the daemon's HTTP API.
#[derive(Debug, Clone)]
pub struct DaemonClient {
    base_url: String,
    agent: ureq::Agent,
}

impl DaemonClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        let agent = ureq::AgentBuilder::new()
            .timeout(Duration::from_secs(10))
            .build();
        Self { base_url, agent }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn status(&self) -> Result<BTreeMap<DeviceId, PublicStatus>, DaemonError> {
        self.call_json("GET", "/api/status")
    }

    /// `Ok(None)` when the daemon answers that the device is not watched.
    pub fn get(&self, serial: &DeviceId) -> Result<Option<PublicStatus>, DaemonError> {
        match self.call_json("GET", &watch_path(serial)) {
            Ok(status) => Ok(Some(status)),
            Err(DaemonError::Http { status: 404, .. }) => Ok(None),
            Err(err) => Err(err),
        }
    }

    pub fn watch(&self, serial: &DeviceId) -> Result<PublicStatus, DaemonError> {
        self.call_json("POST", &watch_path(serial))
    }

    /// `Ok(false)` when the device was not being watched.
    pub fn unwatch(&self, serial: &DeviceId) -> Result<bool, DaemonError> {
        let response: StopResponse = self.call_json("DELETE", &watch_path(serial))?;
        Ok(response.ok)
    }

    pub fn metrics(&self) -> Result<String, DaemonError> {
        let url = format!("{}/metrics", self.base_url);
        let response = self
            .agent
            .request("GET", &url)
            .call()
            .map_err(|err| map_ureq_err(&url, err))?;
        response
            .into_string()
            .map_err(|err| DaemonError::Protocol(format!("read {url}: {err}")))
    }

    fn call_json<T: DeserializeOwned>(&self, method: &str, path: &str) -> Result<T, DaemonError> {
        let url = format!("{}{path}", self.base_url);
        let response = self
            .agent
            .request(method, &url)
            .call()
            .map_err(|err| map_ureq_err(&url, err))?;
        response
            .into_json()
            .map_err(|err| DaemonError::Protocol(format!("decode {url}: {err}")))
    }
}

fn watch_path(serial: &DeviceId) -> String {
    format!("/api/watch/{serial}")
}

fn map_ureq_err(url: &str, err: ureq::Error) -> DaemonError {
    match err {
        ureq::Error::Status(code, response) => {
            let body = response.into_string().unwrap_or_default();
            DaemonError::Http {
                url: url.to_string(),
                status: code,
                body,
            }
        }
        ureq::Error::Transport(transport) => match transport.kind() {
            ureq::ErrorKind::ConnectionFailed | ureq::ErrorKind::Dns => {
                DaemonError::DaemonNotRunning {
                    url: url.to_string(),
                }
            }
            _ => DaemonError::Protocol(format!("{url}: {transport}")),
        },
    }
}
