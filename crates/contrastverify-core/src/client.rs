//! Thin TeamServer REST client.
//!
//! Adds the common header set to every request, optionally pins a custom
//! trust root, and raises on any non-2xx response. No retries: a request
//! error is terminal for the run.

use std::path::PathBuf;

use reqwest::blocking::{Client, Response};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, ACCEPT, AUTHORIZATION, CONTENT_TYPE};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::debug;

use contrastverify_types::{
    ApplicationsByName, SecurityCheckEnvelope, SecurityCheckRequest, TraceFilterRequest,
    TraceFilterResponse,
};

use crate::config::{Config, Trust};
use crate::output::OutputHelper;

/// File name the inline CA PEM content is staged under, in the system
/// temp directory.
const CA_FILE_NAME: &str = "contrastverify_ca_file.pem";

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("HTTP {status} from {path} - {body}")]
    Status {
        status: u16,
        path: String,
        body: String,
    },

    #[error("request to {path} failed - {source}")]
    Transport {
        path: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("could not build HTTP client - {source}")]
    Build {
        #[source]
        source: reqwest::Error,
    },

    #[error("could not stage CA file at {path} - {source}")]
    CaFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("credential value for {name} is not a valid header value")]
    InvalidHeader { name: &'static str },
}

/// The TeamServer operations the gate needs. The production implementation
/// is [`TeamServerClient`]; tests substitute an in-memory fake.
pub trait TeamServerApi {
    /// Connection check. Fails when credentials are rejected.
    fn profile(&self) -> Result<(), ApiError>;

    /// Organization access check.
    fn organizations(&self) -> Result<(), ApiError>;

    /// Existence check for a caller-supplied application id.
    fn application_exists(&self, app_id: &str) -> Result<(), ApiError>;

    /// Name-filtered application search.
    fn applications_by_name(&self, name: &str) -> Result<ApplicationsByName, ApiError>;

    /// Server-side job outcome policy evaluation.
    fn security_check(
        &self,
        request: &SecurityCheckRequest,
    ) -> Result<SecurityCheckEnvelope, ApiError>;

    /// One page of the open-trace enumeration.
    fn traces_page(
        &self,
        app_id: &str,
        request: &TraceFilterRequest,
        limit: u32,
        offset: u64,
    ) -> Result<TraceFilterResponse, ApiError>;
}

pub struct TeamServerClient {
    http: Client,
    base_url: String,
    user_agent: String,
}

/// Composes the integration user agent: integration name/version (with a
/// `-github-action` suffix under that host), HTTP library identity, and
/// language runtime.
pub fn user_agent_string(github_actions: bool) -> String {
    let suffix = if github_actions { "-github-action" } else { "" };
    format!(
        "contrastverify{suffix}/{} reqwest rust",
        env!("CARGO_PKG_VERSION")
    )
}

impl TeamServerClient {
    pub fn new(config: &Config, github_actions: bool, out: &OutputHelper) -> Result<Self, ApiError> {
        let user_agent = user_agent_string(github_actions);

        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(
            HeaderName::from_static("api-key"),
            HeaderValue::from_str(&config.api_key)
                .map_err(|_| ApiError::InvalidHeader { name: "Api-Key" })?,
        );
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&config.authorization)
                .map_err(|_| ApiError::InvalidHeader { name: "Authorization" })?,
        );

        let mut builder = Client::builder()
            .default_headers(headers)
            .user_agent(user_agent.clone());

        match &config.trust {
            Trust::Default => {}
            Trust::CustomPem(pem) => {
                let path = stage_ca_file(pem)?;
                out.info(&format!("Wrote ca_cert(s) to {}", path.display()));
                let certificate = reqwest::Certificate::from_pem(pem.as_bytes())
                    .map_err(|source| ApiError::Build { source })?;
                builder = builder.add_root_certificate(certificate);
            }
            Trust::Insecure => {
                out.warning("Certificate verification is disabled (CA_FILE=FALSE)");
                builder = builder.danger_accept_invalid_certs(true);
            }
        }

        let http = builder
            .build()
            .map_err(|source| ApiError::Build { source })?;

        Ok(Self {
            http,
            base_url: config.base_url.clone(),
            user_agent,
        })
    }

    pub fn user_agent(&self) -> &str {
        &self.user_agent
    }

    /// Origin tag sent in the security check body: the first user-agent token.
    pub fn origin(&self) -> &str {
        self.user_agent
            .split_whitespace()
            .next()
            .unwrap_or(&self.user_agent)
    }

    fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<T, ApiError> {
        debug!(path, ?query, "GET");
        let response = self
            .http
            .get(format!("{}{path}", self.base_url))
            .query(query)
            .send()
            .map_err(|source| ApiError::Transport {
                path: path.to_string(),
                source,
            })?;
        let response = check_status(path, response)?;
        response.json().map_err(|source| ApiError::Transport {
            path: path.to_string(),
            source,
        })
    }

    fn post_json<T: DeserializeOwned, B: Serialize>(
        &self,
        path: &str,
        body: &B,
        query: &[(&str, String)],
    ) -> Result<T, ApiError> {
        debug!(path, ?query, "POST");
        let response = self
            .http
            .post(format!("{}{path}", self.base_url))
            .query(query)
            .json(body)
            .send()
            .map_err(|source| ApiError::Transport {
                path: path.to_string(),
                source,
            })?;
        let response = check_status(path, response)?;
        response.json().map_err(|source| ApiError::Transport {
            path: path.to_string(),
            source,
        })
    }
}

impl TeamServerApi for TeamServerClient {
    fn profile(&self) -> Result<(), ApiError> {
        let _: serde_json::Value = self.get_json("profile/", &[])?;
        Ok(())
    }

    fn organizations(&self) -> Result<(), ApiError> {
        let _: serde_json::Value = self.get_json("organizations/", &[])?;
        Ok(())
    }

    fn application_exists(&self, app_id: &str) -> Result<(), ApiError> {
        let _: serde_json::Value = self.get_json(&format!("applications/{app_id}"), &[])?;
        Ok(())
    }

    fn applications_by_name(&self, name: &str) -> Result<ApplicationsByName, ApiError> {
        self.get_json(
            "applications/name",
            &[("filterText", name.to_string())],
        )
    }

    fn security_check(
        &self,
        request: &SecurityCheckRequest,
    ) -> Result<SecurityCheckEnvelope, ApiError> {
        self.post_json("securityChecks", request, &[])
    }

    fn traces_page(
        &self,
        app_id: &str,
        request: &TraceFilterRequest,
        limit: u32,
        offset: u64,
    ) -> Result<TraceFilterResponse, ApiError> {
        self.post_json(
            &format!("traces/{app_id}/filter"),
            request,
            &[("limit", limit.to_string()), ("offset", offset.to_string())],
        )
    }
}

fn check_status(path: &str, response: Response) -> Result<Response, ApiError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().unwrap_or_default();
    Err(ApiError::Status {
        status: status.as_u16(),
        path: path.to_string(),
        body,
    })
}

/// Writes the inline PEM content to the temp directory once so the path can
/// be referenced in diagnostics.
fn stage_ca_file(pem: &str) -> Result<PathBuf, ApiError> {
    let path = std::env::temp_dir().join(CA_FILE_NAME);
    std::fs::write(&path, pem).map_err(|source| ApiError::CaFile {
        path: path.clone(),
        source,
    })?;
    Ok(path)
}
