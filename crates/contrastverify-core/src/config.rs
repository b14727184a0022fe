//! Configuration resolution and validation.
//!
//! All validation errors accumulate into a single aggregated report; the
//! gate never fails one input at a time.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use regex::Regex;

use contrastverify_types::Severity;

use crate::inputs::{included_severities, lookup_non_empty, InputSource};

pub const DEFAULT_API_URL: &str = "https://app.contrastsecurity.com/Contrast/api/ng/";
pub const DEFAULT_SEVERITIES: &str = "CRITICAL,HIGH";

/// The API path every base URL is normalized to end with.
const EXPECTED_API_PATH: &str = "/Contrast/api/ng/";

/// Certificate trust configuration, from the `CA_FILE` input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Trust {
    /// System trust roots.
    Default,
    /// PEM content supplied inline; staged to disk once and added as a
    /// trust root.
    CustomPem(String),
    /// Certificate verification disabled (`CA_FILE=FALSE`).
    Insecure,
}

/// Immutable run configuration. Constructed once by [`resolve_config`] and
/// passed by reference into each component.
#[derive(Debug, Clone)]
pub struct Config {
    pub api_key: String,
    pub authorization: String,
    pub org_id: String,
    /// Normalized API root including the trailing `{org_id}/` segment.
    pub base_url: String,
    pub app_id: Option<String>,
    pub app_name: Option<String>,
    /// Empty string means "no version filter".
    pub build_number: String,
    pub job_start_time: Option<i64>,
    /// Configured severities in descending severity order, deduplicated.
    pub severities: Vec<Severity>,
    pub fail_threshold: u64,
    /// Anchored pattern identifying baseline version tags whose findings
    /// are excluded from the open count.
    pub baseline_pattern: Option<Regex>,
    pub trust: Trust,
}

/// Aggregated configuration failure. `missing` holds one entry per invalid
/// or absent input, in documentation order.
#[derive(Debug, Clone, thiserror::Error)]
#[error("Missing required inputs: {}, please see documentation for correct usage.", missing.join(", "))]
pub struct ConfigError {
    pub missing: Vec<String>,
}

/// Gathers and validates every input, reporting all problems at once.
pub fn resolve_config(source: &dyn InputSource) -> Result<Config, ConfigError> {
    let mut errors: Vec<String> = Vec::new();

    let api_key = lookup_non_empty(source, "API_KEY");
    if api_key.is_none() {
        errors.push("apiKey".to_string());
    }

    let org_id = lookup_non_empty(source, "ORG_ID");
    if org_id.is_none() {
        errors.push("orgId".to_string());
    }

    let authorization = match lookup_non_empty(source, "AUTH_HEADER") {
        Some(header) => Some(header),
        None => {
            let username = lookup_non_empty(source, "USER_NAME");
            let service_key = lookup_non_empty(source, "SERVICE_KEY");
            match (username, service_key) {
                (Some(user), Some(key)) => Some(BASE64.encode(format!("{user}:{key}"))),
                _ => {
                    errors.push("authHeader or (userName and serviceKey)".to_string());
                    None
                }
            }
        }
    };

    let app_id = lookup_non_empty(source, "APP_ID");
    let app_name = if app_id.is_some() {
        None
    } else {
        lookup_non_empty(source, "APP_NAME")
    };
    if app_id.is_none() && app_name.is_none() {
        errors.push("appId or appName".to_string());
    }

    let url = lookup_non_empty(source, "API_URL").unwrap_or_else(|| DEFAULT_API_URL.to_string());
    if !url.starts_with("https://") && !url.starts_with("http://") {
        errors.push("apiUrl (must start with http:// or https://)".to_string());
    }

    let job_start_time = match lookup_non_empty(source, "JOB_START_TIME") {
        Some(raw) => match raw.parse::<i64>() {
            Ok(value) => Some(value),
            Err(_) => {
                errors.push("jobStartTime (must be a number)".to_string());
                None
            }
        },
        None => None,
    };

    let severities_csv =
        lookup_non_empty(source, "SEVERITIES").unwrap_or_else(|| DEFAULT_SEVERITIES.to_string());
    let severities = included_severities(&severities_csv);

    let fail_threshold = match lookup_non_empty(source, "FAIL_THRESHOLD") {
        Some(raw) => match raw.parse::<u64>() {
            Ok(value) => value,
            Err(_) => {
                errors.push("failThreshold (must be a number)".to_string());
                0
            }
        },
        None => 0,
    };

    let build_number = lookup_non_empty(source, "BUILD_NUMBER").unwrap_or_default();

    let baseline_pattern = match lookup_non_empty(source, "BASELINE_BUILD_NUMBER_PATTERN") {
        Some(raw) => match Regex::new(&format!("^(?:{raw})$")) {
            Ok(pattern) => {
                if !build_number.is_empty() && pattern.is_match(&build_number) {
                    errors.push(
                        "baselineBuildNumberPattern (must not match buildNumber, \
                         this would exclude all findings)"
                            .to_string(),
                    );
                }
                Some(pattern)
            }
            Err(_) => {
                errors.push(
                    "baselineBuildNumberPattern (must be a valid regular expression)".to_string(),
                );
                None
            }
        },
        None => None,
    };

    let trust = match lookup_non_empty(source, "CA_FILE") {
        Some(value) if value.eq_ignore_ascii_case("FALSE") => Trust::Insecure,
        Some(pem) => Trust::CustomPem(pem),
        None => Trust::Default,
    };

    if !errors.is_empty() {
        return Err(ConfigError { missing: errors });
    }

    // Checked above: errors is empty, so these are all present.
    let (Some(api_key), Some(org_id), Some(authorization)) = (api_key, org_id, authorization)
    else {
        return Err(ConfigError { missing: errors });
    };

    let base_url = format!("{}{org_id}/", normalize_api_url(&url));

    Ok(Config {
        api_key,
        authorization,
        org_id,
        base_url,
        app_id,
        app_name,
        build_number,
        job_start_time,
        severities,
        fail_threshold,
        baseline_pattern,
        trust,
    })
}

/// Forces the URL path to be exactly `/Contrast/api/ng/`, preserving scheme
/// and authority.
fn normalize_api_url(url: &str) -> String {
    let Some((scheme, rest)) = url.split_once("://") else {
        return url.to_string();
    };
    let netloc = rest.split('/').next().unwrap_or(rest);
    let path = &rest[netloc.len()..];
    if path == EXPECTED_API_PATH {
        url.to_string()
    } else {
        format!("{scheme}://{netloc}{EXPECTED_API_PATH}")
    }
}
