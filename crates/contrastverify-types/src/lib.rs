//! Data types (TeamServer wire records + gate decision model) for contrastverify.
//!
//! This crate is intentionally "dumb": pure DTOs with serde.

use serde::{Deserialize, Serialize};

// ── Frozen Vocabulary ──────────────────────────────────────────
/// Query mode for the security check filter.
pub const QUERY_BY_APP_VERSION_TAG: &str = "APP_VERSION_TAG";
/// Timestamp filter for the trace filter endpoint.
pub const TIMESTAMP_FILTER_FIRST: &str = "FIRST";
/// Quick filter selecting only open (unremediated) traces.
pub const QUICK_FILTER_OPEN: &str = "OPEN";

/// All vulnerability severities, in descending severity order.
pub const ALL_SEVERITIES: [Severity; 5] = [
    Severity::Critical,
    Severity::High,
    Severity::Medium,
    Severity::Low,
    Severity::Note,
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Severity {
    Critical,
    High,
    Medium,
    Low,
    Note,
}

impl Severity {
    pub fn as_str(self) -> &'static str {
        match self {
            Severity::Critical => "CRITICAL",
            Severity::High => "HIGH",
            Severity::Medium => "MEDIUM",
            Severity::Low => "LOW",
            Severity::Note => "NOTE",
        }
    }

    /// Case-insensitive parse of a severity token ("Critical", "HIGH", ...).
    /// Unknown tokens yield `None`.
    pub fn from_token(token: &str) -> Option<Self> {
        match token.trim().to_ascii_uppercase().as_str() {
            "CRITICAL" => Some(Severity::Critical),
            "HIGH" => Some(Severity::High),
            "MEDIUM" => Some(Severity::Medium),
            "LOW" => Some(Severity::Low),
            "NOTE" => Some(Severity::Note),
            _ => None,
        }
    }
}

/// Per-severity open-finding counts, covering exactly the configured
/// severities, zero-initialized, in descending severity order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeverityBreakdown {
    buckets: Vec<(Severity, u64)>,
}

impl SeverityBreakdown {
    pub fn new(severities: &[Severity]) -> Self {
        Self {
            buckets: severities.iter().map(|&s| (s, 0)).collect(),
        }
    }

    /// Increments the bucket for `severity`. Returns false when the severity
    /// is not one of the configured buckets.
    pub fn increment(&mut self, severity: Severity) -> bool {
        for (bucket, count) in &mut self.buckets {
            if *bucket == severity {
                *count = count.saturating_add(1);
                return true;
            }
        }
        false
    }

    pub fn total(&self) -> u64 {
        self.buckets.iter().map(|(_, count)| count).sum()
    }

    pub fn iter(&self) -> impl Iterator<Item = (Severity, u64)> + '_ {
        self.buckets.iter().copied()
    }
}

// ── Application lookup ─────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApplicationsByName {
    #[serde(default)]
    pub applications: Vec<ApplicationRecord>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApplicationRecord {
    pub name: String,
    pub app_id: String,
}

// ── Security check (job outcome policy) ────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SecurityCheckRequest {
    pub application_id: String,
    pub job_start_time: i64,
    pub security_check_filter: SecurityCheckFilter,
    pub origin: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SecurityCheckFilter {
    pub query_by: String,
    /// Empty when no build number was supplied; never `[""]`.
    pub app_version_tags: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SecurityCheckEnvelope {
    pub security_check: SecurityCheck,
}

/// Tri-state policy outcome: pass, fail-with-policy, or no policy matched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SecurityCheck {
    #[serde(default)]
    pub result: Option<bool>,
    #[serde(default)]
    pub job_outcome_policy: Option<JobOutcomePolicy>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobOutcomePolicy {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub outcome: String,
    /// Whether the policy scopes vulnerabilities by the plugin-supplied
    /// version tags.
    #[serde(default)]
    pub opt_into_query: bool,
    /// Whether the policy requires a job start time.
    #[serde(default)]
    pub is_job_start_time: bool,
}

// ── Trace (open finding) enumeration ───────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TraceFilterRequest {
    pub severities: Vec<Severity>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub app_version_tags: Option<Vec<String>>,
    pub timestamp_filter: String,
    pub start_date: i64,
    pub quick_filter: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TraceFilterResponse {
    #[serde(default)]
    pub traces: Vec<TraceRecord>,
    /// Server-reported total for the filter, across all pages.
    #[serde(default)]
    pub count: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TraceRecord {
    #[serde(default)]
    pub uuid: String,
    pub severity: String,
    #[serde(default)]
    pub rule_name: String,
    #[serde(default)]
    pub app_version_tags: Vec<String>,
}

// ── Gate decision ──────────────────────────────────────────────

/// Terminal outcome of the gate evaluation.
///
/// `PolicyPass`/`PolicyFail` come straight from a matching job outcome
/// policy; `CountPass`/`CountFail` are the threshold fallback when no
/// policy matched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GateDecision {
    PolicyPass,
    PolicyFail {
        outcome: String,
        name: String,
    },
    CountPass {
        breakdown: SeverityBreakdown,
        threshold: u64,
    },
    CountFail {
        breakdown: SeverityBreakdown,
        threshold: u64,
    },
}

impl GateDecision {
    pub fn passed(&self) -> bool {
        matches!(
            self,
            GateDecision::PolicyPass | GateDecision::CountPass { .. }
        )
    }

    pub fn breakdown(&self) -> Option<&SeverityBreakdown> {
        match self {
            GateDecision::CountPass { breakdown, .. }
            | GateDecision::CountFail { breakdown, .. } => Some(breakdown),
            _ => None,
        }
    }

    /// The single human-readable pass/fail line for this outcome.
    pub fn message(&self) -> String {
        match self {
            GateDecision::PolicyPass => "Step passes matching policy".to_string(),
            GateDecision::PolicyFail { outcome, name } => format!(
                "Contrast verify gate fails with status {outcome} - policy \"{name}\""
            ),
            GateDecision::CountPass { breakdown, .. } => format!(
                "The vulnerability count is {} (below threshold)",
                breakdown.total()
            ),
            GateDecision::CountFail {
                breakdown,
                threshold,
            } => format!(
                "The vulnerability count is {} - Contrast verify gate fails as this is \
                 above threshold (threshold allows {threshold})",
                breakdown.total()
            ),
        }
    }
}
