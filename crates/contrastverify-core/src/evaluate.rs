//! Gate evaluation.
//!
//! Step 1 asks TeamServer for a job outcome policy verdict. When no policy
//! matches, step 2 paginates the open findings, buckets them by severity
//! (excluding baseline-tagged findings), and compares the total against the
//! configured fail threshold.

use contrastverify_types::{
    GateDecision, SecurityCheckFilter, SecurityCheckRequest, Severity, SeverityBreakdown,
    TraceFilterRequest, QUERY_BY_APP_VERSION_TAG, QUICK_FILTER_OPEN, TIMESTAMP_FILTER_FIRST,
};

use crate::client::{ApiError, TeamServerApi};
use crate::config::Config;
use crate::output::OutputHelper;

/// Fixed page size for the trace filter endpoint.
pub const TRACES_PAGE_LIMIT: u32 = 25;

/// Runs the gate for a resolved application and returns the terminal
/// decision. Emits informational notes along the way; the caller renders
/// the final pass/fail line and exits.
pub fn verify_application(
    api: &dyn TeamServerApi,
    config: &Config,
    out: &OutputHelper,
    app_id: &str,
    origin: &str,
) -> Result<GateDecision, ApiError> {
    let mut version_tags = Vec::new();
    if !config.build_number.is_empty() {
        // an empty build number must produce an empty array, never [""]
        out.info(&format!(
            "Using app version tags: [{}]",
            config.build_number
        ));
        version_tags.push(config.build_number.clone());
    }

    let request = SecurityCheckRequest {
        application_id: app_id.to_string(),
        job_start_time: config.job_start_time.unwrap_or(0),
        security_check_filter: SecurityCheckFilter {
            query_by: QUERY_BY_APP_VERSION_TAG.to_string(),
            app_version_tags: version_tags,
        },
        origin: origin.to_string(),
    };

    let envelope = api.security_check(&request)?;
    out.debug(&serde_json::to_string(&envelope).unwrap_or_default());

    match envelope.security_check.result {
        Some(true) => Ok(GateDecision::PolicyPass),
        Some(false) => {
            let policy = envelope.security_check.job_outcome_policy.unwrap_or_default();
            if !config.build_number.is_empty() && !policy.opt_into_query {
                out.info(&format!(
                    "Matching policy \"{}\" is not configured to apply the \"query \
                     vulnerabilities by selection from the plugin when filtering \
                     vulnerabilities\" option, this means all open vulnerabilities will \
                     be considered, not just those from the build_number input.",
                    policy.name
                ));
            }
            if config.job_start_time.is_none() && policy.is_job_start_time {
                out.info(&format!(
                    "Matching policy \"{}\" has job start time configured, but no job \
                     start time was provided, so 0 was passed to consider all open \
                     vulnerabilities.",
                    policy.name
                ));
            }
            Ok(GateDecision::PolicyFail {
                outcome: policy.outcome,
                name: policy.name,
            })
        }
        None => {
            out.info("No matching job outcome policy, checking vulnerabilities against threshold...");
            let breakdown = count_open_vulnerabilities(api, config, out, app_id)?;
            for (severity, count) in breakdown.iter() {
                out.info(&format!("{}: {count} open", severity.as_str()));
            }
            let threshold = config.fail_threshold;
            if breakdown.total() > threshold {
                Ok(GateDecision::CountFail {
                    breakdown,
                    threshold,
                })
            } else {
                Ok(GateDecision::CountPass {
                    breakdown,
                    threshold,
                })
            }
        }
    }
}

/// Paginates the open findings and buckets them by configured severity,
/// skipping findings whose version tags match the baseline pattern.
///
/// The loop ends when the accumulated count reaches the server-reported
/// total, or when a page comes back empty (inconsistent server totals must
/// not spin forever).
fn count_open_vulnerabilities(
    api: &dyn TeamServerApi,
    config: &Config,
    out: &OutputHelper,
    app_id: &str,
) -> Result<SeverityBreakdown, ApiError> {
    let request = TraceFilterRequest {
        severities: config.severities.clone(),
        app_version_tags: (!config.build_number.is_empty())
            .then(|| vec![config.build_number.clone()]),
        timestamp_filter: TIMESTAMP_FILTER_FIRST.to_string(),
        start_date: config.job_start_time.unwrap_or(0),
        quick_filter: QUICK_FILTER_OPEN.to_string(),
    };

    let mut breakdown = SeverityBreakdown::new(&config.severities);
    let mut seen: u64 = 0;
    let mut offset: u64 = 0;

    loop {
        let page = api.traces_page(app_id, &request, TRACES_PAGE_LIMIT, offset)?;
        out.debug(&format!(
            "traces page offset={offset} items={} total={}",
            page.traces.len(),
            page.count
        ));

        if page.traces.is_empty() {
            break;
        }

        for trace in &page.traces {
            seen = seen.saturating_add(1);

            if let Some(pattern) = &config.baseline_pattern {
                if trace.app_version_tags.iter().any(|tag| pattern.is_match(tag)) {
                    out.debug(&format!(
                        "Excluding finding {} ({}) with baseline version tag(s) {:?}",
                        trace.uuid, trace.rule_name, trace.app_version_tags
                    ));
                    continue;
                }
            }

            if let Some(severity) = Severity::from_token(&trace.severity) {
                breakdown.increment(severity);
            }
        }

        if seen >= page.count {
            break;
        }
        offset += u64::from(TRACES_PAGE_LIMIT);
    }

    Ok(breakdown)
}
