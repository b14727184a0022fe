//! Markdown rendering for the step summary.

use contrastverify_types::GateDecision;

/// Renders the gate outcome as step-summary Markdown: a status heading,
/// a severity table when the count fallback ran, and the decision line.
pub fn render_summary_markdown(decision: &GateDecision) -> String {
    let status = if decision.passed() { "PASS" } else { "FAIL" };
    let mut markdown = format!("## Contrast verify — {status}\n");

    if let Some(breakdown) = decision.breakdown() {
        markdown.push('\n');
        markdown.push_str("| Severity | Count |\n");
        markdown.push_str("| --- | ---: |\n");
        for (severity, count) in breakdown.iter() {
            markdown.push_str(&format!("| {} | {count} |\n", severity.as_str()));
        }
    }

    markdown.push('\n');
    markdown.push_str(&decision.message());
    markdown.push('\n');
    markdown
}

#[cfg(test)]
mod tests {
    use super::*;
    use contrastverify_types::{Severity, SeverityBreakdown};

    #[test]
    fn policy_pass_has_heading_and_message_but_no_table() {
        let markdown = render_summary_markdown(&GateDecision::PolicyPass);
        assert!(markdown.starts_with("## Contrast verify — PASS\n"));
        assert!(markdown.contains("Step passes matching policy"));
        assert!(!markdown.contains("| Severity |"));
    }

    #[test]
    fn policy_fail_reports_fail_status() {
        let markdown = render_summary_markdown(&GateDecision::PolicyFail {
            outcome: "FAILED".to_string(),
            name: "X".to_string(),
        });
        assert!(markdown.starts_with("## Contrast verify — FAIL\n"));
        assert!(markdown.contains("policy \"X\""));
    }

    #[test]
    fn count_outcome_renders_a_severity_table() {
        let mut breakdown = SeverityBreakdown::new(&[Severity::Critical, Severity::High]);
        breakdown.increment(Severity::High);
        breakdown.increment(Severity::High);
        let markdown = render_summary_markdown(&GateDecision::CountFail {
            breakdown,
            threshold: 0,
        });

        assert!(markdown.contains("| Severity | Count |"));
        assert!(markdown.contains("| CRITICAL | 0 |"));
        assert!(markdown.contains("| HIGH | 2 |"));
        assert!(markdown.contains("The vulnerability count is 2"));
    }
}
