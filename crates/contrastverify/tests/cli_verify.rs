use assert_cmd::cargo;
use assert_cmd::Command;

fn contrastverify_cmd() -> Command {
    let mut cmd = Command::new(cargo::cargo_bin!("contrastverify"));
    // isolate from the host environment and any real CI variables
    cmd.env_clear();
    cmd
}

fn stdout_of(cmd: &mut Command, expected_code: i32) -> String {
    let assert = cmd.assert().code(expected_code);
    String::from_utf8_lossy(&assert.get_output().stdout).to_string()
}

#[test]
fn missing_inputs_fail_with_aggregated_report() {
    let stdout = stdout_of(&mut contrastverify_cmd(), 1);
    assert!(
        stdout.contains(
            "ERROR: Missing required inputs: apiKey, orgId, \
             authHeader or (userName and serviceKey), appId or appName, \
             please see documentation for correct usage."
        ),
        "unexpected stdout: {stdout}"
    );
}

#[test]
fn non_http_api_url_is_rejected() {
    let mut cmd = contrastverify_cmd();
    cmd.env("API_KEY", "k")
        .env("ORG_ID", "o")
        .env("AUTH_HEADER", "h")
        .env("APP_ID", "an_app_uuid")
        .env("API_URL", "ftp://invalid.url.com");

    let stdout = stdout_of(&mut cmd, 1);
    assert!(stdout.contains("apiUrl (must start with http:// or https://)"));
}

#[test]
fn non_numeric_job_start_time_is_rejected() {
    let mut cmd = contrastverify_cmd();
    cmd.env("API_KEY", "k")
        .env("ORG_ID", "o")
        .env("AUTH_HEADER", "h")
        .env("APP_ID", "an_app_uuid")
        .env("JOB_START_TIME", "not_a_number");

    let stdout = stdout_of(&mut cmd, 1);
    assert!(stdout.contains("jobStartTime (must be a number)"));
}

#[test]
fn github_actions_input_format_is_recognized() {
    let mut cmd = contrastverify_cmd();
    cmd.env("INPUT_APIKEY", "k")
        .env("INPUT_ORGID", "o")
        .env("INPUT_AUTHHEADER", "h");

    // appId/appName is still missing, so only that error remains
    let stdout = stdout_of(&mut cmd, 1);
    assert!(
        stdout.contains("Missing required inputs: appId or appName,"),
        "unexpected stdout: {stdout}"
    );
}

#[test]
fn errors_use_workflow_commands_under_github_actions() {
    let mut cmd = contrastverify_cmd();
    cmd.env("GITHUB_ACTIONS", "true");

    let stdout = stdout_of(&mut cmd, 1);
    assert!(stdout.contains("::error::Missing required inputs:"));
}
