//! Judge0 HTTP client
//!
//! Submits prepared source to Judge0, polls for the execution result, and
//! maps execution outcomes to grading verdicts.

use crate::config::GradingConfig;
use crate::grading::LanguageConfig;
use crate::models::{TestCase, TestCaseResult, Verdict};
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, warn};

/// Delay between result polls
const POLL_INTERVAL: Duration = Duration::from_millis(500);

/// Per-case deadline for Judge0 to finish processing
const RESULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Judge0 status ids 1 (In Queue) and 2 (Processing) mean "not done yet"
const LAST_IN_PROGRESS_STATUS: i32 = 2;

/// Status id 3: ran to completion, stdout is comparable
const STATUS_ACCEPTED: i32 = 3;

/// Status ids 4-6: wrong answer, time limit exceeded, compilation error
const EXECUTION_FAILED_STATUSES: std::ops::RangeInclusive<i32> = 4..=6;

#[derive(Error, Debug)]
pub enum GradingError {
    #[error("Judge0 request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Judge0 did not return a submission token")]
    MissingToken,

    #[error("Submission processing timed out")]
    Timeout,
}

/// Client for one Judge0 deployment
pub struct Judge0Client {
    http: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
    api_host: Option<String>,
}

impl Judge0Client {
    pub fn new(config: &GradingConfig) -> Self {
        // RapidAPI wants the bare hostname echoed back in a header
        let api_host = url::Url::parse(&config.base_url)
            .ok()
            .and_then(|u| u.host_str().map(|h| h.to_string()));

        Self {
            http: reqwest::Client::new(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
            api_host,
        }
    }

    /// Run one answer against a question's test cases.
    ///
    /// A case that cannot be judged (transport failure, timeout) is recorded
    /// as an errored case and grading continues with the remaining cases; one
    /// flaky case must not void the rest of the submission.
    pub async fn evaluate(
        &self,
        language: &LanguageConfig,
        source_code: &str,
        cases: &[TestCase],
    ) -> Vec<TestCaseResult> {
        let prepared = language.prepare_source(source_code);
        let mut results = Vec::with_capacity(cases.len());

        for (idx, case) in cases.iter().enumerate() {
            let case_id = idx as u32 + 1;
            match self.run_case(&prepared, language.judge0_id, case).await {
                Ok(outcome) => results.push(judged_case(case_id, case, outcome)),
                Err(e) => {
                    warn!("Test case {} could not be judged: {}", case_id, e);
                    results.push(errored_case(case_id, case, e.to_string()));
                }
            }
        }

        results
    }

    async fn run_case(
        &self,
        prepared_source: &str,
        language_id: u32,
        case: &TestCase,
    ) -> Result<Judge0Result, GradingError> {
        let token = self.submit(prepared_source, language_id, &case.input).await?;
        debug!("Judge0 accepted submission, token {}", token);
        self.wait_for_result(&token).await
    }

    async fn submit(
        &self,
        source_code: &str,
        language_id: u32,
        stdin: &str,
    ) -> Result<String, GradingError> {
        let payload = json!({
            "source_code": source_code,
            "language_id": language_id,
            "stdin": stdin,
            "compile_output_only": false,
        });

        let response = self
            .with_auth(self.http.post(format!("{}/submissions", self.base_url)))
            .json(&payload)
            .send()
            .await?
            .error_for_status()?;

        let body: SubmissionToken = response.json().await?;
        body.token.ok_or(GradingError::MissingToken)
    }

    async fn wait_for_result(&self, token: &str) -> Result<Judge0Result, GradingError> {
        let deadline = tokio::time::Instant::now() + RESULT_TIMEOUT;

        loop {
            let response = self
                .with_auth(
                    self.http
                        .get(format!("{}/submissions/{}", self.base_url, token)),
                )
                .send()
                .await?
                .error_for_status()?;

            let result: Judge0Result = response.json().await?;
            if result.status.id > LAST_IN_PROGRESS_STATUS {
                return Ok(result);
            }

            if tokio::time::Instant::now() + POLL_INTERVAL > deadline {
                return Err(GradingError::Timeout);
            }
            tokio::time::sleep(POLL_INTERVAL).await;
        }
    }

    fn with_auth(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match (&self.api_key, &self.api_host) {
            (Some(key), Some(host)) => builder
                .header("X-RapidAPI-Key", key)
                .header("X-RapidAPI-Host", host),
            _ => builder,
        }
    }
}

#[derive(Debug, Deserialize)]
struct SubmissionToken {
    token: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
struct Judge0Status {
    #[serde(default)]
    id: i32,
    #[serde(default)]
    description: String,
}

/// Raw Judge0 submission result (`time` arrives as a decimal string)
#[derive(Debug, Deserialize, Default)]
struct Judge0Result {
    #[serde(default)]
    status: Judge0Status,
    stdout: Option<String>,
    stderr: Option<String>,
    compile_output: Option<String>,
    time: Option<String>,
    memory: Option<i64>,
}

/// Map a completed Judge0 result to a case verdict.
///
/// Accepted runs are compared on trimmed stdout; statuses 4-6 are execution
/// failures; anything else (internal errors, exec-format errors) is `Error`.
fn judged_case(case_id: u32, case: &TestCase, result: Judge0Result) -> TestCaseResult {
    let stdout = result.stdout.unwrap_or_default().trim().to_string();
    let stderr = result.stderr.unwrap_or_default().trim().to_string();
    let compile_output = result.compile_output.unwrap_or_default().trim().to_string();

    let (passed, verdict) = if result.status.id == STATUS_ACCEPTED {
        let passed = stdout == case.expected_output.trim();
        (passed, if passed { Verdict::Accepted } else { Verdict::WrongAnswer })
    } else if EXECUTION_FAILED_STATUSES.contains(&result.status.id) {
        (false, Verdict::Failed)
    } else {
        (false, Verdict::Error)
    };

    let status = if result.status.description.is_empty() {
        "Unknown".to_string()
    } else {
        result.status.description
    };

    TestCaseResult {
        test_case_id: case_id,
        input: case.input.clone(),
        expected_output: case.expected_output.clone(),
        status,
        compile_output,
        stdout,
        stderr,
        time: result.time,
        memory: result.memory,
        passed,
        verdict,
        error: None,
    }
}

fn errored_case(case_id: u32, case: &TestCase, message: String) -> TestCaseResult {
    TestCaseResult {
        test_case_id: case_id,
        input: case.input.clone(),
        expected_output: case.expected_output.clone(),
        status: "Error".to_string(),
        compile_output: String::new(),
        stdout: String::new(),
        stderr: String::new(),
        time: None,
        memory: None,
        passed: false,
        verdict: Verdict::Error,
        error: Some(message),
    }
}
