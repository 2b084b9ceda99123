//! Submission documents and grading result shapes
//!
//! A submission records one student's graded attempt at a test: the grading
//! engine's per-case outcomes, rolled up per question and into a final score.

use chrono::{DateTime, Utc};
use mongodb::bson::oid::ObjectId;
use mongodb::bson::serde_helpers::chrono_datetime_as_bson_datetime;
use serde::{Deserialize, Serialize};
use validator::Validate;

/// Grading verdict for one test case
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Verdict {
    Accepted,
    #[serde(rename = "Wrong Answer")]
    WrongAnswer,
    /// Ran but the execution failed (wrong answer at runtime, TLE, RE)
    Failed,
    /// The case could not be judged at all
    Error,
}

/// Outcome of running one test case through the grading engine
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TestCaseResult {
    /// 1-based position within the question
    pub test_case_id: u32,
    pub input: String,
    pub expected_output: String,
    pub status: String,
    pub compile_output: String,
    pub stdout: String,
    pub stderr: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub memory: Option<i64>,
    pub passed: bool,
    pub verdict: Verdict,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Grading detail for one question of the test
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuestionResult {
    /// 0-based index into the test's question list
    pub question_index: u32,
    pub points: u32,
    pub awarded: f64,
    pub passed_cases: u32,
    pub total_cases: u32,
    pub cases: Vec<TestCaseResult>,
}

impl QuestionResult {
    /// Roll case outcomes up into an awarded score.
    ///
    /// Points are awarded proportionally to passed cases; a question with no
    /// cases awards nothing (creation validation prevents that shape anyway).
    pub fn from_cases(question_index: u32, points: u32, cases: Vec<TestCaseResult>) -> Self {
        let total_cases = cases.len() as u32;
        let passed_cases = cases.iter().filter(|c| c.passed).count() as u32;
        let awarded = if total_cases == 0 {
            0.0
        } else {
            f64::from(points) * f64::from(passed_cases) / f64::from(total_cases)
        };
        Self {
            question_index,
            points,
            awarded,
            passed_cases,
            total_cases,
            cases,
        }
    }
}

/// Submission document as stored in the `submissions` collection
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Submission {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub test_id: ObjectId,
    pub student_id: ObjectId,
    pub language: String,
    pub score: f64,
    pub max_score: f64,
    pub passed_cases: u32,
    pub total_cases: u32,
    pub results: Vec<QuestionResult>,
    #[serde(with = "chrono_datetime_as_bson_datetime")]
    pub submitted_at: DateTime<Utc>,
}

// ============================================
// Requests
// ============================================

#[derive(Debug, Deserialize, Validate)]
pub struct SubmitTestRequest {
    /// One answer per question, in question order
    #[validate(length(min = 1, message = "A submission needs at least one answer"), nested)]
    pub answers: Vec<AnswerInput>,
}

#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct AnswerInput {
    #[validate(length(min = 1, message = "Answer source code must not be empty"))]
    pub source_code: String,
}

// ============================================
// Responses
// ============================================

#[derive(Debug, Serialize)]
pub struct SubmissionResponse {
    pub id: String,
    pub test_id: String,
    pub test_title: String,
    pub language: String,
    pub score: f64,
    pub max_score: f64,
    pub passed_cases: u32,
    pub total_cases: u32,
    pub results: Vec<QuestionResult>,
    pub submitted_at: DateTime<Utc>,
}

/// One row of the student's taken-tests listing (submissions joined with
/// test titles by the aggregation in `SubmissionService::list_student_tests`)
#[derive(Debug, Serialize)]
pub struct StudentTestEntry {
    pub submission_id: String,
    pub test_id: String,
    pub test_title: String,
    pub language: String,
    pub score: f64,
    pub max_score: f64,
    pub passed_cases: i64,
    pub total_cases: i64,
    pub submitted_at: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct StudentTestsResponse {
    pub submissions: Vec<StudentTestEntry>,
}

/// One calendar day of submission activity
#[derive(Debug, Serialize)]
pub struct HeatmapBucket {
    /// `YYYY-MM-DD`
    pub date: String,
    pub submissions: i64,
    /// Mean of score/max_score across the day's submissions, 0..=1
    pub avg_score_ratio: f64,
}

#[derive(Debug, Serialize)]
pub struct HeatmapResponse {
    pub days: i64,
    pub buckets: Vec<HeatmapBucket>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn case(id: u32, passed: bool) -> TestCaseResult {
        TestCaseResult {
            test_case_id: id,
            input: String::new(),
            expected_output: String::new(),
            status: "Accepted".to_string(),
            compile_output: String::new(),
            stdout: String::new(),
            stderr: String::new(),
            time: None,
            memory: None,
            passed,
            verdict: if passed { Verdict::Accepted } else { Verdict::WrongAnswer },
            error: None,
        }
    }

    #[test]
    fn test_question_score_is_proportional() {
        let result = QuestionResult::from_cases(0, 4, vec![case(1, true), case(2, false)]);
        assert_eq!(result.awarded, 2.0);
        assert_eq!(result.passed_cases, 1);
        assert_eq!(result.total_cases, 2);
    }

    #[test]
    fn test_question_with_all_passed_awards_full_points() {
        let result = QuestionResult::from_cases(1, 5, vec![case(1, true), case(2, true)]);
        assert_eq!(result.awarded, 5.0);
    }

    #[test]
    fn test_verdict_serializes_like_the_grader() {
        assert_eq!(serde_json::to_string(&Verdict::Accepted).unwrap(), "\"Accepted\"");
        assert_eq!(serde_json::to_string(&Verdict::WrongAnswer).unwrap(), "\"Wrong Answer\"");
        assert_eq!(serde_json::to_string(&Verdict::Failed).unwrap(), "\"Failed\"");
        assert_eq!(serde_json::to_string(&Verdict::Error).unwrap(), "\"Error\"");
    }
}
