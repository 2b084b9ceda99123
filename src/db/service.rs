//! Database services
//!
//! Typed collection access for tests, submissions, and users. Handlers never
//! touch collections directly; every query path lives here.

use crate::db::{SUBMISSIONS_COLLECTION, TESTS_COLLECTION, USERS_COLLECTION};
use crate::error::AppError;
use crate::models::{HeatmapBucket, StudentTestEntry, Submission, Test, TestSummary, User};
use chrono::{Duration, Utc};
use futures_util::TryStreamExt;
use mongodb::bson::oid::ObjectId;
use mongodb::bson::{doc, Bson, Document};
use mongodb::{Collection, Database};

/// Test collection operations
#[derive(Clone)]
pub struct TestService {
    tests: Collection<Test>,
}

impl TestService {
    pub fn new(database: &Database) -> Self {
        Self {
            tests: database.collection(TESTS_COLLECTION),
        }
    }

    pub async fn create(&self, mut test: Test) -> Result<Test, AppError> {
        let inserted = self.tests.insert_one(&test).await?;
        test.id = inserted.inserted_id.as_object_id();
        Ok(test)
    }

    pub async fn find_by_id(&self, id: ObjectId) -> Result<Option<Test>, AppError> {
        Ok(self.tests.find_one(doc! { "_id": id }).await?)
    }

    /// All tests, newest first, reduced to listing metadata
    pub async fn list_summaries(&self) -> Result<Vec<TestSummary>, AppError> {
        let cursor = self
            .tests
            .find(doc! {})
            .sort(doc! { "created_at": -1 })
            .await?;
        let tests: Vec<Test> = cursor.try_collect().await?;
        Ok(tests.iter().map(TestSummary::from).collect())
    }

    /// Full documents authored by one teacher, newest first
    pub async fn list_by_creator(&self, creator: ObjectId) -> Result<Vec<Test>, AppError> {
        let cursor = self
            .tests
            .find(doc! { "created_by": creator })
            .sort(doc! { "created_at": -1 })
            .await?;
        Ok(cursor.try_collect().await?)
    }
}

/// Submission collection operations
#[derive(Clone)]
pub struct SubmissionService {
    submissions: Collection<Submission>,
}

impl SubmissionService {
    pub fn new(database: &Database) -> Self {
        Self {
            submissions: database.collection(SUBMISSIONS_COLLECTION),
        }
    }

    pub async fn create(&self, mut submission: Submission) -> Result<Submission, AppError> {
        let inserted = self.submissions.insert_one(&submission).await?;
        submission.id = inserted.inserted_id.as_object_id();
        Ok(submission)
    }

    /// The student's graded submissions joined with test titles, newest first
    pub async fn list_student_tests(
        &self,
        student: ObjectId,
    ) -> Result<Vec<StudentTestEntry>, AppError> {
        let cursor = self
            .submissions
            .aggregate(student_tests_pipeline(student))
            .await?;
        let rows: Vec<Document> = cursor.try_collect().await?;

        rows.iter()
            .map(|row| {
                Ok(StudentTestEntry {
                    submission_id: row.get_object_id("submission_id").map_err(row_err)?.to_hex(),
                    test_id: row.get_object_id("test_id").map_err(row_err)?.to_hex(),
                    test_title: row.get_str("test_title").map_err(row_err)?.to_string(),
                    language: row.get_str("language").map_err(row_err)?.to_string(),
                    score: get_number(row, "score"),
                    max_score: get_number(row, "max_score"),
                    passed_cases: get_count(row, "passed_cases"),
                    total_cases: get_count(row, "total_cases"),
                    submitted_at: row.get_datetime("submitted_at").map_err(row_err)?.to_chrono(),
                })
            })
            .collect()
    }

    /// Submission activity per calendar day over the trailing window
    pub async fn heatmap(&self, days: i64) -> Result<Vec<HeatmapBucket>, AppError> {
        let since = Utc::now() - Duration::days(days);
        let cursor = self
            .submissions
            .aggregate(heatmap_pipeline(mongodb::bson::DateTime::from_chrono(since)))
            .await?;
        let rows: Vec<Document> = cursor.try_collect().await?;

        rows.iter()
            .map(|row| {
                Ok(HeatmapBucket {
                    date: row.get_str("date").map_err(row_err)?.to_string(),
                    submissions: get_count(row, "submissions"),
                    avg_score_ratio: get_number(row, "avg_score_ratio"),
                })
            })
            .collect()
    }
}

fn row_err(e: mongodb::bson::document::ValueAccessError) -> AppError {
    AppError::Internal(format!("Malformed aggregation row: {}", e))
}

/// Counters come back as Int32 or Int64 depending on magnitude
fn get_count(row: &Document, key: &str) -> i64 {
    match row.get(key) {
        Some(Bson::Int32(v)) => i64::from(*v),
        Some(Bson::Int64(v)) => *v,
        Some(Bson::Double(v)) => *v as i64,
        _ => 0,
    }
}

fn get_number(row: &Document, key: &str) -> f64 {
    match row.get(key) {
        Some(Bson::Double(v)) => *v,
        Some(Bson::Int32(v)) => f64::from(*v),
        Some(Bson::Int64(v)) => *v as f64,
        _ => 0.0,
    }
}

fn student_tests_pipeline(student: ObjectId) -> Vec<Document> {
    vec![
        doc! { "$match": { "student_id": student } },
        doc! { "$sort": { "submitted_at": -1 } },
        doc! { "$lookup": {
            "from": TESTS_COLLECTION,
            "localField": "test_id",
            "foreignField": "_id",
            "as": "test",
        } },
        // keep rows whose test was deleted since submission
        doc! { "$unwind": { "path": "$test", "preserveNullAndEmptyArrays": true } },
        doc! { "$project": {
            "_id": 0,
            "submission_id": "$_id",
            "test_id": 1,
            "test_title": { "$ifNull": ["$test.title", "(deleted test)"] },
            "language": 1,
            "score": 1,
            "max_score": 1,
            "passed_cases": 1,
            "total_cases": 1,
            "submitted_at": 1,
        } },
    ]
}

fn heatmap_pipeline(since: mongodb::bson::DateTime) -> Vec<Document> {
    vec![
        doc! { "$match": { "submitted_at": { "$gte": since } } },
        doc! { "$group": {
            "_id": { "$dateToString": { "format": "%Y-%m-%d", "date": "$submitted_at" } },
            "submissions": { "$sum": 1 },
            "avg_score_ratio": { "$avg": { "$cond": [
                { "$gt": ["$max_score", 0] },
                { "$divide": ["$score", "$max_score"] },
                0.0,
            ] } },
        } },
        doc! { "$project": {
            "_id": 0,
            "date": "$_id",
            "submissions": 1,
            "avg_score_ratio": 1,
        } },
        doc! { "$sort": { "date": 1 } },
    ]
}

/// User collection operations
#[derive(Clone)]
pub struct UserService {
    users: Collection<User>,
}

impl UserService {
    pub fn new(database: &Database) -> Self {
        Self {
            users: database.collection(USERS_COLLECTION),
        }
    }

    pub async fn create(&self, mut user: User) -> Result<User, AppError> {
        match self.users.insert_one(&user).await {
            Ok(inserted) => {
                user.id = inserted.inserted_id.as_object_id();
                Ok(user)
            }
            Err(e) if is_duplicate_key(&e) => {
                Err(AppError::Conflict("Email already registered".to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }

    pub async fn find_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        Ok(self.users.find_one(doc! { "email": email }).await?)
    }

    pub async fn find_by_id(&self, id: ObjectId) -> Result<Option<User>, AppError> {
        Ok(self.users.find_one(doc! { "_id": id }).await?)
    }
}

/// The unique index on `users.email` reports violations as write error 11000
fn is_duplicate_key(error: &mongodb::error::Error) -> bool {
    use mongodb::error::{ErrorKind, WriteFailure};
    matches!(&*error.kind, ErrorKind::Write(WriteFailure::WriteError(we)) if we.code == 11000)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_heatmap_pipeline_groups_by_day() {
        let pipeline = heatmap_pipeline(mongodb::bson::DateTime::now());

        assert!(pipeline[0].contains_key("$match"));
        let group = pipeline[1].get_document("$group").unwrap();
        let id = group.get_document("_id").unwrap();
        let date_spec = id.get_document("$dateToString").unwrap();
        assert_eq!(date_spec.get_str("format").unwrap(), "%Y-%m-%d");
        assert!(group.contains_key("submissions"));
        assert!(group.contains_key("avg_score_ratio"));
    }

    #[test]
    fn test_student_tests_pipeline_joins_tests() {
        let pipeline = student_tests_pipeline(ObjectId::new());

        let lookup = pipeline[2].get_document("$lookup").unwrap();
        assert_eq!(lookup.get_str("from").unwrap(), TESTS_COLLECTION);
        assert_eq!(lookup.get_str("localField").unwrap(), "test_id");
        assert_eq!(lookup.get_str("foreignField").unwrap(), "_id");
        // the projection hides the raw _id and exposes submission_id instead
        let project = pipeline[4].get_document("$project").unwrap();
        assert_eq!(project.get_i32("_id").unwrap(), 0);
        assert_eq!(project.get_str("submission_id").unwrap(), "$_id");
    }
}
