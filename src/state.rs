//! Application state management
//!
//! Contains shared state accessible across all handlers. The database handle
//! is owned here and injected into handlers by axum state extraction; there
//! is no module-global connection.

use crate::config::GradingConfig;
use crate::db::service::{SubmissionService, TestService, UserService};
use crate::grading::Judge0Client;
use mongodb::Database;
use std::sync::Arc;

/// Application state shared across all handlers
pub struct AppState {
    /// Process-wide database handle (created once at startup)
    pub db: Database,

    /// Test collection service
    pub tests: TestService,

    /// Submission collection service
    pub submissions: SubmissionService,

    /// User collection service
    pub users: UserService,

    /// Grading engine client
    pub grader: Judge0Client,
}

impl AppState {
    pub fn new(db: Database, grading: &GradingConfig) -> Self {
        let tests = TestService::new(&db);
        let submissions = SubmissionService::new(&db);
        let users = UserService::new(&db);

        Self {
            db,
            tests,
            submissions,
            users,
            grader: Judge0Client::new(grading),
        }
    }
}

/// Type alias for shared state
pub type SharedState = Arc<AppState>;
