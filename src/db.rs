//! Database connection management
//!
//! Bootstraps the MongoDB client at startup and defines collection access.

pub mod service;

use crate::config::DatabaseConfig;
use crate::error::AppError;
use mongodb::bson::doc;
use mongodb::options::{ClientOptions, IndexOptions};
use mongodb::{Client, Database, IndexModel};
use tracing::info;

/// Collection holding authored tests
pub const TESTS_COLLECTION: &str = "tests";
/// Collection holding graded submissions
pub const SUBMISSIONS_COLLECTION: &str = "submissions";
/// Collection holding student and teacher accounts
pub const USERS_COLLECTION: &str = "users";

/// Open the process-wide database handle.
///
/// The driver connects lazily and discovers the topology on its own, so the
/// handle is probed with a `ping` command here: startup must not proceed on a
/// dead cluster. The caller decides what a failure means (main exits).
pub async fn connect(config: &DatabaseConfig) -> Result<Database, AppError> {
    let mut options = ClientOptions::parse(&config.uri).await?;
    options.app_name = Some(env!("CARGO_PKG_NAME").to_string());

    let client = Client::with_options(options)?;
    let database = client.database(&config.database);

    // Verify the connection before the listener binds
    database.run_command(doc! { "ping": 1 }).await?;

    info!("Database connected ({})", config.database);
    Ok(database)
}

/// Create the indexes the query paths rely on.
///
/// Best-effort at startup: the caller logs a failure and continues.
/// Registration re-checks the unique email constraint itself.
pub async fn ensure_indexes(database: &Database) -> Result<(), AppError> {
    let users = database.collection::<mongodb::bson::Document>(USERS_COLLECTION);
    users
        .create_index(
            IndexModel::builder()
                .keys(doc! { "email": 1 })
                .options(IndexOptions::builder().unique(true).build())
                .build(),
        )
        .await?;

    let tests = database.collection::<mongodb::bson::Document>(TESTS_COLLECTION);
    tests
        .create_index(IndexModel::builder().keys(doc! { "created_by": 1 }).build())
        .await?;

    let submissions = database.collection::<mongodb::bson::Document>(SUBMISSIONS_COLLECTION);
    submissions
        .create_index(IndexModel::builder().keys(doc! { "test_id": 1 }).build())
        .await?;
    submissions
        .create_index(IndexModel::builder().keys(doc! { "student_id": 1 }).build())
        .await?;
    submissions
        .create_index(IndexModel::builder().keys(doc! { "submitted_at": 1 }).build())
        .await?;

    info!("Database indexes ensured");
    Ok(())
}
