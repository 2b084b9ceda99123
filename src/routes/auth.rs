//! Authentication route handlers
//!
//! Registration, login, token refresh, and the role-scoped test listings
//! (a student's taken tests, a teacher's authored tests).

use crate::auth::{
    create_tokens, hash_password, refresh_tokens, require_role, verify_password, Claims, Role,
    TokenPair,
};
use crate::error::{ApiResult, AppError};
use crate::models::{
    StudentTestsResponse, SuccessResponse, TeacherTest, User, UserResponse,
};
use crate::state::SharedState;
use axum::extract::State;
use axum::http::StatusCode;
use axum::{Extension, Json};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::info;

// ============================================
// Request/Response Types
// ============================================

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    pub name: String,
    pub role: Role,
}

#[derive(Debug, Deserialize)]
pub struct RefreshRequest {
    pub refresh_token: String,
}

#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub success: bool,
    pub user: UserResponse,
    pub tokens: TokenPair,
}

#[derive(Debug, Serialize)]
pub struct TokenResponse {
    pub success: bool,
    pub tokens: TokenPair,
}

// ============================================
// Route Handlers
// ============================================

/// POST /auth/register
///
/// Register a new student or teacher account.
pub async fn register(
    State(state): State<SharedState>,
    Json(req): Json<RegisterRequest>,
) -> ApiResult<(StatusCode, Json<AuthResponse>)> {
    if req.email.is_empty() || !req.email.contains('@') {
        return Err(AppError::BadRequest("Invalid email address".to_string()));
    }
    if req.password.len() < 8 {
        return Err(AppError::BadRequest(
            "Password must be at least 8 characters".to_string(),
        ));
    }
    if req.name.is_empty() {
        return Err(AppError::BadRequest("Name is required".to_string()));
    }

    if state.users.find_by_email(&req.email).await?.is_some() {
        return Err(AppError::Conflict("Email already registered".to_string()));
    }

    let password_hash = hash_password(&req.password)?;

    let now = Utc::now();
    let user = User {
        id: None,
        email: req.email,
        password_hash,
        name: req.name,
        role: req.role,
        created_at: now,
        updated_at: now,
    };

    let created = state.users.create(user).await?;
    let user_id = created
        .id
        .ok_or_else(|| AppError::Internal("Created user has no id".to_string()))?;

    info!("Registered {} account for {}", created.role, created.email);

    let tokens = create_tokens(user_id, &created.email, created.role)?;

    Ok((
        StatusCode::CREATED,
        Json(AuthResponse {
            success: true,
            user: UserResponse::from(&created),
            tokens,
        }),
    ))
}

/// POST /auth/login
///
/// Authenticate with email and password, receive JWT tokens.
pub async fn login(
    State(state): State<SharedState>,
    Json(req): Json<LoginRequest>,
) -> ApiResult<Json<AuthResponse>> {
    let user = state
        .users
        .find_by_email(&req.email)
        .await?
        .ok_or_else(|| AppError::Unauthorized("Invalid email or password".to_string()))?;

    if !verify_password(&req.password, &user.password_hash)? {
        return Err(AppError::Unauthorized("Invalid email or password".to_string()));
    }

    let user_id = user
        .id
        .ok_or_else(|| AppError::Internal("Stored user has no id".to_string()))?;
    let tokens = create_tokens(user_id, &user.email, user.role)?;

    Ok(Json(AuthResponse {
        success: true,
        user: UserResponse::from(&user),
        tokens,
    }))
}

/// POST /auth/refresh
///
/// Refresh access token using refresh token.
pub async fn refresh(Json(req): Json<RefreshRequest>) -> ApiResult<Json<TokenResponse>> {
    let tokens = refresh_tokens(&req.refresh_token)?;

    Ok(Json(TokenResponse {
        success: true,
        tokens,
    }))
}

/// GET /student-tests
///
/// The authenticated student's graded submissions with test titles.
pub async fn get_student_tests(
    State(state): State<SharedState>,
    Extension(claims): Extension<Claims>,
) -> ApiResult<Json<SuccessResponse<StudentTestsResponse>>> {
    require_role(&claims, Role::Student)?;

    let submissions = state
        .submissions
        .list_student_tests(claims.user_id()?)
        .await?;
    info!("Listed {} submissions for {}", submissions.len(), claims.email);

    Ok(Json(SuccessResponse::with_data(
        "Student tests fetched successfully.",
        StudentTestsResponse { submissions },
    )))
}

/// GET /teacher-tests
///
/// Tests authored by the authenticated teacher, with expected outputs.
pub async fn get_teacher_tests(
    State(state): State<SharedState>,
    Extension(claims): Extension<Claims>,
) -> ApiResult<Json<SuccessResponse<TeacherTestsResponse>>> {
    require_role(&claims, Role::Teacher)?;

    let tests = state.tests.list_by_creator(claims.user_id()?).await?;
    info!("Listed {} authored tests for {}", tests.len(), claims.email);

    Ok(Json(SuccessResponse::with_data(
        "Teacher tests fetched successfully.",
        TeacherTestsResponse {
            tests: tests.into_iter().map(TeacherTest::from).collect(),
        },
    )))
}

#[derive(Debug, Serialize)]
pub struct TeacherTestsResponse {
    pub tests: Vec<TeacherTest>,
}
