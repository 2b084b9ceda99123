//! Authentication and authorization module
//!
//! Provides JWT-based authentication and role-based access control for the
//! two account kinds the platform knows: students take tests, teachers
//! author them.

mod jwt;
mod middleware;
mod password;

pub use jwt::{create_tokens, decode_token, refresh_tokens, Claims, TokenPair};
pub use middleware::{auth_middleware, require_role};
pub use password::{hash_password, verify_password};

use serde::{Deserialize, Serialize};

/// User roles for authorization
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Takes tests and submits solutions
    Student,
    /// Authors tests and reviews results
    Teacher,
}

impl Role {
    pub fn can_author(&self) -> bool {
        matches!(self, Role::Teacher)
    }

    pub fn can_submit(&self) -> bool {
        matches!(self, Role::Student)
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Role::Student => write!(f, "student"),
            Role::Teacher => write!(f, "teacher"),
        }
    }
}
