use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::schemas::user::UserResponse;

pub(crate) const MIN_PASSWORD_LEN: u64 = 8;

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct SignupRequest {
    #[validate(email(message = "email must be a valid address"))]
    pub(crate) email: String,
    #[validate(length(min = MIN_PASSWORD_LEN, message = "Password must be at least 8 characters long"))]
    pub(crate) password: String,
    #[serde(alias = "firstName")]
    #[validate(length(min = 1, max = 100, message = "first_name must not be empty"))]
    pub(crate) first_name: String,
    #[serde(alias = "lastName")]
    #[validate(length(min = 1, max = 100, message = "last_name must not be empty"))]
    pub(crate) last_name: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct LoginRequest {
    pub(crate) email: String,
    pub(crate) password: String,
}

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct PasswordChange {
    #[serde(alias = "currentPassword")]
    pub(crate) current_password: String,
    #[serde(alias = "newPassword")]
    #[validate(length(min = MIN_PASSWORD_LEN, message = "Password must be at least 8 characters long"))]
    pub(crate) new_password: String,
}

#[derive(Debug, Serialize)]
pub(crate) struct TokenResponse {
    pub(crate) token: String,
    pub(crate) token_type: String,
    pub(crate) user: UserResponse,
}

impl TokenResponse {
    pub(crate) fn bearer(token: String, user: UserResponse) -> Self {
        Self { token, token_type: "bearer".to_string(), user }
    }
}
