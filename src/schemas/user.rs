use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::core::time::format_primitive;
use crate::db::models::User;
use crate::db::types::UserRole;

#[derive(Debug, Serialize)]
pub(crate) struct UserResponse {
    pub(crate) id: String,
    pub(crate) email: String,
    pub(crate) first_name: String,
    pub(crate) last_name: String,
    pub(crate) full_name: String,
    pub(crate) bio: Option<String>,
    pub(crate) skills: Vec<String>,
    pub(crate) role: UserRole,
    pub(crate) is_active: bool,
    pub(crate) created_at: String,
}

impl UserResponse {
    pub(crate) fn from_db(user: User) -> Self {
        let full_name = user.full_name();
        Self {
            id: user.id,
            email: user.email,
            first_name: user.first_name,
            last_name: user.last_name,
            full_name,
            bio: user.bio,
            skills: user.skills.0,
            role: user.role,
            is_active: user.is_active,
            created_at: format_primitive(user.created_at),
        }
    }
}

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct ProfileUpdate {
    #[serde(default, alias = "firstName")]
    #[validate(length(min = 1, max = 100, message = "first_name must not be empty"))]
    pub(crate) first_name: Option<String>,
    #[serde(default, alias = "lastName")]
    #[validate(length(min = 1, max = 100, message = "last_name must not be empty"))]
    pub(crate) last_name: Option<String>,
    #[serde(default)]
    #[validate(length(max = 2000, message = "bio is too long"))]
    pub(crate) bio: Option<String>,
    #[serde(default)]
    #[validate(length(max = 50, message = "too many skills"))]
    pub(crate) skills: Option<Vec<String>>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RoleUpdate {
    pub(crate) role: UserRole,
}
