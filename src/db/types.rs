use serde::{Deserialize, Serialize};
use sqlx::Type;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(type_name = "userrole", rename_all = "lowercase")]
pub(crate) enum UserRole {
    Learner,
    Trainer,
    Admin,
}

impl UserRole {
    pub(crate) fn as_str(self) -> &'static str {
        match self {
            Self::Learner => "learner",
            Self::Trainer => "trainer",
            Self::Admin => "admin",
        }
    }

    /// Trainers and admins may author catalog content.
    pub(crate) fn is_staff(self) -> bool {
        matches!(self, Self::Trainer | Self::Admin)
    }

    pub(crate) fn is_admin(self) -> bool {
        matches!(self, Self::Admin)
    }
}

#[cfg(test)]
mod tests {
    use super::UserRole;

    #[test]
    fn role_serializes_lowercase() {
        assert_eq!(serde_json::to_value(UserRole::Trainer).unwrap(), "trainer");
        let parsed: UserRole = serde_json::from_value(serde_json::json!("admin")).unwrap();
        assert_eq!(parsed, UserRole::Admin);
        assert!(serde_json::from_value::<UserRole>(serde_json::json!("root")).is_err());
    }

    #[test]
    fn staff_roles() {
        assert!(!UserRole::Learner.is_staff());
        assert!(UserRole::Trainer.is_staff());
        assert!(UserRole::Admin.is_staff());
        assert!(!UserRole::Trainer.is_admin());
    }
}
