use uuid::Uuid;

use crate::core::security;
use crate::core::state::AppState;
use crate::core::time::primitive_now_utc;
use crate::db::types::UserRole;
use crate::repositories;

/// Makes sure the configured admin account exists, is active and uses the configured password.
pub(crate) async fn ensure_admin(state: &AppState) -> anyhow::Result<()> {
    let admin = state.settings().admin();
    if admin.first_admin_password.is_empty() {
        tracing::warn!("FIRST_ADMIN_PASSWORD not configured; skipping admin creation");
        return Ok(());
    }

    let email = admin.first_admin_email.trim().to_lowercase();
    let now = primitive_now_utc();

    if let Some(user) = repositories::users::find_by_email(state.db(), &email).await? {
        let password_matches =
            security::verify_password(&admin.first_admin_password, &user.hashed_password)
                .unwrap_or(false);

        if password_matches && user.role == UserRole::Admin && user.is_active {
            tracing::info!("Default admin already up to date");
            return Ok(());
        }

        let hashed_password = if password_matches {
            user.hashed_password.clone()
        } else {
            security::hash_password(&admin.first_admin_password)?
        };
        repositories::users::promote_to_admin(state.db(), &user.id, &hashed_password, now).await?;

        tracing::info!(email = %email, "Updated default admin");
        return Ok(());
    }

    let id = Uuid::new_v4().to_string();
    repositories::users::create(
        state.db(),
        repositories::users::CreateUser {
            id: &id,
            email: &email,
            hashed_password: security::hash_password(&admin.first_admin_password)?,
            first_name: "Admin",
            last_name: "User",
            role: UserRole::Admin,
            created_at: now,
        },
    )
    .await?;

    tracing::info!(email = %email, "Created default admin");
    Ok(())
}
