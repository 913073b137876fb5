use chrono::Utc;
use sqlx::PgPool;
use uuid::Uuid;

use hyperskill_auth::PasswordService;
use hyperskill_common::AppError;

use crate::models::Account;
use crate::store::{AccountRepository, AdminRepository, CreateOutcome, Store};

pub async fn run_migrations(pool: &PgPool) -> Result<(), AppError> {
    sqlx::migrate!("./migrations")
        .run(pool)
        .await
        .map_err(|e| AppError::Internal(format!("Migration error: {}", e)))?;

    tracing::info!("Database migrations completed");
    Ok(())
}

// Ensures the configured admin account exists and sits on the allow-list.
// Admin authorization is membership in `admins`, never a fixed credential
// compare, so the seed is the only way an admin comes into being.
pub async fn seed_admin(store: &dyn Store, email: &str, password: &str) -> Result<(), AppError> {
    if let Some(existing) = store.accounts().find_by_email(email).await? {
        store.admins().add(existing.account_id).await?;
        return Ok(());
    }

    let account = Account {
        account_id: Uuid::new_v4(),
        email: email.to_string(),
        phone: None,
        password_hash: PasswordService::hash_password(password)?,
        created_at: Utc::now(),
    };

    match store.accounts().create_if_absent(account).await? {
        CreateOutcome::Created(created) => {
            store.admins().add(created.account_id).await?;
            tracing::info!("Admin account created: {}", email);
        }
        CreateOutcome::AlreadyExists => {
            // Lost a race with a concurrent seed; the account is there now.
            if let Some(existing) = store.accounts().find_by_email(email).await? {
                store.admins().add(existing.account_id).await?;
            }
        }
    }

    Ok(())
}
