//! User business logic: registration, profile update, listing, deletion,
//! and password login. Generic over `ConnectionTrait` like the repo layer.

use std::time::SystemTime;

use sea_orm::ConnectionTrait;
use serde_json::{Map, Value};
use tracing::{debug, info, warn};
use ulid::Ulid;

use crate::auth::jwt::{mint_access_token, Role, DEFAULT_TOKEN_TTL};
use crate::auth::password::{hash_password, verify_password};
use crate::error::AppError;
use crate::repos::users::{self as users_repo, User};
use crate::state::security_config::SecurityConfig;

/// Redacts an email for logging. Keeps the first character of the local
/// part and the domain.
fn redact_email(email: &str) -> String {
    match email.split_once('@') {
        Some((local, domain)) => match local.chars().next() {
            Some(first) if local.chars().count() > 1 => format!("{first}***@{domain}"),
            _ => "***".to_string(),
        },
        None => "***".to_string(),
    }
}

pub async fn create_user<C: ConnectionTrait>(
    conn: &C,
    name: &str,
    email: &str,
    password: &str,
) -> Result<User, AppError> {
    if users_repo::find_user_by_email(conn, email).await?.is_some() {
        warn!(email = %redact_email(email), "registration rejected: email taken");
        return Err(AppError::conflict(
            "EMAIL_TAKEN",
            "A user with this email already exists".to_string(),
        ));
    }

    let now = time::OffsetDateTime::now_utc();
    let user = User {
        id: Ulid::new().to_string(),
        name: name.to_string(),
        email: email.to_string(),
        password: hash_password(password)?,
        role: Role::User,
        created_at: now,
        updated_at: now,
    };

    let user = users_repo::insert_user(conn, user).await?;
    info!(user_id = %user.id, email = %redact_email(email), "user created");
    Ok(user)
}

pub async fn update_user<C: ConnectionTrait>(
    conn: &C,
    user_id: &str,
    name: Option<&str>,
    password: Option<&str>,
) -> Result<User, AppError> {
    let mut user = users_repo::find_user_by_id(conn, user_id)
        .await?
        .ok_or_else(|| AppError::not_found("USER_NOT_FOUND", "User not found".to_string()))?;

    if let Some(name) = name {
        user.name = name.to_string();
    }
    if let Some(password) = password {
        user.password = hash_password(password)?;
    }
    user.updated_at = time::OffsetDateTime::now_utc();

    let user = users_repo::update_user(conn, user).await?;
    debug!(user_id = %user.id, "user updated");
    Ok(user)
}

/// One page of users plus the total count. `page` is 1-based.
pub async fn get_users<C: ConnectionTrait>(
    conn: &C,
    page: u64,
    items_per_page: u64,
) -> Result<(u64, Vec<User>), AppError> {
    users_repo::list_users(conn, page, items_per_page).await
}

pub async fn delete_user<C: ConnectionTrait>(conn: &C, user_id: &str) -> Result<(), AppError> {
    let deleted = users_repo::delete_user_by_id(conn, user_id).await?;
    if deleted == 0 {
        return Err(AppError::not_found(
            "USER_NOT_FOUND",
            "User not found".to_string(),
        ));
    }
    info!(user_id = %user_id, "user deleted");
    Ok(())
}

/// Verify credentials and mint an access token carrying the user's stored
/// role. Unknown email and wrong password are indistinguishable to the
/// caller: both are a plain 401.
pub async fn login<C: ConnectionTrait>(
    conn: &C,
    security: &SecurityConfig,
    email: &str,
    password: &str,
) -> Result<String, AppError> {
    let user = users_repo::find_user_by_email(conn, email)
        .await?
        .ok_or_else(AppError::unauthorized)?;

    if !verify_password(password, &user.password)? {
        warn!(user_id = %user.id, "login rejected: bad password");
        return Err(AppError::unauthorized());
    }

    let mut payload = Map::new();
    payload.insert("sub".to_string(), Value::String(user.id.clone()));

    let token = mint_access_token(
        payload,
        user.role,
        DEFAULT_TOKEN_TTL,
        SystemTime::now(),
        security,
    )?;

    info!(user_id = %user.id, role = %user.role, "login succeeded");
    Ok(token)
}

#[cfg(test)]
mod tests {
    use super::redact_email;

    #[test]
    fn redact_email_keeps_domain() {
        assert_eq!(redact_email("alice@example.com"), "a***@example.com");
        assert_eq!(redact_email("a@example.com"), "***");
        assert_eq!(redact_email("not-an-email"), "***");
    }

    #[test]
    fn redact_email_handles_multibyte_local_part() {
        assert_eq!(redact_email("émile@example.com"), "é***@example.com");
        assert_eq!(redact_email("é@example.com"), "***");
    }
}
