use actix_web::{web, HttpResponse, Result};
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::db::require_db;
use crate::error::AppError;
use crate::extractors::admin_user::AdminUser;
use crate::extractors::current_user::CurrentUser;
use crate::repos::users::User;
use crate::services::users as user_service;
use crate::state::app_state::AppState;

#[derive(Debug, Deserialize)]
pub struct CreateUserBody {
    pub name: String,
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct UpdateUserBody {
    pub name: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ListUsersQuery {
    #[serde(default = "default_page")]
    pub page: u64,
    #[serde(default = "default_items_per_page")]
    pub items_per_page: u64,
}

fn default_page() -> u64 {
    1
}

fn default_items_per_page() -> u64 {
    10
}

/// The OAuth2 password-grant form shape: `username` carries the email.
#[derive(Debug, Deserialize)]
pub struct LoginForm {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub access_token: String,
    pub token_type: String,
}

/// Public user representation; never carries the password hash.
#[derive(Debug, Serialize)]
pub struct UserResponse {
    pub id: String,
    pub name: String,
    pub email: String,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            name: user.name,
            email: user.email,
            created_at: user.created_at,
            updated_at: user.updated_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct GetUsersResponse {
    pub total_count: u64,
    pub page: u64,
    pub users: Vec<UserResponse>,
}

fn validate_name(name: &str) -> Result<(), AppError> {
    let len = name.chars().count();
    if !(2..=32).contains(&len) {
        return Err(AppError::invalid(
            "INVALID_NAME",
            "Name must be between 2 and 32 characters".to_string(),
        ));
    }
    Ok(())
}

fn validate_email(email: &str) -> Result<(), AppError> {
    let well_formed = match email.split_once('@') {
        Some((local, domain)) => !local.is_empty() && domain.contains('.') && !domain.starts_with('.'),
        None => false,
    };
    if !well_formed || email.chars().count() > 64 {
        return Err(AppError::invalid(
            "INVALID_EMAIL",
            "Email must be a valid address of at most 64 characters".to_string(),
        ));
    }
    Ok(())
}

fn validate_password(password: &str) -> Result<(), AppError> {
    let len = password.chars().count();
    if !(8..=32).contains(&len) {
        return Err(AppError::invalid(
            "INVALID_PASSWORD",
            "Password must be between 8 and 32 characters".to_string(),
        ));
    }
    Ok(())
}

async fn create_user(
    body: web::Json<CreateUserBody>,
    app_state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    validate_name(&body.name)?;
    validate_email(&body.email)?;
    validate_password(&body.password)?;

    let db = require_db(&app_state)?;
    let user = user_service::create_user(db, &body.name, &body.email, &body.password).await?;

    Ok(HttpResponse::Created().json(UserResponse::from(user)))
}

async fn update_user(
    current_user: CurrentUser,
    body: web::Json<UpdateUserBody>,
    app_state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    if let Some(name) = &body.name {
        validate_name(name)?;
    }
    if let Some(password) = &body.password {
        validate_password(password)?;
    }

    let db = require_db(&app_state)?;
    let user = user_service::update_user(
        db,
        &current_user.id,
        body.name.as_deref(),
        body.password.as_deref(),
    )
    .await?;

    Ok(HttpResponse::Ok().json(UserResponse::from(user)))
}

async fn get_users(
    _admin: AdminUser,
    query: web::Query<ListUsersQuery>,
    app_state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    if query.page == 0 || query.items_per_page == 0 {
        return Err(AppError::invalid(
            "INVALID_PAGINATION",
            "page and items_per_page must be at least 1".to_string(),
        ));
    }

    let db = require_db(&app_state)?;
    let (total_count, users) =
        user_service::get_users(db, query.page, query.items_per_page).await?;

    let response = GetUsersResponse {
        total_count,
        page: query.page,
        users: users.into_iter().map(UserResponse::from).collect(),
    };
    Ok(HttpResponse::Ok().json(response))
}

/// Deletes the caller's own account. The id comes from the token, so one
/// user can never delete another.
async fn delete_user(
    current_user: CurrentUser,
    app_state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    let db = require_db(&app_state)?;
    user_service::delete_user(db, &current_user.id).await?;
    Ok(HttpResponse::NoContent().finish())
}

async fn login(
    form: web::Form<LoginForm>,
    app_state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    let db = require_db(&app_state)?;
    let access_token =
        user_service::login(db, &app_state.security, &form.username, &form.password).await?;

    Ok(HttpResponse::Ok().json(LoginResponse {
        access_token,
        token_type: "bearer".to_string(),
    }))
}

pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::resource("/users")
            .route(web::post().to(create_user))
            .route(web::put().to(update_user))
            .route(web::get().to(get_users))
            .route(web::delete().to(delete_user)),
    )
    .service(web::resource("/users/login").route(web::post().to(login)));
}
