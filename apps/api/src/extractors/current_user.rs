use actix_web::dev::Payload;
use actix_web::{web, FromRequest, HttpRequest};
use serde::Serialize;
use tracing::debug;

use crate::auth::jwt::{verify_access_token, Role};
use crate::db::require_db;
use crate::error::AppError;
use crate::extractors::auth_token::bearer_token;
use crate::repos::users;
use crate::state::app_state::AppState;

/// Authenticated caller, resolved per request: bearer token verified, then
/// the subject looked up in the database. The role comes from the validated
/// claims, not from storage.
#[derive(Debug, Serialize, Clone)]
pub struct CurrentUser {
    pub id: String,
    pub name: String,
    pub email: String,
    pub role: Role,
}

impl FromRequest for CurrentUser {
    type Error = AppError;
    type Future = std::pin::Pin<Box<dyn std::future::Future<Output = Result<Self, Self::Error>>>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let req = req.clone();

        Box::pin(async move {
            let token = bearer_token(&req)?;

            let app_state = req
                .app_data::<web::Data<AppState>>()
                .ok_or_else(|| AppError::internal("AppState not available".to_string()))?;

            let claims = verify_access_token(&token, &app_state.security)?;

            let db = require_db(app_state)?;
            // A token can outlive its user. A missing subject is the same
            // failure as an invalid token: plain 401, never a 500.
            let user = users::find_user_by_id(db, &claims.sub)
                .await?
                .ok_or_else(|| {
                    debug!(sub = %claims.sub, "token subject no longer exists");
                    AppError::unauthorized()
                })?;

            Ok(CurrentUser {
                id: user.id,
                name: user.name,
                email: user.email,
                role: claims.role,
            })
        })
    }
}
