use actix_web::dev::Payload;
use actix_web::{FromRequest, HttpRequest};

use crate::auth::jwt::Role;
use crate::error::AppError;
use crate::extractors::current_user::CurrentUser;

/// `CurrentUser` that additionally holds the admin role.
///
/// Failure modes are distinct: an unauthenticated caller gets 401 from the
/// inner extractor; an authenticated non-admin gets 403.
#[derive(Debug, Clone)]
pub struct AdminUser(pub CurrentUser);

impl FromRequest for AdminUser {
    type Error = AppError;
    type Future = std::pin::Pin<Box<dyn std::future::Future<Output = Result<Self, Self::Error>>>>;

    fn from_request(req: &HttpRequest, payload: &mut Payload) -> Self::Future {
        let fut = CurrentUser::from_request(req, payload);

        Box::pin(async move {
            let current_user = fut.await?;
            if current_user.role != Role::Admin {
                return Err(AppError::forbidden());
            }
            Ok(AdminUser(current_user))
        })
    }
}
