use actix_web::{http::header, HttpRequest};

use crate::AppError;

/// Parse `Authorization: Bearer <token>` from a request. Missing header,
/// non-UTF8 value, wrong scheme, and empty token all map to the same 401.
pub fn bearer_token(req: &HttpRequest) -> Result<String, AppError> {
    let auth_header = req
        .headers()
        .get(header::AUTHORIZATION)
        .ok_or_else(AppError::unauthorized_missing_bearer)?;

    let auth_value = auth_header
        .to_str()
        .map_err(|_| AppError::unauthorized_missing_bearer())?;

    let parts: Vec<&str> = auth_value.split_whitespace().collect();
    if parts.len() != 2 || parts[0] != "Bearer" {
        return Err(AppError::unauthorized_missing_bearer());
    }

    let token = parts[1];
    if token.is_empty() {
        return Err(AppError::unauthorized_missing_bearer());
    }

    Ok(token.to_string())
}

#[cfg(test)]
mod tests {
    use actix_web::test::TestRequest;

    use super::bearer_token;
    use crate::AppError;

    #[test]
    fn missing_header_is_unauthorized() {
        let req = TestRequest::default().to_http_request();
        match bearer_token(&req) {
            Err(AppError::UnauthorizedMissingBearer) => {}
            other => panic!("expected missing-bearer error, got {other:?}"),
        }
    }

    #[test]
    fn wrong_scheme_is_unauthorized() {
        let req = TestRequest::default()
            .insert_header(("Authorization", "Basic dXNlcjpwYXNz"))
            .to_http_request();
        assert!(matches!(
            bearer_token(&req),
            Err(AppError::UnauthorizedMissingBearer)
        ));
    }

    #[test]
    fn bare_bearer_is_unauthorized() {
        let req = TestRequest::default()
            .insert_header(("Authorization", "Bearer"))
            .to_http_request();
        assert!(matches!(
            bearer_token(&req),
            Err(AppError::UnauthorizedMissingBearer)
        ));
    }

    #[test]
    fn well_formed_bearer_is_extracted() {
        let req = TestRequest::default()
            .insert_header(("Authorization", "Bearer abc.def.ghi"))
            .to_http_request();
        assert_eq!(bearer_token(&req).unwrap(), "abc.def.ghi");
    }
}
