//! Shared helpers for the integration suite. Each test builds its own
//! in-memory SQLite state, so tests are fully isolated from one another.

use actix_http::Request;
use actix_web::body::BoxBody;
use actix_web::dev::{Service, ServiceResponse};
use actix_web::{test, web, App, Error};
use roster_api::config::db::DbProfile;
use roster_api::infra::state::build_state;
use roster_api::middleware::request_trace::RequestTrace;
use roster_api::middleware::structured_logger::StructuredLogger;
use roster_api::routes;
use roster_api::state::app_state::AppState;
use roster_api::state::security_config::SecurityConfig;
use serde_json::json;

pub const TEST_JWT_SECRET: &[u8] = b"test_secret_key_for_testing_purposes_only";

pub fn test_security() -> SecurityConfig {
    SecurityConfig::new(TEST_JWT_SECRET)
}

pub async fn test_state() -> AppState {
    build_state()
        .with_db(DbProfile::Test)
        .with_security(test_security())
        .build()
        .await
        .expect("failed to build test state")
}

pub async fn create_test_app(
    state: AppState,
) -> impl Service<Request, Response = ServiceResponse<BoxBody>, Error = Error> {
    test::init_service(
        App::new()
            .wrap(StructuredLogger)
            .wrap(RequestTrace)
            .app_data(web::Data::new(state))
            .configure(routes::configure),
    )
    .await
}

/// Register a user through the API and return the response body.
pub async fn register_user<S>(
    app: &S,
    name: &str,
    email: &str,
    password: &str,
) -> serde_json::Value
where
    S: Service<Request, Response = ServiceResponse<BoxBody>, Error = Error>,
{
    let req = test::TestRequest::post()
        .uri("/users")
        .set_json(json!({ "name": name, "email": email, "password": password }))
        .to_request();
    let resp = test::call_service(app, req).await;
    assert_eq!(resp.status().as_u16(), 201, "registration should succeed");
    test::read_body_json(resp).await
}

/// Log in through the API and return the access token.
pub async fn login_user<S>(app: &S, email: &str, password: &str) -> String
where
    S: Service<Request, Response = ServiceResponse<BoxBody>, Error = Error>,
{
    let req = test::TestRequest::post()
        .uri("/users/login")
        .set_form([("username", email), ("password", password)])
        .to_request();
    let resp = test::call_service(app, req).await;
    assert_eq!(resp.status().as_u16(), 200, "login should succeed");
    let body: serde_json::Value = test::read_body_json(resp).await;
    assert_eq!(body["token_type"], "bearer");
    body["access_token"].as_str().expect("token").to_string()
}
