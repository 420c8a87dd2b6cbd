mod common;

use std::time::{Duration, SystemTime};

use actix_web::test;
use common::{create_test_app, login_user, register_user, test_security, test_state};
use roster_api::auth::jwt::{mint_access_token, Role, DEFAULT_TOKEN_TTL};
use roster_api::entities::users;
use roster_api::state::app_state::AppState;
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, Set};
use serde_json::{json, Map, Value};

async fn promote_to_admin(state: &AppState, email: &str) {
    let db = state.db().expect("test state has a db");
    let user = users::Entity::find()
        .filter(users::Column::Email.eq(email))
        .one(db)
        .await
        .expect("query user")
        .expect("user exists");
    let mut active: users::ActiveModel = user.into();
    active.role = Set("admin".to_string());
    active.update(db).await.expect("promote user");
}

fn sub_payload(sub: &str) -> Map<String, Value> {
    let mut payload = Map::new();
    payload.insert("sub".to_string(), json!(sub));
    payload
}

#[actix_web::test]
async fn missing_bearer_is_401() {
    let app = create_test_app(test_state().await).await;

    let req = test::TestRequest::put()
        .uri("/users")
        .set_json(json!({ "name": "Nobody" }))
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status().as_u16(), 401);
    let body: serde_json::Value = test::read_body_json(resp).await;
    assert_eq!(body["code"], "UNAUTHORIZED_MISSING_BEARER");
}

#[actix_web::test]
async fn garbage_token_is_401() {
    let app = create_test_app(test_state().await).await;

    let req = test::TestRequest::delete()
        .uri("/users")
        .insert_header(("Authorization", "Bearer not.a.token"))
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status().as_u16(), 401);
    let body: serde_json::Value = test::read_body_json(resp).await;
    assert_eq!(body["code"], "UNAUTHORIZED_INVALID_JWT");
}

#[actix_web::test]
async fn expired_token_is_401() {
    let state = test_state().await;
    let app = create_test_app(state.clone()).await;

    let created = register_user(&app, "Alice", "alice@example.com", "s3cret-pass").await;
    let sub = created["id"].as_str().unwrap();

    // Minted far enough in the past that the 6h TTL has lapsed
    let stale_now = SystemTime::now() - Duration::from_secs(7 * 60 * 60);
    let token = mint_access_token(
        sub_payload(sub),
        Role::User,
        DEFAULT_TOKEN_TTL,
        stale_now,
        &test_security(),
    )
    .unwrap();

    let req = test::TestRequest::delete()
        .uri("/users")
        .insert_header(("Authorization", format!("Bearer {token}")))
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status().as_u16(), 401);
    let body: serde_json::Value = test::read_body_json(resp).await;
    assert_eq!(body["code"], "UNAUTHORIZED_EXPIRED_JWT");
}

#[actix_web::test]
async fn valid_token_for_deleted_user_is_401() {
    let app = create_test_app(test_state().await).await;

    register_user(&app, "Alice", "alice@example.com", "s3cret-pass").await;
    let token = login_user(&app, "alice@example.com", "s3cret-pass").await;

    let req = test::TestRequest::delete()
        .uri("/users")
        .insert_header(("Authorization", format!("Bearer {token}")))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status().as_u16(), 204);

    // Token is still unexpired and correctly signed, but the subject is gone
    let req = test::TestRequest::put()
        .uri("/users")
        .insert_header(("Authorization", format!("Bearer {token}")))
        .set_json(json!({ "name": "Ghost" }))
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status().as_u16(), 401);
    let body: serde_json::Value = test::read_body_json(resp).await;
    assert_eq!(body["code"], "UNAUTHORIZED");
}

#[actix_web::test]
async fn listing_requires_admin_role() {
    let state = test_state().await;
    let app = create_test_app(state.clone()).await;

    register_user(&app, "Alice", "alice@example.com", "s3cret-pass").await;
    let token = login_user(&app, "alice@example.com", "s3cret-pass").await;

    // Authenticated but not an admin: 403, not 401
    let req = test::TestRequest::get()
        .uri("/users")
        .insert_header(("Authorization", format!("Bearer {token}")))
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status().as_u16(), 403);
    let body: serde_json::Value = test::read_body_json(resp).await;
    assert_eq!(body["code"], "FORBIDDEN");
}

#[actix_web::test]
async fn listing_requires_authentication() {
    let app = create_test_app(test_state().await).await;

    let req = test::TestRequest::get().uri("/users").to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status().as_u16(), 401);
}

#[actix_web::test]
async fn admin_lists_users_with_pagination() {
    let state = test_state().await;
    let app = create_test_app(state.clone()).await;

    register_user(&app, "Admin", "admin@example.com", "s3cret-pass").await;
    register_user(&app, "Bob", "bob@example.com", "s3cret-pass").await;
    register_user(&app, "Carol", "carol@example.com", "s3cret-pass").await;

    // The stored role is stamped into the token at login, so promote first
    promote_to_admin(&state, "admin@example.com").await;
    let token = login_user(&app, "admin@example.com", "s3cret-pass").await;

    let req = test::TestRequest::get()
        .uri("/users?page=1&items_per_page=2")
        .insert_header(("Authorization", format!("Bearer {token}")))
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status().as_u16(), 200);
    let body: serde_json::Value = test::read_body_json(resp).await;
    assert_eq!(body["total_count"], 3);
    assert_eq!(body["page"], 1);
    assert_eq!(body["users"].as_array().unwrap().len(), 2);

    let req = test::TestRequest::get()
        .uri("/users?page=2&items_per_page=2")
        .insert_header(("Authorization", format!("Bearer {token}")))
        .to_request();
    let resp = test::call_service(&app, req).await;

    let body: serde_json::Value = test::read_body_json(resp).await;
    assert_eq!(body["page"], 2);
    assert_eq!(body["users"].as_array().unwrap().len(), 1);
}

#[actix_web::test]
async fn stale_role_claim_does_not_grant_admin() {
    let state = test_state().await;
    let app = create_test_app(state.clone()).await;

    register_user(&app, "Alice", "alice@example.com", "s3cret-pass").await;
    let token = login_user(&app, "alice@example.com", "s3cret-pass").await;

    // Promotion after issuance: the old token still says role=user, and the
    // guard trusts the claims, so the old token stays non-admin until re-login.
    promote_to_admin(&state, "alice@example.com").await;

    let req = test::TestRequest::get()
        .uri("/users")
        .insert_header(("Authorization", format!("Bearer {token}")))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status().as_u16(), 403);

    let fresh = login_user(&app, "alice@example.com", "s3cret-pass").await;
    let req = test::TestRequest::get()
        .uri("/users")
        .insert_header(("Authorization", format!("Bearer {fresh}")))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status().as_u16(), 200);
}
