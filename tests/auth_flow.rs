mod common;

use axum::http::{Method, StatusCode};
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter};
use serde_json::json;

use storefront_api::entity::password_reset_tokens::{Column as TokenCol, Entity as ResetTokens};

use common::setup;

#[tokio::test]
async fn register_login_and_profile() -> anyhow::Result<()> {
    let app = setup().await?;

    let (status, registered) = app
        .call(
            Method::POST,
            "/api/auth/register",
            None,
            Some(json!({ "email": "New@Example.com", "password": "hunter22", "first_name": "New" })),
        )
        .await?;
    assert_eq!(status, StatusCode::CREATED, "{registered}");
    assert_eq!(registered["data"]["user"]["email"], "new@example.com");
    assert_eq!(registered["data"]["user"]["role"], "Customer");

    let (status, duplicate) = app
        .call(
            Method::POST,
            "/api/auth/register",
            None,
            Some(json!({ "email": "new@example.com", "password": "hunter22" })),
        )
        .await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(duplicate["message"], "Email already exists");

    let (status, _) = app
        .call(
            Method::POST,
            "/api/auth/login",
            None,
            Some(json!({ "email": "new@example.com", "password": "wrong-pass" })),
        )
        .await?;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, login) = app
        .call(
            Method::POST,
            "/api/auth/login",
            None,
            Some(json!({ "email": "new@example.com", "password": "hunter22" })),
        )
        .await?;
    assert_eq!(status, StatusCode::OK);
    let token = login["data"]["token"].as_str().expect("token").to_string();

    let (status, profile) = app.call(Method::GET, "/api/users/profile", Some(&token), None).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(profile["data"]["first_name"], "New");
    Ok(())
}

#[tokio::test]
async fn protected_routes_require_valid_token() -> anyhow::Result<()> {
    let app = setup().await?;

    let (status, body) = app.call(Method::GET, "/api/cart", None, None).await?;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["success"], false);

    let (status, _) = app.call(Method::GET, "/api/cart", Some("not-a-jwt"), None).await?;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let customer = app.user("customer@example.com").await?;
    let (status, _) = app
        .call(Method::GET, "/api/products/low-stock", Some(&app.token(&customer)?), None)
        .await?;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let admin = app.admin().await?;
    let (status, _) = app
        .call(Method::GET, "/api/products/low-stock", Some(&app.token(&admin)?), None)
        .await?;
    assert_eq!(status, StatusCode::OK);
    Ok(())
}

#[tokio::test]
async fn password_reset_token_is_single_use() -> anyhow::Result<()> {
    let app = setup().await?;
    let user = app.user("forgetful@example.com").await?;

    let (status, body) = app
        .call(
            Method::POST,
            "/api/auth/forgot-password",
            None,
            Some(json!({ "email": "nobody@example.com" })),
        )
        .await?;
    assert_eq!(status, StatusCode::OK);
    let unknown_message = body["message"].clone();

    let (status, body) = app
        .call(
            Method::POST,
            "/api/auth/forgot-password",
            None,
            Some(json!({ "email": "forgetful@example.com" })),
        )
        .await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], unknown_message);

    let token = ResetTokens::find()
        .filter(TokenCol::UserId.eq(user.user_id))
        .one(&app.state.orm)
        .await?
        .expect("reset token")
        .token;

    let reset = json!({ "token": token, "new_password": "brand-new" });
    let (status, _) = app
        .call(Method::POST, "/api/auth/reset-password", None, Some(reset.clone()))
        .await?;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = app
        .call(Method::POST, "/api/auth/reset-password", None, Some(reset))
        .await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = app
        .call(
            Method::POST,
            "/api/auth/login",
            None,
            Some(json!({ "email": "forgetful@example.com", "password": "brand-new" })),
        )
        .await?;
    assert_eq!(status, StatusCode::OK);
    Ok(())
}
