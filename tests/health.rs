mod common;

use axum::http::{Method, StatusCode};

use storefront_api::routes::health::health_check;

use common::setup;

#[tokio::test]
async fn health_check_returns_ok() {
    let response = health_check().await;
    assert_eq!(response.0.message, "Health check");
    assert!(response.0.success);
    assert!(response.0.data.is_some());
}

#[tokio::test]
async fn unknown_routes_get_enveloped_404() -> anyhow::Result<()> {
    let app = setup().await?;

    let (status, body) = app.call(Method::GET, "/health", None, None).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["status"], "ok");

    let (status, body) = app.call(Method::GET, "/nope", None, None).await?;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["success"], false);
    assert_eq!(body["errors"][0], "No route for /nope");
    Ok(())
}
