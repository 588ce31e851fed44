mod common;

use axum::http::{Method, StatusCode};
use sea_orm::{ActiveModelTrait, Set};
use serde_json::json;

use storefront_api::{
    dto::wishlist::AddToWishlistRequest, entity::products::ActiveModel as ProductActive,
    error::AppError, services::wishlist_service,
};

use common::setup;

#[tokio::test]
async fn adding_twice_keeps_one_entry_newest_first() -> anyhow::Result<()> {
    let app = setup().await?;
    let user = app.user("fan@example.com").await?;
    let category = app.category("books").await?;
    let novel = app.product(category, "novel", 1_500, 10, false).await?;
    let atlas = app.product(category, "atlas", 6_000, 10, false).await?;
    let poems = app.product(category, "poems", 900, 10, false).await?;

    for product_id in [novel.id, atlas.id, novel.id, poems.id] {
        wishlist_service::add_to_wishlist(&app.state, &user, AddToWishlistRequest { product_id })
            .await?;
    }

    let wishlist = wishlist_service::get_wishlist(&app.state, &user)
        .await?
        .data
        .expect("wishlist");
    let ids: Vec<_> = wishlist.items.iter().map(|entry| entry.product.id).collect();
    assert_eq!(ids, vec![poems.id, atlas.id, novel.id]);
    assert!(wishlist.items[0].added_at >= wishlist.items[1].added_at);
    assert_eq!(wishlist.items[2].product.slug, "novel");
    Ok(())
}

#[tokio::test]
async fn inactive_products_are_rejected_and_hidden() -> anyhow::Result<()> {
    let app = setup().await?;
    let user = app.user("fan@example.com").await?;
    let category = app.category("books").await?;
    let novel = app.product(category, "novel", 1_500, 10, false).await?;
    let atlas = app.product(category, "atlas", 6_000, 10, false).await?;
    let retired = app.product(category, "retired", 500, 10, false).await?;

    let mut active: ProductActive = retired.into();
    active.is_active = Set(false);
    let retired = active.update(&app.state.orm).await?;

    let err = wishlist_service::add_to_wishlist(
        &app.state,
        &user,
        AddToWishlistRequest { product_id: retired.id },
    )
    .await
    .expect_err("inactive product");
    assert!(matches!(err, AppError::NotFound(_)));

    for product_id in [novel.id, atlas.id] {
        wishlist_service::add_to_wishlist(&app.state, &user, AddToWishlistRequest { product_id })
            .await?;
    }
    let mut active: ProductActive = novel.into();
    active.is_active = Set(false);
    active.update(&app.state.orm).await?;

    let wishlist = wishlist_service::get_wishlist(&app.state, &user)
        .await?
        .data
        .expect("wishlist");
    assert_eq!(wishlist.items.len(), 1);
    assert_eq!(wishlist.items[0].product.id, atlas.id);
    Ok(())
}

#[tokio::test]
async fn removing_over_http() -> anyhow::Result<()> {
    let app = setup().await?;
    let user = app.user("fan@example.com").await?;
    let token = app.token(&user)?;
    let category = app.category("books").await?;
    let novel = app.product(category, "novel", 1_500, 10, false).await?;

    let (status, body) = app
        .call(
            Method::POST,
            "/api/wishlist",
            Some(&token),
            Some(json!({ "product_id": novel.id })),
        )
        .await?;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    assert_eq!(body["data"]["items"].as_array().map(Vec::len), Some(1));

    let uri = format!("/api/wishlist/{}", novel.id);
    let (status, _) = app.call(Method::DELETE, &uri, Some(&token), None).await?;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = app.call(Method::DELETE, &uri, Some(&token), None).await?;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["success"], false);
    Ok(())
}
