mod common;

use axum::http::{Method, StatusCode};
use sea_orm::{ActiveModelTrait, EntityTrait, Set};
use serde_json::json;

use storefront_api::{
    dto::{
        brands::CreateBrandRequest,
        recommendations::{CreateBundleRequest, ReorderBundleRequest},
    },
    entity::{
        categories::Entity as Categories,
        products::{ActiveModel as ProductActive, Entity as Products},
    },
    error::AppError,
    routes::params::ProductQuery,
    services::{
        brand_service, category_service, order_service, product_service, recommendation_service,
        user_service,
    },
};

use common::{order_request, setup};

#[tokio::test]
async fn admin_creates_catalog_over_http() -> anyhow::Result<()> {
    let app = setup().await?;
    let admin = app.admin().await?;
    let customer = app.user("customer@example.com").await?;
    let admin_token = app.token(&admin)?;

    let (status, body) = app
        .call(
            Method::POST,
            "/api/categories",
            Some(&app.token(&customer)?),
            Some(json!({ "name": "Toys", "slug": "toys" })),
        )
        .await?;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["success"], false);

    let (status, category) = app
        .call(
            Method::POST,
            "/api/categories",
            Some(&admin_token),
            Some(json!({ "name": "Toys", "slug": "toys" })),
        )
        .await?;
    assert_eq!(status, StatusCode::CREATED);
    let category_id = category["data"]["id"].as_str().expect("id").to_string();

    let (status, product) = app
        .call(
            Method::POST,
            "/api/products",
            Some(&admin_token),
            Some(json!({
                "name": "Robot",
                "slug": "robot",
                "image_url": "/img/robot.jpg",
                "price": 4500,
                "category_id": category_id,
                "stock_quantity": 7,
                "variants": [{ "variant_name": "Silver", "stock_quantity": 3 }],
                "tags": [{ "tag_name": "stem" }, { "tag_name": "STEM" }]
            })),
        )
        .await?;
    assert_eq!(status, StatusCode::CREATED, "{product}");
    assert_eq!(product["data"]["variants"].as_array().map(Vec::len), Some(1));
    assert_eq!(product["data"]["tags"].as_array().map(Vec::len), Some(1));

    let (status, dup) = app
        .call(
            Method::POST,
            "/api/products",
            Some(&admin_token),
            Some(json!({
                "name": "Robot 2",
                "slug": "robot",
                "image_url": "/img/robot.jpg",
                "price": 4500,
                "category_id": category_id
            })),
        )
        .await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(dup["message"], "Product slug already exists");

    let (status, invalid) = app
        .call(
            Method::POST,
            "/api/products",
            Some(&admin_token),
            Some(json!({
                "name": "",
                "slug": "nameless",
                "image_url": "/img/x.jpg",
                "price": -1,
                "category_id": category_id
            })),
        )
        .await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(invalid["message"], "Validation failed");
    assert!(invalid["errors"].as_array().map(|e| e.len() >= 2).unwrap_or(false));

    let (status, by_slug) = app.call(Method::GET, "/api/products/slug/robot", None, None).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(by_slug["data"]["name"], "Robot");
    Ok(())
}

#[tokio::test]
async fn listing_filters_by_price_and_category() -> anyhow::Result<()> {
    let app = setup().await?;
    let books = app.category("books").await?;
    let games = app.category("games").await?;
    app.product(books, "novel", 1_500, 10, false).await?;
    app.product(books, "atlas", 6_000, 10, false).await?;
    app.product(games, "chess", 3_000, 10, false).await?;

    let resp = product_service::list_products(
        &app.state,
        ProductQuery {
            category_id: Some(books),
            max_price: Some(5_000),
            ..Default::default()
        },
    )
    .await?;
    let items = resp.data.expect("list").items;
    assert_eq!(items.len(), 1);
    assert_eq!(items[0].slug, "novel");
    assert_eq!(resp.meta.expect("meta").total, 1);

    let err = product_service::search_products(&app.state, Some("  ".into()), None)
        .await
        .expect_err("blank query");
    assert!(matches!(err, AppError::BadRequest(_)));

    let found = product_service::search_products(&app.state, Some("ches".into()), None)
        .await?
        .data
        .expect("results");
    assert_eq!(found.len(), 1);
    Ok(())
}

#[tokio::test]
async fn viewing_counts_views_and_history() -> anyhow::Result<()> {
    let app = setup().await?;
    let user = app.user("viewer@example.com").await?;
    let category = app.category("books").await?;
    let novel = app.product(category, "novel", 1_500, 10, false).await?;
    let atlas = app.product(category, "atlas", 6_000, 10, false).await?;

    product_service::get_product(&app.state, Some(&user), novel.id).await?;
    product_service::get_product(&app.state, Some(&user), atlas.id).await?;
    product_service::get_product(&app.state, None, novel.id).await?;

    let stored = Products::find_by_id(novel.id).one(&app.state.orm).await?.expect("novel");
    assert_eq!(stored.views_count, 2);

    let recent = user_service::recently_viewed(&app.state, &user, 10)
        .await?
        .data
        .expect("recent");
    assert_eq!(recent.len(), 2);

    let related = product_service::related_products(&app.state, novel.id, 4)
        .await?
        .data
        .expect("related");
    assert_eq!(related.len(), 1);
    assert_eq!(related[0].id, atlas.id);
    Ok(())
}

#[tokio::test]
async fn category_delete_is_soft_when_products_exist() -> anyhow::Result<()> {
    let app = setup().await?;
    let admin = app.admin().await?;
    let used = app.category("used").await?;
    let empty = app.category("empty").await?;
    app.product(used, "thing", 100, 1, false).await?;

    let soft = category_service::delete_category(&app.state, &admin, used).await?;
    assert_eq!(soft.message, "Category deactivated");
    let stored = Categories::find_by_id(used).one(&app.state.orm).await?.expect("kept");
    assert!(!stored.is_active);

    let hard = category_service::delete_category(&app.state, &admin, empty).await?;
    assert_eq!(hard.message, "Category deleted");
    assert!(Categories::find_by_id(empty).one(&app.state.orm).await?.is_none());
    Ok(())
}

#[tokio::test]
async fn brand_with_products_cannot_be_deleted() -> anyhow::Result<()> {
    let app = setup().await?;
    let admin = app.admin().await?;
    let category = app.category("audio").await?;
    let brand = brand_service::create_brand(
        &app.state,
        &admin,
        CreateBrandRequest {
            name: "Loud".into(),
            logo_url: None,
            description: None,
            is_featured: true,
            display_order: 0,
        },
    )
    .await?
    .data
    .expect("brand");

    let speaker = app.product(category, "speaker", 9_900, 5, false).await?;
    let mut active: ProductActive = speaker.into();
    active.brand_id = Set(Some(brand.id));
    active.update(&app.state.orm).await?;

    let err = brand_service::delete_brand(&app.state, &admin, brand.id)
        .await
        .expect_err("brand in use");
    assert!(matches!(err, AppError::BadRequest(ref m) if m == "Brand has associated products"));

    let featured = brand_service::list_brands(&app.state, true).await?.data.expect("brands");
    assert_eq!(featured.len(), 1);
    assert_eq!(featured[0].product_count, 1);
    Ok(())
}

#[tokio::test]
async fn ordered_product_is_deactivated_not_deleted() -> anyhow::Result<()> {
    let app = setup().await?;
    let admin = app.admin().await?;
    let category = app.category("misc").await?;
    let sold = app.product(category, "sold", 100, 5, false).await?;
    let unsold = app.product(category, "unsold", 100, 5, false).await?;
    order_service::create_order(&app.state, None, order_request(vec![(sold.id, None, 1)])).await?;

    let soft = product_service::delete_product(&app.state, &admin, sold.id).await?;
    assert_eq!(soft.message, "Product deactivated");
    let hard = product_service::delete_product(&app.state, &admin, unsold.id).await?;
    assert_eq!(hard.message, "Product deleted");
    assert!(Products::find_by_id(unsold.id).one(&app.state.orm).await?.is_none());
    Ok(())
}

#[tokio::test]
async fn bundle_links_skip_duplicates_and_total_up() -> anyhow::Result<()> {
    let app = setup().await?;
    let admin = app.admin().await?;
    let category = app.category("kit").await?;
    let camera = app.product(category, "camera", 50_000, 5, false).await?;
    let lens = app.product(category, "lens", 20_000, 5, false).await?;
    let bag = app.product(category, "bag", 5_000, 5, false).await?;

    let links = recommendation_service::create_links(
        &app.state,
        &admin,
        CreateBundleRequest {
            product_id: camera.id,
            related_product_ids: vec![lens.id, camera.id, lens.id, bag.id],
        },
    )
    .await?
    .data
    .expect("links");
    assert_eq!(links.len(), 2);

    let again = recommendation_service::create_links(
        &app.state,
        &admin,
        CreateBundleRequest {
            product_id: camera.id,
            related_product_ids: vec![lens.id],
        },
    )
    .await?
    .data
    .expect("links");
    assert!(again.is_empty());

    let bundle = recommendation_service::get_bundle(&app.state, camera.id)
        .await?
        .data
        .expect("bundle");
    assert_eq!(bundle.items.len(), 3);
    assert_eq!(bundle.items[0].id, camera.id);
    assert_eq!(bundle.total_price, 75_000);
    assert_eq!(bundle.total_savings, 0);

    recommendation_service::reorder_links(
        &app.state,
        &admin,
        camera.id,
        ReorderBundleRequest {
            related_product_ids: vec![bag.id, lens.id],
        },
    )
    .await?;
    let bundle = recommendation_service::get_bundle(&app.state, camera.id)
        .await?
        .data
        .expect("bundle");
    assert_eq!(bundle.items[1].id, bag.id);

    let err = recommendation_service::seed_links(&app.state, &admin, camera.id)
        .await
        .expect_err("everything already linked");
    assert!(matches!(err, AppError::BadRequest(_)));
    Ok(())
}

#[tokio::test]
async fn far_page_returns_empty_list() -> anyhow::Result<()> {
    let app = setup().await?;
    let category = app.category("books").await?;
    app.product(category, "novel", 1_500, 10, false).await?;

    let (status, body) = app
        .call(
            Method::GET,
            "/api/products?page=9223372036854775807&per_page=50",
            None,
            None,
        )
        .await?;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["data"]["items"].as_array().map(Vec::len), Some(0));
    assert_eq!(body["meta"]["total"], 1);
    assert_eq!(body["meta"]["has_next"], false);
    Ok(())
}
