mod common;

use storefront_api::{
    dto::cart::{AddToCartRequest, UpdateCartItemRequest},
    error::AppError,
    services::cart_service,
};

use common::setup;

#[tokio::test]
async fn adding_same_line_twice_increments_quantity() -> anyhow::Result<()> {
    let app = setup().await?;
    let user = app.user("shopper@example.com").await?;
    let category = app.category("home").await?;
    let mug = app.product(category, "mug", 1_200, 20, false).await?;
    let red = app.variant(mug.id, "Red", 300, 5).await?;

    for _ in 0..2 {
        cart_service::add_to_cart(
            &app.state,
            &user,
            AddToCartRequest {
                product_id: mug.id,
                variant_id: None,
                quantity: 1,
            },
        )
        .await?;
    }
    let summary = cart_service::add_to_cart(
        &app.state,
        &user,
        AddToCartRequest {
            product_id: mug.id,
            variant_id: Some(red),
            quantity: 1,
        },
    )
    .await?
    .data
    .expect("cart");

    assert_eq!(summary.items.len(), 2);
    let plain = summary
        .items
        .iter()
        .find(|l| l.variant_id.is_none())
        .expect("plain line");
    assert_eq!(plain.quantity, 2);
    assert_eq!(plain.line_total, 2_400);

    // 2 x 1200 + 1 x 1500, shipping charged per line, 8% tax.
    assert_eq!(summary.subtotal, 3_900);
    assert_eq!(summary.shipping_cost, 1_000);
    assert_eq!(summary.tax, 312);
    assert_eq!(summary.total, 3_900 + 1_000 + 312);
    assert_eq!(summary.item_count, 3);

    let count = cart_service::cart_count(&app.state, &user).await?.data.expect("count");
    assert_eq!(count.count, 3);
    Ok(())
}

#[tokio::test]
async fn zero_quantity_removes_line_and_clear_reports_empty() -> anyhow::Result<()> {
    let app = setup().await?;
    let user = app.user("shopper@example.com").await?;
    let stranger = app.user("stranger@example.com").await?;
    let category = app.category("home").await?;
    let mug = app.product(category, "mug", 1_200, 20, true).await?;

    let summary = cart_service::add_to_cart(
        &app.state,
        &user,
        AddToCartRequest {
            product_id: mug.id,
            variant_id: None,
            quantity: 1,
        },
    )
    .await?
    .data
    .expect("cart");
    let line_id = summary.items[0].id;

    let err = cart_service::update_cart_item(
        &app.state,
        &stranger,
        UpdateCartItemRequest {
            cart_item_id: line_id,
            quantity: 4,
        },
    )
    .await
    .expect_err("other users cannot touch the line");
    assert!(matches!(err, AppError::NotFound(_)));

    let updated = cart_service::update_cart_item(
        &app.state,
        &user,
        UpdateCartItemRequest {
            cart_item_id: line_id,
            quantity: 0,
        },
    )
    .await?;
    assert_eq!(updated.message, "Item removed from cart");
    assert!(updated.data.expect("cart").items.is_empty());

    let err = cart_service::clear_cart(&app.state, &user)
        .await
        .expect_err("nothing to clear");
    assert!(matches!(err, AppError::NotFound(ref m) if m == "Cart is already empty"));
    Ok(())
}

#[tokio::test]
async fn foreign_variant_is_rejected() -> anyhow::Result<()> {
    let app = setup().await?;
    let user = app.user("shopper@example.com").await?;
    let category = app.category("home").await?;
    let mug = app.product(category, "mug", 1_200, 20, false).await?;
    let plate = app.product(category, "plate", 900, 20, false).await?;
    let plate_variant = app.variant(plate.id, "White", 0, 5).await?;

    let err = cart_service::add_to_cart(
        &app.state,
        &user,
        AddToCartRequest {
            product_id: mug.id,
            variant_id: Some(plate_variant),
            quantity: 1,
        },
    )
    .await
    .expect_err("variant belongs to another product");
    assert!(matches!(err, AppError::BadRequest(_)));
    Ok(())
}
