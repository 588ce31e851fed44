mod common;

use axum::http::{Method, StatusCode};
use std::sync::atomic::Ordering;

use chrono::Utc;
use sea_orm::EntityTrait;
use serde_json::json;

use storefront_api::{
    dto::{
        cart::AddToCartRequest,
        orders::{ConfirmPaymentRequest, UpdateOrderStatusRequest},
    },
    entity::{
        orders::{Entity as Orders, OrderStatus, PaymentStatus},
        product_variants::Entity as ProductVariants,
        products::Entity as Products,
    },
    error::AppError,
    payments::webhook,
    routes::params::OrderListQuery,
    services::{cart_service, order_service, payment_service},
};

use common::{order_request, setup};

#[tokio::test]
async fn checkout_prices_from_catalog_and_clears_cart() -> anyhow::Result<()> {
    let app = setup().await?;
    let user = app.user("buyer@example.com").await?;
    let category = app.category("gadgets").await?;
    let widget = app.product(category, "widget", 1_000, 10, false).await?;
    let lamp = app.product(category, "lamp", 2_500, 5, true).await?;
    let blue = app.variant(lamp.id, "Blue", 500, 3).await?;

    cart_service::add_to_cart(
        &app.state,
        &user,
        AddToCartRequest {
            product_id: widget.id,
            variant_id: None,
            quantity: 2,
        },
    )
    .await?;

    let created = order_service::create_order(
        &app.state,
        Some(&user),
        order_request(vec![(widget.id, None, 2), (lamp.id, Some(blue), 1)]),
    )
    .await?;
    let detail = created.data.expect("order detail");

    // 2 x 1000 + 1 x (2500 + 500); only the widget line pays shipping.
    assert_eq!(detail.order.subtotal, 5_000);
    assert_eq!(detail.order.shipping_cost, 500);
    assert_eq!(detail.order.tax, 400);
    assert_eq!(detail.order.total, 5_900);
    assert_eq!(detail.order.status, OrderStatus::Pending);
    assert_eq!(detail.order.payment_status, PaymentStatus::Pending);
    assert_eq!(detail.items.len(), 2);
    assert_eq!(detail.status_history.len(), 1);
    assert!(detail.order.order_number.starts_with("ORD-"));

    let fetched = order_service::get_order(&app.state, Some(&user), detail.order.id)
        .await?
        .data
        .expect("order");
    assert_eq!(fetched.order.total, detail.order.total);
    let line_sum: i64 = fetched.items.iter().map(|i| i.total).sum();
    assert_eq!(line_sum, fetched.order.subtotal);

    let cart = cart_service::get_cart(&app.state, &user).await?.data.expect("cart");
    assert!(cart.items.is_empty());

    let widget_after = Products::find_by_id(widget.id).one(&app.state.orm).await?.expect("widget");
    assert_eq!(widget_after.stock_quantity, 8);
    assert_eq!(widget_after.sales_count, 2);
    let lamp_after = Products::find_by_id(lamp.id).one(&app.state.orm).await?.expect("lamp");
    assert_eq!(lamp_after.stock_quantity, 5);
    let variant_after = ProductVariants::find_by_id(blue).one(&app.state.orm).await?.expect("variant");
    assert_eq!(variant_after.stock_quantity, 2);

    Ok(())
}

#[tokio::test]
async fn unknown_product_rejects_whole_order() -> anyhow::Result<()> {
    let app = setup().await?;
    let category = app.category("gadgets").await?;
    let widget = app.product(category, "widget", 1_000, 10, false).await?;
    let ghost = uuid::Uuid::new_v4();

    let err = order_service::create_order(
        &app.state,
        None,
        order_request(vec![(widget.id, None, 1), (ghost, None, 1)]),
    )
    .await
    .expect_err("missing product must fail");
    match err {
        AppError::BadRequestWithErrors { errors, .. } => {
            assert!(errors[0].contains(&ghost.to_string()));
        }
        other => panic!("unexpected error: {other:?}"),
    }

    assert!(Orders::find().all(&app.state.orm).await?.is_empty());
    let widget_after = Products::find_by_id(widget.id).one(&app.state.orm).await?.expect("widget");
    assert_eq!(widget_after.stock_quantity, 10);
    Ok(())
}

#[tokio::test]
async fn insufficient_stock_and_empty_orders_are_rejected() -> anyhow::Result<()> {
    let app = setup().await?;
    let category = app.category("gadgets").await?;
    let widget = app.product(category, "widget", 1_000, 1, false).await?;

    let err = order_service::create_order(
        &app.state,
        None,
        order_request(vec![(widget.id, None, 1), (widget.id, None, 1)]),
    )
    .await
    .expect_err("second line exceeds stock");
    assert!(matches!(err, AppError::BadRequest(ref m) if m.starts_with("Insufficient stock")));

    let err = order_service::create_order(&app.state, None, order_request(vec![]))
        .await
        .expect_err("empty order");
    assert!(matches!(err, AppError::BadRequest(_)));
    Ok(())
}

#[tokio::test]
async fn cancel_restores_stock_only_while_pending() -> anyhow::Result<()> {
    let app = setup().await?;
    let user = app.user("buyer@example.com").await?;
    let other = app.user("other@example.com").await?;
    let admin = app.admin().await?;
    let category = app.category("gadgets").await?;
    let widget = app.product(category, "widget", 1_000, 10, false).await?;

    let mut request = order_request(vec![(widget.id, None, 3)]);
    request.payment_intent_id = Some("pi_pending_1".into());
    let order = order_service::create_order(&app.state, Some(&user), request)
        .await?
        .data
        .expect("order")
        .order;

    let err = order_service::cancel_order(&app.state, &other, order.id)
        .await
        .expect_err("strangers cannot cancel");
    assert!(matches!(err, AppError::NotFound(_)));

    let cancelled = order_service::cancel_order(&app.state, &user, order.id)
        .await?
        .data
        .expect("order");
    assert_eq!(cancelled.order.status, OrderStatus::Cancelled);
    assert_eq!(cancelled.order.payment_status, PaymentStatus::Cancelled);
    assert_eq!(
        app.gateway.cancelled.lock().unwrap().as_slice(),
        ["pi_pending_1".to_string()]
    );

    let widget_after = Products::find_by_id(widget.id).one(&app.state.orm).await?.expect("widget");
    assert_eq!(widget_after.stock_quantity, 10);
    assert_eq!(widget_after.sales_count, 0);

    let err = order_service::cancel_order(&app.state, &admin, order.id)
        .await
        .expect_err("already cancelled");
    assert!(matches!(err, AppError::BadRequest(_)));
    Ok(())
}

#[tokio::test]
async fn admin_status_updates_stamp_shipping_and_refund() -> anyhow::Result<()> {
    let app = setup().await?;
    let user = app.user("buyer@example.com").await?;
    let admin = app.admin().await?;
    let category = app.category("gadgets").await?;
    let widget = app.product(category, "widget", 1_000, 10, false).await?;

    let order = order_service::create_order(
        &app.state,
        Some(&user),
        order_request(vec![(widget.id, None, 1)]),
    )
    .await?
    .data
    .expect("order")
    .order;

    let err = order_service::update_order_status(
        &app.state,
        &user,
        order.id,
        UpdateOrderStatusRequest {
            status: "Shipped".into(),
            notes: None,
        },
    )
    .await
    .expect_err("customers cannot change status");
    assert!(matches!(err, AppError::Forbidden));

    let err = order_service::update_order_status(
        &app.state,
        &admin,
        order.id,
        UpdateOrderStatusRequest {
            status: "teleported".into(),
            notes: None,
        },
    )
    .await
    .expect_err("unknown status");
    assert!(matches!(err, AppError::BadRequest(_)));

    app.gateway.settle("pi_paid_1", order.total);
    payment_service::confirm_payment(
        &app.state,
        Some(&user),
        order.id,
        ConfirmPaymentRequest {
            payment_intent_id: "pi_paid_1".into(),
        },
    )
    .await?;

    let shipped = order_service::update_order_status(
        &app.state,
        &admin,
        order.id,
        UpdateOrderStatusRequest {
            status: "shipped".into(),
            notes: Some("Tracking 123".into()),
        },
    )
    .await?
    .data
    .expect("order");
    assert_eq!(shipped.order.status, OrderStatus::Shipped);
    assert!(shipped.order.shipped_at.is_some());

    let refunded = order_service::update_order_status(
        &app.state,
        &admin,
        order.id,
        UpdateOrderStatusRequest {
            status: "Refunded".into(),
            notes: None,
        },
    )
    .await?
    .data
    .expect("order");
    assert_eq!(refunded.order.payment_status, PaymentStatus::Refunded);
    assert_eq!(
        app.gateway.refunded.lock().unwrap().as_slice(),
        ["pi_paid_1".to_string()]
    );
    let last = refunded.status_history.last().expect("history");
    assert_eq!(last.status, "Refunded");
    assert!(
        last.notes.as_deref().is_some_and(|n| n.starts_with("Refund re_")),
        "{:?}",
        last.notes
    );

    let mine = order_service::list_my_orders(&app.state, &user, OrderListQuery::default())
        .await?;
    let items = mine.data.expect("orders").items;
    assert_eq!(items.len(), 1);
    assert_eq!(items[0].item_count, 1);
    Ok(())
}

#[tokio::test]
async fn confirm_payment_requires_succeeded_intent() -> anyhow::Result<()> {
    let app = setup().await?;
    let category = app.category("gadgets").await?;
    let widget = app.product(category, "widget", 1_000, 10, false).await?;
    let order = order_service::create_order(&app.state, None, order_request(vec![(widget.id, None, 1)]))
        .await?
        .data
        .expect("order")
        .order;

    let err = payment_service::confirm_payment(
        &app.state,
        None,
        order.id,
        ConfirmPaymentRequest {
            payment_intent_id: "pi_unpaid".into(),
        },
    )
    .await
    .expect_err("unpaid intent");
    assert!(matches!(err, AppError::BadRequest(ref m) if m == "Payment not completed"));

    app.gateway.settle("pi_paid_short", order.total - 1);
    let err = payment_service::confirm_payment(
        &app.state,
        None,
        order.id,
        ConfirmPaymentRequest {
            payment_intent_id: "pi_paid_short".into(),
        },
    )
    .await
    .expect_err("underpaid intent");
    assert!(
        matches!(err, AppError::BadRequest(ref m) if m == "Payment amount does not match order total")
    );

    app.gateway.settle("pi_paid_guest", order.total);
    let paid = payment_service::confirm_payment(
        &app.state,
        None,
        order.id,
        ConfirmPaymentRequest {
            payment_intent_id: "pi_paid_guest".into(),
        },
    )
    .await?
    .data
    .expect("order");
    assert_eq!(paid.order.payment_status, PaymentStatus::Succeeded);
    assert_eq!(paid.order.status, OrderStatus::Processing);
    assert_eq!(paid.status_history.len(), 2);
    Ok(())
}

#[tokio::test]
async fn confirm_payment_checks_caller_intent_and_amount() -> anyhow::Result<()> {
    let app = setup().await?;
    let owner = app.user("owner@example.com").await?;
    let stranger = app.user("stranger@example.com").await?;
    let category = app.category("gadgets").await?;
    let widget = app.product(category, "widget", 100_000, 10, false).await?;

    let mut request = order_request(vec![(widget.id, None, 1)]);
    request.payment_intent_id = Some("pi_paid_bound".into());
    let order = order_service::create_order(&app.state, Some(&owner), request)
        .await?
        .data
        .expect("order")
        .order;
    app.gateway.settle("pi_paid_bound", order.total);
    app.gateway.settle("pi_paid_cheap", 100);

    let confirm = |id: &str| ConfirmPaymentRequest {
        payment_intent_id: id.to_string(),
    };

    let err = payment_service::confirm_payment(&app.state, None, order.id, confirm("pi_paid_bound"))
        .await
        .expect_err("anonymous caller");
    assert!(matches!(err, AppError::Unauthorized(_)));

    let err = payment_service::confirm_payment(
        &app.state,
        Some(&stranger),
        order.id,
        confirm("pi_paid_bound"),
    )
    .await
    .expect_err("another member");
    assert!(matches!(err, AppError::Forbidden));

    let err = payment_service::confirm_payment(
        &app.state,
        Some(&owner),
        order.id,
        confirm("pi_paid_cheap"),
    )
    .await
    .expect_err("intent from elsewhere");
    assert!(
        matches!(err, AppError::BadRequest(ref m) if m == "Payment intent does not belong to this order")
    );

    let stored = Orders::find_by_id(order.id).one(&app.state.orm).await?.expect("order");
    assert_eq!(stored.payment_status, PaymentStatus::Pending);
    assert_eq!(stored.payment_intent_id.as_deref(), Some("pi_paid_bound"));

    let guest_order = order_service::create_order(
        &app.state,
        None,
        order_request(vec![(widget.id, None, 1)]),
    )
    .await?
    .data
    .expect("order")
    .order;
    let err = payment_service::confirm_payment(
        &app.state,
        None,
        guest_order.id,
        confirm("pi_paid_bound"),
    )
    .await
    .expect_err("intent already tied to another order");
    assert!(matches!(err, AppError::BadRequest(_)));

    let paid = payment_service::confirm_payment(
        &app.state,
        Some(&owner),
        order.id,
        confirm("pi_paid_bound"),
    )
    .await?
    .data
    .expect("order");
    assert_eq!(paid.order.payment_status, PaymentStatus::Succeeded);
    assert_eq!(paid.order.payment_intent_id.as_deref(), Some("pi_paid_bound"));
    Ok(())
}

#[tokio::test]
async fn concurrent_cancels_restore_stock_once() -> anyhow::Result<()> {
    let app = setup().await?;
    let user = app.user("buyer@example.com").await?;
    let category = app.category("gadgets").await?;
    let widget = app.product(category, "widget", 1_000, 10, false).await?;

    let order = order_service::create_order(
        &app.state,
        Some(&user),
        order_request(vec![(widget.id, None, 3)]),
    )
    .await?
    .data
    .expect("order")
    .order;

    let (first, second) = tokio::join!(
        order_service::cancel_order(&app.state, &user, order.id),
        order_service::cancel_order(&app.state, &user, order.id),
    );
    assert_eq!(
        [first.is_ok(), second.is_ok()].iter().filter(|ok| **ok).count(),
        1,
        "exactly one cancel wins"
    );
    let loser = first.err().or(second.err()).expect("one cancel fails");
    assert!(
        matches!(loser, AppError::BadRequest(ref m) if m == "Only pending orders can be cancelled")
    );

    let widget_after = Products::find_by_id(widget.id).one(&app.state.orm).await?.expect("widget");
    assert_eq!(widget_after.stock_quantity, 10);
    assert_eq!(widget_after.sales_count, 0);

    let detail = order_service::get_order(&app.state, Some(&user), order.id)
        .await?
        .data
        .expect("order");
    let cancellations = detail
        .status_history
        .iter()
        .filter(|entry| entry.status == "Cancelled")
        .count();
    assert_eq!(cancellations, 1);
    Ok(())
}

#[tokio::test]
async fn failed_refund_leaves_order_paid() -> anyhow::Result<()> {
    let app = setup().await?;
    let user = app.user("buyer@example.com").await?;
    let admin = app.admin().await?;
    let category = app.category("gadgets").await?;
    let widget = app.product(category, "widget", 1_000, 10, false).await?;

    let order = order_service::create_order(
        &app.state,
        Some(&user),
        order_request(vec![(widget.id, None, 1)]),
    )
    .await?
    .data
    .expect("order")
    .order;
    app.gateway.settle("pi_paid_refund", order.total);
    payment_service::confirm_payment(
        &app.state,
        Some(&user),
        order.id,
        ConfirmPaymentRequest {
            payment_intent_id: "pi_paid_refund".into(),
        },
    )
    .await?;

    app.gateway.fail_refunds.store(true, Ordering::SeqCst);
    let err = order_service::update_order_status(
        &app.state,
        &admin,
        order.id,
        UpdateOrderStatusRequest {
            status: "Refunded".into(),
            notes: None,
        },
    )
    .await
    .expect_err("gateway declined the refund");
    assert!(matches!(err, AppError::Payment(_)));

    let detail = order_service::get_order(&app.state, Some(&admin), order.id)
        .await?
        .data
        .expect("order");
    assert_eq!(detail.order.status, OrderStatus::Processing);
    assert_eq!(detail.order.payment_status, PaymentStatus::Succeeded);
    assert!(detail.status_history.iter().all(|entry| entry.status != "Refunded"));
    Ok(())
}

#[tokio::test]
async fn signed_webhook_marks_order_paid_once() -> anyhow::Result<()> {
    let app = setup().await?;
    let category = app.category("gadgets").await?;
    let widget = app.product(category, "widget", 1_000, 10, false).await?;
    let mut request = order_request(vec![(widget.id, None, 1)]);
    request.payment_intent_id = Some("pi_hook_1".into());
    let order = order_service::create_order(&app.state, None, request)
        .await?
        .data
        .expect("order")
        .order;

    let payload = json!({
        "id": "evt_1",
        "type": "payment_intent.succeeded",
        "data": { "object": { "object": "payment_intent", "id": "pi_hook_1" } }
    })
    .to_string();
    let timestamp = Utc::now().timestamp();
    let signature = format!("t={timestamp},v1={}", webhook::sign(&payload, "whsec_test", timestamp)?);

    let err = payment_service::handle_webhook(&app.state, Some("t=1,v1=deadbeef"), &payload)
        .await
        .expect_err("bad signature");
    assert!(matches!(err, AppError::BadRequest(_)));
    let err = payment_service::handle_webhook(&app.state, None, &payload)
        .await
        .expect_err("missing signature");
    assert!(matches!(err, AppError::BadRequest(ref m) if m == "Missing webhook signature"));

    for _ in 0..2 {
        payment_service::handle_webhook(&app.state, Some(&signature), &payload).await?;
    }

    let detail = order_service::get_order(&app.state, None, order.id)
        .await?
        .data
        .expect("order");
    assert_eq!(detail.order.payment_status, PaymentStatus::Succeeded);
    assert_eq!(detail.order.status, OrderStatus::Processing);
    assert_eq!(detail.status_history.len(), 2);

    let late_failure = json!({
        "id": "evt_2",
        "type": "payment_intent.payment_failed",
        "data": { "object": { "object": "payment_intent", "id": "pi_hook_1" } }
    })
    .to_string();
    let signature = format!(
        "t={timestamp},v1={}",
        webhook::sign(&late_failure, "whsec_test", timestamp)?
    );
    payment_service::handle_webhook(&app.state, Some(&signature), &late_failure).await?;

    let stored = Orders::find_by_id(order.id).one(&app.state.orm).await?.expect("order");
    assert_eq!(stored.payment_status, PaymentStatus::Succeeded);
    Ok(())
}

#[tokio::test]
async fn order_visibility_over_http() -> anyhow::Result<()> {
    let app = setup().await?;
    let owner = app.user("owner@example.com").await?;
    let other = app.user("other@example.com").await?;
    let category = app.category("gadgets").await?;
    let widget = app.product(category, "widget", 1_000, 10, false).await?;

    let owner_token = app.token(&owner)?;
    let body = json!({
        "first_name": "Ada",
        "last_name": "Lovelace",
        "email": "ada@example.com",
        "phone_number": "5550100",
        "street_address": "1 Analytical Way",
        "city": "London",
        "state": "LDN",
        "country": "UK",
        "zip_code": "N1",
        "payment_method": "card",
        "items": [{ "product_id": widget.id, "quantity": 1 }]
    });
    let (status, created) = app
        .call(Method::POST, "/api/orders", Some(&owner_token), Some(body))
        .await?;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created["success"], true);
    let id = created["data"]["id"].as_str().expect("order id").to_string();
    let number = created["data"]["order_number"].as_str().expect("number").to_string();

    let uri = format!("/api/orders/{id}");
    let (status, _) = app.call(Method::GET, &uri, Some(&owner_token), None).await?;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = app.call(Method::GET, &uri, None, None).await?;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    let (status, _) = app
        .call(Method::GET, &uri, Some(&app.token(&other)?), None)
        .await?;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, by_number) = app
        .call(Method::GET, &format!("/api/orders/number/{number}"), None, None)
        .await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(by_number["data"]["id"], id.as_str());

    let (status, list) = app.call(Method::GET, "/api/orders", Some(&owner_token), None).await?;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(list["success"], false);
    Ok(())
}
