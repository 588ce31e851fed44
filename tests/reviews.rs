mod common;

use axum::http::{Method, StatusCode};
use serde_json::json;

use storefront_api::{
    dto::reviews::CreateReviewRequest,
    routes::params::Pagination,
    services::{order_service, review_service},
};

use common::{order_request, setup};

fn review(rating: i32, title: &str) -> CreateReviewRequest {
    CreateReviewRequest {
        rating,
        title: Some(title.to_string()),
        comment: None,
    }
}

#[tokio::test]
async fn rating_must_be_between_one_and_five() -> anyhow::Result<()> {
    let app = setup().await?;
    let user = app.user("critic@example.com").await?;
    let token = app.token(&user)?;
    let category = app.category("audio").await?;
    let speaker = app.product(category, "speaker", 9_900, 5, false).await?;
    let uri = format!("/api/products/{}/reviews", speaker.id);

    for rating in [0, 6] {
        let (status, body) = app
            .call(Method::POST, &uri, Some(&token), Some(json!({ "rating": rating })))
            .await?;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["message"], "Validation failed");
    }

    let (status, body) = app
        .call(
            Method::POST,
            &uri,
            Some(&token),
            Some(json!({ "rating": 5, "title": "Loud" })),
        )
        .await?;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    assert_eq!(body["data"]["rating"], 5);

    let (status, _) = app
        .call(Method::POST, &uri, None, Some(json!({ "rating": 4 })))
        .await?;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    Ok(())
}

#[tokio::test]
async fn verified_purchase_needs_a_live_order() -> anyhow::Result<()> {
    let app = setup().await?;
    let buyer = app.user("buyer@example.com").await?;
    let canceller = app.user("canceller@example.com").await?;
    let browser = app.user("browser@example.com").await?;
    let category = app.category("audio").await?;
    let speaker = app.product(category, "speaker", 9_900, 5, false).await?;

    order_service::create_order(
        &app.state,
        Some(&buyer),
        order_request(vec![(speaker.id, None, 1)]),
    )
    .await?;
    let cancelled = order_service::create_order(
        &app.state,
        Some(&canceller),
        order_request(vec![(speaker.id, None, 1)]),
    )
    .await?
    .data
    .expect("order")
    .order;
    order_service::cancel_order(&app.state, &canceller, cancelled.id).await?;

    let verified = review_service::create_review(&app.state, &buyer, speaker.id, review(5, "Great"))
        .await?
        .data
        .expect("review");
    assert!(verified.is_verified_purchase);

    let after_cancel =
        review_service::create_review(&app.state, &canceller, speaker.id, review(2, "Meh"))
            .await?
            .data
            .expect("review");
    assert!(!after_cancel.is_verified_purchase);

    let unbought = review_service::create_review(&app.state, &browser, speaker.id, review(4, "Nice"))
        .await?
        .data
        .expect("review");
    assert!(!unbought.is_verified_purchase);
    Ok(())
}

#[tokio::test]
async fn reviews_are_paged_newest_first() -> anyhow::Result<()> {
    let app = setup().await?;
    let user = app.user("critic@example.com").await?;
    let category = app.category("audio").await?;
    let speaker = app.product(category, "speaker", 9_900, 5, false).await?;

    for title in ["first", "second", "third"] {
        review_service::create_review(&app.state, &user, speaker.id, review(4, title)).await?;
    }

    let page_one = review_service::list_reviews(&app.state, speaker.id, Pagination::new(Some(1), Some(2)))
        .await?;
    let meta = page_one.meta.expect("meta");
    assert_eq!(meta.total, 3);
    assert_eq!(meta.total_pages, 2);
    assert!(meta.has_next);
    let titles: Vec<_> = page_one
        .data
        .expect("reviews")
        .items
        .into_iter()
        .map(|r| r.title.unwrap_or_default())
        .collect();
    assert_eq!(titles, vec!["third", "second"]);

    let page_two = review_service::list_reviews(&app.state, speaker.id, Pagination::new(Some(2), Some(2)))
        .await?
        .data
        .expect("reviews");
    assert_eq!(page_two.items.len(), 1);
    assert_eq!(page_two.items[0].title.as_deref(), Some("first"));
    assert!(!page_two.items[0].user_name.is_empty());
    Ok(())
}
