mod common;

use storefront_api::{dto::users::AddressRequest, services::user_service};

use common::setup;

fn address(city: &str, is_default: bool) -> AddressRequest {
    AddressRequest {
        address_type: "shipping".into(),
        first_name: "Grace".into(),
        last_name: "Hopper".into(),
        company_name: None,
        street_address: "42 Compiler Rd".into(),
        apartment_suite: None,
        city: city.into(),
        state: "VA".into(),
        country: "US".into(),
        zip_code: "22201".into(),
        phone_number: "5550101".into(),
        is_default,
    }
}

#[tokio::test]
async fn exactly_one_default_address() -> anyhow::Result<()> {
    let app = setup().await?;
    let user = app.user("grace@example.com").await?;

    let first = user_service::create_address(&app.state, &user, address("Arlington", false))
        .await?
        .data
        .expect("address");
    assert!(first.is_default, "first address becomes the default");

    let second = user_service::create_address(&app.state, &user, address("Boston", true))
        .await?
        .data
        .expect("address");
    assert!(second.is_default);

    let all = user_service::list_addresses(&app.state, &user).await?.data.expect("list");
    assert_eq!(all.iter().filter(|a| a.is_default).count(), 1);
    assert_eq!(all[0].id, second.id, "default is listed first");

    user_service::set_default_address(&app.state, &user, first.id).await?;
    let all = user_service::list_addresses(&app.state, &user).await?.data.expect("list");
    let defaults: Vec<_> = all.iter().filter(|a| a.is_default).collect();
    assert_eq!(defaults.len(), 1);
    assert_eq!(defaults[0].id, first.id);

    user_service::delete_address(&app.state, &user, first.id).await?;
    let all = user_service::list_addresses(&app.state, &user).await?.data.expect("list");
    assert_eq!(all.len(), 1);
    assert!(all[0].is_default, "remaining address is promoted");
    Ok(())
}

#[tokio::test]
async fn addresses_are_private() -> anyhow::Result<()> {
    let app = setup().await?;
    let owner = app.user("owner@example.com").await?;
    let other = app.user("other@example.com").await?;

    let created = user_service::create_address(&app.state, &owner, address("Austin", false))
        .await?
        .data
        .expect("address");

    assert!(user_service::get_address(&app.state, &other, created.id).await.is_err());
    assert!(
        user_service::update_address(&app.state, &other, created.id, address("Dallas", false))
            .await
            .is_err()
    );
    assert!(user_service::delete_address(&app.state, &other, created.id).await.is_err());

    let fetched = user_service::get_address(&app.state, &owner, created.id)
        .await?
        .data
        .expect("address");
    assert_eq!(fetched.city, "Austin");
    Ok(())
}
