use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect, Set, TransactionTrait, sea_query::Expr,
};
use uuid::Uuid;

use crate::{
    dto::{
        products::ProductSummary,
        users::{AddressRequest, UpdateProfileRequest},
    },
    entity::{
        products::{Column as ProductCol, Entity as Products},
        recently_viewed::{Column as ViewedCol, Entity as RecentlyViewed},
        user_addresses::{
            ActiveModel as AddressActive, Column as AddressCol, Entity as UserAddresses,
            Model as AddressModel,
        },
        users::{ActiveModel as UserActive, Entity as Users},
    },
    error::{AppError, AppResult},
    middleware::auth::AuthUser,
    models::{Address, User},
    response::ApiResponse,
    services::product_service,
    state::AppState,
};

pub async fn get_profile(state: &AppState, user: &AuthUser) -> AppResult<ApiResponse<User>> {
    let existing = Users::find_by_id(user.user_id)
        .one(&state.orm)
        .await?
        .ok_or_else(|| AppError::not_found("User"))?;
    Ok(ApiResponse::success("Profile", existing.into(), None))
}

pub async fn update_profile(
    state: &AppState,
    user: &AuthUser,
    payload: UpdateProfileRequest,
) -> AppResult<ApiResponse<User>> {
    let existing = Users::find_by_id(user.user_id)
        .one(&state.orm)
        .await?
        .ok_or_else(|| AppError::not_found("User"))?;

    let mut active: UserActive = existing.into();
    if let Some(first_name) = payload.first_name {
        active.first_name = Set(Some(first_name));
    }
    if let Some(last_name) = payload.last_name {
        active.last_name = Set(Some(last_name));
    }
    if let Some(phone) = payload.phone {
        active.phone = Set(Some(phone));
    }
    active.updated_at = Set(Utc::now().into());
    let updated = active.update(&state.orm).await?;

    Ok(ApiResponse::success("Profile updated", updated.into(), None))
}

pub async fn list_addresses(
    state: &AppState,
    user: &AuthUser,
) -> AppResult<ApiResponse<Vec<Address>>> {
    let items = UserAddresses::find()
        .filter(AddressCol::UserId.eq(user.user_id))
        .order_by_desc(AddressCol::IsDefault)
        .order_by_desc(AddressCol::CreatedAt)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(Address::from)
        .collect();
    Ok(ApiResponse::success("Addresses", items, None))
}

pub async fn get_address(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<Address>> {
    let address = find_owned(&state.orm, user.user_id, id).await?;
    Ok(ApiResponse::success("Address", address.into(), None))
}

pub async fn create_address(
    state: &AppState,
    user: &AuthUser,
    payload: AddressRequest,
) -> AppResult<ApiResponse<Address>> {
    let txn = state.orm.begin().await?;

    let existing = UserAddresses::find()
        .filter(AddressCol::UserId.eq(user.user_id))
        .count(&txn)
        .await?;
    let make_default = payload.is_default || existing == 0;
    if make_default {
        clear_default(&txn, user.user_id).await?;
    }

    let now = Utc::now();
    let address = AddressActive {
        id: Set(Uuid::new_v4()),
        user_id: Set(user.user_id),
        address_type: Set(payload.address_type),
        first_name: Set(payload.first_name),
        last_name: Set(payload.last_name),
        company_name: Set(payload.company_name),
        street_address: Set(payload.street_address),
        apartment_suite: Set(payload.apartment_suite),
        city: Set(payload.city),
        state: Set(payload.state),
        country: Set(payload.country),
        zip_code: Set(payload.zip_code),
        phone_number: Set(payload.phone_number),
        is_default: Set(make_default),
        created_at: Set(now.into()),
        updated_at: Set(now.into()),
    }
    .insert(&txn)
    .await?;

    txn.commit().await?;
    Ok(ApiResponse::success("Address created", address.into(), None))
}

/// Full update. Setting `is_default` moves the default here; clearing it on the
/// current default is ignored so the user keeps exactly one default.
pub async fn update_address(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    payload: AddressRequest,
) -> AppResult<ApiResponse<Address>> {
    let txn = state.orm.begin().await?;
    let existing = find_owned(&txn, user.user_id, id).await?;

    let make_default = existing.is_default || payload.is_default;
    if make_default && !existing.is_default {
        clear_default(&txn, user.user_id).await?;
    }

    let mut active: AddressActive = existing.into();
    active.address_type = Set(payload.address_type);
    active.first_name = Set(payload.first_name);
    active.last_name = Set(payload.last_name);
    active.company_name = Set(payload.company_name);
    active.street_address = Set(payload.street_address);
    active.apartment_suite = Set(payload.apartment_suite);
    active.city = Set(payload.city);
    active.state = Set(payload.state);
    active.country = Set(payload.country);
    active.zip_code = Set(payload.zip_code);
    active.phone_number = Set(payload.phone_number);
    active.is_default = Set(make_default);
    active.updated_at = Set(Utc::now().into());
    let address = active.update(&txn).await?;

    txn.commit().await?;
    Ok(ApiResponse::success("Address updated", address.into(), None))
}

pub async fn delete_address(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<serde_json::Value>> {
    let txn = state.orm.begin().await?;
    let existing = find_owned(&txn, user.user_id, id).await?;
    let was_default = existing.is_default;

    UserAddresses::delete_by_id(existing.id).exec(&txn).await?;

    if was_default {
        let next = UserAddresses::find()
            .filter(AddressCol::UserId.eq(user.user_id))
            .order_by_desc(AddressCol::CreatedAt)
            .one(&txn)
            .await?;
        if let Some(next) = next {
            let mut active: AddressActive = next.into();
            active.is_default = Set(true);
            active.updated_at = Set(Utc::now().into());
            active.update(&txn).await?;
        }
    }

    txn.commit().await?;
    Ok(ApiResponse::empty("Address deleted"))
}

pub async fn set_default_address(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<Address>> {
    let txn = state.orm.begin().await?;
    let existing = find_owned(&txn, user.user_id, id).await?;

    clear_default(&txn, user.user_id).await?;

    let mut active: AddressActive = existing.into();
    active.is_default = Set(true);
    active.updated_at = Set(Utc::now().into());
    let address = active.update(&txn).await?;

    txn.commit().await?;
    Ok(ApiResponse::success("Default address set", address.into(), None))
}

pub async fn recently_viewed(
    state: &AppState,
    user: &AuthUser,
    count: u64,
) -> AppResult<ApiResponse<Vec<ProductSummary>>> {
    let product_ids: Vec<Uuid> = RecentlyViewed::find()
        .select_only()
        .column(ViewedCol::ProductId)
        .filter(ViewedCol::UserId.eq(user.user_id))
        .order_by_desc(ViewedCol::ViewedAt)
        .limit(count)
        .into_tuple()
        .all(&state.orm)
        .await?;

    let products = Products::find()
        .filter(ProductCol::Id.is_in(product_ids.clone()))
        .filter(ProductCol::IsActive.eq(true))
        .all(&state.orm)
        .await?;
    let mut summaries = product_service::summarize(&state.orm, products).await?;
    summaries.sort_by_key(|s| product_ids.iter().position(|id| *id == s.id));

    Ok(ApiResponse::success("Recently viewed", summaries, None))
}

async fn find_owned<C: ConnectionTrait>(db: &C, user_id: Uuid, id: Uuid) -> AppResult<AddressModel> {
    UserAddresses::find_by_id(id)
        .filter(AddressCol::UserId.eq(user_id))
        .one(db)
        .await?
        .ok_or_else(|| AppError::not_found("Address"))
}

async fn clear_default<C: ConnectionTrait>(db: &C, user_id: Uuid) -> AppResult<()> {
    UserAddresses::update_many()
        .col_expr(AddressCol::IsDefault, Expr::value(false))
        .filter(AddressCol::UserId.eq(user_id))
        .filter(AddressCol::IsDefault.eq(true))
        .exec(db)
        .await?;
    Ok(())
}
