use utoipa::{
    Modify, OpenApi,
    openapi::{
        self,
        OpenApi as OpenApiSpec,
        security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    },
};
use utoipa_scalar::{Scalar, Servable};

use crate::{
    dto::{
        auth::AuthResponse,
        cart::CartSummary,
        categories::FeaturedCategory,
        orders::{OrderDetail, OrderList},
        products::{ProductDetail, ProductList},
        recommendations::Bundle,
        reviews::ReviewList,
        wishlist::Wishlist,
    },
    entity::orders::{OrderStatus, PaymentStatus},
    models::{Address, Brand, Category, Order, Subcategory, User},
    response::{ApiResponse, Meta},
    routes::{
        auth, brands, cart, categories, health, orders, params, products, recommendations, users,
        wishlist,
    },
};

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        health::health_check,
        auth::register,
        auth::login,
        auth::change_password,
        auth::forgot_password,
        auth::reset_password,
        users::get_profile,
        users::update_profile,
        users::list_addresses,
        users::get_address,
        users::create_address,
        users::update_address,
        users::delete_address,
        users::set_default_address,
        users::recently_viewed,
        products::list_products,
        products::search_products,
        products::featured_products,
        products::new_products,
        products::on_sale_products,
        products::best_sellers,
        products::popular_products,
        products::get_product,
        products::get_product_by_slug,
        products::related_products,
        products::create_product,
        products::update_product,
        products::delete_product,
        products::update_stock,
        products::low_stock,
        products::list_reviews,
        products::create_review,
        categories::list_categories,
        categories::top_categories,
        categories::featured_categories,
        categories::get_category,
        categories::get_category_by_slug,
        categories::list_subcategories,
        categories::create_category,
        categories::update_category,
        categories::delete_category,
        categories::create_subcategory,
        categories::update_subcategory,
        categories::delete_subcategory,
        brands::list_brands,
        brands::featured_brands,
        brands::get_brand,
        brands::create_brand,
        brands::update_brand,
        brands::delete_brand,
        cart::get_cart,
        cart::add_to_cart,
        cart::update_cart_item,
        cart::remove_cart_item,
        cart::clear_cart,
        cart::cart_count,
        wishlist::get_wishlist,
        wishlist::add_to_wishlist,
        wishlist::remove_from_wishlist,
        orders::create_order,
        orders::get_order,
        orders::get_order_by_number,
        orders::list_my_orders,
        orders::list_all_orders,
        orders::update_order_status,
        orders::cancel_order,
        orders::create_payment_intent,
        orders::confirm_payment,
        orders::webhook,
        recommendations::get_bundle,
        recommendations::list_links,
        recommendations::create_links,
        recommendations::reorder_links,
        recommendations::delete_link,
        recommendations::seed_links
    ),
    components(
        schemas(
            User,
            Address,
            Brand,
            Category,
            Subcategory,
            Order,
            OrderStatus,
            PaymentStatus,
            AuthResponse,
            CartSummary,
            FeaturedCategory,
            OrderDetail,
            OrderList,
            ProductDetail,
            ProductList,
            ReviewList,
            Wishlist,
            Bundle,
            params::Pagination,
            params::ProductQuery,
            params::OrderListQuery,
            Meta,
            ApiResponse<ProductList>,
            ApiResponse<OrderDetail>,
            ApiResponse<CartSummary>
        )
    ),
    security(
        ("bearer_auth" = [])
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Health", description = "Health check endpoint"),
        (name = "Auth", description = "Registration, login and password reset"),
        (name = "Users", description = "Profile, addresses and browsing history"),
        (name = "Products", description = "Catalog browsing and product administration"),
        (name = "Reviews", description = "Product reviews"),
        (name = "Categories", description = "Categories and subcategories"),
        (name = "Brands", description = "Brand endpoints"),
        (name = "Cart", description = "Shopping cart"),
        (name = "Wishlist", description = "Saved products"),
        (name = "Orders", description = "Checkout and order management"),
        (name = "Payments", description = "Payment intents, confirmation and gateway webhooks"),
        (name = "Recommendations", description = "Frequently bought together bundles"),
    )
)]
pub struct ApiDoc;

pub fn scalar_docs() -> Scalar<OpenApiSpec> {
    Scalar::with_url("/docs", ApiDoc::openapi())
}
