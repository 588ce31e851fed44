pub mod brands;
pub mod cart_items;
pub mod categories;
pub mod frequently_bought_together;
pub mod order_items;
pub mod order_status_history;
pub mod orders;
pub mod password_reset_tokens;
pub mod product_reviews;
pub mod product_tags;
pub mod product_variants;
pub mod products;
pub mod recently_viewed;
pub mod subcategories;
pub mod user_addresses;
pub mod users;
pub mod wishlist_items;

pub use brands::Entity as Brands;
pub use cart_items::Entity as CartItems;
pub use categories::Entity as Categories;
pub use frequently_bought_together::Entity as FrequentlyBoughtTogether;
pub use order_items::Entity as OrderItems;
pub use order_status_history::Entity as OrderStatusHistory;
pub use orders::Entity as Orders;
pub use password_reset_tokens::Entity as PasswordResetTokens;
pub use product_reviews::Entity as ProductReviews;
pub use product_tags::Entity as ProductTags;
pub use product_variants::Entity as ProductVariants;
pub use products::Entity as Products;
pub use recently_viewed::Entity as RecentlyViewed;
pub use subcategories::Entity as Subcategories;
pub use user_addresses::Entity as UserAddresses;
pub use users::Entity as Users;
pub use wishlist_items::Entity as WishlistItems;
