pub mod auth;
pub mod brands;
pub mod cart;
pub mod categories;
pub mod orders;
pub mod products;
pub mod recommendations;
pub mod reviews;
pub mod users;
pub mod wishlist;
