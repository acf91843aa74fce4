pub mod addresses;
pub mod analytics;
pub mod auth;
pub mod cart;
pub mod discounts;
pub mod orders;
pub mod products;
pub mod wishlist;
