pub mod address_service;
pub mod admin_service;
pub mod analytics_service;
pub mod auth_service;
pub mod cart_service;
pub mod discount_service;
pub mod order_service;
pub mod otp_service;
pub mod product_service;
pub mod settings_service;
pub mod wishlist_service;
