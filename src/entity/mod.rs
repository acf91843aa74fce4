pub mod addresses;
pub mod audit_logs;
pub mod checkout_settings;
pub mod discounts;
pub mod order_items;
pub mod orders;
pub mod otp_sessions;
pub mod products;
pub mod users;
pub mod wishlist_items;

pub use addresses::Entity as Addresses;
pub use audit_logs::Entity as AuditLogs;
pub use checkout_settings::Entity as CheckoutSettings;
pub use discounts::Entity as Discounts;
pub use order_items::Entity as OrderItems;
pub use orders::Entity as Orders;
pub use otp_sessions::Entity as OtpSessions;
pub use products::Entity as Products;
pub use users::Entity as Users;
pub use wishlist_items::Entity as WishlistItems;
