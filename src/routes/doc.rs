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
    cart::CartLine,
    dto::{
        addresses::{AddressList, CreateAddressRequest, UpdateAddressRequest},
        analytics::{AnalyticsSummary, TopProduct, TopProductList},
        auth::{
            LoginRequest, LoginResponse, OtpPurpose, OtpRequest, OtpRequested, RegisterRequest,
            RegisterResponse, ResetPasswordRequest, VerifyOtpRequest, VerifyOtpResponse,
        },
        cart::{AddCartLineRequest, CartView, UpdateCartLineRequest},
        discounts::{
            CreateDiscountRequest, DiscountList, UpdateCheckoutSettingsRequest,
            UpdateDiscountRequest,
        },
        orders::{CheckoutRequest, OrderList, OrderWithItems},
        products,
        wishlist::{AddWishlistRequest, WishlistItemDto, WishlistList},
    },
    models::{
        Address, CheckoutSettings, Discount, DiscountKind, Order, OrderItem, Product, User,
    },
    response::{ApiResponse, Meta},
    routes::{
        addresses, admin, auth, cart, discounts, health, orders, params,
        products as product_routes, settings, wishlist,
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
        auth::request_otp,
        auth::verify_otp,
        auth::reset_password,
        cart::view_cart,
        cart::add_line,
        cart::update_line,
        cart::remove_line,
        cart::clear_cart,
        product_routes::list_products,
        product_routes::create_product,
        product_routes::get_product,
        product_routes::update_product,
        product_routes::delete_product,
        orders::list_orders,
        orders::checkout,
        orders::get_order,
        addresses::list_addresses,
        addresses::create_address,
        addresses::update_address,
        addresses::delete_address,
        wishlist::list_wishlist,
        wishlist::add_wishlist_item,
        wishlist::remove_wishlist_item,
        discounts::lookup_discount,
        discounts::list_discounts,
        discounts::create_discount,
        discounts::update_discount,
        discounts::delete_discount,
        settings::get_settings,
        settings::update_settings,
        admin::list_all_orders,
        admin::get_order_admin,
        admin::update_order_status,
        admin::update_fulfillment,
        admin::list_low_stock,
        admin::adjust_inventory,
        admin::analytics_summary,
        admin::analytics_top_products,
    ),
    components(
        schemas(
            User,
            Product,
            Address,
            Order,
            OrderItem,
            Discount,
            DiscountKind,
            CheckoutSettings,
            CartLine,
            CartView,
            AddCartLineRequest,
            UpdateCartLineRequest,
            RegisterRequest,
            RegisterResponse,
            LoginRequest,
            LoginResponse,
            OtpPurpose,
            OtpRequest,
            OtpRequested,
            VerifyOtpRequest,
            VerifyOtpResponse,
            ResetPasswordRequest,
            CreateAddressRequest,
            UpdateAddressRequest,
            AddressList,
            AddWishlistRequest,
            WishlistItemDto,
            WishlistList,
            CheckoutRequest,
            CreateDiscountRequest,
            UpdateDiscountRequest,
            UpdateCheckoutSettingsRequest,
            DiscountList,
            AnalyticsSummary,
            TopProduct,
            TopProductList,
            admin::ProductList,
            admin::UpdateOrderStatusRequest,
            admin::UpdateFulfillmentRequest,
            admin::InventoryAdjustRequest,
            admin::LowStockQuery,
            OrderList,
            OrderWithItems,
            params::Pagination,
            params::ProductQuery,
            params::OrderListQuery,
            products::ProductList,
            Meta,
            ApiResponse<Product>,
            ApiResponse<products::ProductList>,
            ApiResponse<CartView>,
            ApiResponse<OrderWithItems>,
            ApiResponse<OrderList>,
            ApiResponse<admin::ProductList>
        )
    ),
    security(
        ("bearer_auth" = [])
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Health", description = "Health check endpoint"),
        (name = "Auth", description = "Registration, login and OTP verification"),
        (name = "Products", description = "Catalog endpoints"),
        (name = "Cart", description = "Session cart endpoints"),
        (name = "Orders", description = "Checkout and order history"),
        (name = "Addresses", description = "Shipping address book"),
        (name = "Wishlist", description = "Saved products"),
        (name = "Discounts", description = "Discount codes"),
        (name = "Settings", description = "Checkout settings"),
        (name = "Admin", description = "Back office endpoints"),
    )
)]
pub struct ApiDoc;

pub fn scalar_docs() -> Scalar<OpenApiSpec> {
    Scalar::with_url("/docs", ApiDoc::openapi())
}
