use std::sync::{Arc, Mutex, OnceLock};

use anyhow::Result;
use argon2::{Argon2, PasswordVerifier, password_hash::PasswordHash};
use async_trait::async_trait;
use storefront_api::{
    cart::PgCartStorage,
    db::{DbPool, create_orm_conn, create_pool, run_migrations},
    dto::auth::{OtpPurpose, OtpRequest, RegisterRequest, ResetPasswordRequest, VerifyOtpRequest},
    dto::cart::AddCartLineRequest,
    dto::discounts::UpdateCheckoutSettingsRequest,
    dto::orders::CheckoutRequest,
    error::AppError,
    middleware::{auth::AuthUser, cart_session::CartSession},
    otp::OtpSender,
    routes::admin::{LowStockQuery, UpdateFulfillmentRequest},
    services::{
        admin_service, analytics_service, auth_service, cart_service, order_service, otp_service,
        settings_service,
    },
    state::AppState,
};
use uuid::Uuid;

/// Captures issued codes instead of delivering them, so the tests can type
/// them back in.
#[derive(Default)]
struct CapturingSender {
    codes: Mutex<Vec<String>>,
}

impl CapturingSender {
    fn last_code(&self) -> Option<String> {
        self.codes.lock().unwrap().last().cloned()
    }
}

#[async_trait]
impl OtpSender for CapturingSender {
    async fn send(&self, _mobile: &str, code: &str) -> Result<()> {
        self.codes.lock().unwrap().push(code.to_string());
        Ok(())
    }
}

struct FailingSender;

#[async_trait]
impl OtpSender for FailingSender {
    async fn send(&self, _mobile: &str, _code: &str) -> Result<()> {
        anyhow::bail!("carrier unavailable")
    }
}

// The flow tests share one database; run them one at a time.
fn db_lock() -> &'static tokio::sync::Mutex<()> {
    static LOCK: OnceLock<tokio::sync::Mutex<()>> = OnceLock::new();
    LOCK.get_or_init(|| tokio::sync::Mutex::new(()))
}

fn database_url() -> Option<String> {
    std::env::var("TEST_DATABASE_URL")
        .or_else(|_| std::env::var("DATABASE_URL"))
        .ok()
}

async fn setup_state(database_url: &str, sender: Arc<dyn OtpSender>) -> Result<AppState> {
    let pool = create_pool(database_url).await?;
    let orm = create_orm_conn(database_url).await?;
    run_migrations(&orm).await?;

    sqlx::query(
        "TRUNCATE TABLE order_items, orders, cart_snapshots, wishlist_items, audit_logs, \
         addresses, otp_sessions, discounts, checkout_settings, products, users \
         RESTART IDENTITY CASCADE",
    )
    .execute(&pool)
    .await?;

    Ok(AppState {
        pool: pool.clone(),
        orm,
        cart: Arc::new(PgCartStorage::new(pool)),
        otp_sender: sender,
    })
}

async fn create_user(pool: &DbPool, role: &str, mobile: &str, password: &str) -> Result<Uuid> {
    let id = Uuid::new_v4();
    let hash = auth_service::hash_password(password)?;
    sqlx::query(
        "INSERT INTO users (id, name, mobile, password_hash, role, mobile_verified_at) \
         VALUES ($1, $2, $3, $4, $5, now())",
    )
    .bind(id)
    .bind(format!("Test {role}"))
    .bind(mobile)
    .bind(hash)
    .bind(role)
    .execute(pool)
    .await?;
    Ok(id)
}

async fn create_address(pool: &DbPool, user_id: Uuid) -> Result<Uuid> {
    let id = Uuid::new_v4();
    sqlx::query(
        "INSERT INTO addresses \
         (id, user_id, label, recipient, phone, line1, city, state_province, postal_code) \
         VALUES ($1, $2, 'home', 'Test Customer', '15550000002', \
                 '12 Foundry Lane', 'Springfield', 'IL', '62701')",
    )
    .bind(id)
    .bind(user_id)
    .execute(pool)
    .await?;
    Ok(id)
}

async fn create_product(
    pool: &DbPool,
    name: &str,
    price: i64,
    stock: i32,
    colors: &[&str],
    sizes: &[&str],
) -> Result<Uuid> {
    let id = Uuid::new_v4();
    sqlx::query(
        "INSERT INTO products (id, name, description, price, stock, colors, sizes) \
         VALUES ($1, $2, NULL, $3, $4, $5, $6)",
    )
    .bind(id)
    .bind(name)
    .bind(price)
    .bind(stock)
    .bind(serde_json::json!(colors))
    .bind(serde_json::json!(sizes))
    .execute(pool)
    .await?;
    Ok(id)
}

async fn set_checkout_settings(pool: &DbPool) -> Result<()> {
    sqlx::query(
        "INSERT INTO checkout_settings (id, tax_percent, shipping_fee, free_shipping_above, cod_limit) \
         VALUES (1, 0, 99, 2999, 20000)",
    )
    .execute(pool)
    .await?;
    Ok(())
}

// Storefront flow: two cart adds -> checkout -> admin fulfillment update,
// low-stock and analytics visibility.
#[tokio::test]
async fn cart_checkout_and_back_office_flow() -> Result<()> {
    let database_url = match database_url() {
        Some(url) => url,
        None => {
            eprintln!(
                "Skipping test: set TEST_DATABASE_URL or DATABASE_URL to run integration flow tests."
            );
            return Ok(());
        }
    };
    let _guard = db_lock().lock().await;

    let state = setup_state(&database_url, Arc::new(CapturingSender::default())).await?;
    set_checkout_settings(&state.pool).await?;

    let user_id = create_user(&state.pool, "customer", "15550000002", "user1234").await?;
    let admin_id = create_user(&state.pool, "admin", "15550000001", "admin123").await?;
    let address_id = create_address(&state.pool, user_id).await?;

    let p1 = create_product(&state.pool, "Linen Shirt", 3490, 5, &["orange"], &["38"]).await?;
    let p2 = create_product(&state.pool, "Ribbed Tee", 3490, 10, &["magenta"], &["40"]).await?;

    let user = AuthUser {
        user_id,
        role: "customer".into(),
    };
    let admin = AuthUser {
        user_id: admin_id,
        role: "admin".into(),
    };
    let session = CartSession(Uuid::new_v4());

    cart_service::add_line(
        &state,
        session,
        AddCartLineRequest {
            product_id: p1,
            color: "orange".into(),
            size: "38".into(),
            quantity: 1,
        },
    )
    .await?;
    let view = cart_service::add_line(
        &state,
        session,
        AddCartLineRequest {
            product_id: p2,
            color: "magenta".into(),
            size: "40".into(),
            quantity: 2,
        },
    )
    .await?;

    let cart = view.data.unwrap();
    assert_eq!(cart.count, 3);
    assert_eq!(cart.subtotal, 10_470);

    let checkout = order_service::checkout(
        &state,
        &user,
        session,
        CheckoutRequest {
            address_id,
            payment_method: "cod".into(),
            discount_code: None,
        },
    )
    .await?;
    let placed = checkout.data.unwrap();

    // 10470 clears the free-shipping threshold, tax is zero.
    assert_eq!(placed.order.total_amount, 10_470);
    assert_eq!(placed.order.status, "placed");
    assert_eq!(placed.order.fulfillment, "processing");
    assert_eq!(placed.items.len(), 2);

    // Checkout consumed the cart snapshot.
    let after = cart_service::view_cart(&state, session).await?;
    assert_eq!(after.data.unwrap().count, 0);

    let shipped = admin_service::update_fulfillment(
        &state,
        &admin,
        placed.order.id,
        UpdateFulfillmentRequest {
            fulfillment: "shipped".into(),
        },
    )
    .await?;
    assert_eq!(shipped.data.unwrap().fulfillment, "shipped");

    // Stock fell to 4 and 8; both are at or below the threshold.
    let low = admin_service::list_low_stock(
        &state,
        &admin,
        LowStockQuery {
            page: Some(1),
            per_page: Some(20),
            threshold: Some(10),
        },
    )
    .await?;
    let low_ids: Vec<Uuid> = low.data.unwrap().items.iter().map(|p| p.id).collect();
    assert!(low_ids.contains(&p1));
    assert!(low_ids.contains(&p2));

    let summary = analytics_service::summary(&state, &admin, Default::default()).await?;
    let summary = summary.data.unwrap();
    assert_eq!(summary.orders, 1);
    assert_eq!(summary.revenue, 10_470);

    let top = analytics_service::top_products(&state, &admin, Default::default()).await?;
    let top = top.data.unwrap();
    assert_eq!(top.items[0].product_id, p2);
    assert_eq!(top.items[0].units_sold, 2);

    Ok(())
}

// OTP flow: signup verification, resend cooldown, wrong code accounting,
// and a single-use reset token.
#[tokio::test]
async fn otp_signup_and_password_reset_flow() -> Result<()> {
    let database_url = match database_url() {
        Some(url) => url,
        None => {
            eprintln!(
                "Skipping test: set TEST_DATABASE_URL or DATABASE_URL to run integration flow tests."
            );
            return Ok(());
        }
    };
    let _guard = db_lock().lock().await;

    let sender = Arc::new(CapturingSender::default());
    let state = setup_state(&database_url, sender.clone()).await?;

    // Registration opens a signup verification and sends a code.
    let registered = auth_service::register_user(
        &state,
        RegisterRequest {
            name: "New Customer".into(),
            mobile: "15550000003".into(),
            password: "secret123".into(),
        },
    )
    .await?;
    let registered = registered.data.unwrap();
    let signup_code = sender.last_code().expect("signup code sent");

    // Re-requesting during the cooldown is rejected with the rate-limit
    // variant, not a generic failure.
    let resend = otp_service::request_code(
        &state,
        OtpRequest {
            mobile: "15550000003".into(),
            purpose: OtpPurpose::Signup,
        },
    )
    .await;
    assert!(matches!(resend, Err(AppError::TooManyRequests(_))));

    // A wrong code is counted but leaves the session retryable.
    let wrong = flip_first_digit(&signup_code);
    let rejected = otp_service::verify_code(
        &state,
        VerifyOtpRequest {
            otp_token: registered.otp_token,
            code: wrong,
        },
    )
    .await;
    assert!(matches!(rejected, Err(AppError::BadRequest(_))));

    // The right code verifies the mobile; signup carries no reset token.
    let verified = otp_service::verify_code(
        &state,
        VerifyOtpRequest {
            otp_token: registered.otp_token,
            code: signup_code,
        },
    )
    .await?;
    assert!(verified.data.unwrap().reset_token.is_none());

    let verified_at: (Option<chrono::DateTime<chrono::Utc>>,) =
        sqlx::query_as("SELECT mobile_verified_at FROM users WHERE mobile = '15550000003'")
            .fetch_one(&state.pool)
            .await?;
    assert!(verified_at.0.is_some());

    // Password reset: request, verify, spend the token.
    let requested = otp_service::request_code(
        &state,
        OtpRequest {
            mobile: "15550000003".into(),
            purpose: OtpPurpose::PasswordReset,
        },
    )
    .await?;
    let otp_token = requested.data.unwrap().otp_token;
    let reset_code = sender.last_code().expect("reset code sent");

    let verified = otp_service::verify_code(
        &state,
        VerifyOtpRequest {
            otp_token,
            code: reset_code,
        },
    )
    .await?;
    let reset_token = verified.data.unwrap().reset_token.expect("reset token");

    otp_service::reset_password(
        &state,
        ResetPasswordRequest {
            reset_token,
            new_password: "rotated-pass".into(),
        },
    )
    .await?;

    // The stored credential now matches the new password.
    let (hash,): (String,) =
        sqlx::query_as("SELECT password_hash FROM users WHERE mobile = '15550000003'")
            .fetch_one(&state.pool)
            .await?;
    let parsed = PasswordHash::new(&hash).unwrap();
    assert!(
        Argon2::default()
            .verify_password(b"rotated-pass", &parsed)
            .is_ok()
    );

    // A reset token works exactly once.
    let reused = otp_service::reset_password(
        &state,
        ResetPasswordRequest {
            reset_token,
            new_password: "another-pass".into(),
        },
    )
    .await;
    assert!(matches!(reused, Err(AppError::BadRequest(_))));

    Ok(())
}

// A delivery failure must surface as an internal error and must not leave
// a dangling session behind, or the customer would be locked out by the
// resend cooldown of a code that never went out.
#[tokio::test]
async fn failed_code_delivery_leaves_no_session() -> Result<()> {
    let database_url = match database_url() {
        Some(url) => url,
        None => {
            eprintln!(
                "Skipping test: set TEST_DATABASE_URL or DATABASE_URL to run integration flow tests."
            );
            return Ok(());
        }
    };
    let _guard = db_lock().lock().await;

    let state = setup_state(&database_url, Arc::new(FailingSender)).await?;

    let opened = otp_service::open_session(&state, "15550000004", OtpPurpose::Signup).await;
    assert!(matches!(opened, Err(AppError::Internal(_))));

    let (sessions,): (i64,) = sqlx::query_as("SELECT count(*) FROM otp_sessions")
        .fetch_one(&state.pool)
        .await?;
    assert_eq!(sessions, 0);

    Ok(())
}

// Setting the free-shipping threshold to 0 turns free shipping off again;
// the other settings keep their values.
#[tokio::test]
async fn free_shipping_threshold_can_be_cleared() -> Result<()> {
    let database_url = match database_url() {
        Some(url) => url,
        None => {
            eprintln!(
                "Skipping test: set TEST_DATABASE_URL or DATABASE_URL to run integration flow tests."
            );
            return Ok(());
        }
    };
    let _guard = db_lock().lock().await;

    let state = setup_state(&database_url, Arc::new(CapturingSender::default())).await?;
    set_checkout_settings(&state.pool).await?;
    let admin_id = create_user(&state.pool, "admin", "15550000001", "admin123").await?;
    let admin = AuthUser {
        user_id: admin_id,
        role: "admin".into(),
    };

    let updated = settings_service::update_settings(
        &state,
        &admin,
        UpdateCheckoutSettingsRequest {
            tax_percent: None,
            shipping_fee: None,
            free_shipping_above: Some(5000),
            cod_limit: None,
        },
    )
    .await?;
    assert_eq!(updated.data.unwrap().free_shipping_above, Some(5000));

    let cleared = settings_service::update_settings(
        &state,
        &admin,
        UpdateCheckoutSettingsRequest {
            tax_percent: None,
            shipping_fee: None,
            free_shipping_above: Some(0),
            cod_limit: None,
        },
    )
    .await?;
    let cleared = cleared.data.unwrap();
    assert_eq!(cleared.free_shipping_above, None);
    assert_eq!(cleared.shipping_fee, 99);
    assert_eq!(cleared.cod_limit, 20000);

    Ok(())
}

fn flip_first_digit(code: &str) -> String {
    let mut chars: Vec<char> = code.chars().collect();
    let first = chars[0].to_digit(10).unwrap();
    chars[0] = char::from_digit((first + 1) % 10, 10).unwrap();
    chars.into_iter().collect()
}
