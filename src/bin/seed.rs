use argon2::{
    Argon2, PasswordHasher,
    password_hash::{rand_core::OsRng, SaltString},
};
use storefront_api::{
    config::AppConfig,
    db::create_pool,
};
use uuid::Uuid;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = AppConfig::from_env()?;

    let pool = create_pool(&config.database_url).await?;
    // Ensure migrations are applied.
    sqlx::migrate!("./migrations").run(&pool).await?;

    let admin_id = ensure_admin(&pool, "15550000001", "admin123").await?;
    let user_id = ensure_customer(&pool, "15550000002", "user1234").await?;
    seed_products(&pool).await?;
    seed_discounts(&pool).await?;
    seed_settings(&pool).await?;
    seed_address(&pool, user_id).await?;

    println!("Seed completed. Admin ID: {admin_id}, Customer ID: {user_id}");
    Ok(())
}

async fn ensure_admin(pool: &sqlx::PgPool, mobile: &str, password: &str) -> anyhow::Result<Uuid> {
    ensure_user_with_role(pool, "Store Admin", mobile, password, "admin").await
}

async fn ensure_customer(
    pool: &sqlx::PgPool,
    mobile: &str,
    password: &str,
) -> anyhow::Result<Uuid> {
    ensure_user_with_role(pool, "Sample Customer", mobile, password, "customer").await
}

async fn ensure_user_with_role(
    pool: &sqlx::PgPool,
    name: &str,
    mobile: &str,
    password: &str,
    role: &str,
) -> anyhow::Result<Uuid> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();
    let password_hash = argon2
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| anyhow::anyhow!(e.to_string()))?
        .to_string();

    // Seeded accounts are pre-verified so they can log in straight away.
    let row: Option<(Uuid,)> = sqlx::query_as(
        r#"
        INSERT INTO users (id, name, mobile, password_hash, role, mobile_verified_at)
        VALUES ($1, $2, $3, $4, $5, now())
        ON CONFLICT (mobile) DO UPDATE SET role = EXCLUDED.role
        RETURNING id
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(name)
    .bind(mobile)
    .bind(password_hash)
    .bind(role)
    .fetch_optional(pool)
    .await?;

    let user_id = match row {
        Some((id,)) => id,
        None => {
            let existing: (Uuid,) = sqlx::query_as("SELECT id FROM users WHERE mobile = $1")
                .bind(mobile)
                .fetch_one(pool)
                .await?;
            existing.0
        }
    };

    println!("Ensured user {mobile} (role={role})");
    Ok(user_id)
}

async fn seed_products(pool: &sqlx::PgPool) -> anyhow::Result<()> {
    let products = vec![
        (
            "Classic Crewneck Tee",
            "Midweight cotton tee with a boxy cut",
            3490_i64,
            120,
            vec!["black", "white", "navy"],
            vec!["s", "m", "l", "xl"],
        ),
        (
            "Oxford Shirt",
            "Button-down oxford in washed cotton",
            5990,
            80,
            vec!["white", "blue"],
            vec!["s", "m", "l", "xl"],
        ),
        (
            "Slim Chinos",
            "Stretch twill chinos, tapered leg",
            6490,
            64,
            vec!["khaki", "olive", "black"],
            vec!["30", "32", "34", "36"],
        ),
        (
            "Wool Overshirt",
            "Brushed wool blend, two chest pockets",
            12900,
            25,
            vec!["charcoal", "camel"],
            vec!["m", "l", "xl"],
        ),
        (
            "Canvas Tote",
            "Heavy canvas tote with internal pocket",
            2490,
            150,
            vec!["natural"],
            vec!["one-size"],
        ),
    ];

    for (name, desc, price, stock, colors, sizes) in products {
        sqlx::query(
            r#"
            INSERT INTO products (id, name, description, price, stock, colors, sizes)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            ON CONFLICT (name) DO NOTHING
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(name)
        .bind(desc)
        .bind(price)
        .bind(stock)
        .bind(serde_json::json!(colors))
        .bind(serde_json::json!(sizes))
        .execute(pool)
        .await?;
    }

    println!("Seeded products");
    Ok(())
}

async fn seed_discounts(pool: &sqlx::PgPool) -> anyhow::Result<()> {
    sqlx::query(
        r#"
        INSERT INTO discounts (id, code, kind, value, min_subtotal, active)
        VALUES ($1, 'WELCOME10', 'percent', 10, 2000, TRUE)
        ON CONFLICT (code) DO NOTHING
        "#,
    )
    .bind(Uuid::new_v4())
    .execute(pool)
    .await?;

    println!("Seeded discounts");
    Ok(())
}

async fn seed_settings(pool: &sqlx::PgPool) -> anyhow::Result<()> {
    sqlx::query(
        r#"
        INSERT INTO checkout_settings (id, tax_percent, shipping_fee, free_shipping_above, cod_limit)
        VALUES (1, 0, 99, 2999, 10000)
        ON CONFLICT (id) DO NOTHING
        "#,
    )
    .execute(pool)
    .await?;

    println!("Seeded checkout settings");
    Ok(())
}

async fn seed_address(pool: &sqlx::PgPool, user_id: Uuid) -> anyhow::Result<()> {
    let existing: Option<(Uuid,)> =
        sqlx::query_as("SELECT id FROM addresses WHERE user_id = $1 AND label = 'home'")
            .bind(user_id)
            .fetch_optional(pool)
            .await?;
    if existing.is_some() {
        return Ok(());
    }

    sqlx::query(
        r#"
        INSERT INTO addresses
            (id, user_id, label, recipient, phone, line1, city, state_province, postal_code)
        VALUES ($1, $2, 'home', 'Sample Customer', '15550000002',
                '12 Foundry Lane', 'Springfield', 'IL', '62701')
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(user_id)
    .execute(pool)
    .await?;

    println!("Seeded address");
    Ok(())
}
