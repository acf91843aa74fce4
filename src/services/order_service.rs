use std::collections::BTreeMap;

use chrono::Utc;
use sea_orm::ActiveValue::NotSet;
use sea_orm::sea_query::Expr;
use sea_orm::sea_query::LockType;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder,
    QuerySelect, Set, TransactionTrait,
};
use uuid::Uuid;

use crate::{
    audit::log_audit,
    cart::CartStore,
    dto::orders::{CheckoutRequest, OrderList, OrderWithItems},
    entity::{
        addresses::{Column as AddressCol, Entity as Addresses},
        order_items::{
            ActiveModel as OrderItemActive, Column as OrderItemCol, Entity as OrderItems,
            Model as OrderItemModel,
        },
        orders::{
            ActiveModel as OrderActive, Column as OrderCol, Entity as Orders, Model as OrderModel,
        },
        products::{Column as ProdCol, Entity as Products},
    },
    error::{AppError, AppResult},
    middleware::{auth::AuthUser, cart_session::CartSession},
    models::{Order, OrderItem},
    pricing,
    response::{ApiResponse, Meta},
    routes::params::{OrderListQuery, SortOrder},
    services::{discount_service, settings_service},
    state::AppState,
};

const PAYMENT_METHODS: [&str; 2] = ["cod", "prepaid"];

pub async fn list_orders(
    state: &AppState,
    user: &AuthUser,
    query: OrderListQuery,
) -> AppResult<ApiResponse<OrderList>> {
    let (page, limit, offset) = query.pagination().normalize();
    let mut condition = Condition::all().add(OrderCol::UserId.eq(user.user_id));
    if let Some(status) = query.status.as_ref().filter(|s| !s.is_empty()) {
        condition = condition.add(OrderCol::Status.eq(status.clone()));
    }

    let sort_order = query.sort_order.unwrap_or(SortOrder::Desc);

    let mut finder = Orders::find().filter(condition);
    finder = match sort_order {
        SortOrder::Asc => finder.order_by_asc(OrderCol::CreatedAt),
        SortOrder::Desc => finder.order_by_desc(OrderCol::CreatedAt),
    };

    let total = finder.clone().count(&state.orm).await? as i64;

    let orders = finder
        .limit(limit as u64)
        .offset(offset as u64)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(order_from_entity)
        .collect();

    let meta = Meta::new(page, limit, total);
    Ok(ApiResponse::success(
        "Ok",
        OrderList { items: orders },
        Some(meta),
    ))
}

/// Turns the session's cart into an order.
///
/// Totals are computed from the prices captured in the cart, not the live
/// catalog, so what the customer saw is what they pay. Stock is the one
/// thing re-checked here, under row locks, with quantities aggregated per
/// product across variants.
pub async fn checkout(
    state: &AppState,
    user: &AuthUser,
    session: CartSession,
    payload: CheckoutRequest,
) -> AppResult<ApiResponse<OrderWithItems>> {
    if !PAYMENT_METHODS.contains(&payload.payment_method.as_str()) {
        return Err(AppError::BadRequest("Invalid payment method".into()));
    }

    let mut store = CartStore::hydrate(state.cart.clone(), session.0).await;
    if store.cart().is_empty() {
        return Err(AppError::BadRequest("Cart is empty".into()));
    }

    let address = Addresses::find_by_id(payload.address_id)
        .filter(AddressCol::UserId.eq(user.user_id))
        .one(&state.orm)
        .await?;
    if address.is_none() {
        return Err(AppError::BadRequest("Address not found".into()));
    }

    let settings = settings_service::load_settings(state).await?;
    let subtotal = store.cart().subtotal();

    let discount = match payload.discount_code.as_deref() {
        Some(code) => Some(discount_service::active_terms(state, code, subtotal).await?),
        None => None,
    };
    let (discount_code, discount_terms) = match discount {
        Some((code, terms)) => (Some(code), Some(terms)),
        None => (None, None),
    };

    let totals = pricing::compute_totals(subtotal, discount_terms, &settings);

    if payload.payment_method == "cod" && totals.total > settings.cod_limit {
        return Err(AppError::BadRequest(
            "Cash on delivery is not available for this order total".into(),
        ));
    }

    // Stock is shared across variants of a product, so quantities are
    // aggregated per product id. BTreeMap keeps the lock order stable.
    let mut needed: BTreeMap<Uuid, i64> = BTreeMap::new();
    for line in store.cart().lines() {
        *needed.entry(line.product_id).or_insert(0) += line.quantity as i64;
    }

    let txn = state.orm.begin().await?;

    for (product_id, quantity) in &needed {
        let product = Products::find_by_id(*product_id)
            .lock(LockType::Update)
            .one(&txn)
            .await?;
        let product = match product {
            Some(p) => p,
            None => {
                return Err(AppError::BadRequest(
                    "A product in the cart is no longer available".into(),
                ));
            }
        };
        if (product.stock as i64) < *quantity {
            return Err(AppError::BadRequest(format!(
                "Insufficient stock for {}",
                product.name
            )));
        }
    }

    let order_id = Uuid::new_v4();
    let invoice_number = build_invoice_number(order_id);

    let order = OrderActive {
        id: Set(order_id),
        user_id: Set(user.user_id),
        address_id: Set(payload.address_id),
        subtotal: Set(totals.subtotal),
        discount_code: Set(discount_code),
        discount_amount: Set(totals.discount_amount),
        shipping_fee: Set(totals.shipping_fee),
        tax_amount: Set(totals.tax_amount),
        total_amount: Set(totals.total),
        payment_method: Set(payload.payment_method.clone()),
        status: Set("placed".into()),
        fulfillment: Set("processing".into()),
        invoice_number: Set(invoice_number),
        created_at: NotSet,
        updated_at: NotSet,
    }
    .insert(&txn)
    .await?;

    let mut order_items: Vec<OrderItem> = Vec::new();

    for line in store.cart().lines() {
        let item = OrderItemActive {
            id: Set(Uuid::new_v4()),
            order_id: Set(order.id),
            product_id: Set(line.product_id),
            name: Set(line.name.clone()),
            color: Set(line.color.clone()),
            size: Set(line.size.clone()),
            quantity: Set(line.quantity as i32),
            unit_price: Set(line.unit_price),
            created_at: NotSet,
        }
        .insert(&txn)
        .await?;

        order_items.push(order_item_from_entity(item));
    }

    for (product_id, quantity) in &needed {
        Products::update_many()
            .col_expr(ProdCol::Stock, Expr::col(ProdCol::Stock).sub(*quantity))
            .filter(ProdCol::Id.eq(*product_id))
            .exec(&txn)
            .await?;
    }

    txn.commit().await?;

    // The order exists either way; a leftover snapshot only means the
    // customer sees a stale cart until the next mutation.
    if let Err(err) = store.clear().await {
        tracing::warn!(error = %err, "failed to clear cart after checkout");
    }

    if let Err(err) = log_audit(
        &state.pool,
        Some(user.user_id),
        "checkout",
        Some("orders"),
        Some(serde_json::json!({ "order_id": order.id, "total": order.total_amount })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(ApiResponse::success(
        "Checkout success",
        OrderWithItems {
            order: order_from_entity(order),
            items: order_items,
        },
        Some(Meta::empty()),
    ))
}

pub async fn get_order(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<OrderWithItems>> {
    let order = Orders::find()
        .filter(
            Condition::all()
                .add(OrderCol::UserId.eq(user.user_id))
                .add(OrderCol::Id.eq(id)),
        )
        .one(&state.orm)
        .await?;
    let order = match order {
        Some(o) => o,
        None => return Err(AppError::NotFound),
    };

    let items = OrderItems::find()
        .filter(OrderItemCol::OrderId.eq(order.id))
        .all(&state.orm)
        .await?
        .into_iter()
        .map(order_item_from_entity)
        .collect();

    Ok(ApiResponse::success(
        "OK",
        OrderWithItems {
            order: order_from_entity(order),
            items,
        },
        Some(Meta::empty()),
    ))
}

fn order_from_entity(model: OrderModel) -> Order {
    Order {
        id: model.id,
        user_id: model.user_id,
        address_id: model.address_id,
        subtotal: model.subtotal,
        discount_code: model.discount_code,
        discount_amount: model.discount_amount,
        shipping_fee: model.shipping_fee,
        tax_amount: model.tax_amount,
        total_amount: model.total_amount,
        payment_method: model.payment_method,
        status: model.status,
        fulfillment: model.fulfillment,
        invoice_number: model.invoice_number,
        created_at: model.created_at.with_timezone(&Utc),
        updated_at: model.updated_at.with_timezone(&Utc),
    }
}

fn order_item_from_entity(model: OrderItemModel) -> OrderItem {
    OrderItem {
        id: model.id,
        order_id: model.order_id,
        product_id: model.product_id,
        name: model.name,
        color: model.color,
        size: model.size,
        quantity: model.quantity,
        unit_price: model.unit_price,
        created_at: model.created_at.with_timezone(&Utc),
    }
}

fn build_invoice_number(order_id: Uuid) -> String {
    let date = Utc::now().format("%Y%m%d");
    let suffix = order_id.to_string();
    let short = &suffix[..8];
    format!("INV-{}-{}", date, short)
}
