use axum::extract::FromRequestParts;
use uuid::Uuid;

use crate::error::AppError;

/// Header carrying the caller's cart session id. Guests mint a UUID client-side
/// and present it on every cart call; the same id after login keeps the cart.
pub const CART_SESSION_HEADER: &str = "x-cart-session";

#[derive(Debug, Clone, Copy)]
pub struct CartSession(pub Uuid);

impl<S> FromRequestParts<S> for CartSession
where
    S: Send + Sync,
{
    type Rejection = AppError;
    async fn from_request_parts(
        parts: &mut axum::http::request::Parts,
        _state: &S,
    ) -> Result<Self, Self::Rejection> {
        let raw = parts
            .headers
            .get(CART_SESSION_HEADER)
            .ok_or_else(|| AppError::BadRequest("Missing x-cart-session header".into()))?
            .to_str()
            .map_err(|_| AppError::BadRequest("Invalid x-cart-session header".into()))?;

        let session_id = Uuid::parse_str(raw)
            .map_err(|_| AppError::BadRequest("x-cart-session must be a UUID".into()))?;

        Ok(CartSession(session_id))
    }
}
