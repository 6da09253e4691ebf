//! Subscription endpoint handlers.

use axum::extract::State;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::Utc;

use crate::api::auth::AuthUser;
use crate::api::dto::{BuyHoursRequest, SubscriptionDto, UpgradeRequest};
use crate::app_state::AppState;
use crate::error::{ErrorResponse, GatewayError};

/// `GET /api/subscription` — The caller's subscription.
///
/// # Errors
///
/// Returns [`GatewayError::NotFound`] if no subscription exists for the
/// caller.
#[utoipa::path(
    get,
    path = "/api/subscription",
    tag = "Subscription",
    summary = "Get the caller's subscription",
    responses(
        (status = 200, description = "Subscription details", body = SubscriptionDto),
        (status = 404, description = "Subscription not found", body = ErrorResponse),
        (status = 401, description = "Missing or invalid credentials", body = ErrorResponse),
    )
)]
pub async fn get_subscription(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<impl IntoResponse, GatewayError> {
    let subscription = state
        .store
        .subscription_by_user(user.user_id)
        .await?
        .ok_or(GatewayError::NotFound("subscription"))?;
    Ok(Json(SubscriptionDto::from(subscription)))
}

/// `POST /api/subscription/buy-hours` — Top up usage capacity.
///
/// Added capacity is modeled by decreasing `usedHours`, floored at
/// zero; the monthly allowance itself is unchanged.
///
/// # Errors
///
/// Returns [`GatewayError::Validation`] when `hours` is outside
/// `1..=500`, or [`GatewayError::NotFound`] if the caller has no
/// subscription.
#[utoipa::path(
    post,
    path = "/api/subscription/buy-hours",
    tag = "Subscription",
    summary = "Buy extra hours",
    request_body = BuyHoursRequest,
    responses(
        (status = 200, description = "Updated subscription", body = SubscriptionDto),
        (status = 400, description = "Invalid hour amount", body = ErrorResponse),
        (status = 404, description = "Subscription not found", body = ErrorResponse),
    )
)]
pub async fn buy_hours(
    State(state): State<AppState>,
    user: AuthUser,
    Json(req): Json<BuyHoursRequest>,
) -> Result<impl IntoResponse, GatewayError> {
    if req.hours < 1 {
        return Err(GatewayError::Validation(
            "hours must be at least 1".to_string(),
        ));
    }
    if req.hours > 500 {
        return Err(GatewayError::Validation(
            "cannot add more than 500 hours at once".to_string(),
        ));
    }

    let mut subscription = state
        .store
        .subscription_by_user(user.user_id)
        .await?
        .ok_or(GatewayError::NotFound("subscription"))?;
    subscription.credit_hours(req.hours);
    state.store.update_subscription(&subscription).await?;

    tracing::info!(user_id = %user.user_id, hours = req.hours, "hours purchased");
    Ok(Json(SubscriptionDto::from(subscription)))
}

/// `POST /api/subscription/upgrade` — Change plan tier.
///
/// Takes the plan's default allowance unless `monthlyHours` is given;
/// `usedHours` is clamped down to the new allowance and the billing
/// date advances 30 days.
///
/// # Errors
///
/// Returns [`GatewayError::Validation`] when `monthlyHours` is outside
/// `50..=1000`, or [`GatewayError::NotFound`] if the caller has no
/// subscription.
#[utoipa::path(
    post,
    path = "/api/subscription/upgrade",
    tag = "Subscription",
    summary = "Change plan",
    request_body = UpgradeRequest,
    responses(
        (status = 200, description = "Updated subscription", body = SubscriptionDto),
        (status = 400, description = "Invalid allowance override", body = ErrorResponse),
        (status = 404, description = "Subscription not found", body = ErrorResponse),
    )
)]
pub async fn upgrade(
    State(state): State<AppState>,
    user: AuthUser,
    Json(req): Json<UpgradeRequest>,
) -> Result<impl IntoResponse, GatewayError> {
    if let Some(hours) = req.monthly_hours {
        if !(50..=1000).contains(&hours) {
            return Err(GatewayError::Validation(
                "monthlyHours must be between 50 and 1000".to_string(),
            ));
        }
    }

    let mut subscription = state
        .store
        .subscription_by_user(user.user_id)
        .await?
        .ok_or(GatewayError::NotFound("subscription"))?;
    subscription.change_plan(req.plan, req.monthly_hours, Utc::now());
    state.store.update_subscription(&subscription).await?;

    tracing::info!(user_id = %user.user_id, plan = req.plan.as_str(), "plan changed");
    Ok(Json(SubscriptionDto::from(subscription)))
}

/// Subscription routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/subscription", get(get_subscription))
        .route("/subscription/buy-hours", post(buy_hours))
        .route("/subscription/upgrade", post(upgrade))
}
