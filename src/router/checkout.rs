//! Create a payment intent at the gateway.

use axum::extract::State;
use axum::{Extension, Json};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::AppState;
use crate::error::Result;
use crate::router::Valid;
use crate::user::UserService;

#[derive(Debug, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct Body {
    /// Whole currency units; converted for the gateway.
    #[validate(range(min = 1, message = "Amount must be positive."))]
    pub amount: i64,
    pub currency: Option<String>,
    #[serde(default)]
    pub payment_method_types: Vec<String>,
    #[validate(length(min = 1, message = "Property name is required."))]
    pub property_name: String,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Response {
    pub client_secret: String,
}

pub async fn handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserService>,
    Valid(body): Valid<Body>,
) -> Result<Json<Response>> {
    let intent = state
        .payment
        .create_intent(
            body.amount,
            body.currency.as_deref(),
            &body.payment_method_types,
            &format!("Booking payment for {}", body.property_name),
        )
        .await?;

    tracing::debug!(
        user_id = %user.data.id,
        intent_id = %intent.id,
        "payment intent created"
    );

    Ok(Json(Response {
        client_secret: intent.client_secret,
    }))
}
