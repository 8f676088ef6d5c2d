use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde::Deserialize;
use serde_json::json;
use tracing::error;

use eduhub_core::cashfree::NewOrder;
use eduhub_core::error::OrderError;

use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct FetchOrderRequest {
    #[serde(rename = "orderId")]
    pub order_id: Option<String>,
}

/// Order re-fetch for the checkout return page: recovers the delivery link
/// from the order note.
pub async fn fetch_order(
    State(state): State<AppState>,
    Json(req): Json<FetchOrderRequest>,
) -> impl IntoResponse {
    let Some(order_id) = req.order_id.filter(|id| !id.is_empty()) else {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({ "success": false, "error": "Missing orderId" })),
        );
    };

    match state.cashfree.get_order(&order_id).await {
        Ok(details) => (
            StatusCode::OK,
            Json(json!({ "success": true, "telegramLink": details.order_note })),
        ),
        Err(e) => {
            error!("Failed to fetch order details for {}: {}", order_id, e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "success": false, "error": "Failed to fetch order details" })),
            )
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateOrderRequest {
    pub product_id: Option<String>,
    pub product_name: Option<String>,
    pub amount: Option<f64>,
    pub telegram_link: Option<String>,
    pub customer_name: Option<String>,
    pub customer_email: Option<String>,
    pub customer_phone: Option<String>,
}

impl CreateOrderRequest {
    fn into_new_order(self) -> Option<NewOrder> {
        Some(NewOrder {
            product_id: self.product_id.filter(|s| !s.is_empty())?,
            product_name: self.product_name.filter(|s| !s.is_empty())?,
            amount: self.amount?,
            telegram_link: self.telegram_link.filter(|s| !s.is_empty())?,
            customer_name: self.customer_name.filter(|s| !s.is_empty())?,
            customer_email: self.customer_email.filter(|s| !s.is_empty())?,
            customer_phone: self.customer_phone.filter(|s| !s.is_empty())?,
        })
    }
}

pub async fn create_order(
    State(state): State<AppState>,
    Json(req): Json<CreateOrderRequest>,
) -> impl IntoResponse {
    let Some(order) = req.into_new_order() else {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({ "success": false, "error": "Missing required fields" })),
        );
    };

    match state.cashfree.create_order(&order).await {
        Ok(created) => (
            StatusCode::OK,
            Json(json!({
                "success": true,
                "paymentSessionId": created.payment_session_id,
                "orderId": created.order_id,
                "checkoutUrl": created.checkout_url,
                "telegramLink": created.telegram_link,
            })),
        ),
        Err(e) => {
            error!("Cashfree order creation failed: {}", e);
            let details = match e {
                OrderError::Gateway { details, .. } => details,
                OrderError::Transport(_) => None,
            };
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({
                    "success": false,
                    "error": "Failed to create Cashfree order",
                    "details": details,
                })),
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn full_request() -> CreateOrderRequest {
        serde_json::from_value(json!({
            "productId": "123_bio_mtg",
            "productName": "Biology MTG",
            "amount": 100.0,
            "telegramLink": "https://t.me/Material_eduhubkmrbot?start=bio_mtg",
            "customerName": "John Doe",
            "customerEmail": "john@example.com",
            "customerPhone": "9876543210"
        }))
        .unwrap()
    }

    #[test]
    fn complete_request_converts() {
        let order = full_request().into_new_order().unwrap();
        assert_eq!(order.product_id, "123_bio_mtg");
        assert_eq!(order.amount, 100.0);
    }

    #[test]
    fn missing_or_empty_fields_are_rejected() {
        let mut req = full_request();
        req.customer_phone = None;
        assert!(req.into_new_order().is_none());

        let mut req = full_request();
        req.customer_email = Some(String::new());
        assert!(req.into_new_order().is_none());
    }
}
