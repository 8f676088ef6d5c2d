use anyhow::Context;
use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde::Deserialize;
use serde_json::{json, Value};
use teloxide::prelude::*;
use tracing::{error, warn};

use eduhub_core::cashfree::buyer_chat_id;

use crate::AppState;

/// Payment notification as delivered by the gateway. The shape is enforced
/// at the boundary: a payload missing any required field is rejected with a
/// client error before any message is sent.
#[derive(Debug, Clone, Deserialize)]
pub struct PaymentWebhook {
    pub order_id: String,
    pub order_status: String,
    #[serde(default)]
    pub cf_payment_id: Option<Value>,
    pub customer_details: CustomerDetails,
    #[serde(default)]
    pub payment_status: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CustomerDetails {
    pub customer_id: String,
    #[serde(default)]
    pub customer_name: Option<String>,
}

pub async fn payment_webhook(
    State(state): State<AppState>,
    Json(body): Json<Value>,
) -> impl IntoResponse {
    let payload: PaymentWebhook = match serde_json::from_value(body.clone()) {
        Ok(payload) => payload,
        Err(e) => {
            warn!("Invalid webhook payload ({}): {}", e, body);
            return (
                StatusCode::BAD_REQUEST,
                Json(json!({ "success": false, "error": "Invalid webhook payload" })),
            );
        }
    };

    match process(&state, &payload).await {
        Ok(()) => (StatusCode::OK, Json(json!({ "success": true }))),
        Err(e) => {
            error!("Webhook processing failed for order {}: {:?}", payload.order_id, e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "success": false, "error": "Webhook processing failed" })),
            )
        }
    }
}

async fn process(state: &AppState, payload: &PaymentWebhook) -> anyhow::Result<()> {
    // The payload is not trusted to carry the delivery link; re-fetch the
    // order and recover it from the note stored at creation time.
    let order = state.cashfree.get_order(&payload.order_id).await?;
    let telegram_link = order
        .order_note
        .context("order carried no delivery note")?;

    let buyer = buyer_chat_id(&payload.customer_details.customer_id)
        .context("customer_id does not encode a chat id")?;
    let admin = ChatId(state.config.admin_chat_id);

    let customer_name = payload
        .customer_details
        .customer_name
        .as_deref()
        .unwrap_or("Unknown");
    let payment_id = payment_id_display(payload.cf_payment_id.as_ref());

    if is_successful(payload) {
        state
            .bot
            .send_message(
                ChatId(buyer),
                format!(
                    "🎉 Payment successful! Here is your material link:\n{}",
                    telegram_link
                ),
            )
            .await?;

        state
            .bot
            .send_message(
                admin,
                format!(
                    "Payment Successful!\n\nOrder ID: {}\nPayment ID: {}\nCustomer: {}\nMaterial Link: {}",
                    payload.order_id, payment_id, customer_name, telegram_link
                ),
            )
            .await?;
    } else {
        state
            .bot
            .send_message(
                ChatId(buyer),
                format!(
                    "❌ Payment failed for Order ID: {}. Please try again or contact support.",
                    payload.order_id
                ),
            )
            .await?;

        state
            .bot
            .send_message(
                admin,
                format!(
                    "Payment Failed!\n\nOrder ID: {}\nPayment ID: {}\nCustomer: {}\nStatus: {}",
                    payload.order_id, payment_id, customer_name, payload.order_status
                ),
            )
            .await?;
    }

    Ok(())
}

fn is_successful(payload: &PaymentWebhook) -> bool {
    payload.order_status == "PAID" && payload.payment_status.as_deref() == Some("SUCCESS")
}

fn payment_id_display(id: Option<&Value>) -> String {
    match id {
        Some(Value::String(s)) if !s.is_empty() => s.clone(),
        Some(Value::Number(n)) => n.to_string(),
        _ => "N/A".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn payload(order_status: &str, payment_status: Option<&str>) -> PaymentWebhook {
        PaymentWebhook {
            order_id: "ORDER_1_1".to_string(),
            order_status: order_status.to_string(),
            cf_payment_id: None,
            customer_details: CustomerDetails {
                customer_id: "cust_123_bio_mtg".to_string(),
                customer_name: Some("John Doe".to_string()),
            },
            payment_status: payment_status.map(str::to_string),
        }
    }

    #[test]
    fn rejects_payload_without_customer_details() {
        let body = json!({
            "order_id": "ORDER_1_1",
            "order_status": "PAID",
            "payment_status": "SUCCESS"
        });
        assert!(serde_json::from_value::<PaymentWebhook>(body).is_err());
    }

    #[test]
    fn rejects_payload_without_order_id() {
        let body = json!({
            "order_status": "PAID",
            "customer_details": { "customer_id": "cust_123_bio_mtg" }
        });
        assert!(serde_json::from_value::<PaymentWebhook>(body).is_err());
    }

    #[test]
    fn accepts_minimal_valid_payload() {
        let body = json!({
            "order_id": "ORDER_1_1",
            "order_status": "PAID",
            "cf_payment_id": 987654,
            "customer_details": { "customer_id": "cust_123_bio_mtg" },
            "payment_status": "SUCCESS"
        });
        let payload: PaymentWebhook = serde_json::from_value(body).unwrap();
        assert!(is_successful(&payload));
        assert_eq!(payment_id_display(payload.cf_payment_id.as_ref()), "987654");
    }

    #[test]
    fn only_paid_and_success_counts_as_successful() {
        assert!(is_successful(&payload("PAID", Some("SUCCESS"))));
        assert!(!is_successful(&payload("PAID", Some("FAILED"))));
        assert!(!is_successful(&payload("ACTIVE", Some("SUCCESS"))));
        assert!(!is_successful(&payload("PAID", None)));
    }

    #[test]
    fn missing_payment_id_renders_placeholder() {
        assert_eq!(payment_id_display(None), "N/A");
        assert_eq!(payment_id_display(Some(&Value::String(String::new()))), "N/A");
        assert_eq!(
            payment_id_display(Some(&Value::String("cf_1".to_string()))),
            "cf_1"
        );
    }
}
